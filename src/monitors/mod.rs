pub mod disk;
pub mod usage;
