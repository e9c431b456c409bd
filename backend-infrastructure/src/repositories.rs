pub mod in_memory;
pub mod seed_files;

pub use in_memory::*;
pub use seed_files::*;
