// Domain services
pub mod matcher;
pub mod scorer;

pub use matcher::*;
pub use scorer::*;
