// Domain entities
pub mod alert;
pub mod dispatch;
pub mod donor;
pub mod inventory;
pub mod match_record;
pub mod runtime_config;

pub use alert::*;
pub use dispatch::*;
pub use donor::*;
pub use inventory::*;
pub use match_record::*;
pub use runtime_config::*;
