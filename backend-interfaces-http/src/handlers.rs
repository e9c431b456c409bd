pub mod alert_handlers;
pub mod dispatch_handlers;
pub mod inventory_handlers;
pub mod match_handlers;
pub mod ops_handlers;

pub use alert_handlers::*;
pub use dispatch_handlers::*;
pub use inventory_handlers::*;
pub use match_handlers::*;
pub use ops_handlers::*;
