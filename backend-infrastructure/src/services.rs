pub mod dispatch_service;
pub mod inventory_service;
pub mod notifier_service;
pub mod sweep_service;

pub use dispatch_service::*;
pub use inventory_service::*;
pub use notifier_service::*;
pub use sweep_service::*;
