// Domain value objects
pub mod blood_type;
pub mod channel;
pub mod geo;
pub mod health_flag;
pub mod identifiers;
pub mod stock_status;
pub mod urgency;

pub use blood_type::*;
pub use channel::*;
pub use geo::*;
pub use health_flag::*;
pub use identifiers::*;
pub use stock_status::*;
pub use urgency::*;
