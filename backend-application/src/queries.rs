// Application queries (read-only views)
pub mod alert_queries;
pub mod dispatch_queries;
pub mod inventory_queries;
