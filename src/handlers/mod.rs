pub mod health;
pub mod minipool;

pub use health::health;
pub use minipool::{active_minipools, minipool_details, minipool_status};
