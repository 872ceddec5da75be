//! Параллельный сборщик состояния миньпулов Rocket Pool.

pub mod collector;
pub mod config;
pub mod formatter;
pub mod handlers;
pub mod routes;
pub mod rpc;
pub mod status;

pub use collector::{CollectError, MinipoolCollector};
pub use rpc::{ContractRegistry, RemoteCaller};
