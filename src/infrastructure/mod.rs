pub mod gateways;
pub mod stores;
