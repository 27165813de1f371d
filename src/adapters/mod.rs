// Adapters layer: concrete implementations of the domain ports over Google APIs.

pub mod auth;
pub mod sheets;

pub use auth::{ConfiguredTokens, ServiceAccountAuth, StaticToken};
pub use sheets::GoogleSheetsGateway;
