//! HTTP API handlers for planit-locate

pub mod autocomplete;
pub mod health;
pub mod keys;
pub mod location;

pub use autocomplete::autocomplete_routes;
pub use health::{health_routes, root_routes};
pub use keys::key_routes;
pub use location::location_routes;
