pub mod api;
pub mod auth;
pub mod capabilities;

pub use api::*;
pub use capabilities::*;
