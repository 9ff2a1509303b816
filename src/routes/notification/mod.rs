pub(crate) mod handlers;
mod models;
mod routes;
pub mod schemas;
pub mod utils;
pub use routes::notification_route;
