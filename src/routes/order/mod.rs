pub(crate) mod handlers;
mod models;
mod routes;
pub mod schemas;
mod tests;
pub mod utils;
pub use routes::order_route;
