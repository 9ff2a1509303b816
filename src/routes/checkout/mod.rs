pub mod errors;
pub(crate) mod handlers;
pub mod models;
mod routes;
pub mod schemas;
mod tests;
pub mod utils;
pub use routes::checkout_route;
