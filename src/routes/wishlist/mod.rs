pub(crate) mod handlers;
mod routes;
pub mod schemas;
pub mod utils;
pub use routes::wishlist_route;
