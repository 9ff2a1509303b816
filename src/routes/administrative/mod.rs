pub(crate) mod handlers;
mod routes;
pub use routes::administrative_route;
