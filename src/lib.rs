pub mod administrative;
pub mod commands;
pub mod configuration;
pub mod constants;
pub mod database;
pub mod domain;
pub mod email_client;
pub mod errors;
pub mod jobs;
pub mod middleware;
pub mod migration;
pub mod openapi;
pub mod routes;
pub mod schemas;
pub mod sepay_client;
pub mod startup;
pub mod telemetry;
mod tests;
pub mod utils;
