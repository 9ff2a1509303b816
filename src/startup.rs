use std::net::TcpListener;
use std::path::Path;

use actix_cors::Cors;
use actix_web::dev::Server;
use actix_web::{http, web, App, HttpServer};
use anyhow::Context;
use sqlx::PgPool;
use tracing_actix_web::TracingLogger;

use crate::administrative::AdministrativeDirectory;
use crate::configuration::{CorsSettings, Settings};
use crate::database::get_connection_pool;
use crate::middleware::SaveRequestResponse;
use crate::routes::main_route;
use crate::sepay_client::SePayClient;
use crate::utils::create_email_type_pool;

pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    pub async fn build(configuration: Settings) -> Result<Self, anyhow::Error> {
        let connection_pool = get_connection_pool(&configuration.database);
        let address = format!(
            "{}:{}",
            configuration.application.host, configuration.application.port
        );
        let listener = TcpListener::bind(&address)
            .with_context(|| format!("Failed to bind {}", address))?;
        let port = listener.local_addr()?.port();
        tracing::info!("Listening on {}:{}", configuration.application.host, port);
        let server = run(listener, connection_pool, configuration).await?;
        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Resolves only when the server stops.
    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

fn load_directory(path: &str) -> AdministrativeDirectory {
    match AdministrativeDirectory::load(Path::new(path)) {
        Ok(directory) => directory,
        Err(e) => {
            tracing::warn!("Administrative data unavailable, address checks disabled: {:?}", e);
            AdministrativeDirectory::default()
        }
    }
}

fn build_cors(settings: &CorsSettings) -> Cors {
    if settings.allowed_origins.is_empty() {
        return Cors::permissive();
    }
    settings
        .allowed_origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allowed_methods(vec!["GET", "POST", "PATCH", "PUT", "DELETE"])
        .allowed_headers(vec![http::header::AUTHORIZATION, http::header::CONTENT_TYPE])
        .max_age(3600)
}

async fn run(
    listener: TcpListener,
    db_pool: PgPool,
    configuration: Settings,
) -> Result<Server, anyhow::Error> {
    let email_pool = web::Data::new(create_email_type_pool(&configuration.email_client)?);
    let directory = web::Data::new(load_directory(&configuration.geography.data_path));
    let sepay_client = web::Data::new(SePayClient::new(&configuration.sepay));
    let db_pool = web::Data::new(db_pool);
    let secret = web::Data::new(configuration.secret);
    let user_settings = web::Data::new(configuration.user);
    let sepay_settings = web::Data::new(configuration.sepay);
    let cors_settings = configuration.cors;

    let server = HttpServer::new(move || {
        App::new()
            .wrap(SaveRequestResponse)
            .wrap(build_cors(&cors_settings))
            .wrap(TracingLogger::default())
            .app_data(db_pool.clone())
            .app_data(email_pool.clone())
            .app_data(directory.clone())
            .app_data(sepay_client.clone())
            .app_data(secret.clone())
            .app_data(user_settings.clone())
            .app_data(sepay_settings.clone())
            .configure(main_route)
    })
    .workers(configuration.application.workers)
    .listen(listener)?
    .run();

    Ok(server)
}
