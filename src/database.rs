use crate::configuration::DatabaseConfig;
use anyhow::Context;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Connection, Executor, PgConnection, PgPool};

pub fn get_connection_pool(configuration: &DatabaseConfig) -> PgPool {
    PgPoolOptions::new()
        .acquire_timeout(std::time::Duration::from_secs(
            configuration.acquire_timeout,
        ))
        .max_connections(configuration.max_connections)
        .min_connections(configuration.min_connections)
        .connect_lazy_with(configuration.with_db())
}

#[tracing::instrument(name = "Configure database", skip(config))]
pub async fn configure_database(config: &DatabaseConfig) -> Result<PgPool, anyhow::Error> {
    create_database(config, &config.name).await?;
    create_database(config, &config.test_name).await?;
    let connection_pool = migrate_database(config.with_db()).await?;
    migrate_database(config.test_with_db()).await?;
    Ok(connection_pool)
}

async fn migrate_database(options: PgConnectOptions) -> Result<PgPool, anyhow::Error> {
    let connection_pool = PgPool::connect_with(options)
        .await
        .context("Failed to connect to Postgres.")?;
    sqlx::migrate!("./migrations")
        .run(&connection_pool)
        .await
        .context("Failed to migrate the database")?;
    Ok(connection_pool)
}

#[tracing::instrument(name = "Create database", skip(config))]
pub async fn create_database(config: &DatabaseConfig, name: &str) -> Result<(), anyhow::Error> {
    let mut connection = PgConnection::connect_with(&config.without_db())
        .await
        .context("Failed to connect to Postgres")?;

    let db_count: i64 =
        sqlx::query_scalar::<_, i64>("SELECT count(*) FROM pg_database WHERE datname = $1")
            .bind(name)
            .fetch_one(&mut connection)
            .await
            .context("Failed to check for an existing database")?;
    if db_count > 0 {
        tracing::info!("Database {} already exists.", name);
    } else {
        connection
            .execute(format!(r#"CREATE DATABASE "{}";"#, name).as_str())
            .await
            .context("Failed to create database.")?;
        tracing::info!("Database {} created.", name);
    }
    Ok(())
}
