use crate::configuration::get_configuration;
use crate::database::configure_database;

#[tracing::instrument(name = "Migrate using Sqlx")]
pub async fn run_migrations() -> Result<(), anyhow::Error> {
    let configuration = get_configuration()?;
    configure_database(&configuration.database).await?;
    tracing::info!("Migrations applied");
    Ok(())
}
