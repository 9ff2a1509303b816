use cosmetic_storefront::commands::run_custom_commands;
use cosmetic_storefront::configuration::get_configuration;
use cosmetic_storefront::database::get_connection_pool;
use cosmetic_storefront::jobs::spawn_payment_expiry_job;
use cosmetic_storefront::startup::Application;
use cosmetic_storefront::telemetry::{get_pretty_subscriber, get_subscriber, init_subscriber};

#[actix_web::main]
async fn main() -> Result<(), anyhow::Error> {
    let pretty_logs = std::env::var("LOG_FORMAT")
        .map(|value| value == "pretty")
        .unwrap_or(false);
    if pretty_logs {
        init_subscriber(get_pretty_subscriber("info".into(), std::io::stdout));
    } else {
        init_subscriber(get_subscriber(
            "cosmetic-storefront".into(),
            "info".into(),
            std::io::stdout,
        ));
    }

    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 {
        run_custom_commands(args).await?;
        return Ok(());
    }

    let configuration = get_configuration()?;
    let sweep_pool = get_connection_pool(&configuration.database);
    let job = spawn_payment_expiry_job(sweep_pool, configuration.sepay.clone());
    let application = Application::build(configuration).await?;
    application.run_until_stopped().await?;
    job.abort();
    Ok(())
}
