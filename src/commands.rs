use crate::configuration::get_configuration;
use crate::database::get_connection_pool;
use crate::migration;
use crate::routes::checkout::utils::expire_pending_payments;

#[tracing::instrument(name = "Run custom command")]
pub async fn run_custom_commands(args: Vec<String>) -> Result<(), anyhow::Error> {
    if args.len() < 2 {
        eprintln!("Invalid command. Please provide a valid command.");
        return Ok(());
    }
    let command = args[1].as_str();

    match command {
        "migrate" => {
            migration::run_migrations().await?;
        }
        "expire_payments" => {
            let configuration = get_configuration()?;
            let pool = get_connection_pool(&configuration.database);
            let timeout_minutes = match args.get(2) {
                Some(value) => value.parse::<i64>()?,
                None => configuration.sepay.payment_timeout_minutes,
            };
            let expired = expire_pending_payments(&pool, timeout_minutes).await?;
            tracing::info!("Expired {} pending payment(s)", expired.len());
        }
        _ => {
            eprintln!("Unknown command: {}. Please use a valid command.", command);
        }
    }

    Ok(())
}
