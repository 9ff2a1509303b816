use std::time::Duration;

use sqlx::PgPool;
use tokio::task::JoinHandle;

use crate::configuration::SePaySettings;
use crate::routes::checkout::utils::expire_pending_payments;

/// Recurring sweep cancelling bank transfer orders whose payment window
/// has passed. Failures are logged and the loop keeps going.
pub fn spawn_payment_expiry_job(pool: PgPool, settings: SePaySettings) -> JoinHandle<()> {
    let period = Duration::from_secs(settings.sweep_interval_seconds.max(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            match expire_pending_payments(&pool, settings.payment_timeout_minutes).await {
                Ok(expired) if !expired.is_empty() => {
                    tracing::info!(count = expired.len(), "Payment expiry sweep cancelled orders")
                }
                Ok(_) => tracing::debug!("Payment expiry sweep found nothing to cancel"),
                Err(e) => tracing::error!("Payment expiry sweep failed: {:?}", e),
            }
        }
    })
}
