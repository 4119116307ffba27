use std::sync::Arc;

use raid_enrollment::config::{init_logging, EngineConfig};
use raid_enrollment::infrastructure::cache::SqliteLocalCache;
use raid_enrollment::infrastructure::remote::HttpRemoteAuthority;
use raid_enrollment::{EnrollmentEngine, EnrollmentError};

#[tokio::main]
async fn main() -> Result<(), EnrollmentError> {
    // Load configuration before logging so the level and format apply
    let config = EngineConfig::from_env()?;
    init_logging(&config.logging);

    let credential = config.auth_token.clone().ok_or_else(|| {
        EnrollmentError::Configuration("ENROLLMENT_AUTH_TOKEN must be set to replay".to_string())
    })?;

    // Open local cache
    tracing::info!("Opening local cache at {}", config.cache_url);
    let cache = SqliteLocalCache::connect(&config.cache_url).await?;
    tracing::info!("Local cache ready");

    let remote = HttpRemoteAuthority::new(config.remote_url.clone(), config.remote_timeout)?;
    let engine = EnrollmentEngine::new(Arc::new(remote), Arc::new(cache));

    let report = engine.replay_all(&credential).await?;
    if report.is_drained() {
        tracing::info!(
            replayed = report.replayed,
            renumbered = report.renumbered,
            parked = report.parked,
            "Pending queue drained"
        );
    } else {
        tracing::warn!(
            replayed = report.replayed,
            renumbered = report.renumbered,
            parked = report.parked,
            remaining = report.remaining,
            "Pending actions left for a later run"
        );
    }

    Ok(())
}
