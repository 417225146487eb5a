//! Afisha main service
//!
//! Entry point: loads configuration, connects to the database, runs
//! migrations and wires the service layer.

use tracing::info;

use afisha::config::Settings;
use afisha::database::connection::{self, DatabaseConfig};
use afisha::services::ServiceFactory;
use afisha::utils::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let settings = Settings::new()?;
    settings.validate()?;

    let _log_guard = logging::init_logging(&settings.logging)?;

    info!("Starting afisha main service...");

    let db_config = DatabaseConfig {
        url: settings.database.url.clone(),
        max_connections: settings.database.max_connections,
        min_connections: settings.database.min_connections,
        ..DatabaseConfig::default()
    };
    let pool = connection::create_pool(&db_config).await?;
    connection::run_migrations(&pool).await?;

    let _services = ServiceFactory::new(pool.clone(), settings)?;
    info!("afisha main service is ready");

    // The HTTP edge binds the services; this process parks until shutdown.
    tokio::signal::ctrl_c().await?;

    info!("afisha main service shutting down");
    Ok(())
}
