use charter_bus_booking::config::AppConfig;
use charter_bus_booking::db::{ensure_schema, Database};
use charter_bus_booking::server;
use tracing_subscriber::EnvFilter;

#[rocket::launch]
async fn rocket() -> _ {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    // Connect to the database
    let database = match Database::new(&config.database).await {
        Ok(database) => database,
        Err(e) => {
            tracing::error!(error = %e, "failed to connect to database");
            std::process::exit(1);
        }
    };
    if let Err(e) = ensure_schema(database.get_pool()).await {
        tracing::error!(error = %e, "failed to prepare schema");
        std::process::exit(1);
    }

    tracing::info!(max_connections = config.database.max_connections, "booking engine starting");
    server::build(&config, database.get_pool().clone())
}
