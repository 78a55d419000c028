use dotenvy::dotenv;
use expense_ledger::{
    infrastructure::{config::Config, db},
    telemetry,
};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    telemetry::init();

    let config = Config::from_env()?;
    if !config.requires_database() {
        anyhow::bail!(
            "store provider `{}` has no schema to migrate",
            config.store.provider
        );
    }
    let pool = db::connect(&config.database).await?;
    db::run_migrations(&pool).await?;

    info!("expense ledger schema is up to date");

    Ok(())
}
