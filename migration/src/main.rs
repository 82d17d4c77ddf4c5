use crate::{
    domain::{migration::migration_steps, tables::schema_tables},
    infrastructure::{persistence::PersistenceAdapter, settings::Settings},
};
use policyforge_common::database;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod domain;
pub mod infrastructure;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database = database::connect(&settings.database).await?;
    println!("Connected to DB");

    let persistence = PersistenceAdapter::new(database);

    // create the policyforge tables that are not there yet
    let existing = persistence.load_existing_tables().await?;
    let steps = migration_steps(persistence.database_schema(), schema_tables(), &existing);
    let count = steps.len();
    persistence.apply_migration_steps(steps).await?;
    println!("Schema migrated, {} table(s) created", count);

    Ok(())
}
