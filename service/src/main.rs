use policyforge_common::{builtin_templates, database, load_frameworks};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::domain::AppState;
use crate::domain::repository::TemplateRepository;
use crate::infrastructure::AppStateImpl;
use crate::infrastructure::auth::AuthContext;
use crate::infrastructure::http::{HttpServer, HttpServerConfig};
use crate::infrastructure::settings::Settings;

mod domain;
mod infrastructure;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let frameworks = load_frameworks(&settings.frameworks_data_path)?;
    println!("Frameworks loaded");

    let database = database::connect(&settings.database).await?;
    println!("Connected to DB");

    let state = AppStateImpl::new(database, frameworks);

    state
        .templates()
        .seed(builtin_templates())
        .await
        .map_err(|e| anyhow::anyhow!("failed to seed templates: {:?}", e))?;
    println!("Templates seeded");

    let auth = AuthContext::new(&settings.auth.jwt_secret);
    let server_config = HttpServerConfig {
        port: &settings.server_port,
    };
    let http_server = HttpServer::new(state, auth, server_config).await?;
    http_server.run().await
}
