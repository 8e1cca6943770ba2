use std::sync::Arc;

use anyhow::Context;

use clinic_api::app::{build_app, services};
use clinic_infra::ClinicConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    clinic_observability::init();

    let config = ClinicConfig::from_env().context("invalid configuration")?;
    let services = Arc::new(services::build_services(&config).await?);

    if config.seed_sample_data {
        let seeding = services.clone();
        let added = tokio::task::spawn_blocking(move || seeding.inventory.seed_sample_medications())
            .await
            .context("seed task failed")?
            .context("failed to seed sample medications")?;
        tracing::info!(added, "sample medications seeded");
    }

    let app = build_app(services);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
