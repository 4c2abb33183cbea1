//! Library mini admin service.
//!
//! Hosts the inventory ledger behind the HTTP console API and runs the
//! module lifecycle around the server.

pub mod modules;
pub mod utils;

use anyhow::Context;
use libadmin_kernel::{settings::Settings, InitCtx, ModuleRegistry};

/// Registry holding every module of the service
pub fn build_registry(settings: &Settings) -> anyhow::Result<ModuleRegistry> {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, settings)
        .context("failed to register modules")?;
    Ok(registry)
}

/// Run the service until Ctrl+C or SIGTERM, then stop modules in reverse order
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let registry = build_registry(&settings)?;
    let ctx = InitCtx {
        settings: &settings,
    };

    registry.init_all(&ctx).await?;
    registry.start_all(&ctx).await?;

    let served = libadmin_http::start_server(
        &registry,
        &settings,
        libadmin_http::shutdown_signal(),
    )
    .await;

    registry.stop_all().await?;
    served
}
