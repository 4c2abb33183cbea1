use anyhow::Context;
use libadmin_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load settings")?;
    libadmin_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        port = settings.server.port,
        "libadmin-app bootstrap starting"
    );

    libadmin_app::run(settings).await
}
