use async_trait::async_trait;
use axum::Router;

/// What a module sees during `init` and `start`.
pub struct InitCtx<'a> {
    pub settings: &'a crate::settings::Settings,
}

/// A unit of the service: its routes, API documentation and lifecycle hooks.
///
/// The registry drives every module through `init`, then `start`, and calls
/// `stop` in reverse registration order on shutdown.
#[async_trait]
pub trait Module: Sync + Send {
    fn name(&self) -> &'static str;

    /// Prefix the module's routes and OpenAPI paths are mounted under
    fn mount_path(&self) -> String {
        format!("/api/{}", self.name())
    }

    /// Runs before anything is served
    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
    }

    /// OpenAPI fragment with `paths` relative to [`Module::mount_path`] and
    /// optional `components.schemas`.
    fn openapi(&self) -> Option<serde_json::Value> {
        None
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
