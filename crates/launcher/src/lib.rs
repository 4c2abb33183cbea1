//! Development launchers.
//!
//! `api` runs the backend build tool with every argument passed through and
//! exits with the tool's status. `dev` runs the backend and the web frontend
//! together and stops both as soon as either exits or an interrupt arrives.

pub mod commands;
pub mod supervisor;

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use libadmin_kernel::settings::LauncherSettings;

pub use commands::{api_command, dev_commands};
pub use supervisor::{supervise, ChildSpec, Outcome};

/// Run the build tool and return the exit code to leave with. When
/// `shutdown` resolves first the tool is asked to stop and the code is 0.
pub async fn run_api<F>(settings: &LauncherSettings, args: &[String], shutdown: F) -> i32
where
    F: Future<Output = ()>,
{
    let spec = match api_command(settings, args) {
        Ok(spec) => spec,
        Err(e) => {
            tracing::error!(error = %e, "cannot run build tool");
            return 1;
        }
    };

    supervise(vec![spec], shutdown, stop_grace(settings))
        .await
        .forwarded_exit_code()
}

/// Run backend and frontend until one exits or `shutdown` resolves.
pub async fn run_dev<F>(settings: &LauncherSettings, launcher: &Path, shutdown: F) -> i32
where
    F: Future<Output = ()>,
{
    let specs = dev_commands(settings, launcher);
    tracing::info!(
        web_dir = %settings.web_dir.display(),
        script = %settings.web_script,
        "starting backend and frontend"
    );
    supervise(specs, shutdown, stop_grace(settings))
        .await
        .exit_code()
}

fn stop_grace(settings: &LauncherSettings) -> Duration {
    Duration::from_millis(settings.stop_grace_ms)
}
