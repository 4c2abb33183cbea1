use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use libadmin_kernel::settings::Settings;

#[derive(Debug, Parser)]
#[command(name = "libadmin", version, about = "Library mini admin service and dev launchers")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP service until Ctrl+C or SIGTERM
    Serve,
    /// Run backend and frontend dev servers together; stops both when either exits
    Dev,
    /// Run the backend build tool in the API directory, forwarding every argument
    Api {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "ARGS")]
        args: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let settings = Settings::load().with_context(|| "failed to load settings")?;
    libadmin_telemetry::init(&settings.telemetry)?;

    let code = match cli.command {
        Command::Serve => {
            tracing::info!(env = ?settings.environment, port = settings.server.port, "serving");
            libadmin_app::run(settings).await?;
            0
        }
        Command::Dev => {
            let launcher = std::env::current_exe().context("cannot locate the libadmin executable")?;
            libadmin_launcher::run_dev(&settings.launcher, &launcher, libadmin_http::shutdown_signal())
                .await
        }
        Command::Api { args } => {
            libadmin_launcher::run_api(&settings.launcher, &args, libadmin_http::shutdown_signal())
                .await
        }
    };

    Ok(exit_code(code))
}

fn exit_code(code: i32) -> ExitCode {
    u8::try_from(code).map(ExitCode::from).unwrap_or(ExitCode::FAILURE)
}
