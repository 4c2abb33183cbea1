//! Child specs for the `api` and `dev` launchers, built from settings.

use std::path::Path;

use anyhow::bail;
use libadmin_kernel::settings::LauncherSettings;

use crate::supervisor::ChildSpec;

/// The build tool invoked in the API directory with `args` passed through.
/// On Windows the tool is routed through `cmd.exe` so script wrappers resolve.
pub fn api_command(settings: &LauncherSettings, args: &[String]) -> anyhow::Result<ChildSpec> {
    if args.is_empty() {
        bail!("missing build-tool arguments, e.g. `libadmin api run --bin libadmin-app`");
    }

    let spec = if cfg!(windows) {
        ChildSpec::new("api", "cmd.exe")
            .args(["/d", "/s", "/c", settings.build_tool.as_str()])
            .args(args)
    } else {
        ChildSpec::new("api", settings.build_tool.as_str()).args(args)
    };

    Ok(spec.current_dir(&settings.api_dir))
}

/// Backend (this launcher re-invoked with `api`) and frontend dev server.
pub fn dev_commands(settings: &LauncherSettings, launcher: &Path) -> Vec<ChildSpec> {
    let backend = ChildSpec::new("backend", launcher)
        .arg("api")
        .args(&settings.backend_args);

    let frontend = ChildSpec::new("frontend", settings.web_tool.as_str())
        .arg("--prefix")
        .arg(&settings.web_dir)
        .arg("run")
        .arg(settings.web_script.as_str());

    vec![backend, frontend]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use std::path::PathBuf;

    fn os(items: &[&str]) -> Vec<OsString> {
        items.iter().map(OsString::from).collect()
    }

    #[test]
    fn api_requires_arguments() {
        let err = api_command(&LauncherSettings::default(), &[]).unwrap_err();
        assert!(err.to_string().contains("missing build-tool arguments"));
    }

    #[test]
    fn api_forwards_arguments_in_api_dir() {
        let settings = LauncherSettings {
            api_dir: PathBuf::from("apps/api"),
            ..LauncherSettings::default()
        };
        let args = vec!["run".to_string(), "--release".to_string()];
        let spec = api_command(&settings, &args).unwrap();

        assert_eq!(spec.name, "api");
        assert_eq!(spec.cwd, Some(PathBuf::from("apps/api")));
        if cfg!(windows) {
            assert_eq!(spec.program, "cmd.exe");
            assert_eq!(spec.args, os(&["/d", "/s", "/c", "cargo", "run", "--release"]));
        } else {
            assert_eq!(spec.program, "cargo");
            assert_eq!(spec.args, os(&["run", "--release"]));
        }
    }

    #[test]
    fn dev_runs_backend_and_frontend() {
        let settings = LauncherSettings::default();
        let specs = dev_commands(&settings, Path::new("/usr/local/bin/libadmin"));

        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].name, "backend");
        assert_eq!(specs[0].program, "/usr/local/bin/libadmin");
        assert_eq!(specs[0].args, os(&["api", "run", "--bin", "libadmin-app"]));

        assert_eq!(specs[1].name, "frontend");
        assert_eq!(specs[1].program, settings.web_tool.as_str());
        assert_eq!(
            specs[1].args,
            os(&["--prefix", "apps/web/library-mini-admin-web", "run", "dev"])
        );
    }
}
