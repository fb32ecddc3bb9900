//! A [`HostCapabilities`] wired to the bundled fixture script instead of a
//! real AI CLI. Exists so the whole stack (queueing, the pseudoterminal
//! adapter, the stream parser, the completion enforcer) can be exercised
//! end to end without a model in the loop.

use std::collections::HashMap;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use overseer_core::{HostCapabilities, TaskCallbacks, TaskConfig, TaskId};
use tempfile::TempPath;

const FIXTURE_SCRIPT: &str = include_str!("../fixtures/demo_cli.sh");

/// Writes the bundled fixture out to a real executable file on
/// construction and reuses that one file for every spawn; the adapter
/// only ever needs a path, never the script's contents directly.
pub struct DemoHost {
    script_path: TempPath,
}

impl DemoHost {
    pub fn install() -> anyhow::Result<Self> {
        let mut file = tempfile::Builder::new().prefix("overseer-demo-cli-").suffix(".sh").tempfile()?;
        file.write_all(FIXTURE_SCRIPT.as_bytes())?;
        file.flush()?;
        set_executable(file.path())?;
        Ok(Self {
            script_path: file.into_temp_path(),
        })
    }
}

#[cfg(unix)]
fn set_executable(path: &Path) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = std::fs::metadata(path)?.permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> anyhow::Result<()> {
    Ok(())
}

impl HostCapabilities for DemoHost {
    fn cli_command(&self) -> (PathBuf, Vec<String>) {
        (self.script_path.to_path_buf(), Vec::new())
    }

    fn build_cli_args(&self, _config: &TaskConfig) -> Vec<String> {
        Vec::new()
    }

    fn build_environment(&self, _task_id: &TaskId) -> HashMap<String, String> {
        HashMap::new()
    }

    fn is_cli_available(&self) -> bool {
        self.script_path.exists()
    }

    fn on_before_task_start(&self, _callbacks: &dyn TaskCallbacks, is_first_task: bool) {
        if is_first_task {
            tracing::info!("starting the first task on this demo host");
        }
    }

    fn model_display_name(&self, _model_id: &str) -> Option<String> {
        Some("Demo Fixture Model".to_string())
    }
}
