// Process spawner implementation
// reason: tokio::process for spawning, nix::setsid to detach from the terminal
use async_trait::async_trait;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{info, warn};

use crate::file_patch::apply_patches;
use warden_core::domain::{ManagedService, ProcessIdentity};
use warden_core::port::{ForegroundExit, LaunchError, ProcessSpawner};

/// Spawns service commands on the local host
pub struct DetachedSpawner;

impl DetachedSpawner {
    /// Check working dir and executable before touching anything
    fn preflight(service: &ManagedService) -> Result<(), LaunchError> {
        if !service.working_dir.is_dir() {
            return Err(LaunchError::WorkingDirMissing(service.working_dir.clone()));
        }

        let executable = service
            .executable()
            .ok_or_else(|| LaunchError::ExecutableNotFound(String::new()))?;
        if resolve_executable(executable, &service.working_dir).is_none() {
            return Err(LaunchError::ExecutableNotFound(executable.to_string()));
        }
        Ok(())
    }

    /// Truncate the log sink and stamp it with a session header
    fn open_log_sink(service: &ManagedService) -> Result<File, LaunchError> {
        let sink_error = |e: std::io::Error| LaunchError::LogSink {
            path: service.log_sink.clone(),
            reason: e.to_string(),
        };

        if let Some(parent) = service.log_sink.parent() {
            fs::create_dir_all(parent).map_err(sink_error)?;
        }
        let mut log = File::create(&service.log_sink).map_err(sink_error)?;
        writeln!(
            log,
            "=== {} started {} :: {} ===",
            service.name,
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            service.command.join(" ")
        )
        .map_err(sink_error)?;
        Ok(log)
    }

    fn command(service: &ManagedService) -> Command {
        let mut cmd = Command::new(&service.command[0]);
        cmd.args(&service.command[1..])
            .current_dir(&service.working_dir)
            .kill_on_drop(false);
        cmd
    }
}

#[async_trait]
impl ProcessSpawner for DetachedSpawner {
    async fn spawn_detached(
        &self,
        service: &ManagedService,
    ) -> Result<ProcessIdentity, LaunchError> {
        Self::preflight(service)?;
        apply_patches(service)?;

        let stdout = Self::open_log_sink(service)?;
        let stderr = stdout.try_clone().map_err(|e| LaunchError::LogSink {
            path: service.log_sink.clone(),
            reason: e.to_string(),
        })?;

        let mut cmd = Self::command(service);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr));

        // New session: the service survives the terminal and this process
        unsafe {
            cmd.pre_exec(|| {
                nix::unistd::setsid()
                    .map(|_| ())
                    .map_err(std::io::Error::from)
            });
        }

        let child = cmd
            .spawn()
            .map_err(|e| LaunchError::SpawnFailed(e.to_string()))?;
        let pid = child
            .id()
            .ok_or_else(|| LaunchError::SpawnFailed("process exited immediately".to_string()))?;

        info!(
            service = %service.name,
            pid = %pid,
            log_sink = %service.log_sink.display(),
            "Spawned detached process"
        );

        // Dropping the handle leaves the process running
        drop(child);

        let name = Path::new(&service.command[0])
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| service.command[0].clone());

        Ok(ProcessIdentity::new(pid, name, service.command.clone()).with_parent(std::process::id()))
    }

    async fn run_foreground(
        &self,
        service: &ManagedService,
    ) -> Result<ForegroundExit, LaunchError> {
        Self::preflight(service)?;
        apply_patches(service)?;

        let mut child = Self::command(service)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| LaunchError::SpawnFailed(e.to_string()))?;

        tokio::select! {
            status = child.wait() => {
                let status = status.map_err(|e| LaunchError::SpawnFailed(e.to_string()))?;
                info!(service = %service.name, code = ?status.code(), "Foreground process exited");
                Ok(ForegroundExit::Exited(status.code()))
            }
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    warn!(error = %e, "Failed to listen for Ctrl+C");
                }
                info!(service = %service.name, "Interrupted by operator");
                Ok(ForegroundExit::Interrupted)
            }
        }
    }
}

/// Locate an executable the way the spawned command will: absolute paths as
/// is, relative paths with a separator against the working dir, bare names on PATH.
fn resolve_executable(executable: &str, working_dir: &Path) -> Option<PathBuf> {
    let candidate = Path::new(executable);
    if candidate.is_absolute() {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }
    if executable.contains('/') {
        let joined = working_dir.join(candidate);
        return joined.is_file().then_some(joined);
    }

    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(executable))
        .find(|path| path.is_file())
}
