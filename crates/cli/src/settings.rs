//! Service configuration
//!
//! Layers, last one wins per field:
//! 1. built-in presets (`comfy`, `ostris`)
//! 2. TOML file at `--config` / `$WARDEN_CONFIG`, else `<config dir>/warden/services.toml`
//! 3. environment, e.g. `WARDEN_SERVICES__COMFY__PORT=9001`
//!
//! String fields may reference `{name}`, `{port}`, `{host}`, `{install_dir}` and
//! `{python}` (the install dir's venv interpreter when present, else `python3`).

use crate::presets;
use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use warden_core::domain::{
    DomainError, FilePatch, ManagedService, ProcessSignature, ReadinessPolicy, WorkerSweep,
};

const CONFIG_FILE: &str = "services.toml";
const ENV_PREFIX: &str = "WARDEN";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReadinessConfig {
    pub interval_ms: Option<u64>,
    pub attempts: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PatchConfig {
    pub file: String,
    pub find: String,
    pub replace: String,
}

/// One `[services.<name>]` table. Every field is optional so a file entry can
/// override a single preset field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub port: Option<u16>,
    pub host: Option<String>,
    pub install_dir: Option<String>,
    pub working_dir: Option<String>,
    pub command: Option<Vec<String>>,
    pub signature: Option<ProcessSignature>,
    pub supervisors: Option<ProcessSignature>,
    pub worker_sweep: Option<WorkerSweep>,
    pub readiness: Option<ReadinessConfig>,
    pub stop_grace_ms: Option<u64>,
    pub pid_file: Option<String>,
    pub log_file: Option<String>,
    pub patches: Option<Vec<PatchConfig>>,
}

fn overlay<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

impl ServiceConfig {
    fn merge(&mut self, other: ServiceConfig) {
        overlay(&mut self.port, other.port);
        overlay(&mut self.host, other.host);
        overlay(&mut self.install_dir, other.install_dir);
        overlay(&mut self.working_dir, other.working_dir);
        overlay(&mut self.command, other.command);
        overlay(&mut self.signature, other.signature);
        overlay(&mut self.supervisors, other.supervisors);
        overlay(&mut self.worker_sweep, other.worker_sweep);
        overlay(&mut self.stop_grace_ms, other.stop_grace_ms);
        overlay(&mut self.pid_file, other.pid_file);
        overlay(&mut self.log_file, other.log_file);
        overlay(&mut self.patches, other.patches);

        if let Some(readiness) = other.readiness {
            let current = self.readiness.get_or_insert_with(ReadinessConfig::default);
            overlay(&mut current.interval_ms, readiness.interval_ms);
            overlay(&mut current.attempts, readiness.attempts);
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    services: BTreeMap<String, ServiceConfig>,
}

/// Default location of the services file
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "warden").map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

/// Merged service definitions, resolved lazily by name
#[derive(Debug, Clone)]
pub struct Settings {
    services: BTreeMap<String, ServiceConfig>,
}

impl Settings {
    /// Load presets plus overrides. An explicitly given file must exist; the
    /// default location is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let (path, required) = match explicit {
            Some(path) => (Some(path.to_path_buf()), true),
            None => (default_config_path(), false),
        };

        let mut builder = Config::builder();
        if let Some(path) = &path {
            tracing::debug!(path = %path.display(), required, "Reading services file");
            builder = builder
                .add_source(File::new(&path.to_string_lossy(), FileFormat::Toml).required(required));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let file: FileConfig = builder
            .build()
            .context("Failed to read service configuration")?
            .try_deserialize()
            .context("Invalid service configuration")?;

        Ok(Self::layered(presets::builtin(), file.services))
    }

    fn layered(
        mut base: BTreeMap<String, ServiceConfig>,
        overrides: BTreeMap<String, ServiceConfig>,
    ) -> Self {
        for (name, config) in overrides {
            base.entry(name).or_default().merge(config);
        }
        Self { services: base }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.services.keys().map(String::as_str)
    }

    /// Resolve a service by name into a validated definition
    pub fn service(&self, name: &str) -> std::result::Result<ManagedService, DomainError> {
        let config = self
            .services
            .get(name)
            .ok_or_else(|| DomainError::UnknownService(name.to_string()))?;
        resolve(name, config)
    }
}

/// Placeholder values for one service
struct Vars {
    name: String,
    port: String,
    host: String,
    install_dir: String,
    python: String,
}

impl Vars {
    fn new(name: &str, port: u16, host: &str, install_dir: &Path) -> Self {
        let venv_python = install_dir.join("venv").join("bin").join("python");
        let python = if venv_python.exists() {
            venv_python.to_string_lossy().into_owned()
        } else {
            "python3".to_string()
        };

        Self {
            name: name.to_string(),
            port: port.to_string(),
            host: host.to_string(),
            install_dir: install_dir.to_string_lossy().into_owned(),
            python,
        }
    }

    fn render(&self, template: &str) -> String {
        template
            .replace("{name}", &self.name)
            .replace("{port}", &self.port)
            .replace("{host}", &self.host)
            .replace("{install_dir}", &self.install_dir)
            .replace("{python}", &self.python)
    }

    fn path(&self, template: &str) -> PathBuf {
        expand_path(&self.render(template))
    }

    fn signature(&self, signature: &ProcessSignature) -> ProcessSignature {
        ProcessSignature {
            names: signature.names.iter().map(|p| self.render(p)).collect(),
            cmdline: signature.cmdline.iter().map(|p| self.render(p)).collect(),
        }
    }
}

fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

fn resolve(name: &str, config: &ServiceConfig) -> std::result::Result<ManagedService, DomainError> {
    let port = config
        .port
        .ok_or_else(|| DomainError::invalid(name, "missing `port`"))?;
    let install_dir = config
        .install_dir
        .as_deref()
        .map(expand_path)
        .ok_or_else(|| DomainError::invalid(name, "missing `install_dir`"))?;
    let command = config
        .command
        .as_ref()
        .ok_or_else(|| DomainError::invalid(name, "missing `command`"))?;

    let host = config.host.clone().unwrap_or_else(|| "localhost".to_string());
    let vars = Vars::new(name, port, &host, &install_dir);

    let command = command.iter().map(|arg| vars.render(arg)).collect();
    let mut service = ManagedService::new(name, port, &install_dir, command);
    service.host = host;

    if let Some(dir) = &config.working_dir {
        service = service.with_working_dir(vars.path(dir));
    }
    if let Some(signature) = &config.signature {
        service = service.with_signature(vars.signature(signature));
    }
    if let Some(supervisors) = &config.supervisors {
        service = service.with_supervisors(vars.signature(supervisors));
    }
    if let Some(sweep) = &config.worker_sweep {
        service = service.with_worker_sweep(sweep.clone());
    }
    if let Some(readiness) = &config.readiness {
        let defaults = ReadinessPolicy::default();
        service = service.with_readiness(ReadinessPolicy {
            interval: readiness
                .interval_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.interval),
            attempts: readiness.attempts.unwrap_or(defaults.attempts),
        });
    }
    if let Some(grace) = config.stop_grace_ms {
        service.stop_grace = Duration::from_millis(grace);
    }
    if let Some(pid_file) = &config.pid_file {
        service = service.with_pid_marker(vars.path(pid_file));
    }
    if let Some(log_file) = &config.log_file {
        service = service.with_log_sink(vars.path(log_file));
    }
    if let Some(patches) = &config.patches {
        service.patches = patches
            .iter()
            .map(|patch| FilePatch {
                file: vars.path(&patch.file),
                find: vars.render(&patch.find),
                replace: vars.render(&patch.replace),
            })
            .collect();
    }

    service.validate()?;
    Ok(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    impl Settings {
        fn builtin() -> Self {
            Self::layered(presets::builtin(), BTreeMap::new())
        }
    }

    fn temp_config(contents: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("warden-settings-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(CONFIG_FILE);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_builtin_presets_resolve() {
        let settings = Settings::builtin();

        let comfy = settings.service("comfy").unwrap();
        assert_eq!(comfy.port, 9000);
        assert_eq!(comfy.command.last().map(String::as_str), Some("9000"));
        assert!(comfy.command[1].ends_with("ComfyUI/main.py"));
        assert!(comfy.pid_marker.ends_with("comfyui.pid"));
        assert!(!comfy.signature.is_empty());

        let ostris = settings.service("ostris").unwrap();
        assert_eq!(ostris.port, 9000);
        assert!(ostris.working_dir.ends_with("ai-toolkit/ui"));
        assert_eq!(ostris.command, vec!["npm", "run", "build_and_start"]);
        assert!(ostris.worker_sweep.is_some());
        assert_eq!(ostris.patches.len(), 1);
        assert_eq!(ostris.patches[0].replace, "next start --port 9000");
    }

    #[test]
    fn test_unknown_service() {
        let err = Settings::builtin().service("nope").unwrap_err();
        assert_eq!(err, DomainError::UnknownService("nope".to_string()));
    }

    #[test]
    fn test_presets_share_the_gpu_port() {
        let settings = Settings::builtin();
        let comfy = settings.service("comfy").unwrap();
        let ostris = settings.service("ostris").unwrap();
        assert_eq!(comfy.port, ostris.port);
    }

    #[test]
    fn test_file_overrides_single_field() {
        let path = temp_config(
            r#"
            [services.comfy]
            port = 9100

            [services.comfy.readiness]
            attempts = 5
            "#,
        );

        let settings = Settings::load(Some(&path)).unwrap();
        let comfy = settings.service("comfy").unwrap();

        assert_eq!(comfy.port, 9100);
        // Templates see the overridden port
        assert_eq!(comfy.command.last().map(String::as_str), Some("9100"));
        assert_eq!(comfy.readiness.attempts, 5);
        assert_eq!(
            comfy.readiness.interval,
            ReadinessPolicy::default().interval
        );
        assert!(comfy.pid_marker.ends_with("comfyui.pid"));
    }

    #[test]
    fn test_file_defines_new_service() {
        let path = temp_config(
            r#"
            [services.webui]
            port = 7860
            install_dir = "/opt/webui"
            command = ["{install_dir}/webui.sh", "--port", "{port}"]
            stop_grace_ms = 250

            [services.webui.signature]
            cmdline = ["{install_dir}"]
            "#,
        );

        let settings = Settings::load(Some(&path)).unwrap();
        assert!(settings.names().any(|n| n == "webui"));

        let webui = settings.service("webui").unwrap();
        assert_eq!(webui.command, vec!["/opt/webui/webui.sh", "--port", "7860"]);
        assert_eq!(webui.signature.cmdline, vec!["/opt/webui"]);
        assert_eq!(webui.stop_grace, Duration::from_millis(250));
        assert_eq!(webui.url(), "http://localhost:7860");
    }

    #[test]
    fn test_incomplete_service_is_rejected() {
        let path = temp_config(
            r#"
            [services.half]
            port = 7000
            "#,
        );

        let settings = Settings::load(Some(&path)).unwrap();
        let err = settings.service("half").unwrap_err();
        assert!(matches!(err, DomainError::InvalidService { .. }));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let path = std::env::temp_dir().join(format!("warden-missing-{}.toml", uuid::Uuid::new_v4()));
        assert!(Settings::load(Some(&path)).is_err());
    }

    #[test]
    fn test_environment_override() {
        // Unique service name keeps this independent of parallel tests
        std::env::set_var("WARDEN_SERVICES__ENVPORT__PORT", "9321");
        let path = temp_config("");

        let settings = Settings::load(Some(&path)).unwrap();
        std::env::remove_var("WARDEN_SERVICES__ENVPORT__PORT");

        let err = settings.service("envport").unwrap_err();
        // Only the port came from the environment
        assert!(matches!(err, DomainError::InvalidService { .. }));
        assert_eq!(settings.services.get("envport").and_then(|c| c.port), Some(9321));
    }

    #[test]
    fn test_merge_keeps_unset_fields() {
        let mut base = presets::ostris();
        base.merge(ServiceConfig {
            stop_grace_ms: Some(1_000),
            ..Default::default()
        });
        assert_eq!(base.stop_grace_ms, Some(1_000));
        assert_eq!(base.port, Some(9000));
        assert!(base.supervisors.is_some());
    }
}
