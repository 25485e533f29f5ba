//! Built-in service definitions
//!
//! Both presets bind port 9000 on purpose: only one GPU-heavy UI may hold the
//! card at a time, and the shared port makes the second one refuse to start.

use crate::settings::{PatchConfig, ServiceConfig};
use std::collections::BTreeMap;
use warden_core::domain::{ProcessSignature, WorkerSweep};

pub const COMFY: &str = "comfy";
pub const OSTRIS: &str = "ostris";

const SHARED_GPU_PORT: u16 = 9000;

fn temp_path(file: &str) -> String {
    std::env::temp_dir().join(file).to_string_lossy().into_owned()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// ComfyUI, run from its own venv when it has one
pub fn comfy() -> ServiceConfig {
    ServiceConfig {
        port: Some(SHARED_GPU_PORT),
        install_dir: Some("~/ComfyUI".to_string()),
        command: Some(strings(&[
            "{python}",
            "{install_dir}/main.py",
            "--listen",
            "0.0.0.0",
            "--port",
            "{port}",
        ])),
        signature: Some(ProcessSignature::new().cmdline("{install_dir}")),
        pid_file: Some(temp_path("comfyui.pid")),
        log_file: Some(temp_path("comfyui.log")),
        ..Default::default()
    }
}

/// Ostris AI-Toolkit web UI (Next.js under npm + concurrently)
pub fn ostris() -> ServiceConfig {
    ServiceConfig {
        port: Some(SHARED_GPU_PORT),
        install_dir: Some("~/ai-toolkit".to_string()),
        working_dir: Some("{install_dir}/ui".to_string()),
        command: Some(strings(&["npm", "run", "build_and_start"])),
        signature: Some(ProcessSignature::new().name("node").name("next")),
        supervisors: Some(
            ProcessSignature::new()
                .name("npm")
                .name("sh")
                .cmdline("concurrently"),
        ),
        worker_sweep: Some(WorkerSweep {
            interpreter: "python".to_string(),
            script: Some("run.py".to_string()),
        }),
        pid_file: Some(temp_path("ostris.pid")),
        log_file: Some(temp_path("ostris.log")),
        patches: Some(vec![PatchConfig {
            file: "package.json".to_string(),
            find: "next start --port 8675".to_string(),
            replace: "next start --port {port}".to_string(),
        }]),
        ..Default::default()
    }
}

pub fn builtin() -> BTreeMap<String, ServiceConfig> {
    BTreeMap::from([(COMFY.to_string(), comfy()), (OSTRIS.to_string(), ostris())])
}
