// Pre-launch file patches (e.g. forcing the port in package.json)
use std::fs;
use tracing::{debug, info};

use warden_core::domain::ManagedService;
use warden_core::port::LaunchError;

/// Apply every configured patch whose `find` text is present.
/// Missing files are skipped. Returns the number of files rewritten.
pub fn apply_patches(service: &ManagedService) -> Result<usize, LaunchError> {
    let mut applied = 0;

    for patch in &service.patches {
        let path = service.patch_path(patch);
        if patch.find.is_empty() || !path.exists() {
            debug!(path = %path.display(), "Patch target missing, skipping");
            continue;
        }

        let content = fs::read_to_string(&path).map_err(|e| LaunchError::Patch {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        if !content.contains(patch.find.as_str()) {
            continue;
        }

        info!(path = %path.display(), find = %patch.find, replace = %patch.replace, "Patching file");
        fs::write(&path, content.replace(patch.find.as_str(), &patch.replace)).map_err(|e| {
            LaunchError::Patch {
                path: path.clone(),
                reason: e.to_string(),
            }
        })?;
        applied += 1;
    }

    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use warden_core::domain::FilePatch;

    #[test]
    fn test_patch_rewrites_port_once() {
        let dir = std::env::temp_dir().join(format!("warden-patch-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        let pkg = dir.join("package.json");
        fs::write(&pkg, r#"{"scripts": {"start": "next start --port 8675"}}"#).unwrap();

        let mut service = ManagedService::new("ostris", 9000, &dir, vec!["npm".to_string()]);
        service.patches.push(FilePatch {
            file: PathBuf::from("package.json"),
            find: "next start --port 8675".to_string(),
            replace: "next start --port 9000".to_string(),
        });
        service.patches.push(FilePatch {
            file: PathBuf::from("missing.json"),
            find: "x".to_string(),
            replace: "y".to_string(),
        });

        assert_eq!(apply_patches(&service).unwrap(), 1);
        assert!(fs::read_to_string(&pkg)
            .unwrap()
            .contains("next start --port 9000"));

        // Already patched
        assert_eq!(apply_patches(&service).unwrap(), 0);

        let _ = fs::remove_dir_all(&dir);
    }
}
