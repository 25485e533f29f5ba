// PID marker implementation (plain integer text file)
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::warn;

use warden_core::port::{MarkerError, PidMarkerStore};

/// Marker stored as a decimal pid in a text file
pub struct FilePidMarkerStore;

fn io_error(path: &Path, e: std::io::Error) -> MarkerError {
    MarkerError::Io {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

impl PidMarkerStore for FilePidMarkerStore {
    fn read(&self, path: &Path) -> Result<Option<u32>, MarkerError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(path, e)),
        };

        match content.trim().parse::<u32>() {
            Ok(pid) => Ok(Some(pid)),
            Err(_) => {
                warn!(path = %path.display(), "PID marker does not contain a pid, ignoring");
                Ok(None)
            }
        }
    }

    fn write(&self, path: &Path, pid: u32) -> Result<(), MarkerError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| io_error(path, e))?;
        }
        fs::write(path, pid.to_string()).map_err(|e| io_error(path, e))
    }

    fn remove(&self, path: &Path) -> Result<bool, MarkerError> {
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_error(path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_marker() -> PathBuf {
        std::env::temp_dir()
            .join(format!("warden-test-{}", uuid::Uuid::new_v4()))
            .join("svc.pid")
    }

    #[test]
    fn test_write_read_remove() {
        let path = temp_marker();
        let store = FilePidMarkerStore;

        assert_eq!(store.read(&path).unwrap(), None);

        store.write(&path, 4321).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "4321");
        assert_eq!(store.read(&path).unwrap(), Some(4321));

        assert!(store.remove(&path).unwrap());
        assert!(!store.remove(&path).unwrap());
        assert_eq!(store.read(&path).unwrap(), None);

        let _ = fs::remove_dir(path.parent().unwrap());
    }

    #[test]
    fn test_garbage_marker_reads_as_none() {
        let path = temp_marker();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "not-a-pid\n").unwrap();

        assert_eq!(FilePidMarkerStore.read(&path).unwrap(), None);

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_trailing_newline_is_accepted() {
        let path = temp_marker();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "99\n").unwrap();

        assert_eq!(FilePidMarkerStore.read(&path).unwrap(), Some(99));

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}
