//! Reading and writing the farm snapshot file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tilth_core::SimulationContext;
use tracing::{debug, warn};

use crate::error::EngineError;

/// Read the snapshot file if it exists.
///
/// A missing file is not an error; an unreadable one is logged and
/// treated as missing so the engine still starts.
pub fn read_snapshot(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(json) => Some(json),
        Err(e) if e.kind() == ErrorKind::NotFound => None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "snapshot unreadable, starting a new farm");
            None
        }
    }
}

/// Write the farm to `path`, replacing any previous snapshot.
///
/// The JSON goes to a sibling temp file first and is renamed into place,
/// so a crash never leaves a half-written snapshot behind.
///
/// # Errors
///
/// Returns [`EngineError`] if encoding or any file operation fails.
pub fn write_snapshot(path: &Path, context: &SimulationContext) -> Result<(), EngineError> {
    let json = context.export_snapshot().to_json()?;
    let tmp = temp_path(path);
    std::fs::write(&tmp, json).map_err(|source| EngineError::Io {
        path: tmp.clone(),
        source,
    })?;
    std::fs::rename(&tmp, path).map_err(|source| EngineError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), tick = context.tick(), "snapshot written");
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(ToOwned::to_owned).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tilth_core::{FarmSnapshot, SimulationConfig};

    use super::*;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("tilth-{}-{name}", std::process::id()))
    }

    #[test]
    fn missing_file_reads_as_none() {
        assert!(read_snapshot(&scratch("absent.json")).is_none());
    }

    #[test]
    fn written_snapshot_reads_back() {
        let path = scratch("roundtrip.json");
        let context = SimulationContext::new(SimulationConfig::default()).unwrap();
        write_snapshot(&path, &context).unwrap();

        let json = read_snapshot(&path).unwrap();
        let snapshot = FarmSnapshot::from_json(&json).unwrap();
        assert_eq!(snapshot, context.export_snapshot());
        assert!(!temp_path(&path).exists());
        std::fs::remove_file(&path).unwrap();
    }
}
