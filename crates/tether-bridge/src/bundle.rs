use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::BridgeError;

/// A module bundle staged on disk for the kernel to ingest.
///
/// Staging creates a private temporary directory and writes the bundle
/// into it; dropping the `StagedBundle` deletes the directory. Because the
/// bundle is typically bound to a scope around `load_module`, deletion is
/// guaranteed on every exit path, including unwind.
#[derive(Debug)]
pub struct StagedBundle {
    // Held for its Drop; the TempDir removes itself and its contents.
    _dir: TempDir,
    path: PathBuf,
}

impl StagedBundle {
    /// Write `bytes` to a fresh staging directory under `file_name`.
    pub fn stage(file_name: &str, bytes: &[u8]) -> Result<Self, BridgeError> {
        if file_name.is_empty() || file_name.contains(['/', '\\']) {
            return Err(BridgeError::Extraction(format!(
                "invalid bundle file name: {file_name:?}"
            )));
        }

        let dir = tempfile::Builder::new()
            .prefix("tether-bundle")
            .tempdir()
            .map_err(|e| BridgeError::Extraction(format!("cannot create staging directory: {e}")))?;

        let path = dir.path().join(file_name);
        std::fs::write(&path, bytes)
            .map_err(|e| BridgeError::Extraction(format!("cannot write {}: {e}", path.display())))?;

        tracing::debug!(path = %path.display(), "Module bundle staged");

        Ok(Self { _dir: dir, path })
    }

    /// Location of the staged bundle, valid until drop.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
