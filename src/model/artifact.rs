//! Single-file model persistence (bincode)

use std::fs;
use std::path::Path;

use super::{ModelError, VentilatorModel};
use crate::features::layout_hash;

impl VentilatorModel {
    /// Write scaler + regressor + metadata to `path`, replacing any existing file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ModelError> {
        let path = path.as_ref();
        let bytes = bincode::serialize(self)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ModelError::Io {
                path: parent.display().to_string(),
                source,
            })?;
        }

        fs::write(path, &bytes).map_err(|source| ModelError::Io {
            path: path.display().to_string(),
            source,
        })?;

        tracing::info!("Model saved to {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }

    /// Read a model written by [`VentilatorModel::save`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| ModelError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let model: VentilatorModel = bincode::deserialize(&bytes)?;
        if !model.layout.is_current() {
            return Err(ModelError::LayoutMismatch {
                expected: layout_hash(),
                found: model.layout.hash,
            });
        }

        tracing::info!("Model loaded from {} (type: {})", path.display(), model.kind);
        Ok(model)
    }
}
