//! File-backed image store.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use gol_core::config::IoConfig;
use gol_core::io::{ImageStore, IoError};
use tracing::debug;

use crate::pgm;

/// Reads input grids from `images_dir` and writes snapshots to `output_dir`.
///
/// Images are stored as `<label>.pgm`. The output directory is created on
/// the first write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PgmStore {
    images_dir: PathBuf,
    output_dir: PathBuf,
}

impl PgmStore {
    /// Create a store over the given directories.
    pub fn new(images_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            images_dir: images_dir.into(),
            output_dir: output_dir.into(),
        }
    }

    /// Create a store from the `io` section of the configuration.
    pub fn from_config(config: &IoConfig) -> Self {
        Self::new(&config.images_dir, &config.output_dir)
    }

    /// Path an input image with `label` is read from.
    pub fn input_path(&self, label: &str) -> PathBuf {
        image_path(&self.images_dir, label)
    }

    /// Path a snapshot with `label` is written to.
    pub fn output_path(&self, label: &str) -> PathBuf {
        image_path(&self.output_dir, label)
    }
}

fn image_path(dir: &Path, label: &str) -> PathBuf {
    dir.join(format!("{label}.pgm"))
}

fn store_error(label: &str, message: impl ToString) -> IoError {
    IoError::Store {
        label: label.to_owned(),
        message: message.to_string(),
    }
}

impl ImageStore for PgmStore {
    fn read(&mut self, label: &str, width: usize, height: usize) -> Result<Vec<u8>, IoError> {
        let path = self.input_path(label);
        let bytes = fs::read(&path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                IoError::NotFound {
                    label: label.to_owned(),
                }
            } else {
                store_error(label, format!("{}: {e}", path.display()))
            }
        })?;

        let image =
            pgm::decode(&bytes).map_err(|e| store_error(label, format!("{}: {e}", path.display())))?;
        if image.width != width || image.height != height {
            return Err(IoError::DimensionMismatch {
                label: label.to_owned(),
                width,
                height,
                actual_width: image.width,
                actual_height: image.height,
            });
        }

        debug!(path = %path.display(), width, height, "PGM file read");
        Ok(image.pixels)
    }

    fn write(
        &mut self,
        label: &str,
        width: usize,
        height: usize,
        cells: &[u8],
    ) -> Result<(), IoError> {
        fs::create_dir_all(&self.output_dir).map_err(|e| {
            store_error(label, format!("{}: {e}", self.output_dir.display()))
        })?;

        let bytes = pgm::encode(width, height, cells).map_err(|e| store_error(label, e))?;
        let path = self.output_path(label);
        fs::write(&path, bytes).map_err(|e| store_error(label, format!("{}: {e}", path.display())))?;

        debug!(path = %path.display(), width, height, "PGM file written");
        Ok(())
    }
}
