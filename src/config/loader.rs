//! Layered directory loader
//!
//! Folds an ordered list of directories into one [`Config`]. Later
//! directories win on overlapping keys; unknown fields from earlier layers
//! survive where not overridden. A missing directory is a caller error, a
//! missing well-known file inside an existing directory just contributes
//! nothing for that document.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::debug;

use super::{Config, ConfigError};
use crate::document::Document;

/// A file that contributed to a loaded config, with its content digest
#[derive(Debug, Clone)]
pub struct LayerSource {
    pub path: PathBuf,
    /// SHA-256 of the raw file bytes
    pub digest: String,
}

/// Loads configuration layers from directories, in precedence order
#[derive(Debug, Default)]
pub struct Loader {
    dirs: Vec<PathBuf>,
    sources: Vec<LayerSource>,
}

impl Loader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a directory layer; later layers take precedence
    pub fn push_dir(&mut self, dir: impl Into<PathBuf>) {
        self.dirs.push(dir.into());
    }

    /// Load and fold all layers into one config
    pub fn load(&mut self) -> Result<Config, ConfigError> {
        self.sources.clear();
        let mut config = Config::default();
        for dir in self.dirs.clone() {
            let layer = self.load_dir(&dir)?;
            config.merge(&layer)?;
        }
        Ok(config)
    }

    /// Files that contributed to the last `load`, in fold order
    pub fn sources(&self) -> &[LayerSource] {
        &self.sources
    }

    fn load_dir(&mut self, dir: &Path) -> Result<Config, ConfigError> {
        // Directory absence is an explicit caller error, unlike a missing
        // file within an existing directory.
        fs::metadata(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let config = Config {
            meta_data: self.read_document(dir)?,
            user_data: self.read_document(dir)?,
            network_config: self.read_document(dir)?,
        };
        Ok(config)
    }

    fn read_document<D: Document>(&mut self, dir: &Path) -> Result<Option<D>, ConfigError> {
        let path = dir.join(D::FILE_NAME);
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(ConfigError::Io { path, source }),
        };

        let doc = D::unmarshal(&data)
            .map_err(|source| ConfigError::ParseFile {
                path: path.clone(),
                source,
            })?;

        debug!(path = %path.display(), bytes = data.len(), "loaded layer document");
        self.sources.push(LayerSource {
            path,
            digest: hex::encode(Sha256::digest(&data)),
        });
        Ok(Some(doc))
    }
}

/// Load a config from directories in precedence order (later dirs win)
pub fn config_from_dirs(dirs: &[PathBuf]) -> Result<Config, ConfigError> {
    let mut loader = Loader::new();
    for dir in dirs {
        loader.push_dir(dir);
    }
    loader.load()
}
