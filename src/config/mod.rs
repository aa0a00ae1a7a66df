//! Config aggregate and writers
//!
//! A [`Config`] holds at most one of each cloud-init document. Absence of a
//! document is meaningful and preserved through merges: only a directory
//! layer or an overlay that actually carries a document contributes one.

mod defaults;
mod loader;

pub use defaults::{default_config, LocalDefaults};
pub use loader::{config_from_dirs, LayerSource, Loader};

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::document::{Document, MetaData, NetworkConfig, ParseError, UserData};
use crate::iso::{IsoError, IsoWriter};

/// ISO9660 volume label the NoCloud datasource requires for discovery
pub const VOLUME_ID: &str = "cidata";

/// Errors for loading, merging and writing configurations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    ParseFile {
        path: PathBuf,
        source: ParseError,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Iso(#[from] IsoError),
}

/// The full cloud-init configuration for one machine
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub meta_data: Option<MetaData>,
    pub user_data: Option<UserData>,
    pub network_config: Option<NetworkConfig>,
}

impl Config {
    /// Merge `overlay` into this config, document by document.
    ///
    /// A document absent in the overlay leaves the base document (including
    /// its absence) untouched; a document absent in the base is deep-copied
    /// from the overlay.
    pub fn merge(&mut self, overlay: &Config) -> Result<(), ConfigError> {
        merge_document(&mut self.meta_data, &overlay.meta_data)?;
        merge_document(&mut self.user_data, &overlay.user_data)?;
        merge_document(&mut self.network_config, &overlay.network_config)?;
        Ok(())
    }

    /// Write the present documents to `dir` under their well-known names,
    /// creating the directory if needed
    pub fn to_dir(&self, dir: &Path) -> Result<(), ConfigError> {
        fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        write_document(dir, &self.meta_data)?;
        write_document(dir, &self.user_data)?;
        write_document(dir, &self.network_config)?;
        Ok(())
    }

    /// Build an ISO9660 image holding the same files `to_dir` would write,
    /// under the `cidata` volume label
    pub fn iso(&self) -> Result<Vec<u8>, ConfigError> {
        let mut writer = IsoWriter::new(VOLUME_ID);
        add_document(&mut writer, &self.meta_data)?;
        add_document(&mut writer, &self.user_data)?;
        add_document(&mut writer, &self.network_config)?;
        Ok(writer.build()?)
    }

    /// Render all present documents as one annotated text block
    pub fn render(&self) -> Result<String, ConfigError> {
        let mut out = String::new();
        render_document(&mut out, &self.meta_data)?;
        render_document(&mut out, &self.user_data)?;
        render_document(&mut out, &self.network_config)?;
        Ok(out)
    }
}

fn merge_document<D: Document>(
    base: &mut Option<D>,
    overlay: &Option<D>,
) -> Result<(), ConfigError> {
    match (base.as_mut(), overlay) {
        (_, None) => Ok(()),
        (None, Some(overlay)) => {
            *base = Some(overlay.clone());
            Ok(())
        }
        (Some(base), Some(overlay)) => Ok(base.merge(overlay)?),
    }
}

fn write_document<D: Document>(dir: &Path, doc: &Option<D>) -> Result<(), ConfigError> {
    let Some(doc) = doc else {
        return Ok(());
    };
    let path = dir.join(D::FILE_NAME);
    let data = doc.marshal()?;
    debug!(path = %path.display(), bytes = data.len(), "writing document");
    fs::write(&path, data).map_err(|source| ConfigError::Io { path, source })
}

fn add_document<D: Document>(writer: &mut IsoWriter, doc: &Option<D>) -> Result<(), ConfigError> {
    if let Some(doc) = doc {
        writer.add_file(D::FILE_NAME, doc.marshal()?);
    }
    Ok(())
}

fn render_document<D: Document>(out: &mut String, doc: &Option<D>) -> Result<(), ConfigError> {
    let Some(doc) = doc else {
        return Ok(());
    };
    let body = String::from_utf8_lossy(&doc.marshal()?).into_owned();
    out.push_str("### ");
    out.push_str(D::FILE_NAME);
    out.push_str(" ###\n");
    out.push_str(&body);
    out.push('\n');
    Ok(())
}
