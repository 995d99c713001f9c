//! Build manifests
//!
//! A manifest describes a store in TOML for the generation tooling:
//!
//! ```toml
//! version_string = "v1.0"
//! max_descriptors = 32
//!
//! [[descriptor]]
//! type = "5319d6f1-57b3-4d1a-96c6-e0edaf907a12"
//! text = "hello"
//!
//! [[descriptor]]
//! type = "0b6f3c0e-8f3c-4c5e-9a51-3d5f0e9d2a10"
//! file = "blobs/calibration.bin"
//!
//! [[descriptor]]
//! type = "5319d6f1-57b3-4d1a-96c6-e0edaf907a12"
//! shares = 0
//! ```
//!
//! Each descriptor names exactly one payload source: `text`, `bytes`,
//! `file` (relative to the manifest's directory) or `shares` (index of an
//! earlier descriptor whose payload is reused).

use crate::builder::{BuildEntry, PdsBuilder};
use crate::config::BuildOptions;
use crate::error::ManifestError;
use crate::type_id::TypeId;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub version_string: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_descriptors: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_version: Option<u32>,

    #[serde(default, rename = "descriptor", skip_serializing_if = "Vec::is_empty")]
    pub descriptors: Vec<ManifestDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestDescriptor {
    #[serde(rename = "type")]
    pub type_id: TypeId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes: Option<Vec<u8>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shares: Option<usize>,
}

impl Manifest {
    pub fn from_toml_str(s: &str) -> Result<Self, ManifestError> {
        Ok(toml::from_str(s)?)
    }

    /// Read a manifest file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        debug!("Loading manifest {:?}", path);
        let text = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn build_options(&self) -> BuildOptions {
        let defaults = BuildOptions::default();
        BuildOptions {
            max_descriptors: self.max_descriptors.unwrap_or(defaults.max_descriptors),
            format_version: self.format_version.unwrap_or(defaults.format_version),
        }
    }

    /// Resolve payload sources into a builder
    ///
    /// `file` payloads are read relative to `base_dir`.
    pub fn to_builder(&self, base_dir: &Path) -> Result<PdsBuilder, ManifestError> {
        let mut builder = PdsBuilder::new()
            .version_string(self.version_string.clone())
            .options(self.build_options());

        for (index, desc) in self.descriptors.iter().enumerate() {
            builder = builder.entry(desc.to_entry(index, base_dir)?);
        }

        Ok(builder)
    }

    /// Build the store described by this manifest
    pub fn build(&self, base_dir: &Path) -> Result<Vec<u8>, ManifestError> {
        Ok(self.to_builder(base_dir)?.build()?)
    }
}

impl ManifestDescriptor {
    fn to_entry(&self, index: usize, base_dir: &Path) -> Result<BuildEntry, ManifestError> {
        let sources = [
            self.text.is_some(),
            self.bytes.is_some(),
            self.file.is_some(),
            self.shares.is_some(),
        ];
        let count = sources.iter().filter(|set| **set).count();
        if count != 1 {
            return Err(ManifestError::InvalidDescriptor {
                index,
                reason: format!(
                    "expected exactly one of text, bytes, file, shares (found {})",
                    count
                ),
            });
        }

        if let Some(text) = &self.text {
            return Ok(BuildEntry::inline(self.type_id, text.as_bytes().to_vec()));
        }
        if let Some(bytes) = &self.bytes {
            return Ok(BuildEntry::inline(self.type_id, bytes.clone()));
        }
        if let Some(target) = self.shares {
            return Ok(BuildEntry::shared(self.type_id, target));
        }

        let file = self.file.as_deref().unwrap_or_else(|| Path::new(""));
        let path = base_dir.join(file);
        let payload = std::fs::read(&path).map_err(|source| ManifestError::Io { path, source })?;
        Ok(BuildEntry::inline(self.type_id, payload))
    }
}
