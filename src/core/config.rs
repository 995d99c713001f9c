//! Parse and build limits
//!
//! Both option sets deserialize from TOML with every field optional, so a
//! tool configuration only needs to name the values it overrides.

use crate::header::PDS_HEADER_VERSION;
use serde::{Deserialize, Serialize};

/// Default cap on the number of descriptors in a chain.
pub const DEFAULT_MAX_DESCRIPTORS: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Maximum number of chain records visited before `ChainTooLong`
    pub max_descriptors: usize,
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_descriptors(mut self, max_descriptors: usize) -> Self {
        self.max_descriptors = max_descriptors;
        self
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            max_descriptors: DEFAULT_MAX_DESCRIPTORS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    /// Maximum number of descriptors accepted before `TooManyDescriptors`
    pub max_descriptors: usize,

    /// Format version written into the header
    pub format_version: u32,
}

impl BuildOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_descriptors(mut self, max_descriptors: usize) -> Self {
        self.max_descriptors = max_descriptors;
        self
    }

    pub fn with_format_version(mut self, format_version: u32) -> Self {
        self.format_version = format_version;
        self
    }
}

impl Default for BuildOptions {
    fn default() -> Self {
        BuildOptions {
            max_descriptors: DEFAULT_MAX_DESCRIPTORS,
            format_version: PDS_HEADER_VERSION,
        }
    }
}
