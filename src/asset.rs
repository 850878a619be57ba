//! Asset catalog model.
//!
//! The outer shell discovers morph targets and addons on disk; the engine
//! fixes the schema so that editor-produced landmark files and overlay kinds
//! round-trip through one format, and provides the loaders that turn catalog
//! entries into pixel buffers and landmark sets.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::image::Image;
use crate::landmark::Landmarks;
use crate::overlay::AddonKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

/// A single morph target or addon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub name: String,
    /// Path of the asset image, relative to the catalog's base directory.
    pub image: PathBuf,
    /// Path of the landmark JSON for morph targets.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub landmarks: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub gender: Option<Gender>,
    /// Set for addons; morph targets leave it empty.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub kind: Option<AddonKind>,
}

impl Asset {
    /// Loads the asset's image, resolving its path against `base`.
    pub fn load_image<P: AsRef<Path>>(&self, base: P) -> crate::Result<Image> {
        Image::load(base.as_ref().join(&self.image))
    }

    /// Loads the asset's landmark set, if it has one.
    pub fn load_landmarks<P: AsRef<Path>>(&self, base: P) -> crate::Result<Option<Landmarks>> {
        match &self.landmarks {
            Some(path) => {
                let data = fs::read(base.as_ref().join(path))?;
                Ok(Some(Landmarks::from_json_slice(&data)?))
            }
            None => Ok(None),
        }
    }
}

/// A catalog of assets, typically one JSON document per asset directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    pub assets: Vec<Asset>,
}

impl Catalog {
    pub fn from_json_slice(data: &[u8]) -> crate::Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }

    pub fn to_json_string(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
