//! Image assets used by the page builders.
//!
//! Builders never touch the filesystem directly; they ask an [`AssetRegistry`]
//! for bytes by name. The directory-backed registry also accepts assets stored
//! as base64 text (`<name>.b64`), optionally with a `data:` URL prefix.

use std::collections::HashMap;
use std::path::PathBuf;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::debug;

use crate::error::{Error, Result};

pub const HEADER_BANNER: &str = "header_banner.png";
pub const CERTIFICATION: &str = "certification.png";
pub const PDF_HEADER: &str = "pdf_header.png";
pub const PDF_FOOTER: &str = "pdf_footer.png";
pub const ICON_REPOSITORY: &str = "icon_repository.png";
pub const ICON_INTERNAL_DATABASE: &str = "icon_internal_database.png";
pub const ICON_FILTERED: &str = "icon_filtered.png";
pub const ICON_INTERNET: &str = "icon_internet.png";
pub const ICON_BATCH: &str = "icon_batch.png";

/// Source of named binary assets.
pub trait AssetRegistry: Send + Sync {
    /// Load the raw bytes of an asset.
    fn load_asset(&self, name: &str) -> Result<Vec<u8>>;
}

/// Assets stored as files in a directory.
///
/// Reads are synchronous. Assets are small images loaded once per document
/// (see [`ReportDocument::asset_image`](crate::pdf::ReportDocument::asset_image)),
/// so the page builders call this from async stages without offloading.
#[derive(Debug, Clone)]
pub struct DirAssetRegistry {
    root: PathBuf,
}

impl DirAssetRegistry {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetRegistry for DirAssetRegistry {
    fn load_asset(&self, name: &str) -> Result<Vec<u8>> {
        let raw = self.root.join(name);
        if raw.is_file() {
            debug!("Loading asset {}", raw.display());
            return Ok(std::fs::read(raw)?);
        }

        let encoded = self.root.join(format!("{name}.b64"));
        if encoded.is_file() {
            debug!("Loading base64 asset {}", encoded.display());
            let text = std::fs::read_to_string(encoded)?;
            return decode_base64_asset(name, &text);
        }

        Err(Error::AssetNotFound(name.to_string()))
    }
}

/// Assets held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryAssetRegistry {
    assets: HashMap<String, Vec<u8>>,
}

impl MemoryAssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        self.assets.insert(name.into(), bytes);
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(name, bytes);
        self
    }
}

impl AssetRegistry for MemoryAssetRegistry {
    fn load_asset(&self, name: &str) -> Result<Vec<u8>> {
        self.assets
            .get(name)
            .cloned()
            .ok_or_else(|| Error::AssetNotFound(name.to_string()))
    }
}

/// Decode base64 asset text, tolerating a `data:<mime>;base64,` prefix and
/// embedded line breaks.
pub fn decode_base64_asset(name: &str, text: &str) -> Result<Vec<u8>> {
    let payload = text
        .trim()
        .split_once("base64,")
        .map_or(text.trim(), |(_, rest)| rest);
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();

    STANDARD.decode(compact).map_err(|e| Error::AssetDecode {
        name: name.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_plain_and_data_url() {
        assert_eq!(decode_base64_asset("a", "aGVsbG8=").unwrap(), b"hello");
        assert_eq!(
            decode_base64_asset("a", "data:image/png;base64,aGVs\nbG8=\n").unwrap(),
            b"hello"
        );
    }

    #[test]
    fn test_decode_invalid() {
        let err = decode_base64_asset("logo.png", "!!!").unwrap_err();
        assert!(err.to_string().contains("logo.png"));
    }

    #[test]
    fn test_dir_registry_prefers_raw_then_base64() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("raw.png"), b"raw-bytes").unwrap();
        std::fs::write(dir.path().join("encoded.png.b64"), "ZW5jb2RlZA==").unwrap();

        let registry = DirAssetRegistry::new(dir.path());
        assert_eq!(registry.load_asset("raw.png").unwrap(), b"raw-bytes");
        assert_eq!(registry.load_asset("encoded.png").unwrap(), b"encoded");
        assert!(matches!(
            registry.load_asset("missing.png"),
            Err(Error::AssetNotFound(name)) if name == "missing.png"
        ));
    }

    #[test]
    fn test_memory_registry() {
        let registry = MemoryAssetRegistry::new().with("icon.png", vec![1, 2, 3]);
        assert_eq!(registry.load_asset("icon.png").unwrap(), vec![1, 2, 3]);
        assert!(registry.load_asset("other.png").is_err());
    }
}
