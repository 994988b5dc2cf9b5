//! Opaque, non-translatable resources.

/// A leaf resource whose content is not translatable (images, raw files, ...).
#[derive(Debug, Clone, Default)]
pub struct Blob {
    /// Id of the blob within its parent package.
    pub id: String,
    /// Where the blob was loaded from.
    pub uri: Option<String>,
    /// Raw content.
    pub source: Option<Vec<u8>>,
}

impl Blob {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), uri: None, source: None }
    }
}
