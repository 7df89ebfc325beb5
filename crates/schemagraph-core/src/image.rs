//! Image node generation
//!
//! Pieces hand an image URL to [`ImageResolver`], which asks the
//! [`ImageLookup`] collaborator for metadata it already holds (dimensions,
//! caption) and builds an `ImageObject` node. A lookup miss still yields a
//! usable node with the URL alone.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::sanitizer::strip_tags_smart;
use crate::types::SchemaNode;
use crate::url_utils::fragment_id;

/// Metadata known about an image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMeta {
    /// Attachment URL when it differs from the URL the image was found under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

/// Source of image metadata, keyed by URL.
pub trait ImageLookup: Send + Sync {
    fn lookup(&self, url: &str) -> Option<ImageMeta>;
}

/// Lookup that never knows anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoImageLookup;

impl ImageLookup for NoImageLookup {
    fn lookup(&self, _url: &str) -> Option<ImageMeta> {
        None
    }
}

/// In-memory image metadata, keyed by URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageCatalog(HashMap<String, ImageMeta>);

impl ImageCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, url: impl Into<String>, meta: ImageMeta) {
        self.0.insert(url.into(), meta);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl ImageLookup for ImageCatalog {
    fn lookup(&self, url: &str) -> Option<ImageMeta> {
        self.0.get(url).cloned()
    }
}

/// Builds `ImageObject` nodes.
#[derive(Clone)]
pub struct ImageResolver {
    lookup: Arc<dyn ImageLookup>,
}

impl fmt::Debug for ImageResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageResolver").finish_non_exhaustive()
    }
}

impl Default for ImageResolver {
    fn default() -> Self {
        Self::new(Arc::new(NoImageLookup))
    }
}

impl ImageResolver {
    pub fn new(lookup: Arc<dyn ImageLookup>) -> Self {
        Self { lookup }
    }

    /// Stable `@id` for an image: `<canonical>#schema-image-<hash of url>`.
    pub fn schema_id_for(canonical: &str, url: &str) -> String {
        let digest = Sha256::digest(url.as_bytes());
        fragment_id(canonical, &format!("schema-image-{}", hex::encode(&digest[..16])))
    }

    /// Build an `ImageObject` node for `url` under `schema_id`.
    pub fn generate_from_url(
        &self,
        schema_id: &str,
        url: &str,
        language: Option<&str>,
    ) -> SchemaNode {
        let mut node = SchemaNode::new("ImageObject").with("@id", schema_id);
        if let Some(language) = language {
            node.set("inLanguage", language);
        }

        let Some(meta) = self.lookup.lookup(url) else {
            tracing::debug!(url, "no image metadata, emitting minimal image node");
            node.set("url", url);
            node.set("contentUrl", url);
            return node;
        };

        let resolved = meta.url.as_deref().filter(|u| !u.is_empty()).unwrap_or(url);
        node.set("url", resolved);
        node.set("contentUrl", resolved);

        if let Some(width) = meta.width.filter(|w| *w > 0) {
            node.set("width", width);
        }
        if let Some(height) = meta.height.filter(|h| *h > 0) {
            node.set("height", height);
        }
        if let Some(caption) = meta.caption.as_deref() {
            node.set_non_empty("caption", &strip_tags_smart(caption));
        }

        node
    }
}
