//! Engine configuration.
//!
//! Stored as TOML. Every key is optional; anything left out keeps its default.
//!
//! ```toml
//! [pieces]
//! web_page = true
//! how_to = true
//! faq = false
//!
//! [sanitizer]
//! allowed_tags = ["p", "br", "strong", "em", "a"]
//! ```

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::sanitizer::{DEFAULT_ALLOWED_TAGS, HtmlSanitizer};

/// Top-level configuration for a [`GraphAssembler`](crate::GraphAssembler).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub pieces: PieceSwitches,
    pub sanitizer: SanitizerConfig,
}

/// Which built-in pieces get registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PieceSwitches {
    pub web_page: bool,
    pub how_to: bool,
    pub faq: bool,
}

impl Default for PieceSwitches {
    fn default() -> Self {
        Self {
            web_page: true,
            how_to: true,
            faq: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SanitizerConfig {
    /// Tags kept by rich-text sanitization.
    pub allowed_tags: Vec<String>,
}

impl Default for SanitizerConfig {
    fn default() -> Self {
        Self {
            allowed_tags: DEFAULT_ALLOWED_TAGS.iter().map(|tag| tag.to_string()).collect(),
        }
    }
}

impl GraphConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// The sanitizer described by `[sanitizer]`.
    pub fn html_sanitizer(&self) -> HtmlSanitizer {
        HtmlSanitizer::with_allowed_tags(&self.sanitizer.allowed_tags)
    }
}
