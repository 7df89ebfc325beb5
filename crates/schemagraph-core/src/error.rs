//! Error types for graph assembly.
//!
//! Most problems found while reading content blocks are absorbed locally (the
//! offending step or question is skipped). The variants here cover what is
//! left: an unusable context, a piece that gave up entirely, and invalid
//! configuration.

use thiserror::Error;

/// The error type for schemagraph-core operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The canonical URL of the context is not an absolute URL.
    #[error("invalid canonical URL `{url}`: {source}")]
    InvalidCanonical {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The context carries no `@id` for the root node.
    #[error("context has an empty main schema id")]
    MissingMainSchemaId,

    /// A content block could not be read at all.
    #[error("malformed `{block}` block: {reason}")]
    MalformedBlock { block: String, reason: String },

    /// A piece failed while generating its nodes.
    #[error("piece `{piece}` failed: {message}")]
    Piece { piece: String, message: String },

    /// Configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for a [`Error::MalformedBlock`].
    pub fn malformed(block: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedBlock {
            block: block.into(),
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
