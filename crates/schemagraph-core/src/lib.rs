//! # schemagraph-core
//!
//! Core library for assembling schema.org JSON-LD graphs describing a page.
//!
//! This library provides:
//! - A page [`Context`] snapshot with its content blocks
//! - Schema pieces (`WebPage`, `HowTo`, `FAQ`) that turn blocks into linked nodes
//! - A [`GraphAssembler`] that runs the pieces and merges their output
//! - Rich-text sanitization and image node generation helpers
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use schemagraph_core::{ContentBlock, Context, GraphAssembler, GraphConfig, NoImageLookup};
//! use serde_json::json;
//!
//! let context = Context::new("https://x.test/bread", 7u64, "https://x.test/bread#webpage")
//!     .with_title("Bread")
//!     .with_block(ContentBlock::new(
//!         "how-to",
//!         json!({"steps": [{"id": "step-1", "jsonName": "Knead"}]}),
//!     ));
//!
//! let assembler = GraphAssembler::from_config(&GraphConfig::default(), Arc::new(NoImageLookup));
//! let graph = assembler.build(&context);
//!
//! assert!(graph.node("https://x.test/bread#howto-1").is_some());
//! println!("{}", graph.to_script_tag());
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod graph;
pub mod image;
pub mod pieces;
pub mod sanitizer;
pub mod types;
pub mod url_utils;

// Re-export commonly used types
pub use config::GraphConfig;
pub use context::{ContentBlock, Context, EntityId, InlineToken, RichText};
pub use error::{Error, Result};
pub use graph::GraphAssembler;
pub use image::{ImageCatalog, ImageLookup, ImageMeta, ImageResolver, NoImageLookup};
pub use pieces::SchemaPiece;
pub use sanitizer::{sanitize, strip_tags_smart};
pub use types::{Graph, PieceFailure, SchemaNode};
