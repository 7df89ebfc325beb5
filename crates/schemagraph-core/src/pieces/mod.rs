//! Schema pieces
//!
//! A piece looks at the [`Context`] and contributes zero or more nodes to the
//! graph. Pieces are independent of each other; the
//! [`GraphAssembler`](crate::GraphAssembler) runs them in registration order.

mod faq;
mod how_to;
mod web_page;

pub use faq::{FAQ_BLOCK, Faq};
pub use how_to::{HOW_TO_BLOCK, HowTo};
pub use web_page::WebPage;

use crate::context::Context;
use crate::error::Result;
use crate::types::SchemaNode;

/// One generator of graph nodes.
pub trait SchemaPiece: Send + Sync {
    /// Name used in logs and build diagnostics.
    fn name(&self) -> &'static str;

    /// Whether [`generate`](SchemaPiece::generate) should run for this page.
    ///
    /// Runs for every piece on every build, so keep it to a lookup.
    fn is_needed(&self, context: &Context) -> bool;

    /// Build this piece's nodes.
    ///
    /// The same context must always produce the same nodes.
    fn generate(&self, context: &Context) -> Result<Vec<SchemaNode>>;
}
