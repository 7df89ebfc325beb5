//! Graph assembly: run the registered pieces and collect their nodes

use serde_json::Value as JsonValue;
use std::collections::HashSet;
use std::sync::Arc;

use crate::config::GraphConfig;
use crate::context::Context;
use crate::image::{ImageLookup, ImageResolver};
use crate::pieces::{Faq, HowTo, SchemaPiece, WebPage};
use crate::types::{Graph, PieceFailure, SchemaNode};

/// Runs schema pieces in a fixed order and merges their output into one graph.
///
/// A piece that fails is left out and reported on the returned [`Graph`];
/// the other pieces still contribute.
#[derive(Default)]
pub struct GraphAssembler {
    pieces: Vec<Box<dyn SchemaPiece>>,
}

impl GraphAssembler {
    /// An assembler with no pieces registered.
    pub fn new() -> Self {
        Self { pieces: Vec::new() }
    }

    /// The built-in pieces (`WebPage`, `HowTo`, `FAQ`) as enabled in `config`.
    pub fn from_config(config: &GraphConfig, lookup: Arc<dyn ImageLookup>) -> Self {
        let html = config.html_sanitizer();
        let mut assembler = Self::new();

        if config.pieces.web_page {
            assembler.register(WebPage);
        }
        if config.pieces.how_to {
            assembler.register(HowTo::new(html.clone(), ImageResolver::new(lookup)));
        }
        if config.pieces.faq {
            assembler.register(Faq::new(html));
        }

        assembler
    }

    /// Append a piece; it runs after every piece registered before it.
    pub fn register(&mut self, piece: impl SchemaPiece + 'static) -> &mut Self {
        self.pieces.push(Box::new(piece));
        self
    }

    pub fn piece_names(&self) -> Vec<&'static str> {
        self.pieces.iter().map(|piece| piece.name()).collect()
    }

    /// Build the graph for one page.
    pub fn build(&self, context: &Context) -> Graph {
        let mut graph = Graph::default();
        let mut seen_ids: HashSet<String> = HashSet::new();

        for piece in &self.pieces {
            if !piece.is_needed(context) {
                continue;
            }

            let nodes = match piece.generate(context) {
                Ok(nodes) => nodes,
                Err(err) => {
                    tracing::warn!(
                        piece = piece.name(),
                        page = %context.id,
                        error = %err,
                        "schema piece failed, leaving it out of the graph"
                    );
                    graph.failures.push(PieceFailure {
                        piece: piece.name().to_string(),
                        message: err.to_string(),
                    });
                    continue;
                }
            };

            for node in nodes {
                if let Some(id) = node.id().map(str::to_string) {
                    if !seen_ids.insert(id.clone()) {
                        tracing::warn!(
                            piece = piece.name(),
                            page = %context.id,
                            id = %id,
                            "dropping node with an @id already in the graph"
                        );
                        graph.duplicate_ids.push(id);
                        continue;
                    }
                }
                graph.nodes.push(node);
            }
        }

        graph.dangling_references = dangling_references(&graph.nodes);
        for id in &graph.dangling_references {
            tracing::debug!(page = %context.id, id = %id, "graph references an @id no node carries");
        }

        graph
    }
}

/// Referenced `@id`s that no node (top-level or nested) defines, in order of
/// first reference.
fn dangling_references(nodes: &[SchemaNode]) -> Vec<String> {
    let mut defined = HashSet::new();
    let mut referenced = Vec::new();

    for node in nodes {
        for value in node.fields().values() {
            collect_ids(value, &mut defined, &mut referenced);
        }
        if let Some(id) = node.id() {
            defined.insert(id.to_string());
        }
    }

    let mut reported = HashSet::new();
    referenced
        .into_iter()
        .filter(|id| !defined.contains(id) && reported.insert(id.clone()))
        .collect()
}

fn collect_ids(value: &JsonValue, defined: &mut HashSet<String>, referenced: &mut Vec<String>) {
    match value {
        JsonValue::Object(map) => {
            if let Some(id) = map.get("@id").and_then(JsonValue::as_str) {
                if map.len() == 1 {
                    referenced.push(id.to_string());
                } else {
                    defined.insert(id.to_string());
                }
            }
            for nested in map.values() {
                collect_ids(nested, defined, referenced);
            }
        }
        JsonValue::Array(items) => {
            for item in items {
                collect_ids(item, defined, referenced);
            }
        }
        _ => {}
    }
}
