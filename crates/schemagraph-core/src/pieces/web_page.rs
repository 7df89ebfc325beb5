//! The page node every other piece points at via `mainEntityOfPage`

use serde_json::{Value as JsonValue, json};

use super::{FAQ_BLOCK, SchemaPiece};
use crate::context::Context;
use crate::error::Result;
use crate::sanitizer::strip_tags_smart;
use crate::types::SchemaNode;

#[derive(Debug, Clone, Copy, Default)]
pub struct WebPage;

impl SchemaPiece for WebPage {
    fn name(&self) -> &'static str {
        "WebPage"
    }

    fn is_needed(&self, _context: &Context) -> bool {
        true
    }

    fn generate(&self, context: &Context) -> Result<Vec<SchemaNode>> {
        let page_type: JsonValue = if context.has_blocks(FAQ_BLOCK) {
            json!(["WebPage", "FAQPage"])
        } else {
            json!("WebPage")
        };

        let mut node = SchemaNode::new(page_type)
            .with("@id", context.main_schema_id.as_str())
            .with("url", context.canonical.as_str());
        node.set_non_empty("name", &strip_tags_smart(&context.title));
        if let Some(language) = context.language.as_deref() {
            node.set("inLanguage", language);
        }

        Ok(vec![node])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContentBlock;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_page() {
        let context = Context::new("https://x.test/p", 3u64, "https://x.test/p#webpage")
            .with_title("Bread &amp; butter")
            .with_language("en-GB");

        let nodes = WebPage.generate(&context).unwrap();
        assert_eq!(
            nodes[0].clone().into_value(),
            json!({
                "@type": "WebPage",
                "@id": "https://x.test/p#webpage",
                "url": "https://x.test/p",
                "name": "Bread & butter",
                "inLanguage": "en-GB"
            })
        );
    }

    #[test]
    fn test_faq_page_type() {
        let context = Context::new("https://x.test/p", 3u64, "https://x.test/p#webpage")
            .with_block(ContentBlock::new(FAQ_BLOCK, json!({"questions": []})));

        let nodes = WebPage.generate(&context).unwrap();
        assert!(nodes[0].has_type("FAQPage"));
        assert!(nodes[0].has_type("WebPage"));
        assert!(!nodes[0].contains_key("name"));
    }
}
