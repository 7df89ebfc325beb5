//! `Question` nodes, and the `ItemList` tying them together, from FAQ blocks

use serde::Deserialize;
use serde_json::{Value as JsonValue, json};

use super::SchemaPiece;
use crate::context::{Context, EntityId, lenient_text};
use crate::error::{Error, Result};
use crate::sanitizer::{HtmlSanitizer, strip_tags_smart};
use crate::types::{SchemaNode, reference};
use crate::url_utils::{anchor_id, fragment_id};

/// Block type the piece reads.
pub const FAQ_BLOCK: &str = "faq";

#[derive(Debug, Clone, Default)]
pub struct Faq {
    html: HtmlSanitizer,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuestionAttrs {
    id: EntityId,
    #[serde(default, deserialize_with = "lenient_text")]
    json_question: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    json_answer: Option<String>,
}

impl Faq {
    pub fn new(html: HtmlSanitizer) -> Self {
        Self { html }
    }

    fn question_node(&self, context: &Context, question: &QuestionAttrs, position: usize) -> Option<SchemaNode> {
        let answer = question
            .json_answer
            .as_deref()
            .map(|raw| self.html.sanitize(raw))
            .unwrap_or_default();
        if answer.is_empty() {
            return None;
        }

        let url = anchor_id(&context.canonical, &question.id.to_string());
        let mut node = SchemaNode::new("Question")
            .with("@id", url.as_str())
            .with("url", url.as_str())
            .with("position", position);
        node.set_non_empty(
            "name",
            &question
                .json_question
                .as_deref()
                .map(strip_tags_smart)
                .unwrap_or_default(),
        );
        node.set("answerCount", 1);
        node.set("acceptedAnswer", json!({ "@type": "Answer", "text": answer }));
        if let Some(language) = context.language.as_deref() {
            node.set("inLanguage", language);
        }

        Some(node)
    }
}

impl SchemaPiece for Faq {
    fn name(&self) -> &'static str {
        "FAQ"
    }

    fn is_needed(&self, context: &Context) -> bool {
        context.has_blocks(FAQ_BLOCK)
    }

    fn generate(&self, context: &Context) -> Result<Vec<SchemaNode>> {
        let mut questions: Vec<SchemaNode> = Vec::new();

        for block in context.blocks(FAQ_BLOCK) {
            let Some(raw_questions) = block.attr_list("questions") else {
                tracing::debug!(page = %context.id, "faq block without a question list");
                continue;
            };

            for raw in raw_questions {
                let question = match QuestionAttrs::deserialize(raw) {
                    Ok(question) => question,
                    Err(err) => {
                        let err = Error::malformed(FAQ_BLOCK, format!("question: {err}"));
                        tracing::debug!(page = %context.id, error = %err, "skipping unreadable faq question");
                        continue;
                    }
                };
                if let Some(node) = self.question_node(context, &question, questions.len() + 1) {
                    questions.push(node);
                }
            }
        }

        if questions.is_empty() {
            return Ok(Vec::new());
        }

        let items: Vec<JsonValue> = questions
            .iter()
            .filter_map(SchemaNode::id)
            .map(reference)
            .collect();
        let list = SchemaNode::new("ItemList")
            .with("@id", fragment_id(&context.canonical, "faq-question-list"))
            .with("mainEntityOfPage", reference(&context.main_schema_id))
            .with("numberOfItems", questions.len())
            .with("itemListElement", items);

        let mut graph = Vec::with_capacity(questions.len() + 1);
        graph.push(list);
        graph.extend(questions);
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContentBlock;
    use pretty_assertions::assert_eq;

    fn faq_context(questions: JsonValue) -> Context {
        Context::new("https://x.test/faq", "faq-page", "https://x.test/faq#webpage")
            .with_block(ContentBlock::new(FAQ_BLOCK, json!({ "questions": questions })))
    }

    #[test]
    fn test_not_needed_without_blocks() {
        let context = Context::new("https://x.test/faq", 1u64, "https://x.test/faq#webpage");
        assert!(!Faq::default().is_needed(&context));
    }

    #[test]
    fn test_list_and_questions() {
        let context = faq_context(json!([
            {"id": "faq-1", "jsonQuestion": "Why <b>yeast</b>?", "jsonAnswer": "It <em>rises</em>."},
            {"id": "faq-2", "jsonQuestion": "Unanswered"},
            {"id": "faq-3", "jsonQuestion": "How long?", "jsonAnswer": "Two hours."}
        ]));

        let nodes: Vec<JsonValue> = Faq::default()
            .generate(&context)
            .unwrap()
            .into_iter()
            .map(SchemaNode::into_value)
            .collect();

        assert_eq!(nodes.len(), 3);
        assert_eq!(
            nodes[0],
            json!({
                "@type": "ItemList",
                "@id": "https://x.test/faq#faq-question-list",
                "mainEntityOfPage": {"@id": "https://x.test/faq#webpage"},
                "numberOfItems": 2,
                "itemListElement": [
                    {"@id": "https://x.test/faq#faq-1"},
                    {"@id": "https://x.test/faq#faq-3"}
                ]
            })
        );
        assert_eq!(
            nodes[1],
            json!({
                "@type": "Question",
                "@id": "https://x.test/faq#faq-1",
                "url": "https://x.test/faq#faq-1",
                "position": 1,
                "name": "Why yeast?",
                "answerCount": 1,
                "acceptedAnswer": {"@type": "Answer", "text": "It <em>rises</em>."}
            })
        );
        assert_eq!(nodes[2]["position"], 2);
    }

    #[test]
    fn test_no_answered_questions_emits_nothing() {
        let context = faq_context(json!([
            {"id": "faq-1", "jsonQuestion": "Anyone?"},
            {"id": "faq-2", "jsonQuestion": "Hello?", "jsonAnswer": "<script>x()</script>"}
        ]));
        assert!(Faq::default().generate(&context).unwrap().is_empty());
    }

    #[test]
    fn test_numeric_answer_is_read_as_text() {
        let context = faq_context(json!([{"id": "q", "jsonQuestion": "Oven temperature?", "jsonAnswer": 230}]));
        let nodes = Faq::default().generate(&context).unwrap();
        assert_eq!(
            nodes[1].get("acceptedAnswer"),
            Some(&json!({"@type": "Answer", "text": "230"}))
        );
    }

    #[test]
    fn test_positions_continue_across_blocks() {
        let context = faq_context(json!([{"id": "a", "jsonAnswer": "One"}])).with_block(
            ContentBlock::new(FAQ_BLOCK, json!({"questions": [{"id": "b", "jsonAnswer": "Two"}]})),
        );

        let nodes = Faq::default().generate(&context).unwrap();
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[2].get("position"), Some(&json!(2)));
        assert!(!nodes[1].contains_key("name"));
    }
}
