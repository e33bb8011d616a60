//! General responder: catch-all conversation and degradation target.

use super::{Responder, ResponderContext, ResponderError, ResponderReply};
use async_trait::async_trait;
use log::debug;
use std::sync::Arc;
use vitalis_protocol::{Intent, TextGenerator};

const GENERAL_PROMPT: &str = "You are a health assistant answering general health questions \
from conversational context only. Be supportive, clear and honest about your limits, and \
recommend professional care when it matters. You only discuss health and medical topics.";

/// Answers anything the specialized responders do not cover, using
/// conversational context only. Also serves as the fallback when a
/// selected responder fails.
pub struct GeneralResponder {
    generator: Arc<dyn TextGenerator>,
}

impl GeneralResponder {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl Responder for GeneralResponder {
    fn intent(&self) -> Intent {
        Intent::General
    }

    async fn respond(&self, ctx: &ResponderContext<'_>) -> Result<ResponderReply, ResponderError> {
        debug!(
            "general responder running (conversation_id={})",
            ctx.conversation_id
        );
        let mut sections = Vec::new();
        if !ctx.summaries.is_empty() {
            let digests: Vec<&str> = ctx.summaries.iter().map(|s| s.text.as_str()).collect();
            sections.push(format!("Earlier context:\n{}", digests.join("\n")));
        }
        if !ctx.window.is_empty() {
            sections.push(format!("Recent turns:\n{}", ctx.window.render(10)));
        }
        sections.push(format!("user: {}", ctx.user_text));
        let text = self
            .generator
            .generate(GENERAL_PROMPT, &sections.join("\n\n"))
            .await?;
        Ok(ResponderReply::text_only(text))
    }
}
