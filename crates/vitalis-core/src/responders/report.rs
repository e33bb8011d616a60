//! Report responder: analysis of uploaded-document text.

use super::symptom::render_profile;
use super::{Responder, ResponderContext, ResponderError, ResponderReply};
use async_trait::async_trait;
use log::debug;
use std::sync::Arc;
use vitalis_protocol::{Intent, TextGenerator};

const REPORT_PROMPT: &str = "You are analyzing the extracted text of a medical report for a \
patient. Summarize the key findings, point out abnormal values and what they might mean, and \
explain everything in plain language. Mention follow-up questions worth asking a doctor. Do not \
present conclusions as a diagnosis.";

/// Handles turns referencing an uploaded report. Requires the
/// document's extracted text; when it is not ready yet the turn resolves
/// to a retry prompt rather than a hard error.
pub struct ReportResponder {
    generator: Arc<dyn TextGenerator>,
}

impl ReportResponder {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl Responder for ReportResponder {
    fn intent(&self) -> Intent {
        Intent::Report
    }

    async fn respond(&self, ctx: &ResponderContext<'_>) -> Result<ResponderReply, ResponderError> {
        let Some(document_text) = ctx.document_text else {
            return Err(ResponderError::MissingDocument);
        };
        debug!(
            "report responder running (conversation_id={}, document_len={})",
            ctx.conversation_id,
            document_text.len()
        );
        let mut sections = Vec::new();
        if let Some(profile) = ctx.profile {
            sections.push(render_profile(profile));
        }
        sections.push(format!("Report text:\n{document_text}"));
        sections.push(format!("user: {}", ctx.user_text));
        let text = self
            .generator
            .generate(REPORT_PROMPT, &sections.join("\n\n"))
            .await?;
        Ok(ResponderReply::text_only(text))
    }
}
