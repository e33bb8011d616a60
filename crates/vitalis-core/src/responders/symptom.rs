//! Symptom responder: severity and duration reasoning.

use super::{Responder, ResponderContext, ResponderError, ResponderReply};
use async_trait::async_trait;
use log::debug;
use std::sync::Arc;
use vitalis_protocol::{Intent, TextGenerator, UserProfile};

const SYMPTOM_PROMPT: &str = "You are a health assistant analyzing reported symptoms. Reason \
about severity (mild, moderate, severe, critical) and duration, suggest sensible self-care, and \
name warning signs that should prompt a doctor visit. Be empathetic and concrete. Do not claim \
a diagnosis.";

/// Handles turns describing symptoms. Consults no external providers;
/// the focus is severity and duration reasoning over the message and
/// profile.
pub struct SymptomResponder {
    generator: Arc<dyn TextGenerator>,
}

impl SymptomResponder {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl Responder for SymptomResponder {
    fn intent(&self) -> Intent {
        Intent::Symptom
    }

    async fn respond(&self, ctx: &ResponderContext<'_>) -> Result<ResponderReply, ResponderError> {
        let context = render_context(ctx);
        debug!(
            "symptom responder running (conversation_id={})",
            ctx.conversation_id
        );
        let text = self.generator.generate(SYMPTOM_PROMPT, &context).await?;
        Ok(ResponderReply::text_only(text))
    }
}

fn render_context(ctx: &ResponderContext<'_>) -> String {
    let mut sections = Vec::new();
    if let Some(profile) = ctx.profile {
        sections.push(render_profile(profile));
    }
    if !ctx.summaries.is_empty() {
        let digests: Vec<&str> = ctx.summaries.iter().map(|s| s.text.as_str()).collect();
        sections.push(format!("Earlier context:\n{}", digests.join("\n")));
    }
    if !ctx.window.is_empty() {
        sections.push(format!("Recent turns:\n{}", ctx.window.render(10)));
    }
    sections.push(format!("user: {}", ctx.user_text));
    sections.join("\n\n")
}

pub(super) fn render_profile(profile: &UserProfile) -> String {
    let conditions: Vec<&str> = profile
        .conditions
        .iter()
        .map(|condition| condition.name.as_str())
        .collect();
    let medications: Vec<&str> = profile
        .medications
        .iter()
        .map(|medication| medication.name.as_str())
        .collect();
    let allergies: Vec<&str> = profile
        .allergies
        .iter()
        .map(|allergy| allergy.allergen.as_str())
        .collect();
    format!(
        "Known conditions: {}\nCurrent medications: {}\nAllergies: {}",
        join_or_none(&conditions),
        join_or_none(&medications),
        join_or_none(&allergies),
    )
}

fn join_or_none(values: &[&str]) -> String {
    if values.is_empty() {
        "none".to_string()
    } else {
        values.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::SymptomResponder;
    use crate::responders::{Responder, ResponderContext};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use uuid::Uuid;
    use vitalis_memory::MemoryWindow;
    use vitalis_protocol::{ConditionEntry, Intent, UserProfile};
    use vitalis_test_utils::RecordingGenerator;

    #[tokio::test]
    async fn renders_profile_and_message_into_context() {
        let (generator, prompts) = RecordingGenerator::new("rest and fluids");
        let responder = SymptomResponder::new(Arc::new(generator));
        let window = MemoryWindow::new(4);
        let profile = UserProfile {
            conditions: vec![ConditionEntry {
                name: "asthma".to_string(),
                status: None,
            }],
            ..UserProfile::default()
        };
        let ctx = ResponderContext {
            user_id: Uuid::new_v4(),
            conversation_id: Uuid::new_v4(),
            user_text: "I have a cough for 3 days",
            window: &window,
            summaries: &[],
            document_text: None,
            profile: Some(&profile),
        };

        let reply = responder.respond(&ctx).await.expect("respond");
        assert_eq!(reply.text, "rest and fluids");
        assert_eq!(responder.intent(), Intent::Symptom);

        let recorded = prompts.lock();
        assert!(recorded[0].contains("asthma"));
        assert!(recorded[0].contains("cough for 3 days"));
    }
}
