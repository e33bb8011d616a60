//! Intent classification for incoming messages.

use log::{debug, warn};
use regex::Regex;
use std::sync::{Arc, LazyLock};
use vitalis_memory::MemoryWindow;
use vitalis_protocol::{Intent, TextGenerator};

/// Matches explicit report references like "Report ID: 12".
static REPORT_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\breport\s+id\b\s*:?\s*\S+").unwrap());

const CLASSIFY_PROMPT: &str = "You are an intent classifier for a health assistant that only \
handles medical and health topics. Classify the user's latest message into exactly one label:\n\
- symptom: the user describes symptoms or health complaints\n\
- medication: questions about a medication, dosing or drug interactions\n\
- report: the user refers to an uploaded medical report or document\n\
- diagnosis: the user wants help understanding possible explanations\n\
- tracking: the user wants to see health data they logged earlier\n\
- general: other health conversation, including greetings in a medical context\n\
- off_topic: unrelated to health or medicine (weather, sports, coding, ...)\n\
The latest message dominates; earlier turns are tie-break context only.\n\
Answer with the label alone on the first line.\n\
\n\
Examples:\n\
User: \"I have a headache and fever\" -> symptom\n\
User: \"Tell me about aspirin\" -> medication\n\
User: \"Show me my blood pressure readings\" -> tracking\n\
User: \"What's the weather today?\" -> off_topic";

/// Maps a message plus recent history to exactly one routing label.
///
/// Classification never fails a turn: generation errors and unknown
/// labels both resolve to [`Intent::General`], bounding the blast
/// radius of misclassification.
pub struct IntentClassifier {
    generator: Arc<dyn TextGenerator>,
    prompt_window_turns: usize,
}

impl IntentClassifier {
    /// Create a classifier over the generation capability.
    pub fn new(generator: Arc<dyn TextGenerator>, prompt_window_turns: usize) -> Self {
        Self {
            generator,
            prompt_window_turns,
        }
    }

    /// Classify the message in the context of the memory window.
    pub async fn classify(
        &self,
        user_text: &str,
        window: &MemoryWindow,
        has_document: bool,
    ) -> Intent {
        // Uploaded-document turns route to the report responder without
        // spending a generation call.
        if has_document || REPORT_ID_RE.is_match(user_text) {
            debug!("classified by document heuristic (intent=report)");
            return Intent::Report;
        }

        let context = if window.is_empty() {
            format!("user: {user_text}")
        } else {
            format!(
                "{}\nuser: {user_text}",
                window.render(self.prompt_window_turns)
            )
        };
        match self.generator.generate(CLASSIFY_PROMPT, &context).await {
            Ok(label) => {
                let first_line = label.lines().next().unwrap_or_default();
                let first_line = first_line.trim_start_matches("Intent:").trim();
                match Intent::parse(first_line) {
                    Some(intent) => {
                        debug!("classified message (intent={intent})");
                        intent
                    }
                    None => {
                        warn!("unrecognized intent label, falling back to general: {first_line}");
                        Intent::General
                    }
                }
            }
            Err(err) => {
                warn!("classification degraded to general: {err}");
                Intent::General
            }
        }
    }
}
