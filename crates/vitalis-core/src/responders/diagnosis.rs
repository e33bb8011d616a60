//! Diagnosis responder: ranked candidate explanations with evidence.

use super::symptom::render_profile;
use super::{Responder, ResponderContext, ResponderError, ResponderReply};
use crate::facts::{FactStore, FactWindow};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use futures_util::future::join_all;
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::Arc;
use vitalis_knowledge::{KnowledgeClient, KnowledgePayload, KnowledgeQuery};
use vitalis_protocol::{FactPayload, Intent, Role, TextGenerator};

const DIAGNOSIS_PROMPT: &str = "You are helping a patient understand possible explanations for \
their symptoms. Walk through the candidate conditions, which symptoms point to which candidate, \
and which warning signs would make this urgent. Encourage a proper medical examination. Never \
state a definitive diagnosis.";

const DISCLAIMER: &str = "This is an exploration of possibilities, not a diagnosis. Only a \
clinician who can examine you can tell what is actually going on.";

/// How many symptoms feed the evidence queries.
const MAX_QUERY_SYMPTOMS: usize = 3;
/// How far back persisted symptom facts are considered.
const SYMPTOM_LOOKBACK_DAYS: i64 = 30;

/// Handles turns asking what might explain the user's symptoms.
/// Combines symptoms from the window and persisted facts with
/// literature and condition-code evidence.
pub struct DiagnosisResponder {
    generator: Arc<dyn TextGenerator>,
    knowledge: Arc<dyn KnowledgeClient>,
    facts: Arc<dyn FactStore>,
    literature_max_results: usize,
}

impl DiagnosisResponder {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        knowledge: Arc<dyn KnowledgeClient>,
        facts: Arc<dyn FactStore>,
        literature_max_results: usize,
    ) -> Self {
        Self {
            generator,
            knowledge,
            facts,
            literature_max_results,
        }
    }

    /// Collect known symptoms: lexicon hits in recent user turns plus
    /// recent persisted symptom facts.
    fn known_symptoms(&self, ctx: &ResponderContext<'_>) -> Vec<String> {
        let mut symptoms = Vec::new();
        let mut push_unique = |name: &str| {
            let name = name.to_lowercase();
            if !symptoms.contains(&name) {
                symptoms.push(name);
            }
        };

        for turn in ctx.window.iter().filter(|turn| turn.role == Role::User) {
            for name in crate::extractor::symptom_terms_in(&turn.text) {
                push_unique(name);
            }
        }
        for name in crate::extractor::symptom_terms_in(ctx.user_text) {
            push_unique(name);
        }

        let window = FactWindow {
            since: Utc::now() - Duration::days(SYMPTOM_LOOKBACK_DAYS),
            until: Utc::now(),
        };
        match self.facts.facts_in_window(ctx.user_id, window) {
            Ok(facts) => {
                for fact in facts {
                    if let FactPayload::Symptom { name, .. } = fact.payload {
                        push_unique(&name);
                    }
                }
            }
            Err(err) => warn!("could not load persisted symptoms: {err}"),
        }
        symptoms
    }
}

#[async_trait]
impl Responder for DiagnosisResponder {
    fn intent(&self) -> Intent {
        Intent::Diagnosis
    }

    async fn respond(&self, ctx: &ResponderContext<'_>) -> Result<ResponderReply, ResponderError> {
        let symptoms = self.known_symptoms(ctx);
        if symptoms.is_empty() {
            return Ok(ResponderReply::text_only(format!(
                "I don't have any symptoms on record to reason about yet. Describe what you are \
                 experiencing and I can walk through possible explanations.\n\n{DISCLAIMER}"
            )));
        }
        let query_symptoms: Vec<String> =
            symptoms.iter().take(MAX_QUERY_SYMPTOMS).cloned().collect();
        debug!(
            "diagnosis responder running (conversation_id={}, symptoms={})",
            ctx.conversation_id,
            query_symptoms.join(",")
        );

        // Literature and per-symptom code lookups are independent.
        let literature_future = self.knowledge.query(KnowledgeQuery::LiteratureSearch {
            query: query_symptoms.join(" "),
            max_results: self.literature_max_results,
        });
        let code_futures = join_all(query_symptoms.iter().map(|symptom| {
            self.knowledge.query(KnowledgeQuery::ConditionCodes {
                term: symptom.clone(),
            })
        }));
        let (literature_result, code_results) = tokio::join!(literature_future, code_futures);

        // Rank candidate explanations by how many evidence rows mention
        // them across the symptom queries.
        let mut candidate_scores: HashMap<String, usize> = HashMap::new();
        let mut codes_available = false;
        for result in &code_results {
            if let Some(KnowledgePayload::ConditionCodes(codes)) = result.payload() {
                codes_available = true;
                for code in codes {
                    *candidate_scores
                        .entry(format!("{} ({})", code.description, code.code))
                        .or_insert(0) += 1;
                }
            }
        }
        let mut candidates: Vec<(String, usize)> = candidate_scores.into_iter().collect();
        candidates.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let mut evidence = vec![format!("Reported symptoms: {}", symptoms.join(", "))];
        if !candidates.is_empty() {
            let ranked: Vec<String> = candidates
                .iter()
                .map(|(candidate, score)| format!("- {candidate}: {score} matching record(s)"))
                .collect();
            evidence.push(format!(
                "Candidate explanations, most supported first:\n{}",
                ranked.join("\n")
            ));
        }
        let mut literature_available = false;
        if let Some(KnowledgePayload::Literature(articles)) = literature_result.payload() {
            literature_available = true;
            let citations: Vec<String> = articles
                .iter()
                .map(|article| format!("- {} (PMID {})", article.title, article.pmid))
                .collect();
            evidence.push(format!("Related literature:\n{}", citations.join("\n")));
        }

        let mut context_sections = Vec::new();
        if let Some(profile) = ctx.profile {
            context_sections.push(render_profile(profile));
        }
        context_sections.push(evidence.join("\n\n"));
        context_sections.push(format!("user: {}", ctx.user_text));
        let narrative = self
            .generator
            .generate(DIAGNOSIS_PROMPT, &context_sections.join("\n\n"))
            .await?;

        let mut text = narrative;
        text.push_str("\n\n");
        text.push_str(&evidence.join("\n\n"));
        if !codes_available {
            text.push_str(
                "\n\nNote: condition reference codes could not be retrieved right now, so this \
                 assessment lacks that external verification.",
            );
        }
        if !literature_available {
            text.push_str(
                "\n\nNote: the medical literature search was unavailable, so no studies back \
                 this up right now.",
            );
        }
        text.push_str(&format!("\n\n{DISCLAIMER}"));

        Ok(ResponderReply::text_only(text))
    }
}
