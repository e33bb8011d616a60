//! Medication responder: drug lookup, interaction check, safety verdict.

use super::symptom::render_profile;
use super::{Responder, ResponderContext, ResponderError, ResponderReply};
use async_trait::async_trait;
use log::{debug, info};
use regex::Regex;
use serde_json::json;
use std::sync::{Arc, LazyLock};
use vitalis_knowledge::{
    DrugFacts, KnowledgeClient, KnowledgePayload, KnowledgeQuery, KnowledgeQueryResult,
};
use vitalis_protocol::{Intent, SafetyVerdict, TextGenerator, UserProfile};

const MEDICATION_PROMPT: &str = "You are a medication information assistant with access to drug \
label data. Explain what the medication is for, typical usage and notable side effects, using \
the provided label data where available. Flag anything relevant to the user's allergies and \
conditions. Never present this as a prescription.";

const CONSULT_LINE: &str =
    "Always confirm medication decisions with a doctor or pharmacist before acting on them.";

static DOSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d+(?:\.\d+)?\s*(?:mg|mcg|g|ml))\b").unwrap());

static FREQUENCY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(daily|nightly|weekly|once a day|twice a day|three times a day|every \d+ hours|every morning|every night)\b")
        .unwrap()
});

static TAKING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(i['’]?m taking|i am taking|i take|started taking|i started|please log)\b")
        .unwrap()
});

/// Handles medication questions: resolves the drug name, gathers label,
/// standardized-name and interaction evidence concurrently, and computes
/// the tri-level safety verdict.
pub struct MedicationResponder {
    generator: Arc<dyn TextGenerator>,
    knowledge: Arc<dyn KnowledgeClient>,
}

impl MedicationResponder {
    pub fn new(generator: Arc<dyn TextGenerator>, knowledge: Arc<dyn KnowledgeClient>) -> Self {
        Self {
            generator,
            knowledge,
        }
    }
}

#[async_trait]
impl Responder for MedicationResponder {
    fn intent(&self) -> Intent {
        Intent::Medication
    }

    async fn respond(&self, ctx: &ResponderContext<'_>) -> Result<ResponderReply, ResponderError> {
        let Some(drug_name) = resolve_drug_name(ctx.user_text) else {
            return Ok(ResponderReply::text_only(
                "Which medication would you like to know about? Give me its name and I can look \
                 up what it is for, its warnings, and how it fits your health profile.",
            ));
        };
        debug!(
            "medication responder running (conversation_id={}, drug={})",
            ctx.conversation_id, drug_name
        );

        let check_interactions = ctx
            .profile
            .map(UserProfile::has_current_medications)
            .unwrap_or(false);
        // Provider calls are independent; only their completion matters.
        let (facts_result, concepts_result, interactions_result) = tokio::join!(
            self.knowledge.query(KnowledgeQuery::DrugFacts {
                name: drug_name.clone(),
            }),
            self.knowledge.query(KnowledgeQuery::StandardizedDrugName {
                name: drug_name.clone(),
            }),
            async {
                if check_interactions {
                    Some(
                        self.knowledge
                            .query(KnowledgeQuery::DrugInteractions {
                                name: drug_name.clone(),
                            })
                            .await,
                    )
                } else {
                    None
                }
            }
        );

        let drug_facts = drug_facts_payload(&facts_result);
        let (verdict, verdict_notes) = compute_verdict(&drug_name, drug_facts, ctx.profile);
        info!(
            "medication safety verdict (conversation_id={}, drug={}, verdict={})",
            ctx.conversation_id,
            drug_name,
            verdict.as_str()
        );

        let evidence = render_evidence(&drug_name, drug_facts, &concepts_result, &interactions_result);
        let caveats = collect_caveats(&facts_result, &concepts_result, &interactions_result);

        let mut context_sections = vec![format!("Medication in question: {drug_name}")];
        if let Some(profile) = ctx.profile {
            context_sections.push(render_profile(profile));
        }
        context_sections.push(evidence.clone());
        context_sections.push(format!("user: {}", ctx.user_text));
        let narrative = self
            .generator
            .generate(MEDICATION_PROMPT, &context_sections.join("\n\n"))
            .await?;

        let mut text = narrative;
        text.push_str("\n\n");
        text.push_str(&evidence);
        text.push_str(&format!(
            "\n\nSafety assessment: {}",
            verdict.as_str()
        ));
        for note in &verdict_notes {
            text.push_str(&format!("\n- {note}"));
        }
        for caveat in &caveats {
            text.push_str(&format!("\n{caveat}"));
        }
        text.push_str(&format!("\n{CONSULT_LINE}"));

        Ok(ResponderReply {
            text,
            structured_hints: logging_hints(ctx.user_text, &drug_name),
            safety_verdict: Some(verdict),
        })
    }
}

/// Pull the medication name out of the message.
///
/// Preference order: the token following a lead-in word ("about",
/// "take", ...), then a capitalized mid-sentence token, then the first
/// unusual word.
fn resolve_drug_name(text: &str) -> Option<String> {
    const LEAD_INS: &[&str] = &["about", "take", "taking", "on", "start", "started", "log"];
    const STOPWORDS: &[&str] = &[
        "the", "this", "that", "with", "and", "for", "what", "when", "how", "much", "many",
        "safe", "does", "will", "would", "should", "could", "medication", "medicine", "drug",
        "pill", "pills", "together", "daily", "every", "twice", "once", "from", "have", "has",
        "been", "some", "any", "side", "effects", "effect", "info", "information",
    ];

    let tokens: Vec<String> = text
        .split_whitespace()
        .map(|token| {
            token
                .trim_matches(|c: char| !c.is_alphanumeric())
                .to_string()
        })
        .filter(|token| !token.is_empty())
        .collect();

    let is_candidate = |token: &str| {
        token.len() > 3
            && token.chars().all(char::is_alphabetic)
            && !STOPWORDS.contains(&token.to_lowercase().as_str())
    };

    for pair in tokens.windows(2) {
        if LEAD_INS.contains(&pair[0].to_lowercase().as_str()) && is_candidate(&pair[1]) {
            return Some(pair[1].to_lowercase());
        }
    }
    for token in tokens.iter().skip(1) {
        if token.chars().next().is_some_and(char::is_uppercase) && is_candidate(token) {
            return Some(token.to_lowercase());
        }
    }
    tokens
        .iter()
        .find(|token| is_candidate(token))
        .map(|token| token.to_lowercase())
}

fn drug_facts_payload(result: &KnowledgeQueryResult) -> Option<&DrugFacts> {
    match result.payload() {
        Some(KnowledgePayload::DrugFacts(facts)) => Some(facts),
        _ => None,
    }
}

/// Fixed verdict rule over the resolved drug and the user profile.
///
/// An allergen matching the active ingredient or the drug name itself is
/// HIGH_RISK even when other providers are down; a profile condition
/// appearing in the label warnings is CAUTION; otherwise SAFE. Missing
/// evidence never escalates the verdict, it only gets disclosed.
fn compute_verdict(
    drug_name: &str,
    facts: Option<&DrugFacts>,
    profile: Option<&UserProfile>,
) -> (SafetyVerdict, Vec<String>) {
    let Some(profile) = profile else {
        return (SafetyVerdict::Safe, Vec::new());
    };
    let mut notes = Vec::new();

    let mut ingredient_haystack = drug_name.to_lowercase();
    if let Some(facts) = facts {
        for field in [&facts.active_ingredient, &facts.generic_name, &facts.brand_name] {
            if let Some(value) = field {
                ingredient_haystack.push(' ');
                ingredient_haystack.push_str(&value.to_lowercase());
            }
        }
    }
    for allergy in &profile.allergies {
        let allergen = allergy.allergen.to_lowercase();
        if !allergen.is_empty() && ingredient_haystack.contains(&allergen) {
            notes.push(format!(
                "Allergy alert: this medication appears to contain or match your allergy to {}.",
                allergy.allergen
            ));
        }
    }
    if !notes.is_empty() {
        notes.push("Do not take this medication before talking to your doctor.".to_string());
        return (SafetyVerdict::HighRisk, notes);
    }

    if let Some(warnings) = facts.and_then(|facts| facts.warnings.as_deref()) {
        let warnings = warnings.to_lowercase();
        for condition in &profile.conditions {
            let name = condition.name.to_lowercase();
            if !name.is_empty() && warnings.contains(&name) {
                notes.push(format!(
                    "Caution: the label warnings mention {}, which is in your health history.",
                    condition.name
                ));
            }
        }
    }
    if !notes.is_empty() {
        return (SafetyVerdict::Caution, notes);
    }
    (SafetyVerdict::Safe, notes)
}

/// Render available evidence as reply sections.
fn render_evidence(
    drug_name: &str,
    facts: Option<&DrugFacts>,
    concepts_result: &KnowledgeQueryResult,
    interactions_result: &Option<KnowledgeQueryResult>,
) -> String {
    let mut lines = vec![format!("About {drug_name} (label data):")];
    match facts {
        Some(facts) => {
            if let Some(purpose) = &facts.purpose {
                lines.push(format!("- Purpose: {purpose}"));
            }
            if let Some(active) = &facts.active_ingredient {
                lines.push(format!("- Active ingredient: {active}"));
            }
            if let Some(warnings) = &facts.warnings {
                lines.push(format!("- Warnings: {warnings}"));
            }
            if let Some(adverse) = &facts.adverse_reactions {
                lines.push(format!("- Adverse reactions: {adverse}"));
            }
        }
        None => lines.push("- No label data available.".to_string()),
    }
    if let Some(KnowledgePayload::DrugConcepts(concepts)) = concepts_result.payload()
        && let Some(first) = concepts.first()
    {
        lines.push(format!(
            "- Standardized name: {} (RxCUI {})",
            first.name, first.rxcui
        ));
    }
    if let Some(result) = interactions_result
        && let Some(KnowledgePayload::Interactions { text }) = result.payload()
    {
        lines.push(format!("- Interactions: {text}"));
    }
    lines.join("\n")
}

/// Disclosure lines for providers that could not answer.
fn collect_caveats(
    facts_result: &KnowledgeQueryResult,
    concepts_result: &KnowledgeQueryResult,
    interactions_result: &Option<KnowledgeQueryResult>,
) -> Vec<String> {
    let mut caveats = Vec::new();
    if !facts_result.is_available() {
        caveats.push(
            "Note: drug label data could not be verified right now, so this assessment is based \
             on limited evidence."
                .to_string(),
        );
    }
    if !concepts_result.is_available() {
        caveats.push("Note: the standardized drug name lookup was unavailable.".to_string());
    }
    if let Some(result) = interactions_result
        && !result.is_available()
    {
        caveats.push(
            "Note: interactions with your current medications could not be checked right now."
                .to_string(),
        );
    }
    caveats
}

/// Hint a medication fact only when the user says they take it.
fn logging_hints(user_text: &str, drug_name: &str) -> serde_json::Value {
    if !TAKING_RE.is_match(user_text) {
        return json!({});
    }
    let dose = DOSE_RE
        .captures(user_text)
        .map(|caps| caps[1].to_lowercase());
    let frequency = FREQUENCY_RE
        .captures(user_text)
        .map(|caps| caps[1].to_lowercase());
    json!({
        "medications": [{
            "name": drug_name,
            "dose": dose,
            "frequency": frequency,
        }]
    })
}

#[cfg(test)]
mod tests {
    use super::{compute_verdict, logging_hints, resolve_drug_name};
    use pretty_assertions::assert_eq;
    use vitalis_knowledge::DrugFacts;
    use vitalis_protocol::{AllergyEntry, ConditionEntry, SafetyVerdict, UserProfile};

    fn facts() -> DrugFacts {
        DrugFacts {
            brand_name: Some("Aspirin".to_string()),
            generic_name: Some("aspirin".to_string()),
            purpose: Some("Pain reliever".to_string()),
            warnings: Some("Do not use if you have asthma or stomach ulcers".to_string()),
            active_ingredient: Some("Aspirin 325 mg".to_string()),
            dosage: None,
            adverse_reactions: None,
        }
    }

    fn profile_with_allergy(allergen: &str) -> UserProfile {
        UserProfile {
            allergies: vec![AllergyEntry {
                allergen: allergen.to_string(),
                severity: None,
            }],
            ..UserProfile::default()
        }
    }

    #[test]
    fn resolves_name_after_lead_in() {
        assert_eq!(
            resolve_drug_name("Tell me about aspirin"),
            Some("aspirin".to_string())
        );
        assert_eq!(
            resolve_drug_name("can I take ibuprofen with food?"),
            Some("ibuprofen".to_string())
        );
    }

    #[test]
    fn resolves_capitalized_mid_sentence_token() {
        assert_eq!(
            resolve_drug_name("is Tylenol safe during pregnancy"),
            Some("tylenol".to_string())
        );
    }

    #[test]
    fn gives_up_without_candidates() {
        assert_eq!(resolve_drug_name("what should I do"), None);
    }

    #[test]
    fn allergy_on_active_ingredient_is_high_risk() {
        let profile = profile_with_allergy("aspirin");
        let (verdict, notes) = compute_verdict("aspirin", Some(&facts()), Some(&profile));
        assert_eq!(verdict, SafetyVerdict::HighRisk);
        assert!(notes[0].contains("aspirin"));
    }

    #[test]
    fn allergy_matches_drug_name_without_label_data() {
        let profile = profile_with_allergy("Aspirin");
        let (verdict, _) = compute_verdict("aspirin", None, Some(&profile));
        assert_eq!(verdict, SafetyVerdict::HighRisk);
    }

    #[test]
    fn condition_in_warnings_is_caution() {
        let profile = UserProfile {
            conditions: vec![ConditionEntry {
                name: "asthma".to_string(),
                status: Some("active".to_string()),
            }],
            ..UserProfile::default()
        };
        let (verdict, notes) = compute_verdict("aspirin", Some(&facts()), Some(&profile));
        assert_eq!(verdict, SafetyVerdict::Caution);
        assert!(notes[0].contains("asthma"));
    }

    #[test]
    fn missing_evidence_stays_safe() {
        let profile = UserProfile {
            conditions: vec![ConditionEntry {
                name: "asthma".to_string(),
                status: None,
            }],
            ..UserProfile::default()
        };
        let (verdict, notes) = compute_verdict("aspirin", None, Some(&profile));
        assert_eq!(verdict, SafetyVerdict::Safe);
        assert_eq!(notes.len(), 0);
    }

    #[test]
    fn logging_hints_only_when_user_takes_it() {
        let hints = logging_hints("I'm taking metformin 500mg twice a day", "metformin");
        assert_eq!(hints["medications"][0]["name"], "metformin");
        assert_eq!(hints["medications"][0]["dose"], "500mg");
        assert_eq!(hints["medications"][0]["frequency"], "twice a day");

        let hints = logging_hints("Tell me about metformin", "metformin");
        assert_eq!(hints, serde_json::json!({}));
    }
}
