//! User medical profile supplied by the surrounding application.

use crate::facts::Severity;
use serde::{Deserialize, Serialize};

/// Basic demographic context.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Demographics {
    /// Age in years.
    #[serde(default)]
    pub age: Option<u32>,
    /// Self-reported gender.
    #[serde(default)]
    pub gender: Option<String>,
}

/// A known allergy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AllergyEntry {
    /// Allergen name (e.g. an active ingredient).
    pub allergen: String,
    /// Reaction severity if known.
    #[serde(default)]
    pub severity: Option<Severity>,
}

/// A diagnosed or reported condition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConditionEntry {
    /// Condition name.
    pub name: String,
    /// Status such as "active" or "resolved".
    #[serde(default)]
    pub status: Option<String>,
}

/// A medication the user currently takes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicationEntry {
    /// Medication name.
    pub name: String,
    /// Dose description.
    #[serde(default)]
    pub dose: Option<String>,
    /// Intake frequency.
    #[serde(default)]
    pub frequency: Option<String>,
}

/// Medical context for the current user, assembled by the caller from
/// persisted records. Responders treat it as read-only evidence.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct UserProfile {
    #[serde(default)]
    pub demographics: Demographics,
    #[serde(default)]
    pub allergies: Vec<AllergyEntry>,
    #[serde(default)]
    pub conditions: Vec<ConditionEntry>,
    #[serde(default)]
    pub medications: Vec<MedicationEntry>,
}

impl UserProfile {
    /// True when the profile lists at least one current medication.
    pub fn has_current_medications(&self) -> bool {
        !self.medications.is_empty()
    }
}
