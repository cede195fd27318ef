//! Priority rules: raw configuration form and the compiled tagged form

use serde::{Deserialize, Serialize};

use super::record::{NotificationType, OpenStatus};
use crate::error::RuleError;

/// Rule as stored in configuration (`{value, criteria, specifier?}`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPriorityRule {
    pub value: i32,
    pub criteria: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specifier: Option<String>,
}

impl RawPriorityRule {
    pub fn new(value: i32, criteria: impl Into<String>, specifier: Option<&str>) -> Self {
        Self {
            value,
            criteria: criteria.into(),
            specifier: specifier.map(str::to_string),
        }
    }
}

/// Matching condition of a rule; each kind carries only what it needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Criteria {
    ManyComments,
    ManyReactions,
    Assigned,
    Mentioned,
    ReviewRequest,
    Label(String),
    State(OpenStatus),
    Type(NotificationType),
}

/// Validated rule ready for scoring
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorityRule {
    pub value: i32,
    pub criteria: Criteria,
}

impl PriorityRule {
    pub fn new(value: i32, criteria: Criteria) -> Self {
        Self { value, criteria }
    }

    /// Human-readable label stored on scored records
    pub fn description(&self) -> String {
        match &self.criteria {
            Criteria::ManyComments => "Many comments".to_string(),
            Criteria::ManyReactions => "Many reactions".to_string(),
            Criteria::Assigned => "Assigned".to_string(),
            Criteria::Mentioned => "Mentioned".to_string(),
            Criteria::ReviewRequest => "Review request".to_string(),
            Criteria::Label(name) => format!("Label: {}", name),
            Criteria::State(status) => format!("State: {}", status),
            Criteria::Type(kind) => format!("Type: {}", kind),
        }
    }
}

impl TryFrom<&RawPriorityRule> for PriorityRule {
    type Error = RuleError;

    fn try_from(raw: &RawPriorityRule) -> Result<Self, Self::Error> {
        let specifier = || {
            raw.specifier
                .as_deref()
                .filter(|s| !s.is_empty())
                .ok_or_else(|| RuleError::MissingSpecifier(raw.criteria.clone()))
        };
        let invalid = |spec: &str| RuleError::InvalidSpecifier {
            criteria: raw.criteria.clone(),
            specifier: spec.to_string(),
        };

        let criteria = match raw.criteria.as_str() {
            "many-comments" => Criteria::ManyComments,
            "many-reactions" => Criteria::ManyReactions,
            "assigned" => Criteria::Assigned,
            "mentioned" => Criteria::Mentioned,
            "review-request" => Criteria::ReviewRequest,
            "label" => Criteria::Label(specifier()?.to_string()),
            "state" => {
                let spec = specifier()?;
                Criteria::State(spec.parse().map_err(|_| invalid(spec))?)
            }
            "type" => {
                let spec = specifier()?;
                Criteria::Type(spec.parse().map_err(|_| invalid(spec))?)
            }
            other => return Err(RuleError::UnknownCriteria(other.to_string())),
        };

        Ok(PriorityRule::new(raw.value, criteria))
    }
}
