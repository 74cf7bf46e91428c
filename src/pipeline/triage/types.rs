use serde::{Deserialize, Serialize};

use crate::models::enums::{Emotion, Intent, RiskLevel};

pub const URGENT_RISK_SCORE: f32 = 0.95;
pub const HIGH_RISK_SCORE: f32 = 0.8;
pub const MODERATE_RISK_SCORE: f32 = 0.6;
pub const LOW_RISK_SCORE: f32 = 0.2;

pub const LOW_RISK_REASON: &str = "general health information request";

/// Per-turn risk assessment. Never stored as-is: it is summarised into
/// `Message::risk_score` and, for high/urgent turns, into a ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageAssessment {
    pub level: RiskLevel,
    pub reason: String,
    pub red_flags: Vec<String>,
    pub risk_score: f32,
}

impl TriageAssessment {
    pub fn low() -> Self {
        Self {
            level: RiskLevel::Low,
            reason: LOW_RISK_REASON.to_string(),
            red_flags: Vec::new(),
            risk_score: LOW_RISK_SCORE,
        }
    }
}

/// Full keyword classification of one user message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub risk: TriageAssessment,
    pub emotion: Emotion,
    pub intent: Intent,
}
