use std::sync::Arc;

use super::types::*;
use crate::models::enums::{Emotion, Intent, RiskLevel};
use crate::pipeline::keywords::{normalize_text, KeywordTables};

/// Keyword classifier over injected, immutable tables.
#[derive(Debug, Clone, Default)]
pub struct KeywordClassifier {
    tables: Arc<KeywordTables>,
}

impl KeywordClassifier {
    pub fn new(tables: Arc<KeywordTables>) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &KeywordTables {
        &self.tables
    }

    /// Classify risk, emotion and intent. Total over any input text.
    pub fn classify(&self, message: &str) -> Classification {
        let lower = normalize_text(message);
        Classification {
            risk: assess_risk(&lower, &self.tables),
            emotion: detect_emotion(&lower, &self.tables),
            intent: detect_intent(&lower, &self.tables),
        }
    }
}

/// Risk level of an already-normalized message.
///
/// Urgent short-circuits every other tier and collects all urgent phrases
/// present; the other tiers report the first phrase in list order.
pub fn assess_risk(lower: &str, tables: &KeywordTables) -> TriageAssessment {
    let urgent: Vec<String> = tables
        .urgent
        .iter()
        .filter(|phrase| lower.contains(phrase.as_str()))
        .cloned()
        .collect();

    if !urgent.is_empty() {
        return TriageAssessment {
            level: RiskLevel::Urgent,
            reason: format!("Detected urgent keywords: {}", urgent.join(", ")),
            red_flags: urgent,
            risk_score: URGENT_RISK_SCORE,
        };
    }

    if let Some(phrase) = first_match(lower, &tables.high) {
        return TriageAssessment {
            level: RiskLevel::High,
            reason: format!("Detected high-risk keyword: {phrase}"),
            red_flags: vec![phrase.to_string()],
            risk_score: HIGH_RISK_SCORE,
        };
    }

    if let Some(phrase) = first_match(lower, &tables.moderate) {
        return TriageAssessment {
            level: RiskLevel::Moderate,
            reason: format!("Detected moderate concern: {phrase}"),
            red_flags: Vec::new(),
            risk_score: MODERATE_RISK_SCORE,
        };
    }

    TriageAssessment::low()
}

pub fn detect_emotion(lower: &str, tables: &KeywordTables) -> Emotion {
    tables
        .emotions
        .iter()
        .find(|rule| first_match(lower, &rule.keywords).is_some())
        .map(|rule| rule.emotion)
        .unwrap_or(Emotion::Neutral)
}

pub fn detect_intent(lower: &str, tables: &KeywordTables) -> Intent {
    tables
        .intents
        .iter()
        .find(|rule| first_match(lower, &rule.keywords).is_some())
        .map(|rule| rule.intent)
        .unwrap_or(Intent::Other)
}

/// Topic of a message for content routing; first matching rule wins.
pub fn derive_topic<'t>(message: &str, tables: &'t KeywordTables) -> &'t str {
    let lower = normalize_text(message);
    tables
        .topics
        .iter()
        .find(|rule| first_match(&lower, &rule.keywords).is_some())
        .map(|rule| rule.topic.as_str())
        .unwrap_or(tables.default_topic.as_str())
}

fn first_match<'p>(lower: &str, phrases: &'p [String]) -> Option<&'p str> {
    phrases
        .iter()
        .map(String::as_str)
        .find(|phrase| lower.contains(phrase))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::keywords::{EmotionRule, IntentRule, TopicRule};

    fn classifier() -> KeywordClassifier {
        KeywordClassifier::default()
    }

    // =================================================================
    // RISK LEVEL
    // =================================================================

    #[test]
    fn severe_pain_and_cant_breathe_is_urgent() {
        let result = classifier().classify("I've been having severe pain and I can't breathe");
        assert_eq!(result.risk.level, RiskLevel::Urgent);
        assert_eq!(result.risk.risk_score, 0.95);
        assert!(result.risk.red_flags.contains(&"severe pain".to_string()));
        assert!(result.risk.red_flags.contains(&"can't breathe".to_string()));
        assert!(result.risk.reason.contains("severe pain"));
        assert!(result.risk.reason.contains("can't breathe"));
    }

    #[test]
    fn persistent_infection_is_moderate() {
        let result = classifier().classify("This infection has been persistent for weeks");
        assert_eq!(result.risk.level, RiskLevel::Moderate);
        assert_eq!(result.risk.risk_score, 0.6);
        assert!(result.risk.reason.contains("persistent"));
        assert!(!result.risk.reason.contains("weeks"));
        assert!(result.risk.red_flags.is_empty());
    }

    #[test]
    fn yeast_question_is_low_info_request() {
        let result = classifier().classify("What is a yeast infection?");
        assert_eq!(result.risk.level, RiskLevel::Low);
        assert_eq!(result.risk.risk_score, 0.2);
        assert_eq!(result.risk.reason, LOW_RISK_REASON);
        assert!(result.risk.red_flags.is_empty());
        assert_eq!(result.intent, Intent::InfoRequest);
    }

    #[test]
    fn urgent_wins_over_any_number_of_moderate_phrases() {
        let text = "Persistent fever for weeks, months of blood, getting worse, severe... and chest pain";
        let result = classifier().classify(text);
        assert_eq!(result.risk.level, RiskLevel::Urgent);
        assert_eq!(result.risk.red_flags, vec!["chest pain".to_string()]);
    }

    #[test]
    fn every_urgent_phrase_triggers_urgent() {
        let tables = KeywordTables::default();
        for phrase in &tables.urgent {
            let text = format!("honestly {} today with a persistent fever", phrase.to_uppercase());
            let result = classifier().classify(&text);
            assert_eq!(result.risk.level, RiskLevel::Urgent, "phrase: {phrase}");
        }
    }

    #[test]
    fn moderate_reason_uses_list_order_not_text_order() {
        // "fever" appears first in the text, "weeks" first in the list
        let result = classifier().classify("fever on and off for weeks");
        assert_eq!(result.risk.reason, "Detected moderate concern: weeks");
    }

    #[test]
    fn typographic_apostrophe_still_matches() {
        let result = classifier().classify("I can’t breathe properly");
        assert_eq!(result.risk.level, RiskLevel::Urgent);
    }

    #[test]
    fn substring_matching_has_no_negation_handling() {
        let result = classifier().classify("No chest pain at all, just curious");
        assert_eq!(result.risk.level, RiskLevel::Urgent);
    }

    #[test]
    fn empty_text_is_low_neutral_other() {
        let result = classifier().classify("");
        assert_eq!(result.risk, TriageAssessment::low());
        assert_eq!(result.emotion, Emotion::Neutral);
        assert_eq!(result.intent, Intent::Other);
    }

    #[test]
    fn classification_is_deterministic() {
        let c = classifier();
        let text = "I'm so embarrassed, what is this rash? It has been weeks.";
        assert_eq!(c.classify(text), c.classify(text));
    }

    #[test]
    fn high_tier_applies_only_when_configured() {
        let mut tables = KeywordTables::default();
        assert_eq!(classifier().classify("high fever all night").risk.level, RiskLevel::Moderate);

        tables.high = vec!["high fever".into()];
        let c = KeywordClassifier::new(Arc::new(tables));
        let result = c.classify("high fever all night");
        assert_eq!(result.risk.level, RiskLevel::High);
        assert_eq!(result.risk.risk_score, 0.8);
        assert_eq!(result.risk.red_flags, vec!["high fever".to_string()]);

        // urgent still wins over high
        assert_eq!(c.classify("high fever and chest pain").risk.level, RiskLevel::Urgent);
    }

    // =================================================================
    // EMOTION / INTENT
    // =================================================================

    #[test]
    fn emotion_categories_follow_table_order() {
        // ashamed is checked before anxious
        let result = classifier().classify("I'm worried and so embarrassed about this");
        assert_eq!(result.emotion, Emotion::Ashamed);
        assert_eq!(classifier().classify("I'm really scared").emotion, Emotion::Anxious);
        assert_eq!(classifier().classify("I feel hopeless").emotion, Emotion::Sad);
        assert_eq!(classifier().classify("I'm fed up with this").emotion, Emotion::Frustrated);
    }

    #[test]
    fn intent_categories_follow_table_order() {
        assert_eq!(classifier().classify("I have an itchy rash").intent, Intent::SymptomCheck);
        assert_eq!(
            classifier().classify("How do I get rid of worms?").intent,
            Intent::TreatmentQuestion
        );
        assert_eq!(classifier().classify("Is this normal?").intent, Intent::Reassurance);
        assert_eq!(classifier().classify("hello there").intent, Intent::Other);
    }

    #[test]
    fn fixture_tables_replace_defaults() {
        let tables = KeywordTables {
            urgent: vec!["code red".into()],
            high: vec![],
            moderate: vec!["amber".into()],
            emotions: vec![EmotionRule {
                emotion: Emotion::Sad,
                keywords: vec!["blue".into()],
            }],
            intents: vec![IntentRule {
                intent: Intent::Reassurance,
                keywords: vec!["ok?".into()],
            }],
            topics: vec![],
            default_topic: "general_health".into(),
        };
        let c = KeywordClassifier::new(Arc::new(tables));

        let result = c.classify("Feeling blue, is chest pain ok?");
        assert_eq!(result.risk.level, RiskLevel::Low);
        assert_eq!(result.emotion, Emotion::Sad);
        assert_eq!(result.intent, Intent::Reassurance);
        assert_eq!(c.classify("AMBER alert").risk.level, RiskLevel::Moderate);
        assert_eq!(c.classify("CODE RED").risk.level, RiskLevel::Urgent);
    }

    // =================================================================
    // TOPIC
    // =================================================================

    #[test]
    fn topic_derivation() {
        let tables = KeywordTables::default();
        assert_eq!(derive_topic("What is a yeast infection?", &tables), "intimate_infections");
        assert_eq!(derive_topic("My hair is thinning", &tables), "hair_loss");
        assert_eq!(derive_topic("Period leak at work", &tables), "period_care");
        assert_eq!(derive_topic("I think I have worms", &tables), "parasites");
        assert_eq!(derive_topic("Constant diarrhea", &tables), "digestive_health");
        assert_eq!(derive_topic("How much water should I drink?", &tables), "general_health");
    }

    #[test]
    fn topic_first_rule_wins() {
        let tables = KeywordTables {
            topics: vec![
                TopicRule {
                    topic: "a".into(),
                    keywords: vec!["itch".into()],
                },
                TopicRule {
                    topic: "b".into(),
                    keywords: vec!["scalp".into()],
                },
            ],
            ..KeywordTables::default()
        };
        assert_eq!(derive_topic("itchy scalp", &tables), "a");
    }
}
