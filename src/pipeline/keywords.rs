//! Keyword tables driving triage, tone/intent detection and topic routing.
//!
//! Loaded once at startup (built-in defaults or a JSON file) and shared
//! read-only by every turn. All phrases are matched as lowercase substrings;
//! order inside each list is significant.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::models::content::GENERAL_HEALTH_TOPIC;
use crate::models::enums::{Emotion, Intent};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmotionRule {
    pub emotion: Emotion,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentRule {
    pub intent: Intent,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicRule {
    pub topic: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordTables {
    pub urgent: Vec<String>,
    /// Empty in the built-in tables; deployments may opt in to a high tier.
    pub high: Vec<String>,
    pub moderate: Vec<String>,
    pub emotions: Vec<EmotionRule>,
    pub intents: Vec<IntentRule>,
    pub topics: Vec<TopicRule>,
    pub default_topic: String,
}

impl Default for KeywordTables {
    fn default() -> Self {
        Self {
            urgent: words(&[
                "suicide",
                "kill myself",
                "end my life",
                "severe pain",
                "can't breathe",
                "chest pain",
                "bleeding heavily",
                "unconscious",
                "overdose",
                "allergic reaction",
                "swelling throat",
            ]),
            high: Vec::new(),
            moderate: words(&[
                "persistent",
                "weeks",
                "months",
                "getting worse",
                "fever",
                "blood",
                "severe",
            ]),
            emotions: vec![
                EmotionRule {
                    emotion: Emotion::Ashamed,
                    keywords: words(&[
                        "embarrass",
                        "ashamed",
                        "shame",
                        "awkward",
                        "humiliat",
                        "gross",
                    ]),
                },
                EmotionRule {
                    emotion: Emotion::Anxious,
                    keywords: words(&[
                        "anxious",
                        "worried",
                        "worry",
                        "scared",
                        "nervous",
                        "panic",
                        "afraid",
                        "freaking out",
                    ]),
                },
                EmotionRule {
                    emotion: Emotion::Sad,
                    keywords: words(&[
                        "sad",
                        "depressed",
                        "hopeless",
                        "lonely",
                        "crying",
                        "feel down",
                        "feeling down",
                    ]),
                },
                EmotionRule {
                    emotion: Emotion::Frustrated,
                    keywords: words(&["frustrat", "annoyed", "angry", "fed up", "sick of"]),
                },
            ],
            intents: vec![
                IntentRule {
                    intent: Intent::SymptomCheck,
                    keywords: words(&[
                        "symptom",
                        "itch",
                        "hurt",
                        "rash",
                        "discharge",
                        "bleeding",
                        "i have",
                        "i've been having",
                    ]),
                },
                IntentRule {
                    intent: Intent::TreatmentQuestion,
                    keywords: words(&[
                        "treat",
                        "cure",
                        "medication",
                        "medicine",
                        "remedy",
                        "get rid of",
                        "what can i take",
                    ]),
                },
                IntentRule {
                    intent: Intent::InfoRequest,
                    keywords: words(&[
                        "what is",
                        "what are",
                        "what's",
                        "how does",
                        "why do",
                        "explain",
                        "tell me about",
                    ]),
                },
                IntentRule {
                    intent: Intent::Reassurance,
                    keywords: words(&[
                        "is it normal",
                        "is this normal",
                        "should i worry",
                        "is it okay",
                        "am i okay",
                        "common",
                    ]),
                },
            ],
            topics: vec![
                TopicRule {
                    topic: "intimate_infections".into(),
                    keywords: words(&[
                        "yeast",
                        "thrush",
                        "candida",
                        "vaginosis",
                        "vaginal",
                        "discharge",
                        "intimate",
                    ]),
                },
                TopicRule {
                    topic: "parasites".into(),
                    keywords: words(&["parasite", "worms", "pinworm", "intestinal"]),
                },
                TopicRule {
                    topic: "hair_loss".into(),
                    keywords: words(&["hair loss", "hair", "bald", "thinning", "alopecia", "scalp"]),
                },
                TopicRule {
                    topic: "period_care".into(),
                    keywords: words(&["period", "menstrua", "tampon", "cramps", "leak"]),
                },
                TopicRule {
                    topic: "digestive_health".into(),
                    keywords: words(&[
                        "diarrh",
                        "bowel",
                        "constipat",
                        "digestive",
                        "stomach",
                        "bloat",
                    ]),
                },
            ],
            default_topic: GENERAL_HEALTH_TOPIC.to_string(),
        }
    }
}

impl KeywordTables {
    /// Load tables from a JSON file. Missing sections fall back to the built-in defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let tables: KeywordTables =
            serde_json::from_str(&raw).map_err(|e| ConfigError::InvalidKeywordTables {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        Ok(tables.normalized())
    }

    /// Lowercase every phrase and drop blanks so matching stays a plain
    /// substring test against the lowercased message.
    pub fn normalized(mut self) -> Self {
        normalize_list(&mut self.urgent);
        normalize_list(&mut self.high);
        normalize_list(&mut self.moderate);
        for rule in &mut self.emotions {
            normalize_list(&mut rule.keywords);
        }
        for rule in &mut self.intents {
            normalize_list(&mut rule.keywords);
        }
        for rule in &mut self.topics {
            normalize_list(&mut rule.keywords);
        }
        if self.default_topic.trim().is_empty() {
            self.default_topic = GENERAL_HEALTH_TOPIC.to_string();
        }
        self
    }
}

/// Lowercase and fold typographic apostrophes so "can’t" matches "can't".
pub fn normalize_text(text: &str) -> String {
    text.to_lowercase().replace(['\u{2019}', '\u{2018}'], "'")
}

fn normalize_list(list: &mut Vec<String>) {
    for phrase in list.iter_mut() {
        *phrase = normalize_text(phrase.trim());
    }
    list.retain(|p| !p.is_empty());
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_already_normalized() {
        let tables = KeywordTables::default();
        assert_eq!(tables.clone().normalized(), tables);
    }

    #[test]
    fn normalize_folds_case_and_apostrophes() {
        assert_eq!(normalize_text("I Can’t Breathe"), "i can't breathe");
    }

    #[test]
    fn partial_json_keeps_defaults_for_missing_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keywords.json");
        std::fs::write(&path, r#"{"urgent": ["  Fainted "], "high": ["High Fever"]}"#).unwrap();

        let tables = KeywordTables::from_json_file(&path).unwrap();
        assert_eq!(tables.urgent, vec!["fainted".to_string()]);
        assert_eq!(tables.high, vec!["high fever".to_string()]);
        assert_eq!(tables.moderate, KeywordTables::default().moderate);
        assert_eq!(tables.default_topic, GENERAL_HEALTH_TOPIC);
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keywords.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = KeywordTables::from_json_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidKeywordTables { .. }));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = KeywordTables::from_json_file(Path::new("/nonexistent/keywords.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
