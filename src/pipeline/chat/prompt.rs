use crate::models::enums::{Emotion, Intent, RiskLevel};
use crate::models::ContentEntry;
use crate::pipeline::triage::TriageAssessment;

pub const PERSONA_DIRECTIVE: &str = r#"You are the user's own confident inner voice: a calm, knowledgeable part of them that has already looked into this. Always speak in the first-person plural ("we", "let's", "our body") as if thinking it through together.

Use warm, judgment-free language. Awkward health topics are normal and common; never shame, never lecture. Explain any medical term in plain words. Keep the reply short and conversational."#;

pub const DISCLAIMER: &str = "IMPORTANT: Everything we share here is educational only, not medical advice; seek immediate care in an emergency or call your local emergency number.";

/// Tone guidance for the detected emotion. Only some emotions change the tone.
fn emotion_guidance(emotion: Emotion) -> Option<&'static str> {
    match emotion {
        Emotion::Ashamed => Some(
            "We feel embarrassed about this. Start by normalising it: this is common and nothing to be ashamed of.",
        ),
        Emotion::Anxious => Some(
            "We feel anxious. Be steady and reassuring, and lay out clear next steps one at a time.",
        ),
        Emotion::Sad => Some(
            "We feel low. Acknowledge that gently before any information, and be especially kind.",
        ),
        _ => None,
    }
}

fn intent_line(intent: Intent) -> &'static str {
    match intent {
        Intent::SymptomCheck => {
            "We are describing symptoms: help us understand what they could mean without diagnosing."
        }
        Intent::TreatmentQuestion => {
            "We are asking about treatment: describe common options in general terms and when a pharmacist or doctor should be involved."
        }
        Intent::InfoRequest => "We want to understand the topic: explain it clearly and simply.",
        Intent::Reassurance => {
            "We want reassurance: be honest about what is normal and what is a reason to get checked."
        }
        Intent::Other => "Respond to what we actually said, and ask one gentle follow-up question if it helps.",
    }
}

fn level_guidance(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::Urgent => {
            "This may be an emergency. Tell us plainly and first to get immediate medical help: call emergency services or go to the nearest emergency department now."
        }
        RiskLevel::High => {
            "This needs professional attention soon. Encourage us to see a healthcare provider within the next day."
        }
        RiskLevel::Moderate => {
            "This sounds ongoing. Suggest consulting a healthcare provider or pharmacist, alongside sensible self-care."
        }
        RiskLevel::Low => {
            "Provide education and practical self-care tips, and say when it would be worth seeing a professional."
        }
    }
}

/// Build the single leading instruction for one turn.
///
/// Deterministic for identical inputs. The disclaimer is always included.
pub fn compose(
    triage: &TriageAssessment,
    emotion: Emotion,
    intent: Intent,
    recommended: &[ContentEntry],
) -> String {
    let mut prompt = String::from(PERSONA_DIRECTIVE);
    prompt.push_str("\n\n");

    if let Some(guidance) = emotion_guidance(emotion) {
        prompt.push_str(guidance);
        prompt.push_str("\n\n");
    }

    prompt.push_str(&format!("Current triage level: {}\n", triage.level));
    prompt.push_str(&format!("Reason: {}\n", triage.reason));
    prompt.push_str(level_guidance(triage.level));
    prompt.push_str("\n\n");

    prompt.push_str(intent_line(intent));
    prompt.push_str("\n\n");

    if !recommended.is_empty() {
        prompt.push_str(
            "Clinician-reviewed resources we can point to (mention them by title where relevant):\n",
        );
        for entry in recommended {
            prompt.push_str(&format!("- {}: {}\n", entry.title, entry.short_summary));
        }
        prompt.push('\n');
    }

    prompt.push_str(DISCLAIMER);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::triage::LOW_RISK_REASON;
    use uuid::Uuid;

    fn entry(title: &str, summary: &str) -> ContentEntry {
        ContentEntry {
            id: Uuid::new_v4(),
            topic: "intimate_infections".into(),
            title: title.into(),
            short_summary: summary.into(),
            body: String::new(),
            tags: vec![],
            clinician_reviewed: true,
            clinician_signed_by: None,
            active: true,
        }
    }

    fn urgent() -> TriageAssessment {
        TriageAssessment {
            level: RiskLevel::Urgent,
            reason: "Detected urgent keywords: chest pain".into(),
            red_flags: vec!["chest pain".into()],
            risk_score: 0.95,
        }
    }

    #[test]
    fn disclaimer_present_for_every_combination() {
        let emotions = [
            Emotion::Ashamed,
            Emotion::Anxious,
            Emotion::Sad,
            Emotion::Frustrated,
            Emotion::Neutral,
        ];
        let intents = [
            Intent::SymptomCheck,
            Intent::TreatmentQuestion,
            Intent::InfoRequest,
            Intent::Reassurance,
            Intent::Other,
        ];
        for emotion in emotions {
            for intent in intents {
                for triage in [TriageAssessment::low(), urgent()] {
                    let prompt = compose(&triage, emotion, intent, &[]);
                    assert!(prompt.contains(DISCLAIMER), "{emotion}/{intent}/{}", triage.level);
                }
            }
        }
    }

    #[test]
    fn disclaimer_wording_is_exact() {
        let prompt = compose(&TriageAssessment::low(), Emotion::Neutral, Intent::Other, &[]);
        assert!(prompt
            .contains("educational only, not medical advice; seek immediate care in an emergency"));
    }

    #[test]
    fn only_some_emotions_add_guidance() {
        let base = compose(&TriageAssessment::low(), Emotion::Neutral, Intent::Other, &[]);
        let frustrated = compose(&TriageAssessment::low(), Emotion::Frustrated, Intent::Other, &[]);
        assert_eq!(base, frustrated);

        let ashamed = compose(&TriageAssessment::low(), Emotion::Ashamed, Intent::Other, &[]);
        assert!(ashamed.contains("nothing to be ashamed of"));
        assert_ne!(base, ashamed);
        assert_ne!(base, compose(&TriageAssessment::low(), Emotion::Anxious, Intent::Other, &[]));
        assert_ne!(base, compose(&TriageAssessment::low(), Emotion::Sad, Intent::Other, &[]));
    }

    #[test]
    fn includes_level_reason_and_urgent_guidance() {
        let prompt = compose(&urgent(), Emotion::Anxious, Intent::SymptomCheck, &[]);
        assert!(prompt.contains("Current triage level: urgent"));
        assert!(prompt.contains("Reason: Detected urgent keywords: chest pain"));
        assert!(prompt.contains("immediate medical help"));

        let low = compose(&TriageAssessment::low(), Emotion::Neutral, Intent::InfoRequest, &[]);
        assert!(low.contains(LOW_RISK_REASON));
        assert!(low.contains("self-care"));
    }

    #[test]
    fn content_titles_and_summaries_are_verbatim() {
        let content = vec![
            entry("Understanding Thrush", "A common fungal infection, usually easy to treat."),
            entry("BV vs. Yeast", "How to tell two common conditions apart."),
        ];
        let prompt = compose(&TriageAssessment::low(), Emotion::Neutral, Intent::InfoRequest, &content);
        assert!(prompt.contains("Understanding Thrush: A common fungal infection, usually easy to treat."));
        assert!(prompt.contains("BV vs. Yeast: How to tell two common conditions apart."));

        let without = compose(&TriageAssessment::low(), Emotion::Neutral, Intent::InfoRequest, &[]);
        assert!(!without.contains("Clinician-reviewed resources"));
    }

    #[test]
    fn persona_is_first_person_plural() {
        let prompt = compose(&TriageAssessment::low(), Emotion::Neutral, Intent::Other, &[]);
        assert!(prompt.starts_with(PERSONA_DIRECTIVE));
        assert!(prompt.contains("first-person plural"));
    }

    #[test]
    fn composition_is_deterministic() {
        let content = vec![entry("T", "S")];
        let a = compose(&urgent(), Emotion::Sad, Intent::Reassurance, &content);
        let b = compose(&urgent(), Emotion::Sad, Intent::Reassurance, &content);
        assert_eq!(a, b);
    }
}
