use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(MessageRole {
    User => "user",
    Assistant => "assistant",
});

str_enum!(RiskLevel {
    Low => "low",
    Moderate => "moderate",
    High => "high",
    Urgent => "urgent",
});

str_enum!(Emotion {
    Ashamed => "ashamed",
    Anxious => "anxious",
    Sad => "sad",
    Frustrated => "frustrated",
    Neutral => "neutral",
});

str_enum!(Intent {
    SymptomCheck => "symptom_check",
    TreatmentQuestion => "treatment_question",
    InfoRequest => "info_request",
    Reassurance => "reassurance",
    Other => "other",
});

impl RiskLevel {
    /// Levels that put a conversation in front of a clinician.
    pub fn requires_escalation(&self) -> bool {
        matches!(self, Self::High | Self::Urgent)
    }
}
