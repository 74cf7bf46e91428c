//! Starter content catalogue.
//!
//! A fresh database has no educational entries, so the service seeds one at
//! startup: the built-in set below or a JSON file named by
//! `POLYHEAL_CONTENT_FILE`. Seeding only happens while `content_entries` is
//! empty; entries added later by editors are never touched.

use std::path::Path;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ConfigError;
use crate::db::repository::{count_content_entries, insert_content_entry};
use crate::db::DatabaseError;
use crate::models::ContentEntry;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogueEntry {
    pub topic: String,
    pub title: String,
    pub summary: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub clinician_signed_by: Option<String>,
}

impl CatalogueEntry {
    fn into_content(self) -> ContentEntry {
        ContentEntry {
            id: Uuid::new_v4(),
            topic: self.topic,
            title: self.title,
            short_summary: self.summary,
            body: self.body,
            tags: self.tags,
            clinician_reviewed: self.clinician_signed_by.is_some(),
            clinician_signed_by: self.clinician_signed_by,
            active: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentCatalogue {
    pub entries: Vec<CatalogueEntry>,
}

impl Default for ContentCatalogue {
    fn default() -> Self {
        Self {
            entries: vec![
                entry(
                    "parasites",
                    "Intestinal Parasites",
                    "Understanding common parasites, symptoms, and when to seek care. You're not alone: these are more common than you think.",
                    &["worms", "parasites", "intestinal", "stomach", "digestive"],
                ),
                entry(
                    "intimate_infections",
                    "Yeast Infections",
                    "Practical info about vaginal yeast infections: causes, symptoms, and treatment options explained simply.",
                    &["yeast", "infection", "vaginal", "intimate", "candida"],
                ),
                entry(
                    "intimate_infections",
                    "Bacterial Vaginosis",
                    "Learn about BV symptoms and treatment. It's treatable and nothing to be embarrassed about.",
                    &["bacterial", "vaginosis", "bv", "vaginal", "discharge"],
                ),
                entry(
                    "hair_loss",
                    "Hair Loss Support",
                    "Explore causes of hair loss and when to talk to a doctor. There are many options available.",
                    &["hair", "loss", "thinning", "scalp", "alopecia"],
                ),
                entry(
                    "period_care",
                    "Period Mishaps",
                    "Managing unexpected period situations with confidence. Tips, products, and when to see a doctor.",
                    &["period", "menstruation", "mishap", "leak"],
                ),
                entry(
                    "digestive_health",
                    "Digestive Accidents",
                    "Practical guidance for managing urgent digestive issues. Everyone experiences this, so let's talk solutions.",
                    &["digestive", "accident", "urgency", "bowel", "diarrhea"],
                ),
            ],
        }
    }
}

fn entry(topic: &str, title: &str, summary: &str, tags: &[&str]) -> CatalogueEntry {
    CatalogueEntry {
        topic: topic.to_string(),
        title: title.to_string(),
        summary: summary.to_string(),
        body: String::new(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        clinician_signed_by: None,
    }
}

impl ContentCatalogue {
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&raw).map_err(|e| ConfigError::InvalidContentCatalogue {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Insert every entry when the catalogue table is empty.
    /// Returns how many entries were written.
    pub fn seed_if_empty(&self, conn: &Connection) -> Result<usize, DatabaseError> {
        if count_content_entries(conn)? > 0 {
            return Ok(0);
        }

        let tx = conn.unchecked_transaction()?;
        for entry in &self.entries {
            insert_content_entry(&tx, &entry.clone().into_content())?;
        }
        tx.commit()?;
        Ok(self.entries.len())
    }
}
