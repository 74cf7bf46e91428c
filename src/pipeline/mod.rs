pub mod catalogue; // starter content seeded into an empty database
pub mod keywords;
pub mod triage; // classification, anonymisation, escalation
pub mod chat; // turn orchestration and model backends
