//! Install-to-click fingerprint matching
//!
//! - `fingerprint`: typed fingerprint payloads and match outcomes
//! - `scorer`: weighted attribute comparison
//! - `selector`: candidate lookup contract
//! - `engine`: decision policy and commit

pub mod engine;
pub mod fingerprint;
pub mod scorer;
pub mod selector;

pub use engine::{AttributionEngine, AttributionLedger, FingerprintStore, MatchPolicy};
pub use fingerprint::{Attribution, Fingerprint, InstallReport, MatchOutcome, NoMatchReason};
pub use scorer::{MAX_SCORE, ScoreBreakdown, score};
pub use selector::CandidateSelector;
