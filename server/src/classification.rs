//! The contract with the external waste classifier.
//!
//! The classifier itself (model, inference engine) lives outside this
//! service; all it owes us is a ranked list of labelled guesses. The
//! only rule the backend cares about is when a guess may be confirmed
//! without a human in the loop.

use serde::{Deserialize, Serialize};

/// Minimum probability at which the top candidate may be auto-confirmed.
pub const CONFIDENCE_THRESHOLD: f64 = 0.85;

/// One classifier guess.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Candidate {
    /// The item-type label.
    pub label: String,

    /// The classifier's probability for the label, in [0, 1].
    pub probability: f64,
}

/// The result of screening classifier output.
#[derive(Clone, Debug, PartialEq)]
pub enum Selection {
    /// The top candidate cleared the threshold.
    Confirmed(Candidate),

    /// No candidate cleared the threshold; the client must fall back
    /// to manual selection.
    ManualFallback,
}

/// Picks the highest-probability candidate if it clears
/// [`CONFIDENCE_THRESHOLD`]. The input is expected ranked but is not
/// trusted to be.
pub fn select_candidate(ranked: &[Candidate]) -> Selection {
    let top = ranked.iter().max_by(|a, b| {
        a.probability
            .partial_cmp(&b.probability)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    match top {
        Some(candidate) if candidate.probability >= CONFIDENCE_THRESHOLD => {
            Selection::Confirmed(candidate.clone())
        }
        _ => Selection::ManualFallback,
    }
}
