//! Badge rules evaluated when a recycling event is recorded.

/// Awarded the first time a user records a drop.
pub const FIRST_DROP: &str = "First Drop";

/// Returns the badge earned by reaching `total_recycled` drops, unless
/// the user already holds it. Only the first-drop rule is live; the
/// product copy advertises 10-item, 50-item, and CO₂ tiers that have
/// never had server-side rules.
pub fn earned_badge(total_recycled: i64, held: &[String]) -> Option<&'static str> {
    if total_recycled == 1 && !held.iter().any(|badge| badge == FIRST_DROP) {
        return Some(FIRST_DROP);
    }

    None
}
