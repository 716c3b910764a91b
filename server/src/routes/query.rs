use serde::Deserialize;

/// Query parameters accepted by the recent-detections listing.
#[derive(Debug, Deserialize)]
pub struct DetectionsQuery {
    /// Overrides the configured listing size. Clamped server-side.
    pub limit: Option<i64>,
}
