use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::errors::BackendError;
use crate::user::User;

/// A single recorded recycling event. Append-only: once written it is
/// never edited or deleted.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Detection {
    /// The ID of the detection.
    #[serde(rename = "_id")]
    id: Uuid,

    /// The user who recorded it.
    user_id: Uuid,

    /// The item-type tag.
    #[serde(rename = "type")]
    item_type: String,

    /// The display label.
    name: String,

    /// Classifier or manual-selection confidence, 0–100.
    confidence: f64,

    /// Weight in kilograms.
    weight: f64,

    /// Estimated residual value.
    value: f64,

    /// Points awarded for the drop.
    points: i64,

    /// Kilograms of CO₂ attributed.
    co2_saved: f64,

    /// Condition of the item as submitted.
    condition: String,

    /// Reference to the captured image, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<String>,

    /// The server-assigned creation time.
    #[serde(with = "time::serde::timestamp")]
    created_at: OffsetDateTime,
}

impl Detection {
    pub fn new(id: Uuid, user_id: Uuid, item: SubmittedItem, created_at: OffsetDateTime) -> Self {
        Detection {
            id,
            user_id,
            item_type: item.item_type,
            name: item.name,
            confidence: item.confidence,
            weight: item.weight,
            value: item.value,
            points: item.points,
            co2_saved: item.co2_saved,
            condition: item.condition,
            image: item.image,
            created_at,
        }
    }

    pub fn id(&self) -> &Uuid {
        &self.id
    }

    pub fn user_id(&self) -> &Uuid {
        &self.user_id
    }

    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }
}

/// The item a user confirmed for submission. Figures come from the
/// classifier or the manual-override menu; the backend checks ranges
/// but does not re-derive value, points, or CO₂ from weight.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedItem {
    #[serde(rename = "type")]
    pub(crate) item_type: String,

    pub(crate) name: String,

    pub(crate) confidence: f64,

    pub(crate) weight: f64,

    pub(crate) value: f64,

    pub(crate) points: i64,

    pub(crate) co2_saved: f64,

    pub(crate) condition: String,

    #[serde(default)]
    pub(crate) image: Option<String>,
}

impl SubmittedItem {
    /// Range checks. A negative points or CO₂ figure would let a
    /// submission decrease a user's cumulative stats, so both are
    /// rejected here, before anything touches storage.
    pub fn validate(&self) -> Result<(), BackendError> {
        if self.item_type.trim().is_empty() || self.name.trim().is_empty() {
            return Err(BackendError::MissingFields);
        }

        if self.confidence.is_nan() || !(0.0..=100.0).contains(&self.confidence) {
            return Err(BackendError::InvalidItem {
                field: "confidence",
                message: "must be between 0 and 100",
            });
        }

        if self.weight.is_nan() || self.weight <= 0.0 {
            return Err(BackendError::InvalidItem {
                field: "weight",
                message: "must be positive",
            });
        }

        if self.value.is_nan() || self.value < 0.0 {
            return Err(BackendError::InvalidItem {
                field: "value",
                message: "must not be negative",
            });
        }

        if self.points < 0 {
            return Err(BackendError::InvalidItem {
                field: "points",
                message: "must not be negative",
            });
        }

        if self.co2_saved.is_nan() || self.co2_saved < 0.0 {
            return Err(BackendError::InvalidItem {
                field: "co2Saved",
                message: "must not be negative",
            });
        }

        Ok(())
    }
}

/// A recycling submission. Both fields are required, but they arrive
/// optional so an absent field maps to the API's 400 rather than a
/// deserialization failure.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecycleRequest {
    #[serde(default)]
    pub(crate) user_id: Option<String>,

    #[serde(default)]
    pub(crate) item: Option<SubmittedItem>,
}

/// What a successful submission returns: the stored detection and the
/// user with the rewards applied, as one unit.
#[derive(Clone, Debug)]
pub struct RecyclingReceipt {
    pub(crate) updated_user: User,
    pub(crate) saved_detection: Detection,
}

impl RecyclingReceipt {
    pub fn new(updated_user: User, saved_detection: Detection) -> Self {
        RecyclingReceipt {
            updated_user,
            saved_detection,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SubmittedItem;
    use crate::errors::BackendError;

    fn item() -> SubmittedItem {
        serde_json::from_value(serde_json::json!({
            "type": "phone",
            "name": "Smartphone",
            "confidence": 92.0,
            "weight": 0.18,
            "value": 15.0,
            "points": 150,
            "co2Saved": 12.0,
            "condition": "Good",
        }))
        .expect("parse item")
    }

    #[test]
    fn well_formed_item_passes() {
        assert!(item().validate().is_ok());
    }

    #[test]
    fn negative_points_are_rejected() {
        let mut bad = item();
        bad.points = -10;

        assert!(matches!(
            bad.validate(),
            Err(BackendError::InvalidItem { field: "points", .. })
        ));
    }

    #[test]
    fn zero_weight_is_rejected() {
        let mut bad = item();
        bad.weight = 0.0;

        assert!(matches!(
            bad.validate(),
            Err(BackendError::InvalidItem { field: "weight", .. })
        ));
    }

    #[test]
    fn out_of_range_confidence_is_rejected() {
        let mut bad = item();
        bad.confidence = 120.0;

        assert!(matches!(
            bad.validate(),
            Err(BackendError::InvalidItem { field: "confidence", .. })
        ));
    }

    #[test]
    fn nan_figures_are_rejected() {
        let mut bad = item();
        bad.co2_saved = f64::NAN;

        assert!(bad.validate().is_err());
    }

    #[test]
    fn blank_type_is_missing_fields() {
        let mut bad = item();
        bad.item_type = " ".to_owned();

        assert!(matches!(bad.validate(), Err(BackendError::MissingFields)));
    }
}
