use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::BackendError;
use crate::normalization;
use crate::times::Times;

/// The operational state of a bin.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BinStatus {
    Operational,
    Full,
    Maintenance,
}

impl BinStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinStatus::Operational => "operational",
            BinStatus::Full => "full",
            BinStatus::Maintenance => "maintenance",
        }
    }

    pub fn parse(value: &str) -> Result<Self, BackendError> {
        match value {
            "operational" => Ok(BinStatus::Operational),
            "full" => Ok(BinStatus::Full),
            "maintenance" => Ok(BinStatus::Maintenance),
            other => Err(BackendError::InvalidStatus(other.to_owned())),
        }
    }
}

impl Default for BinStatus {
    fn default() -> Self {
        BinStatus::Operational
    }
}

/// A single collection point.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bin {
    /// The storage key of the bin. Routes address bins by this.
    #[serde(rename = "_id")]
    id: Uuid,

    /// The external-facing ID shown on the physical bin. Unique.
    #[serde(rename = "id")]
    public_id: String,

    /// The display name.
    name: String,

    /// Latitude, in degrees.
    lat: f64,

    /// Longitude, in degrees.
    lng: f64,

    /// The street address.
    address: String,

    /// Item-type tags the bin accepts.
    accepted_items: Vec<String>,

    /// Fill level, 0–100.
    fill_level: i16,

    /// The operational state.
    status: BinStatus,

    /// Battery level of the bin's sensor unit, 0–100, if fitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    battery: Option<i16>,

    /// The times it was created and updated.
    #[serde(flatten)]
    times: Times,
}

impl Bin {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: Uuid,
        public_id: String,
        name: String,
        lat: f64,
        lng: f64,
        address: String,
        accepted_items: Vec<String>,
        fill_level: i16,
        status: BinStatus,
        battery: Option<i16>,
        times: Times,
    ) -> Self {
        Bin {
            id,
            public_id,
            name,
            lat,
            lng,
            address,
            accepted_items,
            fill_level,
            status,
            battery,
            times,
        }
    }

    pub fn id(&self) -> &Uuid {
        &self.id
    }

    pub fn public_id(&self) -> &str {
        &self.public_id
    }

    pub fn fill_level(&self) -> i16 {
        self.fill_level
    }

    /// Returns a copy with the patch's provided fields applied, the
    /// same only-what-was-sent semantics the live store's update has.
    /// Backs the in-memory store the tests run against.
    #[cfg(test)]
    pub(crate) fn patched(&self, patch: BinPatch) -> Bin {
        use time::OffsetDateTime;

        Bin {
            public_id: patch.public_id.unwrap_or_else(|| self.public_id.clone()),
            name: patch.name.unwrap_or_else(|| self.name.clone()),
            lat: patch.lat.unwrap_or(self.lat),
            lng: patch.lng.unwrap_or(self.lng),
            address: patch.address.unwrap_or_else(|| self.address.clone()),
            accepted_items: patch
                .accepted_items
                .unwrap_or_else(|| self.accepted_items.clone()),
            fill_level: patch.fill_level.unwrap_or(self.fill_level),
            status: patch.status.unwrap_or(self.status),
            battery: patch.battery.or(self.battery),
            times: Times::new(self.times.created_at, OffsetDateTime::now_utc()),
            ..self.clone()
        }
    }
}

fn check_percentage(value: i16, out_of_range: fn(i16) -> BackendError) -> Result<(), BackendError> {
    if (0..=100).contains(&value) {
        Ok(())
    } else {
        Err(out_of_range(value))
    }
}

/// The fields accepted when creating a bin.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBin {
    /// The external-facing ID.
    #[serde(rename = "id")]
    pub(crate) public_id: String,

    #[serde(deserialize_with = "normalization::deserialize")]
    pub(crate) name: String,

    pub(crate) lat: f64,

    pub(crate) lng: f64,

    pub(crate) address: String,

    #[serde(default)]
    pub(crate) accepted_items: Vec<String>,

    #[serde(default)]
    pub(crate) fill_level: i16,

    #[serde(default)]
    pub(crate) status: BinStatus,

    #[serde(default)]
    pub(crate) battery: Option<i16>,
}

impl NewBin {
    pub fn validate(&self) -> Result<(), BackendError> {
        if self.public_id.trim().is_empty() || self.name.is_empty() || self.address.trim().is_empty()
        {
            return Err(BackendError::MissingFields);
        }

        check_percentage(self.fill_level, BackendError::InvalidFillLevel)?;

        if let Some(battery) = self.battery {
            check_percentage(battery, BackendError::InvalidBattery)?;
        }

        Ok(())
    }
}

/// A partial update to a bin. Absent fields are left untouched.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinPatch {
    #[serde(default, rename = "id")]
    pub(crate) public_id: Option<String>,

    #[serde(default, deserialize_with = "normalization::deserialize_option")]
    pub(crate) name: Option<String>,

    #[serde(default)]
    pub(crate) lat: Option<f64>,

    #[serde(default)]
    pub(crate) lng: Option<f64>,

    #[serde(default)]
    pub(crate) address: Option<String>,

    #[serde(default)]
    pub(crate) accepted_items: Option<Vec<String>>,

    #[serde(default)]
    pub(crate) fill_level: Option<i16>,

    #[serde(default)]
    pub(crate) status: Option<BinStatus>,

    #[serde(default)]
    pub(crate) battery: Option<i16>,
}

impl BinPatch {
    pub fn validate(&self) -> Result<(), BackendError> {
        if let Some(fill_level) = self.fill_level {
            check_percentage(fill_level, BackendError::InvalidFillLevel)?;
        }

        if let Some(battery) = self.battery {
            check_percentage(battery, BackendError::InvalidBattery)?;
        }

        Ok(())
    }
}
