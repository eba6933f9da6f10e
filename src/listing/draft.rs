use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::record::ListingContent;
use super::schedule::{Day, DayInput, DaySchedule, WeeklySchedule};
use crate::config::ListingDefaults;
use crate::workflow::WorkflowError;

/// Most photos a listing can carry.
pub const MAX_PHOTOS: usize = 2;

/// A photo attached to a draft: either already hosted, or raw bytes that must
/// go through the media host before the record is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PhotoSource {
    Existing { url: String },
    Upload { file_name: String, bytes: Vec<u8> },
}

/// Raw form input for a new listing or an edit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingDraft {
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub phone: String,
    pub latitude: String,
    pub longitude: String,
    #[serde(default)]
    pub operating_days: Option<String>,
    #[serde(default)]
    pub operating_hours: Option<String>,
    #[serde(default)]
    pub schedule: BTreeMap<Day, DayInput>,
    #[serde(default)]
    pub photos: Vec<PhotoSource>,
}

impl ListingDraft {
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        latitude: impl Into<String>,
        longitude: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            latitude: latitude.into(),
            longitude: longitude.into(),
            ..Default::default()
        }
    }

    /// Prefills a draft from an existing listing, keeping its hosted photos.
    pub fn from_content(content: &ListingContent) -> Self {
        Self {
            name: content.name.clone(),
            address: content.address.clone(),
            phone: content.phone.clone(),
            latitude: content.latitude.clone(),
            longitude: content.longitude.clone(),
            operating_days: content.operating_days.clone(),
            operating_hours: content.operating_hours.clone(),
            schedule: content
                .schedule
                .iter()
                .filter(|(_, day_schedule)| *day_schedule != DaySchedule::Closed)
                .map(|(day, day_schedule)| (day, DayInput::from_schedule(day_schedule)))
                .collect(),
            photos: content
                .photos()
                .map(|url| PhotoSource::Existing {
                    url: url.to_string(),
                })
                .collect(),
        }
    }

    /// Checks required fields and builds listing content. Photos are left
    /// empty; the caller fills them after uploading.
    pub fn validate(&self, defaults: &ListingDefaults) -> Result<ListingContent, WorkflowError> {
        let name = self.name.trim();
        let address = self.address.trim();
        let latitude = self.latitude.trim();
        let longitude = self.longitude.trim();

        if name.is_empty() || address.is_empty() || latitude.is_empty() || longitude.is_empty() {
            return Err(WorkflowError::validation(
                "name, address and location coordinates are required",
            ));
        }

        let lat: f64 = latitude
            .parse()
            .map_err(|_| WorkflowError::validation(format!("latitude '{latitude}' is not a decimal number")))?;
        let lon: f64 = longitude
            .parse()
            .map_err(|_| WorkflowError::validation(format!("longitude '{longitude}' is not a decimal number")))?;
        if !(-90.0..=90.0).contains(&lat) {
            return Err(WorkflowError::validation(format!(
                "latitude {lat} is outside -90..90"
            )));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(WorkflowError::validation(format!(
                "longitude {lon} is outside -180..180"
            )));
        }

        if self.photos.len() > MAX_PHOTOS {
            return Err(WorkflowError::validation(format!(
                "at most {MAX_PHOTOS} photos are allowed, got {}",
                self.photos.len()
            )));
        }

        let mut schedule = WeeklySchedule::new();
        for (day, input) in &self.schedule {
            let day_schedule = input
                .to_schedule(*day)
                .map_err(|e| WorkflowError::validation(e.to_string()))?;
            schedule.set(*day, day_schedule);
        }

        let phone = match self.phone.trim() {
            "" => defaults.default_phone.clone(),
            phone => phone.to_string(),
        };
        let operating_days = self
            .operating_days
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .or_else(|| Some(defaults.default_operating_days.clone()));

        Ok(ListingContent {
            name: name.to_string(),
            address: address.to_string(),
            phone,
            latitude: latitude.to_string(),
            longitude: longitude.to_string(),
            operating_days,
            operating_hours: self
                .operating_hours
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            photo_primary: None,
            photo_secondary: None,
            schedule,
        })
    }
}
