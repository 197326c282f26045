use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::utils::parse_or_default;

/// Descriptive metadata decoded from an EDF header
///
/// Every text field is trimmed of its padding. Numeric fields that could
/// not be parsed hold their defaults (`0` and `0.0`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EdfMetadata {
    pub patient_id: String,
    pub start_date: String,
    pub number_of_channels: usize,
    /// Seconds
    pub duration: f64,
    pub number_of_annotations: u32,
    /// Channel labels in file order, always `number_of_channels` long
    pub channel_labels: Vec<String>,
}

impl EdfMetadata {
    /// Interprets `start_date` as EDF `dd.mm.yy` followed by `hh.mm.ss`
    ///
    /// Two-digit years above 84 are placed in the 1900s, the rest in the
    /// 2000s. Returns `None` when the text does not have that shape.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use edf_descriptor::EdfMetadata;
    ///
    /// let metadata = EdfMetadata {
    ///     start_date: "12.02.2510.30.00".to_string(),
    ///     ..Default::default()
    /// };
    /// let start = metadata.start_datetime().unwrap();
    /// assert_eq!(start.to_string(), "2025-02-12 10:30:00");
    ///
    /// let unknown = EdfMetadata { start_date: "Startdate X".to_string(), ..Default::default() };
    /// assert!(unknown.start_datetime().is_none());
    /// ```
    pub fn start_datetime(&self) -> Option<NaiveDateTime> {
        let text = self.start_date.trim();
        let date_str = text.get(..8)?;
        let time_str = text.get(8..)?.trim();

        let date = parse_date(date_str)?;
        let time = parse_time(time_str)?;
        Some(NaiveDateTime::new(date, time))
    }
}

/// Splits "aa.bb.cc" into three numbers, each part must be all digits
fn split_triplet(s: &str) -> Option<(u32, u32, u32)> {
    let parts: Vec<&str> = s.split('.').collect();
    if parts.len() != 3 {
        return None;
    }
    if parts
        .iter()
        .any(|p| p.is_empty() || !p.chars().all(|c| c.is_ascii_digit()))
    {
        return None;
    }

    Some((
        parse_or_default(parts[0], 0),
        parse_or_default(parts[1], 0),
        parse_or_default(parts[2], 0),
    ))
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    let (day, month, yy) = split_triplet(s)?;
    let year = if yy > 84 { 1900 + yy } else { 2000 + yy };
    NaiveDate::from_ymd_opt(year as i32, month, day)
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    let (hour, minute, second) = split_triplet(s)?;
    NaiveTime::from_hms_opt(hour, minute, second)
}

/// A persisted metadata record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoredMetadata {
    pub id: u64,
    pub title: String,
    #[serde(flatten)]
    pub metadata: EdfMetadata,
}
