// --- File: crates/bodyshop_common/src/models.rs ---
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One bookable hour of a business day.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    /// 12-hour label, e.g. "2:00 PM".
    pub label: String,
    /// RFC 3339 with the business offset.
    pub start_time: String,
    pub end_time: String,
    pub available: bool,
}

/// Booking input as posted by the website form or assembled by the chat assistant.
///
/// Missing fields deserialize as empty strings so they surface as validation
/// errors instead of body rejections.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BookingRequest {
    pub start_time: String,
    pub end_time: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: String,
    pub car_make: String,
    pub car_model: String,
    pub service_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl BookingRequest {
    /// The required fields with their wire names, in form order.
    pub fn required_fields(&self) -> [(&'static str, &str); 8] {
        [
            ("startTime", self.start_time.as_str()),
            ("endTime", self.end_time.as_str()),
            ("customerName", self.customer_name.as_str()),
            ("customerPhone", self.customer_phone.as_str()),
            ("customerEmail", self.customer_email.as_str()),
            ("carMake", self.car_make.as_str()),
            ("carModel", self.car_model.as_str()),
            ("serviceType", self.service_type.as_str()),
        ]
    }
}

/// A booking persisted after its calendar event was created.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRecord {
    /// UUID v4.
    pub id: String,
    pub calendar_event_id: String,
    pub html_link: Option<String>,
    pub start_time: String,
    pub end_time: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: String,
    pub car_make: String,
    pub car_model: String,
    pub service_type: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Response body of a successful `POST /api/booking`.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingConfirmation {
    pub success: bool,
    pub event_id: String,
    pub html_link: Option<String>,
    pub details: BookingRecord,
}

impl From<BookingRecord> for BookingConfirmation {
    fn from(record: BookingRecord) -> Self {
        Self {
            success: true,
            event_id: record.calendar_event_id.clone(),
            html_link: record.html_link.clone(),
            details: record,
        }
    }
}

/// Formats a US phone number as `(XXX) XXX-XXXX`.
///
/// Ten digits, or eleven with a leading country code `1`, are reformatted;
/// anything else is returned trimmed but otherwise untouched.
pub fn normalize_phone(raw: &str) -> String {
    normalized_phone(raw).unwrap_or_else(|| raw.trim().to_string())
}

/// `(XXX) XXX-XXXX`, or `None` when `raw` is not a ten-digit US number.
pub fn normalized_phone(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    let national = match digits.len() {
        10 => digits.as_str(),
        11 if digits.starts_with('1') => &digits[1..],
        _ => return None,
    };
    Some(format!(
        "({}) {}-{}",
        &national[0..3],
        &national[3..6],
        &national[6..10]
    ))
}
