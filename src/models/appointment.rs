use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::AppointmentStatus;

/// A clinician offering bookable slots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClinicianProfile {
    pub id: Uuid,
    pub name: String,
    pub specialty: String,
    pub clinic: String,
}

/// One bookable 30-minute slot in a clinician's calendar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentSlot {
    /// Deterministic key: `slot_<date>_<time>_<clinician>`.
    pub id: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub clinician_id: Uuid,
    pub clinician_name: String,
    pub specialty: String,
    pub clinic: String,
    pub is_booked: bool,
    pub patient_id: Option<Uuid>,
}

/// A confirmed booking against a slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub slot_id: String,
    pub patient_id: Uuid,
    pub clinician_id: Uuid,
    pub clinician_name: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub clinic: String,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub note: Option<String>,
}
