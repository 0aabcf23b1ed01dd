//! Appointment scheduling — the downstream action behind a
//! `follow_up_scheduled` review outcome.
//!
//! Slots are deterministic calendar entries; bookings move a slot between
//! available and booked and produce an `appointment_booked` event for the
//! patient.

use chrono::{Datelike, Days, NaiveDate, NaiveTime, Utc, Weekday};
use uuid::Uuid;

use crate::db::{self, Collection, Storage};
use crate::models::{
    Appointment, AppointmentSlot, AppointmentStatus, ClinicianProfile, Identity,
    NotificationEvent, NotificationKind, NotificationPriority,
};
use crate::pipeline::error::WorkflowError;

/// Clinic hours used for slot generation.
pub mod clinic_hours {
    /// Morning block, `[start, end)` in whole hours.
    pub const MORNING: (u32, u32) = (9, 12);
    /// Afternoon block.
    pub const AFTERNOON: (u32, u32) = (14, 17);
    /// Slot length in minutes.
    pub const SLOT_MINUTES: u32 = 30;
    /// Default generation span.
    pub const DEFAULT_SPAN_DAYS: u32 = 14;
}

/// Generate slots for every clinician over `days` starting at `from`,
/// skipping Sundays. Returns how many slots were created.
///
/// Idempotent: when the slot collection is non-empty, nothing is generated.
pub fn generate_slots(
    store: &dyn Storage,
    clinicians: &[ClinicianProfile],
    from: NaiveDate,
    days: u32,
) -> Result<usize, WorkflowError> {
    let existing: Vec<AppointmentSlot> = db::load_all(store, Collection::AppointmentSlots)?;
    if !existing.is_empty() {
        return Ok(0);
    }

    let mut slots = Vec::new();
    for offset in 0..days {
        let Some(date) = from.checked_add_days(Days::new(u64::from(offset))) else {
            continue;
        };
        if date.weekday() == Weekday::Sun {
            continue;
        }

        for clinician in clinicians {
            for (start, end) in [clinic_hours::MORNING, clinic_hours::AFTERNOON] {
                for hour in start..end {
                    for minute in (0..60u32).step_by(clinic_hours::SLOT_MINUTES as usize) {
                        let time = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default();
                        slots.push(AppointmentSlot {
                            id: format!(
                                "slot_{date}_{}_{}",
                                time.format("%H:%M"),
                                clinician.id
                            ),
                            date,
                            time,
                            clinician_id: clinician.id,
                            clinician_name: clinician.name.clone(),
                            specialty: clinician.specialty.clone(),
                            clinic: clinician.clinic.clone(),
                            is_booked: false,
                            patient_id: None,
                        });
                    }
                }
            }
        }
    }

    let created = slots.len();
    db::store_all(store, Collection::AppointmentSlots, &slots)?;
    tracing::info!(slots = created, clinicians = clinicians.len(), "slot calendar generated");
    Ok(created)
}

/// Open slots on a given date.
pub fn available_slots(
    store: &dyn Storage,
    date: NaiveDate,
) -> Result<Vec<AppointmentSlot>, WorkflowError> {
    let slots: Vec<AppointmentSlot> = db::load_all(store, Collection::AppointmentSlots)?;
    Ok(slots
        .into_iter()
        .filter(|slot| slot.date == date && !slot.is_booked)
        .collect())
}

/// Distinct dates with any open slot, `today` or later, sorted ascending.
pub fn available_dates(
    store: &dyn Storage,
    today: NaiveDate,
) -> Result<Vec<NaiveDate>, WorkflowError> {
    let slots: Vec<AppointmentSlot> = db::load_all(store, Collection::AppointmentSlots)?;
    let mut dates: Vec<NaiveDate> = slots
        .iter()
        .filter(|slot| !slot.is_booked && slot.date >= today)
        .map(|slot| slot.date)
        .collect();
    dates.sort_unstable();
    dates.dedup();
    Ok(dates)
}

/// Book a slot for a patient.
///
/// Returns the confirmed appointment plus the event to hand to the
/// notification dispatcher.
pub fn book_slot(
    store: &dyn Storage,
    slot_id: &str,
    patient: &Identity,
) -> Result<(Appointment, NotificationEvent), WorkflowError> {
    let mut slots: Vec<AppointmentSlot> = db::load_all(store, Collection::AppointmentSlots)?;
    let slot = slots
        .iter_mut()
        .find(|slot| slot.id == slot_id)
        .ok_or_else(|| WorkflowError::NotFound {
            entity: "appointment slot",
            id: slot_id.to_string(),
        })?;

    if slot.is_booked {
        return Err(WorkflowError::InvalidState {
            operation: "book_slot",
            expected: "available",
            actual: "booked".to_string(),
        });
    }

    slot.is_booked = true;
    slot.patient_id = Some(patient.id);

    let appointment = Appointment {
        id: Uuid::new_v4(),
        slot_id: slot.id.clone(),
        patient_id: patient.id,
        clinician_id: slot.clinician_id,
        clinician_name: slot.clinician_name.clone(),
        date: slot.date,
        time: slot.time,
        clinic: slot.clinic.clone(),
        status: AppointmentStatus::Confirmed,
        created_at: Utc::now(),
        note: None,
    };

    let mut appointments: Vec<Appointment> = db::load_all(store, Collection::Appointments)?;
    appointments.push(appointment.clone());

    store.put_all(vec![
        (Collection::AppointmentSlots, db::encode_all(&slots)?),
        (Collection::Appointments, db::encode_all(&appointments)?),
    ])?;

    let event = NotificationEvent {
        kind: NotificationKind::AppointmentBooked,
        user_id: patient.id,
        related_id: appointment.id,
        priority: NotificationPriority::Medium,
        title: "Appointment booked".to_string(),
        message: format!(
            "Your appointment on {} at {} with {} is confirmed.",
            appointment.date,
            appointment.time.format("%H:%M"),
            appointment.clinician_name,
        ),
    };

    tracing::info!(
        appointment_id = %appointment.id,
        patient = %patient.id,
        "appointment booked"
    );
    Ok((appointment, event))
}

/// Cancel an appointment and release its slot.
pub fn cancel_appointment(
    store: &dyn Storage,
    appointment_id: Uuid,
) -> Result<Appointment, WorkflowError> {
    let mut appointments: Vec<Appointment> = db::load_all(store, Collection::Appointments)?;
    let appointment = appointments
        .iter_mut()
        .find(|apt| apt.id == appointment_id)
        .ok_or_else(|| WorkflowError::NotFound {
            entity: "appointment",
            id: appointment_id.to_string(),
        })?;

    appointment.status = AppointmentStatus::Cancelled;
    let cancelled = appointment.clone();

    let mut slots: Vec<AppointmentSlot> = db::load_all(store, Collection::AppointmentSlots)?;
    if let Some(slot) = slots.iter_mut().find(|slot| slot.id == cancelled.slot_id) {
        slot.is_booked = false;
        slot.patient_id = None;
    }

    store.put_all(vec![
        (Collection::AppointmentSlots, db::encode_all(&slots)?),
        (Collection::Appointments, db::encode_all(&appointments)?),
    ])?;

    tracing::info!(appointment_id = %appointment_id, "appointment cancelled");
    Ok(cancelled)
}

/// A patient's appointments, newest first.
pub fn appointments_for_user(
    store: &dyn Storage,
    user_id: Uuid,
) -> Result<Vec<Appointment>, WorkflowError> {
    let mut appointments: Vec<Appointment> =
        db::load_all::<Appointment>(store, Collection::Appointments)?
            .into_iter()
            .filter(|apt| apt.patient_id == user_id)
            .collect();
    appointments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(appointments)
}
