pub mod analysis;
pub mod appointment;
pub mod enums;
pub mod finding;
pub mod image;
pub mod notification;
pub mod quality;
pub mod user;

pub use analysis::AnalysisRecord;
pub use appointment::{Appointment, AppointmentSlot, ClinicianProfile};
pub use enums::*;
pub use finding::Finding;
pub use image::{ImagePayload, ImageRecord};
pub use notification::{NotificationEvent, StoredNotification};
pub use quality::QualityResult;
pub use user::{Identity, NewUser, UserAccount};
