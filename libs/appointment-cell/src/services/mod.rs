pub mod booking;
pub mod finder;

pub use booking::{AppointmentService, BookingBackend};
pub use finder::SlotFinder;
