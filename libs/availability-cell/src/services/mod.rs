pub mod availability;
pub mod bucketing;
pub mod calendar;
pub mod validation;
pub mod window;

pub use availability::{AvailabilityBackend, AvailabilityService};
pub use bucketing::SlotBuckets;
pub use calendar::{AvailabilityCalendar, Clock, FixedClock, LoadOutcome, LoadTicket, SystemClock};
pub use validation::validate_draft;
pub use window::{NavDirection, ViewMode, ViewWindow};
