use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use tracing::debug;

use crate::models::{parse_slot_time, AvailabilitySummary, DayAvailability, DayBucket, Slot};
use crate::services::window::ViewWindow;

/// Server slots grouped per date, each day ordered by start time.
///
/// Always rebuilt from a full server payload; never patched in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlotBuckets {
    days: BTreeMap<NaiveDate, Vec<Slot>>,
}

impl SlotBuckets {
    pub fn from_days(days: Vec<DayAvailability>) -> Self {
        let mut buckets: BTreeMap<NaiveDate, Vec<Slot>> = BTreeMap::new();

        for day in days {
            buckets.entry(day.date).or_default().extend(day.slots);
        }

        // Stable sort: slots sharing a start time keep server order.
        for slots in buckets.values_mut() {
            slots.sort_by_key(|slot| slot.start_time);
        }

        debug!("Bucketed slots into {} days", buckets.len());
        Self { days: buckets }
    }

    pub fn slots_for_date(&self, date: NaiveDate) -> &[Slot] {
        self.days.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Slots placed in the grid cell that starts exactly at `start`.
    /// Overlapping slots are all returned, stacked in bucket order.
    pub fn slots_at(&self, date: NaiveDate, start: NaiveTime) -> Vec<&Slot> {
        self.slots_for_date(date)
            .iter()
            .filter(|slot| slot.start_time == start)
            .collect()
    }

    /// Same as [`SlotBuckets::slots_at`] for a grid label such as `"09:30"`.
    /// Unparseable labels match nothing.
    pub fn slots_at_label(&self, date: NaiveDate, label: &str) -> Vec<&Slot> {
        match parse_slot_time(label) {
            Some(start) => self.slots_at(date, start),
            None => Vec::new(),
        }
    }

    /// One bucket per window date, empty days included.
    pub fn buckets_for_window(&self, window: &ViewWindow) -> Vec<DayBucket> {
        window
            .dates()
            .into_iter()
            .map(|date| DayBucket {
                date,
                slots: self.slots_for_date(date).to_vec(),
            })
            .collect()
    }

    pub fn iter_slots(&self) -> impl Iterator<Item = &Slot> {
        self.days.values().flatten()
    }

    pub fn find(&self, id: uuid::Uuid) -> Option<&Slot> {
        self.iter_slots().find(|slot| slot.id == id)
    }

    pub fn total_slots(&self) -> usize {
        self.days.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_slots() == 0
    }

    /// Counts derived from the slots actually held.
    pub fn summary(&self) -> AvailabilitySummary {
        AvailabilitySummary::from_slots(self.iter_slots())
    }

    pub fn clear(&mut self) {
        self.days.clear();
    }
}

/// Row labels for a time grid from `first` up to (excluding) `last`.
pub fn grid_times(first: NaiveTime, last: NaiveTime, step_minutes: u32) -> Vec<NaiveTime> {
    if step_minutes == 0 {
        return Vec::new();
    }

    let step = chrono::Duration::minutes(step_minutes as i64);
    let mut rows = Vec::new();
    let mut current = first;
    while current < last {
        rows.push(current);
        let (next, wrapped) = current.overflowing_add_signed(step);
        if wrapped != 0 {
            break;
        }
        current = next;
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SlotStatus, SlotType};
    use crate::services::window::ViewMode;
    use uuid::Uuid;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn slot(day: u32, start: NaiveTime, end: NaiveTime, status: SlotStatus) -> Slot {
        Slot {
            id: Uuid::new_v4(),
            date: date(day),
            start_time: start,
            end_time: end,
            duration_minutes: 30,
            appointment_type: SlotType::Consultation,
            status,
            location: None,
            pricing: None,
            is_recurring: false,
            recurrence_pattern: None,
            recurrence_end_date: None,
            notes: None,
            max_appointments_per_slot: 1,
        }
    }

    fn payload() -> Vec<DayAvailability> {
        vec![
            DayAvailability {
                date: date(15),
                slots: vec![
                    slot(15, time(11, 0), time(11, 30), SlotStatus::Booked),
                    slot(15, time(9, 0), time(9, 30), SlotStatus::Available),
                    slot(15, time(9, 0), time(10, 0), SlotStatus::Tentative),
                ],
            },
            DayAvailability {
                date: date(16),
                slots: vec![slot(16, time(8, 0), time(8, 30), SlotStatus::Cancelled)],
            },
        ]
    }

    #[test]
    fn slots_are_ordered_by_start_time() {
        let buckets = SlotBuckets::from_days(payload());
        let starts: Vec<NaiveTime> = buckets
            .slots_for_date(date(15))
            .iter()
            .map(|s| s.start_time)
            .collect();

        assert_eq!(starts, vec![time(9, 0), time(9, 0), time(11, 0)]);
    }

    #[test]
    fn missing_date_is_empty() {
        let buckets = SlotBuckets::from_days(payload());
        assert!(buckets.slots_for_date(date(20)).is_empty());
        assert!(buckets.slots_at(date(20), time(9, 0)).is_empty());
    }

    #[test]
    fn overlapping_slots_stack_in_one_cell() {
        let buckets = SlotBuckets::from_days(payload());
        let cell = buckets.slots_at_label(date(15), "09:00");

        assert_eq!(cell.len(), 2);
        assert_eq!(cell[0].status, SlotStatus::Available);
        assert_eq!(cell[1].status, SlotStatus::Tentative);
        assert!(buckets.slots_at_label(date(15), "09:15").is_empty());
        assert!(buckets.slots_at_label(date(15), "nine").is_empty());
    }

    #[test]
    fn bucketing_is_idempotent() {
        let first = SlotBuckets::from_days(payload());
        let days = payload();
        let again = SlotBuckets::from_days(days.clone());
        let twice = SlotBuckets::from_days(days);

        assert_eq!(again, twice);
        assert_eq!(first.total_slots(), again.total_slots());
    }

    #[test]
    fn duplicate_day_entries_are_merged() {
        let mut days = payload();
        days.push(DayAvailability {
            date: date(15),
            slots: vec![slot(15, time(7, 30), time(8, 0), SlotStatus::Available)],
        });

        let buckets = SlotBuckets::from_days(days);
        assert_eq!(buckets.slots_for_date(date(15)).len(), 4);
        assert_eq!(buckets.slots_for_date(date(15))[0].start_time, time(7, 30));
    }

    #[test]
    fn window_buckets_include_empty_days() {
        let buckets = SlotBuckets::from_days(payload());
        let window = ViewWindow::new(date(15), ViewMode::Week);
        let columns = buckets.buckets_for_window(&window);

        assert_eq!(columns.len(), 7);
        assert_eq!(columns[0].date, date(14));
        assert!(columns[0].slots.is_empty());
        assert_eq!(columns[1].slots.len(), 3);
        assert_eq!(columns[2].slots.len(), 1);
    }

    #[test]
    fn summary_matches_held_slots() {
        let buckets = SlotBuckets::from_days(payload());
        let summary = buckets.summary();

        assert_eq!(summary.total, 4);
        assert_eq!(summary.available, 1);
        assert_eq!(summary.booked, 1);
        assert_eq!(summary.cancelled, 1);
    }

    #[test]
    fn grid_rows_step_through_the_day() {
        let rows = grid_times(time(8, 0), time(10, 0), 30);
        assert_eq!(rows, vec![time(8, 0), time(8, 30), time(9, 0), time(9, 30)]);
        assert!(grid_times(time(8, 0), time(10, 0), 0).is_empty());
        assert_eq!(grid_times(time(23, 0), time(23, 59), 45).len(), 2);
    }
}
