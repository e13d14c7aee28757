use chrono::NaiveDate;

use shared_models::error::PortalError;

use crate::models::SlotDraft;

pub const RECURRENCE_END_MESSAGE: &str = "Recurrence end date must be after the start date";
pub const PAST_DATE_MESSAGE: &str = "Cannot schedule availability in the past";
pub const TIME_ORDER_MESSAGE: &str = "End time must be after start time";

/// Advisory checks run before a draft is submitted. The server stays the
/// authority; these only save a round-trip on obvious mistakes.
pub fn validate_draft(draft: &SlotDraft, today: NaiveDate) -> Result<(), PortalError> {
    if draft.is_recurring {
        if let Some(end_date) = draft.recurrence_end_date {
            if end_date <= draft.date {
                return Err(PortalError::Validation(RECURRENCE_END_MESSAGE.to_string()));
            }
        }
    }

    if draft.date < today {
        return Err(PortalError::Validation(PAST_DATE_MESSAGE.to_string()));
    }

    if draft.end_time <= draft.start_time {
        return Err(PortalError::Validation(TIME_ORDER_MESSAGE.to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecurrencePattern;
    use assert_matches::assert_matches;
    use chrono::NaiveTime;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn draft(on: NaiveDate) -> SlotDraft {
        SlotDraft::new(
            on,
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
        )
    }

    #[test]
    fn recurrence_ending_on_start_date_is_rejected() {
        let today = date(2023, 12, 1);
        let draft = draft(date(2024, 1, 1)).recurring(RecurrencePattern::Weekly, date(2024, 1, 1));

        assert_matches!(
            validate_draft(&draft, today),
            Err(PortalError::Validation(msg)) if msg == RECURRENCE_END_MESSAGE
        );
    }

    #[test]
    fn recurrence_message_wins_over_past_date() {
        let today = date(2026, 10, 17);
        let draft = draft(date(2024, 1, 1)).recurring(RecurrencePattern::Daily, date(2024, 1, 1));

        assert_eq!(
            validate_draft(&draft, today),
            Err(PortalError::Validation(RECURRENCE_END_MESSAGE.to_string()))
        );
    }

    #[test]
    fn recurrence_ending_later_is_accepted() {
        let today = date(2024, 1, 1);
        let draft = draft(date(2024, 1, 1)).recurring(RecurrencePattern::Monthly, date(2024, 1, 2));
        assert_eq!(validate_draft(&draft, today), Ok(()));
    }

    #[test]
    fn recurring_without_end_date_is_left_to_server() {
        let today = date(2024, 1, 1);
        let mut draft = draft(date(2024, 1, 5));
        draft.is_recurring = true;
        assert_eq!(validate_draft(&draft, today), Ok(()));
    }

    #[test]
    fn past_date_is_rejected_but_today_is_fine() {
        let today = date(2024, 1, 15);

        assert_eq!(
            validate_draft(&draft(date(2024, 1, 14)), today),
            Err(PortalError::Validation(PAST_DATE_MESSAGE.to_string()))
        );
        assert_eq!(validate_draft(&draft(today), today), Ok(()));
    }

    #[test]
    fn end_before_start_is_rejected() {
        let today = date(2024, 1, 15);
        let mut draft = draft(today);
        draft.end_time = draft.start_time;

        assert_eq!(
            validate_draft(&draft, today),
            Err(PortalError::Validation(TIME_ORDER_MESSAGE.to_string()))
        );
    }
}
