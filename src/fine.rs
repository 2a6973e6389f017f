//! Late-fine calculation
//!
//! Pure functions over `(due_date, return_date, rate)`. The lending service
//! uses [`fine_on_return`] when closing a loan; listings use [`accrued_fine`]
//! to show what an open overdue loan would cost if returned now, without
//! touching any state.

use chrono::{DateTime, Utc};

/// Fine owed for a loan returned at `returned`, in currency minor units.
///
/// Charged per whole day past the due date, truncating toward zero: a return
/// 36 hours late costs one day. Returning on or before the due date costs
/// nothing.
pub fn fine_on_return(due_date: DateTime<Utc>, returned: DateTime<Utc>, rate_per_day: i64) -> i64 {
    if returned <= due_date {
        return 0;
    }
    let days_late = (returned - due_date).num_days();
    days_late * rate_per_day
}

/// Fine an open loan has accrued so far, measured against `now`.
pub fn accrued_fine(due_date: DateTime<Utc>, now: DateTime<Utc>, rate_per_day: i64) -> i64 {
    fine_on_return(due_date, now, rate_per_day)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    const RATE: i64 = 5000;

    fn due() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn return_before_due_date_is_free() {
        assert_eq!(fine_on_return(due(), due() - Duration::days(3), RATE), 0);
    }

    #[test]
    fn return_exactly_on_due_date_is_free() {
        assert_eq!(fine_on_return(due(), due(), RATE), 0);
    }

    #[test]
    fn whole_days_late_charge_per_day() {
        assert_eq!(fine_on_return(due(), due() + Duration::days(1), RATE), RATE);
        assert_eq!(
            fine_on_return(due(), due() + Duration::days(3), RATE),
            3 * RATE
        );
    }

    #[test]
    fn partial_days_truncate_toward_zero() {
        // 36 hours late is one whole day
        assert_eq!(fine_on_return(due(), due() + Duration::hours(36), RATE), RATE);
        // 12 hours late is not a whole day yet
        assert_eq!(fine_on_return(due(), due() + Duration::hours(12), RATE), 0);
    }

    #[test]
    fn accrued_matches_return_formula() {
        let now = due() + Duration::days(5);
        assert_eq!(accrued_fine(due(), now, RATE), fine_on_return(due(), now, RATE));
        assert_eq!(accrued_fine(due(), due() - Duration::hours(1), RATE), 0);
    }
}
