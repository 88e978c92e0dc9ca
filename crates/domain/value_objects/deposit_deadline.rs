use chrono::{DateTime, TimeDelta, Utc};

/// The client has `deadline_hours` from reservation to pay the deposit, but
/// never past the start of the appointment itself. Hours that overflow the
/// calendar fall back to the appointment start.
pub fn compute_deposit_deadline(
    reserved_at: DateTime<Utc>,
    starts_at: DateTime<Utc>,
    deadline_hours: i64,
) -> DateTime<Utc> {
    TimeDelta::try_hours(deadline_hours.max(0))
        .and_then(|window| reserved_at.checked_add_signed(window))
        .map_or(starts_at, |by_hours| by_hours.min(starts_at))
}

pub fn deadline_has_passed(deadline: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    deadline.is_some_and(|deadline| deadline <= now)
}

pub fn seconds_until_deadline(deadline: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Option<i64> {
    deadline.map(|deadline| (deadline - now).num_seconds().max(0))
}
