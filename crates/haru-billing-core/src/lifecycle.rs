//! Subscription lifecycle state machine
//!
//! The four states and their legal transitions in one place, as a
//! `(state, event) -> (state, effects)` function. Callers apply the returned
//! effects (schedule change, subscriber flag) to storage; the function itself
//! has no side effects.

use chrono::{Months, NaiveDate};
use thiserror::Error;

use haru_types::SubscriptionStatus;

/// Event applied to a subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BillingEvent {
    /// Renewal charge accepted by the provider
    ChargeSucceeded {
        /// Date the next charge is due
        next_billing_date: NaiveDate,
    },
    /// Renewal charge declined or errored
    ChargeFailed,
    /// Canceled subscription reached the end of its paid period
    GraceEnded,
    /// Owner asked to cancel (billing key deleted at the provider)
    CancelRequested,
}

/// What happens to `next_billing_date`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleChange {
    /// Leave the stored date untouched
    Keep,
    /// Store a new date
    Set(NaiveDate),
    /// Clear the date
    Clear,
}

/// Effects of a legal transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Status after the event
    pub status: SubscriptionStatus,
    /// Schedule effect
    pub schedule: ScheduleChange,
    /// New value for the user's subscriber flag, if it changes
    pub subscriber: Option<bool>,
}

/// Attempted transition is not in the table
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("illegal transition: {status} on {event:?}")]
pub struct LifecycleError {
    /// State the subscription was in
    pub status: SubscriptionStatus,
    /// Event that was applied
    pub event: BillingEvent,
}

/// The transition table.
///
/// | state    | event           | next           | schedule | subscriber |
/// |----------|-----------------|----------------|----------|------------|
/// | active   | ChargeSucceeded | active         | set      | true       |
/// | active   | ChargeFailed    | payment_failed | clear    | false      |
/// | active   | CancelRequested | canceled       | keep     | —          |
/// | canceled | GraceEnded      | expired        | clear    | false      |
///
/// Everything else is illegal and returns an error instead of guessing.
pub fn transition(
    status: SubscriptionStatus,
    event: BillingEvent,
) -> Result<Transition, LifecycleError> {
    use BillingEvent::*;
    use SubscriptionStatus::*;

    match (status, event) {
        (Active, ChargeSucceeded { next_billing_date }) => Ok(Transition {
            status: Active,
            schedule: ScheduleChange::Set(next_billing_date),
            subscriber: Some(true),
        }),
        (Active, ChargeFailed) => Ok(Transition {
            status: PaymentFailed,
            schedule: ScheduleChange::Clear,
            subscriber: Some(false),
        }),
        (Active, CancelRequested) => Ok(Transition {
            status: Canceled,
            schedule: ScheduleChange::Keep,
            subscriber: None,
        }),
        (Canceled, GraceEnded) => Ok(Transition {
            status: Expired,
            schedule: ScheduleChange::Clear,
            subscriber: Some(false),
        }),
        (status, event) => Err(LifecycleError { status, event }),
    }
}

/// Advance a billing date by exactly one calendar month.
///
/// Month-end overflow clamps to the last valid day of the target month
/// (Jan 31 -> Feb 29 in a leap year), never a fixed 30-day increment.
pub fn one_month_after(date: NaiveDate) -> NaiveDate {
    // checked_add_months only fails near NaiveDate::MAX
    date.checked_add_months(Months::new(1)).unwrap_or(date)
}
