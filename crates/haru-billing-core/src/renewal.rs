//! Monthly renewal pass
//!
//! Processes every subscription whose billing date has arrived: charges
//! active ones through the gateway, expires canceled ones at period end, and
//! records every attempt in the payment audit trail. One record's failure
//! never aborts the rest of the set.
//!
//! Invocations are expected to be serialized by the scheduler; two
//! overlapping passes can double-charge a subscription whose record has not
//! been updated yet.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use haru_db::{
    CreatePayment, PaymentRepository, SubscriptionRepository, SubscriptionRow, UserRepository,
};
use haru_types::SubscriptionStatus;

use crate::config::BillingConfig;
use crate::error::BillingError;
use crate::lifecycle::{one_month_after, transition, BillingEvent, ScheduleChange};
use crate::provider::{ChargeRequest, PayWork, PaymentGateway};

/// Per-record outcome of a renewal pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RenewalOutcome {
    /// Charge accepted, billing date advanced one calendar month
    Renewed,
    /// Charge declined by the provider
    Failed,
    /// Unexpected error while processing the record
    Error,
    /// Active subscription without a billing key
    Skipped,
    /// Canceled subscription reached period end
    Expired,
    /// Canceled subscription still in its grace period
    Canceled,
}

impl std::fmt::Display for RenewalOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Renewed => write!(f, "renewed"),
            Self::Failed => write!(f, "failed"),
            Self::Error => write!(f, "error"),
            Self::Skipped => write!(f, "skipped"),
            Self::Expired => write!(f, "expired"),
            Self::Canceled => write!(f, "canceled"),
        }
    }
}

/// One processed subscription
#[derive(Debug, Clone, Serialize)]
pub struct RenewalRecord {
    /// Subscription that was processed
    pub subscription_id: Uuid,
    /// Owning user
    pub user_id: Uuid,
    /// What happened
    pub outcome: RenewalOutcome,
    /// Provider message or error detail, when there is one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Result of one renewal pass
#[derive(Debug, Clone, Serialize)]
pub struct RenewalSummary {
    /// Number of subscriptions matched by the selection predicate
    pub processed: usize,
    /// Per-record outcomes
    pub records: Vec<RenewalRecord>,
}

impl RenewalSummary {
    /// Count records with the given outcome
    pub fn count(&self, outcome: RenewalOutcome) -> usize {
        self.records.iter().filter(|r| r.outcome == outcome).count()
    }
}

/// Batch renewal runner
pub struct RenewalRunner<G, S, U, P>
where
    G: PaymentGateway,
    S: SubscriptionRepository,
    U: UserRepository,
    P: PaymentRepository,
{
    gateway: Arc<G>,
    subscriptions: Arc<S>,
    users: Arc<U>,
    payments: Arc<P>,
    config: BillingConfig,
}

impl<G, S, U, P> RenewalRunner<G, S, U, P>
where
    G: PaymentGateway,
    S: SubscriptionRepository,
    U: UserRepository,
    P: PaymentRepository,
{
    /// Create a new renewal runner
    pub fn new(
        gateway: Arc<G>,
        subscriptions: Arc<S>,
        users: Arc<U>,
        payments: Arc<P>,
        config: BillingConfig,
    ) -> Self {
        Self {
            gateway,
            subscriptions,
            users,
            payments,
            config,
        }
    }

    /// Run one renewal pass over all due subscriptions.
    #[instrument(skip(self), fields(today = %today))]
    pub async fn run(
        &self,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<RenewalSummary, BillingError> {
        let due = self.subscriptions.find_due(today).await?;
        info!(count = due.len(), "Renewal pass selected subscriptions");

        let mut records = Vec::with_capacity(due.len());

        for row in &due {
            let outcome = match self.process_one(row, today, now).await {
                Ok(record) => record,
                Err(e) => {
                    warn!(
                        subscription_id = %row.id,
                        error = %e,
                        "Renewal record failed unexpectedly"
                    );
                    self.quarantine(row, &e).await;
                    RenewalRecord {
                        subscription_id: row.id,
                        user_id: row.user_id,
                        outcome: RenewalOutcome::Error,
                        detail: Some(e.to_string()),
                    }
                }
            };
            records.push(outcome);
        }

        let summary = RenewalSummary {
            processed: records.len(),
            records,
        };
        info!(
            processed = summary.processed,
            renewed = summary.count(RenewalOutcome::Renewed),
            failed = summary.count(RenewalOutcome::Failed),
            expired = summary.count(RenewalOutcome::Expired),
            "Renewal pass finished"
        );

        Ok(summary)
    }

    /// Process a single due subscription.
    async fn process_one(
        &self,
        row: &SubscriptionRow,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<RenewalRecord, BillingError> {
        let status: SubscriptionStatus = row
            .status
            .parse()
            .map_err(|_| BillingError::CorruptStatus(row.status.clone()))?;

        match status {
            SubscriptionStatus::Canceled => self.process_canceled(row, today).await,
            SubscriptionStatus::Active => self.process_active(row, today, now).await,
            // find_due only selects active/canceled; anything else is corrupt
            other => Err(BillingError::CorruptStatus(other.to_string())),
        }
    }

    /// A canceled subscription expires on the day before its billing date;
    /// until then it stays untouched in its grace period.
    async fn process_canceled(
        &self,
        row: &SubscriptionRow,
        today: NaiveDate,
    ) -> Result<RenewalRecord, BillingError> {
        let Some(next) = row.next_billing_date else {
            return Err(BillingError::CorruptStatus(
                "canceled subscription without next_billing_date".to_string(),
            ));
        };

        let period_end = next.pred_opt().unwrap_or(next);
        if period_end != today {
            return Ok(RenewalRecord {
                subscription_id: row.id,
                user_id: row.user_id,
                outcome: RenewalOutcome::Canceled,
                detail: None,
            });
        }

        let t = transition(SubscriptionStatus::Canceled, BillingEvent::GraceEnded)?;
        self.apply(row, &t).await?;

        info!(subscription_id = %row.id, "Canceled subscription expired at period end");

        Ok(RenewalRecord {
            subscription_id: row.id,
            user_id: row.user_id,
            outcome: RenewalOutcome::Expired,
            detail: None,
        })
    }

    /// Charge an active subscription and apply the resulting transition.
    async fn process_active(
        &self,
        row: &SubscriptionRow,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<RenewalRecord, BillingError> {
        let Some(billing_key) = row.billing_key.as_deref() else {
            warn!(subscription_id = %row.id, "Active subscription has no billing key, skipping");
            return Ok(RenewalRecord {
                subscription_id: row.id,
                user_id: row.user_id,
                outcome: RenewalOutcome::Skipped,
                detail: Some("no billing key".to_string()),
            });
        };

        let auth = self.gateway.partner_auth(PayWork::Auth).await?;

        let order_ref = format!("sub-{}-{}", row.id.simple(), today.format("%Y%m%d"));
        let charge = ChargeRequest {
            billing_key: billing_key.to_string(),
            order_ref: order_ref.clone(),
            goods_name: self.config.goods_name.clone(),
            amount: self.config.monthly_price,
        };

        let result = self.gateway.charge_billing_key(&auth, &charge).await?;

        self.payments
            .append(CreatePayment {
                id: Uuid::new_v4(),
                user_id: row.user_id,
                subscription_id: Some(row.id),
                order_ref,
                amount: self.config.monthly_price,
                provider_code: result.code.clone(),
                message: result.message.clone(),
                succeeded: result.ok,
            })
            .await?;

        let event = if result.ok {
            BillingEvent::ChargeSucceeded {
                next_billing_date: one_month_after(today),
            }
        } else {
            BillingEvent::ChargeFailed
        };

        let t = transition(SubscriptionStatus::Active, event)?;
        self.apply_with_paid_at(row, &t, result.ok.then_some(now)).await?;

        if result.ok {
            info!(subscription_id = %row.id, "Subscription renewed");
            Ok(RenewalRecord {
                subscription_id: row.id,
                user_id: row.user_id,
                outcome: RenewalOutcome::Renewed,
                detail: None,
            })
        } else {
            warn!(
                subscription_id = %row.id,
                code = %result.code,
                message = %result.message,
                "Renewal charge declined"
            );
            Ok(RenewalRecord {
                subscription_id: row.id,
                user_id: row.user_id,
                outcome: RenewalOutcome::Failed,
                detail: Some(result.message),
            })
        }
    }

    /// Apply a lifecycle transition to storage.
    async fn apply(
        &self,
        row: &SubscriptionRow,
        t: &crate::lifecycle::Transition,
    ) -> Result<(), BillingError> {
        self.apply_with_paid_at(row, t, None).await
    }

    async fn apply_with_paid_at(
        &self,
        row: &SubscriptionRow,
        t: &crate::lifecycle::Transition,
        paid_at: Option<DateTime<Utc>>,
    ) -> Result<(), BillingError> {
        match (t.status, t.schedule) {
            (SubscriptionStatus::Active, ScheduleChange::Set(next)) => {
                let paid_at = paid_at.unwrap_or_else(Utc::now);
                self.subscriptions.mark_renewed(row.id, next, paid_at).await?;
            }
            (SubscriptionStatus::PaymentFailed, _) => {
                self.subscriptions.mark_payment_failed(row.id).await?;
            }
            (SubscriptionStatus::Expired, _) => {
                self.subscriptions.mark_expired(row.id).await?;
            }
            (SubscriptionStatus::Canceled, _) => {
                self.subscriptions.mark_canceled(row.id).await?;
            }
            (status, schedule) => {
                return Err(BillingError::Internal(format!(
                    "unmapped transition: {status} / {schedule:?}"
                )));
            }
        }

        if let Some(subscriber) = t.subscriber {
            self.users.set_subscriber(row.user_id, subscriber).await?;
        }

        Ok(())
    }

    /// Convert an unexpected failure into a payment_failed transition so the
    /// record drops out of the selection predicate instead of retrying in a
    /// broken state. Best-effort: the record is already being reported as an
    /// error.
    async fn quarantine(&self, row: &SubscriptionRow, cause: &BillingError) {
        if row.status != SubscriptionStatus::Active.to_string() {
            return;
        }

        if let Err(e) = self.subscriptions.mark_payment_failed(row.id).await {
            warn!(subscription_id = %row.id, error = %e, "Failed to quarantine subscription");
            return;
        }
        if let Err(e) = self.users.set_subscriber(row.user_id, false).await {
            warn!(user_id = %row.user_id, error = %e, "Failed to clear subscriber flag");
        }

        let _ = self
            .payments
            .append(CreatePayment {
                id: Uuid::new_v4(),
                user_id: row.user_id,
                subscription_id: Some(row.id),
                order_ref: format!("sub-{}-error", row.id.simple()),
                amount: self.config.monthly_price,
                provider_code: "internal".to_string(),
                message: cause.to_string(),
                succeeded: false,
            })
            .await;
    }
}
