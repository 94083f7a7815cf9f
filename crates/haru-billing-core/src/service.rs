//! Billing services
//!
//! Short orchestration flows over the gateway and repositories: billing-key
//! registration, subscription cancel, one-time payment confirmation, and
//! refunds. Each flow is one external call or a short sequence followed by
//! straight-line writes.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use haru_db::{
    CreatePayment, CreatePendingOrder, CreateSubscription, OrderRepository, PaymentRepository,
    PendingOrderRepository, PendingOrderRow, ProductRepository, SubscriptionRepository,
    SubscriptionRow, UserRepository,
};
use haru_types::{PayMethod, PendingOrderStatus, SubscriptionStatus};

use crate::error::BillingError;
use crate::lifecycle::{one_month_after, transition, BillingEvent};
use crate::provider::{ConfirmRequest, PayWork, PaymentGateway, RefundRequest};
use crate::receipt::{ReceiptClient, ReceiptRequest};

// ============================================================================
// Subscription service: billing-key registration and cancel
// ============================================================================

/// Billing-key registration input, built from the provider's registration
/// callback (the first charge happens during registration).
#[derive(Debug, Clone)]
pub struct RegisterBillingKey {
    /// Owning user
    pub user_id: Uuid,
    /// Provider-issued billing key
    pub billing_key: String,
    /// Order reference of the registration charge
    pub order_ref: String,
    /// Amount charged during registration, in KRW
    pub amount: i64,
    /// Provider result code of the registration charge
    pub provider_code: String,
    /// Provider message
    pub message: String,
    /// Display fields for the registered payment method
    pub pay_method: Option<PayMethod>,
}

/// Subscription lifecycle service
pub struct SubscriptionService<G, S, U, P>
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
}

impl<G, S, U, P> SubscriptionService<G, S, U, P>
where
    G: PaymentGateway,
    S: SubscriptionRepository,
    U: UserRepository,
    P: PaymentRepository,
{
    /// Create a new subscription service
    pub fn new(gateway: Arc<G>, subscriptions: Arc<S>, users: Arc<U>, payments: Arc<P>) -> Self {
        Self {
            gateway,
            subscriptions,
            users,
            payments,
        }
    }

    /// Register a billing key after a successful registration callback.
    ///
    /// Creates the subscription on first registration, or replaces the key
    /// and restarts billing when the user re-subscribes. The registration
    /// charge is recorded in the audit trail either way.
    #[instrument(skip(self, req), fields(user_id = %req.user_id))]
    pub async fn register_billing_key(
        &self,
        req: RegisterBillingKey,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<SubscriptionRow, BillingError> {
        let next = one_month_after(today);

        let sub = match self.subscriptions.find_by_user_id(req.user_id).await? {
            Some(existing) => {
                self.subscriptions
                    .update_billing_key(existing.id, &req.billing_key)
                    .await?;
                self.subscriptions
                    .mark_renewed(existing.id, next, now)
                    .await?;
                existing
            }
            None => {
                self.subscriptions
                    .create(CreateSubscription {
                        id: Uuid::new_v4(),
                        user_id: req.user_id,
                        billing_key: Some(req.billing_key.clone()),
                        next_billing_date: Some(next),
                    })
                    .await?
            }
        };

        self.payments
            .append(CreatePayment {
                id: Uuid::new_v4(),
                user_id: req.user_id,
                subscription_id: Some(sub.id),
                order_ref: req.order_ref,
                amount: req.amount,
                provider_code: req.provider_code,
                message: req.message,
                succeeded: true,
            })
            .await?;

        self.users.set_subscriber(req.user_id, true).await?;

        if let Some(method) = &req.pay_method {
            self.users
                .update_pay_method(
                    req.user_id,
                    &method.kind.to_string(),
                    &method.issuer,
                    &method.masked_number,
                )
                .await?;
        }

        info!(subscription_id = %sub.id, "Billing key registered");

        Ok(sub)
    }

    /// Cancel the caller's subscription.
    ///
    /// Rejected unless the subscription is exactly `active`. The billing key
    /// is deleted at the provider first; any provider failure aborts with no
    /// state change. `next_billing_date` is retained so the renewal pass can
    /// expire the subscription at period end.
    #[instrument(skip(self))]
    pub async fn cancel(&self, user_id: Uuid) -> Result<(), BillingError> {
        let sub = self
            .subscriptions
            .find_by_user_id(user_id)
            .await?
            .ok_or(BillingError::SubscriptionNotFound)?;

        let status: SubscriptionStatus = sub
            .status
            .parse()
            .map_err(|_| BillingError::CorruptStatus(sub.status.clone()))?;

        if status != SubscriptionStatus::Active {
            return Err(BillingError::InvalidStatus {
                expected: "active",
                actual: status.to_string(),
            });
        }

        if let Some(billing_key) = sub.billing_key.as_deref() {
            let auth = self.gateway.partner_auth(PayWork::PuserDel).await?;
            let result = self.gateway.delete_billing_key(&auth, billing_key).await?;

            if !result.ok {
                warn!(
                    subscription_id = %sub.id,
                    code = %result.code,
                    "Billing key deletion declined"
                );
                return Err(BillingError::Declined {
                    code: result.code,
                    message: result.message,
                });
            }
        } else {
            debug!(subscription_id = %sub.id, "No billing key to delete at provider");
        }

        let t = transition(status, BillingEvent::CancelRequested)?;
        debug_assert_eq!(t.status, SubscriptionStatus::Canceled);
        self.subscriptions.mark_canceled(sub.id).await?;

        info!(subscription_id = %sub.id, "Subscription canceled");

        Ok(())
    }
}

// ============================================================================
// Pass service: one-time payment confirmation
// ============================================================================

/// Inbound Pass callback payload, provider field names preserved
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassCallback {
    /// Payment result word ("success" / "error" / "close")
    #[serde(rename = "PCD_PAY_RST")]
    pub pay_rst: String,
    /// Provider result code
    #[serde(rename = "PCD_PAY_CODE", default)]
    pub pay_code: String,
    /// Provider message
    #[serde(rename = "PCD_PAY_MSG", default)]
    pub pay_msg: String,
    /// Order id chosen at payment init; callback join key with the payer no
    #[serde(rename = "PCD_PAY_OID")]
    pub pay_oid: String,
    /// Our user id, passed through the provider
    #[serde(rename = "PCD_PAYER_NO")]
    pub payer_no: String,
    /// Provider payer id
    #[serde(rename = "PCD_PAYER_ID", default)]
    pub payer_id: String,
    /// Authorization reference for the confirmation endpoint
    #[serde(rename = "PCD_AUTH_KEY", default)]
    pub auth_key: String,
    /// Confirmation request key
    #[serde(rename = "PCD_PAY_REQKEY", default)]
    pub req_key: String,
    /// Amount as the provider formats it
    #[serde(rename = "PCD_PAY_TOTAL", default)]
    pub pay_total: String,
    /// Card display name, when paid by card
    #[serde(rename = "PCD_PAY_CARDNAME", default)]
    pub card_name: String,
    /// Masked card number
    #[serde(rename = "PCD_PAY_CARDNUM", default)]
    pub card_num: String,
    /// Buyer phone number
    #[serde(rename = "PCD_PAYER_HP", default)]
    pub payer_hp: String,
    /// Whether the buyer asked for a cash receipt ("Y"/"N")
    #[serde(rename = "PCD_TAXSAVE_FLAG", default)]
    pub taxsave_flag: String,
}

impl PassCallback {
    /// Parse the passthrough user id
    pub fn user_id(&self) -> Result<Uuid, BillingError> {
        Uuid::parse_str(&self.payer_no)
            .map_err(|_| BillingError::InvalidCallback(format!("bad payer no: {}", self.payer_no)))
    }

    /// Parse the provider-formatted amount
    pub fn amount(&self) -> Result<i64, BillingError> {
        self.pay_total
            .replace(',', "")
            .parse()
            .map_err(|_| BillingError::InvalidCallback(format!("bad amount: {}", self.pay_total)))
    }

    /// Whether the inbound result is a success
    pub fn is_success(&self) -> bool {
        self.pay_rst.eq_ignore_ascii_case("success")
    }
}

/// Outcome of a Pass confirmation
#[derive(Debug, Clone, Serialize)]
pub struct PassOutcome {
    /// Final pending-order status
    pub status: PendingOrderStatus,
    /// Provider result code
    pub code: String,
    /// Provider message
    pub message: String,
}

/// One-time payment confirmation service
pub struct PassService<G, PO, P, U>
where
    G: PaymentGateway,
    PO: PendingOrderRepository,
    P: PaymentRepository,
    U: UserRepository,
{
    gateway: Arc<G>,
    pending_orders: Arc<PO>,
    payments: Arc<P>,
    users: Arc<U>,
    receipts: Option<ReceiptClient>,
}

impl<G, PO, P, U> PassService<G, PO, P, U>
where
    G: PaymentGateway,
    PO: PendingOrderRepository,
    P: PaymentRepository,
    U: UserRepository,
{
    /// Create a new pass service
    pub fn new(
        gateway: Arc<G>,
        pending_orders: Arc<PO>,
        payments: Arc<P>,
        users: Arc<U>,
        receipts: Option<ReceiptClient>,
    ) -> Self {
        Self {
            gateway,
            pending_orders,
            payments,
            users,
            receipts,
        }
    }

    /// Stage a pending order before redirecting the client to the provider.
    #[instrument(skip(self))]
    pub async fn create_pending(
        &self,
        user_id: Uuid,
        payment_oid: String,
        goods_name: String,
        amount: i64,
    ) -> Result<PendingOrderRow, BillingError> {
        let row = self
            .pending_orders
            .create(CreatePendingOrder {
                id: Uuid::new_v4(),
                user_id,
                payment_oid,
                goods_name,
                amount,
            })
            .await?;

        Ok(row)
    }

    /// Process the provider's Pass callback.
    ///
    /// A non-success inbound result marks the pending order failed without
    /// touching the audit trail. Otherwise the payment is confirmed at the
    /// provider, the pending order transitions, a payment row is written, and
    /// payment-method display fields are upserted onto the user. Receipt
    /// issuance is advisory and never fails the payment.
    #[instrument(skip(self, callback), fields(pay_oid = %callback.pay_oid))]
    pub async fn confirm(&self, callback: &PassCallback) -> Result<PassOutcome, BillingError> {
        let user_id = callback.user_id()?;

        let pending = self
            .pending_orders
            .find_by_user_and_oid(user_id, &callback.pay_oid)
            .await?
            .ok_or(BillingError::PendingOrderNotFound)?;

        if !callback.is_success() {
            info!(code = %callback.pay_code, "Pass callback reported failure");
            self.pending_orders
                .update_status(pending.id, &PendingOrderStatus::Failed.to_string())
                .await?;
            return Ok(PassOutcome {
                status: PendingOrderStatus::Failed,
                code: callback.pay_code.clone(),
                message: callback.pay_msg.clone(),
            });
        }

        let confirm = ConfirmRequest {
            auth_key: callback.auth_key.clone(),
            req_key: callback.req_key.clone(),
            payer_id: callback.payer_id.clone(),
        };

        let result = match self.gateway.confirm_payment(&confirm).await {
            Ok(result) => result,
            Err(e) => {
                // Confirmation never reached the provider; fail the staging
                // record so the client sees a terminal state
                self.pending_orders
                    .update_status(pending.id, &PendingOrderStatus::Failed.to_string())
                    .await?;
                return Err(e);
            }
        };

        if !result.ok {
            warn!(code = %result.code, message = %result.message, "Payment confirmation declined");
            self.pending_orders
                .update_status(pending.id, &PendingOrderStatus::Failed.to_string())
                .await?;
            self.payments
                .append(CreatePayment {
                    id: Uuid::new_v4(),
                    user_id,
                    subscription_id: None,
                    order_ref: callback.pay_oid.clone(),
                    amount: callback.amount().unwrap_or(pending.amount),
                    provider_code: result.code.clone(),
                    message: result.message.clone(),
                    succeeded: false,
                })
                .await?;
            return Ok(PassOutcome {
                status: PendingOrderStatus::Failed,
                code: result.code,
                message: result.message,
            });
        }

        self.pending_orders
            .update_status(pending.id, &PendingOrderStatus::Success.to_string())
            .await?;

        let amount = callback.amount().unwrap_or(pending.amount);
        self.payments
            .append(CreatePayment {
                id: Uuid::new_v4(),
                user_id,
                subscription_id: None,
                order_ref: callback.pay_oid.clone(),
                amount,
                provider_code: result.code.clone(),
                message: result.message.clone(),
                succeeded: true,
            })
            .await?;

        if !callback.card_name.is_empty() {
            self.users
                .update_pay_method(user_id, "card", &callback.card_name, &callback.card_num)
                .await?;
        }

        if callback.taxsave_flag.eq_ignore_ascii_case("y") {
            self.issue_receipt_best_effort(callback, amount).await;
        }

        info!(pending_order_id = %pending.id, "Pass payment confirmed");

        Ok(PassOutcome {
            status: PendingOrderStatus::Success,
            code: result.code,
            message: result.message,
        })
    }

    /// Receipt issuance is advisory: log and count failures, never propagate.
    async fn issue_receipt_best_effort(&self, callback: &PassCallback, amount: i64) {
        let Some(receipts) = &self.receipts else {
            return;
        };

        let request = ReceiptRequest {
            mgt_key: callback.pay_oid.clone(),
            total_amount: amount,
            item_name: callback.card_name.clone(),
            buyer_phone: callback.payer_hp.clone(),
        };

        if let Err(e) = receipts.issue(&request).await {
            warn!(error = %e, pay_oid = %callback.pay_oid, "Receipt issuance failed");
        }
    }
}

// ============================================================================
// Refund service
// ============================================================================

/// Refund service
pub struct RefundService<G, O, PR, P>
where
    G: PaymentGateway,
    O: OrderRepository,
    PR: ProductRepository,
    P: PaymentRepository,
{
    gateway: Arc<G>,
    orders: Arc<O>,
    products: Arc<PR>,
    payments: Arc<P>,
}

impl<G, O, PR, P> RefundService<G, O, PR, P>
where
    G: PaymentGateway,
    O: OrderRepository,
    PR: ProductRepository,
    P: PaymentRepository,
{
    /// Create a new refund service
    pub fn new(gateway: Arc<G>, orders: Arc<O>, products: Arc<PR>, payments: Arc<P>) -> Self {
        Self {
            gateway,
            orders,
            products,
            payments,
        }
    }

    /// Refund an order owned by the caller.
    ///
    /// Provider failure aborts before any stock or order mutation. On
    /// success the refunded quantity returns to the product's stock, the
    /// order is archived into canceled_orders and deleted, and an audit row
    /// is appended.
    #[instrument(skip(self))]
    pub async fn refund(&self, user_id: Uuid, order_id: Uuid) -> Result<(), BillingError> {
        let order = self
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or(BillingError::OrderNotFound)?;

        if order.user_id != user_id {
            return Err(BillingError::Forbidden);
        }

        let payment_oid = order
            .payment_oid
            .clone()
            .ok_or(BillingError::MissingPaymentRef)?;
        let paid_at = order.paid_at.ok_or(BillingError::MissingPaymentRef)?;

        let auth = self.gateway.partner_auth(PayWork::PayCancel).await?;
        let result = self
            .gateway
            .refund(
                &auth,
                &RefundRequest {
                    payment_oid: payment_oid.clone(),
                    pay_date: paid_at.date_naive(),
                    amount: order.amount,
                },
            )
            .await?;

        if !result.ok {
            warn!(order_id = %order.id, code = %result.code, "Refund declined");
            return Err(BillingError::Declined {
                code: result.code,
                message: result.message,
            });
        }

        self.products
            .adjust_stock(order.product_id, i64::from(order.quantity))
            .await?;
        self.orders.archive_and_delete(&order).await?;

        self.payments
            .append(CreatePayment {
                id: Uuid::new_v4(),
                user_id,
                subscription_id: None,
                order_ref: payment_oid,
                amount: order.amount,
                provider_code: result.code,
                message: result.message,
                succeeded: true,
            })
            .await?;

        info!(order_id = %order.id, "Order refunded");

        Ok(())
    }
}
