use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::payments::{InsertPaymentEntity, PaymentEntity};
use crate::domain::value_objects::enums::{
    payment_statuses::PaymentStatus, payment_types::PaymentType,
};

#[automock]
#[async_trait]
pub trait PaymentRepository {
    /// Inserts a pending payment. Returns `None` when the booking already has
    /// a pending payment in the same checkout slot (unique partial index).
    async fn record_payment(&self, payment: InsertPaymentEntity) -> Result<Option<PaymentEntity>>;

    async fn find_by_id(&self, payment_id: Uuid) -> Result<Option<PaymentEntity>>;

    /// Latest pending payment of the booking whose type is one of `payment_types`.
    async fn find_pending_for_booking(
        &self,
        booking_id: Uuid,
        payment_types: Vec<PaymentType>,
    ) -> Result<Option<PaymentEntity>>;

    async fn attach_preference(
        &self,
        payment_id: Uuid,
        preference_id: String,
        checkout_url: String,
    ) -> Result<()>;

    /// `pending -> approved`. Returns `None` when the payment was not pending,
    /// which is how duplicate webhook deliveries are detected.
    async fn approve_if_pending(
        &self,
        payment_id: Uuid,
        gateway_payment_id: String,
        approved_at: DateTime<Utc>,
    ) -> Result<Option<PaymentEntity>>;

    /// `pending -> status` for non-approved outcomes.
    async fn close_if_pending(
        &self,
        payment_id: Uuid,
        status: PaymentStatus,
        gateway_payment_id: String,
    ) -> Result<bool>;
}
