use std::sync::Arc;

use axum::http::StatusCode;
use chrono::{TimeDelta, Utc};
use crates::domain::{
    entities::{
        bookings::{BookingEntity, InsertBookingEntity},
        merchants::MerchantEntity,
    },
    repositories::{
        bookings::BookingRepository, merchants::MerchantRepository,
        platform_config::PlatformConfigRepository,
    },
    value_objects::{
        bookings::{BookingDto, BookingPaymentSummaryDto, ReserveBookingRequest},
        deposit_deadline::compute_deposit_deadline,
        enums::booking_statuses::BookingStatus,
        payment_amounts::{PricingError, calculate_payment_amounts},
    },
};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::usecases::platform_config::PlatformSettings;

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("Reserva no encontrada")]
    BookingNotFound,
    #[error("Servicio no encontrado o inactivo")]
    ServiceNotFound,
    #[error("Comercio no encontrado")]
    MerchantNotFound,
    #[error("No tenés permiso sobre esta reserva")]
    Forbidden,
    #[error("El turno debe ser en el futuro")]
    StartsInPast,
    #[error("El horario del turno está fuera de rango")]
    SlotOutOfRange,
    #[error("El comercio no ofrece descuento por pago inmediato")]
    InstantDiscountUnavailable,
    #[error("No se puede pasar de {from} a {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },
    #[error("La reserva cambió de estado, volvé a intentarlo")]
    Conflict,
    #[error(transparent)]
    Pricing(#[from] PricingError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl BookingError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            BookingError::BookingNotFound
            | BookingError::ServiceNotFound
            | BookingError::MerchantNotFound => StatusCode::NOT_FOUND,
            BookingError::Forbidden => StatusCode::FORBIDDEN,
            BookingError::StartsInPast
            | BookingError::SlotOutOfRange
            | BookingError::InstantDiscountUnavailable
            | BookingError::InvalidTransition { .. }
            | BookingError::Pricing(_) => StatusCode::BAD_REQUEST,
            BookingError::Conflict => StatusCode::CONFLICT,
            BookingError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, BookingError>;

pub struct BookingUseCase<B, M, C>
where
    B: BookingRepository + Send + Sync + 'static,
    M: MerchantRepository + Send + Sync + 'static,
    C: PlatformConfigRepository + Send + Sync + 'static,
{
    booking_repo: Arc<B>,
    merchant_repo: Arc<M>,
    settings: Arc<PlatformSettings<C>>,
}

impl<B, M, C> BookingUseCase<B, M, C>
where
    B: BookingRepository + Send + Sync + 'static,
    M: MerchantRepository + Send + Sync + 'static,
    C: PlatformConfigRepository + Send + Sync + 'static,
{
    pub fn new(
        booking_repo: Arc<B>,
        merchant_repo: Arc<M>,
        settings: Arc<PlatformSettings<C>>,
    ) -> Self {
        Self {
            booking_repo,
            merchant_repo,
            settings,
        }
    }

    pub async fn reserve(
        &self,
        client_id: Uuid,
        request: ReserveBookingRequest,
    ) -> UseCaseResult<BookingDto> {
        info!(
            %client_id,
            merchant_id = %request.merchant_id,
            service_id = %request.service_id,
            instant_payment = request.instant_payment,
            "bookings: reservation requested"
        );

        let now = Utc::now();
        if request.starts_at <= now {
            return Err(BookingError::StartsInPast);
        }

        let service = self
            .merchant_repo
            .find_active_service(request.service_id)
            .await
            .map_err(|err| {
                error!(service_id = %request.service_id, db_error = ?err, "bookings: failed to load service");
                BookingError::Internal(err)
            })?
            .filter(|service| service.merchant_id == request.merchant_id)
            .ok_or(BookingError::ServiceNotFound)?;
        let ends_at = TimeDelta::try_minutes(i64::from(service.duration_minutes))
            .and_then(|duration| request.starts_at.checked_add_signed(duration))
            .ok_or(BookingError::SlotOutOfRange)?;

        let merchant = self.load_merchant(request.merchant_id).await?;

        let instant_discount = if request.instant_payment {
            let percentage = merchant
                .instant_discount_percentage
                .filter(|percentage| *percentage > 0.0)
                .ok_or(BookingError::InstantDiscountUnavailable)?;
            Some(percentage)
        } else {
            None
        };

        let amounts =
            calculate_payment_amounts(service.price, merchant.deposit_percentage, instant_discount)
                .inspect_err(|err| {
                    warn!(
                        merchant_id = %merchant.id,
                        error = %err,
                        "bookings: merchant pricing policy rejected"
                    );
                })?;

        let deadline_hours = match merchant.deposit_deadline_hours.filter(|hours| *hours > 0) {
            Some(hours) => i64::from(hours),
            None => self.settings.deposit_deadline_hours().await,
        };
        let deposit_deadline = compute_deposit_deadline(now, request.starts_at, deadline_hours);

        let booking = self
            .booking_repo
            .create_booking(InsertBookingEntity {
                merchant_id: merchant.id,
                client_id,
                service_id: service.id,
                starts_at: request.starts_at,
                ends_at,
                status: BookingStatus::PendingDeposit.to_string(),
                service_price: amounts.service_price,
                deposit_amount: amounts.deposit_amount,
                remaining_amount: amounts.remaining_amount,
                discount_amount: amounts.discount_amount,
                deposit_paid: false,
                full_payment_paid: false,
                deposit_deadline: Some(deposit_deadline),
                instant_discount_applied: instant_discount.is_some(),
            })
            .await
            .map_err(|err| {
                error!(%client_id, db_error = ?err, "bookings: failed to store booking");
                BookingError::Internal(err)
            })?;

        info!(
            booking_id = %booking.id,
            deposit_amount = booking.deposit_amount,
            %deposit_deadline,
            "bookings: booking reserved"
        );

        Ok(BookingDto::from(booking))
    }

    pub async fn payment_summary(
        &self,
        user_id: Uuid,
        booking_id: Uuid,
    ) -> UseCaseResult<BookingPaymentSummaryDto> {
        let booking = self.load_booking(booking_id).await?;
        self.ensure_participant(user_id, booking.client_id, booking.merchant_id)
            .await?;

        Ok(BookingPaymentSummaryDto::from_booking(&booking, Utc::now()))
    }

    pub async fn update_status(
        &self,
        user_id: Uuid,
        booking_id: Uuid,
        next: BookingStatus,
    ) -> UseCaseResult<BookingDto> {
        let mut booking = self.load_booking(booking_id).await?;
        if next.is_merchant_outcome() {
            if !self.is_merchant_owner(user_id, booking.merchant_id).await? {
                warn!(%booking_id, %user_id, %next, "bookings: only the merchant may record this outcome");
                return Err(BookingError::Forbidden);
            }
        } else {
            self.ensure_participant(user_id, booking.client_id, booking.merchant_id)
                .await?;
        }

        let current = booking.booking_status();
        if !current.can_be_changed_manually_to(next) {
            warn!(%booking_id, %current, %next, "bookings: rejected status transition");
            return Err(BookingError::InvalidTransition {
                from: current,
                to: next,
            });
        }

        let updated = self
            .booking_repo
            .update_status_if(booking_id, current, next)
            .await
            .map_err(|err| {
                error!(%booking_id, db_error = ?err, "bookings: failed to update status");
                BookingError::Internal(err)
            })?;
        if !updated {
            warn!(%booking_id, %current, %next, "bookings: status changed concurrently");
            return Err(BookingError::Conflict);
        }

        info!(%booking_id, %user_id, from = %current, to = %next, "bookings: status updated");
        booking.status = next.to_string();
        Ok(BookingDto::from(booking))
    }

    async fn load_booking(
        &self,
        booking_id: Uuid,
    ) -> UseCaseResult<BookingEntity> {
        self.booking_repo
            .find_by_id(booking_id)
            .await
            .map_err(|err| {
                error!(%booking_id, db_error = ?err, "bookings: failed to load booking");
                BookingError::Internal(err)
            })?
            .ok_or(BookingError::BookingNotFound)
    }

    async fn load_merchant(&self, merchant_id: Uuid) -> UseCaseResult<MerchantEntity> {
        self.merchant_repo
            .find_by_id(merchant_id)
            .await
            .map_err(|err| {
                error!(%merchant_id, db_error = ?err, "bookings: failed to load merchant");
                BookingError::Internal(err)
            })?
            .ok_or(BookingError::MerchantNotFound)
    }

    /// The booking's client or the owner of the merchant.
    async fn ensure_participant(
        &self,
        user_id: Uuid,
        client_id: Uuid,
        merchant_id: Uuid,
    ) -> UseCaseResult<()> {
        if user_id == client_id || self.is_merchant_owner(user_id, merchant_id).await? {
            Ok(())
        } else {
            Err(BookingError::Forbidden)
        }
    }

    async fn is_merchant_owner(&self, user_id: Uuid, merchant_id: Uuid) -> UseCaseResult<bool> {
        let merchant = self.load_merchant(merchant_id).await?;
        Ok(merchant.owner_user_id == user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration};
    use crates::domain::{
        entities::services::ServiceEntity,
        repositories::{
            bookings::MockBookingRepository, merchants::MockMerchantRepository,
            platform_config::MockPlatformConfigRepository,
        },
    };
    use mockall::predicate::eq;

    fn sample_merchant(id: Uuid) -> MerchantEntity {
        let now = Utc::now();
        MerchantEntity {
            id,
            owner_user_id: Uuid::new_v4(),
            name: "Barbería Centro".to_string(),
            deposit_percentage: 30.0,
            instant_discount_percentage: Some(10.0),
            deposit_deadline_hours: None,
            payout_account: Some("CVU-0000003100010000000001".to_string()),
            is_premium: false,
            premium_subscription_ref: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn sample_service(merchant_id: Uuid) -> ServiceEntity {
        ServiceEntity {
            id: Uuid::new_v4(),
            merchant_id,
            name: "Corte y barba".to_string(),
            price: 10_000,
            duration_minutes: 45,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn stored(insert: InsertBookingEntity) -> BookingEntity {
        let now = Utc::now();
        BookingEntity {
            id: Uuid::new_v4(),
            merchant_id: insert.merchant_id,
            client_id: insert.client_id,
            service_id: insert.service_id,
            starts_at: insert.starts_at,
            ends_at: insert.ends_at,
            status: insert.status,
            service_price: insert.service_price,
            deposit_amount: insert.deposit_amount,
            remaining_amount: insert.remaining_amount,
            discount_amount: insert.discount_amount,
            deposit_paid: insert.deposit_paid,
            full_payment_paid: insert.full_payment_paid,
            deposit_deadline: insert.deposit_deadline,
            instant_discount_applied: insert.instant_discount_applied,
            created_at: now,
            updated_at: now,
        }
    }

    fn booking_with_status(client_id: Uuid, merchant_id: Uuid, status: BookingStatus) -> BookingEntity {
        let starts_at = Utc::now() + Duration::days(2);
        stored(InsertBookingEntity {
            merchant_id,
            client_id,
            service_id: Uuid::new_v4(),
            starts_at,
            ends_at: starts_at + Duration::minutes(30),
            status: status.to_string(),
            service_price: 10_000,
            deposit_amount: 3_000,
            remaining_amount: 7_000,
            discount_amount: 0,
            deposit_paid: status == BookingStatus::Confirmed,
            full_payment_paid: false,
            deposit_deadline: Some(Utc::now() + Duration::hours(3)),
            instant_discount_applied: false,
        })
    }

    fn usecase(
        bookings: MockBookingRepository,
        merchants: MockMerchantRepository,
        config: MockPlatformConfigRepository,
    ) -> BookingUseCase<MockBookingRepository, MockMerchantRepository, MockPlatformConfigRepository>
    {
        BookingUseCase::new(
            Arc::new(bookings),
            Arc::new(merchants),
            Arc::new(PlatformSettings::new(Arc::new(config))),
        )
    }

    fn request(merchant_id: Uuid, service_id: Uuid, starts_at: DateTime<Utc>, instant: bool) -> ReserveBookingRequest {
        ReserveBookingRequest {
            merchant_id,
            service_id,
            starts_at,
            instant_payment: instant,
        }
    }

    #[tokio::test]
    async fn reserve_computes_amounts_and_deadline() {
        let merchant_id = Uuid::new_v4();
        let client_id = Uuid::new_v4();
        let service = sample_service(merchant_id);
        let service_id = service.id;
        let starts_at = Utc::now() + Duration::days(3);

        let mut merchants = MockMerchantRepository::new();
        merchants
            .expect_find_active_service()
            .with(eq(service_id))
            .returning(move |_| Ok(Some(service.clone())));
        merchants
            .expect_find_by_id()
            .with(eq(merchant_id))
            .returning(move |id| Ok(Some(sample_merchant(id))));

        let mut config = MockPlatformConfigRepository::new();
        config
            .expect_find_value()
            .withf(|key| key == "deposit_deadline_hours_default")
            .returning(|_| Ok(Some("12".to_string())));

        let mut bookings = MockBookingRepository::new();
        bookings
            .expect_create_booking()
            .withf(move |insert| {
                insert.deposit_amount == 3_000
                    && insert.remaining_amount == 7_000
                    && insert.discount_amount == 0
                    && !insert.instant_discount_applied
                    && insert.status == "pending_deposit"
                    && insert.ends_at == insert.starts_at + Duration::minutes(45)
            })
            .times(1)
            .returning(|insert| Ok(stored(insert)));

        let before = Utc::now();
        let booking = usecase(bookings, merchants, config)
            .reserve(client_id, request(merchant_id, service_id, starts_at, false))
            .await
            .unwrap();

        let deadline = booking.deposit_deadline.unwrap();
        assert!(deadline >= before + Duration::hours(12));
        assert!(deadline <= Utc::now() + Duration::hours(12));
        assert_eq!(booking.status, BookingStatus::PendingDeposit);
    }

    #[tokio::test]
    async fn reserve_with_instant_payment_applies_discount_and_caps_deadline() {
        let merchant_id = Uuid::new_v4();
        let service = sample_service(merchant_id);
        let service_id = service.id;
        let starts_at = Utc::now() + Duration::hours(2);

        let mut merchants = MockMerchantRepository::new();
        merchants
            .expect_find_active_service()
            .returning(move |_| Ok(Some(service.clone())));
        merchants.expect_find_by_id().returning(|id| {
            let mut merchant = sample_merchant(id);
            merchant.deposit_deadline_hours = Some(24);
            Ok(Some(merchant))
        });

        let mut bookings = MockBookingRepository::new();
        bookings
            .expect_create_booking()
            .withf(|insert| insert.discount_amount == 1_000 && insert.instant_discount_applied)
            .returning(|insert| Ok(stored(insert)));

        let booking = usecase(bookings, merchants, MockPlatformConfigRepository::new())
            .reserve(Uuid::new_v4(), request(merchant_id, service_id, starts_at, true))
            .await
            .unwrap();

        assert_eq!(booking.deposit_deadline, Some(starts_at));
    }

    #[tokio::test]
    async fn reserve_rejects_past_slots_foreign_services_and_missing_discount() {
        let merchant_id = Uuid::new_v4();
        let err = usecase(
            MockBookingRepository::new(),
            MockMerchantRepository::new(),
            MockPlatformConfigRepository::new(),
        )
        .reserve(
            Uuid::new_v4(),
            request(merchant_id, Uuid::new_v4(), Utc::now() - Duration::minutes(1), false),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, BookingError::StartsInPast));

        let foreign_service = sample_service(Uuid::new_v4());
        let mut merchants = MockMerchantRepository::new();
        merchants
            .expect_find_active_service()
            .returning(move |_| Ok(Some(foreign_service.clone())));
        let err = usecase(MockBookingRepository::new(), merchants, MockPlatformConfigRepository::new())
            .reserve(
                Uuid::new_v4(),
                request(merchant_id, Uuid::new_v4(), Utc::now() + Duration::days(1), false),
            )
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let service = sample_service(merchant_id);
        let mut merchants = MockMerchantRepository::new();
        merchants
            .expect_find_active_service()
            .returning(move |_| Ok(Some(service.clone())));
        merchants.expect_find_by_id().returning(|id| {
            let mut merchant = sample_merchant(id);
            merchant.instant_discount_percentage = None;
            Ok(Some(merchant))
        });
        let err = usecase(MockBookingRepository::new(), merchants, MockPlatformConfigRepository::new())
            .reserve(
                Uuid::new_v4(),
                request(merchant_id, Uuid::new_v4(), Utc::now() + Duration::days(1), true),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::InstantDiscountUnavailable));
    }

    #[tokio::test]
    async fn reserve_rejects_slot_end_past_calendar_limit() {
        let merchant_id = Uuid::new_v4();
        let service = sample_service(merchant_id);
        let service_id = service.id;

        let mut merchants = MockMerchantRepository::new();
        merchants
            .expect_find_active_service()
            .returning(move |_| Ok(Some(service.clone())));
        let mut bookings = MockBookingRepository::new();
        bookings.expect_create_booking().never();

        let err = usecase(bookings, merchants, MockPlatformConfigRepository::new())
            .reserve(
                Uuid::new_v4(),
                request(
                    merchant_id,
                    service_id,
                    DateTime::<Utc>::MAX_UTC - Duration::minutes(1),
                    false,
                ),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, BookingError::SlotOutOfRange));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn client_cancels_pending_booking() {
        let client_id = Uuid::new_v4();
        let booking = booking_with_status(client_id, Uuid::new_v4(), BookingStatus::PendingDeposit);
        let booking_id = booking.id;

        let mut bookings = MockBookingRepository::new();
        bookings
            .expect_find_by_id()
            .with(eq(booking_id))
            .returning(move |_| Ok(Some(booking.clone())));
        bookings
            .expect_update_status_if()
            .with(
                eq(booking_id),
                eq(BookingStatus::PendingDeposit),
                eq(BookingStatus::Cancelled),
            )
            .times(1)
            .returning(|_, _, _| Ok(true));

        let updated = usecase(bookings, MockMerchantRepository::new(), MockPlatformConfigRepository::new())
            .update_status(client_id, booking_id, BookingStatus::Cancelled)
            .await
            .unwrap();

        assert_eq!(updated.status, BookingStatus::Cancelled);
    }

    #[tokio::test]
    async fn terminal_states_and_strangers_are_rejected() {
        let client_id = Uuid::new_v4();
        let expired = booking_with_status(client_id, Uuid::new_v4(), BookingStatus::Expired);
        let mut bookings = MockBookingRepository::new();
        bookings
            .expect_find_by_id()
            .returning(move |_| Ok(Some(expired.clone())));
        bookings.expect_update_status_if().never();

        let err = usecase(bookings, MockMerchantRepository::new(), MockPlatformConfigRepository::new())
            .update_status(client_id, Uuid::new_v4(), BookingStatus::Confirmed)
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::InvalidTransition { .. }));

        let confirmed = booking_with_status(client_id, Uuid::new_v4(), BookingStatus::Confirmed);
        let mut bookings = MockBookingRepository::new();
        bookings
            .expect_find_by_id()
            .returning(move |_| Ok(Some(confirmed.clone())));
        let mut merchants = MockMerchantRepository::new();
        merchants
            .expect_find_by_id()
            .returning(|id| Ok(Some(sample_merchant(id))));

        let err = usecase(bookings, merchants, MockPlatformConfigRepository::new())
            .update_status(Uuid::new_v4(), Uuid::new_v4(), BookingStatus::Completed)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn only_merchant_owner_records_completion_or_no_show() {
        let merchant = sample_merchant(Uuid::new_v4());
        let owner_id = merchant.owner_user_id;
        let client_id = Uuid::new_v4();
        let booking = booking_with_status(client_id, merchant.id, BookingStatus::Confirmed);
        let booking_id = booking.id;

        let mut bookings = MockBookingRepository::new();
        bookings
            .expect_find_by_id()
            .returning(move |_| Ok(Some(booking.clone())));
        bookings
            .expect_update_status_if()
            .with(
                eq(booking_id),
                eq(BookingStatus::Confirmed),
                eq(BookingStatus::Completed),
            )
            .times(1)
            .returning(|_, _, _| Ok(true));
        let mut merchants = MockMerchantRepository::new();
        merchants
            .expect_find_by_id()
            .returning(move |_| Ok(Some(merchant.clone())));
        let usecase = usecase(bookings, merchants, MockPlatformConfigRepository::new());

        for outcome in [BookingStatus::Completed, BookingStatus::NoShow] {
            let err = usecase
                .update_status(client_id, booking_id, outcome)
                .await
                .unwrap_err();
            assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        }

        let updated = usecase
            .update_status(owner_id, booking_id, BookingStatus::Completed)
            .await
            .unwrap();
        assert_eq!(updated.status, BookingStatus::Completed);
    }

    #[tokio::test]
    async fn concurrent_change_is_reported_as_conflict() {
        let client_id = Uuid::new_v4();
        let booking = booking_with_status(client_id, Uuid::new_v4(), BookingStatus::PendingDeposit);
        let mut bookings = MockBookingRepository::new();
        bookings
            .expect_find_by_id()
            .returning(move |_| Ok(Some(booking.clone())));
        bookings
            .expect_update_status_if()
            .returning(|_, _, _| Ok(false));

        let err = usecase(bookings, MockMerchantRepository::new(), MockPlatformConfigRepository::new())
            .update_status(client_id, Uuid::new_v4(), BookingStatus::Cancelled)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn merchant_owner_reads_payment_summary() {
        let merchant = sample_merchant(Uuid::new_v4());
        let owner_id = merchant.owner_user_id;
        let booking = booking_with_status(Uuid::new_v4(), merchant.id, BookingStatus::PendingDeposit);
        let booking_id = booking.id;

        let mut bookings = MockBookingRepository::new();
        bookings
            .expect_find_by_id()
            .returning(move |_| Ok(Some(booking.clone())));
        let mut merchants = MockMerchantRepository::new();
        merchants
            .expect_find_by_id()
            .returning(move |_| Ok(Some(merchant.clone())));

        let summary = usecase(bookings, merchants, MockPlatformConfigRepository::new())
            .payment_summary(owner_id, booking_id)
            .await
            .unwrap();

        assert_eq!(summary.deposit_amount, 3_000);
        assert_eq!(summary.full_payment_amount, 10_000);
        let remaining = summary.seconds_until_deadline.unwrap();
        assert!(remaining > 0 && remaining <= 3 * 3_600);
    }
}
