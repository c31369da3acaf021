use crate::domain::audit::AuditNote;
use crate::domain::payment::{self, Decision, PaymentAction};
use crate::domain::ports::{
    AuthenticatorBox, Caller, ClockBox, DirectoryBox, ExpectedState, FieldRecord,
    ReservationStoreBox, UpdateOutcome, UserRecord,
};
use crate::domain::reservation::{Reservation, ReservationId, UserId};
use crate::error::{PaymentError, Result};
use crate::infrastructure::clock::SystemClock;
use serde::Deserialize;
use tracing::{error, info, instrument, warn};

/// Body of a validation request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationBody {
    pub action: PaymentAction,
    #[serde(default)]
    pub admin_notes: Option<String>,
}

/// One inbound validation request.
#[derive(Debug, Clone)]
pub struct ValidationRequest {
    pub reservation_id: ReservationId,
    pub token: Option<String>,
    pub body: ValidationBody,
}

/// Records a reservation refers to, loaded alongside it.
#[derive(Debug, Clone, Default)]
pub struct Related {
    pub user: Option<UserRecord>,
    pub field: Option<FieldRecord>,
    pub dp_validator: Option<UserRecord>,
    pub pelunasan_validator: Option<UserRecord>,
    pub payment_validator: Option<UserRecord>,
}

/// A persisted transition.
#[derive(Debug, Clone)]
pub struct Validated {
    pub message: &'static str,
    pub reservation: Reservation,
    pub related: Related,
}

/// Runs an admin's payment decision against a stored reservation.
///
/// Authorizes the caller, loads the record, asks the payment rules for a
/// patch and writes it with a conditional update keyed on the state that
/// was read. A concurrent write on the same reservation surfaces as
/// `PaymentError::Conflict`; nothing is retried here.
pub struct ValidationHandler {
    store: ReservationStoreBox,
    directory: DirectoryBox,
    authenticator: AuthenticatorBox,
    clock: ClockBox,
}

impl ValidationHandler {
    pub fn new(
        store: ReservationStoreBox,
        directory: DirectoryBox,
        authenticator: AuthenticatorBox,
    ) -> Self {
        Self {
            store,
            directory,
            authenticator,
            clock: Box::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: ClockBox) -> Self {
        self.clock = clock;
        self
    }

    #[instrument(
        skip(self, request),
        fields(reservation_id = request.reservation_id, action = request.body.action.as_str())
    )]
    pub async fn handle(&self, request: ValidationRequest) -> Result<Validated> {
        let result = self.process(request).await;
        if let Err(e) = &result {
            if e.is_internal() {
                error!(kind = e.kind(), error = %e, "payment validation failed");
            } else {
                warn!(kind = e.kind(), error = %e, "payment validation refused");
            }
        }
        result
    }

    async fn process(&self, request: ValidationRequest) -> Result<Validated> {
        let ValidationRequest {
            reservation_id,
            token,
            body,
        } = request;

        let caller = self.authorize(token.as_deref()).await?;
        let current = self
            .store
            .find_by_id(reservation_id)
            .await?
            .ok_or(PaymentError::NotFound(reservation_id))?;

        let now = self.clock.now();
        let Decision { mut patch, tag } =
            payment::decide(&current, body.action, caller.user_id, now)?;
        patch.payment_notes = Some(
            AuditNote::new(tag, body.admin_notes.as_deref())
                .append_to(current.payment_notes.as_deref().unwrap_or_default()),
        );
        patch.updated_at = Some(now);

        let updated = match self
            .store
            .conditional_update(reservation_id, ExpectedState::of(&current), &patch)
            .await?
        {
            UpdateOutcome::Updated(reservation) => reservation,
            UpdateOutcome::Conflict { actual } => {
                return Err(PaymentError::Conflict {
                    id: reservation_id,
                    expected: current.payment_status,
                    actual,
                });
            }
        };

        info!(
            admin = caller.user_id,
            from = %current.payment_status,
            to = %updated.payment_status,
            "payment transition persisted"
        );

        let related = self.related(&updated).await;
        Ok(Validated {
            message: body.action.success_message(),
            reservation: updated,
            related,
        })
    }

    async fn authorize(&self, token: Option<&str>) -> Result<Caller> {
        let token = token.ok_or(PaymentError::Unauthorized)?;
        match self.authenticator.authenticate(token).await? {
            Some(caller) if caller.is_admin() => Ok(caller),
            _ => Err(PaymentError::Unauthorized),
        }
    }

    /// Loads the records shown next to the reservation. The transition is
    /// already stored at this point, so lookup failures only thin out the view.
    async fn related(&self, reservation: &Reservation) -> Related {
        let checkpoints = &reservation.checkpoints;
        Related {
            user: self.user(Some(reservation.user_id)).await,
            field: match self.directory.field(reservation.field_id).await {
                Ok(field) => field,
                Err(e) => {
                    warn!(error = %e, "field lookup failed");
                    None
                }
            },
            dp_validator: self
                .user(checkpoints.down_payment.map(|v| v.validator_id))
                .await,
            pelunasan_validator: self
                .user(checkpoints.pelunasan.map(|v| v.validator_id))
                .await,
            payment_validator: self.user(checkpoints.full.map(|v| v.validator_id)).await,
        }
    }

    async fn user(&self, id: Option<UserId>) -> Option<UserRecord> {
        let id = id?;
        match self.directory.user(id).await {
            Ok(user) => user,
            Err(e) => {
                warn!(user_id = id, error = %e, "user lookup failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{ReservationStore, Role};
    use crate::domain::reservation::{PaymentPlan, PaymentStatus, ReservationStatus};
    use crate::infrastructure::clock::FixedClock;
    use crate::infrastructure::in_memory::{
        InMemoryDirectory, InMemoryReservationStore, StaticTokenAuthenticator,
    };
    use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
    use rust_decimal_macros::dec;

    async fn handler_with(reservation: Reservation) -> (ValidationHandler, InMemoryReservationStore) {
        let store = InMemoryReservationStore::new();
        store.insert(reservation).await.unwrap();
        let directory = InMemoryDirectory::new();
        directory
            .add_user(UserRecord {
                id: 7,
                name: "Admin Gor".into(),
                email: "admin@gor.test".into(),
                phone: None,
            })
            .await;
        let auth = StaticTokenAuthenticator::default()
            .with_token(
                "admin",
                Caller {
                    user_id: 7,
                    role: Role::Admin,
                },
            )
            .with_token(
                "member",
                Caller {
                    user_id: 5,
                    role: Role::User,
                },
            );
        let handler = ValidationHandler::new(
            Box::new(store.clone()),
            Box::new(directory),
            Box::new(auth),
        )
        .with_clock(Box::new(FixedClock(
            Utc.with_ymd_and_hms(2025, 11, 7, 12, 0, 0).unwrap(),
        )));
        (handler, store)
    }

    fn dp_submitted() -> Reservation {
        let mut r = Reservation::new(
            42,
            5,
            3,
            NaiveDate::from_ymd_opt(2025, 11, 8).unwrap(),
            NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(21, 0, 0).unwrap(),
            dec!(300000),
            PaymentPlan::Dp {
                dp_proof: Some("file.png".into()),
                pelunasan_proof: None,
                legacy_proof: None,
            },
            Utc.with_ymd_and_hms(2025, 11, 1, 8, 0, 0).unwrap(),
        );
        r.payment_status = PaymentStatus::DpSubmitted;
        r
    }

    fn request(token: Option<&str>, action: PaymentAction) -> ValidationRequest {
        ValidationRequest {
            reservation_id: 42,
            token: token.map(str::to_string),
            body: ValidationBody {
                action,
                admin_notes: None,
            },
        }
    }

    #[tokio::test]
    async fn test_reject_dp_persists_and_projects() {
        let (handler, store) = handler_with(dp_submitted()).await;

        let response = handler
            .handle(request(Some("admin"), PaymentAction::RejectDp))
            .await
            .unwrap();

        assert_eq!(
            response.message,
            "DP proof rejected. The customer may upload it again."
        );
        assert_eq!(response.reservation.payment_status, PaymentStatus::DpRejected);
        assert_eq!(
            response.reservation.checkpoints.down_payment.unwrap().validator_id,
            7
        );
        assert_eq!(
            response.related.dp_validator.as_ref().unwrap().name,
            "Admin Gor"
        );
        assert_eq!(
            response.reservation.updated_at,
            Utc.with_ymd_and_hms(2025, 11, 7, 12, 0, 0).unwrap()
        );

        let stored = store.find_by_id(42).await.unwrap().unwrap();
        assert_eq!(stored.status, ReservationStatus::Rejected);
        assert_eq!(
            stored.payment_notes.as_deref(),
            Some("[Admin Reject DP] DP proof rejected. Please upload it again.")
        );
    }

    #[tokio::test]
    async fn test_missing_or_non_admin_caller_is_unauthorized() {
        let (handler, store) = handler_with(dp_submitted()).await;

        for token in [None, Some("member"), Some("forged")] {
            let err = handler
                .handle(request(token, PaymentAction::RejectDp))
                .await
                .unwrap_err();
            assert!(matches!(err, PaymentError::Unauthorized));
        }
        assert_eq!(
            store.find_by_id(42).await.unwrap().unwrap().payment_status,
            PaymentStatus::DpSubmitted
        );
    }

    #[tokio::test]
    async fn test_unknown_reservation_is_not_found() {
        let (handler, _) = handler_with(dp_submitted()).await;
        let mut req = request(Some("admin"), PaymentAction::ValidateDp);
        req.reservation_id = 404;
        let err = handler.handle(req).await.unwrap_err();
        assert!(matches!(err, PaymentError::NotFound(404)));
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn test_admin_notes_are_appended_after_existing_trail() {
        let mut r = dp_submitted();
        r.payment_notes = Some("DP via transfer BCA\n".into());
        let (handler, _) = handler_with(r).await;

        let mut req = request(Some("admin"), PaymentAction::ValidateDp);
        req.body.admin_notes = Some("  amount matches ".into());
        let response = handler.handle(req).await.unwrap();

        assert_eq!(
            response.reservation.payment_notes.as_deref(),
            Some("DP via transfer BCA\n[Admin Validate DP]: amount matches")
        );
        assert_eq!(response.message, "Payment status updated successfully");
    }
}
