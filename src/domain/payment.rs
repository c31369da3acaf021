use super::audit::AuditTag;
use super::reservation::{
    Checkpoint, PaymentStatus, ProofSlot, Reservation, ReservationPatch,
    ReservationStatus, UserId, Validation,
};
use crate::error::{PaymentError, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// An administrator's decision on a reservation's payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentAction {
    RejectDp,
    RejectPelunasan,
    RejectFull,
    ValidateDp,
    ValidatePelunasan,
    ValidateFull,
}

impl PaymentAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentAction::RejectDp => "REJECT_DP",
            PaymentAction::RejectPelunasan => "REJECT_PELUNASAN",
            PaymentAction::RejectFull => "REJECT_FULL",
            PaymentAction::ValidateDp => "VALIDATE_DP",
            PaymentAction::ValidatePelunasan => "VALIDATE_PELUNASAN",
            PaymentAction::ValidateFull => "VALIDATE_FULL",
        }
    }

    /// The checkpoint the action targets.
    pub fn checkpoint(&self) -> Checkpoint {
        match self {
            PaymentAction::RejectDp | PaymentAction::ValidateDp => Checkpoint::DownPayment,
            PaymentAction::RejectPelunasan | PaymentAction::ValidatePelunasan => {
                Checkpoint::Pelunasan
            }
            PaymentAction::RejectFull | PaymentAction::ValidateFull => Checkpoint::Full,
        }
    }

    pub fn audit_tag(&self) -> AuditTag {
        match self {
            PaymentAction::RejectDp => AuditTag::RejectDp,
            PaymentAction::RejectPelunasan => AuditTag::RejectPelunasan,
            PaymentAction::RejectFull => AuditTag::RejectFull,
            _ => AuditTag::Validated(self.checkpoint()),
        }
    }

    pub fn success_message(&self) -> &'static str {
        match self {
            PaymentAction::RejectDp => "DP proof rejected. The customer may upload it again.",
            PaymentAction::RejectPelunasan => {
                "Pelunasan proof rejected. The customer may upload it again."
            }
            PaymentAction::RejectFull => "Payment proof rejected. The booking has been cancelled.",
            PaymentAction::ValidateDp
            | PaymentAction::ValidatePelunasan
            | PaymentAction::ValidateFull => "Payment status updated successfully",
        }
    }
}

/// What a transition changes, plus the tag for the audit note that goes
/// with it. The note text itself is composed by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub patch: ReservationPatch,
    pub tag: AuditTag,
}

/// Computes the outcome of `action` on `current` without touching storage.
pub fn decide(
    current: &Reservation,
    action: PaymentAction,
    admin: UserId,
    now: DateTime<Utc>,
) -> Result<Decision> {
    let stamp = Validation {
        validator_id: admin,
        validated_at: now,
    };
    let checkpoint = action.checkpoint();

    if current.mode() != checkpoint.mode() {
        return Err(PaymentError::InvalidMode {
            action: action.as_str(),
            mode: current.mode(),
        });
    }
    if !current.payment.has_evidence_for(checkpoint) {
        return Err(PaymentError::NoEvidence {
            action: action.as_str(),
        });
    }

    let patch = match action {
        PaymentAction::RejectDp => {
            // Later-stage stamps recorded out of order are void once the DP is refused.
            let mut patch = ReservationPatch::new(PaymentStatus::DpRejected);
            patch.status = Some(ReservationStatus::Rejected);
            patch.cleared_proofs = vec![ProofSlot::DownPayment, ProofSlot::Legacy];
            patch.checkpoints = vec![
                (Checkpoint::DownPayment, Some(stamp)),
                (Checkpoint::Pelunasan, None),
                (Checkpoint::Full, None),
            ];
            patch
        }
        PaymentAction::RejectPelunasan => {
            require_status(current, action, PaymentStatus::PelunasanSubmitted)?;
            let mut patch = ReservationPatch::new(PaymentStatus::PelunasanRejected);
            patch.status = Some(ReservationStatus::Rejected);
            patch.cleared_proofs = vec![ProofSlot::Pelunasan];
            patch.checkpoints = vec![(Checkpoint::Pelunasan, Some(stamp))];
            patch
        }
        PaymentAction::RejectFull => {
            let mut patch = ReservationPatch::new(PaymentStatus::Unpaid);
            patch.status = Some(ReservationStatus::Rejected);
            patch.cleared_proofs = vec![ProofSlot::Full];
            patch.checkpoints = vec![(Checkpoint::Full, Some(stamp))];
            patch
        }
        PaymentAction::ValidateDp
        | PaymentAction::ValidatePelunasan
        | PaymentAction::ValidateFull => validate(current, action, checkpoint, stamp)?,
    };

    Ok(Decision {
        patch,
        tag: action.audit_tag(),
    })
}

fn validate(
    current: &Reservation,
    action: PaymentAction,
    checkpoint: Checkpoint,
    stamp: Validation,
) -> Result<ReservationPatch> {
    if current.pending_checkpoint() != Some(checkpoint) {
        return Err(PaymentError::InvalidTransition {
            action: action.as_str(),
            status: current.payment_status,
        });
    }

    let mut patch = ReservationPatch::new(checkpoint.validated_status());
    patch.checkpoints.push((checkpoint, Some(stamp)));

    // Settling the balance implies the down payment was accepted.
    if checkpoint == Checkpoint::Pelunasan && current.checkpoints.down_payment.is_none() {
        patch.checkpoints.push((Checkpoint::DownPayment, Some(stamp)));
    }

    if checkpoint.is_terminal() {
        patch.status = Some(ReservationStatus::Confirmed);
        patch.paid_amount = Some(current.total_price);
    }

    Ok(patch)
}

fn require_status(
    current: &Reservation,
    action: PaymentAction,
    expected: PaymentStatus,
) -> Result<()> {
    if current.payment_status == expected {
        Ok(())
    } else {
        Err(PaymentError::InvalidTransition {
            action: action.as_str(),
            status: current.payment_status,
        })
    }
}
