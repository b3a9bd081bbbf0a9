use crate::collaborators::courier::PickupRequest;

use super::commands::OrderCommand;
use super::errors::OrderError;
use super::model::Order;
use super::status::is_cancellable;
use super::value_objects::{CancelReason, OrderState};

// ============================================================================
// Order Lifecycle - Pure Transition Logic
// ============================================================================
//
// `handle_command` validates a command against the current order and, when
// valid, describes the transition: the next state, the cancellation fields
// to record, and the side effect the controller must run. No I/O happens
// here; a rejected command leaves nothing to undo.
//
// State-conflict rejections double as stale-read signals for callers racing
// each other on the same order.
//
// ============================================================================

/// What must happen around the state write.
#[derive(Debug, Clone)]
pub enum Effect {
    None,
    /// Gates the commit: the courier call must succeed first.
    SchedulePickup(PickupRequest),
    /// Runs after the commit, fail-soft.
    NotifyCancellation,
}

/// A validated transition, ready for the controller to execute.
#[derive(Debug, Clone)]
pub struct Transition {
    pub next: OrderState,
    pub cancel_reason: Option<CancelReason>,
    pub cancel_reason_note: Option<String>,
    pub effect: Effect,
}

impl Transition {
    fn to(next: OrderState) -> Self {
        Self {
            next,
            cancel_reason: None,
            cancel_reason_note: None,
            effect: Effect::None,
        }
    }
}

/// Validate a command against the current order state.
pub fn handle_command(order: &Order, command: &OrderCommand) -> Result<Transition, OrderError> {
    let reject = || OrderError::InvalidTransition {
        action: command.action(),
        state: order.state,
    };

    match command {
        OrderCommand::MarkPreparing => match order.state {
            OrderState::Pending | OrderState::Placed => Ok(Transition::to(OrderState::Preparing)),
            _ => Err(reject()),
        },

        OrderCommand::Confirm { pickup } => match order.state {
            OrderState::Preparing | OrderState::Confirmed => {
                validate_pickup(pickup)?;
                Ok(Transition {
                    effect: Effect::SchedulePickup(pickup.clone()),
                    ..Transition::to(OrderState::Confirmed)
                })
            }
            _ => Err(reject()),
        },

        OrderCommand::MarkFulfilled => match order.state {
            OrderState::Confirmed => Ok(Transition::to(OrderState::Fulfilled)),
            _ => Err(reject()),
        },

        OrderCommand::Cancel { reason, note } => {
            if order.state.is_terminal() {
                return Err(reject());
            }
            if !is_cancellable(order) {
                return Err(OrderError::CancellationLocked);
            }

            let note = note.as_deref().map(str::trim).filter(|n| !n.is_empty());
            if *reason == CancelReason::Other && note.is_none() {
                return Err(OrderError::MissingCancelNote);
            }

            Ok(Transition {
                cancel_reason: Some(*reason),
                cancel_reason_note: note.map(str::to_owned),
                effect: Effect::NotifyCancellation,
                ..Transition::to(OrderState::Cancelled)
            })
        }

        OrderCommand::AdminCancel => {
            if order.state.is_terminal() {
                return Err(reject());
            }
            if !is_cancellable(order) {
                return Err(OrderError::CancellationLocked);
            }

            // No reason code on the admin path.
            Ok(Transition {
                effect: Effect::NotifyCancellation,
                ..Transition::to(OrderState::Cancelled)
            })
        }

        OrderCommand::AdminMarkFulfilled => {
            if order.state.is_terminal() {
                return Err(reject());
            }
            Ok(Transition::to(OrderState::Fulfilled))
        }
    }
}

fn validate_pickup(pickup: &PickupRequest) -> Result<(), OrderError> {
    let c = &pickup.consents;
    if !c.gdpr_processing {
        return Err(OrderError::MissingConsent("gdpr_processing"));
    }
    if !c.packaging_confirmed {
        return Err(OrderError::MissingConsent("packaging_confirmed"));
    }
    if !c.declared_value_accepted {
        return Err(OrderError::MissingConsent("declared_value_accepted"));
    }
    if !c.return_policy_ack {
        return Err(OrderError::MissingConsent("return_policy_ack"));
    }

    let d = &pickup.dimensions;
    if d.parcel_count == 0 {
        return Err(OrderError::InvalidDimensions("parcel_count must be at least 1"));
    }
    if d.weight_kg <= 0.0 {
        return Err(OrderError::InvalidDimensions("weight_kg must be positive"));
    }
    if d.length_cm <= 0.0 || d.width_cm <= 0.0 || d.height_cm <= 0.0 {
        return Err(OrderError::InvalidDimensions("package sides must be positive"));
    }

    Ok(())
}

// ============================================================================
// Unit Tests
// ============================================================================
