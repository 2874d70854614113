//! Shift lifecycle engine.
//!
//! Every status or assignee mutation in the system funnels through
//! [`apply`]: the approval workflow (approve/reject/cancel) and the two
//! privileged escape hatches (direct status set, manager reassignment).
//! Handlers never write a status the engine has not returned.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::database::models::user::{Role, UserRef};

/// Shift statuses as stored and served.
///
/// `PendingApproval` and `Modified` exist in the stored enum but no
/// transition produces them; they deserialize for compatibility and are
/// treated as ordinary non-terminal statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShiftStatus {
    Proposed,
    Scheduled,
    PendingApproval,
    Confirmed,
    Rejected,
    Modified,
    Cancelled,
}

impl ShiftStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShiftStatus::Proposed => "proposed",
            ShiftStatus::Scheduled => "scheduled",
            ShiftStatus::PendingApproval => "pendingApproval",
            ShiftStatus::Confirmed => "confirmed",
            ShiftStatus::Rejected => "rejected",
            ShiftStatus::Modified => "modified",
            ShiftStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<ShiftStatus> {
        match s {
            "proposed" => Some(ShiftStatus::Proposed),
            "scheduled" => Some(ShiftStatus::Scheduled),
            "pendingApproval" => Some(ShiftStatus::PendingApproval),
            "confirmed" => Some(ShiftStatus::Confirmed),
            "rejected" => Some(ShiftStatus::Rejected),
            "modified" => Some(ShiftStatus::Modified),
            "cancelled" => Some(ShiftStatus::Cancelled),
            _ => None,
        }
    }

    /// Terminal statuses permit no outgoing transition.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ShiftStatus::Rejected | ShiftStatus::Cancelled)
    }
}

impl std::fmt::Display for ShiftStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated principal requesting a transition.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

/// Approve-or-reject decision. Strict: unknown action strings fail to
/// parse instead of silently acting as reject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub fn parse(s: &str) -> Option<Decision> {
        match s {
            "approve" => Some(Decision::Approve),
            "reject" => Some(Decision::Reject),
            _ => None,
        }
    }
}

/// Requested mutation. `SetStatus` and `Assign` are the privileged
/// direct paths: they skip the approval table but still refuse to touch
/// a terminal shift.
#[derive(Debug, Clone, Copy)]
pub enum ShiftEvent {
    Decide(Decision),
    Cancel,
    SetStatus(ShiftStatus),
    Assign(Uuid),
}

/// The engine-approved outcome to persist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Status(ShiftStatus),
    Assignee(Uuid),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Invalid shift status for this action")]
    InvalidStatus,
    #[error("Shift is already cancelled or rejected")]
    AlreadyClosed,
    #[error("Insufficient permissions")]
    PermissionDenied,
}

/// What the engine needs to know about a shift to rule on a transition.
#[derive(Debug, Clone, Copy)]
pub struct ShiftState<'a> {
    pub status: ShiftStatus,
    pub assigned_to: Option<&'a UserRef>,
    pub created_by: &'a UserRef,
}

impl<'a> ShiftState<'a> {
    fn is_assignee(&self, user_id: Uuid) -> bool {
        self.assigned_to.map(|r| r.id() == user_id).unwrap_or(false)
    }

    fn is_creator(&self, user_id: Uuid) -> bool {
        self.created_by.id() == user_id
    }
}

/// Initial status and effective assignee for a newly created shift.
///
/// Staff always propose and can only book themselves. A manager
/// scheduling someone else needs that person's acknowledgement; a
/// manager booking nobody or themselves is confirmed outright.
pub fn placement(actor: &Actor, requested_assignee: Option<Uuid>) -> (ShiftStatus, Option<Uuid>) {
    match actor.role {
        Role::Staff => (ShiftStatus::Proposed, Some(actor.id)),
        Role::Manager => match requested_assignee {
            Some(assignee) if assignee != actor.id => (ShiftStatus::Scheduled, Some(assignee)),
            other => (ShiftStatus::Confirmed, other),
        },
    }
}

/// Rule on a requested transition. Returns what to persist or why not.
pub fn apply(
    actor: &Actor,
    shift: &ShiftState<'_>,
    event: ShiftEvent,
) -> Result<Transition, TransitionError> {
    match event {
        ShiftEvent::Decide(decision) => decide(actor, shift, decision).map(Transition::Status),
        ShiftEvent::Cancel => cancel(actor, shift).map(Transition::Status),
        ShiftEvent::SetStatus(next) => {
            if shift.status.is_terminal() {
                Err(TransitionError::AlreadyClosed)
            } else {
                Ok(Transition::Status(next))
            }
        }
        ShiftEvent::Assign(staff_id) => {
            if actor.role != Role::Manager {
                Err(TransitionError::PermissionDenied)
            } else if shift.status.is_terminal() {
                Err(TransitionError::AlreadyClosed)
            } else {
                Ok(Transition::Assignee(staff_id))
            }
        }
    }
}

fn decide(
    actor: &Actor,
    shift: &ShiftState<'_>,
    decision: Decision,
) -> Result<ShiftStatus, TransitionError> {
    let outcome = match decision {
        Decision::Approve => ShiftStatus::Confirmed,
        Decision::Reject => ShiftStatus::Rejected,
    };

    match actor.role {
        // Managers may rule on anything awaiting a decision
        Role::Manager => match shift.status {
            ShiftStatus::Proposed | ShiftStatus::Scheduled => Ok(outcome),
            _ => Err(TransitionError::InvalidStatus),
        },
        // Staff may only acknowledge shifts scheduled for them
        Role::Staff => {
            if shift.status == ShiftStatus::Scheduled && shift.is_assignee(actor.id) {
                Ok(outcome)
            } else {
                Err(TransitionError::PermissionDenied)
            }
        }
    }
}

fn cancel(actor: &Actor, shift: &ShiftState<'_>) -> Result<ShiftStatus, TransitionError> {
    match actor.role {
        Role::Manager => {
            if shift.status.is_terminal() {
                return Err(TransitionError::AlreadyClosed);
            }
        }
        Role::Staff => {
            // Permission is checked before the closed check so an
            // unrelated staff member gets 403, not 400
            if !shift.is_creator(actor.id) && !shift.is_assignee(actor.id) {
                return Err(TransitionError::PermissionDenied);
            }
            if shift.status.is_terminal() {
                return Err(TransitionError::AlreadyClosed);
            }
        }
    }
    Ok(ShiftStatus::Cancelled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::user::UserSummary;

    fn manager() -> Actor {
        Actor { id: Uuid::new_v4(), role: Role::Manager }
    }

    fn staff() -> Actor {
        Actor { id: Uuid::new_v4(), role: Role::Staff }
    }

    fn state<'a>(
        status: ShiftStatus,
        assigned_to: Option<&'a UserRef>,
        created_by: &'a UserRef,
    ) -> ShiftState<'a> {
        ShiftState { status, assigned_to, created_by }
    }

    #[test]
    fn staff_created_shifts_are_proposed_and_self_assigned() {
        let actor = staff();
        let someone_else = Uuid::new_v4();
        // Whatever assignee the body carried, staff book themselves
        let (status, assignee) = placement(&actor, Some(someone_else));
        assert_eq!(status, ShiftStatus::Proposed);
        assert_eq!(assignee, Some(actor.id));

        let (status, assignee) = placement(&actor, None);
        assert_eq!(status, ShiftStatus::Proposed);
        assert_eq!(assignee, Some(actor.id));
    }

    #[test]
    fn manager_assigning_other_staff_needs_acknowledgement() {
        let actor = manager();
        let staff_id = Uuid::new_v4();
        let (status, assignee) = placement(&actor, Some(staff_id));
        assert_eq!(status, ShiftStatus::Scheduled);
        assert_eq!(assignee, Some(staff_id));
    }

    #[test]
    fn manager_unassigned_or_self_assigned_is_confirmed() {
        let actor = manager();
        assert_eq!(placement(&actor, None), (ShiftStatus::Confirmed, None));
        assert_eq!(
            placement(&actor, Some(actor.id)),
            (ShiftStatus::Confirmed, Some(actor.id))
        );
    }

    #[test]
    fn manager_decides_proposed_and_scheduled() {
        let actor = manager();
        let creator = UserRef::Id(Uuid::new_v4());

        for status in [ShiftStatus::Proposed, ShiftStatus::Scheduled] {
            let shift = state(status, None, &creator);
            assert_eq!(
                apply(&actor, &shift, ShiftEvent::Decide(Decision::Approve)),
                Ok(Transition::Status(ShiftStatus::Confirmed))
            );
            assert_eq!(
                apply(&actor, &shift, ShiftEvent::Decide(Decision::Reject)),
                Ok(Transition::Status(ShiftStatus::Rejected))
            );
        }
    }

    #[test]
    fn decisions_on_settled_shifts_always_fail() {
        let creator = UserRef::Id(Uuid::new_v4());
        let staff_actor = staff();
        let assignee_ref = UserRef::Id(staff_actor.id);

        for status in [ShiftStatus::Confirmed, ShiftStatus::Rejected, ShiftStatus::Cancelled] {
            let shift = state(status, Some(&assignee_ref), &creator);
            assert_eq!(
                apply(&manager(), &shift, ShiftEvent::Decide(Decision::Approve)),
                Err(TransitionError::InvalidStatus)
            );
            // Even the assignee cannot decide outside `scheduled`
            assert_eq!(
                apply(&staff_actor, &shift, ShiftEvent::Decide(Decision::Approve)),
                Err(TransitionError::PermissionDenied)
            );
        }
    }

    #[test]
    fn assigned_staff_acknowledges_scheduled_shift() {
        let actor = staff();
        let creator = UserRef::Id(Uuid::new_v4());
        let assignee_ref = UserRef::Id(actor.id);
        let shift = state(ShiftStatus::Scheduled, Some(&assignee_ref), &creator);

        assert_eq!(
            apply(&actor, &shift, ShiftEvent::Decide(Decision::Approve)),
            Ok(Transition::Status(ShiftStatus::Confirmed))
        );
        assert_eq!(
            apply(&actor, &shift, ShiftEvent::Decide(Decision::Reject)),
            Ok(Transition::Status(ShiftStatus::Rejected))
        );
    }

    #[test]
    fn non_assignee_staff_cannot_decide() {
        let actor = staff();
        let creator = UserRef::Id(Uuid::new_v4());
        let other = UserRef::Id(Uuid::new_v4());
        let shift = state(ShiftStatus::Scheduled, Some(&other), &creator);

        assert_eq!(
            apply(&actor, &shift, ShiftEvent::Decide(Decision::Approve)),
            Err(TransitionError::PermissionDenied)
        );
    }

    #[test]
    fn assignee_match_works_through_populated_reference() {
        let actor = staff();
        let creator = UserRef::Id(Uuid::new_v4());
        let populated = UserRef::Summary(UserSummary {
            id: actor.id,
            username: "sam".to_string(),
            name: "Sam Doe".to_string(),
        });
        let shift = state(ShiftStatus::Scheduled, Some(&populated), &creator);

        assert_eq!(
            apply(&actor, &shift, ShiftEvent::Decide(Decision::Approve)),
            Ok(Transition::Status(ShiftStatus::Confirmed))
        );
    }

    #[test]
    fn manager_cancels_anything_open_including_confirmed() {
        let actor = manager();
        let creator = UserRef::Id(Uuid::new_v4());

        // Confirmed is not terminal: cancellation must succeed
        for status in [ShiftStatus::Proposed, ShiftStatus::Scheduled, ShiftStatus::Confirmed] {
            let shift = state(status, None, &creator);
            assert_eq!(
                apply(&actor, &shift, ShiftEvent::Cancel),
                Ok(Transition::Status(ShiftStatus::Cancelled))
            );
        }
    }

    #[test]
    fn cancel_refuses_settled_shifts() {
        let creator = UserRef::Id(Uuid::new_v4());
        for status in [ShiftStatus::Cancelled, ShiftStatus::Rejected] {
            let shift = state(status, None, &creator);
            assert_eq!(
                apply(&manager(), &shift, ShiftEvent::Cancel),
                Err(TransitionError::AlreadyClosed)
            );
        }
    }

    #[test]
    fn staff_cancel_requires_creator_or_assignee() {
        let actor = staff();
        let manager_ref = UserRef::Id(Uuid::new_v4());
        let other_staff = UserRef::Id(Uuid::new_v4());

        // Created by a manager, assigned to someone else: hands off
        let shift = state(ShiftStatus::Scheduled, Some(&other_staff), &manager_ref);
        assert_eq!(
            apply(&actor, &shift, ShiftEvent::Cancel),
            Err(TransitionError::PermissionDenied)
        );

        // As creator
        let creator_ref = UserRef::Id(actor.id);
        let shift = state(ShiftStatus::Proposed, Some(&other_staff), &creator_ref);
        assert_eq!(
            apply(&actor, &shift, ShiftEvent::Cancel),
            Ok(Transition::Status(ShiftStatus::Cancelled))
        );

        // As assignee
        let assignee_ref = UserRef::Id(actor.id);
        let shift = state(ShiftStatus::Scheduled, Some(&assignee_ref), &manager_ref);
        assert_eq!(
            apply(&actor, &shift, ShiftEvent::Cancel),
            Ok(Transition::Status(ShiftStatus::Cancelled))
        );
    }

    #[test]
    fn second_cancel_is_refused() {
        let actor = manager();
        let creator = UserRef::Id(Uuid::new_v4());
        let open = state(ShiftStatus::Confirmed, None, &creator);

        let first = apply(&actor, &open, ShiftEvent::Cancel).unwrap();
        assert_eq!(first, Transition::Status(ShiftStatus::Cancelled));

        let closed = state(ShiftStatus::Cancelled, None, &creator);
        assert_eq!(
            apply(&actor, &closed, ShiftEvent::Cancel),
            Err(TransitionError::AlreadyClosed)
        );
    }

    #[test]
    fn direct_status_set_cannot_resurrect() {
        let actor = staff();
        let creator = UserRef::Id(actor.id);
        let closed = state(ShiftStatus::Rejected, None, &creator);

        assert_eq!(
            apply(&actor, &closed, ShiftEvent::SetStatus(ShiftStatus::Proposed)),
            Err(TransitionError::AlreadyClosed)
        );

        let open = state(ShiftStatus::Proposed, None, &creator);
        assert_eq!(
            apply(&actor, &open, ShiftEvent::SetStatus(ShiftStatus::Confirmed)),
            Ok(Transition::Status(ShiftStatus::Confirmed))
        );
    }

    #[test]
    fn reassignment_is_manager_only_and_respects_terminal_states() {
        let creator = UserRef::Id(Uuid::new_v4());
        let target = Uuid::new_v4();

        let open = state(ShiftStatus::Scheduled, None, &creator);
        assert_eq!(
            apply(&manager(), &open, ShiftEvent::Assign(target)),
            Ok(Transition::Assignee(target))
        );
        assert_eq!(
            apply(&staff(), &open, ShiftEvent::Assign(target)),
            Err(TransitionError::PermissionDenied)
        );

        let closed = state(ShiftStatus::Cancelled, None, &creator);
        assert_eq!(
            apply(&manager(), &closed, ShiftEvent::Assign(target)),
            Err(TransitionError::AlreadyClosed)
        );
    }

    #[test]
    fn unknown_decision_strings_fail_to_parse() {
        // Anything but the two known actions is a client error, never
        // an implicit reject
        assert!(serde_json::from_str::<Decision>("\"approve\"").is_ok());
        assert!(serde_json::from_str::<Decision>("\"reject\"").is_ok());
        assert!(serde_json::from_str::<Decision>("\"banana\"").is_err());
        assert!(serde_json::from_str::<Decision>("\"Approve\"").is_err());

        assert_eq!(Decision::parse("approve"), Some(Decision::Approve));
        assert_eq!(Decision::parse("reject"), Some(Decision::Reject));
        assert_eq!(Decision::parse("banana"), None);
        assert_eq!(Decision::parse("Approve"), None);
    }

    #[test]
    fn declared_but_unreachable_statuses_round_trip() {
        assert_eq!(ShiftStatus::parse("pendingApproval"), Some(ShiftStatus::PendingApproval));
        assert_eq!(ShiftStatus::parse("modified"), Some(ShiftStatus::Modified));
        assert!(!ShiftStatus::PendingApproval.is_terminal());
        assert!(!ShiftStatus::Modified.is_terminal());
    }
}
