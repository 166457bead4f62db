//! Loan requests and their status machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult, Entity, ItemId, RequestId, UserId};

/// Request status lifecycle.
///
/// ```text
/// PENDING --approve--> APPROVED --return--> RETURNED
///    \
///     --reject--> REJECTED
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
    Returned,
}

impl RequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Pending => "PENDING",
            RequestStatus::Approved => "APPROVED",
            RequestStatus::Rejected => "REJECTED",
            RequestStatus::Returned => "RETURNED",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RequestStatus::Rejected | RequestStatus::Returned)
    }
}

impl core::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for RequestStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(RequestStatus::Pending),
            "APPROVED" => Ok(RequestStatus::Approved),
            "REJECTED" => Ok(RequestStatus::Rejected),
            "RETURNED" => Ok(RequestStatus::Returned),
            other => Err(DomainError::validation(format!("unknown request status '{other}'"))),
        }
    }
}

/// Operator action on an existing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestAction {
    Approve,
    Reject,
    Return,
}

impl RequestAction {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestAction::Approve => "approve",
            RequestAction::Reject => "reject",
            RequestAction::Return => "return",
        }
    }
}

/// A user's ask to borrow one unit of an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRequest {
    id: RequestId,
    item_id: ItemId,
    requester_id: UserId,
    status: RequestStatus,
    created_at: DateTime<Utc>,
}

impl ItemRequest {
    /// Open a new request in `PENDING`.
    pub fn open(id: RequestId, item_id: ItemId, requester_id: UserId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            item_id,
            requester_id,
            status: RequestStatus::Pending,
            created_at,
        }
    }

    /// Rebuild a request from storage.
    pub fn restore(
        id: RequestId,
        item_id: ItemId,
        requester_id: UserId,
        status: RequestStatus,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            item_id,
            requester_id,
            status,
            created_at,
        }
    }

    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    pub fn requester_id(&self) -> UserId {
        self.requester_id
    }

    pub fn status(&self) -> RequestStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Status this request moves to under `action`, if the move is allowed.
    pub fn next_status(&self, action: RequestAction) -> DomainResult<RequestStatus> {
        use RequestAction::*;
        use RequestStatus::*;

        match (self.status, action) {
            (Pending, Approve) => Ok(Approved),
            (Pending, Reject) => Ok(Rejected),
            (Approved, Return) => Ok(Returned),
            (Pending, Return) | (Approved, Approve) | (Approved, Reject) => Err(self.refusal(action)),
            (Rejected | Returned, _) => Err(self.refusal(action)),
        }
    }

    /// Copy of this request in `status`.
    pub fn with_status(&self, status: RequestStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }

    fn refusal(&self, action: RequestAction) -> DomainError {
        DomainError::invalid_transition(format!(
            "cannot {} a request that is {}",
            action.as_str(),
            self.status
        ))
    }
}

impl Entity for ItemRequest {
    type Id = RequestId;

    fn id(&self) -> RequestId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(status: RequestStatus) -> ItemRequest {
        ItemRequest::restore(RequestId::new(), ItemId::new(), UserId::new(), status, Utc::now())
    }

    #[test]
    fn new_requests_are_pending() {
        let req = ItemRequest::open(RequestId::new(), ItemId::new(), UserId::new(), Utc::now());
        assert_eq!(req.status(), RequestStatus::Pending);
    }

    #[test]
    fn allowed_transitions() {
        assert_eq!(
            request(RequestStatus::Pending).next_status(RequestAction::Approve),
            Ok(RequestStatus::Approved)
        );
        assert_eq!(
            request(RequestStatus::Pending).next_status(RequestAction::Reject),
            Ok(RequestStatus::Rejected)
        );
        assert_eq!(
            request(RequestStatus::Approved).next_status(RequestAction::Return),
            Ok(RequestStatus::Returned)
        );
    }

    #[test]
    fn terminal_states_accept_nothing() {
        for status in [RequestStatus::Rejected, RequestStatus::Returned] {
            assert!(status.is_terminal());
            for action in [RequestAction::Approve, RequestAction::Reject, RequestAction::Return] {
                let err = request(status).next_status(action).unwrap_err();
                assert!(matches!(err, DomainError::InvalidTransition(_)));
            }
        }
    }

    #[test]
    fn returning_a_pending_request_is_refused() {
        let err = request(RequestStatus::Pending)
            .next_status(RequestAction::Return)
            .unwrap_err();
        assert_eq!(
            err,
            DomainError::InvalidTransition("cannot return a request that is PENDING".to_string())
        );
    }

    #[test]
    fn status_parses_from_its_wire_name() {
        for status in [
            RequestStatus::Pending,
            RequestStatus::Approved,
            RequestStatus::Rejected,
            RequestStatus::Returned,
        ] {
            assert_eq!(status.as_str().parse::<RequestStatus>(), Ok(status));
        }
        assert!("approved".parse::<RequestStatus>().is_err());
    }
}
