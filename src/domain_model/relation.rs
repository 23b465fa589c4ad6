use crate::domain_model::{Account, RelationSet};
use serde::Serialize;

/// Relationship of an ordered pair (A, B), seen from A.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PairState {
    Strangers,
    Following,
    RequestPending,
    Friends,
}

impl PairState {
    pub fn of(a: &Account, b: &Account) -> PairState {
        if b.has(RelationSet::Friends, a.user_id) {
            PairState::Friends
        } else if b.has(RelationSet::Requests, a.user_id) {
            PairState::RequestPending
        } else if b.has(RelationSet::Followers, a.user_id) {
            PairState::Following
        } else {
            PairState::Strangers
        }
    }
}

/// What a profile page shows about the viewer's relation to its owner.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub struct RelationshipStatus {
    pub friends: bool,
    pub following: bool,
    pub request_sent: bool,
    pub request_received: bool,
    pub state: PairState,
}

impl RelationshipStatus {
    pub fn between(viewer: &Account, other: &Account) -> Self {
        RelationshipStatus {
            friends: viewer.has(RelationSet::Friends, other.user_id)
                && other.has(RelationSet::Friends, viewer.user_id),
            following: viewer.has(RelationSet::Following, other.user_id),
            request_sent: other.has(RelationSet::Requests, viewer.user_id),
            request_received: viewer.has(RelationSet::Requests, other.user_id),
            state: PairState::of(viewer, other),
        }
    }

    pub fn unrelated() -> Self {
        RelationshipStatus {
            friends: false,
            following: false,
            request_sent: false,
            request_received: false,
            state: PairState::Strangers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain_model::{SetUpdate, UserId};

    #[test]
    fn pending_request_wins_over_follow() {
        let mut a = Account::new(UserId::new_v4());
        let mut b = Account::new(UserId::new_v4());
        b.apply(
            &SetUpdate::new()
                .push(RelationSet::Requests, a.user_id)
                .push(RelationSet::Followers, a.user_id),
        );
        a.apply(&SetUpdate::new().push(RelationSet::Following, b.user_id));

        assert_eq!(PairState::of(&a, &b), PairState::RequestPending);
        assert_eq!(PairState::of(&b, &a), PairState::Strangers);

        let status = RelationshipStatus::between(&a, &b);
        assert!(status.request_sent);
        assert!(status.following);
        assert!(!status.friends);
        assert!(RelationshipStatus::between(&b, &a).request_received);
    }
}
