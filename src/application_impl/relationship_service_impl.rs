use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use std::collections::BTreeSet;
use std::sync::Arc;

/// A relationship change requested by an actor against a target account.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum RelationOp {
    SendRequest,
    CancelRequest,
    Follow,
    Unfollow,
    /// Actor is the receiver of the pending request.
    AcceptRequest,
    Unfriend,
    /// Actor is the receiver of the pending request.
    DeleteRequest,
}

impl RelationOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationOp::SendRequest => "send_request",
            RelationOp::CancelRequest => "cancel_request",
            RelationOp::Follow => "follow",
            RelationOp::Unfollow => "unfollow",
            RelationOp::AcceptRequest => "accept_request",
            RelationOp::Unfriend => "unfriend",
            RelationOp::DeleteRequest => "delete_request",
        }
    }
}

/// Set updates for both sides of one transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairUpdate {
    pub actor: SetUpdate,
    pub target: SetUpdate,
}

/// Checks the preconditions of `op` on the current state of both accounts
/// and returns the updates to apply. Pure; touches no store.
pub fn plan_transition(
    op: RelationOp,
    actor: &Account,
    target: &Account,
) -> Result<PairUpdate, RelationError> {
    use RelationSet::*;

    let a = actor.user_id;
    let b = target.user_id;
    if a == b {
        return Err(RelationError::SelfReference);
    }

    let update = match op {
        RelationOp::SendRequest => {
            if target.has(Requests, a) || target.has(Friends, a) {
                return Err(RelationError::AlreadyRequestedOrFriends);
            }
            PairUpdate {
                actor: SetUpdate::new().push(Following, b),
                target: SetUpdate::new().push(Requests, a).push(Followers, a),
            }
        }
        RelationOp::CancelRequest => {
            if !target.has(Requests, a) || target.has(Friends, a) {
                return Err(RelationError::NothingToCancel);
            }
            PairUpdate {
                actor: SetUpdate::new().pull(Following, b),
                target: SetUpdate::new().pull(Requests, a).pull(Followers, a),
            }
        }
        RelationOp::Follow => {
            if target.has(Followers, a) || actor.has(Following, b) {
                return Err(RelationError::AlreadyFollowing);
            }
            PairUpdate {
                actor: SetUpdate::new().push(Following, b),
                target: SetUpdate::new().push(Followers, a),
            }
        }
        RelationOp::Unfollow => {
            if !(target.has(Followers, a) && actor.has(Following, b)) {
                return Err(RelationError::NotFollowing);
            }
            PairUpdate {
                actor: SetUpdate::new().pull(Following, b),
                target: SetUpdate::new().pull(Followers, a),
            }
        }
        RelationOp::AcceptRequest => {
            if !actor.has(Requests, b) {
                return Err(RelationError::NoSuchRequest);
            }
            PairUpdate {
                actor: SetUpdate::new()
                    .push(Friends, b)
                    .push(Following, b)
                    .pull(Requests, b),
                target: SetUpdate::new().push(Friends, a).push(Followers, a),
            }
        }
        RelationOp::Unfriend => {
            if !(actor.has(Friends, b) && target.has(Friends, a)) {
                return Err(RelationError::NotFriends);
            }
            PairUpdate {
                actor: SetUpdate::new()
                    .pull(Friends, b)
                    .pull(Following, b)
                    .pull(Followers, b),
                target: SetUpdate::new()
                    .pull(Friends, a)
                    .pull(Following, a)
                    .pull(Followers, a),
            }
        }
        RelationOp::DeleteRequest => {
            if !actor.has(Requests, b) {
                return Err(RelationError::NoSuchRequest);
            }
            PairUpdate {
                actor: SetUpdate::new().pull(Requests, b).pull(Followers, b),
                target: SetUpdate::new().pull(Following, a),
            }
        }
    };
    Ok(update)
}

pub struct RealRelationshipService {
    account_repo: Arc<dyn AccountRepo>,
    user_repo: Arc<dyn UserRepo>,
    tx_manager: Arc<dyn TxManager>,
}

impl RealRelationshipService {
    pub fn new(
        account_repo: Arc<dyn AccountRepo>,
        user_repo: Arc<dyn UserRepo>,
        tx_manager: Arc<dyn TxManager>,
    ) -> Self {
        Self {
            account_repo,
            user_repo,
            tx_manager,
        }
    }

    /// Runs one transition inside a single transaction. Both rows are locked
    /// in canonical pair order before any predicate is checked.
    async fn transition(
        &self,
        op: RelationOp,
        me: UserId,
        other: UserId,
    ) -> Result<(), RelationError> {
        let pair = UserPair::new(me, other).ok_or(RelationError::SelfReference)?;

        let mut tx = self
            .tx_manager
            .begin()
            .await
            .map_err(|e| RelationError::Store(e.to_string()))?;

        let first = self
            .account_repo
            .find_by_id_in_tx(&mut *tx, pair.min())
            .await?;
        let second = self
            .account_repo
            .find_by_id_in_tx(&mut *tx, pair.max())
            .await?;
        let (actor, target) = if first.user_id == me {
            (first, second)
        } else {
            (second, first)
        };

        let update = match plan_transition(op, &actor, &target) {
            Ok(update) => update,
            Err(e) => {
                debug!(op = op.as_str(), actor = %me, target = %other, "rejected: {e}");
                return Err(e);
            }
        };

        // an early return drops `tx`, which rolls both writes back
        self.account_repo
            .update_sets_in_tx(&mut *tx, me, &update.actor)
            .await?;
        self.account_repo
            .update_sets_in_tx(&mut *tx, other, &update.target)
            .await?;

        tx.commit()
            .await
            .map_err(|e| RelationError::Store(e.to_string()))?;

        info!(op = op.as_str(), actor = %me, target = %other, "relationship updated");
        Ok(())
    }

    async fn summaries(&self, ids: &BTreeSet<UserId>) -> Result<Vec<UserSummary>, RelationError> {
        let ids: Vec<UserId> = ids.iter().copied().collect();
        self.user_repo
            .get_summaries(&ids)
            .await
            .map_err(|e| RelationError::Store(e.to_string()))
    }
}

#[async_trait::async_trait]
impl RelationshipService for RealRelationshipService {
    async fn send_request(&self, me: UserId, other: UserId) -> Result<(), RelationError> {
        self.transition(RelationOp::SendRequest, me, other).await
    }

    async fn cancel_request(&self, me: UserId, other: UserId) -> Result<(), RelationError> {
        self.transition(RelationOp::CancelRequest, me, other).await
    }

    async fn follow(&self, me: UserId, other: UserId) -> Result<(), RelationError> {
        self.transition(RelationOp::Follow, me, other).await
    }

    async fn unfollow(&self, me: UserId, other: UserId) -> Result<(), RelationError> {
        self.transition(RelationOp::Unfollow, me, other).await
    }

    async fn accept_request(&self, me: UserId, sender: UserId) -> Result<(), RelationError> {
        self.transition(RelationOp::AcceptRequest, me, sender).await
    }

    async fn unfriend(&self, me: UserId, other: UserId) -> Result<(), RelationError> {
        self.transition(RelationOp::Unfriend, me, other).await
    }

    async fn delete_request(&self, me: UserId, sender: UserId) -> Result<(), RelationError> {
        self.transition(RelationOp::DeleteRequest, me, sender).await
    }

    async fn relationship_status(
        &self,
        me: UserId,
        other: UserId,
    ) -> Result<RelationshipStatus, RelationError> {
        if me == other {
            return Err(RelationError::SelfReference);
        }
        let viewer = self.account_repo.find_by_id(me).await?;
        let owner = self.account_repo.find_by_id(other).await?;
        Ok(RelationshipStatus::between(&viewer, &owner))
    }

    async fn list_relations(&self, me: UserId) -> Result<RelationLists, RelationError> {
        let account = self.account_repo.find_by_id(me).await?;
        Ok(RelationLists {
            friends: self.summaries(&account.friends).await?,
            following: self.summaries(&account.following).await?,
            followers: self.summaries(&account.followers).await?,
            requests: self.summaries(&account.requests).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra_memory::*;
    use chrono::NaiveDate;

    struct Fixture {
        store: Arc<MemoryStore>,
        service: RealRelationshipService,
        tx_manager: Arc<MemoryTxManager>,
    }

    impl Fixture {
        fn new() -> Self {
            let store = Arc::new(MemoryStore::new());
            let tx_manager = Arc::new(MemoryTxManager::new());
            let service =
                RealRelationshipService::new(store.clone(), store.clone(), tx_manager.clone());
            Fixture {
                store,
                service,
                tx_manager,
            }
        }

        async fn user(&self, name: &str) -> UserId {
            let user_id = UserId::new_v4();
            let user = NewUser {
                user_id,
                username: name.to_string(),
                email: format!("{name}@example.com"),
                first_name: name.to_string(),
                last_name: "tester".to_string(),
                picture: DEFAULT_PICTURE.to_string(),
                gender: "female".to_string(),
                birth_date: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            };
            let mut tx = self.tx_manager.begin().await.unwrap();
            UserRepo::create_in_tx(self.store.as_ref(), &mut *tx, &user)
                .await
                .unwrap();
            tx.commit().await.unwrap();
            user_id
        }

        async fn account(&self, user_id: UserId) -> Account {
            AccountRepo::find_by_id(self.store.as_ref(), user_id)
                .await
                .unwrap()
        }
    }

    #[tokio::test]
    async fn send_request_sets_requests_followers_and_following() {
        let f = Fixture::new();
        let (a, b) = (f.user("alice").await, f.user("bob").await);

        f.service.send_request(a, b).await.unwrap();

        let (acc_a, acc_b) = (f.account(a).await, f.account(b).await);
        assert!(acc_b.requests.contains(&a));
        assert!(acc_b.followers.contains(&a));
        assert!(acc_a.following.contains(&b));
        assert!(acc_a.requests.is_empty());
        assert_eq!(PairState::of(&acc_a, &acc_b), PairState::RequestPending);
    }

    #[tokio::test]
    async fn repeated_request_is_rejected() {
        let f = Fixture::new();
        let (a, b) = (f.user("alice").await, f.user("bob").await);

        f.service.send_request(a, b).await.unwrap();
        let before = (f.account(a).await, f.account(b).await);
        let err = f.service.send_request(a, b).await.unwrap_err();

        assert!(matches!(err, RelationError::AlreadyRequestedOrFriends));
        assert_eq!((f.account(a).await, f.account(b).await), before);
    }

    #[tokio::test]
    async fn accept_makes_mutual_friends_and_clears_request() {
        let f = Fixture::new();
        let (a, b) = (f.user("alice").await, f.user("bob").await);

        f.service.send_request(b, a).await.unwrap();
        f.service.accept_request(a, b).await.unwrap();

        let (acc_a, acc_b) = (f.account(a).await, f.account(b).await);
        assert!(acc_a.friends.contains(&b) && acc_b.friends.contains(&a));
        assert!(acc_a.following.contains(&b) && acc_b.following.contains(&a));
        assert!(acc_a.followers.contains(&b) && acc_b.followers.contains(&a));
        assert!(!acc_a.requests.contains(&b));
        assert_eq!(PairState::of(&acc_a, &acc_b), PairState::Friends);

        let err = f.service.send_request(b, a).await.unwrap_err();
        assert!(matches!(err, RelationError::AlreadyRequestedOrFriends));
    }

    #[tokio::test]
    async fn unfriend_severs_every_edge_both_ways() {
        let f = Fixture::new();
        let (a, b) = (f.user("alice").await, f.user("bob").await);

        f.service.send_request(a, b).await.unwrap();
        f.service.accept_request(b, a).await.unwrap();
        f.service.unfriend(a, b).await.unwrap();

        let (acc_a, acc_b) = (f.account(a).await, f.account(b).await);
        for acc in [&acc_a, &acc_b] {
            assert!(acc.friends.is_empty());
            assert!(acc.following.is_empty());
            assert!(acc.followers.is_empty());
        }
        assert_eq!(PairState::of(&acc_a, &acc_b), PairState::Strangers);

        let err = f.service.unfriend(b, a).await.unwrap_err();
        assert!(matches!(err, RelationError::NotFriends));
    }

    #[tokio::test]
    async fn follow_then_unfollow_round_trips() {
        let f = Fixture::new();
        let (a, b) = (f.user("alice").await, f.user("bob").await);
        let before = (f.account(a).await, f.account(b).await);

        f.service.follow(a, b).await.unwrap();
        assert_eq!(
            PairState::of(&f.account(a).await, &f.account(b).await),
            PairState::Following
        );
        let err = f.service.follow(a, b).await.unwrap_err();
        assert!(matches!(err, RelationError::AlreadyFollowing));

        f.service.unfollow(a, b).await.unwrap();
        assert_eq!((f.account(a).await, f.account(b).await), before);

        let err = f.service.unfollow(a, b).await.unwrap_err();
        assert!(matches!(err, RelationError::NotFollowing));
    }

    #[tokio::test]
    async fn cancel_request_returns_to_strangers() {
        let f = Fixture::new();
        let (a, b) = (f.user("alice").await, f.user("bob").await);
        let before = (f.account(a).await, f.account(b).await);

        f.service.send_request(a, b).await.unwrap();
        f.service.cancel_request(a, b).await.unwrap();
        assert_eq!((f.account(a).await, f.account(b).await), before);

        let err = f.service.cancel_request(a, b).await.unwrap_err();
        assert!(matches!(err, RelationError::NothingToCancel));
    }

    #[tokio::test]
    async fn delete_request_drops_sender_follow() {
        let f = Fixture::new();
        let (a, b) = (f.user("alice").await, f.user("bob").await);

        f.service.send_request(b, a).await.unwrap();
        f.service.delete_request(a, b).await.unwrap();

        let (acc_a, acc_b) = (f.account(a).await, f.account(b).await);
        assert!(acc_a.requests.is_empty());
        assert!(acc_a.followers.is_empty());
        assert!(acc_b.following.is_empty());

        let err = f.service.delete_request(a, b).await.unwrap_err();
        assert!(matches!(err, RelationError::NoSuchRequest));
        let err = f.service.accept_request(a, b).await.unwrap_err();
        assert!(matches!(err, RelationError::NoSuchRequest));
    }

    #[tokio::test]
    async fn sender_cannot_accept_own_request() {
        let f = Fixture::new();
        let (a, b) = (f.user("alice").await, f.user("bob").await);

        f.service.send_request(a, b).await.unwrap();
        let err = f.service.accept_request(a, b).await.unwrap_err();
        assert!(matches!(err, RelationError::NoSuchRequest));
    }

    #[tokio::test]
    async fn cancel_after_acceptance_is_rejected() {
        let f = Fixture::new();
        let (a, b) = (f.user("alice").await, f.user("bob").await);

        f.service.send_request(a, b).await.unwrap();
        f.service.accept_request(b, a).await.unwrap();
        let err = f.service.cancel_request(a, b).await.unwrap_err();
        assert!(matches!(err, RelationError::NothingToCancel));
    }

    #[tokio::test]
    async fn self_pairs_are_rejected_everywhere() {
        let f = Fixture::new();
        let a = f.user("alice").await;
        let s = &f.service;

        assert!(matches!(s.send_request(a, a).await, Err(RelationError::SelfReference)));
        assert!(matches!(s.cancel_request(a, a).await, Err(RelationError::SelfReference)));
        assert!(matches!(s.follow(a, a).await, Err(RelationError::SelfReference)));
        assert!(matches!(s.unfollow(a, a).await, Err(RelationError::SelfReference)));
        assert!(matches!(s.accept_request(a, a).await, Err(RelationError::SelfReference)));
        assert!(matches!(s.unfriend(a, a).await, Err(RelationError::SelfReference)));
        assert!(matches!(s.delete_request(a, a).await, Err(RelationError::SelfReference)));
        assert_eq!(f.account(a).await, Account::new(a));
    }

    #[tokio::test]
    async fn unknown_target_is_not_found() {
        let f = Fixture::new();
        let a = f.user("alice").await;

        let err = f.service.follow(a, UserId::new_v4()).await.unwrap_err();
        assert!(matches!(err, RelationError::UserNotFound));
        assert_eq!(f.account(a).await, Account::new(a));
    }

    #[tokio::test]
    async fn follow_is_independent_of_friendship() {
        let f = Fixture::new();
        let (a, b) = (f.user("alice").await, f.user("bob").await);

        f.service.follow(b, a).await.unwrap();
        f.service.send_request(a, b).await.unwrap();
        f.service.accept_request(b, a).await.unwrap();

        let (acc_a, acc_b) = (f.account(a).await, f.account(b).await);
        assert_eq!(acc_a.followers.len(), 1);
        assert_eq!(acc_b.following.len(), 1);
        assert!(acc_a.friends.contains(&b) && acc_b.friends.contains(&a));
    }

    #[tokio::test]
    async fn concurrent_requests_on_one_pair_apply_once() {
        let f = Arc::new(Fixture::new());
        let (a, b) = (f.user("alice").await, f.user("bob").await);

        let attempts = (0..8).map(|_| {
            let f = f.clone();
            async move { f.service.send_request(a, b).await }
        });
        let results = futures_util::future::join_all(attempts).await;

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(f.account(b).await.requests.len(), 1);
    }

    #[tokio::test]
    async fn status_and_lists_reflect_the_graph() {
        let f = Fixture::new();
        let (a, b, c) = (
            f.user("alice").await,
            f.user("bob").await,
            f.user("carol").await,
        );

        f.service.send_request(a, b).await.unwrap();
        f.service.accept_request(b, a).await.unwrap();
        f.service.send_request(c, a).await.unwrap();

        let status = f.service.relationship_status(a, b).await.unwrap();
        assert!(status.friends && status.following);
        let status = f.service.relationship_status(a, c).await.unwrap();
        assert!(status.request_received && !status.request_sent);
        assert!(matches!(
            f.service.relationship_status(a, a).await,
            Err(RelationError::SelfReference)
        ));

        let lists = f.service.list_relations(a).await.unwrap();
        assert_eq!(lists.friends.len(), 1);
        assert_eq!(lists.friends[0].username, "bob");
        assert_eq!(lists.requests[0].username, "carol");
        assert_eq!(lists.followers.len(), 2);
        assert_eq!(lists.following.len(), 1);
    }

    #[test]
    fn plan_leaves_accounts_untouched_on_rejection() {
        let a = Account::new(UserId::new_v4());
        let b = Account::new(UserId::new_v4());

        for op in [
            RelationOp::CancelRequest,
            RelationOp::Unfollow,
            RelationOp::AcceptRequest,
            RelationOp::Unfriend,
            RelationOp::DeleteRequest,
        ] {
            assert!(plan_transition(op, &a, &b).is_err(), "{}", op.as_str());
        }
    }
}
