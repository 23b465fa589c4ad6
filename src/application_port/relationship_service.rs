use crate::domain_model::*;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum RelationError {
    #[error("an account cannot relate to itself")]
    SelfReference,
    #[error("friend request already sent or already friends")]
    AlreadyRequestedOrFriends,
    #[error("no pending request to cancel")]
    NothingToCancel,
    #[error("already following")]
    AlreadyFollowing,
    #[error("not following")]
    NotFollowing,
    #[error("no such friend request")]
    NoSuchRequest,
    #[error("not friends")]
    NotFriends,
    #[error("user not found")]
    UserNotFound,
    #[error("store error: {0}")]
    Store(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct RelationLists {
    pub friends: Vec<UserSummary>,
    pub following: Vec<UserSummary>,
    pub followers: Vec<UserSummary>,
    pub requests: Vec<UserSummary>,
}

/// Friend/follow graph. `me` is always the authenticated actor.
#[async_trait::async_trait]
pub trait RelationshipService: Send + Sync {
    async fn send_request(&self, me: UserId, other: UserId) -> Result<(), RelationError>;
    async fn cancel_request(&self, me: UserId, other: UserId) -> Result<(), RelationError>;
    async fn follow(&self, me: UserId, other: UserId) -> Result<(), RelationError>;
    async fn unfollow(&self, me: UserId, other: UserId) -> Result<(), RelationError>;
    /// `me` is the receiver, `sender` the account that sent the request.
    async fn accept_request(&self, me: UserId, sender: UserId) -> Result<(), RelationError>;
    async fn unfriend(&self, me: UserId, other: UserId) -> Result<(), RelationError>;
    async fn delete_request(&self, me: UserId, sender: UserId) -> Result<(), RelationError>;
    async fn relationship_status(
        &self,
        me: UserId,
        other: UserId,
    ) -> Result<RelationshipStatus, RelationError>;
    async fn list_relations(&self, me: UserId) -> Result<RelationLists, RelationError>;
}
