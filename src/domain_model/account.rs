use crate::domain_model::UserId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// One of the four peer sets every account carries.
#[derive(Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationSet {
    Followers,
    Following,
    Friends,
    /// Incoming, still pending friend requests.
    Requests,
}

impl RelationSet {
    pub const ALL: [RelationSet; 4] = [
        RelationSet::Followers,
        RelationSet::Following,
        RelationSet::Friends,
        RelationSet::Requests,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationSet::Followers => "followers",
            RelationSet::Following => "following",
            RelationSet::Friends => "friends",
            RelationSet::Requests => "requests",
        }
    }
}

impl fmt::Display for RelationSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationSet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "followers" => Ok(RelationSet::Followers),
            "following" => Ok(RelationSet::Following),
            "friends" => Ok(RelationSet::Friends),
            "requests" => Ok(RelationSet::Requests),
            other => Err(format!("unknown relation set: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    pub user_id: UserId,
    pub followers: BTreeSet<UserId>,
    pub following: BTreeSet<UserId>,
    pub friends: BTreeSet<UserId>,
    pub requests: BTreeSet<UserId>,
}

impl Account {
    pub fn new(user_id: UserId) -> Self {
        Account {
            user_id,
            followers: BTreeSet::new(),
            following: BTreeSet::new(),
            friends: BTreeSet::new(),
            requests: BTreeSet::new(),
        }
    }

    pub fn set(&self, kind: RelationSet) -> &BTreeSet<UserId> {
        match kind {
            RelationSet::Followers => &self.followers,
            RelationSet::Following => &self.following,
            RelationSet::Friends => &self.friends,
            RelationSet::Requests => &self.requests,
        }
    }

    fn set_mut(&mut self, kind: RelationSet) -> &mut BTreeSet<UserId> {
        match kind {
            RelationSet::Followers => &mut self.followers,
            RelationSet::Following => &mut self.following,
            RelationSet::Friends => &mut self.friends,
            RelationSet::Requests => &mut self.requests,
        }
    }

    #[inline]
    pub fn has(&self, kind: RelationSet, peer: UserId) -> bool {
        self.set(kind).contains(&peer)
    }

    /// Pulls are applied before pushes. Pushing an existing member is a no-op.
    pub fn apply(&mut self, update: &SetUpdate) {
        for (kind, peer) in &update.pull {
            self.set_mut(*kind).remove(peer);
        }
        for (kind, peer) in &update.push {
            self.set_mut(*kind).insert(*peer);
        }
    }
}

/// Field-level set mutation for a single account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetUpdate {
    pub push: Vec<(RelationSet, UserId)>,
    pub pull: Vec<(RelationSet, UserId)>,
}

impl SetUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, kind: RelationSet, peer: UserId) -> Self {
        self.push.push((kind, peer));
        self
    }

    pub fn pull(mut self, kind: RelationSet, peer: UserId) -> Self {
        self.pull.push((kind, peer));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.push.is_empty() && self.pull.is_empty()
    }
}
