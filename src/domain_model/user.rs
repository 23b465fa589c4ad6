use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(
    Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(transparent)]
pub struct UserId(pub uuid::Uuid);

impl UserId {
    pub fn new_v4() -> Self {
        UserId(uuid::Uuid::new_v4())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for UserId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::from_str(s).map(UserId)
    }
}

/// Two distinct users in canonical order. Rows are always locked `min` first.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct UserPair(UserId, UserId);

impl UserPair {
    /// Returns `None` for a self-pair.
    pub fn new(a: UserId, b: UserId) -> Option<Self> {
        if a == b {
            None
        } else if a < b {
            Some(Self(a, b))
        } else {
            Some(Self(b, a))
        }
    }

    pub fn min(&self) -> UserId {
        self.0
    }

    pub fn max(&self) -> UserId {
        self.1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_is_canonical() {
        let a = UserId::new_v4();
        let b = UserId::new_v4();
        let ab = UserPair::new(a, b).unwrap();
        let ba = UserPair::new(b, a).unwrap();
        assert_eq!(ab, ba);
        assert!(ab.min() < ab.max());
    }

    #[test]
    fn self_pair_is_rejected() {
        let a = UserId::new_v4();
        assert!(UserPair::new(a, a).is_none());
    }
}
