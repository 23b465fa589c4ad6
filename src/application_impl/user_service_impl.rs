use crate::application_impl::BIO_MAX_LEN;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::{AccountRepo, UserRepo};
use std::sync::Arc;

pub struct RealUserService {
    user_repo: Arc<dyn UserRepo>,
    account_repo: Arc<dyn AccountRepo>,
}

impl RealUserService {
    pub fn new(user_repo: Arc<dyn UserRepo>, account_repo: Arc<dyn AccountRepo>) -> RealUserService {
        RealUserService {
            user_repo,
            account_repo,
        }
    }

    /// Trims every field and turns blanks into `None`.
    fn normalize(details: ProfileDetails) -> ProfileDetails {
        let clean = |v: Option<String>| {
            v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        };
        ProfileDetails {
            bio: clean(details.bio),
            other_name: clean(details.other_name),
            job: clean(details.job),
            workplace: clean(details.workplace),
            high_school: clean(details.high_school),
            college: clean(details.college),
            current_city: clean(details.current_city),
            hometown: clean(details.hometown),
            relationship: clean(details.relationship),
            instagram: clean(details.instagram),
        }
    }
}

#[async_trait::async_trait]
impl UserService for RealUserService {
    async fn resolve_username(&self, username: &str) -> Result<UserId, UserError> {
        let user = self
            .user_repo
            .get_by_username(username)
            .await?
            .ok_or(UserError::UserNotFound)?;
        Ok(user.user_id)
    }

    async fn find_user(&self, email: &str) -> Result<FoundUser, UserError> {
        let user = self
            .user_repo
            .get_by_email(&email.trim().to_lowercase())
            .await?
            .ok_or(UserError::UserNotFound)?;
        Ok(FoundUser {
            email: user.email,
            picture: user.picture,
        })
    }

    async fn get_profile(&self, viewer: UserId, username: &str) -> Result<ProfileView, UserError> {
        let user = self
            .user_repo
            .get_by_username(username)
            .await?
            .ok_or(UserError::UserNotFound)?;
        let owner = self.account_repo.find_by_id(user.user_id).await?;

        let relationship = if viewer == user.user_id {
            RelationshipStatus::unrelated()
        } else {
            let me = self.account_repo.find_by_id(viewer).await?;
            RelationshipStatus::between(&me, &owner)
        };

        Ok(ProfileView {
            user_id: user.user_id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            picture: user.picture,
            cover: user.cover,
            gender: user.gender,
            birth_date: user.birth_date,
            verified: user.verified,
            details: user.details,
            friend_count: owner.friends.len(),
            follower_count: owner.followers.len(),
            following_count: owner.following.len(),
            relationship,
        })
    }

    async fn update_details(
        &self,
        me: UserId,
        details: ProfileDetails,
    ) -> Result<ProfileDetails, UserError> {
        let details = Self::normalize(details);
        if let Some(bio) = &details.bio {
            if bio.chars().count() > BIO_MAX_LEN {
                return Err(UserError::InvalidInput(format!(
                    "bio must be at most {BIO_MAX_LEN} characters"
                )));
            }
        }
        self.user_repo.update_details(me, &details).await?;
        Ok(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_impl::RealRelationshipService;
    use crate::domain_port::{NewUser, TxManager};
    use crate::infra_memory::*;
    use chrono::NaiveDate;

    async fn seed(store: &MemoryStore, tx_manager: &MemoryTxManager, name: &str) -> UserId {
        let user_id = UserId::new_v4();
        let mut tx = tx_manager.begin().await.unwrap();
        UserRepo::create_in_tx(
            store,
            &mut *tx,
            &NewUser {
                user_id,
                username: name.to_string(),
                email: format!("{name}@example.com"),
                first_name: name.to_string(),
                last_name: "tester".to_string(),
                picture: DEFAULT_PICTURE.to_string(),
                gender: "male".to_string(),
                birth_date: NaiveDate::from_ymd_opt(1988, 3, 4).unwrap(),
            },
        )
        .await
        .unwrap();
        tx.commit().await.unwrap();
        user_id
    }

    #[tokio::test]
    async fn profile_reports_viewer_relationship_and_counts() {
        let store = Arc::new(MemoryStore::new());
        let tx_manager = Arc::new(MemoryTxManager::new());
        let users = RealUserService::new(store.clone(), store.clone());
        let relations =
            RealRelationshipService::new(store.clone(), store.clone(), tx_manager.clone());
        let ann = seed(&store, &tx_manager, "ann").await;
        let ben = seed(&store, &tx_manager, "ben").await;

        relations.send_request(ann, ben).await.unwrap();

        let view = users.get_profile(ann, "ben").await.unwrap();
        assert!(view.relationship.request_sent);
        assert!(view.relationship.following);
        assert_eq!(view.follower_count, 1);
        assert_eq!(view.friend_count, 0);

        let own = users.get_profile(ann, "ann").await.unwrap();
        assert_eq!(own.relationship, RelationshipStatus::unrelated());
        assert_eq!(own.following_count, 1);

        assert!(matches!(
            users.get_profile(ann, "nobody").await,
            Err(UserError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn details_are_normalized_and_bounded() {
        let store = Arc::new(MemoryStore::new());
        let tx_manager = MemoryTxManager::new();
        let users = RealUserService::new(store.clone(), store.clone());
        let ann = seed(&store, &tx_manager, "ann").await;

        let saved = users
            .update_details(
                ann,
                ProfileDetails {
                    bio: Some("  hello  ".to_string()),
                    job: Some("   ".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(saved.bio.as_deref(), Some("hello"));
        assert_eq!(saved.job, None);
        assert_eq!(users.get_profile(ann, "ann").await.unwrap().details, saved);

        let too_long = ProfileDetails {
            bio: Some("b".repeat(BIO_MAX_LEN + 1)),
            ..Default::default()
        };
        assert!(matches!(
            users.update_details(ann, too_long).await,
            Err(UserError::InvalidInput(_))
        ));

        let found = users.find_user("ANN@example.com").await.unwrap();
        assert_eq!(found.email, "ann@example.com");
        assert_eq!(users.resolve_username("ann").await.unwrap(), ann);
    }
}
