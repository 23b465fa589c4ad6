use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// Users, credentials and relationship sets held in process memory.
#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<UserId, UserRecord>,
    credentials: DashMap<String, AuthCredentialsRecord>,
    accounts: DashMap<UserId, Account>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn find_user<P>(&self, pred: P) -> Option<UserRecord>
    where
        P: Fn(&UserRecord) -> bool,
    {
        self.users
            .iter()
            .find(|entry| pred(entry.value()))
            .map(|entry| entry.value().clone())
    }

    fn load_account(&self, user_id: UserId) -> Result<Account, RelationError> {
        self.accounts
            .get(&user_id)
            .map(|account| account.value().clone())
            .ok_or(RelationError::UserNotFound)
    }
}

#[async_trait::async_trait]
impl UserRepo for MemoryStore {
    async fn create_in_tx<'t>(
        &self,
        _tx: &mut dyn StorageTx<'t>,
        user: &NewUser,
    ) -> Result<(), AuthError> {
        // Same unique keys as the mysql `user` table. Callers hold the tx lock,
        // so nothing is inserted between these checks and the insert below.
        if self.users.contains_key(&user.user_id) {
            return Err(AuthError::Store(format!("duplicate user id {}", user.user_id)));
        }
        if self.find_user(|u| u.email == user.email).is_some() {
            return Err(AuthError::EmailTaken);
        }
        if self.find_user(|u| u.username == user.username).is_some() {
            return Err(AuthError::Store(format!("duplicate username {}", user.username)));
        }
        self.users.insert(
            user.user_id,
            UserRecord {
                user_id: user.user_id,
                username: user.username.clone(),
                email: user.email.clone(),
                first_name: user.first_name.clone(),
                last_name: user.last_name.clone(),
                picture: user.picture.clone(),
                cover: None,
                gender: user.gender.clone(),
                birth_date: user.birth_date,
                verified: false,
                details: ProfileDetails::default(),
                created_at: Utc::now(),
            },
        );
        self.accounts.insert(user.user_id, Account::new(user.user_id));
        Ok(())
    }

    async fn get_by_id(&self, user_id: UserId) -> Result<Option<UserRecord>, AuthError> {
        Ok(self.users.get(&user_id).map(|u| u.value().clone()))
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<UserRecord>, AuthError> {
        Ok(self.find_user(|u| u.username == username))
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<UserRecord>, AuthError> {
        Ok(self.find_user(|u| u.email == email))
    }

    async fn username_exists(&self, username: &str) -> Result<bool, AuthError> {
        Ok(self.users.iter().any(|u| u.username == username))
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AuthError> {
        Ok(self.users.iter().any(|u| u.email == email))
    }

    async fn id_exists(&self, user_id: UserId) -> Result<bool, AuthError> {
        Ok(self.users.contains_key(&user_id))
    }

    async fn set_verified(&self, user_id: UserId) -> Result<(), AuthError> {
        let mut user = self.users.get_mut(&user_id).ok_or(AuthError::UserNotFound)?;
        user.verified = true;
        Ok(())
    }

    async fn update_details(
        &self,
        user_id: UserId,
        details: &ProfileDetails,
    ) -> Result<(), AuthError> {
        let mut user = self.users.get_mut(&user_id).ok_or(AuthError::UserNotFound)?;
        user.details = details.clone();
        Ok(())
    }

    async fn get_summaries(&self, user_ids: &[UserId]) -> Result<Vec<UserSummary>, AuthError> {
        Ok(user_ids
            .iter()
            .filter_map(|id| self.users.get(id).map(|u| u.summary()))
            .collect())
    }
}

#[async_trait::async_trait]
impl AuthRepo for MemoryStore {
    async fn create_credentials_in_tx<'t>(
        &self,
        _tx: &mut dyn StorageTx<'t>,
        user_id: UserId,
        email: &str,
        password_hash: &str,
    ) -> Result<(), AuthError> {
        if !self.users.contains_key(&user_id) {
            return Err(AuthError::Store(format!("no user row for {user_id}")));
        }
        match self.credentials.entry(email.to_string()) {
            Entry::Occupied(_) => Err(AuthError::EmailTaken),
            Entry::Vacant(slot) => {
                slot.insert(AuthCredentialsRecord {
                    user_id,
                    email: email.to_string(),
                    password_hash: password_hash.to_string(),
                    is_active: true,
                    created_at: Utc::now(),
                });
                Ok(())
            }
        }
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<AuthCredentialsRecord>, AuthError> {
        Ok(self.credentials.get(email).map(|c| c.value().clone()))
    }

    async fn update_password_hash(
        &self,
        user_id: UserId,
        password_hash: &str,
    ) -> Result<(), AuthError> {
        let mut rec = self
            .credentials
            .iter_mut()
            .find(|c| c.user_id == user_id)
            .ok_or(AuthError::UserNotFound)?;
        rec.password_hash = password_hash.to_string();
        Ok(())
    }
}

#[async_trait::async_trait]
impl AccountRepo for MemoryStore {
    async fn find_by_id(&self, user_id: UserId) -> Result<Account, RelationError> {
        self.load_account(user_id)
    }

    async fn find_by_id_in_tx<'t>(
        &self,
        _tx: &mut dyn StorageTx<'t>,
        user_id: UserId,
    ) -> Result<Account, RelationError> {
        self.load_account(user_id)
    }

    async fn update_sets_in_tx<'t>(
        &self,
        _tx: &mut dyn StorageTx<'t>,
        user_id: UserId,
        update: &SetUpdate,
    ) -> Result<Account, RelationError> {
        let mut account = self
            .accounts
            .get_mut(&user_id)
            .ok_or(RelationError::UserNotFound)?;
        account.apply(update);
        Ok(account.value().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra_memory::MemoryTxManager;
    use chrono::NaiveDate;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            user_id: UserId::new_v4(),
            username: username.to_string(),
            email: email.to_string(),
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            picture: DEFAULT_PICTURE.to_string(),
            gender: "female".to_string(),
            birth_date: NaiveDate::from_ymd_opt(1995, 6, 15).unwrap(),
        }
    }

    #[tokio::test]
    async fn create_enforces_unique_email_and_username() {
        let store = MemoryStore::new();
        let tx_manager = MemoryTxManager::new();
        let mut tx = tx_manager.begin().await.unwrap();

        let jane = new_user("janedoe", "jane@example.com");
        UserRepo::create_in_tx(&store, tx.as_mut(), &jane).await.unwrap();
        AuthRepo::create_credentials_in_tx(&store, tx.as_mut(), jane.user_id, "jane@example.com", "h1")
            .await
            .unwrap();

        assert!(matches!(
            UserRepo::create_in_tx(&store, tx.as_mut(), &new_user("other", "jane@example.com")).await,
            Err(AuthError::EmailTaken)
        ));
        assert!(matches!(
            UserRepo::create_in_tx(&store, tx.as_mut(), &new_user("janedoe", "x@example.com")).await,
            Err(AuthError::Store(_))
        ));
        assert!(matches!(
            AuthRepo::create_credentials_in_tx(&store, tx.as_mut(), jane.user_id, "jane@example.com", "h2")
                .await,
            Err(AuthError::EmailTaken)
        ));
        tx.commit().await.unwrap();

        let creds = AuthRepo::get_by_email(&store, "jane@example.com").await.unwrap().unwrap();
        assert_eq!(creds.password_hash, "h1");
        assert!(!store.username_exists("other").await.unwrap());
    }
}
