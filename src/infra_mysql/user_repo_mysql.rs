use super::util::{downcast, dup_key_name};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, MySqlPool, QueryBuilder, Row};

const USER_COLUMNS: &str = "user_id, username, email, first_name, last_name, picture, cover, \
     gender, birth_date, verified, details, created_at";

pub struct MySqlUserRepo {
    pool: MySqlPool,
}

impl MySqlUserRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlUserRepo { pool }
    }

    fn row_to_record(row: MySqlRow) -> Result<UserRecord, AuthError> {
        let store = |e: sqlx::Error| AuthError::Store(e.to_string());

        let details: Option<String> = row.try_get("details").map_err(store)?;
        let details = match details {
            Some(json) => serde_json::from_str(&json)
                .map_err(|e| AuthError::Store(format!("decode details: {e}")))?,
            None => ProfileDetails::default(),
        };
        let birth_date: NaiveDate = row.try_get("birth_date").map_err(store)?;
        let created_at: DateTime<Utc> = row.try_get("created_at").map_err(store)?;

        Ok(UserRecord {
            user_id: row.try_get("user_id").map_err(store)?,
            username: row.try_get("username").map_err(store)?,
            email: row.try_get("email").map_err(store)?,
            first_name: row.try_get("first_name").map_err(store)?,
            last_name: row.try_get("last_name").map_err(store)?,
            picture: row.try_get("picture").map_err(store)?,
            cover: row.try_get("cover").map_err(store)?,
            gender: row.try_get("gender").map_err(store)?,
            birth_date,
            verified: row.try_get("verified").map_err(store)?,
            details,
            created_at,
        })
    }

    async fn fetch_one_by(&self, column: &str, value: &str) -> Result<Option<UserRecord>, AuthError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM user WHERE {column} = ? AND is_active = 1");
        let row_opt = sqlx::query(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AuthError::Store(format!("query user by {column}: {e}")))?;

        row_opt.map(Self::row_to_record).transpose()
    }

    async fn exists_by(&self, column: &str, value: &str) -> Result<bool, AuthError> {
        let sql = format!("SELECT COUNT(*) FROM user WHERE {column} = ?");
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(value)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(count > 0)
    }
}

#[async_trait::async_trait]
impl UserRepo for MySqlUserRepo {
    async fn create_in_tx<'t>(
        &self,
        tx: &mut dyn StorageTx<'t>,
        user: &NewUser,
    ) -> Result<(), AuthError> {
        let tx = downcast(tx);

        sqlx::query(
            r#"
INSERT INTO user (user_id, username, email, first_name, last_name, picture, gender, birth_date, verified, is_active)
VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0, 1)
"#,
        )
        .bind(user.user_id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.picture)
        .bind(&user.gender)
        .bind(user.birth_date)
        .execute(tx.conn())
        .await
        .map_err(|e| match dup_key_name(&e) {
            Some(key) if key.ends_with("uk_user_email") => AuthError::EmailTaken,
            _ => AuthError::Store(e.to_string()),
        })?;

        Ok(())
    }

    async fn get_by_id(&self, user_id: UserId) -> Result<Option<UserRecord>, AuthError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM user WHERE user_id = ? AND is_active = 1");
        let row_opt = sqlx::query(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AuthError::Store(format!("query user by id: {e}")))?;

        row_opt.map(Self::row_to_record).transpose()
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<UserRecord>, AuthError> {
        self.fetch_one_by("username", username).await
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<UserRecord>, AuthError> {
        self.fetch_one_by("email", email).await
    }

    async fn username_exists(&self, username: &str) -> Result<bool, AuthError> {
        self.exists_by("username", username).await
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AuthError> {
        self.exists_by("email", email).await
    }

    async fn id_exists(&self, user_id: UserId) -> Result<bool, AuthError> {
        let count: i64 = sqlx::query_scalar(
            r#"
SELECT COUNT(1)
FROM user
WHERE user_id = ? AND is_active = 1
"#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(count > 0)
    }

    async fn set_verified(&self, user_id: UserId) -> Result<(), AuthError> {
        let res = sqlx::query("UPDATE user SET verified = 1 WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AuthError::Store(format!("set verified: {e}")))?;

        if res.rows_affected() == 0 && !self.id_exists(user_id).await? {
            return Err(AuthError::UserNotFound);
        }
        Ok(())
    }

    async fn update_details(
        &self,
        user_id: UserId,
        details: &ProfileDetails,
    ) -> Result<(), AuthError> {
        let json = serde_json::to_string(details)
            .map_err(|e| AuthError::InternalError(format!("encode details: {e}")))?;
        let res = sqlx::query("UPDATE user SET details = ? WHERE user_id = ?")
            .bind(json)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AuthError::Store(format!("update details: {e}")))?;

        if res.rows_affected() == 0 && !self.id_exists(user_id).await? {
            return Err(AuthError::UserNotFound);
        }
        Ok(())
    }

    async fn get_summaries(&self, user_ids: &[UserId]) -> Result<Vec<UserSummary>, AuthError> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<MySql>::new(
            "SELECT user_id, username, first_name, last_name, picture FROM user WHERE user_id IN (",
        );
        let mut ids = qb.separated(", ");
        for id in user_ids {
            ids.push_bind(*id);
        }
        ids.push_unseparated(") ORDER BY username");

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AuthError::Store(format!("query summaries: {e}")))?;

        rows.into_iter()
            .map(|row| {
                let store = |e: sqlx::Error| AuthError::Store(e.to_string());
                Ok(UserSummary {
                    user_id: row.try_get("user_id").map_err(store)?,
                    username: row.try_get("username").map_err(store)?,
                    first_name: row.try_get("first_name").map_err(store)?,
                    last_name: row.try_get("last_name").map_err(store)?,
                    picture: row.try_get("picture").map_err(store)?,
                })
            })
            .collect()
    }
}
