use sqlx::PgPool;
use uuid::Uuid;

use crate::models::user::{Driver, NewUser, ProfileChanges, Role, User};
use crate::repositories::{StoreError, StoreResult};

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    user_id: i64,
    auth_user_id: Option<Uuid>,
    name: Option<String>,
    username: Option<String>,
    email: Option<String>,
    role_id: Option<i32>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = row
            .email
            .ok_or_else(|| StoreError::Decode(format!("users {} has no email", row.user_id)))?;
        let role_id = row
            .role_id
            .ok_or_else(|| StoreError::Decode(format!("users {} has no role_id", row.user_id)))?;

        Ok(User {
            user_id: row.user_id,
            auth_user_id: row.auth_user_id,
            name: row.name.unwrap_or_default(),
            username: row.username.unwrap_or_default(),
            email,
            role: Role::from_id(role_id),
        })
    }
}

const USER_COLUMNS: &str =
    "user_id::bigint AS user_id, auth_user_id, name, username, email, role_id::int AS role_id";

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_email(&self, email: &str) -> StoreResult<User> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1 LIMIT 1");

        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("users with email '{}'", email)))?;

        User::try_from(row)
    }

    pub async fn find_by_auth_id(&self, auth_user_id: Uuid) -> StoreResult<User> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE auth_user_id = $1 LIMIT 1");

        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(auth_user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("users with auth id '{}'", auth_user_id)))?;

        User::try_from(row)
    }

    pub async fn list_by_role(&self, role: Role) -> StoreResult<Vec<Driver>> {
        let rows: Vec<(i64, Option<String>)> = sqlx::query_as(
            "SELECT user_id::bigint, name FROM users WHERE role_id = $1 ORDER BY name",
        )
        .bind(role.id())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(user_id, name)| Driver {
                user_id,
                name: name.unwrap_or_default(),
            })
            .collect())
    }

    pub async fn create(&self, user: NewUser) -> StoreResult<User> {
        let sql = format!(
            r#"
            INSERT INTO users (auth_user_id, name, username, email, password, role_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(user.auth_user_id)
            .bind(&user.name)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role.id())
            .fetch_one(&self.pool)
            .await?;

        User::try_from(row)
    }

    pub async fn update_profile(&self, auth_user_id: Uuid, changes: ProfileChanges) -> StoreResult<User> {
        let sql = format!(
            r#"
            UPDATE users SET name = $2, username = $3, email = $4
            WHERE auth_user_id = $1
            RETURNING {USER_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(auth_user_id)
            .bind(&changes.name)
            .bind(&changes.username)
            .bind(&changes.email)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("users with auth id '{}'", auth_user_id)))?;

        User::try_from(row)
    }
}
