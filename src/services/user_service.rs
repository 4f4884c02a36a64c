use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::validation::{normalize_email, Validator};
use super::ServiceError;
use crate::auth;
use crate::database::models::{Role, User};
use crate::database::Repository;
use crate::filter::{ListParams, Page};

const MIN_PASSWORD_LEN: usize = 8;
const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[derive(Debug, Default, Deserialize)]
pub struct UserInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug)]
struct UserFields {
    name: String,
    email: String,
    password: Option<String>,
    role: Role,
    is_active: bool,
}

impl UserFields {
    fn merge(input: UserInput, current: Option<&User>) -> (Self, Validator) {
        let mut v = Validator::new();
        let name = match (input.name.as_deref(), current) {
            (None, Some(c)) => c.name.clone(),
            (name, _) => v.required("name", name),
        };
        let email = match (input.email.as_deref(), current) {
            (None, Some(c)) => c.email.clone(),
            (email, _) => {
                let email = normalize_email(&v.required("email", email));
                if !v.has("email") {
                    v.email("email", Some(&email));
                }
                email
            }
        };
        let password = match (input.password, current) {
            (Some(p), _) => {
                v.min_len("password", &p, MIN_PASSWORD_LEN);
                Some(p)
            }
            (None, None) => {
                v.add("password", "is required");
                None
            }
            (None, Some(_)) => None,
        };
        let role = v.choice("role", input.role.as_deref(), current.map(|c| c.role).unwrap_or(Role::Staff));
        let is_active = input.is_active.or(current.map(|c| c.is_active)).unwrap_or(true);

        (Self { name, email, password, role, is_active }, v)
    }
}

async fn hash(password: String) -> Result<String, ServiceError> {
    Ok(tokio::task::spawn_blocking(move || auth::hash_password(&password)).await??)
}

async fn verify(password: String, hash: String) -> Result<bool, ServiceError> {
    Ok(tokio::task::spawn_blocking(move || auth::verify_password(&password, &hash)).await?)
}

pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new() -> Result<Self, ServiceError> {
        Ok(Self::with_pool(super::pool()?))
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    fn repo(&self) -> Repository<User> {
        Repository::new(self.pool.clone())
    }

    pub async fn list(&self, params: ListParams) -> Result<Page<User>, ServiceError> {
        Ok(self.repo().select_page(params).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<User, ServiceError> {
        Ok(self.repo().select_404(id).await?)
    }

    pub async fn create(&self, input: UserInput) -> Result<User, ServiceError> {
        let (f, mut v) = UserFields::merge(input, None);
        self.check_email_free(&mut v, &f.email, None).await?;
        v.finish()?;

        let password_hash = hash(f.password.unwrap_or_default()).await?;
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash, role, is_active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&f.name)
        .bind(&f.email)
        .bind(&password_hash)
        .bind(f.role.as_str())
        .bind(f.is_active)
        .fetch_one(&self.pool)
        .await?;
        tracing::info!(user_id = %user.id, role = %user.role, "Created user");
        Ok(user)
    }

    /// `actor` is the admin making the change; admins cannot lock themselves out.
    pub async fn update(&self, id: Uuid, patch: UserInput, actor: Uuid) -> Result<User, ServiceError> {
        let current = self.get(id).await?;
        let (f, mut v) = UserFields::merge(patch, Some(&current));
        if f.email != current.email {
            self.check_email_free(&mut v, &f.email, Some(id)).await?;
        }
        v.finish()?;

        if id == actor && (!f.is_active || f.role != current.role) {
            return Err(ServiceError::Forbidden(
                "You cannot change your own role or deactivate yourself".to_string(),
            ));
        }

        let password_hash = match f.password {
            Some(p) => hash(p).await?,
            None => current.password_hash.clone(),
        };
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
               SET name = $2, email = $3, password_hash = $4, role = $5, is_active = $6, updated_at = now()
             WHERE id = $1
         RETURNING *
            "#,
        )
        .bind(id)
        .bind(&f.name)
        .bind(&f.email)
        .bind(&password_hash)
        .bind(f.role.as_str())
        .bind(f.is_active)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn delete(&self, id: Uuid, actor: Uuid) -> Result<(), ServiceError> {
        if id == actor {
            return Err(ServiceError::Forbidden("You cannot delete your own account".to_string()));
        }
        // Leads assigned to the user fall back to unassigned via ON DELETE SET NULL
        self.repo().delete_by_id(id).await?;
        tracing::info!(user_id = %id, "Deleted user");
        Ok(())
    }

    /// Checks credentials and records the login. Unknown, inactive and
    /// wrong-password accounts all get the same answer.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, ServiceError> {
        let email = normalize_email(email);
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE lower(email) = $1")
            .bind(&email)
            .fetch_optional(&self.pool)
            .await?;

        let Some(user) = user.filter(|u| u.is_active) else {
            tracing::warn!(email = %email, "Login rejected: unknown or inactive account");
            return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        };
        if !verify(password.to_string(), user.password_hash.clone()).await? {
            tracing::warn!(user_id = %user.id, "Login rejected: wrong password");
            return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        let user = sqlx::query_as::<_, User>("UPDATE users SET last_login_at = now() WHERE id = $1 RETURNING *")
            .bind(user.id)
            .fetch_one(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn change_password(&self, id: Uuid, change: PasswordChange) -> Result<(), ServiceError> {
        let user = self.get(id).await?;
        let mut v = Validator::new();
        v.min_len("new_password", &change.new_password, MIN_PASSWORD_LEN);
        v.finish()?;

        if !verify(change.current_password, user.password_hash.clone()).await? {
            tracing::warn!(user_id = %id, "Password change rejected: wrong current password");
            return Err(ServiceError::field("current_password", "is incorrect"));
        }

        let password_hash = hash(change.new_password).await?;
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(&password_hash)
            .execute(&self.pool)
            .await?;
        tracing::info!(user_id = %id, "Changed password");
        Ok(())
    }

    async fn check_email_free(&self, v: &mut Validator, email: &str, except: Option<Uuid>) -> Result<(), ServiceError> {
        if v.has("email") {
            return Ok(());
        }
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM users WHERE lower(email) = lower($1) AND id IS DISTINCT FROM $2)",
        )
        .bind(email)
        .bind(except)
        .fetch_one(&self.pool)
        .await?;
        if taken {
            v.add("email", "is already registered");
        }
        Ok(())
    }
}
