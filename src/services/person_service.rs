use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::validation::{double_option, merge_text, merge_value, normalize_email, Validator};
use super::ServiceError;
use crate::database::models::{Person, PersonStatus};
use crate::database::Repository;
use crate::filter::{ListParams, Page};

#[derive(Debug, Default, Deserialize)]
pub struct PersonInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub platform: Option<String>,
    pub handle: Option<String>,
    pub followers: Option<i64>,
    #[serde(default, deserialize_with = "double_option")]
    pub engagement_rate: Option<Option<Decimal>>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug)]
struct PersonFields {
    name: String,
    email: Option<String>,
    phone: Option<String>,
    platform: Option<String>,
    handle: Option<String>,
    followers: i64,
    engagement_rate: Option<Decimal>,
    category: Option<String>,
    location: Option<String>,
    notes: Option<String>,
    status: PersonStatus,
}

impl PersonFields {
    fn merge(input: PersonInput, current: Option<&Person>) -> Result<Self, ServiceError> {
        let mut v = Validator::new();
        let name = match (input.name.as_deref(), current) {
            (None, Some(c)) => c.name.clone(),
            (name, _) => v.required("name", name),
        };
        let email = merge_text(input.email, current.and_then(|c| c.email.as_ref())).map(|e| normalize_email(&e));
        v.email("email", email.as_deref());
        let followers = input.followers.or(current.map(|c| c.followers)).unwrap_or(0);
        if followers < 0 {
            v.add("followers", "must not be negative");
        }
        let engagement_rate = merge_value(input.engagement_rate, current.and_then(|c| c.engagement_rate.as_ref()));
        v.percentage("engagement_rate", engagement_rate);
        let status = v.choice("status", input.status.as_deref(), current.map(|c| c.status).unwrap_or(PersonStatus::Active));
        // Handles are stored without the leading @
        let handle = merge_text(input.handle, current.and_then(|c| c.handle.as_ref()))
            .map(|h| h.trim_start_matches('@').to_string())
            .filter(|h| !h.is_empty());
        v.finish()?;

        Ok(Self {
            name,
            email,
            phone: merge_text(input.phone, current.and_then(|c| c.phone.as_ref())),
            platform: merge_text(input.platform, current.and_then(|c| c.platform.as_ref())),
            handle,
            followers,
            engagement_rate,
            category: merge_text(input.category, current.and_then(|c| c.category.as_ref())),
            location: merge_text(input.location, current.and_then(|c| c.location.as_ref())),
            notes: merge_text(input.notes, current.and_then(|c| c.notes.as_ref())),
            status,
        })
    }
}

pub struct PersonService {
    pool: PgPool,
}

impl PersonService {
    pub fn new() -> Result<Self, ServiceError> {
        Ok(Self::with_pool(super::pool()?))
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    fn repo(&self) -> Repository<Person> {
        Repository::new(self.pool.clone())
    }

    pub async fn list(&self, params: ListParams) -> Result<Page<Person>, ServiceError> {
        Ok(self.repo().select_page(params).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<Person, ServiceError> {
        Ok(self.repo().select_404(id).await?)
    }

    pub async fn create(&self, input: PersonInput) -> Result<Person, ServiceError> {
        let f = PersonFields::merge(input, None)?;
        let person = sqlx::query_as::<_, Person>(
            r#"
            INSERT INTO people (name, email, phone, platform, handle, followers, engagement_rate,
                                category, location, notes, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(&f.name)
        .bind(&f.email)
        .bind(&f.phone)
        .bind(&f.platform)
        .bind(&f.handle)
        .bind(f.followers)
        .bind(f.engagement_rate)
        .bind(&f.category)
        .bind(&f.location)
        .bind(&f.notes)
        .bind(f.status.as_str())
        .fetch_one(&self.pool)
        .await?;
        tracing::info!(person_id = %person.id, "Created person");
        Ok(person)
    }

    pub async fn update(&self, id: Uuid, patch: PersonInput) -> Result<Person, ServiceError> {
        let current = self.get(id).await?;
        let f = PersonFields::merge(patch, Some(&current))?;
        let person = sqlx::query_as::<_, Person>(
            r#"
            UPDATE people
               SET name = $2, email = $3, phone = $4, platform = $5, handle = $6, followers = $7,
                   engagement_rate = $8, category = $9, location = $10, notes = $11, status = $12,
                   updated_at = now()
             WHERE id = $1
         RETURNING *
            "#,
        )
        .bind(id)
        .bind(&f.name)
        .bind(&f.email)
        .bind(&f.phone)
        .bind(&f.platform)
        .bind(&f.handle)
        .bind(f.followers)
        .bind(f.engagement_rate)
        .bind(&f.category)
        .bind(&f.location)
        .bind(&f.notes)
        .bind(f.status.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(person)
    }

    /// Removes the person, their rate cards, and their bookings on projects.
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("UPDATE projects SET people = array_remove(people, $1), updated_at = now() WHERE $1 = ANY(people)")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM people WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound("Person not found".to_string()));
        }
        tx.commit().await?;
        tracing::info!(person_id = %id, "Deleted person");
        Ok(())
    }
}
