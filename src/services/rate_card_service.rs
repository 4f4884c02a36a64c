use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::validation::{merge_text, Validator};
use super::ServiceError;
use crate::config;
use crate::database::models::RateCard;
use crate::database::Repository;
use crate::filter::{ListParams, Page};

#[derive(Debug, Default, Deserialize)]
pub struct RateCardInput {
    pub person_id: Option<Uuid>,
    pub platform: Option<String>,
    pub deliverable: Option<String>,
    pub rate: Option<Decimal>,
    pub currency: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug)]
struct RateCardFields {
    person_id: Uuid,
    platform: String,
    deliverable: String,
    rate: Decimal,
    currency: String,
    notes: Option<String>,
}

impl RateCardFields {
    fn merge(input: RateCardInput, current: Option<&RateCard>, default_currency: &str) -> (Self, Validator) {
        let mut v = Validator::new();
        let person_id = v.required_id("person_id", input.person_id.or(current.map(|c| c.person_id)));
        let platform = match (input.platform.as_deref(), current) {
            (None, Some(c)) => c.platform.clone(),
            (p, _) => v.required("platform", p),
        };
        let deliverable = match (input.deliverable.as_deref(), current) {
            (None, Some(c)) => c.deliverable.clone(),
            (d, _) => v.required("deliverable", d),
        };
        let rate = input.rate.or(current.map(|c| c.rate));
        if rate.is_none() {
            v.add("rate", "is required");
        }
        v.non_negative("rate", rate);
        let currency = input
            .currency
            .map(|c| c.trim().to_uppercase())
            .filter(|c| !c.is_empty())
            .or(current.map(|c| c.currency.clone()))
            .unwrap_or_else(|| default_currency.to_string());
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            v.add("currency", "must be a 3 letter currency code");
        }

        let fields = Self {
            person_id,
            platform,
            deliverable,
            rate: rate.unwrap_or_default(),
            currency,
            notes: merge_text(input.notes, current.and_then(|c| c.notes.as_ref())),
        };
        (fields, v)
    }
}

pub struct RateCardService {
    pool: PgPool,
}

impl RateCardService {
    pub fn new() -> Result<Self, ServiceError> {
        Ok(Self::with_pool(super::pool()?))
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    fn repo(&self) -> Repository<RateCard> {
        Repository::new(self.pool.clone())
    }

    pub async fn list(&self, params: ListParams) -> Result<Page<RateCard>, ServiceError> {
        Ok(self.repo().select_page(params).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<RateCard, ServiceError> {
        Ok(self.repo().select_404(id).await?)
    }

    pub async fn create(&self, input: RateCardInput) -> Result<RateCard, ServiceError> {
        let (f, mut v) = RateCardFields::merge(input, None, &config::config().billing.currency);
        self.check_person(&mut v, f.person_id).await?;
        v.finish()?;

        let card = sqlx::query_as::<_, RateCard>(
            r#"
            INSERT INTO rate_cards (person_id, platform, deliverable, rate, currency, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(f.person_id)
        .bind(&f.platform)
        .bind(&f.deliverable)
        .bind(f.rate)
        .bind(&f.currency)
        .bind(&f.notes)
        .fetch_one(&self.pool)
        .await?;
        Ok(card)
    }

    pub async fn update(&self, id: Uuid, patch: RateCardInput) -> Result<RateCard, ServiceError> {
        let current = self.get(id).await?;
        let (f, mut v) = RateCardFields::merge(patch, Some(&current), &config::config().billing.currency);
        if f.person_id != current.person_id {
            self.check_person(&mut v, f.person_id).await?;
        }
        v.finish()?;

        let card = sqlx::query_as::<_, RateCard>(
            r#"
            UPDATE rate_cards
               SET person_id = $2, platform = $3, deliverable = $4, rate = $5, currency = $6,
                   notes = $7, updated_at = now()
             WHERE id = $1
         RETURNING *
            "#,
        )
        .bind(id)
        .bind(f.person_id)
        .bind(&f.platform)
        .bind(&f.deliverable)
        .bind(f.rate)
        .bind(&f.currency)
        .bind(&f.notes)
        .fetch_one(&self.pool)
        .await?;
        Ok(card)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        Ok(self.repo().delete_by_id(id).await?)
    }

    async fn check_person(&self, v: &mut Validator, person_id: Uuid) -> Result<(), ServiceError> {
        if v.has("person_id") {
            return Ok(());
        }
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM people WHERE id = $1)")
            .bind(person_id)
            .fetch_one(&self.pool)
            .await?;
        if !exists {
            v.add("person_id", "person does not exist");
        }
        Ok(())
    }
}
