use serde::Deserialize;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::validation::{merge_text, Validator};
use super::ServiceError;
use crate::database::models::PaymentTerm;
use crate::database::Repository;
use crate::filter::{ListParams, Page};

#[derive(Debug, Default, Deserialize)]
pub struct PaymentTermInput {
    pub name: Option<String>,
    pub due_days: Option<i32>,
    pub terms: Option<String>,
    pub is_default: Option<bool>,
}

#[derive(Debug)]
struct PaymentTermFields {
    name: String,
    due_days: i32,
    terms: Option<String>,
    is_default: bool,
}

impl PaymentTermFields {
    fn merge(input: PaymentTermInput, current: Option<&PaymentTerm>) -> Result<Self, ServiceError> {
        let mut v = Validator::new();
        let name = match (input.name.as_deref(), current) {
            (None, Some(c)) => c.name.clone(),
            (name, _) => v.required("name", name),
        };
        let due_days = input.due_days.or(current.map(|c| c.due_days));
        match due_days {
            None => v.add("due_days", "is required"),
            Some(d) if d < 0 => v.add("due_days", "must not be negative"),
            _ => {}
        }
        v.finish()?;

        Ok(Self {
            name,
            due_days: due_days.unwrap_or_default(),
            terms: merge_text(input.terms, current.and_then(|c| c.terms.as_ref())),
            is_default: input.is_default.or(current.map(|c| c.is_default)).unwrap_or(false),
        })
    }
}

pub struct PaymentTermService {
    pool: PgPool,
}

impl PaymentTermService {
    pub fn new() -> Result<Self, ServiceError> {
        Ok(Self::with_pool(super::pool()?))
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    fn repo(&self) -> Repository<PaymentTerm> {
        Repository::new(self.pool.clone())
    }

    pub async fn list(&self, params: ListParams) -> Result<Page<PaymentTerm>, ServiceError> {
        Ok(self.repo().select_page(params).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<PaymentTerm, ServiceError> {
        Ok(self.repo().select_404(id).await?)
    }

    pub async fn create(&self, input: PaymentTermInput) -> Result<PaymentTerm, ServiceError> {
        let f = PaymentTermFields::merge(input, None)?;
        let mut tx = self.pool.begin().await?;
        self.ensure_unique_name(&mut tx, &f.name, None).await?;
        if f.is_default {
            clear_default(&mut tx, None).await?;
        }
        let term = sqlx::query_as::<_, PaymentTerm>(
            r#"
            INSERT INTO payment_terms (name, due_days, terms, is_default)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&f.name)
        .bind(f.due_days)
        .bind(&f.terms)
        .bind(f.is_default)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(term)
    }

    pub async fn update(&self, id: Uuid, patch: PaymentTermInput) -> Result<PaymentTerm, ServiceError> {
        let current = self.get(id).await?;
        let f = PaymentTermFields::merge(patch, Some(&current))?;
        let mut tx = self.pool.begin().await?;
        self.ensure_unique_name(&mut tx, &f.name, Some(id)).await?;
        if f.is_default && !current.is_default {
            clear_default(&mut tx, Some(id)).await?;
        }
        let term = sqlx::query_as::<_, PaymentTerm>(
            r#"
            UPDATE payment_terms
               SET name = $2, due_days = $3, terms = $4, is_default = $5, updated_at = now()
             WHERE id = $1
         RETURNING *
            "#,
        )
        .bind(id)
        .bind(&f.name)
        .bind(f.due_days)
        .bind(&f.terms)
        .bind(f.is_default)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(term)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        Ok(self.repo().delete_by_id(id).await?)
    }

    /// The template marked `is_default`, if any.
    pub async fn default_term(&self) -> Result<Option<PaymentTerm>, ServiceError> {
        let term = sqlx::query_as::<_, PaymentTerm>("SELECT * FROM payment_terms WHERE is_default LIMIT 1")
            .fetch_optional(&self.pool)
            .await?;
        Ok(term)
    }

    async fn ensure_unique_name(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        name: &str,
        except: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM payment_terms WHERE lower(name) = lower($1) AND id IS DISTINCT FROM $2)",
        )
        .bind(name)
        .bind(except)
        .fetch_one(&mut **tx)
        .await?;
        if taken {
            return Err(ServiceError::field("name", "is already used by another payment terms template"));
        }
        Ok(())
    }
}

async fn clear_default(tx: &mut Transaction<'_, Postgres>, except: Option<Uuid>) -> Result<(), ServiceError> {
    sqlx::query("UPDATE payment_terms SET is_default = FALSE, updated_at = now() WHERE is_default AND id IS DISTINCT FROM $1")
        .bind(except)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn due_days_is_required_and_non_negative() {
        let err = PaymentTermFields::merge(PaymentTermInput { name: Some("Net 30".into()), ..Default::default() }, None).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref e) if e["due_days"] == "is required"));

        let err = PaymentTermFields::merge(
            PaymentTermInput { name: Some("Net -1".into()), due_days: Some(-1), ..Default::default() },
            None,
        )
        .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref e) if e.contains_key("due_days")));
    }

    #[test]
    fn not_default_unless_asked() {
        let f = PaymentTermFields::merge(
            PaymentTermInput { name: Some("Due on receipt".into()), due_days: Some(0), ..Default::default() },
            None,
        )
        .unwrap();
        assert!(!f.is_default);
        assert_eq!(f.due_days, 0);
    }
}
