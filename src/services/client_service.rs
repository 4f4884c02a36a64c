use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::validation::{merge_text, normalize_email, Validator};
use super::ServiceError;
use crate::database::models::{Client, ClientStatus};
use crate::database::Repository;
use crate::filter::{ListParams, Page};

/// Body of POST and PUT/PATCH; absent fields keep their current value.
#[derive(Debug, Default, Deserialize)]
pub struct ClientInput {
    pub name: Option<String>,
    pub company: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub gst_number: Option<String>,
    pub notes: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug)]
pub(crate) struct ClientFields {
    pub name: String,
    pub company: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub gst_number: Option<String>,
    pub notes: Option<String>,
    pub status: ClientStatus,
}

impl ClientFields {
    pub(crate) fn merge(input: ClientInput, current: Option<&Client>) -> Result<Self, ServiceError> {
        let mut v = Validator::new();
        let name = match (input.name.as_deref(), current) {
            (None, Some(c)) => c.name.clone(),
            (name, _) => v.required("name", name),
        };
        let email = merge_text(input.email, current.and_then(|c| c.email.as_ref())).map(|e| normalize_email(&e));
        v.email("email", email.as_deref());
        let status = v.choice(
            "status",
            input.status.as_deref(),
            current.map(|c| c.status).unwrap_or(ClientStatus::Active),
        );
        v.finish()?;

        Ok(Self {
            name,
            company: merge_text(input.company, current.and_then(|c| c.company.as_ref())),
            email,
            phone: merge_text(input.phone, current.and_then(|c| c.phone.as_ref())),
            address: merge_text(input.address, current.and_then(|c| c.address.as_ref())),
            gst_number: merge_text(input.gst_number, current.and_then(|c| c.gst_number.as_ref())),
            notes: merge_text(input.notes, current.and_then(|c| c.notes.as_ref())),
            status,
        })
    }
}

pub struct ClientService {
    pool: PgPool,
}

impl ClientService {
    pub fn new() -> Result<Self, ServiceError> {
        Ok(Self::with_pool(super::pool()?))
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    fn repo(&self) -> Repository<Client> {
        Repository::new(self.pool.clone())
    }

    pub async fn list(&self, params: ListParams) -> Result<Page<Client>, ServiceError> {
        Ok(self.repo().select_page(params).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<Client, ServiceError> {
        Ok(self.repo().select_404(id).await?)
    }

    pub async fn create(&self, input: ClientInput) -> Result<Client, ServiceError> {
        let fields = ClientFields::merge(input, None)?;
        let client = insert(&self.pool, &fields).await?;
        tracing::info!(client_id = %client.id, "Created client");
        Ok(client)
    }

    pub async fn update(&self, id: Uuid, patch: ClientInput) -> Result<Client, ServiceError> {
        let current = self.get(id).await?;
        let fields = ClientFields::merge(patch, Some(&current))?;
        let client = sqlx::query_as::<_, Client>(
            r#"
            UPDATE clients
               SET name = $2, company = $3, email = $4, phone = $5, address = $6,
                   gst_number = $7, notes = $8, status = $9, updated_at = now()
             WHERE id = $1
         RETURNING *
            "#,
        )
        .bind(id)
        .bind(&fields.name)
        .bind(&fields.company)
        .bind(&fields.email)
        .bind(&fields.phone)
        .bind(&fields.address)
        .bind(&fields.gst_number)
        .bind(&fields.notes)
        .bind(fields.status.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(client)
    }

    /// Clients referenced by projects, invoices or payments cannot be deleted (409).
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        self.repo().delete_by_id(id).await?;
        tracing::info!(client_id = %id, "Deleted client");
        Ok(())
    }
}

/// Inserts a client on any executor, so lead conversion can do it inside
/// its transaction.
pub(crate) async fn insert<'e, E>(executor: E, fields: &ClientFields) -> Result<Client, ServiceError>
where
    E: sqlx::Executor<'e, Database = sqlx::Postgres>,
{
    let client = sqlx::query_as::<_, Client>(
        r#"
        INSERT INTO clients (name, company, email, phone, address, gst_number, notes, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(&fields.name)
    .bind(&fields.company)
    .bind(&fields.email)
    .bind(&fields.phone)
    .bind(&fields.address)
    .bind(&fields.gst_number)
    .bind(&fields.notes)
    .bind(fields.status.as_str())
    .fetch_one(executor)
    .await?;
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn existing() -> Client {
        let now = Utc::now();
        Client {
            id: Uuid::new_v4(),
            name: "Acme Foods".into(),
            company: Some("Acme Foods Pvt Ltd".into()),
            email: Some("accounts@acme.in".into()),
            phone: None,
            address: None,
            gst_number: None,
            notes: None,
            status: ClientStatus::Prospect,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn create_requires_name_and_defaults_to_active() {
        let err = ClientFields::merge(ClientInput::default(), None).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref e) if e.contains_key("name")));

        let fields = ClientFields::merge(
            ClientInput { name: Some("Zen Apparel".into()), email: Some(" Hello@Zen.IN ".into()), ..Default::default() },
            None,
        )
        .unwrap();
        assert_eq!(fields.status, ClientStatus::Active);
        assert_eq!(fields.email.as_deref(), Some("hello@zen.in"));
    }

    #[test]
    fn patch_keeps_unspecified_fields() {
        let current = existing();
        let fields = ClientFields::merge(
            ClientInput { status: Some("active".into()), company: Some(String::new()), ..Default::default() },
            Some(&current),
        )
        .unwrap();
        assert_eq!(fields.name, "Acme Foods");
        assert_eq!(fields.email.as_deref(), Some("accounts@acme.in"));
        assert_eq!(fields.company, None);
        assert_eq!(fields.status, ClientStatus::Active);
    }

    #[test]
    fn reports_every_bad_field() {
        let err = ClientFields::merge(
            ClientInput { email: Some("nope".into()), status: Some("vip".into()), ..Default::default() },
            None,
        )
        .unwrap_err();
        match err {
            ServiceError::Validation(errors) => {
                assert!(errors.contains_key("name"));
                assert!(errors.contains_key("email"));
                assert!(errors.contains_key("status"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
