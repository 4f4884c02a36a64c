use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::client_service::{self, ClientFields};
use super::validation::{double_option, merge_text, merge_value, normalize_email, Validator};
use super::ServiceError;
use crate::database::models::{Client, ClientStatus, Lead, LeadStatus};
use crate::database::Repository;
use crate::filter::{ListParams, Page};

#[derive(Debug, Default, Deserialize)]
pub struct LeadInput {
    pub name: Option<String>,
    pub company: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub source: Option<String>,
    pub status: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub estimated_value: Option<Option<Decimal>>,
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub assigned_to: Option<Option<Uuid>>,
}

#[derive(Debug)]
struct LeadFields {
    name: String,
    company: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    source: Option<String>,
    status: LeadStatus,
    estimated_value: Option<Decimal>,
    notes: Option<String>,
    assigned_to: Option<Uuid>,
}

impl LeadFields {
    fn merge(input: LeadInput, current: Option<&Lead>) -> (Self, Validator) {
        let mut v = Validator::new();
        let name = match (input.name.as_deref(), current) {
            (None, Some(c)) => c.name.clone(),
            (name, _) => v.required("name", name),
        };
        let email = merge_text(input.email, current.and_then(|c| c.email.as_ref())).map(|e| normalize_email(&e));
        v.email("email", email.as_deref());
        let status = v.choice("status", input.status.as_deref(), current.map(|c| c.status).unwrap_or(LeadStatus::New));
        let estimated_value = merge_value(input.estimated_value, current.and_then(|c| c.estimated_value.as_ref()));
        v.non_negative("estimated_value", estimated_value);

        let fields = Self {
            name,
            company: merge_text(input.company, current.and_then(|c| c.company.as_ref())),
            email,
            phone: merge_text(input.phone, current.and_then(|c| c.phone.as_ref())),
            source: merge_text(input.source, current.and_then(|c| c.source.as_ref())),
            status,
            estimated_value,
            notes: merge_text(input.notes, current.and_then(|c| c.notes.as_ref())),
            assigned_to: merge_value(input.assigned_to, current.and_then(|c| c.assigned_to.as_ref())),
        };
        (fields, v)
    }
}

/// Result of converting a lead: the updated lead and the client created from it.
#[derive(Debug, Serialize)]
pub struct Conversion {
    pub lead: Lead,
    pub client: Client,
}

pub struct LeadService {
    pool: PgPool,
}

impl LeadService {
    pub fn new() -> Result<Self, ServiceError> {
        Ok(Self::with_pool(super::pool()?))
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    fn repo(&self) -> Repository<Lead> {
        Repository::new(self.pool.clone())
    }

    pub async fn list(&self, params: ListParams) -> Result<Page<Lead>, ServiceError> {
        Ok(self.repo().select_page(params).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<Lead, ServiceError> {
        Ok(self.repo().select_404(id).await?)
    }

    pub async fn create(&self, input: LeadInput) -> Result<Lead, ServiceError> {
        let (fields, mut v) = LeadFields::merge(input, None);
        self.check_assignee(&mut v, fields.assigned_to).await?;
        v.finish()?;

        let lead = sqlx::query_as::<_, Lead>(
            r#"
            INSERT INTO leads (name, company, email, phone, source, status, estimated_value, notes, assigned_to)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(&fields.name)
        .bind(&fields.company)
        .bind(&fields.email)
        .bind(&fields.phone)
        .bind(&fields.source)
        .bind(fields.status.as_str())
        .bind(fields.estimated_value)
        .bind(&fields.notes)
        .bind(fields.assigned_to)
        .fetch_one(&self.pool)
        .await?;
        tracing::info!(lead_id = %lead.id, "Created lead");
        Ok(lead)
    }

    pub async fn update(&self, id: Uuid, patch: LeadInput) -> Result<Lead, ServiceError> {
        let current = self.get(id).await?;
        let (fields, mut v) = LeadFields::merge(patch, Some(&current));
        if fields.assigned_to != current.assigned_to {
            self.check_assignee(&mut v, fields.assigned_to).await?;
        }
        v.finish()?;

        let lead = sqlx::query_as::<_, Lead>(
            r#"
            UPDATE leads
               SET name = $2, company = $3, email = $4, phone = $5, source = $6, status = $7,
                   estimated_value = $8, notes = $9, assigned_to = $10, updated_at = now()
             WHERE id = $1
         RETURNING *
            "#,
        )
        .bind(id)
        .bind(&fields.name)
        .bind(&fields.company)
        .bind(&fields.email)
        .bind(&fields.phone)
        .bind(&fields.source)
        .bind(fields.status.as_str())
        .bind(fields.estimated_value)
        .bind(&fields.notes)
        .bind(fields.assigned_to)
        .fetch_one(&self.pool)
        .await?;
        Ok(lead)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        self.repo().delete_by_id(id).await?;
        tracing::info!(lead_id = %id, "Deleted lead");
        Ok(())
    }

    /// Creates a client from the lead and marks the lead won, atomically.
    pub async fn convert(&self, id: Uuid) -> Result<Conversion, ServiceError> {
        let mut tx = self.pool.begin().await?;

        let lead = sqlx::query_as::<_, Lead>("SELECT * FROM leads WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Lead not found".to_string()))?;

        if lead.converted_client_id.is_some() {
            return Err(ServiceError::InvalidState("Lead has already been converted".to_string()));
        }
        if lead.status == LeadStatus::Lost {
            return Err(ServiceError::InvalidState("A lost lead cannot be converted".to_string()));
        }

        let client = client_service::insert(&mut *tx, &client_fields(&lead)).await?;

        let lead = sqlx::query_as::<_, Lead>(
            r#"
            UPDATE leads
               SET status = $2, converted_client_id = $3, updated_at = now()
             WHERE id = $1
         RETURNING *
            "#,
        )
        .bind(id)
        .bind(LeadStatus::Won.as_str())
        .bind(client.id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(lead_id = %lead.id, client_id = %client.id, "Converted lead to client");
        Ok(Conversion { lead, client })
    }

    async fn check_assignee(&self, v: &mut Validator, assigned_to: Option<Uuid>) -> Result<(), ServiceError> {
        if let Some(user_id) = assigned_to {
            let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
            if !exists {
                v.add("assigned_to", "user does not exist");
            }
        }
        Ok(())
    }
}

fn client_fields(lead: &Lead) -> ClientFields {
    ClientFields {
        name: lead.company.clone().unwrap_or_else(|| lead.name.clone()),
        company: lead.company.clone(),
        email: lead.email.clone(),
        phone: lead.phone.clone(),
        address: None,
        gst_number: None,
        notes: lead.notes.clone(),
        status: ClientStatus::Active,
    }
}
