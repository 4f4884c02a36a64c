use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::validation::{double_option, merge_text, merge_value, Validator};
use super::ServiceError;
use crate::database::models::{Project, ProjectStatus};
use crate::database::Repository;
use crate::filter::{ListParams, Page};

#[derive(Debug, Default, Deserialize)]
pub struct ProjectInput {
    pub name: Option<String>,
    pub client_id: Option<Uuid>,
    pub description: Option<String>,
    pub status: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub start_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    pub end_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    pub budget: Option<Option<Decimal>>,
    pub people: Option<Vec<Uuid>>,
}

#[derive(Debug)]
struct ProjectFields {
    name: String,
    client_id: Uuid,
    description: Option<String>,
    status: ProjectStatus,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    budget: Option<Decimal>,
    people: Vec<Uuid>,
}

impl ProjectFields {
    fn merge(input: ProjectInput, current: Option<&Project>) -> (Self, Validator) {
        let mut v = Validator::new();
        let name = match (input.name.as_deref(), current) {
            (None, Some(c)) => c.name.clone(),
            (name, _) => v.required("name", name),
        };
        let client_id = v.required_id("client_id", input.client_id.or(current.map(|c| c.client_id)));
        let status = v.choice("status", input.status.as_deref(), current.map(|c| c.status).unwrap_or(ProjectStatus::Planning));
        let start_date = merge_value(input.start_date, current.and_then(|c| c.start_date.as_ref()));
        let end_date = merge_value(input.end_date, current.and_then(|c| c.end_date.as_ref()));
        v.date_order("end_date", start_date, end_date);
        let budget = merge_value(input.budget, current.and_then(|c| c.budget.as_ref()));
        v.non_negative("budget", budget);

        let mut people = input.people.or_else(|| current.map(|c| c.people.clone())).unwrap_or_default();
        // Keep first occurrence order, drop repeats
        let mut seen = std::collections::HashSet::new();
        people.retain(|id| seen.insert(*id));

        let fields = Self {
            name,
            client_id,
            description: merge_text(input.description, current.and_then(|c| c.description.as_ref())),
            status,
            start_date,
            end_date,
            budget,
            people,
        };
        (fields, v)
    }
}

pub struct ProjectService {
    pool: PgPool,
}

impl ProjectService {
    pub fn new() -> Result<Self, ServiceError> {
        Ok(Self::with_pool(super::pool()?))
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    fn repo(&self) -> Repository<Project> {
        Repository::new(self.pool.clone())
    }

    pub async fn list(&self, params: ListParams) -> Result<Page<Project>, ServiceError> {
        Ok(self.repo().select_page(params).await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<Project, ServiceError> {
        Ok(self.repo().select_404(id).await?)
    }

    pub async fn create(&self, input: ProjectInput) -> Result<Project, ServiceError> {
        let (f, mut v) = ProjectFields::merge(input, None);
        self.check_references(&mut v, &f).await?;
        v.finish()?;

        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (name, client_id, description, status, start_date, end_date, budget, people)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&f.name)
        .bind(f.client_id)
        .bind(&f.description)
        .bind(f.status.as_str())
        .bind(f.start_date)
        .bind(f.end_date)
        .bind(f.budget)
        .bind(&f.people)
        .fetch_one(&self.pool)
        .await?;
        tracing::info!(project_id = %project.id, client_id = %project.client_id, "Created project");
        Ok(project)
    }

    pub async fn update(&self, id: Uuid, patch: ProjectInput) -> Result<Project, ServiceError> {
        let current = self.get(id).await?;
        let (f, mut v) = ProjectFields::merge(patch, Some(&current));
        self.check_references(&mut v, &f).await?;
        v.finish()?;

        let project = sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
               SET name = $2, client_id = $3, description = $4, status = $5, start_date = $6,
                   end_date = $7, budget = $8, people = $9, updated_at = now()
             WHERE id = $1
         RETURNING *
            "#,
        )
        .bind(id)
        .bind(&f.name)
        .bind(f.client_id)
        .bind(&f.description)
        .bind(f.status.as_str())
        .bind(f.start_date)
        .bind(f.end_date)
        .bind(f.budget)
        .bind(&f.people)
        .fetch_one(&self.pool)
        .await?;
        Ok(project)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        Ok(self.repo().delete_by_id(id).await?)
    }

    async fn check_references(&self, v: &mut Validator, f: &ProjectFields) -> Result<(), ServiceError> {
        if !v.has("client_id") {
            let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM clients WHERE id = $1)")
                .bind(f.client_id)
                .fetch_one(&self.pool)
                .await?;
            if !exists {
                v.add("client_id", "client does not exist");
            }
        }
        if !f.people.is_empty() {
            let found: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM people WHERE id = ANY($1)")
                .bind(&f.people)
                .fetch_one(&self.pool)
                .await?;
            if found != f.people.len() as i64 {
                v.add("people", "contains people that do not exist");
            }
        }
        Ok(())
    }
}
