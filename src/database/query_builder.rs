use serde_json::Value;
use sqlx::{
    self,
    postgres::{PgArguments, PgRow},
    query::QueryAs,
    FromRow, Postgres,
};

use crate::database::manager::DatabaseError;
use crate::filter::types::SqlResult;
use crate::filter::{Filter, FilterData, ResourceSpec};

pub struct QueryBuilder<T> {
    filter: Filter,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> QueryBuilder<T>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    pub fn new(spec: &ResourceSpec) -> Result<Self, DatabaseError> {
        let filter = Filter::for_spec(spec).map_err(|e| DatabaseError::QueryError(e.to_string()))?;
        Ok(Self {
            filter,
            _phantom: std::marker::PhantomData,
        })
    }

    pub fn filter(mut self, filter_data: FilterData) -> Result<Self, DatabaseError> {
        self.filter
            .assign(filter_data)
            .map_err(|e| DatabaseError::QueryError(e.to_string()))?;
        Ok(self)
    }

    pub async fn select_all<'e, E>(self, executor: E) -> Result<Vec<T>, DatabaseError>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        let sql_result = self.sql_result()?;
        let rows = bind_params(sqlx::query_as::<_, T>(&sql_result.query), &sql_result.params)
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }

    pub async fn count<'e, E>(self, executor: E) -> Result<i64, DatabaseError>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        let sql_result = self
            .filter
            .to_count_sql()
            .map_err(|e| DatabaseError::QueryError(e.to_string()))?;

        let (count,) = bind_params(sqlx::query_as::<_, (i64,)>(&sql_result.query), &sql_result.params)
            .fetch_one(executor)
            .await?;
        Ok(count)
    }

    fn sql_result(&self) -> Result<SqlResult, DatabaseError> {
        self.filter
            .to_sql()
            .map_err(|e| DatabaseError::QueryError(e.to_string()))
    }
}

/// Binds compiled filter parameters in placeholder order. Rows and counts both
/// go through `query_as`, so this is the only place JSON values meet sqlx.
fn bind_params<'q, O>(
    mut q: QueryAs<'q, Postgres, O, PgArguments>,
    params: &'q [Value],
) -> QueryAs<'q, Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, PgRow>,
{
    for v in params {
        q = match v {
            Value::Null => q.bind(None::<String>),
            Value::Bool(b) => q.bind(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    q.bind(i)
                } else if let Some(f) = n.as_f64() {
                    q.bind(f)
                } else {
                    q.bind(n.to_string())
                }
            }
            Value::String(s) => q.bind(s),
            // Arrays are expanded into one placeholder per element by FilterWhere
            Value::Array(_) => q.bind(v.to_string()),
            Value::Object(_) => q.bind(v.clone()), // JSONB
        };
    }
    q
}
