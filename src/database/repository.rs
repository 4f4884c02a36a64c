use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::{quote_identifier, DatabaseError};
use crate::database::models::Resource;
use crate::database::query_builder::QueryBuilder;
use crate::filter::{FilterData, ListParams, Page};

/// Generic read/delete access to one resource table.
pub struct Repository<T> {
    pool: PgPool,
    _phantom: std::marker::PhantomData<T>,
}

impl<T: Resource> Repository<T> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _phantom: std::marker::PhantomData,
        }
    }

    pub async fn select_any(&self, filter_data: FilterData) -> Result<Vec<T>, DatabaseError> {
        QueryBuilder::<T>::new(&T::SPEC)?
            .filter(filter_data)?
            .select_all(&self.pool)
            .await
    }

    /// One page of rows plus the total matching the same conditions.
    pub async fn select_page(&self, params: ListParams) -> Result<Page<T>, DatabaseError> {
        let count_filter = FilterData {
            where_clause: params.filter.where_clause.clone(),
            ..Default::default()
        };
        let (items, total) = futures::try_join!(
            self.select_any(params.filter.clone()),
            self.count(count_filter)
        )?;
        Ok(Page {
            items,
            page: params.page,
            limit: params.limit,
            total,
        })
    }

    pub async fn select_by_id(&self, id: Uuid) -> Result<Option<T>, DatabaseError> {
        let sql = format!("SELECT * FROM {} WHERE id = $1", quote_identifier(T::SPEC.table));
        let row = sqlx::query_as::<_, T>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn select_404(&self, id: Uuid) -> Result<T, DatabaseError> {
        self.select_by_id(id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("{} not found", T::SPEC.label)))
    }

    pub async fn count(&self, filter_data: FilterData) -> Result<i64, DatabaseError> {
        QueryBuilder::<T>::new(&T::SPEC)?
            .filter(filter_data)?
            .count(&self.pool)
            .await
    }

    pub async fn delete_by_id(&self, id: Uuid) -> Result<(), DatabaseError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", quote_identifier(T::SPEC.table));
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("{} not found", T::SPEC.label)));
        }
        Ok(())
    }
}
