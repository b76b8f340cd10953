use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::repo_types::{NewSweet, Sweet, SweetPatch};
use crate::error::StoreError;

/// Persistence for sweets. Every stock mutation is an atomic
/// read-check-write on a single record.
#[async_trait]
pub trait SweetStore: Send + Sync {
    async fn insert(&self, new: NewSweet) -> Result<Sweet, StoreError>;
    /// All sweets ordered by creation time, then id.
    async fn list(&self) -> Result<Vec<Sweet>, StoreError>;
    async fn list_by_category(&self, category: &str) -> Result<Vec<Sweet>, StoreError>;
    /// Case-insensitive substring match on name or category.
    async fn search(&self, query: &str) -> Result<Vec<Sweet>, StoreError>;
    async fn get(&self, id: Uuid) -> Result<Option<Sweet>, StoreError>;
    async fn update(&self, id: Uuid, patch: SweetPatch) -> Result<Sweet, StoreError>;
    async fn delete(&self, id: Uuid) -> Result<Sweet, StoreError>;
    /// Decrements quantity by one; `OutOfStock` when it is already zero.
    async fn purchase(&self, id: Uuid) -> Result<Sweet, StoreError>;
    async fn restock(&self, id: Uuid, amount: i32) -> Result<Sweet, StoreError>;
}

/// Escapes `LIKE` metacharacters and wraps the query for a contains match.
pub(crate) fn contains_pattern(query: &str) -> String {
    let mut out = String::with_capacity(query.len() + 2);
    out.push('%');
    for c in query.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

#[derive(Clone)]
pub struct PgSweetStore {
    db: PgPool,
}

impl PgSweetStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn lock_row(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> Result<Sweet, StoreError> {
        sqlx::query_as::<_, Sweet>(
            r#"
            SELECT id, name, category, price, quantity, image_url, created_at
            FROM sweets
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(StoreError::NotFound)
    }

    async fn set_quantity(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        quantity: i32,
    ) -> Result<Sweet, StoreError> {
        let sweet = sqlx::query_as::<_, Sweet>(
            r#"
            UPDATE sweets
               SET quantity = $2
             WHERE id = $1
            RETURNING id, name, category, price, quantity, image_url, created_at
            "#,
        )
        .bind(id)
        .bind(quantity)
        .fetch_one(&mut **tx)
        .await?;
        Ok(sweet)
    }
}

#[async_trait]
impl SweetStore for PgSweetStore {
    async fn insert(&self, new: NewSweet) -> Result<Sweet, StoreError> {
        let sweet = sqlx::query_as::<_, Sweet>(
            r#"
            INSERT INTO sweets (id, name, category, price, quantity, image_url)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, category, price, quantity, image_url, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.name)
        .bind(&new.category)
        .bind(new.price)
        .bind(new.quantity)
        .bind(&new.image_url)
        .fetch_one(&self.db)
        .await?;
        Ok(sweet)
    }

    async fn list(&self) -> Result<Vec<Sweet>, StoreError> {
        let rows = sqlx::query_as::<_, Sweet>(
            r#"
            SELECT id, name, category, price, quantity, image_url, created_at
            FROM sweets
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn list_by_category(&self, category: &str) -> Result<Vec<Sweet>, StoreError> {
        let rows = sqlx::query_as::<_, Sweet>(
            r#"
            SELECT id, name, category, price, quantity, image_url, created_at
            FROM sweets
            WHERE category = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(category)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn search(&self, query: &str) -> Result<Vec<Sweet>, StoreError> {
        let rows = sqlx::query_as::<_, Sweet>(
            r#"
            SELECT id, name, category, price, quantity, image_url, created_at
            FROM sweets
            WHERE name ILIKE $1 ESCAPE '\' OR category ILIKE $1 ESCAPE '\'
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(contains_pattern(query))
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Sweet>, StoreError> {
        let row = sqlx::query_as::<_, Sweet>(
            r#"
            SELECT id, name, category, price, quantity, image_url, created_at
            FROM sweets
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn update(&self, id: Uuid, patch: SweetPatch) -> Result<Sweet, StoreError> {
        let mut tx = self.db.begin().await?;
        let mut sweet = Self::lock_row(&mut tx, id).await?;
        if patch.is_empty() {
            tx.commit().await?;
            return Ok(sweet);
        }
        patch.apply(&mut sweet);

        let updated = sqlx::query_as::<_, Sweet>(
            r#"
            UPDATE sweets
               SET name = $2, category = $3, price = $4, quantity = $5, image_url = $6
             WHERE id = $1
            RETURNING id, name, category, price, quantity, image_url, created_at
            "#,
        )
        .bind(id)
        .bind(&sweet.name)
        .bind(&sweet.category)
        .bind(sweet.price)
        .bind(sweet.quantity)
        .bind(&sweet.image_url)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> Result<Sweet, StoreError> {
        sqlx::query_as::<_, Sweet>(
            r#"
            DELETE FROM sweets
            WHERE id = $1
            RETURNING id, name, category, price, quantity, image_url, created_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(StoreError::NotFound)
    }

    async fn purchase(&self, id: Uuid) -> Result<Sweet, StoreError> {
        let mut tx = self.db.begin().await?;
        let current = Self::lock_row(&mut tx, id).await?;
        if current.quantity <= 0 {
            // dropping `tx` rolls back and releases the row lock
            return Err(StoreError::OutOfStock);
        }
        let sweet = Self::set_quantity(&mut tx, id, current.quantity - 1).await?;
        tx.commit().await?;
        Ok(sweet)
    }

    async fn restock(&self, id: Uuid, amount: i32) -> Result<Sweet, StoreError> {
        let mut tx = self.db.begin().await?;
        let current = Self::lock_row(&mut tx, id).await?;
        let quantity = current
            .quantity
            .checked_add(amount)
            .ok_or_else(|| StoreError::Invalid("Restock would overflow quantity".into()))?;
        let sweet = Self::set_quantity(&mut tx, id, quantity).await?;
        tx.commit().await?;
        Ok(sweet)
    }
}
