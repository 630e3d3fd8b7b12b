use async_trait::async_trait;
use sqlx::MySqlPool;

use crate::core::{AppError, Result};
use crate::modules::audit::models::AuditEntry;

/// Append-only audit trail storage
#[async_trait]
pub trait AuditRepository: Send + Sync {
    async fn append(&self, entry: &AuditEntry) -> Result<()>;
}

pub struct MySqlAuditRepository {
    pool: MySqlPool,
}

impl MySqlAuditRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditRepository for MySqlAuditRepository {
    async fn append(&self, entry: &AuditEntry) -> Result<()> {
        let detail = serde_json::to_string(&entry.detail)?;

        sqlx::query(
            r#"
            INSERT INTO audit_log (id, actor, action, invoice_id, organization_id, detail, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.actor)
        .bind(entry.action.to_string())
        .bind(&entry.invoice_id)
        .bind(&entry.organization_id)
        .bind(detail)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(())
    }
}
