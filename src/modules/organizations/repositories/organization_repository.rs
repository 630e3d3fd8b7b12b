use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::MySqlPool;
use std::str::FromStr;

use crate::core::{AppError, Currency, Result};
use crate::modules::organizations::models::{BankDetails, Organization};

/// Read-only access to organization settings
#[async_trait]
pub trait OrganizationRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Organization>>;
}

pub struct MySqlOrganizationRepository {
    pool: MySqlPool,
}

impl MySqlOrganizationRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrganizationRepository for MySqlOrganizationRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Organization>> {
        let row = sqlx::query_as::<_, OrganizationRow>(
            r#"
            SELECT id, name, currency, platform_fee_percentage,
                   bank_name, bank_account_name, bank_account_number,
                   created_at
            FROM organizations
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        row.map(OrganizationRow::into_organization).transpose()
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrganizationRow {
    id: String,
    name: String,
    currency: String,
    platform_fee_percentage: Decimal,
    bank_name: Option<String>,
    bank_account_name: Option<String>,
    bank_account_number: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl OrganizationRow {
    fn into_organization(self) -> Result<Organization> {
        let currency = Currency::from_str(&self.currency)
            .map_err(|e| AppError::internal(format!("Invalid currency in database: {}", e)))?;

        // Bank details are all-or-nothing; partially filled rows are treated
        // as unconfigured.
        let bank_details = match (self.bank_name, self.bank_account_name, self.bank_account_number)
        {
            (Some(bank_name), Some(account_name), Some(account_number)) => Some(BankDetails {
                bank_name,
                account_name,
                account_number,
            }),
            _ => None,
        };

        Ok(Organization {
            id: self.id,
            name: self.name,
            currency,
            platform_fee_percentage: self.platform_fee_percentage,
            bank_details,
            created_at: self.created_at,
        })
    }
}
