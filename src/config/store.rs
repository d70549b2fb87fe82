use crate::core::{AppError, Result};
use crate::modules::store::{NocoDbClient, RecordIdField};
use serde::Deserialize;
use std::env;

use super::{env_or, parse_env};

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub base_url: String,
    pub token: String,
    /// Database holding deals, programs and customers
    pub main_db: String,
    /// Database holding generated payment links
    pub data_db: String,
    pub page_size: u32,
    pub max_retries: u32,
    pub schema: StoreSchema,
}

/// Table and column names of the operator's record store
#[derive(Debug, Clone, Deserialize)]
pub struct StoreSchema {
    pub deals_table: String,
    pub deal_number_field: String,
    pub total_price_field: String,
    pub pay_by_field: String,
    pub plan_field: String,
    pub program_field: String,
    pub customer_field: String,
    pub programs_table: String,
    pub program_name_field: String,
    pub program_item_code_field: String,
    pub program_start_field: String,
    pub customers_table: String,
    pub customer_name_field: String,
    pub customer_phone_field: String,
    pub customer_email_field: String,
    pub links_table: String,
}

impl Default for StoreSchema {
    fn default() -> Self {
        Self {
            deals_table: "Deals".to_string(),
            deal_number_field: "Deal number".to_string(),
            total_price_field: "Amount due".to_string(),
            pay_by_field: "Pay by".to_string(),
            plan_field: "Installments".to_string(),
            program_field: "Program".to_string(),
            customer_field: "Customer".to_string(),
            programs_table: "Programs".to_string(),
            program_name_field: "Name".to_string(),
            program_item_code_field: "Article".to_string(),
            program_start_field: "Start".to_string(),
            customers_table: "Customers".to_string(),
            customer_name_field: "Name".to_string(),
            customer_phone_field: "Phone".to_string(),
            customer_email_field: "Email".to_string(),
            links_table: "Links".to_string(),
        }
    }
}

impl StoreSchema {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            deals_table: env_or("STORE_DEALS_TABLE", &d.deals_table),
            deal_number_field: env_or("STORE_DEAL_NUMBER_FIELD", &d.deal_number_field),
            total_price_field: env_or("STORE_TOTAL_PRICE_FIELD", &d.total_price_field),
            pay_by_field: env_or("STORE_PAY_BY_FIELD", &d.pay_by_field),
            plan_field: env_or("STORE_PLAN_FIELD", &d.plan_field),
            program_field: env_or("STORE_PROGRAM_FIELD", &d.program_field),
            customer_field: env_or("STORE_CUSTOMER_FIELD", &d.customer_field),
            programs_table: env_or("STORE_PROGRAMS_TABLE", &d.programs_table),
            program_name_field: env_or("STORE_PROGRAM_NAME_FIELD", &d.program_name_field),
            program_item_code_field: env_or(
                "STORE_PROGRAM_ITEM_CODE_FIELD",
                &d.program_item_code_field,
            ),
            program_start_field: env_or("STORE_PROGRAM_START_FIELD", &d.program_start_field),
            customers_table: env_or("STORE_CUSTOMERS_TABLE", &d.customers_table),
            customer_name_field: env_or("STORE_CUSTOMER_NAME_FIELD", &d.customer_name_field),
            customer_phone_field: env_or("STORE_CUSTOMER_PHONE_FIELD", &d.customer_phone_field),
            customer_email_field: env_or("STORE_CUSTOMER_EMAIL_FIELD", &d.customer_email_field),
            links_table: env_or("STORE_LINKS_TABLE", &d.links_table),
        }
    }
}

impl StoreConfig {
    pub fn from_env() -> Result<Self> {
        Ok(StoreConfig {
            base_url: env::var("STORE_BASE_URL")
                .map_err(|_| AppError::Configuration("STORE_BASE_URL not set".to_string()))?,
            token: env::var("STORE_TOKEN")
                .map_err(|_| AppError::Configuration("STORE_TOKEN not set".to_string()))?,
            main_db: env::var("STORE_MAIN_DB")
                .map_err(|_| AppError::Configuration("STORE_MAIN_DB not set".to_string()))?,
            data_db: env::var("STORE_DATA_DB")
                .map_err(|_| AppError::Configuration("STORE_DATA_DB not set".to_string()))?,
            page_size: parse_env("STORE_PAGE_SIZE", 100)?,
            max_retries: parse_env("STORE_MAX_RETRIES", 3)?,
            schema: StoreSchema::from_env(),
        })
    }

    /// Client for the deals database (records keyed by `ncRecordId`)
    pub fn main_client(&self) -> Result<NocoDbClient> {
        NocoDbClient::new(self, &self.main_db, RecordIdField::NcRecordId)
    }

    /// Client for the links database (records keyed by `Id`)
    pub fn data_client(&self) -> Result<NocoDbClient> {
        NocoDbClient::new(self, &self.data_db, RecordIdField::Id)
    }

    /// Scheme and host of the store, used for operator deep links
    pub fn dashboard_origin(&self) -> Option<String> {
        let url = reqwest::Url::parse(&self.base_url).ok()?;
        let host = url.host_str()?;
        Some(format!("{}://{}", url.scheme(), host))
    }
}
