use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tracing::{debug, error, info, warn};

use super::gateway_trait::LinkGenerator;
use crate::config::GatewayConfig;
use crate::core::{dates, AppError, Result};
use crate::modules::gateways::models::{
    GatewayCredentials, GeneratedLink, LinkRequest, PaymentStatus,
};

/// Longest description the gateway accepts before the ellipsis
const MAX_DESCRIPTION_CHARS: usize = 247;

/// Gateway error code for a repeated order identifier
const DUPLICATE_ORDER_CODES: [&str; 1] = ["20"];

const DUPLICATE_ORDER_MARKERS: [&str; 4] = [
    "уже существует",
    "уже обработан",
    "already exists",
    "already processed",
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InitResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error_code: Value,
    #[serde(default)]
    payment_id: Value,
    #[serde(rename = "PaymentURL", default)]
    payment_url: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StateResponse {
    #[serde(default)]
    error_code: Value,
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    #[serde(alias = "Transaction")]
    transaction: Option<SessionTransaction>,
}

#[derive(Debug, Deserialize)]
struct SessionTransaction {
    #[serde(alias = "PaymentId", alias = "paymentId", default)]
    payment_id: Value,
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

/// Token is the SHA-256 of every top-level scalar value plus the password,
/// concatenated in key order.
pub fn sign_request(params: &BTreeMap<&str, String>, password: &str) -> String {
    let mut signed = params.clone();
    signed.insert("Password", password.to_string());
    let joined: String = signed.values().map(String::as_str).collect();

    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    hex::encode(hasher.finalize())
}

pub fn truncate_description(name: &str) -> String {
    if name.chars().count() > MAX_DESCRIPTION_CHARS {
        let head: String = name.chars().take(MAX_DESCRIPTION_CHARS).collect();
        format!("{}...", head)
    } else {
        name.to_string()
    }
}

fn is_duplicate_order(code: &str, message: &str) -> bool {
    DUPLICATE_ORDER_CODES.contains(&code)
        || DUPLICATE_ORDER_MARKERS
            .iter()
            .any(|marker| message.to_lowercase().contains(marker))
}

/// Client for a terminal/token style acquiring gateway
///
/// API: `Init` opens a checkout session, `GetState` reports its status and
/// the payment-form session endpoint maps a form token back to the payment id.
pub struct TerminalGatewayClient {
    client: Client,
    credentials: GatewayCredentials,
    base_url: String,
    session_url: String,
    success_url: String,
    fail_url: String,
    taxation: String,
    tax: String,
}

impl TerminalGatewayClient {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            client: Client::new(),
            credentials: config.credentials(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session_url: config.session_url.trim_end_matches('/').to_string(),
            success_url: config.success_url.clone(),
            fail_url: config.fail_url.clone(),
            taxation: config.taxation.clone(),
            tax: config.tax.clone(),
        }
    }

    fn init_body(&self, request: &LinkRequest) -> Result<Value> {
        let product = &request.product;
        let amount = product.amount_minor()?;
        let price = product.price_minor()?;

        let mut params: BTreeMap<&str, String> = BTreeMap::new();
        params.insert("TerminalKey", self.credentials.terminal_key.clone());
        params.insert("Amount", amount.to_string());
        params.insert("OrderId", request.order_id.clone());
        params.insert("Description", truncate_description(&product.name));
        params.insert("SuccessURL", self.success_url.clone());
        params.insert("FailURL", self.fail_url.clone());
        params.insert(
            "RedirectDueDate",
            dates::to_gateway_deadline(&request.expiration_date),
        );

        let token = sign_request(&params, &self.credentials.password);

        Ok(json!({
            "TerminalKey": params["TerminalKey"],
            "Amount": amount,
            "OrderId": params["OrderId"],
            "Description": params["Description"],
            "SuccessURL": params["SuccessURL"],
            "FailURL": params["FailURL"],
            "RedirectDueDate": params["RedirectDueDate"],
            "Token": token,
            "DATA": { "Phone": request.customer.phone },
            "Receipt": {
                "Email": request.customer.email,
                "Phone": request.customer.phone,
                "Taxation": self.taxation,
                "Items": [{
                    "Name": product.name,
                    "Price": price,
                    "Quantity": product.quantity,
                    "MeasurementUnit": product.measure,
                    "Amount": amount,
                    "PaymentMethod": request.payment_method.code(),
                    "PaymentObject": request.payment_object.code(),
                    "Tax": self.tax,
                }]
            }
        }))
    }

    async fn post<T: for<'de> Deserialize<'de>>(&self, method: &str, body: &Value) -> Result<T> {
        let url = format!("{}/{}", self.base_url, method);
        debug!(url = %url, "Calling payment gateway");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Gateway(format!("Gateway request to {} failed: {}", method, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            return Err(AppError::Gateway(format!(
                "Gateway {} returned {}: {}",
                method, status, error_body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Gateway(format!("Failed to parse gateway {} response: {}", method, e)))
    }
}

#[async_trait]
impl LinkGenerator for TerminalGatewayClient {
    async fn create_link(&self, request: &LinkRequest) -> Result<GeneratedLink> {
        info!(order_id = %request.order_id, "Creating payment link");

        let body = self.init_body(request)?;
        let response: InitResponse = self.post("Init", &body).await?;

        let code = value_text(&response.error_code);
        if !response.success || (!code.is_empty() && code != "0") {
            let detail = response
                .details
                .filter(|d| !d.is_empty())
                .or(response.message)
                .unwrap_or_else(|| format!("error code {}", code));

            if is_duplicate_order(&code, &detail) {
                warn!(order_id = %request.order_id, "Gateway rejected order id as already used");
                return Err(AppError::OrderConflict(detail));
            }

            error!(order_id = %request.order_id, code = %code, detail = %detail, "Gateway refused to create link");
            return Err(AppError::Gateway(detail));
        }

        let gateway_order_id = value_text(&response.payment_id);
        let url = response.payment_url.unwrap_or_default();
        if gateway_order_id.is_empty() || url.is_empty() {
            return Err(AppError::gateway(
                "Gateway accepted the order but returned no payment id or URL",
            ));
        }

        info!(order_id = %request.order_id, payment_ref = %gateway_order_id, "Payment link created");
        Ok(GeneratedLink {
            gateway_order_id,
            url,
        })
    }

    async fn get_status(
        &self,
        credentials: &GatewayCredentials,
        gateway_order_id: &str,
    ) -> Result<PaymentStatus> {
        if gateway_order_id.trim().is_empty() {
            return Err(AppError::validation("Payment reference is empty"));
        }

        let mut params: BTreeMap<&str, String> = BTreeMap::new();
        params.insert("TerminalKey", credentials.terminal_key.clone());
        params.insert("PaymentId", gateway_order_id.to_string());
        let token = sign_request(&params, &credentials.password);

        let body = json!({
            "TerminalKey": credentials.terminal_key,
            "PaymentId": gateway_order_id,
            "Token": token,
        });
        let response: StateResponse = self.post("GetState", &body).await?;

        let code = value_text(&response.error_code);
        if !code.is_empty() && code != "0" {
            let detail = response
                .details
                .filter(|d| !d.is_empty())
                .or(response.message)
                .unwrap_or_else(|| format!("error code {}", code));
            error!(payment_ref = %gateway_order_id, detail = %detail, "Gateway status request failed");
            return Err(AppError::Gateway(detail));
        }

        let status = PaymentStatus::from_gateway_code(&response.status);
        debug!(payment_ref = %gateway_order_id, status = %status, "Payment status resolved");
        Ok(status)
    }

    async fn get_session_info(&self, session_token: &str) -> Result<Option<String>> {
        let token = session_token.trim();
        if token.is_empty() {
            return Ok(None);
        }

        let url = format!("{}/{}", self.session_url, token);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::Gateway(format!("Session lookup failed: {}", e)))?;

        if !response.status().is_success() {
            warn!(session = %token, status = %response.status(), "Payment session not found");
            return Ok(None);
        }

        let session: SessionResponse = response
            .json()
            .await
            .map_err(|e| AppError::Gateway(format!("Failed to parse session response: {}", e)))?;

        Ok(session
            .transaction
            .map(|t| value_text(&t.payment_id))
            .filter(|id| !id.is_empty()))
    }

    fn name(&self) -> &str {
        "terminal"
    }
}
