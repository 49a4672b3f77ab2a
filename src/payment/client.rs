use bigdecimal::BigDecimal;
use failsafe::futures::CircuitBreaker as FuturesCircuitBreaker;
use failsafe::{backoff, failure_policy, Config, Error as FailsafeError, StateMachine};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Gateway rejected the request: {0}")]
    Rejected(String),
    #[error("Invalid response from gateway: {0}")]
    InvalidResponse(String),
    #[error("Circuit breaker open: {0}")]
    CircuitBreakerOpen(String),
}

/// Checkout-session request handed to the gateway. Amounts travel as
/// decimal strings on the wire.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutRequest {
    pub amount: BigDecimal,
    pub order_id: String,
    pub currency: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub customer_address: String,
    pub customer_city: String,
    pub client_ip: String,
}

/// Response from the gateway's checkout-creation endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub checkout_url: String,
    pub sp_order_id: String,
    #[serde(rename = "transactionStatus")]
    pub transaction_status: Option<String>,
}

/// One verification record as reported by the gateway. The verification
/// endpoint returns an array; only the first element is meaningful.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationRecord {
    #[serde(default)]
    pub bank_status: String,
    #[serde(default)]
    pub sp_code: String,
    #[serde(default)]
    pub sp_message: String,
    #[serde(default)]
    pub transaction_status: String,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub date_time: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
}

/// HTTP client for the payment gateway: authenticates, creates checkout
/// sessions and verifies transactions by gateway order id.
#[derive(Clone)]
pub struct PaymentClient {
    client: Client,
    base_url: String,
    username: String,
    password: String,
    return_url: String,
    circuit_breaker: StateMachine<failure_policy::ConsecutiveFailures<backoff::EqualJittered>, ()>,
}

impl PaymentClient {
    pub fn new(base_url: String, username: String, password: String, return_url: String) -> Self {
        Self::with_circuit_breaker(base_url, username, password, return_url, 3, 60)
    }

    /// Creates a client with custom circuit breaker configuration.
    pub fn with_circuit_breaker(
        base_url: String,
        username: String,
        password: String,
        return_url: String,
        failure_threshold: u32,
        reset_timeout_secs: u64,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        let backoff = backoff::equal_jittered(
            Duration::from_secs(reset_timeout_secs),
            Duration::from_secs(reset_timeout_secs * 2),
        );
        let policy = failure_policy::consecutive_failures(failure_threshold, backoff);
        let circuit_breaker = Config::new().failure_policy(policy).build();

        PaymentClient {
            client,
            base_url,
            username,
            password,
            return_url,
            circuit_breaker,
        }
    }

    /// Returns the current state of the circuit breaker
    pub fn circuit_state(&self) -> String {
        if self.circuit_breaker.is_call_permitted() {
            "closed".to_string()
        } else {
            "open".to_string()
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn authenticate(
        client: &Client,
        token_url: &str,
        username: &str,
        password: &str,
    ) -> Result<TokenResponse, GatewayError> {
        let response = client
            .post(token_url)
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GatewayError::Rejected(format!(
                "authentication failed with status {}",
                response.status()
            )));
        }

        let token = response.json::<TokenResponse>().await?;
        if token.token.is_empty() {
            return Err(GatewayError::InvalidResponse(
                "empty authentication token".to_string(),
            ));
        }

        Ok(token)
    }

    /// Create a checkout session. The caller redirects the end user to the
    /// returned `checkout_url`.
    pub async fn create_checkout(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutResponse, GatewayError> {
        let client = self.client.clone();
        let token_url = self.endpoint("api/get_token");
        let pay_url = self.endpoint("api/secret-pay");
        let username = self.username.clone();
        let password = self.password.clone();
        let return_url = self.return_url.clone();
        let request = request.clone();

        let result = self
            .circuit_breaker
            .call(async move {
                let token = Self::authenticate(&client, &token_url, &username, &password).await?;

                let mut payload = serde_json::to_value(&request)
                    .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
                payload["return_url"] = json!(return_url);
                payload["cancel_url"] = json!(return_url);

                let response = client
                    .post(&pay_url)
                    .bearer_auth(token.token)
                    .json(&payload)
                    .send()
                    .await?;

                if !response.status().is_success() {
                    return Err(GatewayError::Rejected(format!(
                        "checkout creation failed with status {}",
                        response.status()
                    )));
                }

                let checkout = response.json::<CheckoutResponse>().await?;
                Ok(checkout)
            })
            .await;

        match result {
            Ok(checkout) => Ok(checkout),
            Err(FailsafeError::Rejected) => Err(GatewayError::CircuitBreakerOpen(
                "payment gateway circuit breaker is open".to_string(),
            )),
            Err(FailsafeError::Inner(e)) => Err(e),
        }
    }

    /// Verify a transaction by gateway order id. The gateway reports zero or
    /// more records; callers use the first.
    pub async fn verify(
        &self,
        sp_order_id: &str,
    ) -> Result<Vec<VerificationRecord>, GatewayError> {
        let client = self.client.clone();
        let token_url = self.endpoint("api/get_token");
        let verify_url = self.endpoint("api/verification");
        let username = self.username.clone();
        let password = self.password.clone();
        let sp_order_id = sp_order_id.to_string();

        let result = self
            .circuit_breaker
            .call(async move {
                let token = Self::authenticate(&client, &token_url, &username, &password).await?;

                let response = client
                    .post(&verify_url)
                    .bearer_auth(token.token)
                    .json(&json!({ "order_id": sp_order_id }))
                    .send()
                    .await?;

                if !response.status().is_success() {
                    return Err(GatewayError::Rejected(format!(
                        "verification failed with status {}",
                        response.status()
                    )));
                }

                let records = response.json::<Vec<VerificationRecord>>().await?;
                Ok(records)
            })
            .await;

        match result {
            Ok(records) => Ok(records),
            Err(FailsafeError::Rejected) => Err(GatewayError::CircuitBreakerOpen(
                "payment gateway circuit breaker is open".to_string(),
            )),
            Err(FailsafeError::Inner(e)) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(base_url: &str) -> PaymentClient {
        PaymentClient::new(
            base_url.to_string(),
            "merchant".to_string(),
            "secret".to_string(),
            "https://shop.example.com/orders/verify".to_string(),
        )
    }

    #[test]
    fn test_client_creation() {
        let client = test_client("https://sandbox.gateway.example.com");
        assert_eq!(client.base_url, "https://sandbox.gateway.example.com");
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let client = test_client("https://sandbox.gateway.example.com/");
        assert_eq!(
            client.endpoint("api/get_token"),
            "https://sandbox.gateway.example.com/api/get_token"
        );
    }

    #[test]
    fn test_circuit_breaker_state() {
        let client = test_client("https://sandbox.gateway.example.com");
        assert_eq!(client.circuit_state(), "closed");
    }

    #[test]
    fn test_custom_circuit_breaker_config() {
        let client = PaymentClient::with_circuit_breaker(
            "https://sandbox.gateway.example.com".to_string(),
            "merchant".to_string(),
            "secret".to_string(),
            "https://shop.example.com/orders/verify".to_string(),
            5,
            30,
        );
        assert_eq!(client.circuit_state(), "closed");
    }

    #[test]
    fn verification_record_defaults_missing_fields() {
        let record: VerificationRecord =
            serde_json::from_str(r#"{"bank_status":"Success"}"#).expect("valid record");
        assert_eq!(record.bank_status, "Success");
        assert_eq!(record.sp_code, "");
        assert_eq!(record.method, "");
    }
}
