use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug)]
pub enum Error {
    UnexpectedError,
}

/// An order handle obtained from the payment gateway, referenced by the
/// client when capturing the payment.
#[derive(Deserialize, Debug, Clone)]
pub struct GatewayOrder {
    pub id: String,
}

pub type DynPaymentGateway = Arc<dyn PaymentGateway + Send + Sync>;

#[async_trait]
pub trait PaymentGateway {
    /// `amount_minor` is the amount in minor currency units (paise for INR).
    async fn create_order(&self, amount_minor: i64, currency: &str) -> Result<GatewayOrder, Error>;
}

pub struct RazorpayGateway {
    api_endpoint: String,
    key_id: String,
    key_secret: String,
}

impl RazorpayGateway {
    pub fn new(api_endpoint: String, key_id: String, key_secret: String) -> Self {
        Self {
            api_endpoint,
            key_id,
            key_secret,
        }
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    async fn create_order(&self, amount_minor: i64, currency: &str) -> Result<GatewayOrder, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "Content-Type",
            "application/json"
                .try_into()
                .expect("Invalid content type header value"),
        );

        let res = reqwest::Client::new()
            .post(format!("{}/orders", self.api_endpoint))
            .basic_auth(self.key_id.clone(), Some(self.key_secret.clone()))
            .headers(headers)
            .body(
                json!({
                    "amount": amount_minor,
                    "currency": currency,
                    "payment_capture": 1,
                })
                .to_string(),
            )
            .send()
            .await
            .map_err(|err| {
                tracing::error!("Failed to send gateway order request: {}", err);
                Error::UnexpectedError
            })?;

        if !res.status().is_success() {
            tracing::error!(
                "Gateway order creation returned status {}",
                res.status()
            );
            return Err(Error::UnexpectedError);
        }

        res.json::<GatewayOrder>().await.map_err(|err| {
            tracing::error!("Failed to deserialize gateway order response: {}", err);
            Error::UnexpectedError
        })
    }
}
