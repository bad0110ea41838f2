use crate::error::{HotelError, Result};

pub const DEFAULT_PAYSTACK_API_URL: &str = "https://api.paystack.co";

/// Gateway credentials and endpoint, passed explicitly to whoever needs
/// them instead of being read lazily from a global.
#[derive(Debug, Clone)]
pub struct PaystackConfig {
    pub secret_key: String,
    pub api_url: String,
}

impl PaystackConfig {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            api_url: DEFAULT_PAYSTACK_API_URL.to_string(),
        }
    }

    /// Fails when the secret key is empty: signatures and API calls would
    /// be meaningless without it.
    pub fn ensure_configured(&self) -> Result<()> {
        if self.secret_key.is_empty() {
            return Err(HotelError::Configuration(
                "Paystack secret key is not configured".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Frontend base URL used to build the payment callback. `*` or unset
    /// falls back to the local development default.
    pub client_url: Option<String>,
    pub paystack: PaystackConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let client_url = std::env::var("CLIENT_URL").ok().filter(|u| u != "*");
        let secret_key = std::env::var("PAYSTACK_SECRET_KEY").unwrap_or_default();
        let api_url = std::env::var("PAYSTACK_API_URL")
            .unwrap_or_else(|_| DEFAULT_PAYSTACK_API_URL.to_string());

        Self {
            client_url,
            paystack: PaystackConfig {
                secret_key,
                api_url,
            },
        }
    }

    /// The gateway redirects the customer here after checkout.
    pub fn callback_url(&self) -> String {
        match &self.client_url {
            Some(base) => format!("{}/payment/success", base.trim_end_matches('/')),
            None => "http://localhost:3000/payment/success".to_string(),
        }
    }
}
