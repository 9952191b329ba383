//! API configuration
//!
//! Values come from `CLINIC_*` environment variables (a `.env` file is read
//! first by the binary), layered over [`ApiConfig::default`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

use core_kernel::RetryPolicy;
use domain_billing::BillingConfig;

/// API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// JWT secret for authentication
    pub jwt_secret: String,
    /// JWT expiration in seconds
    pub jwt_expiration_secs: u64,
    /// PostgreSQL URL; the in-memory store is used when absent
    pub database_url: Option<String>,
    /// Log level
    pub log_level: String,
    /// Days a quotation stays open when no `valid_until` is given
    pub quotation_validity_days: i64,
    /// Days from invoice date to due date
    pub invoice_due_days: i64,
    /// Default for supplies that cross state lines (IGST instead of CGST+SGST)
    pub inter_state_default: bool,
    pub retry_max_attempts: u32,
    pub retry_base_delay_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            jwt_secret: "change-me-in-production".to_string(),
            jwt_expiration_secs: 3600,
            database_url: None,
            log_level: "info".to_string(),
            quotation_validity_days: 30,
            invoice_due_days: 30,
            inter_state_default: false,
            retry_max_attempts: 3,
            retry_base_delay_ms: 50,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from `CLINIC_*` environment variables
    ///
    /// Unset fields keep their [`Default`] values.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("CLINIC").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Business settings handed to the billing engine
    pub fn billing_config(&self) -> BillingConfig {
        BillingConfig {
            quotation_validity_days: self.quotation_validity_days,
            invoice_due_days: self.invoice_due_days,
            inter_state_default: self.inter_state_default,
            retry: RetryPolicy::new(
                self.retry_max_attempts,
                Duration::from_millis(self.retry_base_delay_ms),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_use_in_memory_store() {
        let config = ApiConfig::default();
        assert!(config.database_url.is_none());
        assert_eq!(config.server_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_billing_config_carries_business_knobs() {
        let config = ApiConfig {
            quotation_validity_days: 15,
            retry_max_attempts: 5,
            retry_base_delay_ms: 10,
            ..ApiConfig::default()
        };

        let billing = config.billing_config();
        assert_eq!(billing.quotation_validity_days, 15);
        assert_eq!(billing.invoice_due_days, 30);
        assert_eq!(billing.retry.max_attempts, 5);
        assert_eq!(billing.retry.base_delay_ms, 10);
        assert!(billing.validate().is_ok());
    }
}
