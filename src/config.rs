//! Configuration
//!
//! Runtime configuration for the storefront core, resolved from CLI flags
//! and environment variables (with `.env` support for local development).

use clap::Parser;
use rusty_money::{
    Money,
    iso::{self, Currency},
};
use thiserror::Error;

use crate::checkout::ShippingPolicy;

/// Errors produced while resolving configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The configured currency code is not in the ISO table.
    #[error("unknown currency code {0:?}")]
    UnknownCurrency(String),
}

/// Storefront runtime configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "vitrine", about = "Storefront commerce core", long_about = None)]
pub struct StorefrontConfig {
    /// Base URL of the storefront REST API.
    #[arg(long, env = "API_BASE_URL", default_value = "http://localhost:5000/api")]
    pub api_base_url: String,

    /// Website id used for branding, contact and order submission.
    #[arg(long, env = "WEBSITE_ID", default_value_t = 1)]
    pub website_id: u64,

    /// ISO alpha code of the currency catalog prices are interpreted in.
    #[arg(long, env = "STORE_CURRENCY", default_value = "USD")]
    pub currency_code: String,

    /// Subtotal (in minor units) above which shipping is free.
    #[arg(long, env = "FREE_SHIPPING_OVER_MINOR", default_value_t = 50_000)]
    pub free_shipping_over_minor: i64,

    /// Flat shipping fee in minor units, charged below the threshold.
    #[arg(long, env = "SHIPPING_FEE_MINOR", default_value_t = 2_000)]
    pub shipping_fee_minor: i64,
}

impl StorefrontConfig {
    /// Resolve configuration from the process environment, loading a local
    /// `.env` file first when one exists.
    pub fn load() -> Self {
        dotenvy::dotenv().ok();
        Self::parse()
    }

    /// The configured currency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownCurrency`] for codes outside the ISO
    /// table.
    pub fn currency(&self) -> Result<&'static Currency, ConfigError> {
        iso::find(&self.currency_code)
            .ok_or_else(|| ConfigError::UnknownCurrency(self.currency_code.clone()))
    }

    /// Shipping policy built from the configured threshold and fee.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the currency code is unknown.
    pub fn shipping_policy(&self) -> Result<ShippingPolicy, ConfigError> {
        let currency = self.currency()?;

        Ok(ShippingPolicy::new(
            Money::from_minor(self.free_shipping_over_minor, currency),
            Money::from_minor(self.shipping_fee_minor, currency),
        ))
    }
}
