//! Coupons
//!
//! Coupon codes are validated by the remote service; the client only holds
//! the resulting application. At most one coupon is active per checkout
//! session and stacking is rejected locally.

use async_trait::async_trait;
use mockall::automock;
use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::ApiError;

/// How a coupon's discount was computed server-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    /// Percentage of the cart subtotal.
    Percentage,
    /// Fixed amount off.
    Fixed,
}

/// A validated coupon as returned by the remote service.
#[derive(Debug, Clone, PartialEq)]
pub struct CouponApplication {
    code: String,
    discount_amount: Money<'static, Currency>,
    discount_type: DiscountType,
}

impl CouponApplication {
    /// Create an application; the code is normalized on the way in.
    pub fn new(
        code: &str,
        discount_amount: Money<'static, Currency>,
        discount_type: DiscountType,
    ) -> Self {
        Self {
            code: normalize_code(code),
            discount_amount,
            discount_type,
        }
    }

    /// Normalized coupon code.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Discount amount resolved by the remote service.
    pub fn discount_amount(&self) -> Money<'static, Currency> {
        self.discount_amount
    }

    /// How the discount was computed.
    pub fn discount_type(&self) -> DiscountType {
        self.discount_type
    }
}

/// Trim and case-normalize a raw coupon code.
pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Errors raised while applying a coupon.
#[derive(Debug, Error)]
pub enum CouponError {
    /// The submitted code was empty after trimming.
    #[error("coupon code is empty")]
    EmptyCode,

    /// A coupon is already active; it must be removed before applying
    /// another one.
    #[error("coupon {0} is already applied; remove it first")]
    AlreadyApplied(String),

    /// The checkout session is no longer accepting coupons.
    #[error("checkout is no longer accepting coupon changes")]
    SessionClosed,

    /// The remote service rejected the code; message passed through
    /// verbatim.
    #[error("{0}")]
    Rejected(String),

    /// The validation request itself failed.
    #[error(transparent)]
    Transport(#[from] ApiError),
}

/// Remote coupon validation capability.
#[automock]
#[async_trait]
pub trait CouponValidator: Send + Sync {
    /// Validate `code` against the given cart subtotal.
    ///
    /// # Errors
    ///
    /// Returns [`CouponError::Rejected`] when the service declines the code
    /// and [`CouponError::Transport`] when the request fails.
    async fn validate(
        &self,
        code: String,
        cart_total: Money<'static, Currency>,
    ) -> Result<CouponApplication, CouponError>;
}

#[cfg(test)]
mod tests {
    use rusty_money::iso;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn codes_are_normalized() {
        assert_eq!(normalize_code("  save10 "), "SAVE10");
        assert_eq!(normalize_code("SAVE10"), "SAVE10");

        let application = CouponApplication::new(
            " save10",
            Money::from_minor(2000, iso::USD),
            DiscountType::Percentage,
        );

        assert_eq!(application.code(), "SAVE10");
    }

    #[test]
    fn discount_type_uses_lowercase_wire_names() -> TestResult {
        assert_eq!(serde_json::to_string(&DiscountType::Percentage)?, "\"percentage\"");
        assert_eq!(serde_json::to_string(&DiscountType::Fixed)?, "\"fixed\"");

        let parsed: DiscountType = serde_json::from_str("\"fixed\"")?;
        assert_eq!(parsed, DiscountType::Fixed);

        Ok(())
    }
}
