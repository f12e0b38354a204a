//! Coupon endpoints: public listing and remote validation.

use async_trait::async_trait;
use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};

use crate::{
    api::{ApiClient, ApiError, check},
    coupons::{CouponApplication, CouponError, CouponValidator, DiscountType},
    pricing,
};

/// Advertised coupon from `/coupons/public`.
#[derive(Debug, Clone, Deserialize)]
pub struct PublicCouponDto {
    /// Coupon code to apply.
    pub code: String,

    /// Marketing description.
    #[serde(default)]
    pub description: Option<String>,

    /// Discount kind, when advertised.
    #[serde(default, rename = "discountType")]
    pub discount_type: Option<DiscountType>,

    /// Discount value (percent or amount), when advertised.
    #[serde(default, rename = "discountValue")]
    pub discount_value: Option<f64>,
}

#[derive(Debug, Serialize)]
struct ValidateRequest<'a> {
    code: &'a str,
    #[serde(rename = "cartTotal")]
    cart_total: f64,
}

#[derive(Debug, Deserialize)]
struct ValidateResponse {
    code: String,
    #[serde(rename = "discountAmount")]
    discount_amount: f64,
    #[serde(rename = "discountType")]
    discount_type: DiscountType,
}

impl ValidateResponse {
    fn into_application(
        self,
        currency: &'static Currency,
    ) -> Result<CouponApplication, ApiError> {
        let amount = pricing::from_wire_amount(self.discount_amount, currency)?;

        Ok(CouponApplication::new(
            &self.code,
            amount,
            self.discount_type,
        ))
    }
}

impl ApiClient {
    /// List currently advertised coupons.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] when the request fails.
    pub async fn public_coupons(&self) -> Result<Vec<PublicCouponDto>, ApiError> {
        self.get_json("/coupons/public", &[]).await
    }
}

#[async_trait]
impl CouponValidator for ApiClient {
    async fn validate(
        &self,
        code: String,
        cart_total: Money<'static, Currency>,
    ) -> Result<CouponApplication, CouponError> {
        let body = ValidateRequest {
            code: &code,
            cart_total: pricing::to_wire_amount(&cart_total).map_err(ApiError::from)?,
        };

        let response = self
            .post_json("/coupons/validate", &body)
            .await
            .map_err(CouponError::Transport)?;

        match check(response).await {
            Ok(response) => {
                let parsed: ValidateResponse =
                    response.json().await.map_err(ApiError::from)?;

                Ok(parsed.into_application(self.currency())?)
            }
            // A 4xx means the service looked at the code and said no; pass
            // its reason through verbatim.
            Err(ApiError::UnexpectedResponse { status, message })
                if status.is_client_error() =>
            {
                Err(CouponError::Rejected(message))
            }
            Err(err) => Err(CouponError::Transport(err)),
        }
    }
}
