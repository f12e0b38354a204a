//! Informational reads: categories, branding, settings, deal, blogs.

use serde::Deserialize;

use crate::{
    api::{ApiClient, ApiError},
    checkout::PaymentMethod,
};

/// Product category.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryDto {
    /// Category id.
    pub id: u64,

    /// Display name; also used as the `category` filter value.
    pub name: String,

    /// Category description, when maintained.
    #[serde(default)]
    pub description: Option<String>,

    /// Category image reference.
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Site branding record from `/websites/:id`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BrandingDto {
    /// Site display name.
    #[serde(default)]
    pub name: Option<String>,

    /// Logo image reference.
    #[serde(default)]
    pub logo_url: Option<String>,

    /// Tagline or about text.
    #[serde(default)]
    pub description: Option<String>,
}

/// Payment settings from `/settings`. Flags arrive as `"1"`/`"0"` strings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsDto {
    /// Whether cash on delivery is offered.
    #[serde(default)]
    pub cod_enabled: Option<String>,

    /// Whether PayPal is offered.
    #[serde(default)]
    pub paypal_enabled: Option<String>,

    /// `"live"` or `"sandbox"`.
    #[serde(default)]
    pub paypal_mode: Option<String>,

    /// Client id used in sandbox mode.
    #[serde(default)]
    pub paypal_sandbox_client_id: Option<String>,

    /// Client id used in live mode.
    #[serde(default)]
    pub paypal_live_client_id: Option<String>,
}

fn flag_enabled(flag: Option<&str>) -> bool {
    flag == Some("1")
}

impl SettingsDto {
    /// Payment method preselected at checkout: cash on delivery when
    /// enabled, else PayPal when enabled, else nothing.
    pub fn default_payment_method(&self) -> Option<PaymentMethod> {
        if flag_enabled(self.cod_enabled.as_deref()) {
            Some(PaymentMethod::CashOnDelivery)
        } else if flag_enabled(self.paypal_enabled.as_deref()) {
            Some(PaymentMethod::PayPal)
        } else {
            None
        }
    }

    /// PayPal client id matching the configured mode.
    pub fn paypal_client_id(&self) -> Option<&str> {
        if self.paypal_mode.as_deref() == Some("live") {
            self.paypal_live_client_id.as_deref()
        } else {
            self.paypal_sandbox_client_id.as_deref()
        }
    }
}

/// Deal-of-the-day product from `/settings/deal`.
#[derive(Debug, Clone, Deserialize)]
pub struct DealDto {
    /// Product name.
    pub name: String,

    /// Product slug for linking.
    pub slug: String,

    /// Offer price in major units.
    pub price: f64,

    /// Pre-discount list price.
    #[serde(default)]
    pub mrp: Option<f64>,

    /// Description shown with the deal.
    #[serde(default)]
    pub description: Option<String>,

    /// Image reference.
    #[serde(default)]
    pub image_url: Option<String>,
}

impl DealDto {
    /// Whether the list price is actually higher than the offer price.
    pub fn is_discounted(&self) -> bool {
        self.mrp.is_some_and(|mrp| mrp > self.price)
    }
}

/// Blog teaser from `/blogs`.
#[derive(Debug, Clone, Deserialize)]
pub struct BlogDto {
    /// Blog post id.
    pub id: u64,

    /// Post title.
    pub title: String,

    /// Post slug for linking.
    #[serde(default)]
    pub slug: Option<String>,

    /// Cover image reference.
    #[serde(default)]
    pub image_url: Option<String>,
}

impl ApiClient {
    /// List all product categories.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] when the request fails.
    pub async fn categories(&self) -> Result<Vec<CategoryDto>, ApiError> {
        self.get_json("/categories", &[]).await
    }

    /// Fetch branding for the configured website id.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] when the request fails. Callers are expected
    /// to degrade to default branding instead of blocking the page.
    pub async fn branding(&self) -> Result<BrandingDto, ApiError> {
        self.get_json(&format!("/websites/{}", self.website_id()), &[])
            .await
    }

    /// Fetch payment settings.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] when the request fails.
    pub async fn settings(&self) -> Result<SettingsDto, ApiError> {
        self.get_json("/settings", &[]).await
    }

    /// Fetch the deal of the day, if one is configured.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] when the request fails.
    pub async fn deal_of_the_day(&self) -> Result<Option<DealDto>, ApiError> {
        self.get_json("/settings/deal", &[]).await
    }

    /// List blog teasers.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] when the request fails.
    pub async fn blogs(&self) -> Result<Vec<BlogDto>, ApiError> {
        self.get_json("/blogs", &[]).await
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn cod_is_preferred_default_payment_method() -> TestResult {
        let settings: SettingsDto = serde_json::from_str(
            r#"{"cod_enabled":"1","paypal_enabled":"1","paypal_mode":"sandbox"}"#,
        )?;

        assert_eq!(
            settings.default_payment_method(),
            Some(PaymentMethod::CashOnDelivery)
        );

        Ok(())
    }

    #[test]
    fn paypal_is_default_when_cod_disabled() -> TestResult {
        let settings: SettingsDto =
            serde_json::from_str(r#"{"cod_enabled":"0","paypal_enabled":"1"}"#)?;

        assert_eq!(
            settings.default_payment_method(),
            Some(PaymentMethod::PayPal)
        );

        Ok(())
    }

    #[test]
    fn no_default_when_nothing_enabled() {
        let settings = SettingsDto::default();

        assert_eq!(settings.default_payment_method(), None);
    }

    #[test]
    fn paypal_client_id_follows_mode() -> TestResult {
        let settings: SettingsDto = serde_json::from_str(
            r#"{
                "paypal_mode": "live",
                "paypal_sandbox_client_id": "sandbox-id",
                "paypal_live_client_id": "live-id"
            }"#,
        )?;

        assert_eq!(settings.paypal_client_id(), Some("live-id"));

        let sandbox = SettingsDto {
            paypal_mode: Some("sandbox".to_owned()),
            ..settings
        };
        assert_eq!(sandbox.paypal_client_id(), Some("sandbox-id"));

        Ok(())
    }

    #[test]
    fn deal_is_discounted_only_when_mrp_exceeds_price() -> TestResult {
        let deal: DealDto = serde_json::from_str(
            r#"{"name":"Watch","slug":"watch","price":80.0,"mrp":120.0}"#,
        )?;
        assert!(deal.is_discounted());

        let flat: DealDto =
            serde_json::from_str(r#"{"name":"Watch","slug":"watch","price":80.0,"mrp":80.0}"#)?;
        assert!(!flat.is_discounted());

        let no_mrp: DealDto =
            serde_json::from_str(r#"{"name":"Watch","slug":"watch","price":80.0}"#)?;
        assert!(!no_mrp.is_discounted());

        Ok(())
    }

    #[test]
    fn branding_tolerates_sparse_payloads() -> TestResult {
        let branding: BrandingDto = serde_json::from_str("{}")?;

        assert!(branding.name.is_none());
        assert!(branding.logo_url.is_none());

        Ok(())
    }
}
