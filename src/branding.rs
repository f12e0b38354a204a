//! Branding
//!
//! Resolution of site branding with fallbacks: a failed or sparse remote
//! branding fetch degrades to configured defaults instead of blocking the
//! page.

use crate::api::content::BrandingDto;

/// Default logo path served from the storefront host.
pub const DEFAULT_LOGO: &str = "/logo/logo.jpg";

/// Resolved branding, ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branding {
    /// Site display name.
    pub name: String,

    /// Logo image reference.
    pub logo_url: String,

    /// Tagline or about text, when available.
    pub description: Option<String>,
}

/// Default values used when the remote record is missing a field entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrandingDefaults {
    /// Fallback site name.
    pub name: String,

    /// Fallback logo path.
    pub logo_url: String,
}

impl Default for BrandingDefaults {
    fn default() -> Self {
        Self {
            name: "Storefront".to_owned(),
            logo_url: DEFAULT_LOGO.to_owned(),
        }
    }
}

/// Resolve displayable branding from an optional remote record.
///
/// Pure: field by field, the remote value wins when present and non-empty,
/// otherwise the default applies. `None` covers the failed-fetch case.
pub fn resolve_branding(remote: Option<&BrandingDto>, defaults: &BrandingDefaults) -> Branding {
    let name = remote
        .and_then(|dto| dto.name.as_deref())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(&defaults.name)
        .to_owned();

    let logo_url = remote
        .and_then(|dto| dto.logo_url.as_deref())
        .map(str::trim)
        .filter(|logo| !logo.is_empty())
        .unwrap_or(&defaults.logo_url)
        .to_owned();

    let description = remote.and_then(|dto| dto.description.clone());

    Branding {
        name,
        logo_url,
        description,
    }
}
