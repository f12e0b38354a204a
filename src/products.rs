//! Products

use std::fmt;

use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};

/// Placeholder image used when a product carries no image reference.
pub const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/100";

/// Prefix applied to bare image filenames served from the storefront host.
pub const LOCAL_IMAGE_PREFIX: &str = "/products/";

/// Opaque product identifier, unique within the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(u64);

impl ProductId {
    /// Create a product id from its raw catalog value.
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw catalog value of this id.
    pub fn value(self) -> u64 {
        self.0
    }
}

impl From<u64> for ProductId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Catalog product as consumed by the cart and checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    /// Product identifier.
    pub id: ProductId,

    /// Display name.
    pub name: String,

    /// URL slug for product detail pages.
    pub slug: String,

    /// Unit price.
    pub price: Money<'static, Currency>,

    /// Raw image reference: an absolute URL, a bare filename, or absent.
    pub image_ref: Option<String>,

    /// Category name, when the catalog provides one.
    pub category: Option<String>,
}

impl Product {
    /// Resolve the displayable image source for this product.
    ///
    /// Absolute URLs are kept as-is, bare filenames are served from the
    /// storefront host, and a missing reference falls back to a placeholder.
    pub fn image_source(&self) -> String {
        resolve_image_source(self.image_ref.as_deref())
    }
}

/// Resolve an optional raw image reference to a displayable source.
pub fn resolve_image_source(image_ref: Option<&str>) -> String {
    match image_ref {
        Some(raw) if raw.starts_with("http") => raw.to_owned(),
        Some(raw) => format!("{LOCAL_IMAGE_PREFIX}{raw}"),
        None => PLACEHOLDER_IMAGE.to_owned(),
    }
}
