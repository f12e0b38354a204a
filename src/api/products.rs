//! Catalog queries.

use async_trait::async_trait;
use mockall::automock;
use serde::Deserialize;

use crate::{
    api::{ApiClient, ApiError},
    pricing::{self, PricingError},
    products::{Product, ProductId},
};

use rusty_money::iso::Currency;

/// Filters accepted by the product listing endpoint. Unset fields are
/// omitted from the request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductQuery {
    /// Free-text search term.
    pub search: Option<String>,

    /// Category name filter.
    pub category: Option<String>,

    /// Maximum price filter, in major units.
    pub max_price: Option<u64>,

    /// Sort order tag as the service understands it (e.g. `newest`).
    pub sort: Option<String>,
}

impl ProductQuery {
    /// Query for a free-text search.
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search: Some(term.into()),
            ..Self::default()
        }
    }

    /// Parameters to append to the request, in a stable order.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();

        if let Some(category) = &self.category {
            params.push(("category", category.clone()));
        }
        if let Some(search) = &self.search {
            params.push(("search", search.clone()));
        }
        if let Some(max_price) = self.max_price {
            params.push(("maxPrice", max_price.to_string()));
        }
        if let Some(sort) = &self.sort {
            params.push(("sort", sort.clone()));
        }

        params
    }
}

/// Product as the catalog endpoint returns it.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductDto {
    /// Catalog id.
    pub id: u64,

    /// Display name.
    pub name: String,

    /// URL slug.
    pub slug: String,

    /// Unit price in major units.
    pub price: f64,

    /// Raw image reference.
    #[serde(default)]
    pub image_url: Option<String>,

    /// Category name.
    #[serde(default)]
    pub category_name: Option<String>,

    /// Long description, present on detail responses.
    #[serde(default)]
    pub description: Option<String>,

    /// Pre-discount list price, when the product is on offer.
    #[serde(default)]
    pub mrp: Option<f64>,
}

impl ProductDto {
    /// Convert the wire product into the domain model.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] when the price is not a valid amount.
    pub fn into_product(self, currency: &'static Currency) -> Result<Product, PricingError> {
        Ok(Product {
            id: ProductId::new(self.id),
            name: self.name,
            slug: self.slug,
            price: pricing::from_wire_amount(self.price, currency)?,
            image_ref: self.image_url,
            category: self.category_name,
        })
    }
}

/// Read access to the product catalog.
#[automock]
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// List products matching the query.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] when the request fails.
    async fn search_products(&self, query: ProductQuery) -> Result<Vec<Product>, ApiError>;
}

#[async_trait]
impl CatalogClient for ApiClient {
    async fn search_products(&self, query: ProductQuery) -> Result<Vec<Product>, ApiError> {
        self.list_products(&query).await
    }
}

impl ApiClient {
    /// List catalog products, optionally filtered.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] when the request fails or a price is
    /// malformed.
    pub async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>, ApiError> {
        let dtos: Vec<ProductDto> = self.get_json("/products", &query.params()).await?;

        dtos.into_iter()
            .map(|dto| dto.into_product(self.currency()).map_err(ApiError::from))
            .collect()
    }

    /// Fetch a single product by its slug.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] when the request fails or the price is
    /// malformed.
    pub async fn product_by_slug(&self, slug: &str) -> Result<Product, ApiError> {
        let dto: ProductDto = self
            .get_json(&format!("/products/slug/{slug}"), &[])
            .await?;

        Ok(dto.into_product(self.currency())?)
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::{Money, iso};
    use testresult::TestResult;

    use super::*;

    #[test]
    fn params_omit_unset_fields() {
        let query = ProductQuery::search("shirt");

        assert_eq!(query.params(), vec![("search", "shirt".to_owned())]);
    }

    #[test]
    fn params_include_all_filters() {
        let query = ProductQuery {
            search: Some("shirt".to_owned()),
            category: Some("Menswear".to_owned()),
            max_price: Some(250),
            sort: Some("newest".to_owned()),
        };

        assert_eq!(
            query.params(),
            vec![
                ("category", "Menswear".to_owned()),
                ("search", "shirt".to_owned()),
                ("maxPrice", "250".to_owned()),
                ("sort", "newest".to_owned()),
            ]
        );
    }

    #[test]
    fn dto_converts_to_domain_product() -> TestResult {
        let raw = r#"{
            "id": 12,
            "name": "Linen Shirt",
            "slug": "linen-shirt",
            "price": 49.5,
            "image_url": "linen.jpg",
            "category_name": "Shirts"
        }"#;

        let dto: ProductDto = serde_json::from_str(raw)?;
        let product = dto.into_product(iso::USD)?;

        assert_eq!(product.id, ProductId::new(12));
        assert_eq!(product.price, Money::from_minor(4950, iso::USD));
        assert_eq!(product.image_source(), "/products/linen.jpg");
        assert_eq!(product.category.as_deref(), Some("Shirts"));

        Ok(())
    }

    #[test]
    fn dto_with_negative_price_is_rejected() -> TestResult {
        let raw = r#"{"id":1,"name":"x","slug":"x","price":-2.0}"#;

        let dto: ProductDto = serde_json::from_str(raw)?;

        assert!(matches!(
            dto.into_product(iso::USD),
            Err(PricingError::InvalidAmount(_))
        ));

        Ok(())
    }
}
