//! Cart
//!
//! Insertion-ordered cart with at most one line per product. Quantities are
//! always at least 1; setting a quantity to 0 removes the line. All
//! mutations are synchronous and immediately visible to total computations.

use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::{
    pricing::{self, PricingError},
    products::{Product, ProductId},
    storage::StorageError,
};

/// Errors related to cart mutation or totals.
#[derive(Debug, Error)]
pub enum CartError {
    /// A product's currency differs from the cart currency.
    #[error("product {product} has currency {actual}, but cart has currency {expected}")]
    CurrencyMismatch {
        /// Product that was being added.
        product: ProductId,
        /// ISO alpha code of the cart currency.
        expected: &'static str,
        /// ISO alpha code of the product price.
        actual: &'static str,
    },

    /// Wrapped money arithmetic error.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// Persisting the cart snapshot failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// One product entry in the cart with an associated quantity.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    product: Product,
    quantity: u32,
}

impl CartLine {
    pub(crate) fn new(product: Product, quantity: u32) -> Self {
        Self { product, quantity }
    }

    /// The product this line holds.
    pub fn product(&self) -> &Product {
        &self.product
    }

    /// Quantity of the product, always at least 1.
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Price of this line: unit price times quantity.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] if the multiplication overflows.
    pub fn line_total(&self) -> Result<Money<'static, Currency>, PricingError> {
        pricing::line_total(&self.product.price, self.quantity)
    }
}

/// Mutable cart state shared between views.
///
/// Passed by reference to whichever flow needs it instead of living in an
/// ambient global; see [`crate::storage::PersistedCart`] for the
/// snapshot-on-mutation variant.
pub trait CartStore {
    /// Add a product, merging into an existing line for the same id.
    ///
    /// # Errors
    ///
    /// Returns an error on currency mismatch or failed persistence.
    fn add_item(&mut self, product: &Product, quantity: u32) -> Result<(), CartError>;

    /// Remove a line; absent ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error when persistence fails.
    fn remove_item(&mut self, product: ProductId) -> Result<(), CartError>;

    /// Overwrite a line's quantity; 0 removes the line.
    ///
    /// # Errors
    ///
    /// Returns an error when persistence fails.
    fn set_quantity(&mut self, product: ProductId, quantity: u32) -> Result<(), CartError>;

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns an error when persistence fails.
    fn clear(&mut self) -> Result<(), CartError>;

    /// Read view of the underlying cart.
    fn cart(&self) -> &Cart;
}

/// Cart
#[derive(Debug, Clone)]
pub struct Cart {
    currency: &'static Currency,
    lines: Vec<CartLine>,
}

impl Cart {
    /// Create an empty cart in the given currency.
    pub fn new(currency: &'static Currency) -> Self {
        Self {
            currency,
            lines: Vec::new(),
        }
    }

    pub(crate) fn from_lines(currency: &'static Currency, lines: Vec<CartLine>) -> Self {
        Self { currency, lines }
    }

    /// Currency all lines are denominated in.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Add a product to the cart.
    ///
    /// An existing line for the same product id has its quantity increased;
    /// otherwise a new line is appended. A quantity of 0 is normalized to 1.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::CurrencyMismatch`] when the product price is not
    /// in the cart currency.
    pub fn add_item(&mut self, product: &Product, quantity: u32) -> Result<(), CartError> {
        let item_currency = product.price.currency();
        if item_currency != self.currency {
            return Err(CartError::CurrencyMismatch {
                product: product.id,
                expected: self.currency.iso_alpha_code,
                actual: item_currency.iso_alpha_code,
            });
        }

        let quantity = quantity.max(1);

        if let Some(line) = self.lines.iter_mut().find(|l| l.product.id == product.id) {
            line.quantity = line.quantity.saturating_add(quantity);
        } else {
            self.lines.push(CartLine::new(product.clone(), quantity));
        }

        Ok(())
    }

    /// Remove the line for `product`, if any. Idempotent.
    pub fn remove_item(&mut self, product: ProductId) {
        self.lines.retain(|line| line.product.id != product);
    }

    /// Overwrite the quantity for `product`.
    ///
    /// A quantity of 0 removes the line. Absent ids are ignored.
    pub fn set_quantity(&mut self, product: ProductId, quantity: u32) {
        if quantity == 0 {
            self.remove_item(product);
            return;
        }

        if let Some(line) = self.lines.iter_mut().find(|l| l.product.id == product) {
            line.quantity = quantity;
        }
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Sum of line price times quantity; 0 for an empty cart.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] if money arithmetic overflows.
    pub fn subtotal(&self) -> Result<Money<'static, Currency>, PricingError> {
        self.lines
            .iter()
            .try_fold(pricing::zero(self.currency), |acc, line| {
                pricing::add(&acc, &line.line_total()?)
            })
    }

    /// Lines in insertion order.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Look up the line for a product id.
    pub fn line(&self, product: ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.product.id == product)
    }

    /// Number of lines in the cart.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Check if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl CartStore for Cart {
    fn add_item(&mut self, product: &Product, quantity: u32) -> Result<(), CartError> {
        Cart::add_item(self, product, quantity)
    }

    fn remove_item(&mut self, product: ProductId) -> Result<(), CartError> {
        Cart::remove_item(self, product);
        Ok(())
    }

    fn set_quantity(&mut self, product: ProductId, quantity: u32) -> Result<(), CartError> {
        Cart::set_quantity(self, product, quantity);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), CartError> {
        Cart::clear(self);
        Ok(())
    }

    fn cart(&self) -> &Cart {
        self
    }
}
