//! Storage
//!
//! Local persistence for cart and wishlist state, mirroring browser-local
//! storage: string values under well-known keys, surviving restarts but
//! never shared across devices. Load failures degrade to empty defaults
//! rather than blocking the storefront.

use std::{cell::RefCell, collections::HashMap, fmt, fs, io, path::PathBuf, rc::Rc};

use rusty_money::{Money, iso};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    cart::{Cart, CartError, CartLine, CartStore},
    pricing::{self, PricingError},
    products::{Product, ProductId},
};

/// Storage key for the cart snapshot.
pub const CART_KEY: &str = "vitrine.cart";

/// Storage key for the wishlist snapshot.
pub const WISHLIST_KEY: &str = "vitrine.wishlist";

/// Errors that can occur while persisting or restoring snapshots.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying I/O failure.
    #[error("storage i/o error: {0}")]
    Io(#[from] io::Error),

    /// A stored snapshot could not be decoded.
    #[error("corrupt snapshot: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// A snapshot referenced a currency the ISO table does not know.
    #[error("unknown currency code {0:?} in snapshot")]
    UnknownCurrency(String),

    /// Wrapped money conversion error.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// String key-value store, the local-storage analogue.
pub trait KeyValueStore: fmt::Debug {
    /// Read the value under `key`, if present.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] on I/O failure.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] on I/O failure.
    fn put(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete the value under `key`; absent keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] on I/O failure.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

impl<S: KeyValueStore> KeyValueStore for Rc<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        S::get(self, key)
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        S::put(self, key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        S::remove(self, key)
    }
}

/// In-memory store; state is lost on drop. Primarily a test double.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.borrow().get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values
            .borrow_mut()
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.values.borrow_mut().remove(key);
        Ok(())
    }
}

/// File-backed store: one JSON file per key under a directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Create a store rooted at `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the directory cannot be created.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::write(self.path(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Serializable snapshot of cart contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartSnapshot {
    currency: String,
    lines: Vec<LineSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LineSnapshot {
    product_id: ProductId,
    name: String,
    slug: String,
    image_ref: Option<String>,
    category: Option<String>,
    unit_price_minor: i64,
    quantity: u32,
}

impl CartSnapshot {
    /// Capture the current cart contents.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if a price cannot be expressed in minor
    /// units.
    pub fn capture(cart: &Cart) -> Result<Self, StorageError> {
        let lines = cart
            .lines()
            .iter()
            .map(|line| {
                let product = line.product();
                Ok(LineSnapshot {
                    product_id: product.id,
                    name: product.name.clone(),
                    slug: product.slug.clone(),
                    image_ref: product.image_ref.clone(),
                    category: product.category.clone(),
                    unit_price_minor: pricing::to_minor_units(&product.price)?,
                    quantity: line.quantity(),
                })
            })
            .collect::<Result<Vec<_>, StorageError>>()?;

        Ok(Self {
            currency: cart.currency().iso_alpha_code.to_owned(),
            lines,
        })
    }

    /// Rebuild a cart from this snapshot.
    ///
    /// Stored quantities below 1 are clamped back to 1 so the cart invariant
    /// holds even for tampered snapshots.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::UnknownCurrency`] when the stored currency
    /// code is not in the ISO table.
    pub fn restore(self) -> Result<Cart, StorageError> {
        let currency = iso::find(&self.currency)
            .ok_or_else(|| StorageError::UnknownCurrency(self.currency.clone()))?;

        let lines = self
            .lines
            .into_iter()
            .map(|line| {
                let product = Product {
                    id: line.product_id,
                    name: line.name,
                    slug: line.slug,
                    price: Money::from_minor(line.unit_price_minor, currency),
                    image_ref: line.image_ref,
                    category: line.category,
                };
                CartLine::new(product, line.quantity.max(1))
            })
            .collect();

        Ok(Cart::from_lines(currency, lines))
    }
}

/// Cart wrapper that writes a snapshot through a [`KeyValueStore`] after
/// every mutation, so contents survive restarts.
#[derive(Debug)]
pub struct PersistedCart {
    cart: Cart,
    store: Box<dyn KeyValueStore>,
}

impl PersistedCart {
    /// Load the persisted cart, or start empty when nothing (or nothing
    /// usable) is stored.
    ///
    /// Corrupt snapshots and currency changes are logged and discarded
    /// rather than surfaced; a broken snapshot must never block the shop.
    pub fn load(store: Box<dyn KeyValueStore>, currency: &'static iso::Currency) -> Self {
        let cart = match Self::restore_from(&*store, currency) {
            Ok(Some(cart)) => cart,
            Ok(None) => Cart::new(currency),
            Err(err) => {
                tracing::warn!(%err, "discarding unusable cart snapshot");
                Cart::new(currency)
            }
        };

        Self { cart, store }
    }

    fn restore_from(
        store: &dyn KeyValueStore,
        currency: &'static iso::Currency,
    ) -> Result<Option<Cart>, StorageError> {
        let Some(raw) = store.get(CART_KEY)? else {
            return Ok(None);
        };

        let snapshot: CartSnapshot = serde_json::from_str(&raw)?;
        let cart = snapshot.restore()?;

        if cart.currency() == currency {
            Ok(Some(cart))
        } else {
            tracing::warn!(
                stored = cart.currency().iso_alpha_code,
                configured = currency.iso_alpha_code,
                "stored cart currency differs from configuration; starting empty"
            );
            Ok(None)
        }
    }

    fn save(&self) -> Result<(), StorageError> {
        if self.cart.is_empty() {
            return self.store.remove(CART_KEY);
        }

        let snapshot = CartSnapshot::capture(&self.cart)?;
        let raw = serde_json::to_string(&snapshot)?;
        self.store.put(CART_KEY, &raw)
    }

    // A mutation that cannot be persisted is rolled back, so the in-memory
    // cart and the stored snapshot never drift apart.
    fn persist_or_rollback(&mut self, prior: Cart) -> Result<(), CartError> {
        if let Err(err) = self.save() {
            self.cart = prior;
            return Err(err.into());
        }

        Ok(())
    }
}

impl CartStore for PersistedCart {
    fn add_item(&mut self, product: &Product, quantity: u32) -> Result<(), CartError> {
        let prior = self.cart.clone();
        self.cart.add_item(product, quantity)?;
        self.persist_or_rollback(prior)
    }

    fn remove_item(&mut self, product: ProductId) -> Result<(), CartError> {
        let prior = self.cart.clone();
        self.cart.remove_item(product);
        self.persist_or_rollback(prior)
    }

    fn set_quantity(&mut self, product: ProductId, quantity: u32) -> Result<(), CartError> {
        let prior = self.cart.clone();
        self.cart.set_quantity(product, quantity);
        self.persist_or_rollback(prior)
    }

    fn clear(&mut self) -> Result<(), CartError> {
        let prior = self.cart.clone();
        self.cart.clear();
        self.persist_or_rollback(prior)
    }

    fn cart(&self) -> &Cart {
        &self.cart
    }
}
