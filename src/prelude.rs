//! Vitrine prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    api::{
        ApiClient, ApiError,
        content::{BlogDto, BrandingDto, CategoryDto, DealDto, SettingsDto},
        coupons::PublicCouponDto,
        orders::ContactMessage,
        products::{CatalogClient, ProductDto, ProductQuery},
    },
    branding::{Branding, BrandingDefaults, resolve_branding},
    cart::{Cart, CartError, CartLine, CartStore},
    checkout::{
        CheckoutSession, CheckoutState, CheckoutTotals, CustomerInfo, OrderError, OrderGateway,
        OrderId, OrderLine, OrderPayload, PaymentMethod, ShippingPolicy, ValidationError,
        compute_totals,
    },
    config::{ConfigError, StorefrontConfig},
    coupons::{CouponApplication, CouponError, CouponValidator, DiscountType},
    pricing::PricingError,
    products::{Product, ProductId},
    search::{Debouncer, QueryGuard, QueryTicket, Suggester},
    storage::{CartSnapshot, JsonFileStore, KeyValueStore, MemoryStore, PersistedCart, StorageError},
    wishlist::Wishlist,
};
