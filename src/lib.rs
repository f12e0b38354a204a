//! Vitrine
//!
//! Vitrine is the commerce core of a storefront: cart, pricing, coupon and
//! checkout logic over a remote catalog/order REST API.

pub mod api;
pub mod branding;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod coupons;
pub mod prelude;
pub mod pricing;
pub mod products;
pub mod search;
pub mod storage;
pub mod wishlist;
