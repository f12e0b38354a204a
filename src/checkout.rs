//! Checkout
//!
//! Composes cart state, shipping policy and an optional coupon into payable
//! totals, builds the immutable order submission payload, and drives the
//! submission state machine with a single-flight guard.

use std::fmt;

use async_trait::async_trait;
use mockall::automock;
use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    api::ApiError,
    cart::{Cart, CartStore},
    coupons::{CouponApplication, CouponError, CouponValidator, normalize_code},
    pricing::{self, PricingError},
    products::ProductId,
};

/// Shipping cost policy: orders strictly above `free_over` ship free,
/// everything else pays the flat `fee`.
#[derive(Debug, Clone, PartialEq)]
pub struct ShippingPolicy {
    free_over: Money<'static, Currency>,
    fee: Money<'static, Currency>,
}

impl ShippingPolicy {
    /// Create a policy from the free-shipping threshold and flat fee.
    pub fn new(free_over: Money<'static, Currency>, fee: Money<'static, Currency>) -> Self {
        Self { free_over, fee }
    }

    /// Threshold above which shipping is free.
    pub fn free_over(&self) -> Money<'static, Currency> {
        self.free_over
    }

    /// Flat fee charged below the threshold.
    pub fn fee(&self) -> Money<'static, Currency> {
        self.fee
    }
}

/// Derived checkout totals; never stored, always recomputed.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutTotals {
    /// Sum of line price times quantity.
    pub subtotal: Money<'static, Currency>,

    /// Shipping charge after applying the policy.
    pub shipping: Money<'static, Currency>,

    /// Coupon discount as the service granted it; may exceed the payable
    /// amount.
    pub discount: Money<'static, Currency>,

    /// Payable total: subtotal + shipping - discount, floored at 0.
    pub total: Money<'static, Currency>,
}

/// Compute checkout totals from cart, optional coupon and shipping policy.
///
/// Pure: identical inputs always produce identical totals and the cart is
/// never mutated.
///
/// # Errors
///
/// Returns a [`PricingError`] on currency mismatch between cart, policy and
/// coupon, or on arithmetic overflow.
pub fn compute_totals(
    cart: &Cart,
    coupon: Option<&CouponApplication>,
    policy: &ShippingPolicy,
) -> Result<CheckoutTotals, PricingError> {
    let currency = cart.currency();
    pricing::ensure_currency(currency, &policy.free_over)?;
    pricing::ensure_currency(currency, &policy.fee)?;

    let subtotal = cart.subtotal()?;

    let shipping = if subtotal.amount() > policy.free_over.amount() {
        pricing::zero(currency)
    } else {
        policy.fee
    };

    let discount = match coupon {
        Some(application) => {
            let amount = application.discount_amount();
            pricing::ensure_currency(currency, &amount)?;
            amount
        }
        None => pricing::zero(currency),
    };

    let gross = pricing::add(&subtotal, &shipping)?;

    let remaining = gross
        .amount()
        .checked_sub(*discount.amount())
        .ok_or(PricingError::Overflow)?;

    // An oversized discount floors the payable total at zero; the discount
    // itself is reported as granted.
    let total = if remaining.is_sign_negative() {
        pricing::zero(currency)
    } else {
        Money::from_decimal(remaining, currency)
    };

    Ok(CheckoutTotals {
        subtotal,
        shipping,
        discount,
        total,
    })
}

/// Customer contact and shipping details collected at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerInfo {
    /// Authenticated user id, when the shopper is signed in.
    pub user_id: Option<u64>,
    /// Full name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Contact phone number.
    pub phone: String,
    /// Street address.
    pub address: String,
    /// City.
    pub city: String,
    /// Postal code.
    pub zip: String,
}

impl CustomerInfo {
    /// Check that every required field is filled in.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingField`] naming the first empty
    /// field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let required = [
            ("name", &self.name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("address", &self.address),
            ("city", &self.city),
            ("zip", &self.zip),
        ];

        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ValidationError::MissingField(field));
            }
        }

        Ok(())
    }

    /// Single-line shipping address as the order service expects it.
    pub fn shipping_address(&self) -> String {
        format!("{}, {}, {}", self.address, self.city, self.zip)
    }
}

/// Local validation failures that block order submission.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required checkout field is empty.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// The cart has no lines to submit.
    #[error("cart is empty")]
    EmptyCart,

    /// A money amount has no wire representation.
    #[error(transparent)]
    Amount(#[from] PricingError),
}

/// Payment method selected at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// Cash on delivery.
    #[serde(rename = "COD")]
    CashOnDelivery,
    /// PayPal capture; the gateway itself is external.
    PayPal,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::CashOnDelivery => f.write_str("COD"),
            PaymentMethod::PayPal => f.write_str("PayPal"),
        }
    }
}

/// One denormalized order line captured at submission time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderLine {
    product_id: ProductId,
    quantity: u32,
    price: f64,
}

impl OrderLine {
    /// Product this line refers to.
    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    /// Quantity at submission time.
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Unit price at submission time.
    pub fn price(&self) -> f64 {
        self.price
    }
}

/// Immutable order submission record.
///
/// Line items and totals are captured by value when the payload is built;
/// later cart mutation cannot alter a payload that has already been
/// produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderPayload {
    user_id: Option<u64>,
    guest_name: String,
    guest_email: String,
    guest_phone: String,
    shipping_address: String,
    payment_method: PaymentMethod,
    items: Vec<OrderLine>,
    total_amount: f64,
    website_id: u64,
}

impl OrderPayload {
    /// Build a payload from the cart, customer details and computed totals.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when a required customer field is
    /// missing, the cart is empty, or an amount cannot be represented on the
    /// wire.
    pub fn build(
        cart: &Cart,
        customer: &CustomerInfo,
        totals: &CheckoutTotals,
        payment_method: PaymentMethod,
        website_id: u64,
    ) -> Result<Self, ValidationError> {
        customer.validate()?;

        if cart.is_empty() {
            return Err(ValidationError::EmptyCart);
        }

        let items = cart
            .lines()
            .iter()
            .map(|line| {
                Ok(OrderLine {
                    product_id: line.product().id,
                    quantity: line.quantity(),
                    price: pricing::to_wire_amount(&line.product().price)?,
                })
            })
            .collect::<Result<Vec<_>, PricingError>>()?;

        Ok(Self {
            user_id: customer.user_id,
            guest_name: customer.name.clone(),
            guest_email: customer.email.clone(),
            guest_phone: customer.phone.clone(),
            shipping_address: customer.shipping_address(),
            payment_method,
            items,
            total_amount: pricing::to_wire_amount(&totals.total)?,
            website_id,
        })
    }

    /// Captured order lines.
    pub fn items(&self) -> &[OrderLine] {
        &self.items
    }

    /// Captured payable total.
    pub fn total_amount(&self) -> f64 {
        self.total_amount
    }

    /// Selected payment method.
    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    /// Joined shipping address line.
    pub fn shipping_address(&self) -> &str {
        &self.shipping_address
    }
}

/// Identifier assigned to a successfully created order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Wrap a raw order identifier.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Raw identifier value.
    pub fn value(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Errors raised while submitting an order.
#[derive(Debug, Error)]
pub enum OrderError {
    /// A submission is already in flight for this session.
    #[error("an order submission is already in flight")]
    SubmissionInFlight,

    /// The session already completed an order.
    #[error("this checkout session has already completed")]
    AlreadyCompleted,

    /// The order service rejected the submission; message passed through
    /// verbatim.
    #[error("{0}")]
    Rejected(String),

    /// The submission request itself failed.
    #[error(transparent)]
    Transport(#[from] ApiError),
}

/// Remote order creation capability.
#[automock]
#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// Create an order from the payload, returning its identifier.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::Rejected`] when the service declines the order
    /// and [`OrderError::Transport`] when the request fails.
    async fn submit(&self, payload: OrderPayload) -> Result<OrderId, OrderError>;
}

/// Checkout session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutState {
    /// Reviewing the cart; no coupon active.
    Idle,
    /// A validated coupon is active.
    CouponApplied,
    /// An order submission is in flight.
    Submitting,
    /// An order was created and the cart cleared.
    Completed,
}

/// One checkout interaction from cart review through order submission.
///
/// Holds the single active coupon and guards against concurrent or repeated
/// submission. On a failed submission the session returns to its pre-submit
/// state and the cart is left untouched.
#[derive(Debug)]
pub struct CheckoutSession {
    state: CheckoutState,
    coupon: Option<CouponApplication>,
}

impl Default for CheckoutSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckoutSession {
    /// Start a fresh session.
    pub fn new() -> Self {
        Self {
            state: CheckoutState::Idle,
            coupon: None,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> CheckoutState {
        self.state
    }

    /// The active coupon, if any.
    pub fn coupon(&self) -> Option<&CouponApplication> {
        self.coupon.as_ref()
    }

    /// Validate and apply a coupon code against the current cart subtotal.
    ///
    /// Re-applying while a coupon is active is rejected locally; the active
    /// coupon must be removed first.
    ///
    /// # Errors
    ///
    /// Returns a [`CouponError`] when the code is empty, a coupon is already
    /// active, the session is past coupon changes, or validation fails.
    pub async fn apply_coupon(
        &mut self,
        validator: &dyn CouponValidator,
        code: &str,
        cart: &Cart,
    ) -> Result<CouponApplication, CouponError> {
        if matches!(
            self.state,
            CheckoutState::Submitting | CheckoutState::Completed
        ) {
            return Err(CouponError::SessionClosed);
        }

        if let Some(active) = &self.coupon {
            return Err(CouponError::AlreadyApplied(active.code().to_owned()));
        }

        let code = normalize_code(code);
        if code.is_empty() {
            return Err(CouponError::EmptyCode);
        }

        let subtotal = cart.subtotal().map_err(ApiError::from)?;
        let application = validator.validate(code, subtotal).await?;

        tracing::debug!(code = application.code(), "coupon applied");

        self.coupon = Some(application.clone());
        self.state = CheckoutState::CouponApplied;

        Ok(application)
    }

    /// Remove the active coupon, returning the session to [`CheckoutState::Idle`].
    ///
    /// Ignored while a submission is in flight; otherwise always succeeds,
    /// including when no coupon is active.
    pub fn remove_coupon(&mut self) {
        if matches!(
            self.state,
            CheckoutState::Submitting | CheckoutState::Completed
        ) {
            return;
        }

        self.coupon = None;
        self.state = CheckoutState::Idle;
    }

    /// Totals for the current cart under this session's coupon.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] on currency mismatch or overflow.
    pub fn totals(
        &self,
        cart: &Cart,
        policy: &ShippingPolicy,
    ) -> Result<CheckoutTotals, PricingError> {
        compute_totals(cart, self.coupon.as_ref(), policy)
    }

    /// Submit the order and, on success, clear the cart.
    ///
    /// A second call while a submission is in flight fails fast with
    /// [`OrderError::SubmissionInFlight`]. On gateway failure the session
    /// returns to its pre-submit state and the cart is left untouched so
    /// the shopper can retry.
    ///
    /// # Errors
    ///
    /// Returns an [`OrderError`] when submission is blocked or the gateway
    /// fails.
    pub async fn submit_order(
        &mut self,
        gateway: &dyn OrderGateway,
        cart: &mut dyn CartStore,
        payload: OrderPayload,
    ) -> Result<OrderId, OrderError> {
        match self.state {
            CheckoutState::Submitting => return Err(OrderError::SubmissionInFlight),
            CheckoutState::Completed => return Err(OrderError::AlreadyCompleted),
            CheckoutState::Idle | CheckoutState::CouponApplied => {}
        }

        let prior = self.state;
        self.state = CheckoutState::Submitting;

        match gateway.submit(payload).await {
            Ok(order_id) => {
                // The order exists remotely; a failed local clear must not
                // turn success into an error.
                if let Err(err) = cart.clear() {
                    tracing::warn!(%err, "order placed but clearing the cart failed");
                }

                self.coupon = None;
                self.state = CheckoutState::Completed;

                tracing::debug!(%order_id, "order placed");

                Ok(order_id)
            }
            Err(err) => {
                self.state = prior;
                Err(err)
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn force_state(&mut self, state: CheckoutState) {
        self.state = state;
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::{Money, iso};
    use testresult::TestResult;

    use crate::{
        coupons::{DiscountType, MockCouponValidator},
        products::Product,
    };

    use super::*;

    fn product(id: u64, minor: i64) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            slug: format!("product-{id}"),
            price: Money::from_minor(minor, iso::USD),
            image_ref: None,
            category: None,
        }
    }

    fn policy() -> ShippingPolicy {
        ShippingPolicy::new(
            Money::from_minor(50000, iso::USD),
            Money::from_minor(2000, iso::USD),
        )
    }

    fn customer() -> CustomerInfo {
        CustomerInfo {
            user_id: None,
            name: "Ada Lovelace".to_owned(),
            email: "ada@example.com".to_owned(),
            phone: "+1 555 0100".to_owned(),
            address: "12 Analytical Row".to_owned(),
            city: "London".to_owned(),
            zip: "EC1".to_owned(),
        }
    }

    #[test]
    fn totals_below_threshold_charge_shipping() -> TestResult {
        let mut cart = Cart::new(iso::USD);
        cart.add_item(&product(1, 10000), 2)?;

        let totals = compute_totals(&cart, None, &policy())?;

        assert_eq!(totals.subtotal, Money::from_minor(20000, iso::USD));
        assert_eq!(totals.shipping, Money::from_minor(2000, iso::USD));
        assert_eq!(totals.discount, Money::from_minor(0, iso::USD));
        assert_eq!(totals.total, Money::from_minor(22000, iso::USD));

        Ok(())
    }

    #[test]
    fn totals_above_threshold_ship_free() -> TestResult {
        let mut cart = Cart::new(iso::USD);
        cart.add_item(&product(1, 60000), 1)?;

        let totals = compute_totals(&cart, None, &policy())?;

        assert_eq!(totals.shipping, Money::from_minor(0, iso::USD));
        assert_eq!(totals.total, Money::from_minor(60000, iso::USD));

        Ok(())
    }

    #[test]
    fn totals_exactly_at_threshold_still_pay_shipping() -> TestResult {
        let mut cart = Cart::new(iso::USD);
        cart.add_item(&product(1, 50000), 1)?;

        let totals = compute_totals(&cart, None, &policy())?;

        assert_eq!(totals.shipping, Money::from_minor(2000, iso::USD));

        Ok(())
    }

    #[test]
    fn totals_apply_coupon_discount() -> TestResult {
        let mut cart = Cart::new(iso::USD);
        cart.add_item(&product(1, 10000), 2)?;

        let coupon = CouponApplication::new(
            "SAVE10",
            Money::from_minor(2000, iso::USD),
            DiscountType::Percentage,
        );

        let totals = compute_totals(&cart, Some(&coupon), &policy())?;

        assert_eq!(totals.discount, Money::from_minor(2000, iso::USD));
        assert_eq!(totals.total, Money::from_minor(20000, iso::USD));

        Ok(())
    }

    #[test]
    fn totals_floor_at_zero() -> TestResult {
        let mut cart = Cart::new(iso::USD);
        cart.add_item(&product(1, 1000), 1)?;

        let coupon = CouponApplication::new(
            "BIG",
            Money::from_minor(100_000, iso::USD),
            DiscountType::Fixed,
        );

        let totals = compute_totals(&cart, Some(&coupon), &policy())?;

        assert_eq!(totals.total, Money::from_minor(0, iso::USD));
        assert_eq!(
            totals.discount,
            Money::from_minor(100_000, iso::USD),
            "discount must be reported as granted, not clamped"
        );

        Ok(())
    }

    #[test]
    fn compute_totals_is_pure() -> TestResult {
        let mut cart = Cart::new(iso::USD);
        cart.add_item(&product(1, 10000), 2)?;
        let lines_before = cart.lines().to_vec();

        let first = compute_totals(&cart, None, &policy())?;
        let second = compute_totals(&cart, None, &policy())?;

        assert_eq!(first, second);
        assert_eq!(cart.lines(), lines_before.as_slice());

        Ok(())
    }

    #[test]
    fn validation_names_first_missing_field() {
        let mut info = customer();
        info.phone = "   ".to_owned();

        assert_eq!(
            info.validate(),
            Err(ValidationError::MissingField("phone"))
        );
    }

    #[test]
    fn payload_captures_cart_at_build_time() -> TestResult {
        let mut cart = Cart::new(iso::USD);
        cart.add_item(&product(1, 10000), 2)?;

        let totals = compute_totals(&cart, None, &policy())?;
        let payload = OrderPayload::build(
            &cart,
            &customer(),
            &totals,
            PaymentMethod::CashOnDelivery,
            1,
        )?;

        cart.set_quantity(ProductId::new(1), 9);
        cart.add_item(&product(2, 500), 1)?;

        assert_eq!(payload.items().len(), 1);
        let line = payload.items().first().ok_or("line missing")?;
        assert_eq!(line.quantity(), 2);
        assert!((payload.total_amount() - 220.0).abs() < f64::EPSILON, "total drifted");
        assert_eq!(payload.shipping_address(), "12 Analytical Row, London, EC1");

        Ok(())
    }

    #[test]
    fn payload_rejects_empty_cart() -> TestResult {
        let cart = Cart::new(iso::USD);
        let totals = compute_totals(&cart, None, &policy())?;

        let result = OrderPayload::build(
            &cart,
            &customer(),
            &totals,
            PaymentMethod::PayPal,
            1,
        );

        assert_eq!(result, Err(ValidationError::EmptyCart));

        Ok(())
    }

    #[test]
    fn payload_serializes_wire_field_names() -> TestResult {
        let mut cart = Cart::new(iso::USD);
        cart.add_item(&product(1, 10000), 1)?;
        let totals = compute_totals(&cart, None, &policy())?;

        let payload = OrderPayload::build(
            &cart,
            &customer(),
            &totals,
            PaymentMethod::CashOnDelivery,
            7,
        )?;

        let value = serde_json::to_value(&payload)?;
        assert_eq!(value["payment_method"], "COD");
        assert_eq!(value["website_id"], 7);
        assert_eq!(value["items"][0]["product_id"], 1);
        assert_eq!(value["guest_name"], "Ada Lovelace");

        Ok(())
    }

    #[tokio::test]
    async fn apply_coupon_stores_single_application() -> TestResult {
        let mut cart = Cart::new(iso::USD);
        cart.add_item(&product(1, 10000), 2)?;

        let mut validator = MockCouponValidator::new();
        validator.expect_validate().returning(|code, _| {
            Ok(CouponApplication::new(
                &code,
                Money::from_minor(2000, iso::USD),
                DiscountType::Percentage,
            ))
        });

        let mut session = CheckoutSession::new();
        let applied = session.apply_coupon(&validator, " save10 ", &cart).await?;

        assert_eq!(applied.code(), "SAVE10");
        assert_eq!(session.state(), CheckoutState::CouponApplied);

        let second = session.apply_coupon(&validator, "OTHER", &cart).await;
        assert!(
            matches!(second, Err(CouponError::AlreadyApplied(code)) if code == "SAVE10"),
            "stacking a second coupon must be rejected"
        );

        Ok(())
    }

    #[tokio::test]
    async fn remove_coupon_allows_reapplying() -> TestResult {
        let mut cart = Cart::new(iso::USD);
        cart.add_item(&product(1, 10000), 2)?;

        let mut validator = MockCouponValidator::new();
        validator.expect_validate().returning(|code, _| {
            Ok(CouponApplication::new(
                &code,
                Money::from_minor(1000, iso::USD),
                DiscountType::Fixed,
            ))
        });

        let mut session = CheckoutSession::new();
        session.apply_coupon(&validator, "SAVE10", &cart).await?;

        session.remove_coupon();
        assert_eq!(session.state(), CheckoutState::Idle);
        assert!(session.coupon().is_none());

        let totals = session.totals(&cart, &policy())?;
        assert_eq!(totals.discount, Money::from_minor(0, iso::USD));

        session.apply_coupon(&validator, "SAVE10", &cart).await?;
        assert!(session.coupon().is_some());

        Ok(())
    }

    #[tokio::test]
    async fn apply_coupon_rejects_empty_code() -> TestResult {
        let cart = Cart::new(iso::USD);
        let validator = MockCouponValidator::new();
        let mut session = CheckoutSession::new();

        let result = session.apply_coupon(&validator, "   ", &cart).await;

        assert!(matches!(result, Err(CouponError::EmptyCode)));

        Ok(())
    }

    #[tokio::test]
    async fn rejected_coupon_leaves_state_unchanged() -> TestResult {
        let mut cart = Cart::new(iso::USD);
        cart.add_item(&product(1, 10000), 1)?;

        let mut validator = MockCouponValidator::new();
        validator
            .expect_validate()
            .returning(|_, _| Err(CouponError::Rejected("Invalid coupon code".to_owned())));

        let mut session = CheckoutSession::new();
        let result = session.apply_coupon(&validator, "NOPE", &cart).await;

        assert!(matches!(result, Err(CouponError::Rejected(msg)) if msg == "Invalid coupon code"));
        assert!(session.coupon().is_none());
        assert_eq!(session.state(), CheckoutState::Idle);

        Ok(())
    }

    #[tokio::test]
    async fn failed_submission_preserves_cart_and_coupon() -> TestResult {
        let mut cart = Cart::new(iso::USD);
        cart.add_item(&product(1, 10000), 2)?;

        let mut validator = MockCouponValidator::new();
        validator.expect_validate().returning(|code, _| {
            Ok(CouponApplication::new(
                &code,
                Money::from_minor(1000, iso::USD),
                DiscountType::Fixed,
            ))
        });

        let mut session = CheckoutSession::new();
        session.apply_coupon(&validator, "SAVE10", &cart).await?;

        let totals = session.totals(&cart, &policy())?;
        let payload = OrderPayload::build(
            &cart,
            &customer(),
            &totals,
            PaymentMethod::CashOnDelivery,
            1,
        )?;

        let mut gateway = MockOrderGateway::new();
        gateway
            .expect_submit()
            .returning(|_| Err(OrderError::Rejected("Payment declined".to_owned())));

        let result = session.submit_order(&gateway, &mut cart, payload).await;

        assert!(matches!(result, Err(OrderError::Rejected(msg)) if msg == "Payment declined"));
        assert_eq!(cart.len(), 1, "cart must survive a failed submission");
        assert!(session.coupon().is_some(), "coupon must survive a failed submission");
        assert_eq!(session.state(), CheckoutState::CouponApplied);

        Ok(())
    }

    #[tokio::test]
    async fn successful_submission_clears_cart_and_completes() -> TestResult {
        let mut cart = Cart::new(iso::USD);
        cart.add_item(&product(1, 10000), 2)?;

        let totals = compute_totals(&cart, None, &policy())?;
        let payload = OrderPayload::build(
            &cart,
            &customer(),
            &totals,
            PaymentMethod::CashOnDelivery,
            1,
        )?;

        let mut gateway = MockOrderGateway::new();
        gateway
            .expect_submit()
            .returning(|_| Ok(OrderId::new("ORD-1001")));

        let mut session = CheckoutSession::new();
        let order_id = session.submit_order(&gateway, &mut cart, payload).await?;

        assert_eq!(order_id, OrderId::new("ORD-1001"));
        assert!(cart.is_empty());
        assert_eq!(session.state(), CheckoutState::Completed);

        Ok(())
    }

    #[tokio::test]
    async fn submission_in_flight_blocks_second_submit() -> TestResult {
        let mut cart = Cart::new(iso::USD);
        cart.add_item(&product(1, 10000), 1)?;

        let totals = compute_totals(&cart, None, &policy())?;
        let payload = OrderPayload::build(
            &cart,
            &customer(),
            &totals,
            PaymentMethod::CashOnDelivery,
            1,
        )?;

        let gateway = MockOrderGateway::new();
        let mut session = CheckoutSession::new();
        session.force_state(CheckoutState::Submitting);

        let result = session.submit_order(&gateway, &mut cart, payload).await;

        assert!(matches!(result, Err(OrderError::SubmissionInFlight)));
        assert_eq!(cart.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn completed_session_rejects_resubmission() -> TestResult {
        let mut cart = Cart::new(iso::USD);
        cart.add_item(&product(1, 10000), 1)?;

        let totals = compute_totals(&cart, None, &policy())?;
        let payload = OrderPayload::build(
            &cart,
            &customer(),
            &totals,
            PaymentMethod::CashOnDelivery,
            1,
        )?;

        let mut gateway = MockOrderGateway::new();
        gateway
            .expect_submit()
            .times(1)
            .returning(|_| Ok(OrderId::new("ORD-1")));

        let mut session = CheckoutSession::new();
        session
            .submit_order(&gateway, &mut cart, payload.clone())
            .await?;

        let again = session.submit_order(&gateway, &mut cart, payload).await;
        assert!(matches!(again, Err(OrderError::AlreadyCompleted)));

        Ok(())
    }
}
