//! Session shopping cart and pricing.
//!
//! The cart is a plain serde value stored in the visitor's session. It holds
//! one line per product with the unit price captured when the product was
//! added, plus the two promo flags. All money derived from a cart comes from
//! [`Cart::totals`], which applies the one pricing formula used everywhere:
//!
//! ```text
//! subtotal   = Σ price × quantity
//! discounted = subtotal − subtotal × discount% / 100
//! shipping   = 0 if free_shipping or discounted ≥ 50, else 5.00
//! tax        = round(subtotal × 0.075, 2)        (pre-discount subtotal)
//! total      = discounted + shipping + tax
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{ProductId, round_cents};

/// Flat shipping fee charged below the free-shipping threshold.
pub const SHIPPING_FEE: Decimal = Decimal::from_parts(500, 0, 0, false, 2);

/// Discounted subtotal at which shipping becomes free.
pub const FREE_SHIPPING_THRESHOLD: Decimal = Decimal::from_parts(50, 0, 0, false, 0);

/// Sales tax rate (7.5%).
pub const TAX_RATE: Decimal = Decimal::from_parts(75, 0, 0, false, 3);

/// Percentage taken off by `WELCOME10`.
pub const WELCOME_DISCOUNT_PERCENT: u8 = 10;

/// Errors raised by cart mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CartError {
    #[error("Quantity must be at least 1")]
    InvalidQuantity,
    #[error("Not enough stock available")]
    InsufficientStock { available: i32 },
}

/// One product in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
    /// Unit price snapshot taken when the line was last added.
    pub price: Decimal,
}

impl CartLine {
    /// `price × quantity`.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Derived money figures for a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CartTotals {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub discounted_subtotal: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub free_shipping: bool,
}

/// A recognized promotional code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromoCode {
    /// 10% off the subtotal.
    Welcome10,
    /// Shipping is waived.
    FreeShip,
}

impl PromoCode {
    /// Look up a code typed by a shopper. Matching ignores case and
    /// surrounding whitespace.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_uppercase().as_str() {
            "WELCOME10" => Some(Self::Welcome10),
            "FREESHIP" => Some(Self::FreeShip),
            _ => None,
        }
    }
}

/// Result of [`Cart::apply_promo`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromoOutcome {
    Applied(PromoCode),
    AlreadyApplied(PromoCode),
    Invalid,
}

impl PromoOutcome {
    /// Shopper-facing message for this outcome.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Applied(PromoCode::Welcome10) => "Promo code applied: 10% discount!",
            Self::Applied(PromoCode::FreeShip) => "Promo code applied: Free shipping!",
            Self::AlreadyApplied(_) => "This promo code has already been applied",
            Self::Invalid => "Invalid promo code",
        }
    }
}

/// The session cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
    #[serde(default)]
    discount_percentage: u8,
    #[serde(default)]
    free_shipping: bool,
}

impl Cart {
    /// An empty cart with no promos.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            lines: Vec::new(),
            discount_percentage: 0,
            free_shipping: false,
        }
    }

    /// Add `quantity` of a product, refreshing its price snapshot.
    ///
    /// The resulting line quantity may not exceed `stock`.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidQuantity`] for a zero quantity and
    /// [`CartError::InsufficientStock`] when the line would exceed stock.
    pub fn add(
        &mut self,
        product_id: ProductId,
        price: Decimal,
        quantity: u32,
        stock: i32,
    ) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }
        let existing = self.quantity_of(product_id);
        let wanted = existing.saturating_add(quantity);
        check_stock(wanted, stock)?;

        match self.line_mut(product_id) {
            Some(line) => {
                line.quantity = wanted;
                line.price = price;
            }
            None => self.lines.push(CartLine {
                product_id,
                quantity,
                price,
            }),
        }
        Ok(())
    }

    /// Replace a line's quantity. Zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InsufficientStock`] when `quantity > stock`.
    pub fn set_quantity(
        &mut self,
        product_id: ProductId,
        price: Decimal,
        quantity: u32,
        stock: i32,
    ) -> Result<(), CartError> {
        if quantity == 0 {
            self.remove(product_id);
            return Ok(());
        }
        check_stock(quantity, stock)?;

        match self.line_mut(product_id) {
            Some(line) => line.quantity = quantity,
            None => self.lines.push(CartLine {
                product_id,
                quantity,
                price,
            }),
        }
        Ok(())
    }

    /// Remove a product. Returns `true` if it was in the cart.
    pub fn remove(&mut self, product_id: ProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| line.product_id != product_id);
        self.lines.len() != before
    }

    /// Keep only the lines whose product passes `keep`. Returns how many
    /// lines were dropped.
    pub fn retain(&mut self, mut keep: impl FnMut(ProductId) -> bool) -> usize {
        let before = self.lines.len();
        self.lines.retain(|line| keep(line.product_id));
        before - self.lines.len()
    }

    /// Drop every line and both promo flags.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Apply a promo code typed by the shopper.
    ///
    /// Codes are idempotent: applying one whose effect is already present
    /// leaves the cart unchanged.
    pub fn apply_promo(&mut self, input: &str) -> PromoOutcome {
        let Some(code) = PromoCode::parse(input) else {
            return PromoOutcome::Invalid;
        };
        match code {
            PromoCode::Welcome10 if self.discount_percentage > 0 => {
                PromoOutcome::AlreadyApplied(code)
            }
            PromoCode::Welcome10 => {
                self.discount_percentage = WELCOME_DISCOUNT_PERCENT;
                PromoOutcome::Applied(code)
            }
            PromoCode::FreeShip if self.free_shipping => PromoOutcome::AlreadyApplied(code),
            PromoCode::FreeShip => {
                self.free_shipping = true;
                PromoOutcome::Applied(code)
            }
        }
    }

    /// Lines in the order they were first added.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Product IDs in the cart.
    pub fn product_ids(&self) -> impl Iterator<Item = ProductId> + '_ {
        self.lines.iter().map(|line| line.product_id)
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn len(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Quantity of a product currently in the cart (0 if absent).
    #[must_use]
    pub fn quantity_of(&self, product_id: ProductId) -> u32 {
        self.line(product_id).map_or(0, |line| line.quantity)
    }

    /// `price × quantity` for one product (0 if absent).
    #[must_use]
    pub fn item_total(&self, product_id: ProductId) -> Decimal {
        self.line(product_id).map_or(Decimal::ZERO, CartLine::total)
    }

    #[must_use]
    pub const fn discount_percentage(&self) -> u8 {
        self.discount_percentage
    }

    /// Whether shipping is waived, by promo or by reaching the threshold.
    #[must_use]
    pub fn has_free_shipping(&self) -> bool {
        self.totals().free_shipping
    }

    /// Compute every money figure for the cart.
    #[must_use]
    pub fn totals(&self) -> CartTotals {
        let subtotal: Decimal = self.lines.iter().map(CartLine::total).sum();
        let discount = subtotal * Decimal::from(self.discount_percentage) / Decimal::ONE_HUNDRED;
        let discounted_subtotal = subtotal - discount;
        let free_shipping = self.free_shipping || discounted_subtotal >= FREE_SHIPPING_THRESHOLD;
        let shipping = if free_shipping || self.lines.is_empty() {
            Decimal::ZERO
        } else {
            SHIPPING_FEE
        };
        let tax = round_cents(subtotal * TAX_RATE);

        CartTotals {
            subtotal,
            discount,
            discounted_subtotal,
            shipping,
            tax,
            total: discounted_subtotal + shipping + tax,
            free_shipping,
        }
    }

    fn line(&self, product_id: ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.product_id == product_id)
    }

    fn line_mut(&mut self, product_id: ProductId) -> Option<&mut CartLine> {
        self.lines
            .iter_mut()
            .find(|line| line.product_id == product_id)
    }
}

fn check_stock(quantity: u32, stock: i32) -> Result<(), CartError> {
    let available = stock.max(0);
    if i64::from(quantity) > i64::from(available) {
        return Err(CartError::InsufficientStock { available });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dollars(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    fn cart_with(lines: &[(i32, i64, u32)]) -> Cart {
        let mut cart = Cart::new();
        for &(id, cents, qty) in lines {
            cart.add(ProductId::new(id), dollars(cents), qty, 100).unwrap();
        }
        cart
    }

    #[test]
    fn test_subtotal_ignores_insertion_order() {
        let lines = [(1, 1_250, 2), (2, 399, 3), (3, 10_000, 1)];
        let forward = cart_with(&lines);
        let mut reversed_lines = lines;
        reversed_lines.reverse();
        let backward = cart_with(&reversed_lines);

        let expected = dollars(1_250 * 2 + 399 * 3 + 10_000);
        assert_eq!(forward.totals().subtotal, expected);
        assert_eq!(backward.totals().subtotal, expected);
    }

    #[test]
    fn test_small_cart_pays_shipping_and_tax_once() {
        let cart = cart_with(&[(1, 2_000, 1)]);
        let totals = cart.totals();

        assert_eq!(totals.subtotal, dollars(2_000));
        assert_eq!(totals.shipping, SHIPPING_FEE);
        assert_eq!(totals.tax, dollars(150));
        assert_eq!(totals.total, dollars(2_000 + 500 + 150));
    }

    #[test]
    fn test_tax_uses_pre_discount_subtotal() {
        let mut cart = cart_with(&[(1, 10_000, 1)]);
        cart.apply_promo("WELCOME10");
        let totals = cart.totals();

        assert_eq!(totals.discount, dollars(1_000));
        assert_eq!(totals.discounted_subtotal, dollars(9_000));
        assert_eq!(totals.tax, dollars(750));
        assert_eq!(totals.shipping, Decimal::ZERO);
        assert_eq!(totals.total, dollars(9_000 + 750));
    }

    #[test]
    fn test_discount_keeps_fractional_cents() {
        let mut cart = cart_with(&[(1, 1_235, 1)]);
        cart.apply_promo("WELCOME10");
        let totals = cart.totals();

        assert_eq!(totals.discount, Decimal::new(1_235, 3));
        assert_eq!(totals.discounted_subtotal, Decimal::new(11_115, 3));
        assert_eq!(totals.tax, dollars(93));
        assert_eq!(totals.total, Decimal::new(11_115, 3) + SHIPPING_FEE + dollars(93));
    }

    #[test]
    fn test_retain_drops_lines_but_keeps_promos() {
        let mut cart = cart_with(&[(1, 2_000, 1), (2, 9_999, 1), (3, 500, 2)]);
        cart.apply_promo("FREESHIP");

        assert_eq!(cart.retain(|id| id != ProductId::new(2)), 1);
        assert_eq!(
            cart.product_ids().collect::<Vec<_>>(),
            [ProductId::new(1), ProductId::new(3)]
        );
        assert_eq!(cart.totals().subtotal, dollars(3_000));
        assert!(cart.has_free_shipping());
        assert_eq!(cart.retain(|_| true), 0);
    }

    #[test]
    fn test_welcome10_is_idempotent() {
        let mut once = cart_with(&[(1, 3_000, 2)]);
        assert_eq!(
            once.apply_promo("WELCOME10"),
            PromoOutcome::Applied(PromoCode::Welcome10)
        );

        let mut twice = once.clone();
        assert_eq!(
            twice.apply_promo(" welcome10 "),
            PromoOutcome::AlreadyApplied(PromoCode::Welcome10)
        );
        assert_eq!(once.totals(), twice.totals());
        assert_eq!(twice.discount_percentage(), 10);
    }

    #[test]
    fn test_free_shipping_iff_flag_or_threshold() {
        // Below threshold, no flag.
        let mut cart = cart_with(&[(1, 4_999, 1)]);
        assert!(!cart.has_free_shipping());

        // Flag alone is enough.
        assert_eq!(
            cart.apply_promo("freeship"),
            PromoOutcome::Applied(PromoCode::FreeShip)
        );
        assert!(cart.has_free_shipping());
        assert_eq!(cart.totals().shipping, Decimal::ZERO);

        // Threshold alone is enough.
        let cart = cart_with(&[(1, 5_000, 1)]);
        assert!(cart.has_free_shipping());

        // Threshold is checked after the discount.
        let mut cart = cart_with(&[(1, 5_500, 1)]);
        cart.apply_promo("WELCOME10");
        assert_eq!(cart.totals().discounted_subtotal, dollars(4_950));
        assert!(!cart.has_free_shipping());
        assert_eq!(cart.totals().shipping, SHIPPING_FEE);
    }

    #[test]
    fn test_unknown_promo_is_invalid() {
        let mut cart = cart_with(&[(1, 1_000, 1)]);
        let before = cart.clone();
        assert_eq!(cart.apply_promo("SAVE50"), PromoOutcome::Invalid);
        assert_eq!(cart, before);
        assert_eq!(PromoOutcome::Invalid.message(), "Invalid promo code");
    }

    #[test]
    fn test_readd_accumulates_and_refreshes_price() {
        let mut cart = Cart::new();
        let id = ProductId::new(7);
        cart.add(id, dollars(1_000), 1, 10).unwrap();
        cart.add(id, dollars(1_200), 2, 10).unwrap();

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.quantity_of(id), 3);
        assert_eq!(cart.item_total(id), dollars(3_600));
        assert_eq!(cart.len(), 3);
    }

    #[test]
    fn test_stock_limits() {
        let mut cart = Cart::new();
        let id = ProductId::new(1);
        assert_eq!(
            cart.add(id, dollars(100), 4, 3),
            Err(CartError::InsufficientStock { available: 3 })
        );
        cart.add(id, dollars(100), 2, 3).unwrap();
        assert!(cart.add(id, dollars(100), 2, 3).is_err());
        assert_eq!(cart.add(id, dollars(100), 0, 3), Err(CartError::InvalidQuantity));
        assert!(cart.set_quantity(id, dollars(100), 4, 3).is_err());
        cart.set_quantity(id, dollars(100), 3, 3).unwrap();
        assert_eq!(cart.quantity_of(id), 3);
    }

    #[test]
    fn test_set_quantity_zero_removes() {
        let mut cart = cart_with(&[(1, 100, 1), (2, 100, 1)]);
        cart.set_quantity(ProductId::new(1), dollars(100), 0, 0).unwrap();
        assert_eq!(cart.product_ids().collect::<Vec<_>>(), vec![ProductId::new(2)]);
    }

    #[test]
    fn test_clear_drops_promos() {
        let mut cart = cart_with(&[(1, 100, 1)]);
        cart.apply_promo("WELCOME10");
        cart.apply_promo("FREESHIP");
        cart.clear();

        assert!(cart.is_empty());
        assert_eq!(cart, Cart::new());
        assert_eq!(cart.totals().total, Decimal::ZERO);
    }

    #[test]
    fn test_session_round_trip_keeps_snapshot() {
        let mut cart = cart_with(&[(3, 1_999, 2)]);
        cart.apply_promo("FREESHIP");
        let json = serde_json::to_value(&cart).unwrap();
        let restored: Cart = serde_json::from_value(json).unwrap();
        assert_eq!(restored, cart);
        assert_eq!(restored.lines()[0].price, dollars(1_999));
    }
}
