//! Order placement.
//!
//! Validates the shipping address and cart against live catalog rows, prices
//! the cart (18% tax, flat shipping fee waived at the free-shipping
//! threshold), persists the order across `orders`, `order_items`,
//! `shipping_info` and `payments`, decrements stock, and either records a
//! cash-on-delivery payment or requests a payment intent from the gateway.
//!
//! The persistence sequence runs as independent statements on pooled
//! connections with **no surrounding transaction**: the stock check is not
//! atomic with the later decrement (concurrent submissions can oversell),
//! and a failure mid-sequence leaves the earlier rows in place. There is no
//! idempotency key, so a double submit creates two orders. Callers of the
//! public API own resubmission.

use rust_decimal::{Decimal, RoundingStrategy};
use sqlx::PgPool;
use thiserror::Error;

use tamarind_core::{PaymentMethod, PaymentStatus, ProductId, UserId};

use crate::db::{OrderRepository, ProductRepository, RepositoryError};
use crate::models::order::{Order, OrderedItem, PlaceOrderInput, ShippingFields};
use crate::models::product::Product;
use crate::schema::COD_TOTAL_LIMIT;
use crate::services::payments::{PaymentClient, PaymentError, PaymentIntent};

/// Tax rate applied to the items subtotal.
const TAX_RATE: Decimal = Decimal::from_parts(18, 0, 0, false, 2); // 0.18

/// Subtotals at or above this ship free.
const FREE_SHIPPING_THRESHOLD: Decimal = Decimal::from_parts(50, 0, 0, false, 0);

/// Flat shipping fee below the threshold.
const FLAT_SHIPPING_FEE: Decimal = Decimal::from_parts(2, 0, 0, false, 0);

/// Intent id recorded for cash-on-delivery payments.
const COD_INTENT_ID: &str = "COD";

/// Errors that can occur during order placement.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// A required shipping field is absent or blank.
    #[error("shipping field '{0}' is required")]
    MissingShippingField(&'static str),

    /// The cart is empty.
    #[error("cart is empty")]
    EmptyCart,

    /// A cart line has a non-positive quantity.
    #[error("quantity for product {0} must be at least 1")]
    InvalidQuantity(ProductId),

    /// A cart line references a product that doesn't exist.
    #[error("product {0} does not exist")]
    UnknownProduct(ProductId),

    /// A cart line asks for more units than are in stock.
    #[error(
        "insufficient stock for '{name}' (product {product_id}): requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        name: String,
        requested: i32,
        available: i32,
    },

    /// The database trigger vetoed cash on delivery for this total.
    #[error("cash on delivery is not available for totals above {COD_TOTAL_LIMIT}")]
    CodLimitExceeded,

    /// The payment gateway rejected or failed the intent request. The order
    /// row already exists at this point; there is no compensating rollback.
    #[error("payment gateway error: {0}")]
    Payment(#[from] PaymentError),

    /// Database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// A cart line priced against a live catalog row, with the snapshot data
/// that gets copied onto the order item.
#[derive(Debug, Clone)]
pub struct PricedLine {
    pub product_id: ProductId,
    pub name: String,
    pub image_url: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_subtotal: Decimal,
}

/// Computed order totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartTotals {
    pub items_subtotal: Decimal,
    pub tax_amount: Decimal,
    pub shipping_amount: Decimal,
    /// Grand total, rounded to the nearest integer unit.
    pub total_amount: Decimal,
}

/// Result of a successful placement.
#[derive(Debug)]
pub struct PlacedOrder {
    pub order: Order,
    /// Present for online payments; the client confirms with the secret.
    pub payment_intent: Option<PaymentIntent>,
}

/// Order placement service.
pub struct CheckoutService<'a> {
    products: ProductRepository<'a>,
    orders: OrderRepository<'a>,
    payments: &'a PaymentClient,
}

impl<'a> CheckoutService<'a> {
    /// Create a new checkout service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, payments: &'a PaymentClient) -> Self {
        Self {
            products: ProductRepository::new(pool),
            orders: OrderRepository::new(pool),
            payments,
        }
    }

    /// Place an order for a buyer.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a bad address or cart, a
    /// `CodLimitExceeded` error when the payments trigger fires, a
    /// `Payment` error when the gateway call fails (the order rows remain),
    /// or a `Repository` error for database failures.
    pub async fn place_order(
        &self,
        buyer: UserId,
        input: &PlaceOrderInput,
    ) -> Result<PlacedOrder, CheckoutError> {
        // Step 1: reject bad shipping data and empty carts up front.
        validate_shipping(&input.shipping_info)?;
        if input.ordered_items.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        // Step 2: one lookup for every referenced product. The stock check
        // below is point-in-time only; nothing holds it until the decrement.
        let ids: Vec<ProductId> = input.ordered_items.iter().map(|i| i.product_id).collect();
        let products = self.products.get_by_ids(&ids).await?;

        // Steps 3-4: price the cart and compute totals.
        let lines = price_cart(&input.ordered_items, &products)?;
        let totals = cart_totals(lines.iter().map(|l| l.line_subtotal).sum());

        // Step 5: sequential, independent statements. A crash between any
        // two of these leaves the earlier rows in place.
        let order = self
            .orders
            .insert_order(
                buyer,
                totals.items_subtotal,
                totals.tax_amount,
                totals.shipping_amount,
                totals.total_amount,
            )
            .await?;

        for line in &lines {
            self.orders
                .insert_order_item(
                    order.id,
                    line.product_id,
                    &line.name,
                    line.image_url.as_deref(),
                    line.quantity,
                    line.unit_price,
                )
                .await?;
        }

        for line in &lines {
            self.products
                .decrement_stock(line.product_id, line.quantity)
                .await?;
        }

        self.orders
            .insert_shipping_info(order.id, &input.shipping_info)
            .await?;

        // Step 6: branch on payment method.
        let payment_intent = match input.payment_method {
            PaymentMethod::Cod => {
                self.orders
                    .insert_payment(order.id, PaymentMethod::Cod, PaymentStatus::Pending, COD_INTENT_ID)
                    .await
                    .map_err(map_cod_trigger)?;
                None
            }
            PaymentMethod::Online => {
                let intent = self
                    .payments
                    .create_intent(order.id, totals.total_amount)
                    .await?;
                self.orders
                    .insert_payment(
                        order.id,
                        PaymentMethod::Online,
                        PaymentStatus::Pending,
                        &intent.intent_id,
                    )
                    .await?;
                Some(intent)
            }
        };

        tracing::info!(
            order_id = %order.id,
            buyer = %buyer,
            total = %totals.total_amount,
            method = %input.payment_method,
            "order placed"
        );

        Ok(PlacedOrder {
            order,
            payment_intent,
        })
    }
}

/// Translate the `payments_cod_limit` trigger exception into a typed error.
fn map_cod_trigger(err: RepositoryError) -> CheckoutError {
    if let RepositoryError::Database(sqlx::Error::Database(ref db_err)) = err
        && db_err.code().as_deref() == Some("P0001")
    {
        return CheckoutError::CodLimitExceeded;
    }
    CheckoutError::Repository(err)
}

/// Require every shipping field to be present and non-blank.
fn validate_shipping(shipping: &ShippingFields) -> Result<(), CheckoutError> {
    let fields: [(&'static str, &str); 7] = [
        ("name", &shipping.name),
        ("address", &shipping.address),
        ("city", &shipping.city),
        ("state", &shipping.state),
        ("country", &shipping.country),
        ("pincode", &shipping.pincode),
        ("phone", &shipping.phone),
    ];

    for (field, value) in fields {
        if value.trim().is_empty() {
            return Err(CheckoutError::MissingShippingField(field));
        }
    }

    Ok(())
}

/// Price each cart line against the fetched products.
///
/// Rejects lines referencing unknown products (naming the id) and lines
/// requesting more than the current stock (naming product and availability).
fn price_cart(items: &[OrderedItem], products: &[Product]) -> Result<Vec<PricedLine>, CheckoutError> {
    let mut lines = Vec::with_capacity(items.len());

    for item in items {
        if item.quantity < 1 {
            return Err(CheckoutError::InvalidQuantity(item.product_id));
        }

        let product = products
            .iter()
            .find(|p| p.id == item.product_id)
            .ok_or(CheckoutError::UnknownProduct(item.product_id))?;

        if item.quantity > product.stock {
            return Err(CheckoutError::InsufficientStock {
                product_id: product.id,
                name: product.name.clone(),
                requested: item.quantity,
                available: product.stock,
            });
        }

        let unit_price = product.price;
        lines.push(PricedLine {
            product_id: product.id,
            name: product.name.clone(),
            image_url: product.images.first().map(|i| i.url.clone()),
            quantity: item.quantity,
            unit_price,
            line_subtotal: unit_price * Decimal::from(item.quantity),
        });
    }

    Ok(lines)
}

/// Compute tax, shipping and the rounded grand total for a subtotal.
///
/// The grand total rounds to the nearest integer unit, midpoint away from
/// zero (matching a conventional `round`).
#[must_use]
pub fn cart_totals(items_subtotal: Decimal) -> CartTotals {
    let tax_amount = items_subtotal * TAX_RATE;
    let shipping_amount = if items_subtotal >= FREE_SHIPPING_THRESHOLD {
        Decimal::ZERO
    } else {
        FLAT_SHIPPING_FEE
    };
    let total_amount = (items_subtotal + tax_amount + shipping_amount)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);

    CartTotals {
        items_subtotal,
        tax_amount,
        shipping_amount,
        total_amount,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn product(id: i32, name: &str, price: &str, stock: i32) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_owned(),
            description: String::new(),
            price: dec(price),
            stock,
            category: "misc".to_owned(),
            rating: Decimal::ZERO,
            review_count: 0,
            images: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn shipping() -> ShippingFields {
        ShippingFields {
            name: "Ada Lovelace".to_owned(),
            address: "12 Analytical Way".to_owned(),
            city: "London".to_owned(),
            state: "LDN".to_owned(),
            country: "UK".to_owned(),
            pincode: "E1 6AN".to_owned(),
            phone: "5550100".to_owned(),
        }
    }

    #[test]
    fn test_totals_small_cart_pays_tax_and_shipping() {
        // 2 x 10 = 20, tax 3.6, shipping 2, round(25.6) = 26
        let totals = cart_totals(dec("20"));
        assert_eq!(totals.tax_amount, dec("3.6"));
        assert_eq!(totals.shipping_amount, dec("2"));
        assert_eq!(totals.total_amount, dec("26"));
    }

    #[test]
    fn test_totals_free_shipping_at_threshold() {
        let totals = cart_totals(dec("50"));
        assert_eq!(totals.shipping_amount, Decimal::ZERO);
        assert_eq!(totals.total_amount, dec("59"));
    }

    #[test]
    fn test_totals_free_shipping_above_threshold() {
        let totals = cart_totals(dec("100"));
        assert_eq!(totals.shipping_amount, Decimal::ZERO);
        assert_eq!(totals.total_amount, dec("118"));
    }

    #[test]
    fn test_totals_midpoint_rounds_away_from_zero() {
        // 75 * 1.18 = 88.5 exactly; a conventional round gives 89
        let totals = cart_totals(dec("75"));
        assert_eq!(totals.total_amount, dec("89"));
    }

    #[test]
    fn test_validate_shipping_accepts_complete_address() {
        assert!(validate_shipping(&shipping()).is_ok());
    }

    #[test]
    fn test_validate_shipping_names_missing_field() {
        let mut s = shipping();
        s.city = String::new();
        assert!(matches!(
            validate_shipping(&s),
            Err(CheckoutError::MissingShippingField("city"))
        ));

        let mut s = shipping();
        s.phone = "   ".to_owned();
        assert!(matches!(
            validate_shipping(&s),
            Err(CheckoutError::MissingShippingField("phone"))
        ));
    }

    #[test]
    fn test_price_cart_snapshots_price_and_sums_lines() {
        let products = vec![product(1, "Widget", "10.00", 5), product(2, "Gadget", "7.50", 3)];
        let items = vec![
            OrderedItem {
                product_id: ProductId::new(1),
                quantity: 2,
            },
            OrderedItem {
                product_id: ProductId::new(2),
                quantity: 1,
            },
        ];

        let lines = price_cart(&items, &products).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].line_subtotal, dec("20.00"));
        assert_eq!(lines[1].line_subtotal, dec("7.50"));

        let subtotal: Decimal = lines.iter().map(|l| l.line_subtotal).sum();
        assert_eq!(subtotal, dec("27.50"));
    }

    #[test]
    fn test_price_cart_rejects_unknown_product() {
        let products = vec![product(1, "Widget", "10.00", 5)];
        let items = vec![OrderedItem {
            product_id: ProductId::new(99),
            quantity: 1,
        }];

        assert!(matches!(
            price_cart(&items, &products),
            Err(CheckoutError::UnknownProduct(id)) if id == ProductId::new(99)
        ));
    }

    #[test]
    fn test_price_cart_rejects_insufficient_stock() {
        let products = vec![product(1, "Widget", "10.00", 2)];
        let items = vec![OrderedItem {
            product_id: ProductId::new(1),
            quantity: 3,
        }];

        match price_cart(&items, &products) {
            Err(CheckoutError::InsufficientStock {
                product_id,
                requested,
                available,
                ..
            }) => {
                assert_eq!(product_id, ProductId::new(1));
                assert_eq!(requested, 3);
                assert_eq!(available, 2);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
    }

    #[test]
    fn test_price_cart_rejects_non_positive_quantity() {
        let products = vec![product(1, "Widget", "10.00", 5)];
        let items = vec![OrderedItem {
            product_id: ProductId::new(1),
            quantity: 0,
        }];

        assert!(matches!(
            price_cart(&items, &products),
            Err(CheckoutError::InvalidQuantity(_))
        ));
    }

    #[test]
    fn test_cod_limit_message_names_the_limit() {
        let message = CheckoutError::CodLimitExceeded.to_string();
        assert!(message.contains("10000"));
    }
}
