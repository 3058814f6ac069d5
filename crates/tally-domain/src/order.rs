//! Order and line item entities

use serde::{Deserialize, Serialize};

/// An order, one per invoice
///
/// `order_id` is the primary key. It is assigned by whoever issued the invoice
/// and is treated as an opaque string. Every other attribute is best-effort:
/// contact fields come straight from OCR'd text, and records created through
/// the Record API may omit the numeric fields entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Externally assigned identifier (primary key)
    pub order_id: String,

    /// Customer name, if one could be read
    #[serde(default)]
    pub customer_name: Option<String>,

    /// Customer email address
    #[serde(default)]
    pub email: Option<String>,

    /// Customer phone number
    #[serde(default)]
    pub phone: Option<String>,

    /// Sum of the quantities of every line item
    #[serde(default)]
    pub total_qty: Option<u32>,

    /// Total before tax
    #[serde(default)]
    pub subtotal: Option<f64>,

    /// Tax amount
    #[serde(default)]
    pub vat: Option<f64>,

    /// Total including tax
    #[serde(default)]
    pub grand_total: Option<f64>,
}

impl Order {
    /// Create an order carrying only its identifier
    ///
    /// # Examples
    ///
    /// ```
    /// use tally_domain::Order;
    ///
    /// let order = Order::new("A100");
    /// assert_eq!(order.order_id, "A100");
    /// assert!(order.grand_total.is_none());
    /// ```
    pub fn new(order_id: impl Into<String>) -> Self {
        Self {
            order_id: order_id.into(),
            customer_name: None,
            email: None,
            phone: None,
            total_qty: None,
            subtotal: None,
            vat: None,
            grand_total: None,
        }
    }

    /// Apply a partial update, leaving absent fields untouched
    pub fn apply(&mut self, patch: &OrderPatch) {
        if let Some(v) = &patch.customer_name {
            self.customer_name = Some(v.clone());
        }
        if let Some(v) = &patch.email {
            self.email = Some(v.clone());
        }
        if let Some(v) = &patch.phone {
            self.phone = Some(v.clone());
        }
        if let Some(v) = patch.total_qty {
            self.total_qty = Some(v);
        }
        if let Some(v) = patch.subtotal {
            self.subtotal = Some(v);
        }
        if let Some(v) = patch.vat {
            self.vat = Some(v);
        }
        if let Some(v) = patch.grand_total {
            self.grand_total = Some(v);
        }
    }
}

/// One line of an invoice
///
/// Line items are written once, together with their order, and never mutated
/// on their own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Owning order
    pub order_id: String,

    /// Product identifier (SKU, barcode, ...)
    #[serde(default)]
    pub product_id: Option<String>,

    /// Product title
    #[serde(default)]
    pub title: Option<String>,

    /// Quantity, always positive
    pub quantity: u32,

    /// Line total in currency units
    pub line_total: f64,
}

/// Partial update for an order
///
/// Only fields that are `Some` are applied. The order identifier is not part
/// of a patch: it is immutable once assigned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderPatch {
    /// New customer name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,

    /// New email
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// New phone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// New total quantity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_qty: Option<u32>,

    /// New subtotal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtotal: Option<f64>,

    /// New tax amount
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vat: Option<f64>,

    /// New grand total
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grand_total: Option<f64>,
}

impl OrderPatch {
    /// True if the patch would change nothing
    pub fn is_empty(&self) -> bool {
        *self == OrderPatch::default()
    }
}
