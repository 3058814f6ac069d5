//! Extracted invoice - the hand-off between extraction and ingestion

use crate::order::{LineItem, Order};
use serde::Serialize;

/// An order together with its line items, as read from one document
///
/// The only way to build one is [`ExtractedInvoice::new`], which derives
/// `total_qty` from the items and stamps every item with the order's id, so an
/// `ExtractedInvoice` is always internally consistent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedInvoice {
    order: Order,
    items: Vec<LineItem>,
}

impl ExtractedInvoice {
    /// Assemble an invoice from an order header and its line items
    ///
    /// Any `total_qty` already present on `order` is discarded and recomputed.
    /// Returns `None` if the summed quantity does not fit in a `u32`.
    ///
    /// # Examples
    ///
    /// ```
    /// use tally_domain::{ExtractedInvoice, LineItem, Order};
    ///
    /// let item = |qty| LineItem {
    ///     order_id: String::new(),
    ///     product_id: None,
    ///     title: None,
    ///     quantity: qty,
    ///     line_total: 1.0,
    /// };
    /// let invoice = ExtractedInvoice::new(Order::new("A100"), vec![item(1), item(2)]).unwrap();
    /// assert_eq!(invoice.total_qty(), 3);
    /// assert!(invoice.items().iter().all(|i| i.order_id == "A100"));
    /// ```
    pub fn new(mut order: Order, mut items: Vec<LineItem>) -> Option<Self> {
        let total = items
            .iter()
            .try_fold(0u32, |acc, item| acc.checked_add(item.quantity))?;
        for item in &mut items {
            item.order_id = order.order_id.clone();
        }
        order.total_qty = Some(total);
        Some(Self { order, items })
    }

    /// The order identifier
    pub fn order_id(&self) -> &str {
        &self.order.order_id
    }

    /// The order header
    pub fn order(&self) -> &Order {
        &self.order
    }

    /// Line items, in document order
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Sum of line item quantities
    pub fn total_qty(&self) -> u32 {
        self.order.total_qty.unwrap_or(0)
    }

    /// Consume the invoice, returning its parts
    pub fn into_parts(self) -> (Order, Vec<LineItem>) {
        (self.order, self.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn item(order_id: &str, quantity: u32) -> LineItem {
        LineItem {
            order_id: order_id.to_string(),
            product_id: Some("P1".to_string()),
            title: Some("Widget".to_string()),
            quantity,
            line_total: 2.5 * quantity as f64,
        }
    }

    #[test]
    fn test_model_supplied_total_is_ignored() {
        let mut order = Order::new("A100");
        order.total_qty = Some(99);

        let invoice = ExtractedInvoice::new(order, vec![item("A100", 1), item("A100", 2)]).unwrap();
        assert_eq!(invoice.total_qty(), 3);
        assert_eq!(invoice.order().total_qty, Some(3));
    }

    #[test]
    fn test_items_are_restamped_with_order_id() {
        let invoice = ExtractedInvoice::new(Order::new("A100"), vec![item("other", 1)]).unwrap();
        assert_eq!(invoice.items()[0].order_id, "A100");
    }

    #[test]
    fn test_no_items_means_zero_quantity() {
        let invoice = ExtractedInvoice::new(Order::new("EMPTY"), Vec::new()).unwrap();
        assert_eq!(invoice.total_qty(), 0);
        assert!(invoice.items().is_empty());
    }

    #[test]
    fn test_quantity_overflow_is_refused() {
        let items = vec![item("BIG", 4_000_000_000), item("BIG", 4_000_000_000)];
        assert!(ExtractedInvoice::new(Order::new("BIG"), items).is_none());

        let items = vec![item("MAX", u32::MAX - 1), item("MAX", 1)];
        let invoice = ExtractedInvoice::new(Order::new("MAX"), items).unwrap();
        assert_eq!(invoice.total_qty(), u32::MAX);
    }

    proptest! {
        #[test]
        fn prop_total_qty_is_sum_of_quantities(quantities in proptest::collection::vec(1u32..1000, 0..50)) {
            let items: Vec<_> = quantities.iter().map(|q| item("X", *q)).collect();
            let invoice = ExtractedInvoice::new(Order::new("X"), items).unwrap();
            prop_assert_eq!(invoice.total_qty(), quantities.iter().sum::<u32>());
            prop_assert_eq!(invoice.items().len(), quantities.len());
        }
    }
}
