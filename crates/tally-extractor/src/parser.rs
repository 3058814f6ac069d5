//! Parse completion output into an extracted invoice
//!
//! Everything here is a pure function of the completion text. The model is
//! asked for strict JSON but nothing guarantees it, so each field is checked
//! individually and any violation becomes [`ExtractionError::MalformedResponse`]
//! with the raw completion attached.

use crate::error::ExtractionError;
use serde_json::{Map, Value};
use tally_domain::{ExtractedInvoice, LineItem, Order};
use tally_llm::strip_code_fence;

/// Parse a completion into an [`ExtractedInvoice`]
///
/// Required keys are `order_id`, `items`, `subtotal`, `vat` and `grand_total`.
/// The three amounts may be `null`; the keys themselves must be present.
/// Contact fields are optional and placeholder values such as `"None"` or
/// `"N/A"` are treated as absent. `total_qty` is always recomputed from the
/// items, whatever the model says.
pub fn parse_invoice_response(response: &str) -> Result<ExtractedInvoice, ExtractionError> {
    let malformed = |reason: String| ExtractionError::MalformedResponse {
        reason,
        raw: response.to_string(),
    };

    let json_str = strip_code_fence(response);
    if json_str.is_empty() {
        return Err(malformed("Empty response".to_string()));
    }

    let json: Value = serde_json::from_str(json_str)
        .map_err(|e| malformed(format!("JSON parse error: {}", e)))?;

    let obj = json
        .as_object()
        .ok_or_else(|| malformed("Expected a JSON object".to_string()))?;

    parse_invoice_object(obj).map_err(malformed)
}

fn parse_invoice_object(obj: &Map<String, Value>) -> Result<ExtractedInvoice, String> {
    let order_id = obj
        .get("order_id")
        .and_then(text_value)
        .ok_or_else(|| "Missing or invalid 'order_id'".to_string())?;

    let items_json = obj
        .get("items")
        .ok_or_else(|| "Missing 'items'".to_string())?
        .as_array()
        .ok_or_else(|| "'items' is not a list".to_string())?;

    let items = items_json
        .iter()
        .enumerate()
        .map(|(idx, item)| parse_line_item(item).map_err(|e| format!("Item {}: {}", idx, e)))
        .collect::<Result<Vec<_>, _>>()?;

    let mut order = Order::new(order_id);
    order.customer_name = obj.get("customer_name").and_then(text_value);
    order.email = obj.get("email").and_then(text_value);
    order.phone = obj.get("phone").and_then(text_value);
    order.subtotal = required_amount(obj, "subtotal")?;
    order.vat = required_amount(obj, "vat")?;
    order.grand_total = required_amount(obj, "grand_total")?;

    ExtractedInvoice::new(order, items).ok_or_else(|| "Total quantity out of range".to_string())
}

fn parse_line_item(json: &Value) -> Result<LineItem, String> {
    let obj = json
        .as_object()
        .ok_or_else(|| "not a JSON object".to_string())?;

    let quantity = obj
        .get("quantity")
        .ok_or_else(|| "missing 'quantity'".to_string())
        .and_then(parse_quantity)?;

    let line_total = match obj.get("line_total") {
        None | Some(Value::Null) => return Err("missing 'line_total'".to_string()),
        Some(v) => parse_amount(v).map_err(|e| format!("'line_total' {}", e))?,
    };

    // Checked for well-formedness only; line items do not store a unit price
    if let Some(v) = obj.get("unit_price").filter(|v| !v.is_null()) {
        parse_amount(v).map_err(|e| format!("'unit_price' {}", e))?;
    }

    Ok(LineItem {
        order_id: String::new(),
        product_id: obj.get("product_id").and_then(text_value),
        title: obj.get("title").and_then(text_value),
        quantity,
        line_total,
    })
}

/// Read a key whose presence is required but whose value may be null
fn required_amount(obj: &Map<String, Value>, key: &str) -> Result<Option<f64>, String> {
    match obj.get(key) {
        None => Err(format!("Missing '{}'", key)),
        Some(Value::Null) => Ok(None),
        Some(v) => parse_amount(v)
            .map(Some)
            .map_err(|e| format!("'{}' {}", key, e)),
    }
}

/// Free text from a string or number, with placeholders mapped to `None`
fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            if is_placeholder(s) {
                None
            } else {
                Some(s.to_string())
            }
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn is_placeholder(s: &str) -> bool {
    s.is_empty()
        || s.eq_ignore_ascii_case("none")
        || s.eq_ignore_ascii_case("null")
        || s.eq_ignore_ascii_case("n/a")
}

/// A currency amount from a JSON number or a numeric string
///
/// Strings may carry a currency symbol or code and comma thousands
/// separators, e.g. `"$1,234.50"` or `"12.50 EUR"`.
fn parse_amount(value: &Value) -> Result<f64, String> {
    let amount = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let digits: String = s
                .trim()
                .trim_matches(|c: char| !(c.is_ascii_digit() || c == '-' || c == '.'))
                .chars()
                .filter(|c| *c != ',')
                .collect();
            digits.parse::<f64>().ok()
        }
        _ => None,
    };

    match amount {
        Some(a) if a.is_finite() => Ok(a),
        _ => Err(format!("is not a number: {}", value)),
    }
}

/// A positive whole quantity; integral floats such as `2.0` are accepted
fn parse_quantity(value: &Value) -> Result<u32, String> {
    let quantity = match value {
        Value::Number(n) => match n.as_u64() {
            Some(q) => Some(q),
            None => n
                .as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= u32::MAX as f64)
                .map(|f| f as u64),
        },
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };

    match quantity.and_then(|q| u32::try_from(q).ok()) {
        Some(q) if q > 0 => Ok(q),
        _ => Err(format!("'quantity' must be a positive integer, got {}", value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A100: &str = r#"{
        "order_id": "A100",
        "customer_name": "Jane Doe",
        "email": "jane@example.com",
        "phone": null,
        "items": [
            {"product_id": "P1", "title": "Widget", "quantity": 1, "unit_price": 5.0, "line_total": 5.0},
            {"product_id": "P2", "title": "Gadget", "quantity": 2, "unit_price": 2.5, "line_total": 5.0}
        ],
        "subtotal": 10.0,
        "vat": 0.5,
        "grand_total": 10.5
    }"#;

    fn reason(err: ExtractionError) -> String {
        match err {
            ExtractionError::MalformedResponse { reason, .. } => reason,
            other => panic!("expected MalformedResponse, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_valid_invoice() {
        let invoice = parse_invoice_response(A100).unwrap();
        assert_eq!(invoice.order_id(), "A100");
        assert_eq!(invoice.items().len(), 2);
        assert_eq!(invoice.total_qty(), 3);

        let order = invoice.order();
        assert_eq!(order.customer_name.as_deref(), Some("Jane Doe"));
        assert_eq!(order.phone, None);
        assert_eq!(order.grand_total, Some(10.5));
        assert_eq!(invoice.items()[1].title.as_deref(), Some("Gadget"));
        assert_eq!(invoice.items()[1].order_id, "A100");
    }

    #[test]
    fn test_parse_fenced_response() {
        let response = format!("Here is the JSON:\n```json\n{}\n```", A100);
        let invoice = parse_invoice_response(&response).unwrap();
        assert_eq!(invoice.order_id(), "A100");
    }

    #[test]
    fn test_model_total_qty_is_ignored() {
        let json = r#"{"order_id": "X", "total_qty": 40,
            "items": [{"quantity": 4, "line_total": 8}],
            "subtotal": 8, "vat": 0, "grand_total": 8}"#;
        assert_eq!(parse_invoice_response(json).unwrap().total_qty(), 4);
    }

    #[test]
    fn test_non_json_is_malformed_and_keeps_raw() {
        let err = parse_invoice_response("I could not read this invoice.").unwrap_err();
        assert_eq!(err.raw_output(), Some("I could not read this invoice."));
        assert!(reason(err).contains("JSON parse error"));
    }

    #[test]
    fn test_empty_response_is_malformed() {
        assert!(reason(parse_invoice_response("   ").unwrap_err()).contains("Empty"));
    }

    #[test]
    fn test_array_is_malformed() {
        assert!(reason(parse_invoice_response("[1, 2]").unwrap_err()).contains("JSON object"));
    }

    #[test]
    fn test_missing_required_keys() {
        let no_id = r#"{"items": [], "subtotal": 1, "vat": 0, "grand_total": 1}"#;
        assert!(reason(parse_invoice_response(no_id).unwrap_err()).contains("order_id"));

        let no_items = r#"{"order_id": "A", "subtotal": 1, "vat": 0, "grand_total": 1}"#;
        assert!(reason(parse_invoice_response(no_items).unwrap_err()).contains("items"));

        let no_vat = r#"{"order_id": "A", "items": [], "subtotal": 1, "grand_total": 1}"#;
        assert!(reason(parse_invoice_response(no_vat).unwrap_err()).contains("vat"));
    }

    #[test]
    fn test_null_amounts_are_absent() {
        let json = r#"{"order_id": "A", "items": [], "subtotal": null, "vat": null, "grand_total": 3}"#;
        let invoice = parse_invoice_response(json).unwrap();
        assert_eq!(invoice.order().vat, None);
        assert_eq!(invoice.order().grand_total, Some(3.0));
    }

    #[test]
    fn test_placeholder_order_id_is_rejected() {
        let json = r#"{"order_id": "None", "items": [], "subtotal": 1, "vat": 0, "grand_total": 1}"#;
        assert!(parse_invoice_response(json).is_err());
    }

    #[test]
    fn test_numeric_order_id_is_accepted() {
        let json = r#"{"order_id": 12345, "items": [], "subtotal": 1, "vat": 0, "grand_total": 1}"#;
        assert_eq!(parse_invoice_response(json).unwrap().order_id(), "12345");
    }

    #[test]
    fn test_placeholders_normalize_to_none() {
        let json = r#"{"order_id": "A", "customer_name": "None", "email": "N/A", "phone": "",
            "items": [], "subtotal": 1, "vat": 0, "grand_total": 1}"#;
        let order = parse_invoice_response(json).unwrap().order().clone();
        assert_eq!(order.customer_name, None);
        assert_eq!(order.email, None);
        assert_eq!(order.phone, None);
    }

    #[test]
    fn test_lenient_amount_strings() {
        assert_eq!(parse_amount(&Value::from("$1,234.50")).unwrap(), 1234.5);
        assert_eq!(parse_amount(&Value::from("12.50 EUR")).unwrap(), 12.5);
        assert_eq!(parse_amount(&Value::from("£0.60")).unwrap(), 0.6);
        assert!(parse_amount(&Value::from("twelve")).is_err());
        assert!(parse_amount(&Value::Bool(true)).is_err());
    }

    #[test]
    fn test_quantity_rules() {
        assert_eq!(parse_quantity(&serde_json::json!(2)).unwrap(), 2);
        assert_eq!(parse_quantity(&serde_json::json!(2.0)).unwrap(), 2);
        assert_eq!(parse_quantity(&serde_json::json!("3")).unwrap(), 3);
        assert!(parse_quantity(&serde_json::json!(0)).is_err());
        assert!(parse_quantity(&serde_json::json!(-1)).is_err());
        assert!(parse_quantity(&serde_json::json!(1.5)).is_err());
        assert!(parse_quantity(&serde_json::json!("two")).is_err());
    }

    #[test]
    fn test_total_quantity_overflow_is_malformed() {
        let json = r#"{"order_id": "BIG", "items": [
            {"quantity": 4000000000, "line_total": 1},
            {"quantity": 4000000000, "line_total": 1}
        ], "subtotal": 2, "vat": 0, "grand_total": 2}"#;
        let err = parse_invoice_response(json).unwrap_err();
        assert_eq!(err.raw_output(), Some(json));
        assert_eq!(reason(err), "Total quantity out of range");
    }

    #[test]
    fn test_bad_item_names_its_index() {
        let json = r#"{"order_id": "A", "items": [
            {"quantity": 1, "line_total": 1},
            {"quantity": 0, "line_total": 1}
        ], "subtotal": 2, "vat": 0, "grand_total": 2}"#;
        let message = reason(parse_invoice_response(json).unwrap_err());
        assert!(message.starts_with("Item 1"), "{}", message);
    }

    #[test]
    fn test_unit_price_is_validated_but_not_required() {
        let without = r#"{"order_id": "A", "items": [{"quantity": 1, "line_total": 1}],
            "subtotal": 1, "vat": 0, "grand_total": 1}"#;
        assert!(parse_invoice_response(without).is_ok());

        let garbage = r#"{"order_id": "A", "items": [{"quantity": 1, "unit_price": "abc", "line_total": 1}],
            "subtotal": 1, "vat": 0, "grand_total": 1}"#;
        assert!(reason(parse_invoice_response(garbage).unwrap_err()).contains("unit_price"));
    }
}
