//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use serde_json::{json, Value};
use tally_agent::{ChatReply, ReplyOutcome};
use tally_domain::Order;
use tally_ingest::{DocumentOutcome, DocumentReport};
use tally_store::ExportSummary;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format stored orders.
    pub fn format_orders(&self, orders: &[Order]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(orders)?),
            OutputFormat::Table => Ok(self.format_orders_table(orders)),
        }
    }

    fn format_orders_table(&self, orders: &[Order]) -> String {
        if orders.is_empty() {
            return self.colorize("No orders found.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record([
            "Order ID", "Customer", "Email", "Phone", "Qty", "Subtotal", "VAT", "Total",
        ]);
        for order in orders {
            builder.push_record([
                order.order_id.clone(),
                text_cell(&order.customer_name),
                text_cell(&order.email),
                text_cell(&order.phone),
                order.total_qty.map(|q| q.to_string()).unwrap_or_default(),
                money_cell(order.subtotal),
                money_cell(order.vat),
                money_cell(order.grand_total),
            ]);
        }

        render(builder)
    }

    /// Format the per-document results of an ingest run.
    pub fn format_reports(&self, reports: &[DocumentReport]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let rows: Vec<Value> = reports.iter().map(report_json).collect();
                Ok(serde_json::to_string_pretty(&rows)?)
            }
            OutputFormat::Table => Ok(self.format_reports_table(reports)),
        }
    }

    fn format_reports_table(&self, reports: &[DocumentReport]) -> String {
        let mut builder = Builder::default();
        builder.push_record(["File", "Status", "Order ID", "Items", "Qty", "Message"]);
        for report in reports {
            let (order_id, items, qty) = match &report.outcome {
                DocumentOutcome::Ingested(summary) => (
                    summary.order_id.clone(),
                    summary.line_items.to_string(),
                    summary.total_qty.to_string(),
                ),
                DocumentOutcome::Duplicate { order_id } => {
                    (order_id.clone(), String::new(), String::new())
                }
                DocumentOutcome::Failed { .. } => (String::new(), String::new(), String::new()),
            };
            builder.push_record([
                report.path.display().to_string(),
                status_label(&report.outcome).to_string(),
                order_id,
                items,
                qty,
                report.outcome.message(),
            ]);
        }

        let ingested = reports.iter().filter(|r| r.outcome.is_ingested()).count();
        let summary = format!("{} of {} document(s) ingested", ingested, reports.len());
        let summary = if ingested == reports.len() {
            self.success(&summary)
        } else {
            self.warning(&summary)
        };

        format!("{}\n{}", render(builder), summary)
    }

    /// Format a chat reply.
    ///
    /// Table output is the answer itself, preceded by the call that was made.
    pub fn format_reply(&self, reply: &ChatReply) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let call = reply.tool_call.as_ref().map(|call| {
                    json!({
                        "method": call.method().as_str(),
                        "url": call.url().as_str(),
                        "payload": call.payload(),
                    })
                });
                let value = json!({
                    "answer": reply.answer,
                    "outcome": outcome_label(&reply.outcome),
                    "tool_call": call,
                    "tool_response": reply.tool_response,
                });
                Ok(serde_json::to_string_pretty(&value)?)
            }
            OutputFormat::Table => {
                let mut out = String::new();
                match (&reply.tool_call, &reply.outcome) {
                    (Some(call), _) => {
                        out.push_str(&self.colorize(&format!("→ {}", call), "cyan"));
                        out.push('\n');
                    }
                    (None, ReplyOutcome::PlanRejected { reason }) => {
                        out.push_str(&self.warning(&format!("No request made: {}", reason)));
                        out.push('\n');
                    }
                    _ => {}
                }
                out.push_str(reply.answer.trim());
                Ok(out)
            }
        }
    }

    /// Format the result of an export.
    pub fn format_export(&self, summary: &ExportSummary) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&json!({
                "orders_path": summary.orders_path,
                "line_items_path": summary.line_items_path,
                "orders": summary.orders,
                "line_items": summary.line_items,
            }))?),
            OutputFormat::Table => Ok(format!(
                "{}\n{}",
                self.success(&format!(
                    "Exported {} order(s) to {}",
                    summary.orders,
                    summary.orders_path.display()
                )),
                self.success(&format!(
                    "Exported {} line item(s) to {}",
                    summary.line_items,
                    summary.line_items_path.display()
                )),
            )),
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            _ => text.to_string(),
        }
    }
}

fn render(builder: Builder) -> String {
    let mut table = builder.build();
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));
    table.to_string()
}

fn text_cell(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn money_cell(value: Option<f64>) -> String {
    value.map(|v| format!("{:.2}", v)).unwrap_or_default()
}

fn status_label(outcome: &DocumentOutcome) -> &'static str {
    match outcome {
        DocumentOutcome::Ingested(_) => "ingested",
        DocumentOutcome::Duplicate { .. } => "duplicate",
        DocumentOutcome::Failed { .. } => "failed",
    }
}

fn outcome_label(outcome: &ReplyOutcome) -> &'static str {
    match outcome {
        ReplyOutcome::Answered => "answered",
        ReplyOutcome::PlanRejected { .. } => "plan_rejected",
        ReplyOutcome::RemoteFailed { .. } => "remote_failed",
        ReplyOutcome::NarrationFailed { .. } => "narration_failed",
    }
}

fn report_json(report: &DocumentReport) -> Value {
    let mut value = json!({
        "file": report.path.display().to_string(),
        "status": status_label(&report.outcome),
        "message": report.outcome.message(),
    });
    match &report.outcome {
        DocumentOutcome::Ingested(summary) => {
            value["order_id"] = json!(summary.order_id);
            value["line_items"] = json!(summary.line_items);
            value["total_qty"] = json!(summary.total_qty);
            value["exported"] = json!(summary.export.is_some());
        }
        DocumentOutcome::Duplicate { order_id } => {
            value["order_id"] = json!(order_id);
        }
        DocumentOutcome::Failed { reason } => {
            value["reason"] = json!(reason);
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tally_agent::{Endpoint, ToolCall, Url};
    use tally_ingest::IngestSummary;

    fn order() -> Order {
        let mut order = Order::new("A100");
        order.customer_name = Some("Jane Doe".to_string());
        order.total_qty = Some(3);
        order.grand_total = Some(10.5);
        order
    }

    fn reports() -> Vec<DocumentReport> {
        vec![
            DocumentReport {
                path: PathBuf::from("a.pdf"),
                outcome: DocumentOutcome::Ingested(IngestSummary {
                    order_id: "A100".to_string(),
                    line_items: 2,
                    total_qty: 3,
                    export: None,
                }),
            },
            DocumentReport {
                path: PathBuf::from("b.pdf"),
                outcome: DocumentOutcome::Duplicate {
                    order_id: "A100".to_string(),
                },
            },
            DocumentReport {
                path: PathBuf::from("c.pdf"),
                outcome: DocumentOutcome::Failed {
                    reason: "No text could be extracted".to_string(),
                },
            },
        ]
    }

    #[test]
    fn test_orders_table() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_orders(&[order()]).unwrap();
        assert!(output.contains("Order ID"));
        assert!(output.contains("Jane Doe"));
        assert!(output.contains("10.50"));
    }

    #[test]
    fn test_orders_json() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter.format_orders(&[order()]).unwrap();
        let value: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value[0]["order_id"], "A100");
        assert_eq!(value[0]["total_qty"], 3);
        assert!(value[0]["email"].is_null());
    }

    #[test]
    fn test_empty_orders() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_orders(&[]).unwrap();
        assert!(output.contains("No orders found"));
    }

    #[test]
    fn test_reports_table() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_reports(&reports()).unwrap();
        assert!(output.contains("Order A100 processed successfully."));
        assert!(output.contains("Duplicate invoice detected for Order ID: A100"));
        assert!(output.contains("failed"));
        assert!(output.ends_with("⚠ 1 of 3 document(s) ingested"));
    }

    #[test]
    fn test_reports_json() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter.format_reports(&reports()).unwrap();
        let value: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value[0]["status"], "ingested");
        assert_eq!(value[0]["total_qty"], 3);
        assert_eq!(value[1]["status"], "duplicate");
        assert_eq!(value[2]["reason"], "No text could be extracted");
    }

    #[test]
    fn test_reply_table_shows_call_and_answer() {
        let base = Url::parse("http://localhost:9000").unwrap();
        let reply = ChatReply {
            answer: "Order A100 belongs to Jane Doe.\n".to_string(),
            tool_call: Some(ToolCall::new(&base, Endpoint::GetOrder("A100".to_string()), None)),
            tool_response: Some(json!({"order_id": "A100"})),
            outcome: ReplyOutcome::Answered,
        };

        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_reply(&reply).unwrap();
        assert!(output.starts_with("→ GET http://localhost:9000/order/A100"));
        assert!(output.ends_with("Order A100 belongs to Jane Doe."));
    }

    #[test]
    fn test_reply_json() {
        let reply = ChatReply {
            answer: "raw planner text".to_string(),
            tool_call: None,
            tool_response: None,
            outcome: ReplyOutcome::PlanRejected {
                reason: "bad".to_string(),
            },
        };

        let formatter = Formatter::new(OutputFormat::Json, false);
        let value: Value = serde_json::from_str(&formatter.format_reply(&reply).unwrap()).unwrap();
        assert_eq!(value["outcome"], "plan_rejected");
        assert_eq!(value["answer"], "raw planner text");
        assert!(value["tool_call"].is_null());
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert_eq!(formatter.success("test"), "✓ test");
        assert_eq!(formatter.error("test"), "✗ test");
    }
}
