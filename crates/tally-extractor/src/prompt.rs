//! LLM prompt engineering for invoice extraction

/// Builds the extraction prompt for one document
pub struct PromptBuilder<'a> {
    text: &'a str,
}

impl<'a> PromptBuilder<'a> {
    /// Create a new prompt builder over OCR'd document text
    pub fn new(text: &'a str) -> Self {
        Self { text }
    }

    /// Build the complete extraction prompt
    pub fn build(&self) -> String {
        let mut prompt = String::with_capacity(
            EXTRACTION_INSTRUCTIONS.len() + self.text.len() + OUTPUT_FORMAT_REMINDER.len() + 32,
        );

        prompt.push_str(EXTRACTION_INSTRUCTIONS);
        prompt.push_str("\n\n");

        prompt.push_str("Invoice text:\n");
        prompt.push_str("---\n");
        prompt.push_str(self.text);
        prompt.push_str("\n---\n\n");

        prompt.push_str(OUTPUT_FORMAT_REMINDER);
        prompt
    }
}

const EXTRACTION_INSTRUCTIONS: &str = r#"You are extracting structured data from the text of a scanned invoice.

Extract the following details as a single JSON object:
- order_id: the order or invoice number, as a string
- customer_name
- email
- phone
- items: list of objects with product_id, title, quantity, unit_price, line_total
- subtotal
- vat
- grand_total

Rules:
- quantity is a positive whole number
- unit_price, line_total, subtotal, vat and grand_total are plain numbers without currency symbols
- Use null for any contact detail that does not appear in the text
- Copy identifiers exactly as printed; do not invent values

Format example:
{
  "order_id": "12345",
  "customer_name": "John Doe",
  "email": "john@example.com",
  "phone": null,
  "items": [
    {
      "product_id": "1234567890",
      "title": "Item Name",
      "quantity": 2,
      "unit_price": 5.99,
      "line_total": 11.98
    }
  ],
  "subtotal": 11.98,
  "vat": 0.60,
  "grand_total": 12.58
}"#;

const OUTPUT_FORMAT_REMINDER: &str =
    "Remember: Return ONLY the JSON object, no markdown code blocks, no explanations.";
