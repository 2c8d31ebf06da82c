//! Prompt construction for LLM requests.
//!
//! Builds the translation prompt with the allowed-table schema injected.

/// Schema description used when the configuration does not provide one.
pub const DEFAULT_SCHEMA_HINT: &str = "customers(id,name,email,registration_date), \
products(id,name,category,price), \
orders(id,customer_id,product_id,order_date,quantity,status)";

/// Instructions given to the model before the user's question.
const SYSTEM_PROMPT_TEMPLATE: &str = "You are a translator to PostgreSQL SQL. \
Translate the user's natural-language question into a single, runnable PostgreSQL SELECT query. \
Only return the SQL query and nothing else. \
Allowed tables: {schema}. \
Do NOT produce any explanation, do NOT include semicolons, and produce a single SELECT statement.";

/// Builds the complete prompt for a question.
///
/// `schema_hint` describes the allowed tables and their columns; pass None to
/// use the default schema description.
pub fn build_prompt(schema_hint: Option<&str>, question: &str) -> String {
    let system = SYSTEM_PROMPT_TEMPLATE.replace("{schema}", schema_hint.unwrap_or(DEFAULT_SCHEMA_HINT));
    format!("{system}\nUser: {question}\nSQL:")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_contains_question() {
        let prompt = build_prompt(None, "How many customers do we have?");
        assert!(prompt.contains("User: How many customers do we have?"));
        assert!(prompt.ends_with("SQL:"));
    }

    #[test]
    fn test_prompt_contains_default_schema() {
        let prompt = build_prompt(None, "anything");
        assert!(prompt.contains("customers(id,name,email,registration_date)"));
        assert!(prompt.contains("orders(id,customer_id,product_id,order_date,quantity,status)"));
    }

    #[test]
    fn test_prompt_uses_custom_schema_hint() {
        let prompt = build_prompt(Some("inventory(id,sku,count)"), "anything");
        assert!(prompt.contains("Allowed tables: inventory(id,sku,count)."));
        assert!(!prompt.contains("customers(id"));
    }

    #[test]
    fn test_prompt_demands_single_select() {
        let prompt = build_prompt(None, "anything");
        assert!(prompt.contains("single SELECT statement"));
        assert!(prompt.contains("do NOT include semicolons"));
    }
}
