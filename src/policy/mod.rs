//! SQL security policy enforcement.
//!
//! Validates LLM-generated SQL against a fixed, read-only policy before it is
//! allowed anywhere near the database: SELECT-only, no forbidden patterns, and
//! only allow-listed tables. This is a deliberately conservative pattern-based
//! gate, not a SQL grammar parser; queries that look ambiguous are rejected.

use std::collections::BTreeSet;

use regex::Regex;
use thiserror::Error;

/// Tables queries are permitted to reference when no policy is configured.
pub const DEFAULT_ALLOWED_TABLES: &[&str] = &["customers", "products", "orders"];

/// Reasons a query can be rejected by the policy.
///
/// Checks run in a fixed order and the first failure wins, so a query that
/// violates several rules reports only the earliest one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Blank or whitespace-only input.
    #[error("empty sql")]
    EmptySql,

    /// The statement does not start with SELECT.
    #[error("only SELECT queries are allowed")]
    NotSelect,

    /// A forbidden keyword or symbol was found; carries the pattern class.
    #[error("forbidden pattern detected: {0}")]
    ForbiddenPattern(String),

    /// The query references tables outside the allow-list; carries their names.
    #[error("query references disallowed tables: {0}")]
    DisallowedTable(String),

    /// A residual statement separator survived the earlier checks.
    #[error("multiple statements detected")]
    MultiStatement,
}

/// A single forbidden-pattern rule with a human-readable class name.
#[derive(Debug)]
struct ForbiddenRule {
    pattern: Regex,
    class: &'static str,
}

/// The immutable security policy applied to every generated query.
///
/// Constructed once at startup from configuration and shared by read-only
/// reference across pipeline invocations. There is no mutation path after
/// construction.
#[derive(Debug)]
pub struct QueryPolicy {
    allowed_tables: BTreeSet<String>,
    forbidden: Vec<ForbiddenRule>,
    table_ref: Regex,
}

impl QueryPolicy {
    /// Creates a policy allowing only the given table names.
    pub fn new(allowed_tables: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let forbidden = vec![
            rule(
                r"(?i)\b(insert|update|delete|drop|alter|create|truncate|grant|revoke|merge)\b",
                "data modification keyword",
            ),
            rule(";", "statement separator"),
            rule("--", "line comment"),
            rule(r"/\*", "block comment"),
            rule(r"(?i)\bexec\b", "procedure call"),
            rule(r"(?i)\bcall\b", "procedure call"),
        ];

        Self {
            // Referenced tables are compared lowercased, so the allow-list
            // must be lowercased too or mixed-case entries never match.
            allowed_tables: allowed_tables
                .into_iter()
                .map(|t| t.into().to_lowercase())
                .collect(),
            forbidden,
            table_ref: Regex::new(r"(?i)\b(?:from|join)\s+([A-Za-z0-9_.]+)")
                .expect("table reference pattern is valid"),
        }
    }

    /// Validates a SQL string against the policy.
    ///
    /// Pure and deterministic: the same input always yields the same decision.
    /// Checks run in a fixed order and short-circuit on the first failure.
    pub fn validate(&self, sql: &str) -> Result<(), ValidationError> {
        let trimmed = sql.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptySql);
        }

        if !starts_with_select(trimmed) {
            return Err(ValidationError::NotSelect);
        }

        for rule in &self.forbidden {
            if rule.pattern.is_match(sql) {
                return Err(ValidationError::ForbiddenPattern(rule.class.to_string()));
            }
        }

        let referenced = self.referenced_tables(sql);
        if !referenced.is_empty() && !referenced.is_subset(&self.allowed_tables) {
            let bad: Vec<&str> = referenced
                .difference(&self.allowed_tables)
                .map(String::as_str)
                .collect();
            return Err(ValidationError::DisallowedTable(bad.join(", ")));
        }

        // Final guard: any separator left at this point means multiple statements.
        if sql.contains(';') {
            return Err(ValidationError::MultiStatement);
        }

        Ok(())
    }

    /// Extracts table names referenced after FROM or JOIN keywords.
    ///
    /// Schema qualifiers are stripped (`public.customers` -> `customers`).
    /// A query with no FROM/JOIN clause yields an empty set, which the policy
    /// accepts: scalar expressions need not reference a table.
    fn referenced_tables(&self, sql: &str) -> BTreeSet<String> {
        self.table_ref
            .captures_iter(sql)
            .filter_map(|cap| cap.get(1))
            .map(|m| {
                m.as_str()
                    .rsplit('.')
                    .next()
                    .unwrap_or(m.as_str())
                    .to_lowercase()
            })
            .collect()
    }
}

impl Default for QueryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_TABLES.iter().copied())
    }
}

fn rule(pattern: &str, class: &'static str) -> ForbiddenRule {
    ForbiddenRule {
        pattern: Regex::new(pattern).expect("forbidden pattern is valid"),
        class,
    }
}

/// Case-insensitive prefix check without allocating a lowered copy.
fn starts_with_select(trimmed: &str) -> bool {
    trimmed
        .get(..6)
        .is_some_and(|head| head.eq_ignore_ascii_case("select"))
}
