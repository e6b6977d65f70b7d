//! Predicate → SQL compilation.
//!
//! All user input travels as bind parameters; column names come from the
//! closed [`wayfare_storage::CountryField`] set, so nothing user-supplied is spliced into SQL.

use wayfare_storage::Predicate;

/// SQL value types for parameterized queries.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    Integer(i64),
    Boolean(bool),
}

/// A SQL fragment plus the parameters it references.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuiltQuery {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl BuiltQuery {
    /// Appends a parameter and returns its `$n` placeholder.
    pub fn push_param(&mut self, value: SqlValue) -> String {
        self.params.push(value);
        format!("${}", self.params.len())
    }
}

/// Escapes `%`, `_` and `\` so user text matches literally inside ILIKE.
pub fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 2);
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Compiles a predicate into a `WHERE` condition, appending parameters to `query`.
///
/// Returns the condition text; `query.sql` is left untouched so callers can
/// wrap the condition into whatever statement they are building.
pub fn compile_predicate(predicate: &Predicate, query: &mut BuiltQuery) -> String {
    match predicate {
        Predicate::All => "TRUE".to_string(),
        Predicate::Equals { field, value } => {
            let placeholder = query.push_param(SqlValue::Text(value.clone()));
            format!("lower({}) = lower({placeholder})", field.column())
        }
        Predicate::Contains { field, value } => {
            let pattern = format!("%{}%", escape_like(value));
            let placeholder = query.push_param(SqlValue::Text(pattern));
            format!("{} ILIKE {placeholder}", field.column())
        }
        Predicate::IsPopular(flag) => {
            let placeholder = query.push_param(SqlValue::Boolean(*flag));
            format!("is_popular = {placeholder}")
        }
        Predicate::And(inner) => join(inner, " AND ", "TRUE", query),
        Predicate::Or(inner) => join(inner, " OR ", "FALSE", query),
    }
}

fn join(inner: &[Predicate], separator: &str, empty: &str, query: &mut BuiltQuery) -> String {
    if inner.is_empty() {
        return empty.to_string();
    }
    let parts: Vec<String> = inner.iter().map(|p| compile_predicate(p, query)).collect();
    format!("({})", parts.join(separator))
}
