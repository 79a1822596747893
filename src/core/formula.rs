use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormulaError {
    #[error("Invalid field name: {0:?}")]
    InvalidFieldName(String),
}

/// A `filterByFormula` expression
///
/// Values are always quoted as string literals with `\` and `'` escaped,
/// so caller input cannot close the literal and change the expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formula(String);

impl Formula {
    /// `{Field} = 'value'`
    pub fn field_equals(field: &str, value: &str) -> Result<Self, FormulaError> {
        Ok(Self(format!("{} = {}", field_ref(field)?, string_literal(value))))
    }

    /// `FIND('needle', {Field})`, truthy when `needle` occurs in the field
    pub fn find_in_field(needle: &str, field: &str) -> Result<Self, FormulaError> {
        Ok(Self(format!("FIND({}, {})", string_literal(needle), field_ref(field)?)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Formula {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// `{Name}`; braces cannot be escaped inside a field reference
fn field_ref(field: &str) -> Result<String, FormulaError> {
    if field.trim().is_empty() || field.contains(|c: char| c == '{' || c == '}') {
        return Err(FormulaError::InvalidFieldName(field.to_string()));
    }
    Ok(format!("{{{}}}", field))
}

/// Single-quoted string literal
pub fn string_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            _ => out.push(c),
        }
    }
    out.push('\'');
    out
}
