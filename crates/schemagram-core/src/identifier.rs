//! Identifier quoting rules
//!
//! Each data source decides how identifiers are quoted, how unquoted names
//! are stored, and which levels (catalog, schema) exist above a table. The
//! persistence codec relies on these rules to split fully-qualified names
//! back into their parts.

use serde::{Deserialize, Serialize};

/// How the database stores unquoted identifiers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierCase {
    #[default]
    Mixed,
    Upper,
    Lower,
}

/// Identifier rules of a data source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentifierRules {
    /// Identifier quote character (e.g. '"' for SQL standard, '`' for MySQL)
    pub quote: char,
    /// Separator between name parts
    pub separator: char,
    pub case: IdentifierCase,
    pub supports_catalogs: bool,
    pub supports_schemas: bool,
}

impl Default for IdentifierRules {
    fn default() -> Self {
        Self {
            quote: '"',
            separator: '.',
            case: IdentifierCase::Mixed,
            supports_catalogs: false,
            supports_schemas: true,
        }
    }
}

/// A name split into catalog, schema and object parts
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    pub catalog: Option<String>,
    pub schema: Option<String>,
    pub name: String,
}

impl QualifiedName {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            catalog: None,
            schema: None,
            name: name.into(),
        }
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn with_catalog(mut self, catalog: impl Into<String>) -> Self {
        self.catalog = Some(catalog.into());
        self
    }

    /// Path segments below the data source root
    pub fn path(&self) -> Vec<String> {
        self.catalog
            .iter()
            .chain(self.schema.iter())
            .cloned()
            .chain(std::iter::once(self.name.clone()))
            .collect()
    }
}

impl IdentifierRules {
    /// PostgreSQL: lower-case storage, database and schema levels
    pub fn postgres() -> Self {
        Self {
            case: IdentifierCase::Lower,
            supports_catalogs: true,
            ..Self::default()
        }
    }

    /// MySQL: backtick quoting, databases act as catalogs, no schemas
    pub fn mysql() -> Self {
        Self {
            quote: '`',
            supports_catalogs: true,
            supports_schemas: false,
            ..Self::default()
        }
    }

    /// SQLite: a single flat namespace
    pub fn sqlite() -> Self {
        Self {
            supports_catalogs: false,
            supports_schemas: false,
            ..Self::default()
        }
    }

    /// Oracle: upper-case storage, schema level only
    pub fn oracle() -> Self {
        Self {
            case: IdentifierCase::Upper,
            ..Self::default()
        }
    }

    /// Apply the storage case to an unquoted identifier
    pub fn normalize(&self, name: &str) -> String {
        match self.case {
            IdentifierCase::Mixed => name.to_string(),
            IdentifierCase::Upper => name.to_uppercase(),
            IdentifierCase::Lower => name.to_lowercase(),
        }
    }

    /// Whether `name` must be quoted to survive a round trip
    pub fn needs_quoting(&self, name: &str) -> bool {
        let mut chars = name.chars();
        let Some(first) = chars.next() else {
            return true;
        };
        if !(first.is_alphabetic() || first == '_') {
            return true;
        }
        if !name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '$') {
            return true;
        }
        self.case != IdentifierCase::Mixed && self.normalize(name) != name
    }

    /// Quote `name` when required, doubling embedded quote characters
    pub fn quote_if_needed(&self, name: &str) -> String {
        if !self.needs_quoting(name) {
            return name.to_string();
        }
        let quote = self.quote.to_string();
        let doubled = format!("{}{}", self.quote, self.quote);
        format!("{}{}{}", quote, name.replace(&quote, &doubled), quote)
    }

    /// Join name parts into a fully-qualified name
    pub fn qualified_name<S: AsRef<str>>(&self, parts: &[S]) -> String {
        parts
            .iter()
            .map(|p| self.quote_if_needed(p.as_ref()))
            .collect::<Vec<_>>()
            .join(&self.separator.to_string())
    }

    /// Split a fully-qualified name into parts.
    ///
    /// Quoted parts keep their exact spelling; unquoted parts are trimmed
    /// and normalized to the storage case. Empty parts are dropped.
    pub fn split_qualified_name(&self, fqn: &str) -> Vec<String> {
        let mut parts = Vec::new();
        let mut current = String::new();
        let mut quoted_part = false;
        let mut chars = fqn.chars().peekable();

        while let Some(c) = chars.next() {
            if c == self.quote {
                quoted_part = true;
                loop {
                    match chars.next() {
                        Some(q) if q == self.quote => {
                            if chars.peek() == Some(&self.quote) {
                                chars.next();
                                current.push(self.quote);
                            } else {
                                break;
                            }
                        }
                        Some(other) => current.push(other),
                        None => break,
                    }
                }
            } else if c == self.separator {
                self.push_part(&mut parts, &mut current, quoted_part);
                quoted_part = false;
            } else {
                current.push(c);
            }
        }
        self.push_part(&mut parts, &mut current, quoted_part);
        parts
    }

    fn push_part(&self, parts: &mut Vec<String>, current: &mut String, quoted: bool) {
        let part = std::mem::take(current);
        if quoted {
            if !part.is_empty() {
                parts.push(part);
            }
        } else {
            let trimmed = part.trim();
            if !trimmed.is_empty() {
                parts.push(self.normalize(trimmed));
            }
        }
    }

    /// Map split parts onto catalog/schema/name according to the levels the
    /// data source supports. More than three parts keeps the last three.
    pub fn resolve_parts(&self, parts: &[String]) -> Option<QualifiedName> {
        let parts = if parts.len() > 3 {
            &parts[parts.len() - 3..]
        } else {
            parts
        };
        match parts {
            [] => None,
            [name] => Some(QualifiedName::new(name.clone())),
            [container, name] => {
                let qn = QualifiedName::new(name.clone());
                if self.supports_schemas {
                    Some(qn.with_schema(container.clone()))
                } else if self.supports_catalogs {
                    Some(qn.with_catalog(container.clone()))
                } else {
                    Some(qn)
                }
            }
            [catalog, schema, name] => Some(
                QualifiedName::new(name.clone())
                    .with_schema(schema.clone())
                    .with_catalog(catalog.clone()),
            ),
            _ => None,
        }
    }

    /// Split and resolve in one step
    pub fn parse_qualified_name(&self, fqn: &str) -> Option<QualifiedName> {
        self.resolve_parts(&self.split_qualified_name(fqn))
    }
}

#[cfg(test)]
mod tests;
