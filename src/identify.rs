use std::collections::HashSet;

use crate::table::Table;

pub const DEFAULT_JOIN_KEY: &str = "customer_id";

pub const ID_COLUMN_ALIASES: &[&str] = &[
    "cust_id",
    "customer_id",
    "cust_num",
    "customer_num",
    "customer_number",
    "customer_ref",
    "id",
    "customer_reference",
    "custid",
    "customerid",
    "client_id",
    "clientid",
];

/// Finds the join-key column of a table by alias. Matching is
/// case-insensitive and ignores surrounding whitespace in column names.
#[derive(Debug, Clone)]
pub struct IdentifierDetector {
    aliases: HashSet<String>,
}

impl Default for IdentifierDetector {
    fn default() -> Self {
        Self::with_aliases(ID_COLUMN_ALIASES.iter().copied())
    }
}

impl IdentifierDetector {
    pub fn with_aliases<I, S>(aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            aliases: aliases
                .into_iter()
                .map(|alias| alias.as_ref().trim().to_lowercase())
                .collect(),
        }
    }

    pub fn is_alias(&self, column_name: &str) -> bool {
        self.aliases.contains(&column_name.trim().to_lowercase())
    }

    /// Returns the first column, in table order, whose name is a known alias.
    pub fn detect<'t>(&self, table: &'t Table) -> Option<&'t str> {
        table
            .columns()
            .iter()
            .map(|column| column.name.as_str())
            .find(|name| self.is_alias(name))
    }
}

pub fn detect_id_column(table: &Table) -> Option<String> {
    IdentifierDetector::default()
        .detect(table)
        .map(str::to_string)
}
