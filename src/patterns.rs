//! Categorical spelling rules keyed by column name.
//!
//! Tables are checked in order and the first whose name predicate accepts the
//! (lowercased) column name is the only one consulted.

use std::collections::BTreeMap;

use crate::transform::string_ops::fold;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// The folded value must equal one of the tokens.
    Exact,
    /// The folded value must contain one of the tokens.
    Contains,
}

#[derive(Debug)]
pub struct CategoryRule {
    pub canonical: &'static str,
    pub tokens: &'static [&'static str],
}

pub struct PatternTable {
    pub name: &'static str,
    pub applies_to: fn(&str) -> bool,
    pub mode: MatchMode,
    pub categories: &'static [CategoryRule],
}

impl PatternTable {
    pub fn canonical_for(&self, folded: &str) -> Option<&'static str> {
        self.categories
            .iter()
            .find(|rule| match self.mode {
                MatchMode::Exact => rule.tokens.contains(&folded),
                MatchMode::Contains => rule.tokens.iter().any(|token| folded.contains(*token)),
            })
            .map(|rule| rule.canonical)
    }
}

fn is_employment_column(name: &str) -> bool {
    name.contains("employment")
}

fn is_status_column(name: &str) -> bool {
    name.contains("status") || name.contains("account")
}

fn is_education_column(name: &str) -> bool {
    name.contains("education")
}

pub const EMPLOYMENT: PatternTable = PatternTable {
    name: "employment",
    applies_to: is_employment_column,
    mode: MatchMode::Exact,
    categories: &[
        CategoryRule {
            canonical: "full_time",
            tokens: &["ft", "full_time", "full-time", "fulltime", "full time"],
        },
        CategoryRule {
            canonical: "part_time",
            tokens: &["pt", "part_time", "part-time", "parttime", "part time"],
        },
        CategoryRule {
            canonical: "self_employed",
            tokens: &[
                "self emp",
                "self_employed",
                "self-employed",
                "self employed",
                "self-emp",
            ],
        },
        CategoryRule {
            canonical: "contract",
            tokens: &["contractor", "contract"],
        },
    ],
};

// "inactive" contains "active" and maps to it as well.
pub const STATUS: PatternTable = PatternTable {
    name: "status",
    applies_to: is_status_column,
    mode: MatchMode::Contains,
    categories: &[CategoryRule {
        canonical: "active",
        tokens: &["active", "act-1", "act-2", "act-3", "a01", "a02", "a03"],
    }],
};

pub const EDUCATION: PatternTable = PatternTable {
    name: "education",
    applies_to: is_education_column,
    mode: MatchMode::Contains,
    categories: &[
        CategoryRule {
            canonical: "high_school",
            tokens: &["high school", "hs", "highschool"],
        },
        CategoryRule {
            canonical: "some_college",
            tokens: &["some college", "college"],
        },
        CategoryRule {
            canonical: "bachelor",
            tokens: &["bachelor", "bachelors", "ba", "bs"],
        },
        CategoryRule {
            canonical: "graduate",
            tokens: &["graduate", "master", "masters", "ma", "ms"],
        },
        CategoryRule {
            canonical: "advanced",
            tokens: &["advanced", "phd", "doctorate"],
        },
    ],
};

pub const PATTERN_TABLES: &[&PatternTable] = &[&EMPLOYMENT, &STATUS, &EDUCATION];

pub fn table_for_column(column_name: &str) -> Option<&'static PatternTable> {
    let lowered = column_name.to_lowercase();
    PATTERN_TABLES
        .iter()
        .copied()
        .find(|table| (table.applies_to)(&lowered))
}

/// Maps each folded value to its canonical category. Values no rule
/// recognizes are left out of the map.
pub fn standardization_map<'a, I>(values: I, column_name: &str) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut mapping = BTreeMap::new();
    let Some(table) = table_for_column(column_name) else {
        return mapping;
    };
    for value in values {
        let folded = fold(value);
        if let Some(canonical) = table.canonical_for(&folded) {
            mapping.insert(folded, canonical.to_string());
        }
    }
    mapping
}
