//! Structured filter criteria and the typed predicate tree they compile to.
//!
//! A [`FilterSet`] is what callers hand in; [`FilterSet::build`] turns it into a
//! [`Predicate`], which is evaluated entirely inside SQLite so that `LIMIT` is
//! applied only after every criterion, including a two-sided depth range, has
//! been checked.
//!
//! # Category semantics
//!
//! `category` is multi-valued. An entry stores one or more tags, and a category
//! criterion may itself list several comma-separated tags. The criterion matches
//! when any listed tag equals any stored tag, compared case-insensitively after
//! trimming. The same rule applies in the filter-only path, the combined path,
//! and the in-memory [`Predicate::matches`] check.

use rusqlite::types::Value as SqlValue;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    entry::{LIST_DELIMITER, LogEntry, normalize_tag},
    types::Field,
};

/// Rejection of a malformed filter combination, raised before storage is touched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    /// `min_depth` is greater than `max_depth`.
    #[error("conflicting depth bounds: min {min} > max {max}")]
    ConflictingBounds {
        /// Requested lower bound.
        min: f64,
        /// Requested upper bound.
        max: f64,
    },
    /// A numeric bound was NaN or infinite.
    #[error("bound for {field} must be a finite number")]
    NonFiniteBound {
        /// Field the bound applies to.
        field: Field,
    },
    /// The value type does not fit the field.
    #[error("{field} does not accept a {expected} comparison")]
    TypeMismatch {
        /// Field being compared.
        field: Field,
        /// Kind of comparison that was attempted.
        expected: &'static str,
    },
    /// `And`/`Or` with no children.
    #[error("predicate group must not be empty")]
    EmptyGroup,
    /// A supplied criterion that names no usable value, such as `" , "`.
    #[error("{field} criterion lists no values")]
    EmptyCriterion {
        /// Field the criterion applies to.
        field: Field,
    },
    /// A result cap of zero.
    #[error("limit must be at least 1")]
    InvalidLimit,
}

/// Typed comparison operand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Text operand.
    Text(String),
    /// Numeric operand.
    Number(f64),
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Equals(Field, Value),
    LessOrEqual(Field, f64),
    GreaterOrEqual(Field, f64),
    And(Vec<Node>),
    Or(Vec<Node>),
}

/// Well-formed predicate tree over typed field/value pairs.
///
/// Only the constructors below can create one, and each rejects malformed
/// input, so every `Predicate` in hand compiles to valid SQL.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    node: Node,
}

impl Predicate {
    /// `field == value`; category comparisons are case-insensitive.
    pub fn equals(field: Field, value: Value) -> Result<Self, QueryError> {
        match (&value, field.is_numeric()) {
            (Value::Number(n), true) if !n.is_finite() => {
                Err(QueryError::NonFiniteBound { field })
            }
            (Value::Number(_), true) | (Value::Text(_), false) => Ok(Self {
                node: Node::Equals(field, value),
            }),
            (Value::Text(_), true) => Err(QueryError::TypeMismatch {
                field,
                expected: "text",
            }),
            (Value::Number(_), false) => Err(QueryError::TypeMismatch {
                field,
                expected: "numeric",
            }),
        }
    }

    /// `field <= bound` on a numeric field.
    pub fn less_or_equal(field: Field, bound: f64) -> Result<Self, QueryError> {
        check_bound(field, bound)?;
        Ok(Self {
            node: Node::LessOrEqual(field, bound),
        })
    }

    /// `field >= bound` on a numeric field.
    pub fn greater_or_equal(field: Field, bound: f64) -> Result<Self, QueryError> {
        check_bound(field, bound)?;
        Ok(Self {
            node: Node::GreaterOrEqual(field, bound),
        })
    }

    /// Conjunction; a single child collapses to itself.
    pub fn and(children: Vec<Predicate>) -> Result<Self, QueryError> {
        group(children, Node::And)
    }

    /// Disjunction; a single child collapses to itself.
    pub fn or(children: Vec<Predicate>) -> Result<Self, QueryError> {
        group(children, Node::Or)
    }

    /// Single conjunctive range `min <= depth_max <= max` with either side optional.
    pub fn depth_range(min: Option<f64>, max: Option<f64>) -> Result<Option<Self>, QueryError> {
        match (min, max) {
            (None, None) => Ok(None),
            (Some(min), None) => Self::greater_or_equal(Field::DepthMax, min).map(Some),
            (None, Some(max)) => Self::less_or_equal(Field::DepthMax, max).map(Some),
            (Some(min), Some(max)) => {
                let lower = Self::greater_or_equal(Field::DepthMax, min)?;
                let upper = Self::less_or_equal(Field::DepthMax, max)?;
                if min > max {
                    return Err(QueryError::ConflictingBounds { min, max });
                }
                Self::and(vec![lower, upper]).map(Some)
            }
        }
    }

    /// Evaluates the predicate against an in-memory entry.
    pub fn matches(&self, entry: &LogEntry) -> bool {
        node_matches(&self.node, entry)
    }

    /// Appends a SQL boolean expression over the `e` entries alias.
    pub(crate) fn write_sql(&self, sql: &mut String, params: &mut Vec<SqlValue>) {
        write_node(&self.node, sql, params);
    }
}

fn check_bound(field: Field, bound: f64) -> Result<(), QueryError> {
    if !field.is_numeric() {
        return Err(QueryError::TypeMismatch {
            field,
            expected: "range",
        });
    }
    if !bound.is_finite() {
        return Err(QueryError::NonFiniteBound { field });
    }
    Ok(())
}

fn group(children: Vec<Predicate>, wrap: fn(Vec<Node>) -> Node) -> Result<Predicate, QueryError> {
    let mut nodes: Vec<Node> = children.into_iter().map(|p| p.node).collect();
    match nodes.len() {
        0 => Err(QueryError::EmptyGroup),
        1 => Ok(Predicate {
            node: nodes.remove(0),
        }),
        _ => Ok(Predicate { node: wrap(nodes) }),
    }
}

fn column(field: Field) -> &'static str {
    match field {
        Field::Country => "e.country",
        Field::Area => "e.area",
        Field::Site => "e.site",
        Field::DepthMax => "e.depth_max",
        // Category lives in entry_tags and is handled by the EXISTS branch.
        Field::Category => "",
    }
}

fn write_node(node: &Node, sql: &mut String, params: &mut Vec<SqlValue>) {
    match node {
        Node::Equals(Field::Category, Value::Text(tag)) => {
            sql.push_str("EXISTS (SELECT 1 FROM entry_tags t WHERE t.entry_seq = e.seq AND t.tag = ?)");
            params.push(SqlValue::Text(normalize_tag(tag)));
        }
        Node::Equals(field, value) => {
            sql.push_str(column(*field));
            sql.push_str(" = ?");
            params.push(match value {
                Value::Text(s) => SqlValue::Text(s.clone()),
                Value::Number(n) => SqlValue::Real(*n),
            });
        }
        Node::LessOrEqual(field, bound) => {
            sql.push_str(column(*field));
            sql.push_str(" <= ?");
            params.push(SqlValue::Real(*bound));
        }
        Node::GreaterOrEqual(field, bound) => {
            sql.push_str(column(*field));
            sql.push_str(" >= ?");
            params.push(SqlValue::Real(*bound));
        }
        Node::And(children) => write_group(children, " AND ", sql, params),
        Node::Or(children) => write_group(children, " OR ", sql, params),
    }
}

fn write_group(children: &[Node], joiner: &str, sql: &mut String, params: &mut Vec<SqlValue>) {
    sql.push('(');
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            sql.push_str(joiner);
        }
        write_node(child, sql, params);
    }
    sql.push(')');
}

fn node_matches(node: &Node, entry: &LogEntry) -> bool {
    match node {
        Node::Equals(Field::Category, Value::Text(tag)) => {
            let wanted = normalize_tag(tag);
            entry.category.iter().any(|t| normalize_tag(t) == wanted)
        }
        Node::Equals(field, Value::Text(s)) => text_field(entry, *field) == Some(s.as_str()),
        Node::Equals(Field::DepthMax, Value::Number(n)) => entry.depth_max == *n,
        Node::Equals(_, Value::Number(_)) => false,
        Node::LessOrEqual(_, bound) => entry.depth_max <= *bound,
        Node::GreaterOrEqual(_, bound) => entry.depth_max >= *bound,
        Node::And(children) => children.iter().all(|c| node_matches(c, entry)),
        Node::Or(children) => children.iter().any(|c| node_matches(c, entry)),
    }
}

fn text_field(entry: &LogEntry, field: Field) -> Option<&str> {
    match field {
        Field::Country => entry.country.as_deref(),
        Field::Area => entry.area.as_deref(),
        Field::Site => Some(entry.site.as_str()),
        Field::Category | Field::DepthMax => None,
    }
}

/// Structured criteria as supplied by a caller; blank strings count as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSet {
    /// Exact country.
    #[serde(default)]
    pub country: Option<String>,
    /// Exact area.
    #[serde(default)]
    pub area: Option<String>,
    /// Exact site.
    #[serde(default)]
    pub site: Option<String>,
    /// Matches country or area.
    #[serde(default)]
    pub location: Option<String>,
    /// One tag or a comma-separated list of tags, any of which may match.
    #[serde(default)]
    pub category: Option<String>,
    /// Inclusive lower bound on `depth_max`.
    #[serde(default)]
    pub min_depth: Option<f64>,
    /// Inclusive upper bound on `depth_max`.
    #[serde(default)]
    pub max_depth: Option<f64>,
}

impl FilterSet {
    /// True when no criterion is supplied.
    pub fn is_empty(&self) -> bool {
        [&self.country, &self.area, &self.site, &self.location, &self.category]
            .iter()
            .all(|v| present(v).is_none())
            && self.min_depth.is_none()
            && self.max_depth.is_none()
    }

    /// Compiles all criteria into one conjunctive predicate, `None` when empty.
    pub fn build(&self) -> Result<Option<Predicate>, QueryError> {
        let mut parts = Vec::new();

        for (field, value) in [
            (Field::Country, &self.country),
            (Field::Area, &self.area),
            (Field::Site, &self.site),
        ] {
            if let Some(v) = present(value) {
                parts.push(Predicate::equals(field, Value::Text(v.to_string()))?);
            }
        }

        if let Some(loc) = present(&self.location) {
            parts.push(Predicate::or(vec![
                Predicate::equals(Field::Country, Value::Text(loc.to_string()))?,
                Predicate::equals(Field::Area, Value::Text(loc.to_string()))?,
            ])?);
        }

        if let Some(raw) = present(&self.category) {
            let tags = raw
                .split(LIST_DELIMITER)
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(|t| Predicate::equals(Field::Category, Value::Text(t.to_string())))
                .collect::<Result<Vec<_>, _>>()?;
            if tags.is_empty() {
                return Err(QueryError::EmptyCriterion {
                    field: Field::Category,
                });
            }
            parts.push(Predicate::or(tags)?);
        }

        if let Some(range) = Predicate::depth_range(self.min_depth, self.max_depth)? {
            parts.push(range);
        }

        if parts.is_empty() {
            Ok(None)
        } else {
            Predicate::and(parts).map(Some)
        }
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
