//! Declarative filter / sort / limit over a collection snapshot.
//!
//! # Ordering rules
//!
//! 1. Nodes are filtered first, on the full input.
//! 2. Nodes are sorted by the sort field in the requested order. A node
//!    without the field sorts before every node that has it, in *both*
//!    orders, so "missing" never jumps ends when the order flips.
//! 3. Ties (equal values, or both missing) fall back to ascending node id,
//!    independent of the order.
//! 4. The head of the sorted sequence is kept up to the limit.
//!
//! Before sorting, the present values are checked for a total order; mixing
//! e.g. text and dates in the sort field is a [`QueryError`].

use crate::node::{ContentNode, NodeId};
use crate::value::{FieldValue, ValueKind};
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, fmt, sync::Arc};
use thiserror::Error;

/// Errors raised by a malformed query or a non-orderable sort field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("sort field name is empty")]
    EmptySortField,

    #[error("limit must be a positive integer")]
    ZeroLimit,

    #[error("sort field `{field}` holds {kind} values, which have no order (node `{node}`)")]
    Unorderable {
        field: String,
        kind: ValueKind,
        node: NodeId,
    },

    #[error("sort field `{field}` is NaN on node `{node}`")]
    NotANumber { field: String, node: NodeId },

    #[error(
        "sort field `{field}` mixes {first} (node `{first_node}`) and {second} (node `{second_node}`) values"
    )]
    Incomparable {
        field: String,
        first: ValueKind,
        first_node: NodeId,
        second: ValueKind,
        second_node: NodeId,
    },
}

// ============================================================================
// QuerySpec
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    #[serde(alias = "ASC")]
    Asc,
    #[serde(alias = "DESC")]
    Desc,
}

/// Sort field and direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SortKey {
    pub field: String,
    #[serde(default)]
    pub order: SortOrder,
}

impl SortKey {
    pub fn new(field: impl Into<String>, order: SortOrder) -> Self {
        Self {
            field: field.into(),
            order,
        }
    }
}

/// An immutable query over one collection.
///
/// Built once by the caller; the `with_*` methods consume and return a new
/// value.
#[derive(Debug, Clone)]
pub struct QuerySpec {
    sort: SortKey,
    limit: Option<usize>,
    filter: Filter,
}

impl QuerySpec {
    pub fn new(field: impl Into<String>, order: SortOrder) -> Self {
        Self {
            sort: SortKey::new(field, order),
            limit: None,
            filter: Filter::All,
        }
    }

    pub fn from_sort(sort: SortKey) -> Self {
        Self {
            sort,
            limit: None,
            filter: Filter::All,
        }
    }

    /// Keep at most `limit` nodes. Zero is rejected when the query runs.
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn with_limit_opt(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub const fn sort(&self) -> &SortKey {
        &self.sort
    }

    pub const fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub const fn filter(&self) -> &Filter {
        &self.filter
    }

    fn validate(&self) -> Result<(), QueryError> {
        if normalize_field(&self.sort.field).is_empty() {
            return Err(QueryError::EmptySortField);
        }
        if self.limit == Some(0) {
            return Err(QueryError::ZeroLimit);
        }
        Ok(())
    }
}

/// Strip the `frontmatter.` / `frontmatter___` prefixes accepted in field names.
pub fn normalize_field(field: &str) -> &str {
    let field = field.trim();
    field
        .strip_prefix("frontmatter.")
        .or_else(|| field.strip_prefix("frontmatter___"))
        .unwrap_or(field)
}

// ============================================================================
// Filter
// ============================================================================

/// Caller-supplied predicate for [`Filter::Custom`].
#[derive(Clone)]
pub struct Predicate(Arc<dyn Fn(&ContentNode) -> bool + Send + Sync>);

impl Predicate {
    pub fn new(f: impl Fn(&ContentNode) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate(..)")
    }
}

/// Typed node predicate.
///
/// Deserializes from configuration, e.g. in TOML:
///
/// ```toml
/// filter = { all_of = [
///     { ne = { field = "draft", value = true } },
///     { eq = { field = "tags", value = "rust" } },
/// ] }
/// ```
///
/// Fields are resolved like sort fields. A missing field never equals
/// anything, so `ne` holds for nodes without the field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    #[default]
    All,
    Exists {
        field: String,
    },
    Missing {
        field: String,
    },
    Eq {
        field: String,
        value: FieldValue,
    },
    Ne {
        field: String,
        value: FieldValue,
    },
    In {
        field: String,
        values: Vec<FieldValue>,
    },
    Not(Box<Filter>),
    AllOf(Vec<Filter>),
    AnyOf(Vec<Filter>),
    #[serde(skip)]
    Custom(Predicate),
}

impl Filter {
    pub fn custom(f: impl Fn(&ContentNode) -> bool + Send + Sync + 'static) -> Self {
        Self::Custom(Predicate::new(f))
    }

    pub fn matches(&self, node: &ContentNode) -> bool {
        let lookup = |field: &str| node.field(normalize_field(field));
        match self {
            Self::All => true,
            Self::Exists { field } => lookup(field).is_some(),
            Self::Missing { field } => lookup(field).is_none(),
            Self::Eq { field, value } => lookup(field).is_some_and(|v| v.matches(value)),
            Self::Ne { field, value } => !lookup(field).is_some_and(|v| v.matches(value)),
            Self::In { field, values } => {
                lookup(field).is_some_and(|v| values.iter().any(|lit| v.matches(lit)))
            }
            Self::Not(inner) => !inner.matches(node),
            Self::AllOf(filters) => filters.iter().all(|f| f.matches(node)),
            Self::AnyOf(filters) => filters.iter().any(|f| f.matches(node)),
            Self::Custom(predicate) => (predicate.0)(node),
        }
    }
}

// ============================================================================
// QueryEngine
// ============================================================================

/// Run `spec` over `nodes`, returning the filtered, sorted, truncated sequence.
///
/// Output order depends only on the input set, never on input order.
pub fn run<I>(nodes: I, spec: &QuerySpec) -> Result<Vec<ContentNode>, QueryError>
where
    I: IntoIterator<Item = ContentNode>,
{
    spec.validate()?;
    let field = normalize_field(&spec.sort.field);

    let mut keyed: Vec<(Option<FieldValue>, ContentNode)> = nodes
        .into_iter()
        .filter(|node| spec.filter.matches(node))
        .map(|node| (node.field(field), node))
        .collect();

    check_orderable(field, &keyed)?;

    let order = spec.sort.order;
    keyed.sort_by(|(key_a, a), (key_b, b)| {
        compare_keys(key_a.as_ref(), key_b.as_ref(), order).then_with(|| a.id.cmp(&b.id))
    });

    let mut result: Vec<ContentNode> = keyed.into_iter().map(|(_, node)| node).collect();
    if let Some(limit) = spec.limit {
        result.truncate(limit);
    }
    Ok(result)
}

/// Ensure every present key can be compared with every other one.
fn check_orderable(
    field: &str,
    keyed: &[(Option<FieldValue>, ContentNode)],
) -> Result<(), QueryError> {
    let mut first: Option<(ValueKind, &NodeId)> = None;

    for (key, node) in keyed {
        let Some(value) = key else { continue };
        let kind = value.kind();

        if !kind.is_orderable() {
            return Err(QueryError::Unorderable {
                field: field.to_owned(),
                kind,
                node: node.id.clone(),
            });
        }
        if value.is_nan() {
            return Err(QueryError::NotANumber {
                field: field.to_owned(),
                node: node.id.clone(),
            });
        }

        match first {
            None => first = Some((kind, &node.id)),
            Some((first_kind, first_node)) if first_kind != kind => {
                return Err(QueryError::Incomparable {
                    field: field.to_owned(),
                    first: first_kind,
                    first_node: first_node.clone(),
                    second: kind,
                    second_node: node.id.clone(),
                });
            }
            Some(_) => {}
        }
    }

    Ok(())
}

/// Missing keys pin to the head; only present-vs-present follows `order`.
fn compare_keys(a: Option<&FieldValue>, b: Option<&FieldValue>, order: SortOrder) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => {
            // check_orderable guarantees a total order here
            let ord = a.try_cmp(b).unwrap_or(Ordering::Equal);
            match order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        }
    }
}
