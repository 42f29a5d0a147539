//! Filter and sort model for record store queries.
//!
//! Supports the operators the routing engines actually issue: equality,
//! inequality, greater-or-equal thresholds, and inclusive ranges, combined
//! as an AND conjunction, with a priority list of sort keys and an optional
//! result limit.

use serde_json::Value;
use std::cmp::Ordering;

use super::record::Record;

/// Pseudo-field resolving to a record's identity, so filters can exclude
/// the acted-on record from its own sibling query.
pub const ID_FIELD: &str = "id";

fn lookup(record: &Record, field: &str) -> Option<Value> {
    if field == ID_FIELD {
        return Some(Value::String(record.id.to_string()));
    }
    record.field(field).cloned()
}

/// A single predicate on a named field
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq { field: String, value: Value },
    Ne { field: String, value: Value },
    Ge { field: String, value: Value },
    Between { field: String, start: Value, end: Value },
}

impl Condition {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Ne {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn ge(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Ge {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn between(
        field: impl Into<String>,
        start: impl Into<Value>,
        end: impl Into<Value>,
    ) -> Self {
        Self::Between {
            field: field.into(),
            start: start.into(),
            end: end.into(),
        }
    }

    /// Evaluate this condition against a record snapshot. A missing field
    /// never matches an ordered comparison.
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Self::Eq { field, value } => lookup(record, field).as_ref() == Some(value),
            Self::Ne { field, value } => lookup(record, field).as_ref() != Some(value),
            Self::Ge { field, value } => match lookup(record, field) {
                Some(actual) => matches!(
                    compare_values(&actual, value),
                    Some(Ordering::Greater | Ordering::Equal)
                ),
                None => false,
            },
            Self::Between { field, start, end } => match lookup(record, field) {
                Some(actual) => {
                    matches!(
                        compare_values(&actual, start),
                        Some(Ordering::Greater | Ordering::Equal)
                    ) && matches!(
                        compare_values(&actual, end),
                        Some(Ordering::Less | Ordering::Equal)
                    )
                }
                None => false,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// One entry in a query's sort priority list
#[derive(Debug, Clone, PartialEq)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

/// An AND conjunction of conditions with sorting and an optional limit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub conditions: Vec<Condition>,
    pub sort: Vec<SortKey>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort.push(SortKey {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.conditions.iter().all(|c| c.matches(record))
    }

    /// Apply the sort priority list. Records missing a sort field collate
    /// before records that carry it, which keeps the ordering total.
    pub fn sort_records(&self, records: &mut [Record]) {
        records.sort_by(|a, b| {
            for key in &self.sort {
                let ordering = match (a.field(&key.field), b.field(&key.field)) {
                    (Some(left), Some(right)) => {
                        compare_values(left, right).unwrap_or(Ordering::Equal)
                    }
                    (None, Some(_)) => Ordering::Less,
                    (Some(_), None) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                };
                let ordering = match key.direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });
    }
}

/// Ordered comparison over the JSON value kinds the core stores: integers
/// compare numerically, strings lexically (RFC 3339 timestamps collate
/// chronologically this way). Mixed or unordered kinds yield `None`.
fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => match (l.as_i64(), r.as_i64()) {
            (Some(l), Some(r)) => Some(l.cmp(&r)),
            _ => l.as_f64().partial_cmp(&r.as_f64()),
        },
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        (Value::Bool(l), Value::Bool(r)) => Some(l.cmp(r)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::record::EntityType;
    use uuid::Uuid;

    fn assignment(order: i64, created_at: &str) -> Record {
        Record::new(EntityType::ReviewAssignment, Uuid::new_v4())
            .with_field("order", order)
            .with_field("created_at", created_at)
    }

    #[test]
    fn test_eq_and_ne() {
        let record = assignment(2, "2024-05-01T09:00:00Z");
        assert!(Condition::eq("order", 2).matches(&record));
        assert!(!Condition::eq("order", 3).matches(&record));
        assert!(Condition::ne("order", 3).matches(&record));
        assert!(Condition::ne("missing", 3).matches(&record));
    }

    #[test]
    fn test_ge_threshold() {
        let record = assignment(4, "2024-05-01T09:00:00Z");
        assert!(Condition::ge("order", 4).matches(&record));
        assert!(Condition::ge("order", 2).matches(&record));
        assert!(!Condition::ge("order", 5).matches(&record));
        assert!(!Condition::ge("missing", 0).matches(&record));
    }

    #[test]
    fn test_between_is_inclusive() {
        let record = assignment(3, "2024-05-01T09:00:00Z");
        assert!(Condition::between("order", 3, 5).matches(&record));
        assert!(Condition::between("order", 1, 3).matches(&record));
        assert!(!Condition::between("order", 4, 9).matches(&record));
    }

    #[test]
    fn test_conjunction() {
        let record = assignment(3, "2024-05-01T09:00:00Z");
        let query = Query::new()
            .and(Condition::ge("order", 1))
            .and(Condition::eq("created_at", "2024-05-01T09:00:00Z"));
        assert!(query.matches(&record));

        let query = query.and(Condition::eq("order", 9));
        assert!(!query.matches(&record));
    }

    #[test]
    fn test_id_pseudo_field_excludes_self() {
        let record = assignment(1, "2024-05-01T09:00:00Z");
        let own_id = record.id.to_string();
        assert!(!Condition::ne(ID_FIELD, own_id.clone()).matches(&record));
        assert!(Condition::ne(ID_FIELD, Uuid::new_v4().to_string()).matches(&record));
        assert!(Condition::eq(ID_FIELD, own_id).matches(&record));
    }

    #[test]
    fn test_sort_priority_list() {
        let mut records = vec![
            assignment(2, "2024-05-01T09:02:00Z"),
            assignment(1, "2024-05-01T09:05:00Z"),
            assignment(2, "2024-05-01T09:01:00Z"),
        ];

        let query = Query::new()
            .order_by("order", SortDirection::Ascending)
            .order_by("created_at", SortDirection::Ascending);
        query.sort_records(&mut records);

        assert_eq!(records[0].int("order"), Some(1));
        assert_eq!(records[1].text("created_at"), Some("2024-05-01T09:01:00Z"));
        assert_eq!(records[2].text("created_at"), Some("2024-05-01T09:02:00Z"));
    }
}
