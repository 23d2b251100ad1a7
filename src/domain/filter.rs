//! Store-native filter documents.
//!
//! A filter is a JSON object in the usual document-database shape:
//! `{"name": "Ann", "marks.mark": {"$gte": 90}, "$or": [...]}`. Field paths fan
//! out through embedded arrays, so `marks.subject` matches when any mark has
//! that subject.

use crate::domain::document::{compare_values, resolve_path, values_equal};
use crate::utils::error::{Result, StatsError};
use serde_json::Value;
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(Value),
    Ne(Value),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    In(Vec<Value>),
    Nin(Vec<Value>),
    Exists(bool),
    Size(usize),
    Not(Box<Condition>),
}

#[derive(Debug, Clone, PartialEq)]
enum Clause {
    Field { path: String, condition: Condition },
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Nor(Vec<Filter>),
}

/// Conjunction of clauses. The empty filter matches every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<Clause>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: &str, condition: Condition) -> Self {
        self.clauses.push(Clause::Field {
            path: path.to_string(),
            condition,
        });
        self
    }

    pub fn eq(self, path: &str, value: impl Into<Value>) -> Self {
        self.with(path, Condition::Eq(value.into()))
    }

    pub fn gt(self, path: &str, value: impl Into<Value>) -> Self {
        self.with(path, Condition::Gt(value.into()))
    }

    pub fn lt(self, path: &str, value: impl Into<Value>) -> Self {
        self.with(path, Condition::Lt(value.into()))
    }

    pub fn in_set<I, V>(self, path: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.with(path, Condition::In(values.into_iter().map(Into::into).collect()))
    }

    /// Parse a filter from its JSON text.
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| StatsError::malformed_query(format!("invalid JSON: {}", e)))?;
        Self::from_json(&value)
    }

    pub fn from_json(value: &Value) -> Result<Self> {
        let obj = match value {
            Value::Object(obj) => obj,
            Value::Null => return Ok(Self::new()),
            _ => return Err(StatsError::malformed_query("filter must be a JSON object")),
        };

        let mut filter = Self::new();
        for (key, value) in obj {
            if key.starts_with('$') {
                filter.clauses.push(Self::parse_logical(key, value)?);
            } else {
                for condition in Self::parse_conditions(value)? {
                    filter = filter.with(key, condition);
                }
            }
        }
        Ok(filter)
    }

    fn parse_logical(op: &str, value: &Value) -> Result<Clause> {
        let items = value
            .as_array()
            .ok_or_else(|| StatsError::malformed_query(format!("{} requires an array", op)))?;
        let filters = items.iter().map(Self::from_json).collect::<Result<Vec<_>>>()?;
        match op {
            "$and" => Ok(Clause::And(filters)),
            "$or" => Ok(Clause::Or(filters)),
            "$nor" => Ok(Clause::Nor(filters)),
            _ => Err(StatsError::malformed_query(format!("unknown operator: {}", op))),
        }
    }

    fn parse_conditions(value: &Value) -> Result<Vec<Condition>> {
        match value {
            Value::Object(obj) if obj.keys().any(|k| k.starts_with('$')) => obj
                .iter()
                .map(|(op, operand)| Self::parse_operator(op, operand))
                .collect(),
            _ => Ok(vec![Condition::Eq(value.clone())]),
        }
    }

    fn parse_operator(op: &str, value: &Value) -> Result<Condition> {
        let array = |value: &Value| {
            value
                .as_array()
                .cloned()
                .ok_or_else(|| StatsError::malformed_query(format!("{} requires an array", op)))
        };
        match op {
            "$eq" => Ok(Condition::Eq(value.clone())),
            "$ne" => Ok(Condition::Ne(value.clone())),
            "$gt" => Ok(Condition::Gt(value.clone())),
            "$gte" => Ok(Condition::Gte(value.clone())),
            "$lt" => Ok(Condition::Lt(value.clone())),
            "$lte" => Ok(Condition::Lte(value.clone())),
            "$in" => Ok(Condition::In(array(value)?)),
            "$nin" => Ok(Condition::Nin(array(value)?)),
            "$exists" => value
                .as_bool()
                .map(Condition::Exists)
                .ok_or_else(|| StatsError::malformed_query("$exists requires a boolean")),
            "$size" => value
                .as_u64()
                .map(|n| Condition::Size(n as usize))
                .ok_or_else(|| StatsError::malformed_query("$size requires a non-negative integer")),
            "$not" => {
                let mut inner = Self::parse_conditions(value)?;
                match (inner.pop(), inner.is_empty()) {
                    (Some(condition), true) if value.is_object() => {
                        Ok(Condition::Not(Box::new(condition)))
                    }
                    _ => Err(StatsError::malformed_query(
                        "$not requires a single operator object",
                    )),
                }
            }
            _ => Err(StatsError::malformed_query(format!("unknown operator: {}", op))),
        }
    }

    pub fn matches(&self, doc: &Value) -> bool {
        self.clauses.iter().all(|clause| match clause {
            Clause::Field { path, condition } => condition.matches(&resolve_path(doc, path)),
            Clause::And(filters) => filters.iter().all(|f| f.matches(doc)),
            Clause::Or(filters) => filters.iter().any(|f| f.matches(doc)),
            Clause::Nor(filters) => !filters.iter().any(|f| f.matches(doc)),
        })
    }
}

impl Condition {
    /// `values` are everything the field path resolved to.
    fn matches(&self, values: &[&Value]) -> bool {
        match self {
            Condition::Exists(expected) => !values.is_empty() == *expected,
            Condition::Size(size) => values
                .iter()
                .any(|v| v.as_array().is_some_and(|a| a.len() == *size)),
            Condition::Ne(expected) => !Condition::Eq(expected.clone()).matches(values),
            Condition::Nin(expected) => !Condition::In(expected.clone()).matches(values),
            Condition::Not(inner) => !inner.matches(values),
            Condition::Eq(expected) if values.is_empty() => expected.is_null(),
            _ => candidates(values).any(|v| self.matches_one(v)),
        }
    }

    fn matches_one(&self, value: &Value) -> bool {
        let ordered = |expected: &Value, accept: fn(Ordering) -> bool| {
            compare_values(value, expected).is_some_and(accept)
        };
        match self {
            Condition::Eq(expected) => values_equal(value, expected),
            Condition::In(expected) => expected.iter().any(|e| values_equal(value, e)),
            Condition::Gt(expected) => ordered(expected, |o| o == Ordering::Greater),
            Condition::Gte(expected) => ordered(expected, |o| o != Ordering::Less),
            Condition::Lt(expected) => ordered(expected, |o| o == Ordering::Less),
            Condition::Lte(expected) => ordered(expected, |o| o != Ordering::Greater),
            _ => false,
        }
    }
}

/// Resolved values plus the elements of any resolved arrays.
fn candidates<'a>(values: &'a [&'a Value]) -> impl Iterator<Item = &'a Value> + 'a {
    values.iter().flat_map(|v| {
        let elements = v.as_array().map(|a| a.iter()).into_iter().flatten();
        std::iter::once(*v).chain(elements)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ann() -> Value {
        json!({
            "stid": 1,
            "name": "Ann",
            "marks": [{"subject": "Math", "mark": 90}, {"subject": "Art", "mark": 55}]
        })
    }

    #[test]
    fn test_equality_and_nested_array_paths() {
        assert!(Filter::parse(r#"{"name": "Ann"}"#).unwrap().matches(&ann()));
        assert!(Filter::parse(r#"{"marks.subject": "Art"}"#).unwrap().matches(&ann()));
        assert!(!Filter::parse(r#"{"marks.subject": "art"}"#).unwrap().matches(&ann()));
    }

    #[test]
    fn test_comparison_operators() {
        let doc = ann();
        assert!(Filter::parse(r#"{"marks.mark": {"$gt": 80}}"#).unwrap().matches(&doc));
        assert!(!Filter::parse(r#"{"marks.mark": {"$lt": 50}}"#).unwrap().matches(&doc));
        assert!(Filter::parse(r#"{"stid": {"$gte": 1, "$lte": 1}}"#).unwrap().matches(&doc));
        assert!(Filter::parse(r#"{"stid": {"$ne": 2}}"#).unwrap().matches(&doc));
    }

    #[test]
    fn test_in_and_logical_operators() {
        let doc = ann();
        assert!(Filter::parse(r#"{"name": {"$in": ["Bob", "Ann"]}}"#).unwrap().matches(&doc));
        assert!(Filter::parse(r#"{"$or": [{"name": "Bob"}, {"stid": 1}]}"#).unwrap().matches(&doc));
        assert!(!Filter::parse(r#"{"$nor": [{"name": "Ann"}]}"#).unwrap().matches(&doc));
        assert!(Filter::parse(r#"{"marks": {"$size": 2}}"#).unwrap().matches(&doc));
        assert!(Filter::parse(r#"{"email": {"$exists": false}}"#).unwrap().matches(&doc));
        assert!(Filter::parse(r#"{"stid": {"$not": {"$gt": 5}}}"#).unwrap().matches(&doc));
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        assert!(Filter::parse("{}").unwrap().matches(&ann()));
        assert!(Filter::parse("null").unwrap().matches(&json!({"stid": 7})));
    }

    #[test]
    fn test_malformed_filters_are_rejected() {
        for text in ["{invalid", "[1, 2]", r#"{"stid": {"$near": 1}}"#, r#"{"$or": {}}"#] {
            let err = Filter::parse(text).unwrap_err();
            assert!(matches!(err, StatsError::MalformedQuery { .. }), "{}", text);
        }
    }

    #[test]
    fn test_builder_matches_parsed_form() {
        let built = Filter::new().eq("name", "Ann").lt("stid", 5);
        assert!(built.matches(&ann()));
        let names = Filter::new().in_set("name", vec!["Bob".to_string()]);
        assert!(!names.matches(&ann()));
    }
}
