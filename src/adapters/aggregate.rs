//! Aggregation pipeline executor over in-memory documents.

use crate::domain::document::{get_path, set_path, sort_order};
use crate::domain::stage::{Accumulator, GroupKey, GroupSpec, SortDirection, Stage};
use crate::utils::error::{Result, StatsError};
use serde_json::{json, Map, Value};
use std::collections::HashMap;

/// Run `stages` in order over `documents`.
pub fn execute(mut documents: Vec<Value>, stages: &[Stage]) -> Result<Vec<Value>> {
    for stage in stages {
        let before = documents.len();
        documents = execute_stage(documents, stage)?;
        tracing::trace!(stage = stage.name(), before, after = documents.len(), "stage executed");
    }
    Ok(documents)
}

fn execute_stage(documents: Vec<Value>, stage: &Stage) -> Result<Vec<Value>> {
    match stage {
        Stage::Unwind(path) => Ok(unwind(documents, path)),
        Stage::Match(filter) => Ok(documents.into_iter().filter(|d| filter.matches(d)).collect()),
        Stage::Group(spec) => Ok(group(documents, spec)),
        Stage::Sort { field, direction } => Ok(sort(documents, field, *direction)),
        Stage::Limit(n) => Ok(documents.into_iter().take(*n).collect()),
        Stage::BucketAuto { group_by, buckets } => bucket_auto(documents, group_by, *buckets),
    }
}

fn unwind(documents: Vec<Value>, path: &str) -> Vec<Value> {
    let mut result = Vec::new();
    for doc in documents {
        match get_path(&doc, path) {
            Some(Value::Array(items)) => {
                for item in items {
                    let mut row = doc.clone();
                    set_path(&mut row, path, item.clone());
                    result.push(row);
                }
            }
            None | Some(Value::Null) => {}
            Some(_) => result.push(doc),
        }
    }
    result
}

fn group(documents: Vec<Value>, spec: &GroupSpec) -> Vec<Value> {
    // Groups come out in order of first appearance.
    let mut groups: Vec<(Value, Vec<Value>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for doc in documents {
        let key = group_key(&doc, &spec.key);
        let key_str = key.to_string();
        match index.get(&key_str) {
            Some(&i) => groups[i].1.push(doc),
            None => {
                index.insert(key_str, groups.len());
                groups.push((key, vec![doc]));
            }
        }
    }

    groups
        .into_iter()
        .map(|(key, docs)| {
            let mut out = Map::new();
            out.insert("_id".to_string(), key);
            for (field, acc) in &spec.accumulators {
                out.insert(field.clone(), accumulate(acc, &docs));
            }
            Value::Object(out)
        })
        .collect()
}

fn group_key(doc: &Value, key: &GroupKey) -> Value {
    match key {
        GroupKey::All => Value::Null,
        GroupKey::Field(field) => get_path(doc, field).cloned().unwrap_or(Value::Null),
        GroupKey::Compound(fields) => {
            let mut id = Map::new();
            for field in fields {
                let value = get_path(doc, field).cloned().unwrap_or(Value::Null);
                id.insert(field.clone(), value);
            }
            Value::Object(id)
        }
    }
}

fn accumulate(acc: &Accumulator, docs: &[Value]) -> Value {
    let numbers = |path: &str| -> Vec<f64> {
        docs.iter()
            .filter_map(|d| get_path(d, path).and_then(Value::as_f64))
            .collect()
    };
    match acc {
        Accumulator::Count => json!(docs.len()),
        Accumulator::Avg(path) => {
            let values = numbers(path);
            if values.is_empty() {
                Value::Null
            } else {
                json!(values.iter().sum::<f64>() / values.len() as f64)
            }
        }
    }
}

fn sort(mut documents: Vec<Value>, field: &str, direction: SortDirection) -> Vec<Value> {
    // sort_by is stable: ties keep their incoming order.
    documents.sort_by(|a, b| {
        let ordering = sort_order(get_path(a, field), get_path(b, field));
        match direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
    documents
}

/// Each bucket takes `round(len / buckets)` values, extended so equal values
/// stay together; the last bucket takes whatever remains. Fewer buckets than
/// asked for only come back when there are too few distinct values. A
/// bucket's `max` is the next bucket's `min`; the last bucket's `max` is the
/// largest value.
fn bucket_auto(documents: Vec<Value>, group_by: &str, buckets: usize) -> Result<Vec<Value>> {
    if buckets == 0 {
        return Err(StatsError::invalid_pipeline(
            "bucketAuto requires a positive number of buckets",
        ));
    }

    let mut values: Vec<(f64, Value)> = documents
        .iter()
        .filter_map(|d| get_path(d, group_by))
        .filter_map(|v| v.as_f64().map(|f| (f, v.clone())))
        .collect();
    if values.is_empty() {
        return Ok(Vec::new());
    }
    values.sort_by(|a, b| a.0.total_cmp(&b.0));

    let per_bucket = ((values.len() as f64 / buckets as f64).round() as usize).max(1);
    let mut result = Vec::new();
    let mut start = 0;
    while start < values.len() {
        let mut end = if result.len() + 1 == buckets {
            values.len()
        } else {
            (start + per_bucket).min(values.len())
        };
        while end < values.len() && values[end].0 == values[end - 1].0 {
            end += 1;
        }
        let max = match values.get(end) {
            Some((_, next)) => next.clone(),
            None => values[end - 1].1.clone(),
        };
        result.push(json!({
            "_id": {"min": values[start].1.clone(), "max": max},
            "count": end - start,
        }));
        start = end;
    }
    Ok(result)
}
