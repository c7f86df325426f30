//! Records are untyped JSON objects; only `id` has meaning to the engine.

use serde_json::{Map, Value};

pub type Record = Map<String, Value>;

pub const ID_FIELD: &str = "id";

/// Normalized identifier of `record`.
///
/// Integral JSON numbers map to `i64`, including float spellings such as
/// `2.0`. Anything else (missing, strings, fractions) has no id and never
/// matches a lookup.
pub fn record_id(record: &Record) -> Option<i64> {
    match record.get(ID_FIELD)? {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        _ => None,
    }
}

pub fn set_id(record: &mut Record, id: i64) {
    record.insert(ID_FIELD.to_string(), Value::from(id));
}

/// Count-based assignment: a record without `id` gets `count + 1`, placed
/// as the first field.
///
/// This can hand out an id that is still in use once records have been
/// deleted; callers keep it that way.
pub fn assign_id_if_missing(record: &mut Record, count: usize) {
    if !record.contains_key(ID_FIELD) {
        record.shift_insert(0, ID_FIELD.to_string(), Value::from(count as i64 + 1));
    }
}
