//! Group key expressions: field references, literals, `$substr` and `$concat`.

use bson::{Bson, Document as BsonDocument};

use super::eval::get_path;
use super::types::{KeyExpr, MAX_EXPR_DEPTH};
use crate::errors::AggError;

/// Decade bucket label: the first three characters of the year's string form
/// followed by `"0s"`. This is a string operation, so `987` maps to `"9870s"`.
#[must_use]
pub fn decade_key(year: i64) -> String {
    let mut out = substr_chars(&year.to_string(), 0, 3);
    out.push_str("0s");
    out
}

/// Character-based substring. A negative `len` runs to the end of `s`.
#[must_use]
pub fn substr_chars(s: &str, start: usize, len: i64) -> String {
    let rest = s.chars().skip(start);
    match usize::try_from(len) {
        Ok(n) => rest.take(n).collect(),
        Err(_) => rest.collect(),
    }
}

/// Evaluates a key expression against one document. A missing field evaluates
/// to `Bson::Null`.
///
/// # Errors
/// Returns `InvalidArgument` when `$substr` or `$concat` receive a value they
/// cannot turn into a string, or the expression nests too deeply.
pub fn eval_key(doc: &BsonDocument, expr: &KeyExpr) -> Result<Bson, AggError> {
    eval_depth(doc, expr, 0)
}

fn eval_depth(doc: &BsonDocument, expr: &KeyExpr, depth: usize) -> Result<Bson, AggError> {
    if depth > MAX_EXPR_DEPTH {
        return Err(AggError::InvalidArgument("key expression nested too deeply".into()));
    }
    match expr {
        KeyExpr::Field(path) => Ok(get_path(doc, path).cloned().unwrap_or(Bson::Null)),
        KeyExpr::Literal(v) => Ok(v.clone()),
        KeyExpr::Substr { input, start, len } => {
            let v = eval_depth(doc, input, depth + 1)?;
            let s = stringify(&v)?;
            Ok(Bson::String(substr_chars(&s, *start, *len)))
        }
        KeyExpr::Concat(parts) => {
            let mut out = String::new();
            for p in parts {
                match eval_depth(doc, p, depth + 1)? {
                    Bson::String(s) => out.push_str(&s),
                    Bson::Null | Bson::Undefined => return Ok(Bson::Null),
                    other => {
                        return Err(AggError::InvalidArgument(format!(
                            "$concat only supports strings, got {:?}",
                            other.element_type()
                        )));
                    }
                }
            }
            Ok(Bson::String(out))
        }
    }
}

/// String form used by `$substr`: missing/null become `""`, integral doubles
/// print without a fractional part.
fn stringify(v: &Bson) -> Result<String, AggError> {
    match v {
        Bson::String(s) | Bson::Symbol(s) => Ok(s.clone()),
        Bson::Null | Bson::Undefined => Ok(String::new()),
        Bson::Int32(i) => Ok(i.to_string()),
        Bson::Int64(i) => Ok(i.to_string()),
        Bson::Double(f) => Ok(format_double(*f)),
        Bson::Decimal128(d) => Ok(d.to_string()),
        other => Err(AggError::InvalidArgument(format!(
            "$substr cannot convert {:?} to a string",
            other.element_type()
        ))),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn format_double(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
        (f as i64).to_string()
    } else {
        f.to_string()
    }
}
