use bson::{Bson, Document as BsonDocument};
use ordered_float::OrderedFloat;
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

use super::eval::{as_f64, compare_docs, get_path, is_numeric};
use super::expr::eval_key;
use super::types::{
    Accumulator, KeyExpr, MAX_ACCUMULATORS, MAX_EXPR_DEPTH, MAX_SORT_FIELDS, MAX_STAGES, Operand,
    Pipeline, SortSpec, Stage,
};
use crate::errors::AggError;
use crate::utils::num::{i64_to_usize, u128_to_u64_saturating, usize_to_u64};

/// Runs every stage of `pipeline` over `docs`.
///
/// The whole pipeline is validated before any stage runs; a stage failing at
/// evaluation time aborts the pipeline without partial output.
///
/// # Errors
/// `InvalidArgument` for malformed stages or negative limits,
/// `InvalidAccumulator` when a numeric accumulator meets a non-numeric value.
pub fn evaluate(docs: &[BsonDocument], pipeline: &Pipeline) -> Result<Vec<BsonDocument>, AggError> {
    if let Err(e) = validate(pipeline) {
        log::warn!("rejected pipeline: {e}");
        return Err(e);
    }
    let start = std::time::Instant::now();
    let mut current: Cow<'_, [BsonDocument]> = Cow::Borrowed(docs);
    for stage in &pipeline.stages {
        let before = current.len();
        current = match stage {
            Stage::Group { key, accumulators } => Cow::Owned(group_by(&current, key, accumulators)?),
            Stage::Sort { keys } => Cow::Owned(sort_by(current.into_owned(), keys)?),
            Stage::Limit { count } => {
                let n = limit_len(*count)?;
                match current {
                    Cow::Borrowed(s) => Cow::Borrowed(&s[..n.min(s.len())]),
                    Cow::Owned(mut v) => {
                        v.truncate(n);
                        Cow::Owned(v)
                    }
                }
            }
        };
        log::debug!("{} stage: {} -> {} documents", stage.name(), before, current.len());
    }
    let out = current.into_owned();
    crate::dev6!(
        "{{\"bench\":\"aggregate\",\"stages\":{},\"input_count\":{},\"result_count\":{},\"duration_ms\":{}}}",
        usize_to_u64(pipeline.len()),
        usize_to_u64(docs.len()),
        usize_to_u64(out.len()),
        u128_to_u64_saturating(start.elapsed().as_millis())
    );
    Ok(out)
}

/// Partitions `docs` by `key` and computes each accumulator per partition.
///
/// Output documents carry `_id` first, then the accumulators in declaration
/// order. Groups are emitted in the order their key was first seen.
///
/// # Errors
/// Propagates key expression errors and `InvalidAccumulator` failures.
pub fn group_by(
    docs: &[BsonDocument],
    key: &KeyExpr,
    accumulators: &[(String, Accumulator)],
) -> Result<Vec<BsonDocument>, AggError> {
    let mut slots: HashMap<GroupKey, usize> = HashMap::new();
    let mut groups: Vec<(Bson, Vec<AccState>)> = Vec::new();
    for doc in docs {
        let k = eval_key(doc, key)?;
        let idx = match slots.get(&GroupKey::from(&k)) {
            Some(&i) => i,
            None => {
                let i = groups.len();
                slots.insert(GroupKey::from(&k), i);
                groups.push((k, accumulators.iter().map(|(_, a)| AccState::new(a)).collect()));
                i
            }
        };
        for ((name, acc), state) in accumulators.iter().zip(groups[idx].1.iter_mut()) {
            state.feed(doc, name, acc)?;
        }
    }
    Ok(groups
        .into_iter()
        .map(|(id, states)| {
            let mut out = BsonDocument::new();
            out.insert("_id", id);
            for ((name, _), state) in accumulators.iter().zip(states) {
                out.insert(name.clone(), state.finish());
            }
            out
        })
        .collect())
}

/// Stable sort; documents comparing equal keep their input order.
///
/// # Errors
/// Returns `InvalidArgument` for more than `MAX_SORT_FIELDS` keys.
pub fn sort_by(mut docs: Vec<BsonDocument>, keys: &[SortSpec]) -> Result<Vec<BsonDocument>, AggError> {
    if keys.len() > MAX_SORT_FIELDS {
        return Err(AggError::InvalidArgument(format!("too many sort keys: {}", keys.len())));
    }
    docs.sort_by(|a, b| compare_docs(a, b, keys));
    Ok(docs)
}

/// Keeps the first `n` documents.
///
/// # Errors
/// Returns `InvalidArgument` if `n` is negative.
pub fn limit(mut docs: Vec<BsonDocument>, n: i64) -> Result<Vec<BsonDocument>, AggError> {
    docs.truncate(limit_len(n)?);
    Ok(docs)
}

fn limit_len(n: i64) -> Result<usize, AggError> {
    i64_to_usize(n).ok_or_else(|| AggError::InvalidArgument(format!("$limit must be non-negative, got {n}")))
}

/// Structural checks run before evaluation.
///
/// # Errors
/// Returns `InvalidArgument` describing the first malformed stage.
pub fn validate(pipeline: &Pipeline) -> Result<(), AggError> {
    if pipeline.len() > MAX_STAGES {
        return Err(AggError::InvalidArgument(format!("too many stages: {}", pipeline.len())));
    }
    // Known top-level fields once a $group has reshaped the documents.
    let mut shape: Option<HashSet<&str>> = None;
    for (i, stage) in pipeline.stages.iter().enumerate() {
        let bad = |msg: String| AggError::InvalidArgument(format!("stage {i} ({}): {msg}", stage.name()));
        match stage {
            Stage::Group { key, accumulators } => {
                check_key(key, 0).map_err(bad)?;
                if accumulators.len() > MAX_ACCUMULATORS {
                    return Err(bad(format!("too many accumulators: {}", accumulators.len())));
                }
                let mut fields = HashSet::from(["_id"]);
                for (name, acc) in accumulators {
                    check_output_name(name).map_err(bad)?;
                    if !fields.insert(name.as_str()) {
                        return Err(bad(format!("duplicate output field '{name}'")));
                    }
                    if acc.source_field().is_some_and(str::is_empty) {
                        return Err(bad(format!("accumulator '{name}' has an empty source field")));
                    }
                }
                shape = Some(fields);
            }
            Stage::Sort { keys } => {
                if keys.is_empty() {
                    return Err(bad("sort requires at least one key".into()));
                }
                if keys.len() > MAX_SORT_FIELDS {
                    return Err(bad(format!("too many sort keys: {}", keys.len())));
                }
                let mut seen = HashSet::new();
                for k in keys {
                    if k.field.is_empty() {
                        return Err(bad("empty sort field".into()));
                    }
                    if !seen.insert(k.field.as_str()) {
                        return Err(bad(format!("duplicate sort field '{}'", k.field)));
                    }
                    let head = k.field.split('.').next().unwrap_or_default();
                    if let Some(fields) = &shape
                        && !fields.contains(head)
                    {
                        return Err(bad(format!("sort field '{}' is not produced by the preceding $group", k.field)));
                    }
                }
            }
            Stage::Limit { count } => {
                if *count < 0 {
                    return Err(bad(format!("must be non-negative, got {count}")));
                }
            }
        }
    }
    Ok(())
}

fn check_output_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        Err("empty output field name".into())
    } else if name == "_id" {
        Err("'_id' is reserved for the group key".into())
    } else if name.starts_with('$') || name.contains('.') {
        Err(format!("invalid output field name '{name}'"))
    } else {
        Ok(())
    }
}

fn check_key(expr: &KeyExpr, depth: usize) -> Result<(), String> {
    if depth > MAX_EXPR_DEPTH {
        return Err("key expression nested too deeply".into());
    }
    match expr {
        KeyExpr::Field(p) if p.is_empty() => Err("empty field reference".into()),
        KeyExpr::Field(_) | KeyExpr::Literal(_) => Ok(()),
        KeyExpr::Substr { input, .. } => check_key(input, depth + 1),
        KeyExpr::Concat(parts) => parts.iter().try_for_each(|p| check_key(p, depth + 1)),
    }
}

/// Hashable normalization of a group key: integral numbers of any width and
/// integral doubles share one representation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum GroupKey {
    Null,
    Bool(bool),
    Int(i64),
    Num(OrderedFloat<f64>),
    Str(String),
    Other(String),
}

impl From<&Bson> for GroupKey {
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn from(v: &Bson) -> Self {
        match v {
            Bson::Null | Bson::Undefined => Self::Null,
            Bson::Boolean(b) => Self::Bool(*b),
            Bson::Int32(i) => Self::Int(i64::from(*i)),
            Bson::Int64(i) => Self::Int(*i),
            Bson::String(s) => Self::Str(s.clone()),
            n if is_numeric(n) => {
                let f = as_f64(n).unwrap_or(f64::NAN);
                // [-2^63, 2^63) is exactly the range where `as i64` does not saturate
                const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;
                if f.fract() == 0.0 && (-TWO_POW_63..TWO_POW_63).contains(&f) {
                    Self::Int(f as i64)
                } else {
                    Self::Num(OrderedFloat(f))
                }
            }
            other => Self::Other(format!("{other:?}")),
        }
    }
}

enum AccState {
    Avg { sum: f64, n: u64 },
    SumField { int: Option<i64>, float: f64 },
    SumConst { per_doc: i64, int: Option<i64>, float: f64 },
    SumFloat { per_doc: f64, total: f64 },
    Count(u64),
}

impl AccState {
    fn new(acc: &Accumulator) -> Self {
        match acc {
            Accumulator::Avg(_) => Self::Avg { sum: 0.0, n: 0 },
            Accumulator::Sum(Operand::Field(_)) => Self::SumField { int: Some(0), float: 0.0 },
            Accumulator::Sum(Operand::Const(c)) => Self::SumConst { per_doc: *c, int: Some(0), float: 0.0 },
            Accumulator::Sum(Operand::Float(c)) => Self::SumFloat { per_doc: *c, total: 0.0 },
            Accumulator::Count => Self::Count(0),
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn feed(&mut self, doc: &BsonDocument, output: &str, acc: &Accumulator) -> Result<(), AggError> {
        match self {
            Self::Avg { sum, n } => {
                *sum += numeric_source(doc, output, acc)?.1;
                *n += 1;
            }
            Self::SumField { int, float } => {
                let (v, f) = numeric_source(doc, output, acc)?;
                *float += f;
                *int = match (*int, v) {
                    (Some(total), Bson::Int32(i)) => total.checked_add(i64::from(*i)),
                    (Some(total), Bson::Int64(i)) => total.checked_add(*i),
                    _ => None,
                };
            }
            Self::SumConst { per_doc, int, float } => {
                *float += *per_doc as f64;
                *int = int.and_then(|total| total.checked_add(*per_doc));
            }
            Self::SumFloat { per_doc, total } => *total += *per_doc,
            Self::Count(n) => *n += 1,
        }
        Ok(())
    }

    #[allow(clippy::cast_precision_loss)]
    fn finish(self) -> Bson {
        match self {
            Self::Avg { sum, n } => Bson::Double(sum / n as f64),
            Self::SumField { int: Some(i), .. } => Bson::Int64(i),
            Self::SumField { int: None, float } => Bson::Double(float),
            Self::SumConst { int: Some(i), .. } => Bson::Int64(i),
            Self::SumConst { int: None, float, .. } => Bson::Double(float),
            Self::SumFloat { total, .. } => Bson::Double(total),
            Self::Count(n) => Bson::Int64(i64::try_from(n).unwrap_or(i64::MAX)),
        }
    }
}

fn numeric_source<'a>(
    doc: &'a BsonDocument,
    output: &str,
    acc: &Accumulator,
) -> Result<(&'a Bson, f64), AggError> {
    let field = acc.source_field().unwrap_or_default();
    let invalid = |reason: String| AggError::InvalidAccumulator {
        output: output.to_string(),
        field: field.to_string(),
        reason,
    };
    let v = get_path(doc, field).ok_or_else(|| invalid("field is missing".into()))?;
    let f = as_f64(v).ok_or_else(|| invalid(format!("expected a number, got {:?}", v.element_type())))?;
    Ok((v, f))
}
