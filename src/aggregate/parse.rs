use bson::Bson;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::types::{Accumulator, KeyExpr, MAX_STAGES, Operand, Order, Pipeline, SortSpec, Stage};
use crate::errors::AggError;
use crate::utils::json::json_to_bson;

// Serde-facing shape of one pipeline stage: a single-key object such as
// `{"$group": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageSerde {
    #[serde(rename = "$group")]
    Group(Map<String, Value>),
    #[serde(rename = "$sort")]
    Sort(Map<String, Value>),
    #[serde(rename = "$limit")]
    Limit(i64),
}

fn invalid(msg: impl Into<String>) -> AggError {
    AggError::InvalidArgument(msg.into())
}

impl TryFrom<StageSerde> for Stage {
    type Error = AggError;
    fn try_from(ss: StageSerde) -> Result<Self, Self::Error> {
        Ok(match ss {
            StageSerde::Group(mut body) => {
                let id = body.shift_remove("_id").ok_or_else(|| invalid("$group requires an _id"))?;
                let key = parse_key_expr(&id)?;
                let accumulators = body
                    .into_iter()
                    .map(|(name, spec)| parse_accumulator(&name, &spec).map(|a| (name, a)))
                    .collect::<Result<_, _>>()?;
                Self::Group { key, accumulators }
            }
            StageSerde::Sort(body) => {
                let keys = body
                    .into_iter()
                    .map(|(field, dir)| match dir.as_f64() {
                        Some(d) if d == 1.0 => Ok(SortSpec { field, order: Order::Asc }),
                        Some(d) if d == -1.0 => Ok(SortSpec { field, order: Order::Desc }),
                        _ => Err(invalid(format!("$sort direction for '{field}' must be 1 or -1"))),
                    })
                    .collect::<Result<_, _>>()?;
                Self::Sort { keys }
            }
            StageSerde::Limit(count) => Self::Limit { count },
        })
    }
}

impl From<&Stage> for StageSerde {
    fn from(stage: &Stage) -> Self {
        match stage {
            Stage::Group { key, accumulators } => {
                let mut body = Map::new();
                body.insert("_id".into(), key_expr_to_json(key));
                for (name, acc) in accumulators {
                    body.insert(name.clone(), accumulator_to_json(acc));
                }
                Self::Group(body)
            }
            Stage::Sort { keys } => Self::Sort(
                keys.iter()
                    .map(|k| (k.field.clone(), json!(if k.order == Order::Asc { 1 } else { -1 })))
                    .collect(),
            ),
            Stage::Limit { count } => Self::Limit(*count),
        }
    }
}

fn parse_key_expr(v: &Value) -> Result<KeyExpr, AggError> {
    match v {
        Value::String(s) => match s.strip_prefix('$') {
            Some("") => Err(invalid("empty field reference '$'")),
            Some(path) => Ok(KeyExpr::Field(path.to_string())),
            None => Ok(KeyExpr::Literal(Bson::String(s.clone()))),
        },
        Value::Null | Value::Bool(_) | Value::Number(_) => Ok(KeyExpr::Literal(json_to_bson(v))),
        Value::Object(obj) if obj.len() == 1 => {
            let (op, arg) = obj.iter().next().ok_or_else(|| invalid("empty expression"))?;
            match op.as_str() {
                "$concat" => {
                    let parts = arg.as_array().ok_or_else(|| invalid("$concat expects an array"))?;
                    Ok(KeyExpr::Concat(parts.iter().map(parse_key_expr).collect::<Result<_, _>>()?))
                }
                "$substr" => {
                    let args = arg
                        .as_array()
                        .filter(|a| a.len() == 3)
                        .ok_or_else(|| invalid("$substr expects [expression, start, length]"))?;
                    let start = args[1]
                        .as_u64()
                        .and_then(|s| usize::try_from(s).ok())
                        .ok_or_else(|| invalid("$substr start must be a non-negative integer"))?;
                    let len = args[2].as_i64().ok_or_else(|| invalid("$substr length must be an integer"))?;
                    Ok(KeyExpr::Substr { input: Box::new(parse_key_expr(&args[0])?), start, len })
                }
                "$literal" => match arg {
                    Value::Array(_) | Value::Object(_) => Err(invalid("$literal only supports scalars")),
                    scalar => Ok(KeyExpr::Literal(json_to_bson(scalar))),
                },
                other => Err(invalid(format!("unsupported expression operator '{other}'"))),
            }
        }
        other => Err(invalid(format!("unsupported group key: {other}"))),
    }
}

fn parse_accumulator(name: &str, v: &Value) -> Result<Accumulator, AggError> {
    let obj = v
        .as_object()
        .filter(|o| o.len() == 1)
        .ok_or_else(|| invalid(format!("accumulator '{name}' must be a single-operator object")))?;
    let (op, arg) = obj.iter().next().ok_or_else(|| invalid("empty accumulator"))?;
    let field_ref = |arg: &Value| arg.as_str().and_then(|s| s.strip_prefix('$')).map(str::to_string);
    match op.as_str() {
        "$avg" => field_ref(arg)
            .map(Accumulator::Avg)
            .ok_or_else(|| invalid(format!("$avg for '{name}' expects a field reference"))),
        "$sum" => {
            if let Some(n) = arg.as_i64() {
                Ok(Accumulator::Sum(Operand::Const(n)))
            } else if let Some(f) = arg.as_f64() {
                Ok(Accumulator::Sum(Operand::Float(f)))
            } else {
                field_ref(arg)
                    .map(|f| Accumulator::Sum(Operand::Field(f)))
                    .ok_or_else(|| invalid(format!("$sum for '{name}' expects an integer or a field reference")))
            }
        }
        "$count" if arg.as_object().is_some_and(Map::is_empty) => Ok(Accumulator::Count),
        "$count" => Err(invalid("$count takes an empty object")),
        other => Err(invalid(format!("unsupported accumulator '{other}'"))),
    }
}

fn key_expr_to_json(expr: &KeyExpr) -> Value {
    match expr {
        KeyExpr::Field(p) => Value::String(format!("${p}")),
        KeyExpr::Literal(Bson::String(s)) if s.starts_with('$') => json!({ "$literal": s }),
        KeyExpr::Literal(b) => serde_json::to_value(b).unwrap_or(Value::Null),
        KeyExpr::Substr { input, start, len } => {
            json!({ "$substr": [key_expr_to_json(input), start, len] })
        }
        KeyExpr::Concat(parts) => json!({ "$concat": parts.iter().map(key_expr_to_json).collect::<Vec<_>>() }),
    }
}

fn accumulator_to_json(acc: &Accumulator) -> Value {
    match acc {
        Accumulator::Avg(f) => json!({ "$avg": format!("${f}") }),
        Accumulator::Sum(Operand::Const(n)) => json!({ "$sum": n }),
        Accumulator::Sum(Operand::Float(f)) => json!({ "$sum": f }),
        Accumulator::Sum(Operand::Field(f)) => json!({ "$sum": format!("${f}") }),
        Accumulator::Count => json!({ "$count": {} }),
    }
}

/// Parses a JSON array of stages, e.g.
/// `[{"$group": {"_id": "$author", "count": {"$sum": 1}}}, {"$sort": {"count": -1}}, {"$limit": 1}]`.
///
/// # Errors
/// Returns `Json` when the text is not a valid stage array and `InvalidArgument`
/// for unsupported operators or malformed stage bodies.
pub fn parse_pipeline_json(json: &str) -> Result<Pipeline, AggError> {
    let raw: Vec<StageSerde> = serde_json::from_str(json)?;
    if raw.len() > MAX_STAGES {
        return Err(invalid(format!("too many stages: {}", raw.len())));
    }
    let stages = raw.into_iter().map(Stage::try_from).collect::<Result<_, _>>()?;
    Ok(Pipeline::new(stages))
}

#[must_use]
pub fn pipeline_to_json(pipeline: &Pipeline) -> Value {
    Value::Array(
        pipeline
            .stages
            .iter()
            .map(|s| serde_json::to_value(StageSerde::from(s)).unwrap_or(Value::Null))
            .collect(),
    )
}
