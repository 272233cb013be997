use bson::Bson;
use serde::{Deserialize, Serialize};

// Safety limits to prevent resource abuse
pub(crate) const MAX_PATH_DEPTH: usize = 32;
pub(crate) const MAX_SORT_FIELDS: usize = 8;
pub(crate) const MAX_ACCUMULATORS: usize = 64;
pub(crate) const MAX_EXPR_DEPTH: usize = 16;
pub(crate) const MAX_STAGES: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Order {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub order: Order,
}

impl SortSpec {
    pub fn asc(field: impl Into<String>) -> Self {
        Self { field: field.into(), order: Order::Asc }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self { field: field.into(), order: Order::Desc }
    }
}

/// Group key derivation.
///
/// `Substr` and `Concat` follow the string operators of document stores: the
/// input of `Substr` is stringified, and `Concat` turns null when any part is
/// missing or null.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyExpr {
    Field(String),
    Literal(Bson),
    Substr { input: Box<KeyExpr>, start: usize, len: i64 },
    Concat(Vec<KeyExpr>),
}

impl KeyExpr {
    pub fn field(path: impl Into<String>) -> Self {
        Self::Field(path.into())
    }

    pub fn literal(value: impl Into<Bson>) -> Self {
        Self::Literal(value.into())
    }

    /// `{ $concat: [ { $substr: [<field>, 0, 3] }, "0s" ] }`
    pub fn decade_of(path: impl Into<String>) -> Self {
        Self::Concat(vec![
            Self::Substr { input: Box::new(Self::Field(path.into())), start: 0, len: 3 },
            Self::literal("0s"),
        ])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Const(i64),
    Float(f64),
    Field(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Accumulator {
    Avg(String),
    Sum(Operand),
    Count,
}

impl Accumulator {
    /// Source field path, when the accumulator reads one.
    #[must_use]
    pub fn source_field(&self) -> Option<&str> {
        match self {
            Self::Avg(f) | Self::Sum(Operand::Field(f)) => Some(f),
            Self::Sum(Operand::Const(_) | Operand::Float(_)) | Self::Count => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Group { key: KeyExpr, accumulators: Vec<(String, Accumulator)> },
    Sort { keys: Vec<SortSpec> },
    Limit { count: i64 },
}

impl Stage {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Group { .. } => "$group",
            Self::Sort { .. } => "$sort",
            Self::Limit { .. } => "$limit",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pipeline {
    pub stages: Vec<Stage>,
}

impl Pipeline {
    #[must_use]
    pub fn new(stages: Vec<Stage>) -> Self {
        Self { stages }
    }

    #[must_use]
    pub fn group(mut self, key: KeyExpr, accumulators: Vec<(&str, Accumulator)>) -> Self {
        let accumulators = accumulators.into_iter().map(|(n, a)| (n.to_string(), a)).collect();
        self.stages.push(Stage::Group { key, accumulators });
        self
    }

    #[must_use]
    pub fn sort(mut self, keys: Vec<SortSpec>) -> Self {
        self.stages.push(Stage::Sort { keys });
        self
    }

    #[must_use]
    pub fn limit(mut self, count: i64) -> Self {
        self.stages.push(Stage::Limit { count });
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}
