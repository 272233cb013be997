use bson::Document as BsonDocument;

use crate::aggregate::{self, Pipeline};
use crate::errors::AggError;

/// An ordered, in-memory set of documents. Insertion order is kept so that
/// evaluation output is deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collection {
    name: String,
    docs: Vec<BsonDocument>,
}

impl Collection {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), docs: Vec::new() }
    }

    pub fn from_documents(name: impl Into<String>, docs: Vec<BsonDocument>) -> Self {
        Self { name: name.into(), docs }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn insert(&mut self, doc: BsonDocument) {
        self.docs.push(doc);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    #[must_use]
    pub fn documents(&self) -> &[BsonDocument] {
        &self.docs
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BsonDocument> {
        self.docs.iter()
    }

    /// Runs `pipeline` over this collection without modifying it.
    ///
    /// # Errors
    /// See [`aggregate::evaluate`].
    pub fn aggregate(&self, pipeline: &Pipeline) -> Result<Vec<BsonDocument>, AggError> {
        log::debug!("aggregate: collection={} stages={}", self.name, pipeline.len());
        aggregate::evaluate(&self.docs, pipeline)
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a BsonDocument;
    type IntoIter = std::slice::Iter<'a, BsonDocument>;
    fn into_iter(self) -> Self::IntoIter {
        self.docs.iter()
    }
}
