use crate::crawler::Record;
use serde_json::Value;
use std::fmt;

/// Why a single field could not be extracted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// Nothing in the document matched
    Missing,
    /// Something matched but could not be turned into a value
    Malformed(String),
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "missing"),
            Self::Malformed(reason) => write!(f, "malformed: {}", reason),
        }
    }
}

/// A partial record: the fields that were found plus what went wrong
///
/// Extraction never throws away the fields it managed to read because a
/// sibling field failed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedFields {
    fields: Record,
    problems: Vec<(String, FieldError)>,
}

impl ExtractedFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the outcome of one field
    pub fn record<V: Into<Value>>(&mut self, name: &str, outcome: Result<V, FieldError>) {
        match outcome {
            Ok(value) => {
                self.fields.insert(name.to_string(), value.into());
            }
            Err(problem) => self.problems.push((name.to_string(), problem)),
        }
    }

    pub fn insert(&mut self, name: &str, value: impl Into<Value>) {
        self.fields.insert(name.to_string(), value.into());
    }

    /// Nests another extraction under `name`, keeping its problems
    pub fn nest(&mut self, name: &str, inner: ExtractedFields) {
        for (field, problem) in inner.problems {
            self.problems.push((format!("{}.{}", name, field), problem));
        }
        if !inner.fields.is_empty() {
            self.fields
                .insert(name.to_string(), Value::Object(inner.fields));
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> &Record {
        &self.fields
    }

    pub fn problems(&self) -> &[(String, FieldError)] {
        &self.problems
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Logs every problem at debug level under `context`
    pub fn log_problems(&self, context: &str) {
        for (field, problem) in &self.problems {
            tracing::debug!("{}: field '{}' {}", context, field, problem);
        }
    }

    pub fn into_record(self) -> Record {
        self.fields
    }
}
