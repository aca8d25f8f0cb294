use thiserror::Error;

/// Failure to turn a raw identity string into an [`crate::Identity`].
///
/// Every variant carries the name of the request field that held the value so
/// callers can report it without extra bookkeeping.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EntityIdError {
    #[error("{field}: entity id is required")]
    Missing { field: String },

    #[error("{field}: '{input}' is not a valid entity id")]
    Malformed { field: String, input: String },

    #[error("{field}: {component} {value} is out of range")]
    OutOfRange {
        field: String,
        component: &'static str,
        value: u128,
    },
}

impl EntityIdError {
    pub fn field(&self) -> &str {
        match self {
            EntityIdError::Missing { field }
            | EntityIdError::Malformed { field, .. }
            | EntityIdError::OutOfRange { field, .. } => field,
        }
    }
}

/// Failure to split a raw `operator:value` parameter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("missing value")]
    EmptyValue,

    #[error("malformed operator expression '{0}'")]
    Malformed(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamIssue {
    /// Known parameter with a value that failed validation.
    Invalid,
    /// Parameter the resource does not accept.
    Unknown,
}

/// One offending query parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvalidParam {
    pub field: String,
    pub issue: ParamIssue,
    /// Internal detail for logs; never rendered to clients.
    pub detail: String,
}

impl InvalidParam {
    pub fn invalid(field: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            issue: ParamIssue::Invalid,
            detail: detail.into(),
        }
    }

    pub fn unknown(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            issue: ParamIssue::Unknown,
            detail: String::new(),
        }
    }

    /// Client-facing message.
    pub fn message(&self) -> String {
        match self.issue {
            ParamIssue::Invalid => format!("Invalid parameter: {}", self.field),
            ParamIssue::Unknown => format!("Unknown query parameter: {}", self.field),
        }
    }
}

impl From<EntityIdError> for InvalidParam {
    fn from(e: EntityIdError) -> Self {
        InvalidParam::invalid(e.field().to_string(), e.to_string())
    }
}

/// All bad parameters of one request, in the order they were encountered.
///
/// A field is listed at most once even if several of its occurrences fail.
#[derive(Debug, Error, Clone, Default, PartialEq, Eq)]
#[error("{}", self.summary())]
pub struct BadParameters {
    params: Vec<InvalidParam>,
}

impl BadParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(param: InvalidParam) -> Self {
        let mut out = Self::new();
        out.push(param);
        out
    }

    pub fn push(&mut self, param: InvalidParam) {
        if self.params.iter().any(|p| p.field == param.field) {
            return;
        }
        self.params.push(param);
    }

    pub fn extend(&mut self, other: BadParameters) {
        for p in other.params {
            self.push(p);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &InvalidParam> {
        self.params.iter()
    }

    pub fn messages(&self) -> Vec<String> {
        self.params.iter().map(InvalidParam::message).collect()
    }

    /// `Ok(value)` when nothing was collected, `Err(self)` otherwise.
    pub fn into_result<T>(self, value: T) -> Result<T, BadParameters> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }

    fn summary(&self) -> String {
        self.messages().join(", ")
    }
}

impl From<EntityIdError> for BadParameters {
    fn from(e: EntityIdError) -> Self {
        BadParameters::single(e.into())
    }
}
