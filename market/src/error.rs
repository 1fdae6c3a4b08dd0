use thiserror::Error;

/// Errors raised by the window tracker set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarketError {
    /// A tracker with this name is already registered. Raised at startup only.
    #[error("window `{0}` is already registered")]
    DuplicateWindow(String),

    /// A query named a window that was never registered.
    #[error("unknown window `{0}`")]
    UnknownWindow(String),
}

/// A feed payload that cannot be turned into a [`Trade`](crate::types::Trade).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MalformedTradeError {
    #[error("trade payload is not a JSON object")]
    NotAnObject,

    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("field `{field}` is not numeric: {value}")]
    NotNumeric { field: &'static str, value: String },

    #[error("field `{field}` must be a non-negative finite number, got {value}")]
    OutOfRange { field: &'static str, value: f64 },
}
