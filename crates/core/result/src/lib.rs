#[cfg(feature = "serde")]
#[macro_use]
extern crate serde;

use std::fmt;

/// Result type with custom Error
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error information
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    /// Type of error and additional information
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub error_type: ErrorType,

    /// Where this error occurred
    pub location: String,
}

/// Possible error types
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorType {
    /// This error was not labeled :(
    LabelMe,

    // ? Request related errors
    InvalidUrl {
        url: String,
    },
    InvalidHeader {
        name: String,
    },
    InvalidMethod {
        method: String,
    },
    RequestFailed {
        error: String,
    },
    BodyReadFailed {
        error: String,
    },

    // ? General errors
    InternalError,
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorType::LabelMe => write!(f, "Unlabeled error"),
            ErrorType::InvalidUrl { url } => write!(f, "Invalid URL: {url}"),
            ErrorType::InvalidHeader { name } => write!(f, "Invalid header: {name}"),
            ErrorType::InvalidMethod { method } => write!(f, "Invalid method: {method}"),
            ErrorType::RequestFailed { error } => write!(f, "Request failed: {error}"),
            ErrorType::BodyReadFailed { error } => {
                write!(f, "Failed to read response body: {error}")
            }
            ErrorType::InternalError => write!(f, "Internal error"),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (at {})", self.error_type, self.location)
    }
}

impl std::error::Error for Error {}

#[macro_export]
macro_rules! create_error {
    ( $error: ident $( $tt:tt )? ) => {
        $crate::Error {
            error_type: $crate::ErrorType::$error $( $tt )?,
            location: format!("{}:{}:{}", file!(), line!(), column!()),
        }
    };
}

/// Log an unexpected error and replace it with [`ErrorType::InternalError`]
#[macro_export]
macro_rules! report_internal_error {
    ( $expr: expr ) => {
        $expr.map_err(|err| {
            ::tracing::error!("{err:?} ({}:{}:{})", file!(), line!(), column!());
            $crate::create_error!(InternalError)
        })
    };
}
