//
// Copyright (c) 2024, 2025 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
include!(concat!(env!("OUT_DIR"), "/ua.rs"));

pub(crate) fn sdk_version() -> &'static str {
    SDK_VERSION
}

pub(crate) fn user_agent() -> &'static str {
    USER_AGENT
}

/// The error type returned by all operations in this library.
///
/// `code` classifies the failure. Errors reported by the FileMaker host also carry
/// the raw message code from the response envelope (see [`FMError::host_code()`]),
/// and type conversion errors carry the name of the offending field
/// (see [`FMError::field()`]).
#[derive(Debug, Clone)]
pub struct FMError {
    pub code: FMErrorCode,
    pub message: String,
    pub(crate) host_code: Option<String>,
    pub(crate) field: Option<String>,
}

impl std::error::Error for FMError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

impl std::fmt::Display for FMError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if let Some(hc) = &self.host_code {
            return write!(
                f,
                "code={:?} host_code={} message=\"{}\"",
                self.code, hc, self.message
            );
        }
        write!(f, "code={:?} message=\"{}\"", self.code, self.message)
    }
}

impl FMError {
    pub fn new(code: FMErrorCode, msg: &str) -> FMError {
        FMError {
            code,
            message: msg.to_string(),
            host_code: None,
            field: None,
        }
    }

    /// Create an error for a non-zero message code returned by the host.
    pub fn host(host_code: &str, msg: &str) -> FMError {
        FMError {
            code: FMErrorCode::Host,
            message: format!("failed at host: {} ({})", msg, host_code),
            host_code: Some(host_code.to_string()),
            field: None,
        }
    }

    pub(crate) fn not_found(host_code: &str, msg: &str) -> FMError {
        FMError {
            code: FMErrorCode::NotFound,
            message: msg.to_string(),
            host_code: Some(host_code.to_string()),
            field: None,
        }
    }

    pub(crate) fn type_mismatch(field: &str, expected: &str, actual: &dyn std::fmt::Debug) -> FMError {
        FMError {
            code: FMErrorCode::TypeMismatch,
            message: format!(
                "field `{}` could not be read as {}: {:?}",
                field, expected, actual
            ),
            host_code: None,
            field: Some(field.to_string()),
        }
    }

    pub(crate) fn unknown_format(field: &str, value: &str) -> FMError {
        FMError {
            code: FMErrorCode::UnknownFormat,
            message: format!("field `{}` has an unknown date/time format: {:?}", field, value),
            host_code: None,
            field: Some(field.to_string()),
        }
    }

    /// The message code reported by the FileMaker host, if this error came from the host.
    pub fn host_code(&self) -> Option<&str> {
        self.host_code.as_deref()
    }

    /// The name of the record field involved, for type mismatch and format errors.
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// Returns `true` if this error means the requested record(s) did not exist.
    pub fn is_not_found(&self) -> bool {
        self.code == FMErrorCode::NotFound
    }
}

macro_rules! ia_error {
    ($($t:tt)*) => {{
        let m = format!($($t)*);
        FMError::new(
            crate::error::FMErrorCode::IllegalArgument,
            &format!("{} ({})", m, crate::error::sdk_version()),
        )
    }};
}

pub(crate) use ia_error;

macro_rules! ia_err {
    ($($t:tt)*) => {{
        Err(crate::error::ia_error!($($t)*))
    }};
}

pub(crate) use ia_err;

macro_rules! config_err {
    ($($t:tt)*) => {{
        let m = format!($($t)*);
        Err(FMError::new(
            crate::error::FMErrorCode::Config,
            &format!("{} ({})", m, crate::error::sdk_version()),
        ))
    }};
}

pub(crate) use config_err;

macro_rules! precondition_err {
    ($($t:tt)*) => {{
        let m = format!($($t)*);
        Err(FMError::new(
            crate::error::FMErrorCode::Precondition,
            &format!("{} ({})", m, crate::error::sdk_version()),
        ))
    }};
}

pub(crate) use precondition_err;

impl From<reqwest::Error> for FMError {
    fn from(e: reqwest::Error) -> Self {
        let mut code = FMErrorCode::Transport;
        if e.is_timeout() {
            code = FMErrorCode::RequestTimeout;
        }
        FMError::new(
            code,
            &format!("reqwest error: {} ({})", e, crate::error::sdk_version()),
        )
    }
}

impl From<serde_json::Error> for FMError {
    fn from(e: serde_json::Error) -> Self {
        FMError::new(
            FMErrorCode::Decode,
            &format!("json error: {} ({})", e, crate::error::sdk_version()),
        )
    }
}

impl From<reqwest::header::InvalidHeaderValue> for FMError {
    fn from(e: reqwest::header::InvalidHeaderValue) -> Self {
        ia_error!("invalid header value: {}", e.to_string())
    }
}

impl From<url::ParseError> for FMError {
    fn from(e: url::ParseError) -> Self {
        ia_error!("error parsing url: {}", e.to_string())
    }
}

/// Classification of an [`FMError`].
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum FMErrorCode {
    /// Required connection settings (host, database, username) are missing.
    /// Reported before any network call is made.
    Config,

    /// The HTTP request could not be built, sent, or its response read.
    Transport,

    /// The HTTP request did not complete within the configured timeout.
    RequestTimeout,

    /// The response body was not a valid response envelope.
    Decode,

    /// The host returned a non-zero message code. See [`FMError::host_code()`].
    Host,

    /// The requested record does not exist on the host.
    NotFound,

    /// A typed getter was applied to a field holding an incompatible value.
    /// See [`FMError::field()`].
    TypeMismatch,

    /// A date or timestamp field holds text in none of the recognized formats.
    UnknownFormat,

    /// The operation requires a record that has already been created on the host.
    Precondition,

    /// The application provided an illegal argument for the operation.
    IllegalArgument,
}
