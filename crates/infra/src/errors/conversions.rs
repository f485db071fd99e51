//! Conversions from external infrastructure errors into domain errors.

use reqwest::Error as HttpError;
use reqwest::StatusCode;
use serde_json::Error as JsonError;
use userdeck_domain::FetchError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub FetchError);

impl From<InfraError> for FetchError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<FetchError> for InfraError {
    fn from(value: FetchError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoFetchError {
    fn into_fetch_error(self) -> FetchError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → FetchError */
/* -------------------------------------------------------------------------- */

impl IntoFetchError for HttpError {
    fn into_fetch_error(self) -> FetchError {
        if self.is_timeout() {
            return FetchError::Network("HTTP request timed out".into());
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return FetchError::Network("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            return status_to_fetch_error(status);
        }

        if self.is_decode() || self.is_body() {
            return FetchError::InvalidResponse(self.to_string());
        }

        FetchError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_fetch_error())
    }
}

/// Map a non-success HTTP status to the matching fetch failure.
pub fn status_to_fetch_error(status: StatusCode) -> FetchError {
    let code = status.as_u16();
    let message = format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

    match code {
        401 | 403 => FetchError::Auth(message),
        404 => FetchError::NotFound(message),
        400..=499 => FetchError::InvalidResponse(message),
        _ => FetchError::Network(message),
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json::Error → FetchError */
/* -------------------------------------------------------------------------- */

impl IntoFetchError for JsonError {
    fn into_fetch_error(self) -> FetchError {
        FetchError::InvalidResponse(format!("malformed JSON payload: {self}"))
    }
}

impl From<JsonError> for InfraError {
    fn from(value: JsonError) -> Self {
        InfraError(value.into_fetch_error())
    }
}

/* -------------------------------------------------------------------------- */
/* Web-service exception payload → FetchError */
/* -------------------------------------------------------------------------- */

/// Map a web-service exception (`errorcode` + `message`) to a fetch failure.
pub fn exception_to_fetch_error(errorcode: &str, message: &str) -> FetchError {
    let detail = format!("{errorcode}: {message}");
    match errorcode {
        "invalidtoken" | "accessexception" | "requireloginerror" | "forcepasswordchangenotice"
        | "usernotfullysetup" | "sitepolicynotagreed" => FetchError::Auth(detail),
        "invaliduser" | "invalidrecord" | "invalidrecordunknown" => FetchError::NotFound(detail),
        _ => FetchError::Internal(detail),
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
