//! Label validation service client.
//!
//! The service receives the expected tracking number together with a photo of
//! the label and answers whether the printed label is correct:
//!
//! ```text
//! POST {base}/shipping/label/validate   {"trackingNumber": "...", "image": "<base64>"}
//! 200 -> {"result": {"valid": true, "expectedAddress": {...}, "scannedAddress": {...}}}
//! 4xx/5xx -> {"error": "..."}
//! ```

use std::future::Future;
use std::time::Duration;

use labelcheck_core::constants::{DEFAULT_API_BASE_URL, VALIDATE_PATH};
use labelcheck_core::{ValidationRequest, ValidationResult};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

/// Errors from a validation call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The service answered with a non-success status.
    #[error("Validation rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The request never produced a response (connect, timeout, reset).
    #[error("Validation request failed: {0}")]
    Transport(String),

    /// The response body could not be decoded.
    #[error("Invalid validation response: {0}")]
    Decode(String),

    /// The configured base URL cannot be used.
    #[error("Invalid API base URL: {0}")]
    InvalidUrl(String),
}

/// Something that can validate a captured label.
///
/// The returned future must be `Send` so validation can run on a spawned task.
pub trait LabelValidator: Send + Sync {
    fn validate(
        &self,
        request: ValidationRequest,
    ) -> impl Future<Output = Result<ValidationResult, ValidationError>> + Send;
}

/// Configuration for [`HttpValidationClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationClientConfig {
    /// API root, for example `http://localhost:8080/api/latest`.
    pub base_url: String,

    /// Whole-request timeout. `None` waits for the service indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for ValidationClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: None,
        }
    }
}

/// Success body. An absent or null `result` reads as an invalid label.
#[derive(Deserialize)]
struct ValidationResponse {
    #[serde(default)]
    result: Option<ValidationResult>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

/// JSON-over-HTTP validation client.
///
/// # Example
///
/// ```no_run
/// use labelcheck_core::{ImagePayload, TrackingNumber, ValidationRequest};
/// use labelcheck_network::{HttpValidationClient, LabelValidator, ValidationClientConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpValidationClient::new(ValidationClientConfig::default())?;
///
/// let request = ValidationRequest::new(
///     Some(TrackingNumber::new("1Z12345E0205271688")?),
///     ImagePayload::new("/9j/4AAQSkZJRg==")?,
/// );
/// let result = client.validate(request).await?;
/// println!("valid: {}", result.valid);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpValidationClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl HttpValidationClient {
    /// Build a client for `config.base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidUrl`] if the base URL does not parse,
    /// or [`ValidationError::Transport`] if the HTTP client cannot be built.
    pub fn new(config: ValidationClientConfig) -> Result<Self, ValidationError> {
        let endpoint = validation_endpoint(&config.base_url)?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| ValidationError::Transport(e.to_string()))?;

        debug!(endpoint = %endpoint, "Validation client ready");
        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn post(&self, request: &ValidationRequest) -> Result<ValidationResult, ValidationError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Validation request failed");
                ValidationError::Transport(e.to_string())
            })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            warn!(error = %e, "Validation response interrupted");
            ValidationError::Transport(e.to_string())
        })?;

        if status.is_success() {
            let decoded: ValidationResponse = serde_json::from_slice(&body)
                .map_err(|e| ValidationError::Decode(e.to_string()))?;
            let result = decoded.result.unwrap_or_default();
            info!(valid = result.valid, "Label validated");
            return Ok(result);
        }

        let message = match serde_json::from_slice::<ErrorResponse>(&body) {
            Ok(ErrorResponse { error }) => error,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string(),
        };
        warn!(status = status.as_u16(), message = %message, "Validation rejected");

        Err(ValidationError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

impl LabelValidator for HttpValidationClient {
    fn validate(
        &self,
        request: ValidationRequest,
    ) -> impl Future<Output = Result<ValidationResult, ValidationError>> + Send {
        async move { self.post(&request).await }
    }
}

/// Join the validation path onto `base_url`, tolerating a missing trailing slash.
fn validation_endpoint(base_url: &str) -> Result<Url, ValidationError> {
    let mut base = Url::parse(base_url)
        .map_err(|e| ValidationError::InvalidUrl(format!("{base_url}: {e}")))?;

    if base.cannot_be_a_base() {
        return Err(ValidationError::InvalidUrl(format!(
            "{base_url}: not a base URL"
        )));
    }
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }

    base.join(VALIDATE_PATH)
        .map_err(|e| ValidationError::InvalidUrl(format!("{base_url}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(
        "http://localhost:8080/api/latest",
        "http://localhost:8080/api/latest/shipping/label/validate"
    )]
    #[case(
        "http://localhost:8080/api/latest/",
        "http://localhost:8080/api/latest/shipping/label/validate"
    )]
    #[case("https://labels.example.com", "https://labels.example.com/shipping/label/validate")]
    fn test_validation_endpoint(#[case] base: &str, #[case] expected: &str) {
        assert_eq!(validation_endpoint(base).unwrap().as_str(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("localhost:8080")]
    #[case("mailto:ops@example.com")]
    fn test_validation_endpoint_invalid(#[case] base: &str) {
        assert!(matches!(
            validation_endpoint(base),
            Err(ValidationError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_error_display() {
        let error = ValidationError::Rejected {
            status: 400,
            message: "image is not a jpeg".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Validation rejected (400): image is not a jpeg"
        );
    }
}
