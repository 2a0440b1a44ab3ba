//! Signing material extracted from request headers.

use crate::models::rejection::Rejection;

/// Raw signing headers as they arrived, before any requiredness check.
///
/// Requiredness depends on policy (a route with signing skipped may omit
/// all three), so resolution into a [`SigningContext`] is deferred until
/// the pipeline knows signing is active.
#[derive(Debug, Clone, Default)]
pub struct SigningHeaders {
    pub timestamp: Option<String>,
    pub nonce: Option<String>,
    pub signature: Option<String>,
}

impl SigningHeaders {
    /// Resolve into a usable context. Any missing header or an unparsable
    /// timestamp is a `PARAMETER_ERROR`.
    pub fn resolve(&self) -> Result<SigningContext, Rejection> {
        let timestamp_ms = self
            .timestamp
            .as_deref()
            .and_then(|t| t.parse::<i64>().ok())
            .ok_or(Rejection::ParameterError)?;
        let nonce = self.nonce.clone().ok_or(Rejection::ParameterError)?;
        let signature = self.signature.clone().ok_or(Rejection::ParameterError)?;
        if nonce.is_empty() || signature.is_empty() {
            return Err(Rejection::ParameterError);
        }
        Ok(SigningContext {
            timestamp_ms,
            nonce,
            signature,
        })
    }
}

/// Validated signing inputs for one request. The secret key never appears
/// here; it comes from configuration only.
#[derive(Debug, Clone)]
pub struct SigningContext {
    pub timestamp_ms: i64,
    pub nonce: String,
    pub signature: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_header_is_parameter_error() {
        let headers = SigningHeaders {
            timestamp: Some("1700000000000".into()),
            nonce: Some("n1".into()),
            signature: None,
        };
        assert_eq!(headers.resolve().unwrap_err(), Rejection::ParameterError);
    }

    #[test]
    fn garbage_timestamp_is_parameter_error() {
        let headers = SigningHeaders {
            timestamp: Some("not-a-number".into()),
            nonce: Some("n1".into()),
            signature: Some("ab".into()),
        };
        assert_eq!(headers.resolve().unwrap_err(), Rejection::ParameterError);
    }

    #[test]
    fn complete_headers_resolve() {
        let headers = SigningHeaders {
            timestamp: Some("1700000000000".into()),
            nonce: Some("n1".into()),
            signature: Some("abcd".into()),
        };
        let ctx = headers.resolve().unwrap();
        assert_eq!(ctx.timestamp_ms, 1_700_000_000_000);
    }
}
