//! Actix Web adapter for the admission pipeline.
//!
//! Function-based middleware: handlers (or an outer filter) pass the
//! request and the already-buffered body bytes in, and get either `Ok`
//! or a ready-made rejection response. The body is read from the buffer,
//! never from the stream, so framework deserialization can still consume
//! it afterward.

use actix_web::{http::StatusCode, HttpRequest, HttpResponse};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::models::{ParamSnapshot, PolicyRegistry, Rejection, SigningHeaders};
use crate::services::pipeline::{AdmissionPipeline, RequestDescriptor};
use crate::utils::{extract_client_ip, extract_route_pattern, extract_user_agent};

/// Header carrying the authenticated caller identity, when an auth layer
/// upstream has established one. Falls back to the client IP.
const CALLER_HEADER: &str = "X-User-Id";

/// Run the admission pipeline for this request.
pub fn admission_middleware(
    req: &HttpRequest,
    body: &[u8],
    pipeline: &AdmissionPipeline,
    registry: &PolicyRegistry,
) -> Result<(), HttpResponse> {
    admission_middleware_with_files(req, body, &[], pipeline, registry)
}

/// Variant for multipart requests: each uploaded file part contributes a
/// short digest token to the snapshot, so the signature covers file
/// content without feeding raw bytes into the canonical string. The
/// caller hands over the already-buffered part bytes as
/// `(field name, bytes)` pairs.
pub fn admission_middleware_with_files(
    req: &HttpRequest,
    body: &[u8],
    files: &[(&str, &[u8])],
    pipeline: &AdmissionPipeline,
    registry: &PolicyRegistry,
) -> Result<(), HttpResponse> {
    let route = extract_route_pattern(req);
    let method = req.method().as_str().to_string();
    let policy = registry.resolve(&method, &route);

    let digests: Vec<(String, String)> = files
        .iter()
        .map(|(field, bytes)| ((*field).to_string(), file_digest(bytes)))
        .collect();
    let snapshot = build_snapshot_with_digests(req.query_string(), body, &digests);
    let signing = signing_headers(req);
    let ip = extract_client_ip(req);
    let user_agent = extract_user_agent(req);
    let caller = header_value(req, CALLER_HEADER).unwrap_or_else(|| ip.clone());

    let desc = RequestDescriptor {
        method: &method,
        route: &route,
        ip: &ip,
        user_agent: user_agent.as_deref(),
        caller_identity: &caller,
    };

    pipeline
        .admit(&desc, policy, &snapshot, &signing)
        .map_err(rejection_response)
}

/// Build the parameter snapshot from the raw query string and buffered
/// body bytes.
///
/// Query pairs are taken verbatim, without percent-decoding; clients
/// sign the raw values they send. A JSON object body contributes its
/// top-level fields (nulls dropped, nested values as compact JSON); any
/// other JSON value becomes the reserved `body` scalar. A body that is
/// not JSON contributes nothing.
pub fn build_snapshot(query: &str, body: &[u8]) -> ParamSnapshot {
    build_snapshot_with_digests(query, body, &[])
}

/// [`build_snapshot`] plus pre-computed multipart digest tokens, one per
/// uploaded file field.
pub fn build_snapshot_with_digests(
    query: &str,
    body: &[u8],
    digests: &[(String, String)],
) -> ParamSnapshot {
    let mut builder = ParamSnapshot::builder();

    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        builder = builder.url_param(key, value);
    }

    for (field, digest) in digests {
        builder = builder.multipart_digest(field.clone(), digest.clone());
    }

    if !body.is_empty() {
        if let Ok(value) = serde_json::from_slice::<Value>(body) {
            match value {
                Value::Object(fields) => {
                    for (key, value) in fields {
                        match value {
                            Value::Null => {}
                            Value::String(s) => builder = builder.body_field(key, s),
                            other => builder = builder.body_field(key, other.to_string()),
                        }
                    }
                }
                Value::String(s) => builder = builder.body_scalar(s),
                other => builder = builder.body_scalar(other.to_string()),
            }
        }
    }

    builder.build()
}

/// Short digest token for an uploaded file, used in place of the raw
/// bytes when signing multipart requests.
pub fn file_digest(bytes: &[u8]) -> String {
    let digest = hex::encode(Sha256::digest(bytes));
    digest[..16].to_string()
}

/// Convert a rejection into the structured HTTP response the caller
/// sees: stable numeric code, message key, and default message.
pub fn rejection_response(rejection: Rejection) -> HttpResponse {
    let status =
        StatusCode::from_u16(rejection.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    HttpResponse::build(status).json(serde_json::json!({
        "code": rejection.code(),
        "key": rejection.message_key(),
        "message": rejection.to_string(),
    }))
}

fn signing_headers(req: &HttpRequest) -> SigningHeaders {
    SigningHeaders {
        timestamp: header_value(req, "timestamp"),
        nonce: header_value(req, "nonce"),
        signature: header_value(req, "sign"),
    }
}

fn header_value(req: &HttpRequest, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::canonical::{canonical_string, JoinOrder};

    #[test]
    fn query_pairs_are_taken_verbatim() {
        let snap = build_snapshot("a=1&b=hello%20world", b"");
        assert_eq!(
            canonical_string(&snap, JoinOrder::Insertion).unwrap(),
            "a=1&b=hello%20world"
        );
    }

    #[test]
    fn json_object_body_contributes_fields() {
        let snap = build_snapshot("", br#"{"amount": 10, "note": "x", "gone": null}"#);
        let s = canonical_string(&snap, JoinOrder::Lexicographic).unwrap();
        assert_eq!(s, "amount=10&note=x");
    }

    #[test]
    fn json_array_body_becomes_scalar() {
        let snap = build_snapshot("", b"[1,2,3]");
        assert_eq!(snap.body_scalar(), Some("[1,2,3]"));
    }

    #[test]
    fn non_json_body_contributes_nothing() {
        let snap = build_snapshot("", b"\x00\x01binary");
        assert!(snap.body_fields().is_empty());
        assert_eq!(snap.body_scalar(), None);
    }

    #[test]
    fn multipart_digests_join_the_snapshot() {
        let digests = vec![("file".to_string(), file_digest(b"contents"))];
        let snap = build_snapshot_with_digests("a=1", b"", &digests);
        let s = canonical_string(&snap, JoinOrder::Lexicographic).unwrap();
        assert_eq!(s, format!("a=1&file={}", file_digest(b"contents")));
    }

    #[test]
    fn file_digest_is_short_and_stable() {
        let one = file_digest(b"contents");
        let two = file_digest(b"contents");
        assert_eq!(one, two);
        assert_eq!(one.len(), 16);
    }
}
