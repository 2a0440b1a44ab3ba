//! HTTP utility functions for extracting request information.

use actix_web::HttpRequest;

/// Proxy headers consulted for the real client IP, in order of
/// preference.
const IP_HEADERS: [&str; 7] = [
    "X-Forwarded-For",
    "X-Real-IP",
    "CF-Connecting-IP",
    "X-Cluster-Client-IP",
    "X-Forwarded",
    "Forwarded-For",
    "Forwarded",
];

/// Extract the client IP, preferring proxy headers over the peer
/// address. X-Forwarded-For may hold a chain; the first hop wins.
pub fn extract_client_ip(req: &HttpRequest) -> String {
    for name in IP_HEADERS {
        let candidate = req
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty());
        if let Some(ip) = candidate {
            return ip.to_string();
        }
    }
    req.connection_info()
        .peer_addr()
        .unwrap_or("unknown")
        .to_string()
}

/// User-Agent header, if present.
pub fn extract_user_agent(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get("User-Agent")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string())
}

/// Route pattern for the matched resource, falling back to the raw path
/// for unmatched requests.
pub fn extract_route_pattern(req: &HttpRequest) -> String {
    req.match_pattern().unwrap_or_else(|| req.path().to_string())
}
