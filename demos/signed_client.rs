//! Signed Request Demo
//!
//! Shows how a client builds the canonical parameter string, computes
//! the request signature, and which headers to send. Run with:
//!
//! ```
//! cargo run --example signed_client
//! ```

use chrono::Utc;
use gatekeep::{build_snapshot, canonical_string, sign, JoinOrder};
use uuid::Uuid;

fn main() {
    let secret = "my-secret-key";
    let query = "a=1";
    let payload = r#"{"amount":"10","note":"demo"}"#;
    let nonce = Uuid::new_v4().to_string();
    let timestamp = Utc::now().timestamp_millis();

    println!("Signed Request Demo");
    println!("===================\n");
    println!("Secret:    {secret}");
    println!("Query:     {query}");
    println!("Payload:   {payload}");
    println!("Nonce:     {nonce}");
    println!("Timestamp: {timestamp}\n");

    let snapshot = build_snapshot(query, payload.as_bytes());
    let canonical = canonical_string(&snapshot, JoinOrder::Lexicographic)
        .expect("duplicate parameter key");
    println!("Canonical string: {canonical}");

    let signature = sign(&snapshot, &nonce, timestamp, secret).expect("signing failed");
    println!("Signature:        {signature}\n");

    println!("Request:");
    println!("  curl -X POST 'http://127.0.0.1:8080/api/orders?{query}' \\");
    println!("    -H 'Content-Type: application/json' \\");
    println!("    -H 'timestamp: {timestamp}' \\");
    println!("    -H 'nonce: {nonce}' \\");
    println!("    -H 'sign: {signature}' \\");
    println!("    -d '{payload}'");
}
