use axum::{
    extract::Request,
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use loco_rs::prelude::*;

/// Guards the admin console surface (`/admin/*`) behind a single static
/// operator bearer token. There is no multi-user session model here: the
/// admin console is used by a small ops team, not end customers, so a
/// shared credential rotated out-of-band is the right amount of ceremony.
pub async fn admin_auth_middleware(request: Request, next: Next) -> Result<Response> {
    let expected = std::env::var("ADMIN_BEARER_TOKEN")
        .map_err(|_| Error::string("ADMIN_BEARER_TOKEN is not configured"))?;

    let token = extract_bearer_token(request.headers())
        .ok_or_else(|| Error::Unauthorized("missing bearer token".to_string()))?;

    if !constant_time_eq(token.as_bytes(), expected.as_bytes()) {
        return Err(Error::Unauthorized("invalid bearer token".to_string()));
    }

    Ok(next.run(request).await)
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_header = headers.get(header::AUTHORIZATION)?;
    let auth_str = auth_header.to_str().ok()?;
    auth_str.strip_prefix("Bearer ").map(str::to_string)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Security headers middleware, kept from the original backend unchanged:
/// these apply regardless of domain.
pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;

    let headers = response.headers_mut();

    headers.insert("X-Content-Type-Options", "nosniff".parse().unwrap());
    headers.insert("X-Frame-Options", "DENY".parse().unwrap());
    headers.insert("X-XSS-Protection", "1; mode=block".parse().unwrap());
    headers.insert("Referrer-Policy", "strict-origin-when-cross-origin".parse().unwrap());
    headers.insert(
        "Content-Security-Policy",
        "default-src 'self'; script-src 'self' 'unsafe-inline'; style-src 'self' 'unsafe-inline'".parse().unwrap(),
    );
    headers.insert("Strict-Transport-Security", "max-age=31536000; includeSubDomains".parse().unwrap());

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_time_eq_matches_equal_tokens() {
        assert!(constant_time_eq(b"secret-token", b"secret-token"));
    }

    #[test]
    fn constant_time_eq_rejects_different_lengths() {
        assert!(!constant_time_eq(b"short", b"much-longer-token"));
    }

    #[test]
    fn constant_time_eq_rejects_single_byte_difference() {
        assert!(!constant_time_eq(b"secret-token", b"secret-tokeN"));
    }
}
