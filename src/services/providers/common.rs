use std::time::Duration;

/// Shared output-shape helpers used by every provider adapter (§4.4).
///
/// Builds the `reqwest::Client` every adapter issues its auth/purchase/health
/// calls through, bounded by that provider's `<SLUG>_TIMEOUT_MS` env var
/// (default 10s) so every outbound HTTP call carries a per-provider timeout
/// (§5). Falls back to an untimed client only if the builder itself fails,
/// which `reqwest` documents as unreachable for a timeout-only builder.
pub fn build_http_client(slug: &str) -> reqwest::Client {
    let timeout_ms: u64 = std::env::var(format!("{}_TIMEOUT_MS", slug.to_uppercase()))
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(10_000);

    reqwest::Client::builder()
        .timeout(Duration::from_millis(timeout_ms))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Splits an `LPA:1$<smdp>$<matching_id>` string into its two address parts.
pub fn split_lpa(lpa: &str) -> Option<(String, String)> {
    let mut parts = lpa.trim().splitn(3, '$');
    let scheme = parts.next()?;
    if !scheme.eq_ignore_ascii_case("lpa:1") {
        return None;
    }
    let smdp = parts.next()?.to_string();
    let matching_id = parts.next()?.to_string();
    Some((smdp, matching_id))
}

/// Synthesizes the LPA activation code when a supplier returns only the raw
/// address parts instead of the full string.
pub fn synthesize_activation_code(smdp: &str, matching_id: &str) -> String {
    format!("LPA:1${smdp}${matching_id}")
}

/// Deterministic image-encoding URL used when a supplier returns LPA data
/// but no ready-made QR image.
pub fn synthesize_qr_url(activation_code: &str) -> String {
    let encoded = urlencoding::encode(activation_code);
    format!("https://api.qrserver.com/v1/create-qr-code/?size=300x300&data={encoded}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_lpa_string() {
        let (smdp, matching_id) = split_lpa("LPA:1$a.com$AC").unwrap();
        assert_eq!(smdp, "a.com");
        assert_eq!(matching_id, "AC");
    }

    #[test]
    fn rejects_non_lpa_string() {
        assert!(split_lpa("not-an-lpa-string").is_none());
    }

    #[test]
    fn synthesize_round_trips_through_split() {
        let code = synthesize_activation_code("rsp.example.com", "MATCH123");
        let (smdp, matching_id) = split_lpa(&code).unwrap();
        assert_eq!(smdp, "rsp.example.com");
        assert_eq!(matching_id, "MATCH123");
    }

    #[test]
    fn qr_url_percent_encodes_dollar_signs() {
        let url = synthesize_qr_url("LPA:1$a.com$AC");
        assert!(url.contains("LPA%3A1%24a.com%24AC"));
    }
}
