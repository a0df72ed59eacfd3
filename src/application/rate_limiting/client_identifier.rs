use axum::http::HeaderMap;
use std::net::IpAddr;

pub const FORWARDED_FOR: &str = "x-forwarded-for";
pub const REAL_IP: &str = "x-real-ip";

/// Rate-limit identity of a request, derived from proxy headers.
///
/// Uses the first entry of `X-Forwarded-For`, then `X-Real-IP`, then
/// `unknown`, prefixed with `ip_`. Values that are not IP addresses are
/// skipped so a client cannot mint arbitrary identities.
pub fn get_client_identifier(headers: &HeaderMap) -> String {
    let forwarded = headers
        .get(FORWARDED_FOR)
        .and_then(|h| h.to_str().ok())
        .and_then(|list| list.split(',').next())
        .and_then(parse_ip);

    let ip = forwarded.or_else(|| {
        headers
            .get(REAL_IP)
            .and_then(|h| h.to_str().ok())
            .and_then(parse_ip)
    });

    match ip {
        Some(ip) => format!("ip_{}", ip),
        None => "ip_unknown".to_string(),
    }
}

fn parse_ip(value: &str) -> Option<IpAddr> {
    value.trim().parse().ok()
}
