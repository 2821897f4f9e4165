use anyhow::{Result, anyhow};
use axum::http::HeaderMap;
use chrono::{DateTime, Utc};

use crate::config::PanelConfig;

pub fn format_bytes_str(bytes: i64) -> String {
    let bytes = bytes.max(0) as u64;
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

pub fn mb_to_bytes(mb: i64) -> Result<i64> {
    mb.checked_mul(1024 * 1024)
        .ok_or_else(|| anyhow!("{} MB does not fit in a byte count", mb))
}

/// `scheme://host` used for download links. `public_url` wins over request headers.
pub fn asset_base(headers: &HeaderMap, config: &PanelConfig) -> String {
    if let Some(url) = &config.public_url {
        return url.trim_end_matches('/').to_string();
    }

    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");
    let host = headers
        .get("host")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");

    format!("{}://{}", scheme, host)
}

pub fn format_timestamp(ts: i64) -> String {
    match DateTime::<Utc>::from_timestamp(ts, 0) {
        Some(dt) if ts > 0 => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        _ => "-".to_string(),
    }
}

pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bytes_are_humanized() {
        assert_eq!(format_bytes_str(512), "512 B");
        assert_eq!(format_bytes_str(1536), "1.5 KB");
        assert_eq!(format_bytes_str(mb_to_bytes(50).unwrap()), "50.0 MB");
        assert_eq!(format_bytes_str(mb_to_bytes(2048).unwrap()), "2.00 GB");
        assert_eq!(format_bytes_str(-5), "0 B");
    }

    #[test]
    fn oversized_megabytes_are_an_error() {
        assert_eq!(mb_to_bytes(1).unwrap(), 1_048_576);
        assert!(mb_to_bytes(i64::MAX).is_err());
        assert!(mb_to_bytes(i64::MAX / (1024 * 1024) + 1).is_err());
    }

    #[test]
    fn asset_base_prefers_configured_url() {
        let mut config = PanelConfig::for_tests(1, 1);
        config.public_url = Some("https://panel.example.com/".to_string());
        let mut headers = HeaderMap::new();
        headers.insert("host", HeaderValue::from_static("internal:8080"));
        assert_eq!(asset_base(&headers, &config), "https://panel.example.com");
    }

    #[test]
    fn asset_base_falls_back_to_headers() {
        let config = PanelConfig::for_tests(1, 1);
        let mut headers = HeaderMap::new();
        assert_eq!(asset_base(&headers, &config), "http://localhost");

        headers.insert("host", HeaderValue::from_static("panel.example.com"));
        headers.insert("x-forwarded-proto", HeaderValue::from_static("https"));
        assert_eq!(asset_base(&headers, &config), "https://panel.example.com");
    }

    #[test]
    fn never_checked_in_renders_dash() {
        assert_eq!(format_timestamp(0), "-");
        assert_eq!(format_timestamp(86_400), "1970-01-02 00:00:00");
    }
}
