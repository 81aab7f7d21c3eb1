//! HTTP client for the portal's glucose history API.

use tracing::debug;
use url::Url;

use crate::portal::session::Session;
use crate::portal::traits::SeriesFetcher;
use crate::sync::types::{Band, FetchWindow, RawBands, RawPoint, SyncError};

/// Application-level success code in portal response bodies.
const PORTAL_OK: i64 = 200;

/// Fetches banded glucose history over HTTPS.
pub struct PortalClient {
    http: reqwest::Client,
    base: Url,
}

impl PortalClient {
    /// Build a client against the portal base URL.
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, SyncError> {
        let base = Url::parse(base_url)
            .map_err(|e| SyncError::Portal(format!("invalid portal base URL: {e}")))?;
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self { http, base })
    }

    fn history_url(&self, session: &Session, window: &FetchWindow) -> Result<Url, SyncError> {
        let mut url = self
            .base
            .join("glucose/history")
            .map_err(|e| SyncError::Portal(format!("invalid portal URL: {e}")))?;
        url.set_query(Some(&format!(
            "userId={}&begin={}&end={}",
            urlencoding::encode(&session.identity),
            window.start.timestamp(),
            window.end.timestamp(),
        )));
        Ok(url)
    }
}

impl SeriesFetcher for PortalClient {
    fn fetch(&self, session: &Session, window: &FetchWindow) -> Result<RawBands, SyncError> {
        let url = self.history_url(session, window)?;
        debug!(%url, mode = ?window.mode, "fetching glucose history");

        let (status, text) = tokio::runtime::Handle::current().block_on(async {
            let resp = self
                .http
                .get(url)
                .header("Authorization", &session.credential_header)
                .send()
                .await?;
            let status = resp.status();
            let text = resp.text().await?;
            Ok::<_, reqwest::Error>((status, text))
        })?;

        // Auth failures often carry empty or non-JSON bodies, so map the
        // status before touching the payload.
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(SyncError::AuthExpired);
        }
        if !status.is_success() {
            return Err(SyncError::Portal(format!(
                "portal returned HTTP {}: {}",
                status.as_u16(),
                text.chars().take(200).collect::<String>().trim(),
            )));
        }

        let body: serde_json::Value = serde_json::from_str(&text)?;
        parse_history_payload(&body)
    }
}

/// Parse the portal's history response body into bands.
///
/// The portal wraps everything in `{code, msg, data}` and reports auth
/// failures with an in-body 401 even on HTTP 200.
pub fn parse_history_payload(body: &serde_json::Value) -> Result<RawBands, SyncError> {
    let code = body["code"].as_i64().unwrap_or(PORTAL_OK);
    if code == 401 || code == 403 {
        return Err(SyncError::AuthExpired);
    }
    if code != PORTAL_OK {
        let msg = body["msg"].as_str().unwrap_or("unknown portal error");
        return Err(SyncError::Portal(format!("portal code {code}: {msg}")));
    }

    let data = &body["data"];
    Ok(RawBands {
        low: parse_band_list(&data["lowList"], Band::Low)?,
        normal: parse_band_list(&data["normalList"], Band::Normal)?,
        high: parse_band_list(&data["highList"], Band::High)?,
    })
}

fn parse_band_list(list: &serde_json::Value, band: Band) -> Result<Vec<RawPoint>, SyncError> {
    if list.is_null() {
        return Ok(Vec::new());
    }
    let mut points: Vec<RawPoint> = serde_json::from_value(list.clone())?;
    for point in &mut points {
        point.band = band;
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::types::FetchMode;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn session() -> Session {
        Session {
            identity: "user@example.com".into(),
            credential_header: "Bearer tok".into(),
            expires_at: None,
        }
    }

    fn window() -> FetchWindow {
        FetchWindow {
            start: Utc.with_ymd_and_hms(2024, 8, 30, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 8, 30, 12, 0, 0).unwrap(),
            mode: FetchMode::Full,
        }
    }

    #[test]
    fn history_url_encodes_identity_and_window() {
        let client = PortalClient::new("https://portal.example.com/api/v1/", 10).unwrap();
        let url = client.history_url(&session(), &window()).unwrap();
        let s = url.as_str();
        assert!(s.starts_with("https://portal.example.com/api/v1/glucose/history?"));
        assert!(s.contains("userId=user%40example.com"));
        assert!(s.contains("begin=1724976000"));
        assert!(s.contains("end=1725019200"));
    }

    #[test]
    fn parses_all_three_bands() {
        let body = json!({
            "code": 200,
            "msg": "ok",
            "data": {
                "lowList": [{"timestamp": 100, "glucoseValue": 3.2}],
                "normalList": [
                    {"timestamp": 200, "glucoseValue": 5.6, "trend": "STABLE"},
                    {"timestamp": 300, "glucoseValue": 6.1, "trend": 5}
                ],
                "highList": [{"timestamp": 400, "glucoseValue": 12.8, "isCalculated": true}]
            }
        });
        let bands = parse_history_payload(&body).unwrap();
        assert_eq!(bands.low.len(), 1);
        assert_eq!(bands.normal.len(), 2);
        assert_eq!(bands.high.len(), 1);
        assert_eq!(bands.low[0].band, Band::Low);
        assert_eq!(bands.high[0].band, Band::High);
        assert!(bands.high[0].calculated);
    }

    #[test]
    fn missing_band_lists_parse_as_empty() {
        let body = json!({"code": 200, "msg": "ok", "data": {"normalList": []}});
        let bands = parse_history_payload(&body).unwrap();
        assert!(bands.is_empty());
    }

    #[test]
    fn in_body_auth_code_maps_to_auth_expired() {
        let body = json!({"code": 401, "msg": "token invalid"});
        assert!(matches!(
            parse_history_payload(&body),
            Err(SyncError::AuthExpired)
        ));
    }

    #[test]
    fn in_body_error_code_maps_to_portal_error() {
        let body = json!({"code": 500, "msg": "server busy"});
        match parse_history_payload(&body) {
            Err(SyncError::Portal(msg)) => assert!(msg.contains("server busy")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn fetch_against_mock_portal() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", mockito::Matcher::Regex(r"^/glucose/history\?.*".into()))
            .match_header("Authorization", "Bearer tok")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"code": 200, "msg": "ok", "data": {
                    "lowList": [],
                    "normalList": [{"timestamp": 1724990400, "glucoseValue": 5.8}],
                    "highList": []
                }}"#,
            )
            .create();

        let rt = tokio::runtime::Runtime::new().unwrap();
        let _guard = rt.enter();

        let client = PortalClient::new(&format!("{}/", server.url()), 10).unwrap();
        let bands = client.fetch(&session(), &window()).unwrap();
        mock.assert();
        assert_eq!(bands.normal.len(), 1);
        assert_eq!(bands.normal[0].value_native, 5.8);
    }

    #[test]
    fn http_401_maps_to_auth_expired() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", mockito::Matcher::Regex(r"^/glucose/history\?.*".into()))
            .with_status(401)
            .with_header("content-type", "application/json")
            .with_body(r#"{"msg": "unauthorized"}"#)
            .create();

        let rt = tokio::runtime::Runtime::new().unwrap();
        let _guard = rt.enter();

        let client = PortalClient::new(&format!("{}/", server.url()), 10).unwrap();
        assert!(matches!(
            client.fetch(&session(), &window()),
            Err(SyncError::AuthExpired)
        ));
    }

    #[test]
    fn http_401_with_plain_text_body_maps_to_auth_expired() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", mockito::Matcher::Regex(r"^/glucose/history\?.*".into()))
            .with_status(401)
            .with_header("content-type", "text/plain")
            .with_body("Unauthorized")
            .create();

        let rt = tokio::runtime::Runtime::new().unwrap();
        let _guard = rt.enter();

        let client = PortalClient::new(&format!("{}/", server.url()), 10).unwrap();
        assert!(matches!(
            client.fetch(&session(), &window()),
            Err(SyncError::AuthExpired)
        ));
    }

    #[test]
    fn http_500_with_plain_text_body_maps_to_portal_error() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", mockito::Matcher::Regex(r"^/glucose/history\?.*".into()))
            .with_status(500)
            .with_header("content-type", "text/plain")
            .with_body("gateway timeout")
            .create();

        let rt = tokio::runtime::Runtime::new().unwrap();
        let _guard = rt.enter();

        let client = PortalClient::new(&format!("{}/", server.url()), 10).unwrap();
        match client.fetch(&session(), &window()) {
            Err(SyncError::Portal(msg)) => assert!(msg.contains("gateway timeout")),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
