//! HTTP surface over [`ClockService`].
//!
//! Routes:
//! - `GET /time?zone=`
//! - `GET /timezones`
//! - `GET /convert?from=&to=&time=[&ambiguous=][&nonexistent=]`
//! - `GET /health`

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{ConnectInfo, Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tzclock_core::{
    AmbiguousPolicy, ChronoTzOracle, ClockService, Config, ConversionReport, Health,
    NonexistentPolicy, Policy, SystemClock, TimeReport, TzClockError,
};

use crate::cli::ServeArgs;

type SharedService = Arc<ClockService>;

impl ServeArgs {
    pub fn to_config(&self) -> Config {
        Config {
            time_ttl: Duration::seconds(i64::from(self.time_ttl_secs)),
            zones_ttl: Duration::seconds(i64::from(self.zones_ttl_secs)),
            window: Duration::seconds(i64::from(self.window_secs)),
            max_requests: self.max_requests,
            host: self.host.clone(),
            port: self.port,
            trust_forwarded_for: self.trust_forwarded_for,
        }
    }
}

/// Build the router around `service`.
pub fn router(service: SharedService) -> Router {
    Router::new()
        .route("/time", get(time_handler))
        .route("/timezones", get(timezones_handler))
        .route("/convert", get(convert_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// Bind and serve until Ctrl-C.
pub async fn serve(args: ServeArgs) -> Result<()> {
    let config = args.to_config();
    let address = config.bind_address();

    let service = ClockService::new(Arc::new(ChronoTzOracle), Arc::new(SystemClock), config)
        .context("invalid server configuration")?;
    let settings = service.config();
    tracing::info!(
        max_requests = settings.max_requests,
        window_secs = settings.window.num_seconds(),
        trust_forwarded_for = settings.trust_forwarded_for,
        "admission control configured"
    );
    let app = router(Arc::new(service));

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    tracing::info!("listening on {address}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    kind: &'static str,
}

/// An error response: status, JSON payload and an optional `Retry-After`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    kind: &'static str,
    message: String,
    retry_after: Option<u64>,
}

impl ApiError {
    fn missing(param: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            kind: "missing_parameter",
            message: format!("Missing required parameter: {param}"),
            retry_after: None,
        }
    }
}

impl From<TzClockError> for ApiError {
    fn from(err: TzClockError) -> Self {
        let (status, retry_after) = match &err {
            TzClockError::InvalidZone(_)
            | TzClockError::InvalidInstant(_)
            | TzClockError::InvalidConfig(_) => (StatusCode::BAD_REQUEST, None),
            TzClockError::RateLimitExceeded {
                retry_after_secs, ..
            } => (StatusCode::TOO_MANY_REQUESTS, Some(*retry_after_secs)),
            TzClockError::OracleFailure(_) => (StatusCode::INTERNAL_SERVER_ERROR, None),
        };

        Self {
            status,
            kind: err.kind(),
            message: err.to_string(),
            retry_after,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
            kind: self.kind,
        });
        let mut response = (self.status, body).into_response();
        if let Some(secs) = self.retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Client identity: the peer IP, or the first `X-Forwarded-For` hop when the
/// service is configured to trust that header.
fn client_id(service: &ClockService, headers: &HeaderMap, peer: SocketAddr) -> String {
    if !service.config().trust_forwarded_for {
        return peer.ip().to_string();
    }

    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| peer.ip().to_string())
}

fn required<'a>(value: &'a Option<String>, name: &str) -> std::result::Result<&'a str, ApiError> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::missing(name))
}

#[derive(Debug, Deserialize)]
struct TimeParams {
    zone: Option<String>,
}

async fn time_handler(
    State(service): State<SharedService>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Query(params): Query<TimeParams>,
) -> ApiResult<TimeReport> {
    let zone = required(&params.zone, "zone")?;
    let report = service.time(&client_id(&service, &headers, peer), zone)?;
    Ok(Json(report))
}

async fn timezones_handler(
    State(service): State<SharedService>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> ApiResult<Vec<String>> {
    let zones = service.timezones(&client_id(&service, &headers, peer))?;
    Ok(Json(Vec::clone(&zones)))
}

#[derive(Debug, Deserialize)]
struct ConvertParams {
    from: Option<String>,
    to: Option<String>,
    time: Option<String>,
    ambiguous: Option<String>,
    nonexistent: Option<String>,
}

impl ConvertParams {
    fn policy(&self) -> std::result::Result<Policy, TzClockError> {
        let mut policy = Policy::default();
        if let Some(ambiguous) = &self.ambiguous {
            policy.ambiguous = ambiguous.parse::<AmbiguousPolicy>()?;
        }
        if let Some(nonexistent) = &self.nonexistent {
            policy.nonexistent = nonexistent.parse::<NonexistentPolicy>()?;
        }
        Ok(policy)
    }
}

async fn convert_handler(
    State(service): State<SharedService>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Query(params): Query<ConvertParams>,
) -> ApiResult<ConversionReport> {
    let from = required(&params.from, "from")?;
    let to = required(&params.to, "to")?;
    let time = required(&params.time, "time")?;
    let policy = params.policy()?;

    let report = service.convert(&client_id(&service, &headers, peer), from, to, time, policy)?;
    Ok(Json(report))
}

async fn health_handler(State(service): State<SharedService>) -> Json<Health> {
    Json(service.health())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use chrono::{TimeZone, Utc};
    use tzclock_core::ManualClock;

    fn peer() -> ConnectInfo<SocketAddr> {
        ConnectInfo(SocketAddr::from(([192, 0, 2, 10], 50_000)))
    }

    fn service(config: Config) -> (Arc<ManualClock>, SharedService) {
        let start = Utc.with_ymd_and_hms(2025, 10, 19, 17, 0, 0).single().unwrap();
        let clock = Arc::new(ManualClock::new(start));
        let service = ClockService::new(Arc::new(ChronoTzOracle), clock.clone(), config).unwrap();
        (clock, Arc::new(service))
    }

    async fn body_json(response: Response) -> (StatusCode, serde_json::Value) {
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn time_query(zone: Option<&str>) -> Query<TimeParams> {
        Query(TimeParams {
            zone: zone.map(str::to_string),
        })
    }

    fn convert_query(from: &str, to: &str, time: Option<&str>) -> Query<ConvertParams> {
        Query(ConvertParams {
            from: Some(from.to_string()),
            to: Some(to.to_string()),
            time: time.map(str::to_string),
            ambiguous: None,
            nonexistent: None,
        })
    }

    #[tokio::test]
    async fn time_for_london() {
        let (_clock, service) = service(Config::default());
        let response = time_handler(
            State(service),
            peer(),
            HeaderMap::new(),
            time_query(Some("Europe/London")),
        )
        .await
        .into_response();

        let (status, json) = body_json(response).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["is_dst"], true);
        assert_eq!(json["utc_offset"], "+01:00");
        assert_eq!(json["next_dst_change"], "2025-10-26T01:00:00Z");
    }

    #[tokio::test]
    async fn cached_time_is_byte_identical() {
        let (clock, service) = service(Config::default());

        let first = time_handler(
            State(service.clone()),
            peer(),
            HeaderMap::new(),
            time_query(Some("Europe/London")),
        )
        .await
        .into_response();
        clock.advance(Duration::seconds(3));
        let second = time_handler(
            State(service),
            peer(),
            HeaderMap::new(),
            time_query(Some("Europe/London")),
        )
        .await
        .into_response();

        let first = to_bytes(first.into_body(), usize::MAX).await.unwrap();
        let second = to_bytes(second.into_body(), usize::MAX).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn invalid_zone_is_bad_request() {
        let (_clock, service) = service(Config::default());
        let response = time_handler(
            State(service.clone()),
            peer(),
            HeaderMap::new(),
            time_query(Some("Not/AZone")),
        )
        .await
        .into_response();

        let (status, json) = body_json(response).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["kind"], "invalid_zone");
        assert!(json["error"].as_str().unwrap().contains("Not/AZone"));
        assert!(service.cache().is_empty());
    }

    #[tokio::test]
    async fn missing_zone_is_bad_request() {
        let (_clock, service) = service(Config::default());
        let response = time_handler(State(service), peer(), HeaderMap::new(), time_query(None))
            .await
            .into_response();

        let (status, json) = body_json(response).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["kind"], "missing_parameter");
    }

    #[tokio::test]
    async fn convert_utc_to_tokyo() {
        let (_clock, service) = service(Config::default());
        let response = convert_handler(
            State(service),
            peer(),
            HeaderMap::new(),
            convert_query("UTC", "Asia/Tokyo", Some("2025-10-19T14:00:00Z")),
        )
        .await
        .into_response();

        let (status, json) = body_json(response).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["converted_formatted"], "2025-10-19T23:00:00+09:00");
        assert_eq!(json["is_dst_in_target"], false);
        assert_eq!(json["target_utc_offset"], "+09:00");
    }

    #[tokio::test]
    async fn convert_rejects_missing_and_unparsable_time() {
        let (_clock, service) = service(Config::default());

        let missing = convert_handler(
            State(service.clone()),
            peer(),
            HeaderMap::new(),
            convert_query("UTC", "Asia/Tokyo", None),
        )
        .await
        .into_response();
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

        let garbage = convert_handler(
            State(service),
            peer(),
            HeaderMap::new(),
            convert_query("UTC", "Asia/Tokyo", Some("teatime")),
        )
        .await
        .into_response();
        let (status, json) = body_json(garbage).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["kind"], "invalid_instant");
    }

    #[tokio::test]
    async fn convert_rejects_years_beyond_the_calendar() {
        let (_clock, service) = service(Config::default());
        for time in ["+262142-12-31T12:00", "-262143-01-01T12:00"] {
            let response = convert_handler(
                State(service.clone()),
                peer(),
                HeaderMap::new(),
                convert_query("UTC", "Asia/Tokyo", Some(time)),
            )
            .await
            .into_response();

            let (status, json) = body_json(response).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(json["kind"], "invalid_instant");
        }
    }

    #[tokio::test]
    async fn convert_rejects_unknown_policy() {
        let (_clock, service) = service(Config::default());
        let mut query = convert_query("Europe/London", "UTC", Some("2025-10-26T01:30:00"));
        query.0.ambiguous = Some("latest".to_string());

        let response = convert_handler(State(service), peer(), HeaderMap::new(), query)
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn rate_limited_client_gets_429_with_retry_after() {
        let (_clock, service) = service(Config {
            max_requests: 2,
            ..Config::default()
        });

        for _ in 0..2 {
            let ok = timezones_handler(State(service.clone()), peer(), HeaderMap::new())
                .await
                .into_response();
            assert_eq!(ok.status(), StatusCode::OK);
        }

        let limited = timezones_handler(State(service.clone()), peer(), HeaderMap::new())
            .await
            .into_response();
        assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(limited.headers()[header::RETRY_AFTER], "60");
        let (_, json) = body_json(limited).await;
        assert_eq!(json["kind"], "rate_limit_exceeded");

        let mut forwarded = HeaderMap::new();
        forwarded.insert("x-forwarded-for", HeaderValue::from_static("198.51.100.4, 10.0.0.1"));
        let spoofed = timezones_handler(State(service), peer(), forwarded)
            .await
            .into_response();
        assert_eq!(spoofed.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn trusted_forwarded_for_separates_clients_behind_a_proxy() {
        let (_clock, service) = service(Config {
            max_requests: 1,
            trust_forwarded_for: true,
            ..Config::default()
        });

        for hop in ["198.51.100.4", "198.51.100.5"] {
            let mut headers = HeaderMap::new();
            headers.insert("x-forwarded-for", HeaderValue::from_str(hop).unwrap());
            let response = timezones_handler(State(service.clone()), peer(), headers)
                .await
                .into_response();
            assert_eq!(response.status(), StatusCode::OK);
        }
        assert_eq!(service.admission().tracked_clients(), 2);
    }

    #[tokio::test]
    async fn health_is_not_rate_limited() {
        let (_clock, service) = service(Config {
            max_requests: 1,
            ..Config::default()
        });

        for _ in 0..3 {
            let Json(health) = health_handler(State(service.clone())).await;
            assert_eq!(health.status, "ok");
        }
    }

    #[test]
    fn client_identity_defaults_to_peer() {
        let (_clock, service) = service(Config::default());
        let addr = SocketAddr::from(([192, 0, 2, 10], 50_000));

        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.9"));
        assert_eq!(client_id(&service, &headers, addr), "192.0.2.10");
    }

    #[test]
    fn client_identity_behind_trusted_proxy() {
        let (_clock, service) = service(Config {
            trust_forwarded_for: true,
            ..Config::default()
        });
        let addr = SocketAddr::from(([192, 0, 2, 10], 50_000));
        assert_eq!(client_id(&service, &HeaderMap::new(), addr), "192.0.2.10");

        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(" 203.0.113.9 , 10.0.0.1"));
        assert_eq!(client_id(&service, &headers, addr), "203.0.113.9");

        headers.insert("x-forwarded-for", HeaderValue::from_static(""));
        assert_eq!(client_id(&service, &headers, addr), "192.0.2.10");
    }

    #[test]
    fn serve_args_to_config() {
        let args = ServeArgs {
            host: "127.0.0.1".to_string(),
            port: 8080,
            time_ttl_secs: 5,
            zones_ttl_secs: 120,
            window_secs: 30,
            max_requests: 10,
            trust_forwarded_for: true,
        };
        let config = args.to_config();

        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.time_ttl, Duration::seconds(5));
        assert_eq!(config.max_requests, 10);
        assert!(config.trust_forwarded_for);
    }

    #[test]
    fn router_builds() {
        let (_clock, service) = service(Config::default());
        let _router = router(service);
    }
}
