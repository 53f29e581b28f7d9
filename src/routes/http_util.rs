//! Shared HTTP helpers for route handlers
//!
//! Every JSON reply uses the `{ "success": bool, ... }` envelope.

use bytes::Bytes;
use http_body_util::{combinators::BoxBody as HttpBoxBody, BodyExt, Empty, Full, Limited};
use hyper::body::Body;
use hyper::header::{self, HeaderMap, HeaderValue};
use hyper::{Request, Response, StatusCode, Uri};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::auth::{extract_token_from_header, AuthUser, JwtValidator};
use crate::types::{LingoError, Result};

pub type BoxBody = HttpBoxBody<Bytes, hyper::Error>;

/// JSON request bodies larger than this are refused
pub const MAX_JSON_BODY: usize = 64 * 1024;

const ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type, Authorization, X-File-Name";

pub fn full_body(data: impl Into<Bytes>) -> BoxBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

pub fn empty_body() -> BoxBody {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed()
}

pub fn bytes_response(status: StatusCode, content_type: &'static str, data: Bytes) -> Response<BoxBody> {
    let mut response = Response::new(full_body(data));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<BoxBody> {
    let json = serde_json::to_vec(body).unwrap_or_else(|_| b"{}".to_vec());
    bytes_response(status, "application/json", Bytes::from(json))
}

/// Success envelope: the fields of `body` next to `"success": true`
pub fn success(status: StatusCode, body: Value) -> Response<BoxBody> {
    let body = match body {
        Value::Object(mut fields) => {
            fields.insert("success".into(), Value::Bool(true));
            Value::Object(fields)
        }
        other => serde_json::json!({ "success": true, "data": other }),
    };
    json_response(status, &body)
}

pub fn error_response(err: &LingoError) -> Response<BoxBody> {
    let status = err.status_code();
    if status.is_server_error() {
        error!(status = status.as_u16(), error = %err, "Request failed");
    } else {
        debug!(status = status.as_u16(), error = %err, "Request rejected");
    }

    json_response(
        status,
        &serde_json::json!({ "success": false, "error": err.to_string() }),
    )
}

pub fn not_found_response() -> Response<BoxBody> {
    error_response(&LingoError::not_found("Route not found"))
}

/// Collect a body, refusing anything over `limit` bytes
pub async fn read_body_limited<B>(body: B, limit: usize) -> Result<Bytes>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<http_body_util::LengthLimitError>().is_some() => {
            warn!(limit, "Request body over limit");
            Err(LingoError::PayloadTooLarge("Request body too large".into()))
        }
        Err(e) => Err(LingoError::bad_request(format!("Failed to read body: {e}"))),
    }
}

/// Parse a JSON body; an empty body reads as `{}`
pub async fn parse_json_body<T, B>(body: B) -> Result<T>
where
    T: DeserializeOwned,
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let bytes = read_body_limited(body, MAX_JSON_BODY).await?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::from_slice(b"{}")?);
    }
    Ok(serde_json::from_slice(&bytes)?)
}

/// Deserialize the query string; a missing one uses `T::default()`
pub fn parse_query<T: DeserializeOwned + Default>(uri: &Uri) -> Result<T> {
    match uri.query() {
        None | Some("") => Ok(T::default()),
        Some(query) => serde_urlencoded::from_str(query)
            .map_err(|e| LingoError::bad_request(format!("Invalid query string: {e}"))),
    }
}

/// Integer path parameter
pub fn path_id(segment: &str, message: &str) -> Result<i64> {
    segment
        .trim()
        .parse()
        .map_err(|_| LingoError::bad_request(message))
}

/// Percent-decode path segments and join them with `/`
pub fn decode_path(segments: &[&str]) -> Result<String> {
    let decoded = segments
        .iter()
        .map(|s| {
            urlencoding::decode(s)
                .map(|d| d.into_owned())
                .map_err(|_| LingoError::bad_request("Invalid path encoding"))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(decoded.join("/"))
}

pub fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Resolve the bearer token into the calling learner
pub fn authenticate<B>(req: &Request<B>, jwt: &JwtValidator) -> Result<AuthUser> {
    let auth_header = header_str(req.headers(), header::AUTHORIZATION.as_str());
    let token = extract_token_from_header(auth_header)
        .ok_or_else(|| LingoError::Unauthorized("Access token required".into()))?;

    jwt.verify_token(token).map(AuthUser::from).map_err(|reason| {
        debug!(?reason, "Token rejected");
        LingoError::Forbidden("Invalid token".into())
    })
}

/// CORS policy built from the configured origin allowlist
#[derive(Debug, Clone, Default)]
pub struct Cors {
    origins: Vec<String>,
}

impl Cors {
    /// An empty allowlist allows any origin
    pub fn new(origins: Vec<String>) -> Self {
        Self { origins }
    }

    fn allow_origin(&self, origin: Option<&str>) -> Option<HeaderValue> {
        if self.origins.is_empty() || self.origins.iter().any(|o| o == "*") {
            return Some(HeaderValue::from_static("*"));
        }
        let origin = origin?;
        if self.origins.iter().any(|o| o == origin) {
            HeaderValue::from_str(origin).ok()
        } else {
            None
        }
    }

    /// Add CORS headers for a request from `origin`
    pub fn apply(&self, origin: Option<&str>, response: &mut Response<BoxBody>) {
        let Some(allowed) = self.allow_origin(origin) else {
            return;
        };
        let headers = response.headers_mut();
        if allowed != "*" {
            headers.insert(header::VARY, HeaderValue::from_static("Origin"));
        }
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, allowed);
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOW_METHODS),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        );
    }

    pub fn preflight(&self, origin: Option<&str>) -> Response<BoxBody> {
        let mut response = Response::new(empty_body());
        *response.status_mut() = StatusCode::NO_CONTENT;
        self.apply(origin, &mut response);
        response
            .headers_mut()
            .insert(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static("86400"));
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    async fn body_json(response: Response<BoxBody>) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_success_envelope() {
        let response = success(StatusCode::CREATED, serde_json::json!({ "todo": { "id": 1 } }));
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["todo"]["id"], 1);
    }

    #[tokio::test]
    async fn test_error_envelope() {
        let response = not_found_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(
            body,
            serde_json::json!({ "success": false, "error": "Route not found" })
        );
    }

    #[derive(Debug, Default, Deserialize)]
    struct Probe {
        nim: Option<String>,
    }

    #[tokio::test]
    async fn test_empty_body_reads_as_empty_object() {
        let probe: Probe = parse_json_body(Full::new(Bytes::new())).await.unwrap();
        assert!(probe.nim.is_none());

        let probe: Probe = parse_json_body(Full::new(Bytes::from(r#"{"nim":"2301"}"#)))
            .await
            .unwrap();
        assert_eq!(probe.nim.as_deref(), Some("2301"));
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let big = Bytes::from(vec![b' '; MAX_JSON_BODY + 1]);
        let err = parse_json_body::<Probe, _>(Full::new(big)).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let err = parse_json_body::<Probe, _>(Full::new(Bytes::from("{nim")))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_parse_query() {
        #[derive(Debug, Default, Deserialize)]
        struct Filter {
            chapter: Option<String>,
            search: Option<String>,
        }

        let uri: Uri = "/api/dashboard/materials?chapter=Chapter%201&search=past+tense"
            .parse()
            .unwrap();
        let filter: Filter = parse_query(&uri).unwrap();
        assert_eq!(filter.chapter.as_deref(), Some("Chapter 1"));
        assert_eq!(filter.search.as_deref(), Some("past tense"));

        let uri: Uri = "/api/dashboard/materials".parse().unwrap();
        assert!(parse_query::<Filter>(&uri).unwrap().chapter.is_none());
    }

    #[test]
    fn test_decode_path() {
        assert_eq!(decode_path(&["7", "1700_a%20b.pdf"]).unwrap(), "7/1700_a b.pdf");
        assert!(path_id("abc", "Invalid id").is_err());
        assert_eq!(path_id("42", "Invalid id").unwrap(), 42);
    }

    #[test]
    fn test_authenticate() {
        let jwt = JwtValidator::new_dev();

        let req = Request::builder().body(()).unwrap();
        assert_eq!(
            authenticate(&req, &jwt).unwrap_err().status_code(),
            StatusCode::UNAUTHORIZED
        );

        let req = Request::builder()
            .header("Authorization", "Bearer not-a-jwt")
            .body(())
            .unwrap();
        let err = authenticate(&req, &jwt).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(err.to_string(), "Invalid token");

        let token = jwt.generate_token(3, "2301003").unwrap();
        let req = Request::builder()
            .header("Authorization", format!("Bearer {token}"))
            .body(())
            .unwrap();
        assert_eq!(authenticate(&req, &jwt).unwrap().id, 3);
    }

    #[test]
    fn test_cors_allowlist() {
        let open = Cors::default();
        let mut response = Response::new(empty_body());
        open.apply(Some("https://anywhere.test"), &mut response);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");

        let strict = Cors::new(vec!["https://lingobee.app".into()]);
        let mut response = Response::new(empty_body());
        strict.apply(Some("https://lingobee.app"), &mut response);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://lingobee.app"
        );

        let mut response = Response::new(empty_body());
        strict.apply(Some("https://evil.test"), &mut response);
        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());

        let preflight = strict.preflight(Some("https://lingobee.app"));
        assert_eq!(preflight.status(), StatusCode::NO_CONTENT);
        assert_eq!(preflight.headers()[header::ACCESS_CONTROL_MAX_AGE], "86400");
    }
}
