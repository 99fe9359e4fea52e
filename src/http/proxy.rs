//! Request forwarding to a chosen backend.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → rewrite URI onto the backend base URL
//!     → strip hop-by-hop headers, append X-Forwarded-For
//!     → hyper client (HTTP/1.1)
//!     → strip hop-by-hop headers from the response
//!     → stream response back unchanged
//! ```

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{uri::InvalidUri, HeaderMap, HeaderName, HeaderValue, Request, Uri, Version},
    response::Response,
};
use hyper::body::Incoming;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use url::Url;

use crate::config::TimeoutConfig;
use crate::http::response::strip_hop_by_hop;

pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Error type for forwarding.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("invalid upstream uri: {0}")]
    Uri(#[from] InvalidUri),
    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),
}

/// Forwards requests to a single target per call.
#[derive(Clone)]
pub struct ReverseProxy {
    client: Client<HttpConnector, Body>,
}

impl ReverseProxy {
    pub fn new(timeouts: &TimeoutConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));

        let client = Client::builder(TokioExecutor::new()).build(connector);
        Self { client }
    }

    /// Send `request` to `target` and hand back its response.
    pub async fn forward(&self, request: Request<Body>, target: &Url) -> Result<Response, ProxyError> {
        let client_ip = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        let (mut parts, body) = request.into_parts();
        parts.uri = upstream_uri(target, &parts.uri)?;
        parts.version = Version::HTTP_11;
        strip_hop_by_hop(&mut parts.headers);
        if let Some(ip) = client_ip {
            append_forwarded_for(&mut parts.headers, ip);
        }

        let response = self.client.request(Request::from_parts(parts, body)).await?;
        Ok(into_response(response))
    }
}

fn into_response(response: Response<Incoming>) -> Response {
    let (mut parts, body) = response.into_parts();
    strip_hop_by_hop(&mut parts.headers);
    Response::from_parts(parts, Body::new(body))
}

/// Rebase `inbound` onto the backend's scheme, authority and base path.
pub fn upstream_uri(target: &Url, inbound: &Uri) -> Result<Uri, InvalidUri> {
    let host = target.host_str().unwrap_or_default();
    let authority = match target.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };

    let path = join_paths(target.path(), inbound.path());
    let query = match (
        target.query().filter(|q| !q.is_empty()),
        inbound.query().filter(|q| !q.is_empty()),
    ) {
        (Some(base), Some(extra)) => format!("?{}&{}", base, extra),
        (Some(q), None) | (None, Some(q)) => format!("?{}", q),
        (None, None) => String::new(),
    };

    format!("{}://{}{}{}", target.scheme(), authority, path, query).parse()
}

/// Join two paths with exactly one slash between them.
fn join_paths(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", base, &path[1..]),
        (false, false) => format!("{}/{}", base, path),
        _ => format!("{}{}", base, path),
    }
}

fn append_forwarded_for(headers: &mut HeaderMap, ip: IpAddr) {
    let value = match headers.get(&X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
        Some(prior) => format!("{}, {}", prior, ip),
        None => ip.to_string(),
    };
    if let Ok(value) = HeaderValue::from_str(&value) {
        headers.insert(X_FORWARDED_FOR, value);
    }
}
