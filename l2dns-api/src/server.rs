//! API Server

use std::convert::Infallible;
use std::net::SocketAddr;

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http_body_util::{BodyExt, Full};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde_json::Value;
use tokio::net::TcpListener;

use l2dns_core::{DnsManager, Error};

use crate::handlers::{self, ApiError};

/// Bind `addr` and serve the API until the process exits
pub async fn run_api_server(addr: SocketAddr, manager: DnsManager) -> l2dns_core::Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Config(format!("Failed to bind API on {}: {}", addr, e)))?;

    tracing::info!("🌐 l2dns API listening on http://{}", addr);
    serve(listener, manager).await
}

/// Serve the API on an already bound listener
pub async fn serve(listener: TcpListener, manager: DnsManager) -> l2dns_core::Result<()> {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!("API accept error: {}", e);
                continue;
            }
        };

        let io = TokioIo::new(stream);
        let manager = manager.clone();

        tokio::task::spawn(async move {
            if let Err(err) = http1::Builder::new()
                .serve_connection(io, service_fn(move |req| handle_request(req, manager.clone())))
                .await
            {
                tracing::error!("Error serving connection from {}: {:?}", peer, err);
            }
        });
    }
}

async fn handle_request(
    req: Request<hyper::body::Incoming>,
    manager: DnsManager,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let body = match req.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            let err = ApiError::bad_request(format!("failed to read request body: {}", e));
            return Ok(json_response(err.status, &err.body()));
        }
    };

    Ok(route(&manager, &method, &path, &body).await)
}

/// Dispatch one request to its handler and render the JSON response
pub async fn route(manager: &DnsManager, method: &Method, path: &str, body: &[u8]) -> Response<Full<Bytes>> {
    tracing::debug!("{} {}", method, path);

    let result = match (method, path) {
        (&Method::GET, "/health") => Ok(handlers::health_check()),
        (&Method::GET, "/entries") => handlers::list_entries(manager).await,
        (&Method::POST, "/entries") => handlers::add_entry(manager, body).await,
        (&Method::DELETE, "/entries") => handlers::remove_entry(manager, body).await,
        (&Method::POST, "/servers") => handlers::add_server(manager, body).await,
        (_, "/health" | "/entries" | "/servers") => {
            Err(ApiError::new(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed"))
        }
        _ => Err(ApiError::new(StatusCode::NOT_FOUND, "Not Found")),
    };

    match result {
        Ok(value) => json_response(StatusCode::OK, &value),
        Err(err) => {
            if err.status.is_server_error() {
                tracing::error!("{} {} failed: {}", method, path, err.message);
            } else {
                tracing::debug!("{} {} rejected: {}", method, path, err.message);
            }
            json_response(err.status, &err.body())
        }
    }
}

fn json_response(status: StatusCode, body: &Value) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body.to_string())));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use l2dns_core::config::HostsTarget;
    use l2dns_core::store::{ConfigDocument, MemoryStore};
    use serde_json::json;
    use std::sync::Arc;

    const COREFILE: &str = ".:53 {
    hosts {
        10.0.0.1 existing.l2sm
        fallthrough
    }
}
";

    fn manager(corefile: &str) -> DnsManager {
        let doc = ConfigDocument::new("coredns", "default").with_corefile(corefile);
        let store = Arc::new(MemoryStore::with_documents([doc]));
        DnsManager::new(store, "default", "coredns", HostsTarget::default())
    }

    async fn call(manager: &DnsManager, method: Method, path: &str, body: &str) -> (StatusCode, Value) {
        let response = route(manager, &method, path, body.as_bytes()).await;
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let manager = manager(COREFILE);
        let (status, body) = call(&manager, Method::GET, "/health", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "healthy" }));
    }

    #[tokio::test]
    async fn test_add_list_remove_entry() {
        let manager = manager(COREFILE);

        let (status, body) = call(
            &manager,
            Method::POST,
            "/entries",
            r#"{"pod_name":"ping","network":"blue","scope":"inter","ip_address":"10.0.0.2"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "key": "ping.blue.inter.l2sm" }));

        let (status, body) = call(&manager, Method::GET, "/entries", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({ "10.0.0.1": ["existing.l2sm"], "10.0.0.2": ["ping.blue.inter.l2sm"] })
        );

        let (status, _) = call(
            &manager,
            Method::DELETE,
            "/entries",
            r#"{"key":"ping.blue.inter.l2sm","ip_address":"10.0.0.2"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = call(&manager, Method::GET, "/entries", "").await;
        assert_eq!(body, json!({ "10.0.0.1": ["existing.l2sm"] }));
    }

    #[tokio::test]
    async fn test_validation_errors() {
        let manager = manager(COREFILE);

        let (status, body) = call(
            &manager,
            Method::POST,
            "/entries",
            r#"{"pod_name":"ping","network":"blue","scope":"inter","ip_address":"nope"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("invalid IP address"));

        let (status, _) = call(
            &manager,
            Method::POST,
            "/entries",
            r#"{"pod_name":"","network":"blue","scope":"inter","ip_address":"10.0.0.2"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(&manager, Method::POST, "/servers", "{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unwritable_entry_is_rejected() {
        let manager = manager(COREFILE);
        let (status, body) = call(
            &manager,
            Method::POST,
            "/entries",
            r#"{"pod_name":"a.b\\\"c d","network":"scope","scope":"x","ip_address":"10.0.0.2"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("invalid domain name"));

        let doc = manager.document().await.unwrap();
        assert_eq!(doc.corefile().unwrap(), COREFILE);
        let (status, _) = call(&manager, Method::GET, "/entries", "").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_hosts_plugin_is_not_found() {
        let manager = manager(".:53 {\n    errors\n}\n");
        let (status, body) = call(&manager, Method::GET, "/entries", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("could not find 'hosts' plugin"));
    }

    #[tokio::test]
    async fn test_unparsable_corefile_is_server_error() {
        let manager = manager("}\n");
        let (status, _) = call(&manager, Method::GET, "/entries", "").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_add_server() {
        let manager = manager(COREFILE);
        let (status, _) = call(
            &manager,
            Method::POST,
            "/servers",
            r#"{"domain_name":"blue.inter.l2sm:53","server_domain":"10.1.0.5","server_port":"30053"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let doc = manager.document().await.unwrap();
        assert!(doc.corefile().unwrap().contains("blue.inter.l2sm:53 {\n    forward . 10.1.0.5:30053\n}"));
    }

    #[tokio::test]
    async fn test_unknown_routes() {
        let manager = manager(COREFILE);
        let (status, _) = call(&manager, Method::GET, "/nope", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = call(&manager, Method::PUT, "/entries", "").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_serve_over_tcp() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(serve(listener, manager(COREFILE)));

        let client = reqwest::Client::new();
        let base = format!("http://{}", addr);

        let response = client.get(format!("{}/health", base)).send().await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert_eq!(
            response.headers()[reqwest::header::CONTENT_TYPE],
            "application/json"
        );
        assert_eq!(response.text().await.unwrap(), r#"{"status":"healthy"}"#);

        let response = client
            .post(format!("{}/entries", base))
            .json(&json!({
                "pod_name": "ping",
                "network": "blue",
                "scope": "inter",
                "ip_address": "10.0.0.2"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);

        let response = client
            .delete(format!("{}/entries", base))
            .json(&json!({ "key": "", "ip_address": "10.0.0.2" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body, json!({ "error": "key must not be empty" }));

        let entries: Value = client
            .get(format!("{}/entries", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(
            entries,
            json!({ "10.0.0.1": ["existing.l2sm"], "10.0.0.2": ["ping.blue.inter.l2sm"] })
        );
        server.abort();
    }
}
