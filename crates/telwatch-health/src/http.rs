//! HTTP(S) probe.
//!
//! Issues a single `GET` over a fresh connection. The service is healthy
//! only when the status is exactly `200`; redirects are not followed, so a
//! `301`/`302` is reported unhealthy with its status code.

use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use bytes::Bytes;
use ::http::uri::Scheme;
use ::http::{Method, Request, StatusCode, Uri};
use http_body_util::Empty;
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use tracing::debug;

use crate::result::{Diagnostics, ProbeOutcome};

const USER_AGENT: &str = concat!("telwatch-health/", env!("CARGO_PKG_VERSION"));

/// Perform an HTTP health probe against `url`.
///
/// Returns a healthy outcome only for status `200`. Any other status is
/// unhealthy but keeps its status code and response time; connection
/// failures and timeouts carry an error instead.
pub async fn http_probe(url: &str, timeout: Duration) -> ProbeOutcome {
    let uri: Uri = match url.parse() {
        Ok(uri) => uri,
        Err(e) => return ProbeOutcome::failed(format!("invalid url {url}: {e}")),
    };

    let start = Instant::now();
    let result = tokio::time::timeout(timeout, get_status(&uri)).await;

    match result {
        Ok(Ok(status)) => {
            let elapsed = start.elapsed();
            if status != StatusCode::OK {
                debug!(%status, %uri, "health probe non-200");
            }
            ProbeOutcome::responded(
                status == StatusCode::OK,
                elapsed,
                Diagnostics::Http {
                    status_code: status.as_u16(),
                },
            )
        }
        Ok(Err(e)) => {
            debug!(error = %e, %uri, "health probe request failed");
            ProbeOutcome::failed(e)
        }
        Err(_) => {
            debug!(%uri, "health probe timed out");
            ProbeOutcome::failed(format!("timed out after {}ms", timeout.as_millis()))
        }
    }
}

async fn get_status(uri: &Uri) -> Result<StatusCode, String> {
    let host = uri
        .host()
        .ok_or_else(|| format!("url {uri} has no host"))?
        .trim_start_matches('[')
        .trim_end_matches(']');
    let https = uri.scheme() == Some(&Scheme::HTTPS);
    let port = uri.port_u16().unwrap_or(if https { 443 } else { 80 });

    let stream = TcpStream::connect((host, port))
        .await
        .map_err(|e| format!("connect to {host}:{port} failed: {e}"))?;

    if https {
        let server_name = rustls::pki_types::ServerName::try_from(host.to_string())
            .map_err(|e| format!("invalid tls server name {host}: {e}"))?;
        let connector = tokio_rustls::TlsConnector::from(tls_config()?);
        let tls = connector
            .connect(server_name, stream)
            .await
            .map_err(|e| format!("tls handshake with {host} failed: {e}"))?;
        send_get(TokioIo::new(tls), uri).await
    } else {
        send_get(TokioIo::new(stream), uri).await
    }
}

async fn send_get<I>(io: I, uri: &Uri) -> Result<StatusCode, String>
where
    I: hyper::rt::Read + hyper::rt::Write + Unpin + Send + 'static,
{
    let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
        .await
        .map_err(|e| format!("http handshake failed: {e}"))?;

    // Drive the connection in the background; it ends when `sender` drops.
    tokio::spawn(async move {
        let _ = conn.await;
    });

    let path = uri.path_and_query().map(|p| p.as_str()).unwrap_or("/");
    let authority = uri.authority().map(|a| a.as_str()).unwrap_or_default();

    let req = Request::builder()
        .method(Method::GET)
        .uri(path)
        .header(::http::header::HOST, authority)
        .header(::http::header::USER_AGENT, USER_AGENT)
        .body(Empty::<Bytes>::new())
        .map_err(|e| format!("failed to build request: {e}"))?;

    let resp = sender
        .send_request(req)
        .await
        .map_err(|e| format!("request failed: {e}"))?;
    Ok(resp.status())
}

/// Client TLS configuration with the Mozilla root store, built once.
fn tls_config() -> Result<Arc<rustls::ClientConfig>, String> {
    static CONFIG: OnceLock<Result<Arc<rustls::ClientConfig>, String>> = OnceLock::new();
    CONFIG
        .get_or_init(|| {
            let mut roots = rustls::RootCertStore::empty();
            roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

            let config = rustls::ClientConfig::builder_with_provider(
                rustls::crypto::ring::default_provider().into(),
            )
            .with_safe_default_protocol_versions()
            .map_err(|e| format!("tls protocol version error: {e}"))?
            .with_root_certificates(roots)
            .with_no_client_auth();
            Ok(Arc::new(config))
        })
        .clone()
}
