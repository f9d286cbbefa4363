//! HTTP serving engine.
//!
//! A lightweight server built on `tiny_http`, serving the current
//! [`SiteSnapshot`] entirely from memory:
//!
//! - `GET /` and `GET /page/{n}` → index listing pages
//! - `GET /{slug}` → post, else page
//! - anything else (including non-GET methods) → 404
//!
//! Several worker threads loop on [`tiny_http::Server::recv`]; each request
//! loads the snapshot once and serves every byte from that one version, so
//! a swap mid-request is never observable. The snapshot version is surfaced
//! as the `ETag` header. A failing request is answered with 404/500 and
//! logged; it never takes the server down.

use crate::{log, snapshot::SnapshotHandle};
use anyhow::{Context, Result, anyhow};
use std::{io::Cursor, net::SocketAddr, sync::Arc};
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};

// ============================================================================
// Binding
// ============================================================================

/// Bind the listening socket.
pub fn bind(interface: &str, port: u16) -> Result<Server> {
    let interface: std::net::IpAddr = interface
        .parse()
        .with_context(|| format!("Invalid [serve.interface]: {interface}"))?;
    let addr = SocketAddr::new(interface, port);

    Server::http(addr).map_err(|err| anyhow!("Failed to bind {addr}: {err}"))
}

// ============================================================================
// Worker Loop
// ============================================================================

/// Request worker: serve until the listener is unblocked.
///
/// Runs on its own thread; finishes the in-flight request before exiting,
/// which is what makes shutdown graceful.
pub fn worker_loop(server: &Server, snapshot: &SnapshotHandle) {
    for request in server.incoming_requests() {
        if let Err(err) = handle_request(request, snapshot) {
            log!("serve"; "request error: {err}");
        }
    }
}

// ============================================================================
// Request Handling
// ============================================================================

/// Handle a single HTTP request against the current snapshot.
fn handle_request(request: Request, snapshot: &SnapshotHandle) -> Result<()> {
    if *request.method() != Method::Get {
        return serve_not_found(request);
    }

    // One load per request: everything below serves this version.
    let site = snapshot.current();

    // Decode URL-encoded characters (e.g., %20 → space)
    let url_path = urlencoding::decode(request.url())
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_default();

    // Strip query string before resolving
    let path_without_query = url_path.split('?').next().unwrap_or(&url_path);
    let request_path = path_without_query.trim_matches('/');

    match route(request_path, &site) {
        Some(document) => serve_html(request, document, site.version),
        None => serve_not_found(request),
    }
}

/// Resolve a trimmed request path against a snapshot.
fn route<'a>(path: &str, site: &'a crate::snapshot::SiteSnapshot) -> Option<&'a str> {
    if path.is_empty() {
        return site.index_page(1);
    }
    if let Some(rest) = path.strip_prefix("page/") {
        let number: usize = rest.parse().ok()?;
        return site.index_page(number);
    }
    site.lookup(path)
}

// ============================================================================
// Response Helpers
// ============================================================================

/// Serve an HTML document, tagged with the snapshot version.
fn serve_html(request: Request, body: &str, version: u64) -> Result<()> {
    let response = Response::from_data(body.as_bytes().to_vec())
        .with_header(Header::from_bytes("Content-Type", "text/html; charset=utf-8").unwrap())
        .with_header(Header::from_bytes("ETag", format!("\"{version}\"")).unwrap());
    request.respond(response)?;
    Ok(())
}

/// Serve 404 Not Found response.
fn serve_not_found(request: Request) -> Result<()> {
    let response = Response::new(
        StatusCode(404),
        vec![Header::from_bytes("Content-Type", "text/plain").unwrap()],
        Cursor::new("404 Not Found"),
        Some(13),
        None,
    );
    request.respond(response)?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::SiteSnapshot;
    use std::collections::BTreeMap;

    fn snapshot() -> SiteSnapshot {
        SiteSnapshot {
            version: 0,
            index: vec!["index-1".into(), "index-2".into()],
            posts: BTreeMap::from([("hello".to_string(), "post-hello".to_string())]),
            pages: BTreeMap::from([("about".to_string(), "page-about".to_string())]),
        }
    }

    #[test]
    fn test_route_index() {
        let site = snapshot();
        assert_eq!(route("", &site), Some("index-1"));
        assert_eq!(route("page/1", &site), Some("index-1"));
        assert_eq!(route("page/2", &site), Some("index-2"));
        assert_eq!(route("page/3", &site), None);
        assert_eq!(route("page/zero", &site), None);
    }

    #[test]
    fn test_route_slugs() {
        let site = snapshot();
        assert_eq!(route("hello", &site), Some("post-hello"));
        assert_eq!(route("about", &site), Some("page-about"));
        assert_eq!(route("missing", &site), None);
        // Slugs are flat; nested paths never match
        assert_eq!(route("hello/extra", &site), None);
    }

    #[test]
    fn test_bind_invalid_interface() {
        assert!(bind("not-an-ip", 0).is_err());
    }

    #[test]
    fn test_bind_ephemeral_port() {
        let server = bind("127.0.0.1", 0).unwrap();
        assert_ne!(server.server_addr().to_ip().unwrap().port(), 0);
    }
}
