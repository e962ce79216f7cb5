use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;

use spec_publish_core::contract::ManifestFetcher;
use spec_publish_core::manifest::HttpManifestFetcher;
use spec_publish_core::PublishError;

/// Serve exactly one canned HTTP response on a random local port.
fn serve_once(status_line: &'static str, body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut buf = [0u8; 4096];
            let _ = stream.read(&mut buf);
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes());
            let _ = stream.flush();
        }
    });
    format!("http://{addr}/versions.json")
}

// Talk to the local socket directly even if the environment configures a proxy.
fn fetcher() -> HttpManifestFetcher {
    HttpManifestFetcher::with_client(reqwest::Client::builder().no_proxy().build().unwrap())
}

#[tokio::test]
async fn returns_body_on_success() {
    let url = serve_once("200 OK", r#"{"stable":{"spec":"1.0.0","source":"1.0.0"}}"#);
    let body = fetcher().fetch(&url).await.unwrap();
    assert_eq!(body, r#"{"stable":{"spec":"1.0.0","source":"1.0.0"}}"#);
}

#[tokio::test]
async fn non_success_status_is_fetch_error() {
    let url = serve_once("404 Not Found", "missing");
    let err = fetcher().fetch(&url).await.unwrap_err();
    match err {
        PublishError::ManifestFetch { url: failed, reason } => {
            assert_eq!(failed, url);
            assert!(reason.contains("404"), "reason: {reason}");
        }
        other => panic!("expected ManifestFetch, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_host_is_fetch_error() {
    // bind then drop to get a port nobody listens on
    let port = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
    let url = format!("http://127.0.0.1:{port}/versions.json");
    let err = fetcher().fetch(&url).await.unwrap_err();
    assert!(matches!(err, PublishError::ManifestFetch { .. }), "got {err:?}");
}
