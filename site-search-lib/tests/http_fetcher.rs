// site-search-lib/tests/http_fetcher.rs

//! HttpFetcher against a loopback HTTP server

use site_search_lib::{
    probe_host, HttpFetcher, PageFetcher, ProbePipeline, RecordReader, RecordStream, ResultWriter,
    SiteRow, SiteSearchError, TermMatcher,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_test::{assert_err, assert_ok};

/// Serve `body` with `status` to every connection; returns "127.0.0.1:port".
async fn serve(status: &'static str, body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr.to_string()
}

/// An address nothing is listening on.
async fn closed_port() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr.to_string()
}

fn fetcher() -> HttpFetcher {
    let timeout = Duration::from_secs(5);
    let client = reqwest::Client::builder()
        .no_proxy()
        .timeout(timeout)
        .build()
        .unwrap();
    HttpFetcher::with_client(client, timeout)
}

#[tokio::test]
async fn test_fetch_returns_body() {
    let host = serve("200 OK", "<html>hello golang</html>").await;
    let body = assert_ok!(fetcher().fetch(&host).await);
    assert_eq!(body, b"<html>hello golang</html>");
}

#[tokio::test]
async fn test_non_success_status_still_returns_body() {
    let host = serve("404 Not Found", "golang page missing").await;
    let body = assert_ok!(fetcher().fetch(&host).await);
    assert_eq!(body, b"golang page missing");
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    let host = closed_port().await;
    let err = assert_err!(fetcher().fetch(&host).await);
    assert!(matches!(err, SiteSearchError::NetworkError { .. }), "{}", err);
    assert!(!err.is_fatal());
}

#[tokio::test]
async fn test_probe_host_reports_match_and_failure() {
    let up = serve("200 OK", "this site is built with golang").await;
    let down = closed_port().await;
    let matcher = TermMatcher::new("golang").unwrap();
    let fetcher = fetcher();

    let hit = probe_host(&fetcher, &matcher, up.clone()).await;
    assert!(hit.found);
    assert_eq!(hit.host, up);
    assert!(hit.error.is_none());

    let miss = probe_host(&fetcher, &matcher, down).await;
    assert!(!miss.found);
    assert!(miss.error.is_some());
}

#[tokio::test]
async fn test_pipeline_over_http() {
    let up = serve("200 OK", "golang").await;
    let down = closed_port().await;
    let input = format!(
        "Rank,URL,Linking Root Domains,External Links,mozRank,mozTrust\n\
         1,{},1,1,1,1\n\
         2,{},1,1,1,1\n",
        up, down
    );

    let records: RecordStream<SiteRow> =
        RecordStream::spawn(RecordReader::new(std::io::Cursor::new(input.into_bytes())));
    let pipeline = ProbePipeline::new(fetcher(), TermMatcher::new("golang").unwrap(), 2).unwrap();
    let sink = Arc::new(ResultWriter::new(Vec::new(), "golang"));

    let summary = pipeline.run(records, Arc::clone(&sink)).await.unwrap();
    assert_eq!(summary.probed, 2);
    assert_eq!(summary.found, 1);
    assert_eq!(summary.failed, 1);

    let out = Arc::try_unwrap(sink)
        .unwrap_or_else(|_| panic!("sink still shared"))
        .into_inner()
        .unwrap();
    let out = String::from_utf8(out).unwrap();
    assert!(out.contains(&format!("Found term [golang] in [{}]: true", up)));
    assert!(out.contains(&format!("Found term [golang] in [{}]: false", down)));
}
