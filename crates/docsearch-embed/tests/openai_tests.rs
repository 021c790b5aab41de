//! Exercises the HTTP client against a one-shot local server.
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread;

use docsearch_core::config::{EmbeddingConfig, ProviderKind};
use docsearch_core::{EmbedError, Embedder};
use docsearch_embed::OpenAiEmbedder;

const KEY: &str = "sk-test-very-secret";

/// Serves one request with `status` and `body`; returns the base URL and a
/// handle yielding the raw request head.
fn serve_once(status: &'static str, body: &'static str) -> (String, thread::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream);
        let mut head = String::new();
        let mut content_length = 0usize;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            if let Some(v) = line.to_ascii_lowercase().strip_prefix("content-length:") { content_length = v.trim().parse().unwrap(); }
            if line == "\r\n" || line.is_empty() { break; }
            head.push_str(&line);
        }
        let mut request_body = vec![0u8; content_length];
        reader.read_exact(&mut request_body).unwrap();
        let response = format!("HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}", body.len());
        reader.get_mut().write_all(response.as_bytes()).unwrap();
        head + &String::from_utf8_lossy(&request_body)
    });
    (format!("http://{addr}/v1"), handle)
}

fn embedder(base_url: String, dim: usize) -> OpenAiEmbedder {
    let config = EmbeddingConfig { provider: ProviderKind::OpenAi, api_key: Some(KEY.into()), base_url, dim: Some(dim), timeout_secs: 5, ..EmbeddingConfig::default() };
    OpenAiEmbedder::from_config(&config).expect("client")
}

#[test]
fn parses_embeddings_in_input_order() {
    let (url, server) = serve_once("200 OK", r#"{"data":[{"index":1,"embedding":[0.0,1.0]},{"index":0,"embedding":[1.0,0.0]}]}"#);
    let vectors = embedder(url, 2).embed_batch(&["a".to_string(), "b".to_string()]).expect("embed");
    assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    let request = server.join().unwrap();
    assert!(request.starts_with("POST /v1/embeddings"));
    assert!(request.to_ascii_lowercase().contains(&format!("authorization: bearer {KEY}")));
    assert!(request.contains(r#""input":["a","b"]"#));
}

#[test]
fn unauthorized_maps_to_auth_without_leaking_key() {
    let (url, server) = serve_once("401 Unauthorized", r#"{"error":{"message":"bad key"}}"#);
    let err = embedder(url, 2).embed_batch(&["a".to_string()]).unwrap_err();
    server.join().unwrap();
    assert!(matches!(err, EmbedError::Auth(_)), "{err:?}");
    assert!(!err.to_string().contains(KEY));
}

#[test]
fn too_many_requests_maps_to_rate_limited() {
    let (url, server) = serve_once("429 Too Many Requests", "{}");
    let err = embedder(url, 2).embed_batch(&["a".to_string()]).unwrap_err();
    server.join().unwrap();
    assert!(matches!(err, EmbedError::RateLimited(_)), "{err:?}");
}

#[test]
fn wrong_vector_count_and_dimension_are_rejected() {
    let (url, server) = serve_once("200 OK", r#"{"data":[{"index":0,"embedding":[1.0,0.0]}]}"#);
    let err = embedder(url, 2).embed_batch(&["a".to_string(), "b".to_string()]).unwrap_err();
    server.join().unwrap();
    assert_eq!(err, EmbedError::CountMismatch { expected: 2, got: 1 });

    let (url, server) = serve_once("200 OK", r#"{"data":[{"index":0,"embedding":[1.0,0.0,0.5]}]}"#);
    let err = embedder(url, 2).embed_batch(&["a".to_string()]).unwrap_err();
    server.join().unwrap();
    assert_eq!(err, EmbedError::DimensionMismatch { expected: 2, got: 3 });
}

#[test]
fn fingerprint_tracks_credential_but_hides_it() {
    let a = embedder("http://127.0.0.1:9/v1".into(), 2);
    let config = EmbeddingConfig { provider: ProviderKind::OpenAi, api_key: Some("sk-other".into()), base_url: "http://127.0.0.1:9/v1".into(), dim: Some(2), ..EmbeddingConfig::default() };
    let b = OpenAiEmbedder::from_config(&config).expect("client");
    assert_ne!(a.fingerprint(), b.fingerprint());
    assert_eq!(a.embedder_id(), b.embedder_id());
    assert!(!a.fingerprint().contains(KEY));
}

#[test]
fn unreachable_endpoint_is_a_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let err = embedder(format!("http://{addr}/v1"), 2).embed_batch(&["a".to_string()]).unwrap_err();
    assert!(matches!(err, EmbedError::Network(_)), "{err:?}");
}
