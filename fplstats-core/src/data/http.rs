//! Blocking HTTP client with retry and rate-limit tracking.
//!
//! Transient failures (connect errors, timeouts, 5xx) are retried with
//! exponential backoff. HTTP 403 and 429 mark the client as rate limited:
//! GitHub keeps refusing for the rest of the rate window, so every later
//! request fails fast without touching the network.

use super::provider::DataError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Upper bound on retries per request. Backoff doubles per attempt.
pub const MAX_RETRIES: u32 = 10;

pub struct HttpClient {
    client: reqwest::blocking::Client,
    max_retries: u32,
    base_delay: Duration,
    rate_limited: AtomicBool,
}

impl HttpClient {
    pub fn new(
        user_agent: &str,
        timeout: Duration,
        max_retries: u32,
        base_delay: Duration,
    ) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| DataError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_retries: max_retries.min(MAX_RETRIES),
            base_delay,
            rate_limited: AtomicBool::new(false),
        })
    }

    pub fn is_rate_limited(&self) -> bool {
        self.rate_limited.load(Ordering::Relaxed)
    }

    /// GET `url` and return the body as text.
    pub fn get_text(&self, url: &str) -> Result<String, DataError> {
        let resp = self.get_with_retry(url)?;
        resp.text()
            .map_err(|e| DataError::Network(format!("failed to read body of {url}: {e}")))
    }

    fn get_with_retry(&self, url: &str) -> Result<reqwest::blocking::Response, DataError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if self.is_rate_limited() {
                return Err(DataError::RateLimited(format!("skipped {url}")));
            }
            if attempt > 0 {
                let delay = self.base_delay.saturating_mul(2u32.saturating_pow(attempt - 1));
                tracing::debug!(url, attempt, ?delay, "retrying request");
                std::thread::sleep(delay);
            }

            let err = match self.client.get(url).send() {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        return Ok(resp);
                    }
                    if status == reqwest::StatusCode::FORBIDDEN
                        || status == reqwest::StatusCode::TOO_MANY_REQUESTS
                    {
                        self.rate_limited.store(true, Ordering::Relaxed);
                        tracing::warn!(url, %status, "rate limited, skipping remaining requests");
                        return Err(DataError::RateLimited(format!("HTTP {status} for {url}")));
                    }
                    DataError::Http {
                        status: status.as_u16(),
                        url: url.to_string(),
                    }
                }
                Err(e) => DataError::Network(format!("{url}: {e}")),
            };

            if !err.is_transient() {
                return Err(err);
            }
            last_error = Some(err);
        }

        Err(last_error.unwrap_or_else(|| DataError::Network(format!("{url}: retries exhausted"))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use std::thread;

    fn response(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    /// Answers the n-th request with `responses[n]`, repeating the last one.
    /// Returns the URL to hit and the request counter.
    fn serve(responses: Vec<String>) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/players/gw.csv", listener.local_addr().unwrap());
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { break };
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf) {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let n = counter.fetch_add(1, Ordering::SeqCst);
                let reply = &responses[n.min(responses.len() - 1)];
                let _ = stream.write_all(reply.as_bytes());
            }
        });
        (url, hits)
    }

    fn client(max_retries: u32) -> HttpClient {
        HttpClient::new(
            "fplstats-test",
            Duration::from_secs(5),
            max_retries,
            Duration::from_millis(1),
        )
        .unwrap()
    }

    #[test]
    fn server_error_is_retried() {
        let (url, hits) = serve(vec![
            response("503 Service Unavailable", ""),
            response("200 OK", "element,minutes\n1,90\n"),
        ]);
        let http = client(2);

        let body = http.get_text(&url).unwrap();
        assert_eq!(body, "element,minutes\n1,90\n");
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert!(!http.is_rate_limited());
    }

    #[test]
    fn persistent_server_error_gives_up_after_retries() {
        let (url, hits) = serve(vec![response("502 Bad Gateway", "")]);
        let http = client(1);

        let err = http.get_text(&url).unwrap_err();
        assert!(matches!(err, DataError::Http { status: 502, .. }));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn forbidden_sets_sticky_rate_limit() {
        let (url, hits) = serve(vec![
            response("403 Forbidden", ""),
            response("200 OK", "ok"),
        ]);
        let http = client(3);

        let err = http.get_text(&url).unwrap_err();
        assert!(matches!(err, DataError::RateLimited(_)));
        assert!(http.is_rate_limited());
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        // later requests fail without reaching the server
        let err = http.get_text(&url).unwrap_err();
        assert!(matches!(err, DataError::RateLimited(_)));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn too_many_requests_is_rate_limited() {
        let (url, hits) = serve(vec![response("429 Too Many Requests", "")]);
        let http = client(3);

        assert!(matches!(http.get_text(&url), Err(DataError::RateLimited(_))));
        assert!(http.is_rate_limited());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn not_found_is_not_retried() {
        let (url, hits) = serve(vec![
            response("404 Not Found", ""),
            response("200 OK", "ok"),
        ]);
        let http = client(3);

        let err = http.get_text(&url).unwrap_err();
        assert!(matches!(err, DataError::Http { status: 404, .. }));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(!http.is_rate_limited());
    }

    #[test]
    fn retries_are_capped() {
        let http = client(u32::MAX);
        assert_eq!(http.max_retries, MAX_RETRIES);
    }
}
