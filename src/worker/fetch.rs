//! Network fetch seam for the interception layer.
//!
//! The interceptor never talks to `reqwest` directly; it calls an
//! injected [`Fetcher`] closure, so tests swap in canned responses and
//! the install/warm/handle logic stays network-agnostic.

use reqwest::Client;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// A stored copy of an HTTP response: enough to replay it later.
///
/// A fetch that reaches the server yields a snapshot whatever the
/// status; transport failures are the `Err` side of the seam.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseSnapshot {
  pub status: u16,
  pub content_type: Option<String>,
  pub body: Vec<u8>,
}

impl ResponseSnapshot {
  /// A 200 text/html response, mostly useful in tests and fixtures.
  pub fn html(body: &str) -> Self {
    Self {
      status: 200,
      content_type: Some("text/html".to_string()),
      body: body.as_bytes().to_vec(),
    }
  }

  pub fn is_success(&self) -> bool {
    (200..300).contains(&self.status)
  }
}

/// A boxed future resolving to a response snapshot.
pub type FetchFuture = Pin<Box<dyn Future<Output = Result<ResponseSnapshot, String>> + Send>>;

/// Fetch closure: absolute request URL in, response snapshot out.
pub type Fetcher = Arc<dyn Fn(String) -> FetchFuture + Send + Sync>;

/// Build a fetcher backed by a real HTTP client.
pub fn network_fetcher(client: Client) -> Fetcher {
  Arc::new(move |url: String| {
    let client = client.clone();
    Box::pin(async move {
      let response = client.get(&url).send().await.map_err(|e| e.to_string())?;

      let status = response.status().as_u16();
      let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(String::from);
      let body = response
        .bytes()
        .await
        .map_err(|e| e.to_string())?
        .to_vec();

      Ok(ResponseSnapshot {
        status,
        content_type,
        body,
      })
    })
  })
}
