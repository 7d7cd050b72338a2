//! Remote catalog document retrieval.

use std::time::Duration;

use anyhow::Context;

/// Identifying client header sent with every request.
pub const USER_AGENT: &str = concat!("mcpdesk/", env!("CARGO_PKG_VERSION"));

/// Source of the catalog document.
///
/// Implementations make one attempt and report every failure as `None`.
pub trait DocumentFetcher {
    fn fetch(&self, url: &str, timeout: Duration) -> Option<String>;
}

/// Plain HTTP GET via reqwest.
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpDocumentFetcher;

impl HttpDocumentFetcher {
    pub fn new() -> Self {
        Self
    }

    /// Fetch `url`, failing on timeout, transport errors and non-2xx status.
    pub async fn fetch_text(&self, url: &str, timeout: Duration) -> anyhow::Result<String> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        let response = client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch catalog from {}", url))?;

        if !response.status().is_success() {
            anyhow::bail!(
                "Failed to fetch catalog: HTTP {} from {}",
                response.status(),
                url
            );
        }

        response
            .text()
            .await
            .with_context(|| format!("Failed to read response body from {}", url))
    }
}

impl DocumentFetcher for HttpDocumentFetcher {
    /// Blocks on a private runtime; must not be called from inside a tokio runtime.
    fn fetch(&self, url: &str, timeout: Duration) -> Option<String> {
        let runtime = match tokio::runtime::Runtime::new() {
            Ok(runtime) => runtime,
            Err(err) => {
                tracing::error!(error = %err, "Failed to create tokio runtime");
                return None;
            }
        };

        tracing::info!(url, "Downloading catalog document");
        match runtime.block_on(self.fetch_text(url, timeout)) {
            Ok(body) => {
                tracing::info!(url, bytes = body.len(), "Downloaded catalog document");
                Some(body)
            }
            Err(err) => {
                tracing::error!(url, error = %format!("{err:#}"), "Catalog download failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serve one canned HTTP response on a local port.
    fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 4096];
                let _ = stream.read(&mut buf);
                let response = format!(
                    "{status_line}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });
        format!("http://{addr}/README.md")
    }

    #[test]
    fn non_success_status_returns_none() {
        let url = serve_once("HTTP/1.1 404 Not Found", "missing");

        assert!(
            HttpDocumentFetcher::new()
                .fetch(&url, Duration::from_secs(5))
                .is_none()
        );
    }

    #[test]
    fn unreachable_host_returns_none() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result =
            HttpDocumentFetcher::new().fetch(&format!("http://{addr}/"), Duration::from_secs(2));

        assert!(result.is_none());
    }

    #[test]
    fn user_agent_identifies_client() {
        assert!(USER_AGENT.starts_with("mcpdesk/"));
    }
}
