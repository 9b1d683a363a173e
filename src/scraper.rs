use crate::parser::{ParseError, parse_vaccine_update};
use crate::types::VaccineUpdate;

use reqwest::{Client, StatusCode};

#[derive(Debug, thiserror::Error)]
pub enum ScraperError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Parse error: {0}")]
    ParseError(#[from] ParseError),
}

/// Status and body of a successful GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPage {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct WebScraper {
    client: Client,
    page_url: String,
}

impl WebScraper {
    pub fn new() -> Result<Self, ScraperError> {
        Self::with_url(crate::BOOKING_URL)
    }

    pub fn with_url(page_url: impl Into<String>) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .user_agent(format!(
                "{}/{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self {
            client,
            page_url: page_url.into(),
        })
    }

    pub fn page_url(&self) -> &str {
        &self.page_url
    }

    /// Issues a single GET. Any status other than 200 yields `Ok(None)`.
    pub async fn fetch_page(&self, url: &str) -> Result<Option<RawPage>, ScraperError> {
        log::info!("Fetching {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .inspect_err(|e| log::error!("HTTP error: {e:?}"))?;

        let status = response.status();
        if status != StatusCode::OK {
            log::warn!("{} answered with status {}", url, status);
            return Ok(None);
        }

        let body = response
            .text()
            .await
            .inspect_err(|e| log::error!("Decode error: {e:?}"))?;

        Ok(Some(RawPage {
            status: status.as_u16(),
            body,
        }))
    }

    pub async fn fetch_latest_update(&self) -> Result<Option<VaccineUpdate>, ScraperError> {
        let Some(page) = self.fetch_page(&self.page_url).await? else {
            return Ok(None);
        };
        Ok(Some(parse_vaccine_update(&page.body)?))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves exactly one HTTP response on a random local port and returns its URL.
    pub(crate) async fn serve_once(status_line: &'static str, body: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });

        format!("http://{}/book/", addr)
    }

    #[tokio::test]
    async fn test_fetch_page_ok() {
        let url = serve_once("200 OK", "<html>hello</html>".to_string()).await;
        let scraper = WebScraper::with_url(&url).unwrap();

        let page = scraper.fetch_page(&url).await.unwrap().expect("Expected a page");

        assert_eq!(page.status, 200);
        assert_eq!(page.body, "<html>hello</html>");
    }

    #[tokio::test]
    async fn test_fetch_page_non_200_is_absent() {
        let url = serve_once("503 Service Unavailable", "down".to_string()).await;
        let scraper = WebScraper::with_url(&url).unwrap();

        assert!(scraper.fetch_page(&url).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fetch_latest_update_parses_page() {
        let html = std::fs::read_to_string("fixtures/book-coronavirus-vaccination.html")
            .expect("Failed to read fixture");
        let url = serve_once("200 OK", html).await;
        let scraper = WebScraper::with_url(url).unwrap();

        let update = scraper.fetch_latest_update().await.unwrap().unwrap();

        assert_eq!(update.criterion, "People aged 75 and over");
    }

    #[tokio::test]
    async fn test_fetch_latest_update_reports_extraction_failure() {
        let html = std::fs::read_to_string("fixtures/missing-review-date.html")
            .expect("Failed to read fixture");
        let url = serve_once("200 OK", html).await;
        let scraper = WebScraper::with_url(url).unwrap();

        assert!(matches!(
            scraper.fetch_latest_update().await,
            Err(ScraperError::ParseError(ParseError::MissingElement(_)))
        ));
    }

    #[tokio::test]
    async fn test_connection_refused_is_http_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());
        drop(listener);
        let scraper = WebScraper::with_url(&url).unwrap();

        assert!(matches!(
            scraper.fetch_page(&url).await,
            Err(ScraperError::HttpError(_))
        ));
    }
}
