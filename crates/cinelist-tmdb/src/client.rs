use async_trait::async_trait;
use cinelist_config::TmdbConfig;
use cinelist_models::{CatalogPage, MovieDetails};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, warn};
use crate::error::CatalogError;
use crate::format;
use crate::traits::CatalogSource;

/// TMDB caps pagination at 500
const MAX_PAGE: u32 = 500;

#[derive(Clone)]
pub struct TmdbClient {
    client: Arc<Client>,
    api_key: String,
    base_url: String,
    image_base_url: String,
    language: Option<String>,
}

impl TmdbClient {
    pub fn new(config: &TmdbConfig) -> Result<Self, CatalogError> {
        if config.api_key.trim().is_empty() {
            return Err(CatalogError::MissingApiKey);
        }

        let client = Client::builder()
            .user_agent(concat!("cinelist/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client: Arc::new(client),
            api_key: config.api_key.trim().to_string(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            image_base_url: config.image_base_url.clone(),
            language: config.language.clone(),
        })
    }

    /// Full poster/backdrop URL, or the placeholder when the movie has none
    pub fn image_url(&self, path: Option<&str>) -> String {
        format::image_url(&self.image_base_url, path)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn params(&self, extra: &[(&'static str, String)]) -> Vec<(&'static str, String)> {
        let mut params = vec![("api_key", self.api_key.clone())];
        if let Some(language) = &self.language {
            params.push(("language", language.clone()));
        }
        params.extend(extra.iter().cloned());
        params
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        extra: &[(&'static str, String)],
    ) -> Result<T, CatalogError> {
        let url = self.endpoint(path);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .query(&self.params(extra))
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("TMDB request to {} failed: {}", path, status);
            return Err(CatalogError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

fn clamp_page(page: u32) -> u32 {
    page.clamp(1, MAX_PAGE)
}

#[async_trait]
impl CatalogSource for TmdbClient {
    fn source_name(&self) -> &str {
        "tmdb"
    }

    async fn fetch_popular(&self, page: u32) -> Result<CatalogPage, CatalogError> {
        self.get_json("movie/popular", &[("page", clamp_page(page).to_string())])
            .await
    }

    async fn search(&self, query: &str, page: u32) -> Result<CatalogPage, CatalogError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(CatalogPage::empty());
        }

        self.get_json(
            "search/movie",
            &[
                ("query", query.to_string()),
                ("page", clamp_page(page).to_string()),
            ],
        )
        .await
    }

    async fn fetch_details(&self, movie_id: u64) -> Result<MovieDetails, CatalogError> {
        self.get_json(
            &format!("movie/{}", movie_id),
            &[("append_to_response", "credits,videos".to_string())],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    const POPULAR_JSON: &str = r#"{
        "page": 2,
        "results": [
            {"id": 27205, "title": "Inception", "overview": "Dreams.", "poster_path": "/inc.jpg",
             "backdrop_path": null, "release_date": "2010-07-15", "vote_average": 8.4,
             "vote_count": 35000, "genre_ids": [28, 878, 12]},
            {"id": 157336, "title": "Interstellar", "overview": "", "poster_path": null,
             "backdrop_path": null, "release_date": "", "vote_average": 8.4,
             "vote_count": 33000, "genre_ids": [], "adult": false, "popularity": 120.5}
        ],
        "total_pages": 40,
        "total_results": 800
    }"#;

    /// Serve one canned HTTP response; resolves to the raw request head
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&request).to_string()
        });

        (base_url, handle)
    }

    fn client_for(base_url: &str) -> TmdbClient {
        TmdbClient::new(&TmdbConfig {
            api_key: "secret".to_string(),
            base_url: base_url.to_string(),
            image_base_url: "https://img.example/w500".to_string(),
            language: Some("en-US".to_string()),
        })
        .unwrap()
    }

    #[test]
    fn test_new_requires_api_key() {
        let result = TmdbClient::new(&TmdbConfig::default());
        assert!(matches!(result, Err(CatalogError::MissingApiKey)));
    }

    #[test]
    fn test_params_and_endpoint() {
        let client = client_for("http://localhost:1/3/");
        assert_eq!(client.endpoint("/movie/popular"), "http://localhost:1/3/movie/popular");

        let params = client.params(&[("page", "3".to_string())]);
        assert_eq!(
            params,
            vec![
                ("api_key", "secret".to_string()),
                ("language", "en-US".to_string()),
                ("page", "3".to_string()),
            ]
        );
        assert_eq!(client.image_url(Some("/p.jpg")), "https://img.example/w500/p.jpg");
    }

    #[test]
    fn test_clamp_page() {
        assert_eq!(clamp_page(0), 1);
        assert_eq!(clamp_page(7), 7);
        assert_eq!(clamp_page(9000), MAX_PAGE);
    }

    #[tokio::test]
    async fn test_fetch_popular() {
        let (base_url, server) = serve_once("200 OK", POPULAR_JSON).await;
        let client = client_for(&base_url);

        let page = client.fetch_popular(2).await.unwrap();
        assert_eq!(page.page, 2);
        assert_eq!(page.results.len(), 2);
        assert_eq!(page.results[0].title, "Inception");
        assert_eq!(page.results[1].poster_path, None);
        assert!(page.has_next());

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /movie/popular?"));
        assert!(request.contains("api_key=secret"));
        assert!(request.contains("page=2"));
    }

    #[tokio::test]
    async fn test_search_encodes_query() {
        let (base_url, server) = serve_once("200 OK", POPULAR_JSON).await;
        let client = client_for(&base_url);

        client.search("  the matrix ", 1).await.unwrap();

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /search/movie?"));
        assert!(request.contains("query=the+matrix"));
    }

    #[tokio::test]
    async fn test_blank_search_skips_request() {
        // Nothing listens here; a request would fail
        let client = client_for("http://127.0.0.1:9");
        let page = client.search("   ", 1).await.unwrap();
        assert_eq!(page, CatalogPage::empty());
    }

    #[tokio::test]
    async fn test_fetch_details_appends_credits() {
        let body = r#"{"id": 603, "title": "The Matrix", "runtime": 136,
            "genres": [{"id": 28, "name": "Action"}],
            "credits": {"cast": [{"id": 1, "name": "Keanu Reeves", "character": "Neo", "order": 0}]}}"#;
        let (base_url, server) = serve_once("200 OK", body).await;
        let client = client_for(&base_url);

        let details = client.fetch_details(603).await.unwrap();
        assert_eq!(details.runtime, Some(136));
        assert_eq!(details.top_cast(8)[0].character, "Neo");

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /movie/603?"));
        assert!(request.contains("append_to_response=credits%2Cvideos"));
    }

    #[tokio::test]
    async fn test_error_status() {
        let body = r#"{"status_code": 34, "status_message": "The resource you requested could not be found."}"#;
        let (base_url, _server) = serve_once("404 Not Found", body).await;
        let client = client_for(&base_url);

        let err = client.fetch_details(1).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("could not be found"));
    }

    #[tokio::test]
    async fn test_decode_error() {
        let (base_url, _server) = serve_once("200 OK", r#"{"page": "one"}"#).await;
        let client = client_for(&base_url);

        let err = client.fetch_popular(1).await.unwrap_err();
        assert!(matches!(err, CatalogError::Decode(_)));
    }
}
