use std::time::Duration;

use {
    async_trait::async_trait,
    serde::Deserialize,
    tracing::{debug, warn},
};

#[cfg(feature = "metrics")]
use paperbot_metrics::{counter, histogram, labels, repository as repo_metrics};

use crate::{
    Error, Result,
    types::{DocumentDetail, DocumentSummary, SearchResultSet, null_as_default},
};

/// Search and detail lookups against the document repository.
#[async_trait]
pub trait RepositoryApi: Send + Sync {
    /// Run a keyword search.
    async fn search(&self, keyword: &str) -> Result<SearchResultSet>;

    /// Fetch the full record of the document whose repository page is `url`.
    async fn detail(&self, url: &str) -> Result<DocumentDetail>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    data: Vec<DocumentSummary>,
    #[serde(default)]
    count: Option<u64>,
    #[serde(default)]
    total: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct DetailResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<DocumentDetail>,
}

/// HTTP implementation of [`RepositoryApi`].
pub struct RepositoryClient {
    base_url: String,
    client: reqwest::Client,
}

impl RepositoryClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(base_url, client))
    }

    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        operation: &'static str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        #[cfg(feature = "metrics")]
        let start = std::time::Instant::now();
        #[cfg(feature = "metrics")]
        counter!(repo_metrics::REQUESTS_TOTAL, labels::OPERATION => operation).increment(1);

        let result = self.send(operation, query).await;

        #[cfg(feature = "metrics")]
        {
            histogram!(repo_metrics::REQUEST_DURATION_SECONDS, labels::OPERATION => operation)
                .record(start.elapsed().as_secs_f64());
            if result.is_err() {
                counter!(repo_metrics::ERRORS_TOTAL, labels::OPERATION => operation).increment(1);
            }
        }

        result
    }

    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        operation: &'static str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let url = format!("{}/{operation}", self.base_url);
        let resp = self.client.get(&url).query(query).send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            warn!(operation, status = status.as_u16(), body = %body, "repository API error");
            return Err(Error::Status {
                status: status.as_u16(),
                body,
            });
        }

        debug!(operation, bytes = body.len(), "repository API response");
        Ok(serde_json::from_str(&body)?)
    }
}

fn check_status(status: &str, message: Option<String>) -> Result<()> {
    if status == "success" {
        Ok(())
    } else {
        Err(Error::Api {
            message: message.unwrap_or_else(|| format!("status {status:?}")),
        })
    }
}

#[async_trait]
impl RepositoryApi for RepositoryClient {
    async fn search(&self, keyword: &str) -> Result<SearchResultSet> {
        debug!(keyword, "searching repository");
        let resp: SearchResponse = self.get_json("search", &[("q", keyword)]).await?;
        check_status(&resp.status, resp.message)?;

        let returned = resp.count.unwrap_or(resp.data.len() as u64);
        Ok(SearchResultSet {
            keyword: keyword.to_string(),
            returned_count: returned,
            total_count: resp.total.unwrap_or(returned),
            items: resp.data,
        })
    }

    async fn detail(&self, url: &str) -> Result<DocumentDetail> {
        debug!(url, "fetching document detail");
        let resp: DetailResponse = self.get_json("detail", &[("url", url)]).await?;
        check_status(&resp.status, resp.message)?;
        resp.data.ok_or_else(|| Error::Api {
            message: "response has no data".into(),
        })
    }
}

/// Stand-in used when no repository URL is configured.
pub struct UnconfiguredRepository;

#[async_trait]
impl RepositoryApi for UnconfiguredRepository {
    async fn search(&self, _keyword: &str) -> Result<SearchResultSet> {
        Err(Error::NotConfigured)
    }

    async fn detail(&self, _url: &str) -> Result<DocumentDetail> {
        Err(Error::NotConfigured)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, mockito::Matcher};

    fn client_for(server: &mockito::Server) -> RepositoryClient {
        RepositoryClient::new(server.url(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn search_parses_success_response() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/search")
            .match_query(Matcher::UrlEncoded("q".into(), "pendidikan islam".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "status": "success",
                    "data": [
                        {
                            "title": "T1",
                            "authors": ["A. Author"],
                            "year": "2020",
                            "url": "https://repo.example/1/",
                            "download_links": ["https://repo.example/1/1/t1.pdf"]
                        }
                    ],
                    "count": 1,
                    "total": 12
                }"#,
            )
            .create_async()
            .await;

        let results = client_for(&server)
            .search("pendidikan islam")
            .await
            .unwrap();
        mock.assert_async().await;

        assert_eq!(results.keyword, "pendidikan islam");
        assert_eq!(results.len(), 1);
        assert_eq!(results.returned_count, 1);
        assert_eq!(results.total_count, 12);
        assert_eq!(results.items[0].title, "T1");
        assert_eq!(
            results.items[0].primary_download().unwrap().url,
            "https://repo.example/1/1/t1.pdf"
        );
    }

    #[tokio::test]
    async fn search_keeps_hits_with_null_fields() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/search")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                r#"{
                    "status": "success",
                    "data": [
                        {"title": null, "authors": null, "year": 2019, "url": null},
                        {"title": "T2", "url": "https://repo.example/2/"}
                    ]
                }"#,
            )
            .create_async()
            .await;

        let results = client_for(&server).search("islam").await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results.items[0].title, "");
        assert_eq!(results.items[0].year, "2019");
        assert!(results.items[0].authors.is_empty());
        assert_eq!(results.items[1].title, "T2");
    }

    #[tokio::test]
    async fn search_rejects_non_success_status_field() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/search")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"status": "error", "message": "index offline"}"#)
            .create_async()
            .await;

        let err = client_for(&server).search("x").await.unwrap_err();
        match err {
            Error::Api { message } => assert_eq!(message, "index offline"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn search_reports_http_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/search")
            .match_query(Matcher::Any)
            .with_status(502)
            .with_body("bad gateway")
            .create_async()
            .await;

        let err = client_for(&server).search("x").await.unwrap_err();
        assert!(matches!(err, Error::Status { status: 502, .. }));
    }

    #[tokio::test]
    async fn detail_passes_url_as_query_parameter() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/detail")
            .match_query(Matcher::UrlEncoded(
                "url".into(),
                "https://repo.example/1023/".into(),
            ))
            .with_status(200)
            .with_body(
                r#"{
                    "status": "success",
                    "data": {
                        "title": "Detail Title",
                        "abstract": "An abstract.",
                        "metadata": {"Penulis": "X; Y", "Tahun Terbit": "2019"},
                        "download_links": [{"label": "PDF", "url": "https://repo.example/1023/1/a.pdf"}]
                    }
                }"#,
            )
            .create_async()
            .await;

        let detail = client_for(&server)
            .detail("https://repo.example/1023/")
            .await
            .unwrap();
        mock.assert_async().await;

        assert_eq!(detail.title, "Detail Title");
        assert_eq!(detail.download_links[0].label.as_deref(), Some("PDF"));
        assert_eq!(detail.year("Tahun Terbit"), Some("2019"));
    }

    #[tokio::test]
    async fn detail_without_data_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/detail")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"status": "success"}"#)
            .create_async()
            .await;

        let err = client_for(&server).detail("u").await.unwrap_err();
        assert!(matches!(err, Error::Api { .. }));
    }

    #[tokio::test]
    async fn malformed_body_is_decode_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/search")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create_async()
            .await;

        let err = client_for(&server).search("x").await.unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[tokio::test]
    async fn unconfigured_repository_always_fails() {
        let repo = UnconfiguredRepository;
        assert!(matches!(
            repo.search("x").await.unwrap_err(),
            Error::NotConfigured
        ));
    }
}
