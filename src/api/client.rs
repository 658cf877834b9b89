use super::error::ApiError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Report builder API client with connection pooling.
#[derive(Clone)]
pub struct ReportClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl ReportClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("investor-report-cli/1.0")
            .build()
            .expect("Failed to build HTTP client");

        Self {
            base_url: normalize_base(base_url.into()),
            http_client,
        }
    }

    /// Create a client with custom HTTP client configuration.
    pub fn with_custom_client(base_url: impl Into<String>, http_client: reqwest::Client) -> Self {
        Self {
            base_url: normalize_base(base_url.into()),
            http_client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Join path segments onto the base URL, percent-encoding each segment.
    /// Project and component names may contain spaces and non-ASCII letters.
    pub(crate) fn url(&self, segments: &[&str]) -> String {
        let mut url = self.base_url.clone();
        for segment in segments {
            url.push('/');
            url.push_str(&urlencoding::encode(segment));
        }
        url
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T, ApiError> {
        let response = self.http_client.get(&url).send().await?;
        Self::decode(response).await
    }

    pub(crate) async fn get_bytes(&self, url: String) -> Result<Vec<u8>, ApiError> {
        let response = self.http_client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(ApiError::from_response(response).await);
        }
        Ok(response.bytes().await?.to_vec())
    }

    pub(crate) async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        url: String,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self.http_client.post(&url).json(body).send().await?;
        Self::decode(response).await
    }

    pub(crate) async fn post_multipart<T: DeserializeOwned>(
        &self,
        url: String,
        form: reqwest::multipart::Form,
    ) -> Result<T, ApiError> {
        let response = self.http_client.post(&url).multipart(form).send().await?;
        Self::decode(response).await
    }

    pub(crate) async fn delete_json<T: DeserializeOwned>(&self, url: String) -> Result<T, ApiError> {
        let response = self.http_client.delete(&url).send().await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        if !response.status().is_success() {
            return Err(ApiError::from_response(response).await);
        }
        response.json::<T>().await.map_err(ApiError::transport)
    }
}

fn normalize_base(mut base: String) -> String {
    while base.ends_with('/') {
        base.pop();
    }
    base
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_encodes_path_segments() {
        let client = ReportClient::new("http://localhost:8000/");
        assert_eq!(
            client.url(&["project", "Green Valley", "report", "active"]),
            "http://localhost:8000/project/Green%20Valley/report/active"
        );
    }
}
