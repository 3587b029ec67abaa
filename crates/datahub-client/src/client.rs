// Typed DataHub client over the service's signed HTTP/JSON API.
use chrono::Utc;
use datahub_common::auth::{self, Credentials};
use datahub_common::{
    CreateProjectRequest, CreateSubscriptionRequest, CreateSubscriptionResult, CreateTopicRequest,
    DATE_HEADER, ErrorCode, ListProjectResult, ListSubscriptionResult, ListTopicResult, Project,
    REQUEST_ID_HEADER, RecordSchema, RecordType, Subscription, SubscriptionState, Topic,
    UpdateProjectRequest, UpdateSubscriptionRequest, UpdateSubscriptionStateRequest,
};
use reqwest::header::AUTHORIZATION;
use reqwest::{Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use std::sync::Arc;

use crate::config::ClientConfig;
use crate::error::{DatahubError, Result, ServiceError, error_from_parts};

const USER_AGENT: &str = concat!("datahub-rust-sdk/", env!("CARGO_PKG_VERSION"));

/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct DatahubClient {
    endpoint: Url,
    credentials: Arc<Credentials>,
    http: reqwest::Client,
}

impl DatahubClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let endpoint = Url::parse(config.endpoint.trim()).map_err(|err| {
            DatahubError::Config(format!("invalid endpoint {}: {err}", config.endpoint))
        })?;
        if endpoint.cannot_be_a_base() {
            return Err(DatahubError::Config(format!(
                "endpoint cannot carry paths: {}",
                config.endpoint
            )));
        }
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            endpoint,
            credentials: Arc::new(config.credentials()),
            http,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn access_id(&self) -> &str {
        &self.credentials.access_id
    }

    pub async fn create_project(&self, project: &str, comment: &str) -> Result<()> {
        let url = self.url(&["projects", require("project", project)?])?;
        let body = CreateProjectRequest {
            comment: comment.to_string(),
        };
        self.send("create_project", self.signed(Method::POST, url).json(&body))
            .await?;
        Ok(())
    }

    pub async fn get_project(&self, project: &str) -> Result<Project> {
        let url = self.url(&["projects", require("project", project)?])?;
        let response = self
            .send("get_project", self.signed(Method::GET, url))
            .await?;
        decode(response).await
    }

    pub async fn list_project(&self) -> Result<ListProjectResult> {
        let url = self.url(&["projects"])?;
        let response = self
            .send("list_project", self.signed(Method::GET, url))
            .await?;
        decode(response).await
    }

    pub async fn update_project(&self, project: &str, comment: &str) -> Result<()> {
        let url = self.url(&["projects", require("project", project)?])?;
        let body = UpdateProjectRequest {
            comment: comment.to_string(),
        };
        self.send("update_project", self.signed(Method::PUT, url).json(&body))
            .await?;
        Ok(())
    }

    pub async fn delete_project(&self, project: &str) -> Result<()> {
        let url = self.url(&["projects", require("project", project)?])?;
        self.send("delete_project", self.signed(Method::DELETE, url))
            .await?;
        Ok(())
    }

    pub async fn create_tuple_topic(
        &self,
        project: &str,
        topic: &str,
        shard_count: u32,
        life_cycle: u32,
        record_schema: &RecordSchema,
        comment: &str,
    ) -> Result<()> {
        record_schema.validate()?;
        let body = CreateTopicRequest {
            shard_count,
            lifecycle: life_cycle,
            record_type: RecordType::Tuple,
            record_schema: Some(record_schema.clone()),
            comment: comment.to_string(),
        };
        self.create_topic(project, topic, &body).await
    }

    pub async fn create_blob_topic(
        &self,
        project: &str,
        topic: &str,
        shard_count: u32,
        life_cycle: u32,
        comment: &str,
    ) -> Result<()> {
        let body = CreateTopicRequest {
            shard_count,
            lifecycle: life_cycle,
            record_type: RecordType::Blob,
            record_schema: None,
            comment: comment.to_string(),
        };
        self.create_topic(project, topic, &body).await
    }

    async fn create_topic(&self, project: &str, topic: &str, body: &CreateTopicRequest) -> Result<()> {
        let url = self.topic_url(project, topic, &[])?;
        self.send("create_topic", self.signed(Method::POST, url).json(body))
            .await?;
        Ok(())
    }

    pub async fn get_topic(&self, project: &str, topic: &str) -> Result<Topic> {
        let url = self.topic_url(project, topic, &[])?;
        let response = self.send("get_topic", self.signed(Method::GET, url)).await?;
        decode(response).await
    }

    pub async fn list_topic(&self, project: &str) -> Result<ListTopicResult> {
        let url = self.url(&["projects", require("project", project)?, "topics"])?;
        let response = self
            .send("list_topic", self.signed(Method::GET, url))
            .await?;
        decode(response).await
    }

    pub async fn delete_topic(&self, project: &str, topic: &str) -> Result<()> {
        let url = self.topic_url(project, topic, &[])?;
        self.send("delete_topic", self.signed(Method::DELETE, url))
            .await?;
        Ok(())
    }

    pub async fn create_subscription(
        &self,
        project: &str,
        topic: &str,
        comment: &str,
    ) -> Result<CreateSubscriptionResult> {
        let url = self.topic_url(project, topic, &["subscriptions"])?;
        let body = CreateSubscriptionRequest {
            comment: comment.to_string(),
        };
        let response = self
            .send(
                "create_subscription",
                self.signed(Method::POST, url).json(&body),
            )
            .await?;
        decode(response).await
    }

    pub async fn get_subscription(
        &self,
        project: &str,
        topic: &str,
        sub_id: &str,
    ) -> Result<Subscription> {
        let url = self.subscription_url(project, topic, sub_id, &[])?;
        let response = self
            .send("get_subscription", self.signed(Method::GET, url))
            .await?;
        decode(response).await
    }

    pub async fn update_subscription(
        &self,
        project: &str,
        topic: &str,
        sub_id: &str,
        comment: &str,
    ) -> Result<()> {
        let url = self.subscription_url(project, topic, sub_id, &[])?;
        let body = UpdateSubscriptionRequest {
            comment: comment.to_string(),
        };
        self.send(
            "update_subscription",
            self.signed(Method::PUT, url).json(&body),
        )
        .await?;
        Ok(())
    }

    pub async fn update_subscription_state(
        &self,
        project: &str,
        topic: &str,
        sub_id: &str,
        state: SubscriptionState,
    ) -> Result<()> {
        let url = self.subscription_url(project, topic, sub_id, &["state"])?;
        let body = UpdateSubscriptionStateRequest { state };
        self.send(
            "update_subscription_state",
            self.signed(Method::PUT, url).json(&body),
        )
        .await?;
        Ok(())
    }

    /// List subscriptions of a topic, one page at a time.
    ///
    /// `page_index` starts at 1. Out-of-range pagination is left for the
    /// service to reject with `InvalidParameter`.
    pub async fn list_subscription(
        &self,
        project: &str,
        topic: &str,
        filter: &str,
        page_index: i64,
        page_size: i64,
    ) -> Result<ListSubscriptionResult> {
        let url = self.topic_url(project, topic, &["subscriptions"])?;
        let query = [
            ("search", filter.to_string()),
            ("pageIndex", page_index.to_string()),
            ("pageSize", page_size.to_string()),
        ];
        let response = self
            .send(
                "list_subscription",
                self.signed(Method::GET, url).query(&query),
            )
            .await?;
        decode(response).await
    }

    pub async fn delete_subscription(&self, project: &str, topic: &str, sub_id: &str) -> Result<()> {
        let url = self.subscription_url(project, topic, sub_id, &[])?;
        self.send("delete_subscription", self.signed(Method::DELETE, url))
            .await?;
        Ok(())
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| DatahubError::Config(format!("invalid endpoint {}", self.endpoint)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn topic_url(&self, project: &str, topic: &str, tail: &[&str]) -> Result<Url> {
        let mut segments = vec![
            "projects",
            require("project", project)?,
            "topics",
            require("topic", topic)?,
        ];
        segments.extend_from_slice(tail);
        self.url(&segments)
    }

    fn subscription_url(
        &self,
        project: &str,
        topic: &str,
        sub_id: &str,
        tail: &[&str],
    ) -> Result<Url> {
        let mut segments = vec![
            "projects",
            require("project", project)?,
            "topics",
            require("topic", topic)?,
            "subscriptions",
            require("sub_id", sub_id)?,
        ];
        segments.extend_from_slice(tail);
        self.url(&segments)
    }

    // Sign over method, path and date; the body is not covered.
    fn signed(&self, method: Method, url: Url) -> RequestBuilder {
        let date = auth::http_date(Utc::now());
        let authorization = self
            .credentials
            .authorization(method.as_str(), url.path(), &date);
        self.http
            .request(method, url)
            .header(DATE_HEADER, date)
            .header(AUTHORIZATION, authorization)
    }

    async fn send(&self, op: &'static str, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();
        let request_id = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        if status.is_success() {
            tracing::debug!(op, %status, request_id = ?request_id, "datahub request succeeded");
            return Ok(response);
        }
        let body = response.bytes().await?;
        let err = error_from_parts(status, request_id, &body);
        tracing::debug!(op, %status, error = %err, "datahub request failed");
        Err(err)
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|err| DatahubError::Decode(err.to_string()))
}

// Empty names would address a different route, so reject them before sending.
fn require<'a>(what: &str, value: &'a str) -> Result<&'a str> {
    if value.is_empty() {
        return Err(DatahubError::InvalidParameter(ServiceError {
            status: 400,
            code: ErrorCode::InvalidParameter.as_str().to_string(),
            message: format!("{what} must not be empty"),
            request_id: None,
        }));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(endpoint: &str) -> DatahubClient {
        DatahubClient::new(&ClientConfig::new("test_id", "test_key", endpoint)).expect("client")
    }

    #[test]
    fn new_requires_complete_config() {
        let err = DatahubClient::new(&ClientConfig::new("id", "key", ""))
            .err()
            .expect("incomplete");
        assert!(matches!(err, DatahubError::Config(_)));
    }

    #[test]
    fn new_rejects_unparseable_endpoint() {
        let err = DatahubClient::new(&ClientConfig::new("id", "key", "not a url"))
            .err()
            .expect("bad endpoint");
        assert!(err.to_string().contains("invalid endpoint"));
    }

    #[test]
    fn urls_append_to_endpoint_path() {
        let root = client("http://127.0.0.1:8080/");
        let url = root
            .subscription_url("p1", "t1", "abc", &["state"])
            .expect("url");
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:8080/projects/p1/topics/t1/subscriptions/abc/state"
        );

        let prefixed = client("http://gateway.local/datahub");
        let url = prefixed.topic_url("p1", "t1", &[]).expect("url");
        assert_eq!(url.path(), "/datahub/projects/p1/topics/t1");
    }

    #[test]
    fn empty_names_are_invalid_parameters() {
        let client = client("http://127.0.0.1:8080");
        let err = client.topic_url("", "t1", &[]).expect_err("empty project");
        assert!(err.is_invalid_parameter());
        assert!(err.to_string().contains("project must not be empty"));
    }

    #[test]
    fn signed_requests_carry_auth_headers() {
        let client = client("http://127.0.0.1:8080");
        let url = client.url(&["projects", "p1"]).expect("url");
        let request = client
            .signed(Method::DELETE, url)
            .build()
            .expect("request");
        let date = request
            .headers()
            .get(DATE_HEADER)
            .and_then(|value| value.to_str().ok())
            .expect("date header");
        let authorization = request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .expect("authorization header");
        let caller = auth::verify_request(
            |id| (id == "test_id").then(|| "test_key".to_string()),
            "DELETE",
            "/projects/p1",
            Some(authorization),
            Some(date),
            Utc::now(),
        )
        .expect("verifies");
        assert_eq!(caller, "test_id");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_transport_error() {
        let mut config = ClientConfig::new("id", "key", "http://127.0.0.1:1");
        config.request_timeout = std::time::Duration::from_millis(500);
        let client = DatahubClient::new(&config).expect("client");
        let err = client.list_project().await.expect_err("no server");
        assert!(matches!(err, DatahubError::Transport(_)));
    }
}
