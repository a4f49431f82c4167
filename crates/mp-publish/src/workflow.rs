//! Publish workflow
//!
//! Token exchange, then optional feed post, then (only with an image URL)
//! photo post and Instagram cross-post. Every step aborts the run on
//! failure. Skipping the image steps or the cross-post is a normal,
//! successful completion.

use mp_core::PublishConfig;
use mp_graph::GraphClient;
use tracing::info;

use crate::error::{PublishStep, Result, WorkflowError};

/// Where the run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every configured step ran, including the Instagram cross-post
    Completed,
    /// No image URL configured
    SkippedImage,
    /// No Instagram account configured or linked to the Page
    SkippedInstagram,
}

/// Identifiers produced by a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub outcome: Outcome,
    pub text_post_id: Option<String>,
    pub photo_post_id: Option<String>,
    pub ig_user_id: Option<String>,
    pub ig_media_id: Option<String>,
}

impl PublishReport {
    fn new() -> Self {
        Self {
            outcome: Outcome::Completed,
            text_post_id: None,
            photo_post_id: None,
            ig_user_id: None,
            ig_media_id: None,
        }
    }
}

/// Single publish run over a Graph API client
pub struct PublishWorkflow {
    config: PublishConfig,
    client: GraphClient,
}

impl PublishWorkflow {
    pub fn new(config: PublishConfig, client: GraphClient) -> Self {
        Self { config, client }
    }

    /// Build the Graph client from the configuration's `graph` settings
    pub fn from_config(config: PublishConfig) -> Result<Self> {
        let client = GraphClient::new(&config.graph).map_err(|e| {
            WorkflowError::Configuration(format!("Failed to create HTTP client: {}", e))
        })?;
        Ok(Self::new(config, client))
    }

    /// Run every enabled step in order
    pub async fn run(&self) -> Result<PublishReport> {
        self.config.validate()?;

        let config = &self.config;
        let mut report = PublishReport::new();

        let page_token = self
            .client
            .page_access_token(&config.page_id, &config.system_token)
            .await
            .map_err(WorkflowError::Authentication)?;
        info!("Obtained Page access token for page {}", config.page_id);

        if config.text_post {
            let id = self
                .client
                .post_text(&config.page_id, &config.message, &page_token)
                .await
                .map_err(WorkflowError::publish(PublishStep::Feed))?;
            info!("FB text post OK: {}", id);
            report.text_post_id = Some(id);
        } else {
            info!("FB_TEXT_POST is false: skipping FB text post");
        }

        let Some(image_url) = config.image_url.as_deref().filter(|_| config.has_image()) else {
            info!("IMAGE_URL is empty: skipping FB photo and IG publish");
            report.outcome = Outcome::SkippedImage;
            return Ok(report);
        };

        let photo_id = self
            .client
            .post_photo(&config.page_id, image_url, &config.message, &page_token)
            .await
            .map_err(WorkflowError::publish(PublishStep::Photo))?;
        info!("FB photo post OK: {}", photo_id);
        report.photo_post_id = Some(photo_id);

        let ig_user_id = match config.ig_user_id.as_deref() {
            Some(id) => Some(id.to_string()),
            None => self
                .client
                .instagram_business_account(&config.page_id, &page_token)
                .await
                .map_err(WorkflowError::Lookup)?,
        };

        let Some(ig_user_id) = ig_user_id else {
            info!("No instagram_business_account connected to the Page: skipping IG publish");
            report.outcome = Outcome::SkippedInstagram;
            return Ok(report);
        };
        info!("Using IG user id: {}", ig_user_id);

        let creation_id = self
            .client
            .create_media_container(&ig_user_id, image_url, &config.message, &page_token)
            .await
            .map_err(WorkflowError::publish(PublishStep::MediaContainer))?;

        let media_id = self
            .client
            .publish_media_container(&ig_user_id, &creation_id, &page_token)
            .await
            .map_err(WorkflowError::publish(PublishStep::MediaPublish))?;
        info!("IG publish OK: {}", media_id);

        report.ig_user_id = Some(ig_user_id);
        report.ig_media_id = Some(media_id);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mp_core::{GraphConfig, SecretString};
    use serde_json::json;
    use wiremock::matchers::{any, body_string_contains, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> PublishConfig {
        PublishConfig {
            page_id: "123".to_string(),
            system_token: SecretString::from("sys-tok"),
            message: "hello".to_string(),
            image_url: None,
            ig_user_id: None,
            text_post: true,
            graph: GraphConfig {
                base_url: server.uri(),
                ..Default::default()
            },
        }
    }

    /// Error text with every source appended, as `{:#}` renders it in the binary
    fn full_message(err: &dyn std::error::Error) -> String {
        let mut message = err.to_string();
        let mut cause = err.source();
        while let Some(inner) = cause {
            message.push_str(": ");
            message.push_str(&inner.to_string());
            cause = inner.source();
        }
        message
    }

    fn workflow(config: PublishConfig) -> PublishWorkflow {
        PublishWorkflow::from_config(config).unwrap()
    }

    async fn mount_token(server: &MockServer, times: u64) {
        Mock::given(method("GET"))
            .and(path("/v25.0/123"))
            .and(query_param("fields", "access_token"))
            .and(query_param("access_token", "sys-tok"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"access_token": "page-tok", "id": "123"})),
            )
            .expect(times)
            .mount(server)
            .await;
    }

    async fn mount_feed(server: &MockServer, times: u64) {
        Mock::given(method("POST"))
            .and(path("/v25.0/123/feed"))
            .and(body_string_contains("access_token=page-tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "123_1"})))
            .expect(times)
            .mount(server)
            .await;
    }

    async fn mount_photo(server: &MockServer, times: u64) {
        Mock::given(method("POST"))
            .and(path("/v25.0/123/photos"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": "ph-1", "post_id": "123_2"})),
            )
            .expect(times)
            .mount(server)
            .await;
    }

    async fn mount_lookup(server: &MockServer, body: serde_json::Value, times: u64) {
        Mock::given(method("GET"))
            .and(path("/v25.0/123"))
            .and(query_param("fields", "instagram_business_account"))
            .and(query_param("access_token", "page-tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(times)
            .mount(server)
            .await;
    }

    async fn mount_instagram(server: &MockServer, ig_user_id: &str, times: u64) {
        Mock::given(method("POST"))
            .and(path(format!("/v25.0/{}/media", ig_user_id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "cr-1"})))
            .expect(times)
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path(format!("/v25.0/{}/media_publish", ig_user_id)))
            .and(body_string_contains("creation_id=cr-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "media-1"})))
            .expect(times)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_missing_credentials_make_no_calls() {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut no_page = config_for(&server);
        no_page.page_id = String::new();
        let err = workflow(no_page).run().await.unwrap_err();
        assert!(matches!(err, WorkflowError::Configuration(_)));

        let mut no_token = config_for(&server);
        no_token.system_token = SecretString::from("");
        let err = workflow(no_token).run().await.unwrap_err();
        assert!(matches!(err, WorkflowError::Configuration(_)));

        let mut zero_timeout = config_for(&server);
        zero_timeout.graph.timeout_secs = 0;
        let err = workflow(zero_timeout).run().await.unwrap_err();
        assert!(matches!(err, WorkflowError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_text_only_run() {
        let server = MockServer::start().await;
        mount_token(&server, 1).await;
        Mock::given(method("POST"))
            .and(path("/v25.0/123/feed"))
            .and(body_string_contains("message=hello"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "123_1"})))
            .expect(1)
            .mount(&server)
            .await;
        mount_photo(&server, 0).await;
        mount_lookup(&server, json!({}), 0).await;

        let report = workflow(config_for(&server)).run().await.unwrap();
        assert_eq!(report.outcome, Outcome::SkippedImage);
        assert_eq!(report.text_post_id.as_deref(), Some("123_1"));
        assert!(report.photo_post_id.is_none());
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_text_post_disabled_and_no_image() {
        let server = MockServer::start().await;
        mount_token(&server, 1).await;
        mount_feed(&server, 0).await;

        let mut config = config_for(&server);
        config.text_post = false;

        let report = workflow(config).run().await.unwrap();
        assert_eq!(report.outcome, Outcome::SkippedImage);
        assert!(report.text_post_id.is_none());
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_explicit_ig_id_skips_lookup() {
        let server = MockServer::start().await;
        mount_token(&server, 1).await;
        mount_feed(&server, 0).await;
        mount_photo(&server, 1).await;
        mount_lookup(&server, json!({"instagram_business_account": {"id": "other"}}), 0).await;
        mount_instagram(&server, "ig-9", 1).await;

        let mut config = config_for(&server);
        config.message = "hi".to_string();
        config.image_url = Some("http://img/x.jpg".to_string());
        config.text_post = false;
        config.ig_user_id = Some("ig-9".to_string());

        let report = workflow(config).run().await.unwrap();
        assert_eq!(report.outcome, Outcome::Completed);
        assert_eq!(report.photo_post_id.as_deref(), Some("123_2"));
        assert_eq!(report.ig_user_id.as_deref(), Some("ig-9"));
        assert_eq!(report.ig_media_id.as_deref(), Some("media-1"));
    }

    #[tokio::test]
    async fn test_linked_account_is_looked_up() {
        let server = MockServer::start().await;
        mount_token(&server, 1).await;
        mount_feed(&server, 1).await;
        mount_photo(&server, 1).await;
        mount_lookup(&server, json!({"instagram_business_account": {"id": "ig-1"}}), 1).await;
        mount_instagram(&server, "ig-1", 1).await;

        let mut config = config_for(&server);
        config.image_url = Some("http://img/x.jpg".to_string());

        let report = workflow(config).run().await.unwrap();
        assert_eq!(report.outcome, Outcome::Completed);
        assert_eq!(report.text_post_id.as_deref(), Some("123_1"));
        assert_eq!(report.ig_user_id.as_deref(), Some("ig-1"));
    }

    #[tokio::test]
    async fn test_unlinked_page_skips_cross_post() {
        let server = MockServer::start().await;
        mount_token(&server, 1).await;
        mount_feed(&server, 1).await;
        mount_photo(&server, 1).await;
        mount_lookup(&server, json!({"id": "123"}), 1).await;
        Mock::given(method("POST"))
            .and(path("/v25.0/ig-1/media"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "cr-1"})))
            .expect(0)
            .mount(&server)
            .await;

        let mut config = config_for(&server);
        config.image_url = Some("http://img/x.jpg".to_string());

        let report = workflow(config).run().await.unwrap();
        assert_eq!(report.outcome, Outcome::SkippedInstagram);
        assert_eq!(report.photo_post_id.as_deref(), Some("123_2"));
        assert!(report.ig_media_id.is_none());
    }

    #[tokio::test]
    async fn test_missing_access_token_is_authentication_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v25.0/123"))
            .and(query_param("fields", "access_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "123"})))
            .expect(1)
            .mount(&server)
            .await;
        mount_feed(&server, 0).await;

        let mut config = config_for(&server);
        config.image_url = Some("http://img/x.jpg".to_string());

        let err = workflow(config).run().await.unwrap_err();
        assert!(matches!(err, WorkflowError::Authentication(_)));
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_photo_error_stops_before_instagram() {
        let server = MockServer::start().await;
        mount_token(&server, 1).await;
        mount_feed(&server, 1).await;
        Mock::given(method("POST"))
            .and(path("/v25.0/123/photos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"error": {"message": "Invalid image URL", "code": 324}}),
            ))
            .expect(1)
            .mount(&server)
            .await;
        mount_lookup(&server, json!({"instagram_business_account": {"id": "ig-1"}}), 0).await;
        mount_instagram(&server, "ig-9", 0).await;

        let mut config = config_for(&server);
        config.image_url = Some("http://img/x.jpg".to_string());
        config.ig_user_id = Some("ig-9".to_string());

        let err = workflow(config).run().await.unwrap_err();
        match &err {
            WorkflowError::Publish { step, .. } => assert_eq!(*step, PublishStep::Photo),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(full_message(&err).contains("Invalid image URL"));
    }

    #[tokio::test]
    async fn test_feed_error_is_publish_error() {
        let server = MockServer::start().await;
        mount_token(&server, 1).await;
        Mock::given(method("POST"))
            .and(path("/v25.0/123/feed"))
            .respond_with(
                ResponseTemplate::new(403).set_body_json(json!({"error": {"code": 200}})),
            )
            .expect(1)
            .mount(&server)
            .await;
        mount_photo(&server, 0).await;

        let mut config = config_for(&server);
        config.image_url = Some("http://img/x.jpg".to_string());

        let err = workflow(config).run().await.unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::Publish {
                step: PublishStep::Feed,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_lookup_error() {
        let server = MockServer::start().await;
        mount_token(&server, 1).await;
        mount_feed(&server, 1).await;
        mount_photo(&server, 1).await;
        Mock::given(method("GET"))
            .and(path("/v25.0/123"))
            .and(query_param("fields", "instagram_business_account"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"error": {"code": 100}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let mut config = config_for(&server);
        config.image_url = Some("http://img/x.jpg".to_string());

        let err = workflow(config).run().await.unwrap_err();
        assert!(matches!(err, WorkflowError::Lookup(_)));
    }

    #[tokio::test]
    async fn test_container_without_id_stops_before_publish() {
        let server = MockServer::start().await;
        mount_token(&server, 1).await;
        mount_photo(&server, 1).await;
        Mock::given(method("POST"))
            .and(path("/v25.0/ig-9/media"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v25.0/ig-9/media_publish"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "media-1"})))
            .expect(0)
            .mount(&server)
            .await;

        let mut config = config_for(&server);
        config.text_post = false;
        config.image_url = Some("http://img/x.jpg".to_string());
        config.ig_user_id = Some("ig-9".to_string());

        let err = workflow(config).run().await.unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::Publish {
                step: PublishStep::MediaContainer,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_errors_do_not_leak_tokens() {
        let server = MockServer::start().await;
        mount_token(&server, 1).await;
        Mock::given(method("POST"))
            .and(path("/v25.0/123/feed"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
            .mount(&server)
            .await;

        let err = workflow(config_for(&server)).run().await.unwrap_err();
        let message = full_message(&err);
        assert!(message.contains("Internal Server Error"));
        assert!(!message.contains("sys-tok"));
        assert!(!message.contains("page-tok"));
    }
}
