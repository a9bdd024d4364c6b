use crate::config::AppConfig;
use crate::error::{AppError, ClassifyError};
use crate::models::classify_types::ClassificationResult;
use reqwest::multipart::{Form, Part};
use reqwest::Url;

pub const FILE_FIELD: &str = "file";
pub const UPLOAD_FILE_NAME: &str = "signature.jpg";
pub const UPLOAD_MIME: &str = "image/jpeg";

/// HTTP client for the remote signature classification service.
#[derive(Clone)]
pub struct ClassifierClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl ClassifierClient {
    pub fn new(config: &AppConfig) -> Result<Self, AppError> {
        let endpoint = Url::parse(&config.endpoint).map_err(|e| AppError {
            message: format!("Invalid endpoint {:?}: {}", config.endpoint, e),
        })?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Upload one JPEG and parse the service's verdict.
    ///
    /// Single attempt, no retries.
    pub async fn classify(&self, jpeg: Vec<u8>) -> Result<ClassificationResult, ClassifyError> {
        let part = Part::bytes(jpeg)
            .file_name(UPLOAD_FILE_NAME)
            .mime_str(UPLOAD_MIME)
            .map_err(|e| ClassifyError::Request(e.to_string()))?;
        let form = Form::new().part(FILE_FIELD, part);

        let response = self
            .http
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|e| ClassifyError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            log::warn!("Classification service answered HTTP {}", status);
            return Err(ClassifyError::ServerResponse);
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ClassifyError::Request(e.to_string()))?;
        if body.is_empty() {
            log::warn!("Classification service returned an empty body");
            return Err(ClassifyError::ServerResponse);
        }

        serde_json::from_slice(&body).map_err(|e| ClassifyError::Malformed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header_regex, method, path};
    use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

    const GENUINE_BODY: &str = r#"{"predicted_class":{"class":"genuine","probability":0.92},"probabilities":[{"class":"genuine","probability":0.92},{"class":"forged","probability":0.08}]}"#;

    struct SignatureUpload;

    impl Match for SignatureUpload {
        fn matches(&self, request: &Request) -> bool {
            let body = String::from_utf8_lossy(&request.body).to_ascii_lowercase();
            body.contains(r#"name="file"; filename="signature.jpg""#)
                && body.contains("content-type: image/jpeg")
        }
    }

    fn client_for(endpoint: String) -> ClassifierClient {
        let config = AppConfig {
            endpoint,
            ..AppConfig::default()
        };
        ClassifierClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn posts_multipart_and_parses_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/classify-signature/"))
            .and(header_regex("content-type", "^multipart/form-data; boundary="))
            .and(SignatureUpload)
            .respond_with(ResponseTemplate::new(200).set_body_string(GENUINE_BODY))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(format!("{}/classify-signature/", server.uri()));
        let result = client.classify(vec![0xFF, 0xD8, 0xFF, 0xD9]).await.unwrap();

        assert_eq!(result.predicted_class.class_name, "genuine");
        assert_eq!(result.probabilities.len(), 2);
    }

    #[tokio::test]
    async fn server_error_maps_to_server_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string(GENUINE_BODY))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(server.uri());
        let err = client.classify(vec![1, 2, 3]).await.unwrap_err();
        assert_eq!(err, ClassifyError::ServerResponse);
        assert_eq!(err.to_string(), "Server response error");
    }

    #[tokio::test]
    async fn empty_body_maps_to_server_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = client_for(server.uri());
        assert_eq!(
            client.classify(vec![1]).await.unwrap_err(),
            ClassifyError::ServerResponse
        );
    }

    #[tokio::test]
    async fn malformed_json_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"predicted_class":"#))
            .mount(&server)
            .await;

        let client = client_for(server.uri());
        let err = client.classify(vec![1]).await.unwrap_err();
        assert!(matches!(err, ClassifyError::Malformed(_)));
        assert!(err.to_string().starts_with("Error processing response: "));
    }

    #[tokio::test]
    async fn connection_refused_is_a_request_exception() {
        // Reserve a port, then free it so nothing is listening.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = client_for(format!("http://127.0.0.1:{}/classify-signature/", port));
        let err = client.classify(vec![1]).await.unwrap_err();

        match &err {
            ClassifyError::Request(msg) => {
                assert!(!msg.is_empty());
                assert_eq!(err.to_string(), format!("Request exception: {}", msg));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn rejects_invalid_endpoint() {
        let config = AppConfig {
            endpoint: "not a url".to_string(),
            ..AppConfig::default()
        };
        assert!(ClassifierClient::new(&config).is_err());
    }
}
