use super::client::OpenAiHttpClient;
use super::types::{ImageGenerationRequest, ImageGenerationResponse};
use crate::ai::{ImageGenerationService, ImageOutput};
use crate::{Error, Result};
use async_trait::async_trait;

pub struct OpenAiImageClient {
    http: OpenAiHttpClient,
    model: String,
}

impl OpenAiImageClient {
    pub fn new(http: OpenAiHttpClient, model: String) -> Self {
        Self { http, model }
    }
}

#[async_trait]
impl ImageGenerationService for OpenAiImageClient {
    async fn generate_image(&self, prompt: &str) -> Result<ImageOutput> {
        let request = ImageGenerationRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            n: 1,
        };

        let response: ImageGenerationResponse =
            self.http.post("/v1/images/generations", &request).await?;

        let image_data = response
            .data
            .into_iter()
            .next()
            .ok_or_else(|| Error::NoResponse("No image data in OpenAI response".to_string()))?;

        if let Some(url) = image_data.url {
            Ok(ImageOutput::Url(url))
        } else if let Some(b64_json) = image_data.b64_json {
            Ok(ImageOutput::Inline(b64_json))
        } else {
            Err(Error::NoResponse(
                "No image data (neither URL nor base64) in response".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::ApiKeys;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> OpenAiImageClient {
        let keys = ApiKeys {
            api_key: "key".to_string(),
            organization: String::new(),
        };
        let http = OpenAiHttpClient::new(&keys, &server.uri(), None).unwrap();
        OpenAiImageClient::new(http, "dall-e-2".to_string())
    }

    #[tokio::test]
    async fn test_generate_image_returns_url() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/images/generations"))
            .and(body_partial_json(serde_json::json!({
                "model": "dall-e-2",
                "prompt": "a lighthouse in fog"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{ "url": "https://images.example.com/lighthouse.png" }]
            })))
            .mount(&server)
            .await;

        let output = client_for(&server)
            .generate_image("a lighthouse in fog")
            .await
            .unwrap();
        assert_eq!(
            output,
            ImageOutput::Url("https://images.example.com/lighthouse.png".to_string())
        );
    }

    #[tokio::test]
    async fn test_generate_image_handles_b64_response() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/images/generations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{ "b64_json": "iVBORw0KGgo=" }]
            })))
            .mount(&server)
            .await;

        let output = client_for(&server).generate_image("a dream").await.unwrap();
        assert_eq!(output, ImageOutput::Inline("iVBORw0KGgo=".to_string()));
    }

    #[tokio::test]
    async fn test_generate_image_empty_data() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/images/generations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "data": [] })))
            .mount(&server)
            .await;

        let err = client_for(&server).generate_image("a dream").await.unwrap_err();
        assert!(matches!(err, Error::NoResponse(_)));
    }

    #[tokio::test]
    async fn test_generate_image_api_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/images/generations"))
            .respond_with(ResponseTemplate::new(500).set_body_string("server error"))
            .mount(&server)
            .await;

        let err = client_for(&server).generate_image("a dream").await.unwrap_err();
        assert!(matches!(err, Error::AiProvider(_)));
    }
}
