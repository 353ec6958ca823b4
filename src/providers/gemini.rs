use crate::core::insight::{InsightProvider, InsightRequest, SuggestionRequest};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, error, instrument};

pub struct GeminiProvider {
    base_url: String,
    model: String,
    api_key: String,
    language: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(base_url: &str, model: &str, api_key: &str, language: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("splitledger/0.1")
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
            language: language.to_string(),
            client,
        })
    }

    async fn generate(&self, body: Value) -> Result<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        debug!("Requesting content from {}", url);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} URL: {}", e, url))?
            .error_for_status()
            .context("Model request was rejected")?;

        let response_text = response
            .text()
            .await
            .context("Failed to get response text")?;
        let data: GenerateContentResponse = match serde_json::from_str(&response_text) {
            Ok(data) => data,
            Err(e) => {
                error!(
                    error = ?e,
                    response = %response_text,
                    "Failed to parse model response"
                );
                return Err(e).context("Failed to parse model response");
            }
        };

        data.text()
            .ok_or_else(|| anyhow!("Model response contained no text"))
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateContentResponse {
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        Some(text)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Suggestions {
    #[serde(default)]
    suggested_tag_ids: Vec<String>,
}

fn text_body(prompt: String) -> Value {
    json!({ "contents": [{ "parts": [{ "text": prompt }] }] })
}

#[async_trait]
impl InsightProvider for GeminiProvider {
    #[instrument(name = "GeminiSummarize", skip_all, fields(items = request.items.len()))]
    async fn summarize(&self, request: &InsightRequest) -> Result<String> {
        let data = serde_json::to_string(&request.items)?;
        let prompt = format!(
            "Analyze these recent transactions and give a very brief, friendly financial \
             health summary (max 2 sentences) in {}. Focus on where the money is going most. \
             Data: {data}",
            self.language
        );
        self.generate(text_body(prompt)).await
    }

    #[instrument(name = "GeminiSuggestTags", skip_all)]
    async fn suggest_tags(&self, request: &SuggestionRequest) -> Result<Vec<String>> {
        let available = serde_json::to_string(&request.available_tags)?;
        let prompt = format!(
            "You are an accounting assistant. Analyze the transaction description: \"{}\".\n\
             Select the most appropriate tag IDs from the available list.\n\
             Try to select one tag for each tag group if applicable.\n\n\
             Available Tags: {available}",
            request.description
        );
        let mut body = text_body(prompt);
        body["generationConfig"] = json!({
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "OBJECT",
                "properties": {
                    "suggestedTagIds": { "type": "ARRAY", "items": { "type": "STRING" } }
                }
            }
        });

        let text = self.generate(body).await?;
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        let suggestions: Suggestions =
            serde_json::from_str(&text).context("Failed to parse suggested tags")?;
        Ok(suggestions.suggested_tag_ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::TagCatalog;
    use crate::core::transaction::TransactionStore;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MODEL: &str = "test-model";
    const API_KEY: &str = "secret";

    fn candidate(text: &str) -> Value {
        json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": text }] }
            }]
        })
    }

    async fn create_mock_server(response: ResponseTemplate) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/v1beta/models/{MODEL}:generateContent")))
            .and(header("x-goog-api-key", API_KEY))
            .respond_with(response)
            .mount(&mock_server)
            .await;
        mock_server
    }

    fn provider(server: &MockServer) -> GeminiProvider {
        GeminiProvider::new(&server.uri(), MODEL, API_KEY, "English").unwrap()
    }

    #[tokio::test]
    async fn test_summarize_returns_candidate_text() {
        let server =
            create_mock_server(ResponseTemplate::new(200).set_body_json(candidate("Food leads."))).await;
        let request = InsightRequest::build(&TransactionStore::default(), &TagCatalog::default());
        let text = provider(&server).summarize(&request).await.unwrap();
        assert_eq!(text, "Food leads.");
    }

    #[tokio::test]
    async fn test_suggest_tags_parses_json_payload() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/v1beta/models/{MODEL}:generateContent")))
            .and(body_string_contains("responseSchema"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(candidate(r#"{"suggestedTagIds":["t_trans","t_me"]}"#)),
            )
            .mount(&mock_server)
            .await;

        let request = SuggestionRequest::build("taxi to airport", &TagCatalog::default());
        let ids = provider(&mock_server).suggest_tags(&request).await.unwrap();
        assert_eq!(ids, vec!["t_trans".to_string(), "t_me".to_string()]);
    }

    #[tokio::test]
    async fn test_error_status_is_an_error() {
        let server = create_mock_server(ResponseTemplate::new(403)).await;
        let request = InsightRequest::build(&TransactionStore::default(), &TagCatalog::default());
        assert!(provider(&server).summarize(&request).await.is_err());
    }

    #[tokio::test]
    async fn test_response_without_candidates_is_an_error() {
        let server =
            create_mock_server(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
                .await;
        let request = SuggestionRequest::build("coffee", &TagCatalog::default());
        assert!(provider(&server).suggest_tags(&request).await.is_err());
    }
}
