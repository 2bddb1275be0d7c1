//! Google Cloud Translation v2 client.
//!
//! One POST per request with the credential as a query parameter. No retry
//! and no request timeout: a failed call surfaces as an error to the
//! service layer, and a hung call is simply superseded by the next caption.

use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{TranslateBackend, TranslateError};

/// Fixed translation direction.
pub const SOURCE_LANG: &str = "ko";
pub const TARGET_LANG: &str = "en";

const ENDPOINT: &str = "https://translation.googleapis.com/language/translate/v2";

pub struct GoogleTranslateClient {
    http: reqwest::Client,
    endpoint: String,
}

impl GoogleTranslateClient {
    pub fn new() -> Result<Self, TranslateError> {
        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(TranslateError::Http)?;

        Ok(Self {
            http,
            endpoint: ENDPOINT.to_string(),
        })
    }

    /// Point the client at a different endpoint (test servers).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[derive(Deserialize)]
struct TranslateResponse {
    data: TranslateData,
}

#[derive(Deserialize)]
struct TranslateData {
    translations: Vec<Translation>,
}

#[derive(Deserialize)]
struct Translation {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

impl TranslateBackend for GoogleTranslateClient {
    fn request<'a>(
        &'a self,
        text: &'a str,
        api_key: &'a str,
    ) -> BoxFuture<'a, Result<String, TranslateError>> {
        async move {
            let request_id = Uuid::new_v4();
            debug!(%request_id, chars = text.chars().count(), "translation request");

            let body = serde_json::json!({
                "q": text,
                "source": SOURCE_LANG,
                "target": TARGET_LANG,
                "format": "text",
            });

            let response = self
                .http
                .post(&self.endpoint)
                .query(&[("key", api_key)])
                .json(&body)
                .send()
                .await
                .map_err(TranslateError::Http)?;

            let status = response.status();
            if !status.is_success() {
                warn!(%request_id, status = status.as_u16(), "translation backend rejected request");
                return Err(TranslateError::Status(status.as_u16()));
            }

            let parsed: TranslateResponse = response
                .json()
                .await
                .map_err(|e| TranslateError::MalformedResponse(e.to_string()))?;

            let translated = parsed
                .data
                .translations
                .into_iter()
                .next()
                .map(|t| t.translated_text)
                .unwrap_or_default();

            // A success body with nothing in it is still a failure.
            if translated.is_empty() {
                return Err(TranslateError::MalformedResponse(
                    "empty translation".into(),
                ));
            }

            debug!(%request_id, "translation response ok");
            Ok(translated)
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_body_shape_parses() {
        let body = r#"{"data":{"translations":[{"translatedText":"Hello"}]}}"#;
        let parsed: TranslateResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.data.translations[0].translated_text, "Hello");
    }

    #[test]
    fn missing_translations_is_a_parse_or_empty_failure() {
        let body = r#"{"data":{"translations":[]}}"#;
        let parsed: TranslateResponse = serde_json::from_str(body).unwrap();
        let translated = parsed
            .data
            .translations
            .into_iter()
            .next()
            .map(|t| t.translated_text)
            .unwrap_or_default();
        assert!(translated.is_empty());
    }
}
