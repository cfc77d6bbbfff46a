use base64::Engine;
use image::{DynamicImage, ImageFormat};
use reqwest::blocking::Client;
use serde_json::{json, Value};
use std::io::Cursor;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::ModelSettings;
use crate::error::SchedexError;
use crate::extraction::{prompts, VisionModel};

/// Google Gemini backend over the Generative Language REST API.
///
/// Requests are blocking and never retried.
pub struct GeminiClient {
    http: Client,
    api_key: String,
    settings: ModelSettings,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, settings: ModelSettings) -> Result<Self, SchedexError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(GeminiClient {
            http,
            api_key: api_key.into().trim().to_string(),
            settings,
        })
    }

    /// Build a client with the key read from `settings.api_key_env`.
    pub fn from_env(settings: ModelSettings) -> Result<Self, SchedexError> {
        let var = settings.api_key_env.clone();
        match std::env::var(&var) {
            Ok(key) if !key.trim().is_empty() => GeminiClient::new(key, settings),
            _ => Err(SchedexError::MissingApiKey { var }),
        }
    }

    pub fn model(&self) -> &str {
        &self.settings.name
    }

    /// Text-only round trip to confirm the key and model are usable.
    pub fn ping(&self) -> Result<String, SchedexError> {
        let body = build_request_body(prompts::PING, None, &self.settings);
        self.send(&body)
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.settings.endpoint.trim_end_matches('/'),
            self.settings.name
        )
    }

    fn send(&self, body: &Value) -> Result<String, SchedexError> {
        let resp = self
            .http
            .post(self.endpoint())
            .header("content-type", "application/json")
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().unwrap_or_default();
            return Err(SchedexError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let json: Value = resp.json()?;
        Ok(reply_text(&json))
    }
}

impl VisionModel for GeminiClient {
    fn generate(&self, instruction: &str, image: &DynamicImage) -> Result<String, SchedexError> {
        let png = encode_png(image)?;
        let data = base64::engine::general_purpose::STANDARD.encode(&png);
        debug!(
            model = %self.settings.name,
            width = image.width(),
            height = image.height(),
            bytes = png.len(),
            "sending image to model"
        );
        let body = build_request_body(instruction, Some(&data), &self.settings);
        self.send(&body)
    }

    fn backend_name(&self) -> &str {
        "gemini"
    }
}

/// Request body for `generateContent`: instruction first, then the image.
pub fn build_request_body(
    instruction: &str,
    image_base64: Option<&str>,
    settings: &ModelSettings,
) -> Value {
    let mut parts = vec![json!({ "text": instruction })];
    if let Some(data) = image_base64 {
        parts.push(json!({
            "inline_data": { "mime_type": "image/png", "data": data }
        }));
    }
    json!({
        "contents": [{ "role": "user", "parts": parts }],
        "generationConfig": {
            "temperature": settings.temperature,
            "maxOutputTokens": settings.max_output_tokens,
        }
    })
}

/// Concatenated text of the first candidate.
///
/// Blocked prompts and candidate-less replies come back as an empty string.
pub fn reply_text(json: &Value) -> String {
    if let Some(reason) = json["promptFeedback"]["blockReason"].as_str() {
        warn!(reason, "model blocked the prompt");
    }

    let Some(candidate) = json["candidates"].as_array().and_then(|c| c.first()) else {
        return String::new();
    };

    if candidate["finishReason"].as_str() == Some("MAX_TOKENS") {
        warn!("model reply hit the output token limit and is likely truncated");
    }

    candidate["content"]["parts"]
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p["text"].as_str())
                .collect::<String>()
        })
        .unwrap_or_default()
}

/// PNG-encode an image for upload.
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, SchedexError> {
    let mut buf = Cursor::new(Vec::new());
    image
        .write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| SchedexError::ImageEncode(e.to_string()))?;
    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    #[test]
    fn request_body_carries_settings_and_image() {
        let settings = ModelSettings::default();
        let body = build_request_body("read this", Some("aGVsbG8="), &settings);

        let parts = body["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0]["text"], "read this");
        assert_eq!(parts[1]["inline_data"]["mime_type"], "image/png");
        assert_eq!(parts[1]["inline_data"]["data"], "aGVsbG8=");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 65536);
    }

    #[test]
    fn text_only_body_has_one_part() {
        let body = build_request_body(prompts::PING, None, &ModelSettings::default());
        assert_eq!(body["contents"][0]["parts"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn reply_text_joins_parts_of_first_candidate() {
        let json = json!({
            "candidates": [
                {"content": {"parts": [{"text": "{\"panels\":"}, {"text": "[]}"}]}},
                {"content": {"parts": [{"text": "ignored"}]}}
            ]
        });
        assert_eq!(reply_text(&json), "{\"panels\":[]}");
    }

    #[test]
    fn blocked_reply_is_empty() {
        let json = json!({"promptFeedback": {"blockReason": "SAFETY"}});
        assert_eq!(reply_text(&json), "");
    }

    #[test]
    fn endpoint_joins_base_and_model() {
        let settings = ModelSettings {
            endpoint: "https://example.test/v1beta/".into(),
            name: "gemini-test".into(),
            ..Default::default()
        };
        let client = GeminiClient::new(" key ", settings).unwrap();
        assert_eq!(
            client.endpoint(),
            "https://example.test/v1beta/models/gemini-test:generateContent"
        );
        assert_eq!(client.api_key, "key");
    }

    #[test]
    fn missing_key_variable_is_reported() {
        let settings = ModelSettings {
            api_key_env: "SCHEDEX_TEST_UNSET_KEY_VARIABLE".into(),
            ..Default::default()
        };
        assert!(matches!(
            GeminiClient::from_env(settings),
            Err(SchedexError::MissingApiKey { .. })
        ));
    }

    #[test]
    fn encode_png_produces_png_signature() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(4, 4));
        let png = encode_png(&image).unwrap();
        assert_eq!(&png[..4], b"\x89PNG");
    }
}
