//! Word translation used to find the French half of a description.

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

use crate::error::{IngestError, Result};

pub trait Translator {
    /// Translates each word, returning one word per input in the same order.
    fn translate(&self, words: &[String]) -> Result<Vec<String>>;
}

/// Returns an empty pivot for every word, so every split keeps the whole
/// description in English.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTranslator;

impl Translator for NoopTranslator {
    fn translate(&self, words: &[String]) -> Result<Vec<String>> {
        Ok(vec![String::new(); words.len()])
    }
}

#[derive(Debug, Serialize)]
struct TranslateItem<'a> {
    #[serde(rename = "Text")]
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct TranslateResult {
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
struct Translation {
    text: String,
}

/// Client for a Microsoft Translator style `/translate` endpoint.
pub struct HttpTranslator {
    client: Client,
    endpoint: String,
    to: String,
    key: String,
    region: Option<String>,
}

impl HttpTranslator {
    pub fn new(
        endpoint: impl Into<String>,
        to: impl Into<String>,
        key: impl Into<String>,
        region: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| IngestError::Translation(err.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            to: to.into(),
            key: key.into(),
            region,
        })
    }
}

impl Translator for HttpTranslator {
    #[instrument(skip(self, words), fields(words = words.len(), to = %self.to))]
    fn translate(&self, words: &[String]) -> Result<Vec<String>> {
        if words.is_empty() {
            return Ok(Vec::new());
        }

        let body: Vec<TranslateItem<'_>> = words
            .iter()
            .map(|word| TranslateItem { text: word })
            .collect();
        let url = format!("{}/translate", self.endpoint.trim_end_matches('/'));

        let mut request = self
            .client
            .post(url)
            .query(&[("api-version", "3.0"), ("to", self.to.as_str())])
            .header("Ocp-Apim-Subscription-Key", &self.key)
            .json(&body);
        if let Some(region) = &self.region {
            request = request.header("Ocp-Apim-Subscription-Region", region);
        }

        let results: Vec<TranslateResult> = request
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json())
            .map_err(|err| IngestError::Translation(err.to_string()))?;

        let translated = results
            .into_iter()
            .map(|result| {
                result
                    .translations
                    .into_iter()
                    .next()
                    .map(|t| t.text)
                    .ok_or_else(|| IngestError::Translation("empty translation entry".into()))
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(?translated, "translated pivot words");
        Ok(translated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_returns_one_empty_word_per_input() {
        let words = vec!["Royal".to_string(), "Opposition".to_string()];
        let out = NoopTranslator.translate(&words).unwrap();
        assert_eq!(out, vec![String::new(), String::new()]);
    }

    #[test]
    fn decodes_service_response() {
        let raw = r#"[{"translations":[{"text":"Assentiment","to":"fr"}]},{"translations":[{"text":"2ème","to":"fr"}]}]"#;
        let parsed: Vec<TranslateResult> = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1].translations[0].text, "2ème");
    }

    #[test]
    fn encodes_request_items() {
        let words = ["Royal".to_string()];
        let body: Vec<TranslateItem<'_>> = words.iter().map(|w| TranslateItem { text: w }).collect();
        assert_eq!(serde_json::to_string(&body).unwrap(), r#"[{"Text":"Royal"}]"#);
    }
}
