use crate::config::DEFAULT_MODEL;
use crate::error::{AppraisalError, Result};
use crate::ingestion::ExtractedFigures;
use crate::llm::prompts::SYSTEM_PROMPT_EXTRACTION;
use crate::llm::{client::GeminiClient, types::*};
use crate::schema::SourceMetadata;
use log::{info, warn};
use std::path::Path;
use tokio::fs;
use tokio::sync::mpsc::Sender;

/// Figure extraction backed by a Gemini model.
///
/// Produces the same [`ExtractedFigures`] contract as the local extractors,
/// so callers can swap strategies without touching the calculator.
pub struct GeminiFigureExtractor {
    client: GeminiClient,
    model: String,
    system_prompt: String,
    max_retries: usize,
}

impl GeminiFigureExtractor {
    pub fn new(client: GeminiClient, model: impl Into<String>) -> Result<Self> {
        let schema = ExtractedFigures::schema_as_json()?;
        Ok(Self {
            client,
            model: model.into(),
            system_prompt: format!("{}{}", SYSTEM_PROMPT_EXTRACTION, schema),
            max_retries: 3,
        })
    }

    pub fn with_default_model(client: GeminiClient) -> Result<Self> {
        Self::new(client, DEFAULT_MODEL)
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Extracts figures from free text such as a loan memo or chat message.
    pub async fn extract_text(
        &self,
        text: &str,
        document_name: &str,
        progress: Option<Sender<ExtractionEvent>>,
    ) -> Result<ExtractedFigures> {
        self.send_event(&progress, ExtractionEvent::Starting).await;

        let instructions = format!(
            "Document name: \"{}\"\n\nExtract the appraisal figures from this text:\n\n{}",
            document_name, text
        );
        self.run(vec![Content::user(instructions)], document_name, &progress)
            .await
    }

    /// Extracts figures from a local document (PDF, image, text), sent inline.
    pub async fn extract_document(
        &self,
        path: &Path,
        progress: Option<Sender<ExtractionEvent>>,
    ) -> Result<ExtractedFigures> {
        self.send_event(&progress, ExtractionEvent::Starting).await;

        let document_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| AppraisalError::ExtractionFailed("Invalid file name".to_string()))?
            .to_string();

        self.send_event(
            &progress,
            ExtractionEvent::Reading {
                document: document_name.clone(),
            },
        )
        .await;

        let mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .to_string();
        let bytes = fs::read(path).await?;

        let instructions = format!(
            "Document name: \"{}\"\n\nExtract the appraisal figures from the attached document.",
            document_name
        );
        let messages = vec![Content::user_with_document(instructions, &mime_type, &bytes)];

        self.run(messages, &document_name, &progress).await
    }

    async fn run(
        &self,
        mut messages: Vec<Content>,
        document_name: &str,
        progress: &Option<Sender<ExtractionEvent>>,
    ) -> Result<ExtractedFigures> {
        for attempt in 1..=self.max_retries {
            self.send_event(progress, ExtractionEvent::Requesting { attempt })
                .await;

            let raw = self
                .client
                .generate_content(
                    &self.model,
                    &self.system_prompt,
                    messages.clone(),
                    "application/json",
                )
                .await?;

            self.send_event(progress, ExtractionEvent::Validating { attempt })
                .await;

            match parse_figures(&raw) {
                Ok(mut figures) => {
                    if figures.source.is_none() {
                        figures.source = Some(SourceMetadata {
                            document_name: document_name.to_string(),
                            original_text: None,
                        });
                    }
                    info!(
                        "Extracted {} cash flows from '{}' on attempt {}",
                        figures.cash_flows.len(),
                        document_name,
                        attempt
                    );
                    self.send_event(progress, ExtractionEvent::Success).await;
                    return Ok(figures);
                }
                Err(reason) => {
                    warn!("Extraction attempt {} rejected: {}", attempt, reason);
                    self.send_event(
                        progress,
                        ExtractionEvent::CorrectionNeeded {
                            reason: reason.clone(),
                        },
                    )
                    .await;

                    // Show the model its own output so it can correct it.
                    messages.push(Content::model(raw));
                    messages.push(Content::user(format!(
                        "The JSON you provided was rejected:\n\nERROR: {}\n\n\
                         Return the complete corrected JSON object only.",
                        reason
                    )));
                }
            }
        }

        let msg = "Max retries exceeded. The model could not produce usable figures.";
        self.send_event(
            progress,
            ExtractionEvent::Failed {
                reason: msg.to_string(),
            },
        )
        .await;
        Err(AppraisalError::ExtractionFailed(msg.into()))
    }

    async fn send_event(&self, sender: &Option<Sender<ExtractionEvent>>, event: ExtractionEvent) {
        if let Some(tx) = sender {
            let _ = tx.send(event).await;
        }
    }
}

/// Parses model output and checks the minimum needed for an appraisal.
fn parse_figures(raw: &str) -> std::result::Result<ExtractedFigures, String> {
    let cleaned = clean_json_output(raw);
    let figures: ExtractedFigures =
        serde_json::from_str(&cleaned).map_err(|e| format!("JSON parse failed: {}", e))?;

    if figures.initial_investment.is_none() {
        return Err("`initial_investment` is missing".to_string());
    }
    if figures.cash_flows.is_empty() {
        return Err("`cash_flows` is empty; at least one period flow is required".to_string());
    }
    Ok(figures)
}

fn clean_json_output(raw: &str) -> String {
    if let Some(start) = raw.find('{') {
        if let Some(end) = raw.rfind('}') {
            return raw[start..=end].to_string();
        }
    }
    raw.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_json_output_strips_fences() {
        let raw = "```json\n{\"cash_flows\": [1.0]}\n```";
        assert_eq!(clean_json_output(raw), "{\"cash_flows\": [1.0]}");
        assert_eq!(clean_json_output("  nothing  "), "nothing");
    }

    #[test]
    fn test_system_prompt_carries_schema() {
        let extractor =
            GeminiFigureExtractor::with_default_model(GeminiClient::new("test-key".to_string()))
                .unwrap();
        assert_eq!(extractor.model, DEFAULT_MODEL);
        assert!(extractor.system_prompt.starts_with(SYSTEM_PROMPT_EXTRACTION));
        assert!(extractor.system_prompt.contains("\"cash_flows\""));
    }

    #[test]
    fn test_parse_figures() {
        let ok = parse_figures(
            r#"{
                "project_name": "Dryer",
                "initial_investment": 500.0,
                "discount_rate": 0.12,
                "cash_flows": [200.0, 250.0, 300.0]
            }"#,
        )
        .unwrap();
        assert_eq!(ok.cash_flows.len(), 3);
        assert_eq!(ok.project_name.as_deref(), Some("Dryer"));

        assert!(parse_figures(r#"{"cash_flows":[1.0]}"#).is_err());
        assert!(parse_figures(r#"{"initial_investment":1.0,"cash_flows":[]}"#).is_err());
        assert!(parse_figures("not json").is_err());
    }
}
