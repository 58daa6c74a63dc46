use crate::config::DEFAULT_MODEL;
use crate::error::Result;
use crate::household::HouseholdAssessment;
use crate::llm::client::GeminiClient;
use crate::llm::prompts::SYSTEM_PROMPT_ADVISOR;
use crate::llm::types::Content;
use crate::report::{commentary_prompt, household_prompt};
use crate::schema::{AppraisalResult, DiscountRate};

/// Natural-language commentary on computed metrics.
///
/// The returned text is the model's answer, unmodified.
pub struct AppraisalAssistant {
    client: GeminiClient,
    model: String,
}

impl AppraisalAssistant {
    pub fn new(client: GeminiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    pub fn with_default_model(client: GeminiClient) -> Self {
        Self::new(client, DEFAULT_MODEL)
    }

    pub async fn comment_on_appraisal(
        &self,
        result: &AppraisalResult,
        rate: DiscountRate,
        project_name: Option<&str>,
    ) -> Result<String> {
        self.ask(&commentary_prompt(result, rate, project_name)).await
    }

    pub async fn comment_on_household(&self, assessment: &HouseholdAssessment) -> Result<String> {
        self.ask(&household_prompt(assessment)).await
    }

    /// Free-form question, e.g. a follow-up from a chat box.
    pub async fn ask(&self, prompt: &str) -> Result<String> {
        self.client
            .generate_content(
                &self.model,
                SYSTEM_PROMPT_ADVISOR,
                vec![Content::user(prompt)],
                "text/plain",
            )
            .await
    }
}
