use dotenv::dotenv;
use smartfin_appraisal::llm::{
    AppraisalAssistant, ExtractionEvent, GeminiClient, GeminiFigureExtractor,
};
use smartfin_appraisal::*;
use tokio::sync::mpsc;

// Simulated OCR output of a loan application.
const MOCK_APPLICATION: &str = r#"
Mekong Shrimp Farm Co. - Loan application for a new pond aeration system.
The equipment costs 800 million VND up front. Management expects net cash
inflows of 210 million in the first year, 260 million in the second year,
290 million in the third and 300 million in each of years four and five.
The cooperative's cost of capital is about 12% per year.
"#;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    println!("🚀 Starting Gemini appraisal example...");

    let config = AppraisalConfig::default();
    let client = GeminiClient::from_env()?;

    let (tx, mut rx) = mpsc::channel::<ExtractionEvent>(16);
    let progress = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            println!("   ⏳ {:?}", event);
        }
    });

    let extractor = GeminiFigureExtractor::new(client.clone(), &config.model)?;
    let figures = extractor
        .extract_text(MOCK_APPLICATION, "application.txt", Some(tx))
        .await?;
    progress.await?;

    println!("📋 Extracted figures:\n{}", serde_json::to_string_pretty(&figures)?);

    let (series, rate) = figures.to_inputs(config.default_discount_rate)?;
    let result = Appraiser::new(config.clone()).appraise(&series, rate)?;

    println!("\n📊 Metrics");
    println!("{}", format_metrics(&result));

    let assistant = AppraisalAssistant::new(client, &config.model);
    let commentary = assistant
        .comment_on_appraisal(&result, rate, figures.project_name.as_deref())
        .await?;

    println!("\n🤖 Commentary\n{}", commentary);

    Ok(())
}
