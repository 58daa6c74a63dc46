use smartfin_appraisal::report::format_rate_table;
use smartfin_appraisal::*;

const PROJECT_NOTE: &str = r#"
Project: Rice drying and milling line
Initial investment: 1,500,000,000 VND
Discount rate: 10%
Year 1: 380,000,000 VND
Year 2: 420,000,000 VND
Year 3: 450,000,000 VND
Year 4: 450,000,000 VND
Year 5: 400,000,000 VND
"#;

fn main() -> anyhow::Result<()> {
    println!("🏦 SmartFin appraisal demo\n");

    // 1. Household check
    let profile = HouseholdProfile::new(
        28_000_000.0,
        21_000_000.0,
        120_000_000.0,
        FinancialGoal::HomePurchase,
    )?;
    let assessment = profile.assess()?;

    println!("📋 Household");
    println!("   Savings rate:   {:.2}%", assessment.savings_rate);
    println!("   Debt-to-income: {:.2}%", assessment.debt_ratio);
    println!("   Advice:         {}", assessment.advice);
    println!("   Product:        {}\n", assessment.suggested_product);

    println!("📊 Rate comparison");
    println!("{}", format_rate_table(&RateTable::default()));

    // 2. Project appraisal from a free-text note
    let extractor = LabeledTextExtractor::new().with_document_name("project_note.txt");
    let (figures, result) = appraise_text(&extractor, PROJECT_NOTE, &AppraisalConfig::default())?;

    println!(
        "📈 {}",
        figures.project_name.as_deref().unwrap_or("Unnamed project")
    );
    for (label, value) in render_metrics(&result) {
        println!("   {:<34}{}", label, value);
    }

    let (_, rate) = figures.to_inputs(None)?;
    if result.is_viable(rate) {
        println!("\n✅ Clears the {} hurdle rate.", rate);
    } else {
        println!("\n⚠️  Does not clear the {} hurdle rate.", rate);
    }

    // 3. The same project typed in by hand
    let manual = ManualEntryExtractor::new().with_discount_rate(0.10);
    let (_, manual_result) = appraise_text(
        &manual,
        "1500000000\n380000000\n420000000\n450000000\n450000000\n400000000",
        &AppraisalConfig::default(),
    )?;
    assert_eq!(manual_result, result);
    println!("🔁 Manual entry gives identical metrics.");

    Ok(())
}
