use anyhow::Result;
use owo_colors::OwoColorize;
use schedulr_core::suggest::{PlacementRules, suggestion_request};
use schedulr_core::{SchedulrConfig, parse_schedule};

use super::read_input;

pub fn run(config: &SchedulrConfig, file: &str) -> Result<()> {
    let content = read_input(file)?;
    let classes = parse_schedule(&content, &config.ingest_options()?)?;

    let Some((week, request)) = suggestion_request(&classes, &PlacementRules::default()) else {
        println!("{}", "No events found in the calendar, nothing would be sent.".dimmed());
        return Ok(());
    };

    println!(
        "{} {} ({} → {})",
        "Model:".bold(),
        config.gemini_model,
        week.start_date(),
        week.end_date()
    );
    println!();
    println!("{}", "Prompt".bold());
    println!("{}", request.prompt);
    println!("{}", "Response schema".bold());
    println!("{}", serde_json::to_string_pretty(&request.schema)?);

    Ok(())
}
