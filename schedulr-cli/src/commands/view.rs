use std::sync::Arc;

use anyhow::Result;
use owo_colors::OwoColorize;
use schedulr_core::suggest::TextGenerator;
use schedulr_core::{EventDetail, GeminiClient, GenerationError, Planner, SchedulrConfig, Session, Status};

use super::read_input;
use crate::render::{Render, render_grid};
use crate::utils::tui::create_spinner;

pub async fn run(config: &SchedulrConfig, file: &str, details: bool, no_suggestions: bool) -> Result<()> {
    let content = read_input(file)?;

    let generator: Option<Arc<dyn TextGenerator>> = if no_suggestions {
        None
    } else {
        match GeminiClient::from_config(config) {
            Ok(client) => Some(Arc::new(client)),
            Err(GenerationError::MissingApiKey) => anyhow::bail!(
                "No Gemini API key found.\n\n\
                Set one with:\n  \
                export GEMINI_API_KEY=<your key>\n\n\
                Or show classes only:\n  \
                schedulr view {} --no-suggestions",
                file
            ),
            Err(e) => return Err(e.into()),
        }
    };

    let planner = Planner::new(generator, config.ingest_options()?);
    let mut session = Session::new();

    let spinner = create_spinner("Parsing your calendar...");
    let result = planner
        .process(&mut session, &content, |status| {
            if status == Status::Generating {
                spinner.set_message("Generating AI study suggestions...");
            }
        })
        .await;
    spinner.finish_and_clear();
    result?;

    if let Some(error) = session.error() {
        println!("{}", "Oops!".red().bold());
        anyhow::bail!("{}", error);
    }

    let Some(grid) = session.grid() else {
        return Ok(());
    };
    let events: Vec<_> = session.visible_events().cloned().collect();

    println!("{}", "Your Weekly Schedule".bold());
    println!();
    println!("{}", render_grid(&grid, &events));
    println!();

    for event in &events {
        println!("{}", event.render());
    }

    if details {
        for event in &events {
            println!();
            println!("{}", EventDetail::from(event).render());
        }
    }

    let issues = planner.audit(&session);
    if !issues.is_empty() {
        println!();
        println!("{}", "Suggestions that bend the placement rules:".yellow());
        for issue in issues {
            println!("   {}", issue.render());
        }
    }

    Ok(())
}
