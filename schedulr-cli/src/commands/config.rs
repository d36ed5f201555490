use anyhow::Result;
use owo_colors::OwoColorize;
use schedulr_core::SchedulrConfig;

pub fn run(config: &SchedulrConfig) -> Result<()> {
    let config_path = SchedulrConfig::config_path()?;

    println!("{}", "Paths".bold());
    println!("  Config:     {}", config_path.display());
    println!();

    println!("{}", "Settings".bold());
    println!("  Time zone:  {}", config.timezone()?);
    println!("  Horizon:    {}", config.recurrence_horizon);
    println!("  Max occurrences: {}", config.max_occurrences);
    println!("  Model:      {}", config.gemini_model);
    println!("  API base:   {}", config.gemini_base_url);
    println!("  Timeout:    {}", config.request_timeout);
    println!("  Server port: {}", config.server_port);
    println!(
        "  API key:    {}",
        if config.gemini_api_key.is_some() {
            "set".green().to_string()
        } else {
            "not set (GEMINI_API_KEY)".yellow().to_string()
        }
    );

    Ok(())
}
