use crate::output::{Output, OutputFormat};
use color_eyre::Result;
use comfy_table::{Cell, Table};
use serde_json::json;
use yume_sync_config::{Config, PathManager};

pub fn run_show(output: &Output) -> Result<()> {
    let path_manager = PathManager::default();
    let config_path = path_manager.config_file();
    let config = Config::load_or_default(&config_path);

    match output.format() {
        OutputFormat::Human => {
            let mut info_table = Table::new();
            info_table.set_header(vec![
                Cell::new("Config File").add_attribute(comfy_table::Attribute::Bold),
                Cell::new(config_path.display().to_string()),
            ]);
            info_table.load_preset(comfy_table::presets::UTF8_FULL);
            info_table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
            output.println(info_table.to_string());

            let mut table = Table::new();
            table.set_header(vec![
                Cell::new("Setting")
                    .fg(comfy_table::Color::Cyan)
                    .add_attribute(comfy_table::Attribute::Bold),
                Cell::new("Value")
                    .fg(comfy_table::Color::Cyan)
                    .add_attribute(comfy_table::Attribute::Bold),
            ]);
            let rows = [
                ("anilist.api_url", config.anilist.api_url.clone()),
                (
                    "anilist.request_timeout_secs",
                    config.anilist.request_timeout_secs.to_string(),
                ),
                (
                    "sync.concurrent_requests",
                    config.sync.concurrent_requests.to_string(),
                ),
                ("sync.max_retries", config.sync.max_retries.to_string()),
                (
                    "sync.max_title_candidates",
                    config.sync.max_title_candidates.to_string(),
                ),
                (
                    "sync.max_results_checked",
                    config.sync.max_results_checked.to_string(),
                ),
                (
                    "sync.entry_timeout_secs",
                    config.sync.entry_timeout_secs.to_string(),
                ),
                ("sync.backoff_base_ms", config.sync.backoff_base_ms.to_string()),
                (
                    "sync.progress_interval",
                    config.sync.progress_interval.to_string(),
                ),
                ("auto_sync.enabled", config.auto_sync.enabled.to_string()),
                (
                    "auto_sync.interval_hours",
                    config.auto_sync.interval_hours.to_string(),
                ),
            ];
            for (key, value) in rows {
                table.add_row(vec![key.to_string(), value]);
            }
            table.load_preset(comfy_table::presets::UTF8_FULL);
            table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
            output.println(table.to_string());
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            output.json_value(&json!({
                "type": "config",
                "file": config_path.display().to_string(),
                "config": serde_json::to_value(&config)?,
            }));
        }
    }

    Ok(())
}

pub fn run_init(force: bool, output: &Output) -> Result<()> {
    let path_manager = PathManager::default();
    let config_path = path_manager.config_file();

    if config_path.exists() && !force {
        output.warn(format!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            config_path.display()
        ));
        return Ok(());
    }

    let config = Config::default();
    config
        .save(&config_path)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to write configuration file: {}", e))?;
    output.success(format!("Wrote default configuration to {}", config_path.display()));
    Ok(())
}
