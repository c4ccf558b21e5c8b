use crate::output::{Output, OutputFormat};
use color_eyre::Result;
use comfy_table::{Cell, Table};
use serde_json::json;
use yume_sync_config::PathManager;
use yume_sync_core::{IdCacheStorage, IdResolver};

pub fn run_stats(output: &Output) -> Result<()> {
    let path_manager = PathManager::default();
    let cache_dir = path_manager.cache_id_dir();

    let storage = IdCacheStorage::new(&cache_dir);
    if !storage.cache_exists() {
        output.info("No identifier cache found");
        return Ok(());
    }

    let resolver = IdResolver::open(&cache_dir, None)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to open identifier cache: {}", e))?;
    let stats = resolver.stats();
    let size_bytes = storage
        .size()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to stat identifier cache: {}", e))?;

    match output.format() {
        OutputFormat::Human => {
            let mut table = Table::new();
            table.set_header(vec![
                Cell::new("Identifier Cache")
                    .fg(comfy_table::Color::Cyan)
                    .add_attribute(comfy_table::Attribute::Bold),
                Cell::new(""),
            ]);
            table.add_row(vec![
                "File".to_string(),
                storage.cache_path().display().to_string(),
            ]);
            table.add_row(vec!["Size".to_string(), format_size(size_bytes)]);
            table.add_row(vec!["Entries".to_string(), stats.entries.to_string()]);
            table.add_row(vec![
                "With AniList id".to_string(),
                stats.with_anilist_id.to_string(),
            ]);
            table.add_row(vec![
                "With MAL id".to_string(),
                stats.with_mal_id.to_string(),
            ]);
            table.add_row(vec!["Unresolved".to_string(), stats.unresolved.to_string()]);
            table.load_preset(comfy_table::presets::UTF8_FULL);
            table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
            output.println(table.to_string());
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            output.json_value(&json!({
                "type": "cache_stats",
                "file": storage.cache_path().display().to_string(),
                "size_bytes": size_bytes,
                "entries": stats.entries,
                "with_anilist_id": stats.with_anilist_id,
                "with_mal_id": stats.with_mal_id,
                "unresolved": stats.unresolved,
            }));
        }
    }

    Ok(())
}

pub fn run_clear(output: &Output) -> Result<()> {
    let path_manager = PathManager::default();
    let storage = IdCacheStorage::new(&path_manager.cache_id_dir());

    if !storage.cache_exists() {
        output.info("No identifier cache found to clear");
        return Ok(());
    }

    storage
        .clear()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to delete identifier cache: {}", e))?;
    output.success(format!(
        "Cleared identifier cache: {}",
        storage.cache_path().display()
    ));
    Ok(())
}

fn format_size(bytes: u64) -> String {
    if bytes >= 1024 * 1024 {
        format!("{:.1} MiB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.1} KiB", bytes as f64 / 1024.0)
    } else {
        format!("{} B", bytes)
    }
}
