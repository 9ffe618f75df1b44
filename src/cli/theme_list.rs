use crate::core::config::data::Config;
use crate::render::theme::{load_builtin_themes, DEFAULT_THEME_ID};

pub fn list_themes(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let current_id = config.theme_id();
    let current_display = config
        .theme
        .clone()
        .unwrap_or_else(|| format!("(default: {DEFAULT_THEME_ID})"));
    let mark = |id: &str| if id.eq_ignore_ascii_case(current_id) { "*" } else { " " };

    println!("Available card themes:\n");
    println!("Built-in:");
    for t in load_builtin_themes() {
        println!("  {} {} - {}", mark(&t.id), t.id, t.display_name);
    }

    let customs = config.list_custom_themes();
    if !customs.is_empty() {
        println!("\nCustom:");
        for t in customs {
            let base = t.base.as_deref().unwrap_or(DEFAULT_THEME_ID);
            println!("  {} {} - {} (based on {})", mark(&t.id), t.id, t.display_name, base);
        }
    }

    println!("\nCurrent: {}", current_display);
    Ok(())
}
