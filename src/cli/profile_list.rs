use std::error::Error;

use crate::cli::context::build_service;
use crate::core::config::data::Config;
use crate::model::{CharacterBuild, Profile, Uid};
use crate::render::format::{format_character_level, format_light_cone_level};

pub fn character_line(index: usize, build: &CharacterBuild) -> String {
    let mut line = format!(
        "  [{}] {} - {}",
        index,
        build.name,
        format_character_level(build.level, build.eidolon)
    );
    if let Some(path) = &build.path {
        line.push_str(&format!(" - {}", path));
    }
    if let Some(element) = &build.element {
        line.push_str(&format!(" / {}", element));
    }
    if build.light_cone.is_equipped() {
        let name = build.light_cone.name.as_deref().unwrap_or("?");
        line.push_str(&format!(
            " - {} {}",
            name,
            format_light_cone_level(build.light_cone.level, build.light_cone.superimpose)
        ));
    }
    line.push_str(&format!(" - {} relic(s)", build.relics.len()));
    line
}

pub fn print_profile(profile: &Profile) {
    let nickname = profile.player.nickname.as_deref().unwrap_or("(unknown)");
    match profile.player.level {
        Some(level) => println!("{} (UID {}, TL {})", nickname, profile.uid, level),
        None => println!("{} (UID {})", nickname, profile.uid),
    }
    if profile.characters.is_empty() {
        println!("  No characters on display.");
        return;
    }
    for (index, build) in profile.characters.iter().enumerate() {
        println!("{}", character_line(index, build));
    }
}

pub async fn list_profile(
    config: &Config,
    uid: Uid,
    json: bool,
    force_refresh: bool,
) -> Result<(), Box<dyn Error>> {
    let service = build_service(config, None)?;
    let profile = match service.get_profile(uid, force_refresh).await {
        Ok(profile) => profile,
        Err(reason) => {
            eprintln!("⚠️  {uid}: {reason}");
            std::process::exit(1);
        }
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
    } else {
        print_profile(&profile);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LightCone;

    #[test]
    fn line_includes_tags_and_light_cone() {
        let mut build = CharacterBuild::named(1, "Acheron");
        build.level = 80;
        build.eidolon = 2;
        build.path = Some("Nihility".to_string());
        build.element = Some("Lightning".to_string());
        build.light_cone = LightCone {
            id: 23024,
            name: Some("Along the Passing Shore".to_string()),
            level: 80,
            superimpose: 1,
            ..Default::default()
        };
        assert_eq!(
            character_line(3, &build),
            "  [3] Acheron - Lv.80 E2 - Nihility / Lightning - Along the Passing Shore Lv.80 S1 - 0 relic(s)"
        );
    }

    #[test]
    fn bare_line() {
        let build = CharacterBuild::named(1, "March 7th");
        assert_eq!(character_line(0, &build), "  [0] March 7th - Lv.1 E0 - 0 relic(s)");
    }
}
