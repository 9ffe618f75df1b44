use std::error::Error;
use std::path::Path;

use crate::core::config::data::path_display;
use crate::render::read_metadata;

pub fn inspect_card(path: &Path) -> Result<(), Box<dyn Error>> {
    let bytes = std::fs::read(path)?;
    let metadata = read_metadata(&bytes)
        .map_err(|err| format!("{}: {}", path_display(path), err))?;
    println!("{}", path_display(path));
    println!("  name:         {}", metadata.name);
    println!("  uid:          {}", metadata.uid);
    println!("  character id: {}", metadata.character_id);
    println!("  theme:        {}", metadata.theme);
    Ok(())
}
