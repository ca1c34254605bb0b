//! retro-host - libretro frontend
//!
//! Usage: `retro-host [console] <content>`

use anyhow::{bail, Context};
use rh_core::{Config, ConsoleProfile};
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Config unreadable, using defaults: {}", e);
            Config::default()
        }
    };
    rh_core::logging::init(config.debug.log_level);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (console, content) = match args.as_slice() {
        [content] => (config.general.default_console.clone(), PathBuf::from(content)),
        [console, content] => (console.clone(), PathBuf::from(content)),
        _ => bail!("usage: retro-host [console] <content>"),
    };

    let profile = ConsoleProfile::by_id(&console).with_context(|| {
        let known: Vec<&str> = ConsoleProfile::all().iter().map(|p| p.id).collect();
        format!("unknown console '{}' (known: {})", console, known.join(", "))
    })?;
    if !content.is_file() {
        bail!("content not found: {}", content.display());
    }

    tracing::info!("Starting retro-host: {} with {}", profile.name, content.display());

    rh_ui::app::run(config, profile, content)
        .map_err(|e| anyhow::anyhow!("viewer failed: {}", e))
}
