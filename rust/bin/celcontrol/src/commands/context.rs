//! Context management commands.

use std::path::Path;

use anyhow::Result;

use celcontrol_core::StoreConfig;

use crate::config::{ClientConfig, Context};

/// Create (or replace) a context and make it current if none is.
pub fn create(
    name: &str,
    store: StoreConfig,
    utc_offset_minutes: i32,
    client_config_path: &Path,
) -> Result<()> {
    if name.trim().is_empty() {
        anyhow::bail!("Context name cannot be empty.");
    }
    store.validate()?;

    let ctx = Context {
        name: name.to_string(),
        utc_offset_minutes,
        store,
    };
    ctx.utc_offset()?;

    // Opening the gateway creates the SQLite file and schema up front.
    stock::gateway::open(&ctx.store)?;

    let mut config = ClientConfig::load(client_config_path)?;
    let describe = ctx.store.describe();
    config.upsert_context(ctx);
    if config.current_context.is_empty() {
        config.current_context = name.to_string();
    }
    config.save(client_config_path)?;

    println!("Context \"{}\" created.", name);
    println!("  Store: {}", describe);
    Ok(())
}

/// List all contexts.
pub fn list(client_config_path: &Path) -> Result<()> {
    let config = ClientConfig::load(client_config_path)?;

    if config.contexts.is_empty() {
        println!("No contexts configured.");
        println!("Run: celcontrol context create <name> --sqlite <path>");
        return Ok(());
    }

    println!("{:2} {:20} {:8} {:50}", "", "NAME", "OFFSET", "STORE");
    for ctx in &config.contexts {
        let marker = if ctx.name == config.current_context {
            "*"
        } else {
            " "
        };
        println!(
            "{:2} {:20} {:8} {:50}",
            marker,
            ctx.name,
            format_offset(ctx.utc_offset_minutes),
            ctx.store.describe()
        );
    }

    Ok(())
}

/// Switch current context.
pub fn use_context(name: &str, client_config_path: &Path) -> Result<()> {
    let mut config = ClientConfig::load(client_config_path)?;

    if config.get(name).is_none() {
        anyhow::bail!(
            "Context \"{}\" not found. Run `celcontrol context list` to see available contexts.",
            name
        );
    }

    config.current_context = name.to_string();
    config.save(client_config_path)?;
    println!("Switched to context \"{}\".", name);
    Ok(())
}

/// Delete a context. The store itself is left untouched.
pub fn delete(name: &str, client_config_path: &Path) -> Result<()> {
    let mut config = ClientConfig::load(client_config_path)?;

    if !config.remove_context(name) {
        anyhow::bail!("Context \"{}\" not found.", name);
    }

    config.save(client_config_path)?;
    println!("Context \"{}\" deleted.", name);
    Ok(())
}

fn format_offset(minutes: i32) -> String {
    let sign = if minutes < 0 { '-' } else { '+' };
    let m = minutes.unsigned_abs();
    format!("{}{:02}:{:02}", sign, m / 60, m % 60)
}
