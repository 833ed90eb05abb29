//! Config command handlers

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use wordwall_core::config::AnimationConfig;
use wordwall_core::Config;

use crate::output::{Output, OutputFormat};

/// Show current configuration
pub fn show(config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;
    let token = config.token.as_deref().map(mask_token);

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "url": config.url,
                    "token": token,
                    "collection": config.collection,
                    "log_file": config.log_file,
                    "animation": config.animation
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.url.as_deref().unwrap_or(""));
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            let anim = &config.animation;
            println!("Configuration:");
            println!(
                "  url:        {}",
                config.url.as_deref().unwrap_or("(not set)")
            );
            println!("  token:      {}", token.as_deref().unwrap_or("(not set)"));
            println!("  collection: {}", config.collection);
            println!(
                "  log_file:   {}",
                config
                    .log_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(not set)".to_string())
            );
            println!();
            println!("Animation (ms):");
            println!("  reveal_interval_ms: {}", anim.reveal_interval_ms);
            println!("  decay_window_ms:    {}", anim.decay_window_ms);
            println!("  decay_tick_ms:      {}", anim.decay_tick_ms);
            println!("  overlay_char_ms:    {}", anim.overlay_char_ms);
            println!("  overlay_hold_ms:    {}", anim.overlay_hold_ms);
            println!("  overlay_exit_ms:    {}", anim.overlay_exit_ms);
            println!("  overlay_gap_ms:     {}", anim.overlay_gap_ms);
            println!();
            println!("Config file: {}", effective_path.display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(
    key: String,
    value: String,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    let mut config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    apply(&mut config, &key, &value)?;

    // Save to the CLI-specified path or default
    let save_path = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);
    config
        .save_to_path(&save_path)
        .context("Failed to save configuration")?;

    let shown = if key == "token" {
        mask_token(&value)
    } else {
        value
    };
    output.success(&format!("Set {} = {}", key, shown));

    Ok(())
}

fn apply(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "url" => config.url = optional(value),
        "token" => config.token = optional(value),
        "collection" => {
            if value.is_empty() {
                bail!("collection cannot be empty");
            }
            config.collection = value.to_string();
        }
        "log_file" => config.log_file = optional(value).map(PathBuf::from),
        _ => {
            let Some(field) = key
                .strip_prefix("animation.")
                .and_then(|name| animation_field(&mut config.animation, name))
            else {
                bail!(
                    "Unknown configuration key: '{}'\n\
                     Valid keys: url, token, collection, log_file, animation.<name>_ms",
                    key
                );
            };
            *field = value
                .parse()
                .with_context(|| format!("Invalid value for {}. Use a whole number of milliseconds.", key))?;
        }
    }
    Ok(())
}

fn animation_field<'a>(anim: &'a mut AnimationConfig, name: &str) -> Option<&'a mut u64> {
    let field = match name {
        "reveal_interval_ms" => &mut anim.reveal_interval_ms,
        "decay_window_ms" => &mut anim.decay_window_ms,
        "decay_tick_ms" => &mut anim.decay_tick_ms,
        "overlay_char_ms" => &mut anim.overlay_char_ms,
        "overlay_hold_ms" => &mut anim.overlay_hold_ms,
        "overlay_exit_ms" => &mut anim.overlay_exit_ms,
        "overlay_gap_ms" => &mut anim.overlay_gap_ms,
        _ => return None,
    };
    Some(field)
}

/// "none" or an empty value clears an optional setting
fn optional(value: &str) -> Option<String> {
    if value.is_empty() || value == "none" {
        None
    } else {
        Some(value.to_string())
    }
}

/// Show only the first few characters of a secret
fn mask_token(token: &str) -> String {
    let visible: String = token.chars().take(4).collect();
    if token.chars().count() <= 4 {
        "****".to_string()
    } else {
        format!("{}****", visible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_known_keys() {
        let mut config = Config::default();
        apply(&mut config, "url", "https://cms.example.com").unwrap();
        apply(&mut config, "collection", "posts").unwrap();
        apply(&mut config, "animation.overlay_hold_ms", "1500").unwrap();

        assert_eq!(config.url.as_deref(), Some("https://cms.example.com"));
        assert_eq!(config.collection, "posts");
        assert_eq!(config.animation.overlay_hold_ms, 1500);

        apply(&mut config, "url", "none").unwrap();
        assert!(config.url.is_none());
    }

    #[test]
    fn test_apply_rejects_bad_input() {
        let mut config = Config::default();
        assert!(apply(&mut config, "sync_url", "x").is_err());
        assert!(apply(&mut config, "animation.speed", "3").is_err());
        assert!(apply(&mut config, "animation.decay_window_ms", "slow").is_err());
        assert!(apply(&mut config, "collection", "").is_err());
        assert_eq!(config.collection, "texts");
    }

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token("abc"), "****");
        assert_eq!(mask_token("secret-token"), "secr****");
    }
}
