//! Config command handler.
//!
//! Displays, sets and resets `~/.config/backstage/config.toml`.

use crate::config::{
    config_path, load_config_at, save_config_at, set_config_value, validate_config, Config,
    ENV_API_URL, ENV_TOKEN,
};
use crate::error::{BackstageError, Result};
use crate::output::{print_info, print_success, print_warning, CYAN, GRAY, RESET};
use std::path::Path;

/// Show the config file and any environment overrides in effect.
pub fn config_display_command() -> Result<()> {
    let path = config_path()?;
    let config = load_config_at(&path)?;

    println!("{GRAY}# {}{RESET}", path.display());
    print_config_as_toml(&config);

    for key in [ENV_API_URL, ENV_TOKEN] {
        if std::env::var(key).is_ok() {
            print_info(&format!("{} is set and overrides the file value", key));
        }
    }
    if let Err(e) = validate_config(&config) {
        print_warning(&e.to_string());
    }
    Ok(())
}

pub fn config_set_command(key: &str, value: &str) -> Result<()> {
    set_value_at(&config_path()?, key, value)?;
    print_success(&format!("Set {} = {}", key, display_value(key, value)));
    Ok(())
}

pub fn config_reset_command() -> Result<()> {
    let path = config_path()?;
    save_config_at(&Config::default(), &path)?;
    print_success(&format!("Reset {} to defaults", path.display()));
    Ok(())
}

fn set_value_at(path: &Path, key: &str, value: &str) -> Result<Config> {
    let mut config = load_config_at(path)?;
    set_config_value(&mut config, key, value)?;
    save_config_at(&config, path)?;
    Ok(config)
}

fn display_value(key: &str, value: &str) -> String {
    if key == "token" {
        mask_token(value)
    } else {
        value.to_string()
    }
}

/// Show only the last four characters of a token.
fn mask_token(token: &str) -> String {
    let count = token.chars().count();
    if count <= 4 {
        return "*".repeat(count);
    }
    let tail: String = token.chars().skip(count - 4).collect();
    format!("{}{}", "*".repeat(count - 4), tail)
}

fn print_config_as_toml(config: &Config) {
    for line in config_to_toml_string(config).lines() {
        match line.split_once(" = ") {
            Some((key, value)) => println!("{CYAN}{}{RESET} = {}", key, value),
            None => println!("{}", line),
        }
    }
}

/// Render `config` as TOML with the token masked.
pub fn config_to_toml_string(config: &Config) -> String {
    let masked = Config {
        token: mask_token(&config.token),
        ..config.clone()
    };
    toml::to_string(&masked).unwrap_or_else(|e| {
        BackstageError::Config(format!("cannot render config: {}", e)).to_string()
    })
}
