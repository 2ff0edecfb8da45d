//! Shell completion script generation.

use crate::error::{BackstageError, Result};
use clap::Command;
use clap_complete::{generate, Shell};
use std::io::Write;

/// Supported shell types for completion scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellType {
    Bash,
    Zsh,
    Fish,
}

pub const SUPPORTED_SHELLS: &[&str] = &["bash", "zsh", "fish"];

impl ShellType {
    pub fn to_clap_shell(self) -> Shell {
        match self {
            ShellType::Bash => Shell::Bash,
            ShellType::Zsh => Shell::Zsh,
            ShellType::Fish => Shell::Fish,
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "bash" => Ok(ShellType::Bash),
            "zsh" => Ok(ShellType::Zsh),
            "fish" => Ok(ShellType::Fish),
            _ => Err(BackstageError::Config(format!(
                "Unsupported shell: '{}'. Supported shells are: {}.",
                name,
                SUPPORTED_SHELLS.join(", ")
            ))),
        }
    }
}

/// Write the completion script for `cmd` to `out`.
pub fn write_completion_script(shell: ShellType, cmd: &mut Command, out: &mut dyn Write) {
    let name = cmd.get_name().to_string();
    generate(shell.to_clap_shell(), cmd, name, out);
}
