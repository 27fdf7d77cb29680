// SPDX-License-Identifier: GPL-3.0-only

//! Environment-driven configuration.

use std::env;
use std::path::PathBuf;

use tracing::warn;

#[derive(Debug, Clone)]
pub struct Config {
    /// Whether to bring up the X bridge.
    pub xwayland: bool,
    pub cursor_theme: Option<String>,
    pub cursor_size: u32,
    /// Decoration metrics for views that opt into server-side decorations.
    pub border_width: i32,
    pub titlebar_height: i32,
    /// Runtime dir handed to the Xwayland child; everything else in its
    /// environment is cleared.
    pub xdg_runtime_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            xwayland: true,
            cursor_theme: None,
            cursor_size: 24,
            border_width: 4,
            titlebar_height: 12,
            xdg_runtime_dir: None,
        }
    }
}

fn env_i32(name: &str, default: i32) -> i32 {
    match env::var(name) {
        Ok(value) => value.parse().unwrap_or_else(|_| {
            warn!("Ignoring unparsable {}={}", name, value);
            default
        }),
        Err(_) => default,
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            xwayland: env::var("VELD_XWAYLAND").map_or(true, |v| v != "0"),
            cursor_theme: env::var("XCURSOR_THEME").ok(),
            cursor_size: env::var("XCURSOR_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.cursor_size),
            border_width: env_i32("VELD_BORDER_WIDTH", defaults.border_width),
            titlebar_height: env_i32("VELD_TITLEBAR_HEIGHT", defaults.titlebar_height),
            xdg_runtime_dir: env::var_os("XDG_RUNTIME_DIR").map(PathBuf::from),
        }
    }
}
