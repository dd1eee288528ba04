pub mod generate;
pub mod parse;
pub mod types;

use regex::{Captures, Regex};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub use parse::{load_config, parse_config, ConfigError, MAX_INTERVAL};
pub use types::{Config, OutputConfig, ReceiverConfig, ScalewayConfig};

const APP_DIR: &str = "audit-trail-receiver";

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // VAR_NAME starts with a letter or underscore, followed by alphanumerics or underscores
    PATTERN.get_or_init(|| {
        Regex::new(r"\$env\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("env var pattern is valid")
    })
}

/// Full-line YAML comments are left alone by expansion and by the unexpanded check.
fn is_comment_line(line: &str) -> bool {
    line.trim_start().starts_with('#')
}

/// Expands environment variables in a string.
/// Supports $env{VAR_NAME} syntax.
/// If an environment variable is not set, it's left unchanged.
pub fn expand_env_vars(text: &str) -> String {
    text.split_inclusive('\n')
        .map(|line| {
            if is_comment_line(line) {
                line.to_string()
            } else {
                env_var_pattern()
                    .replace_all(line, |caps: &Captures| {
                        std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
                    })
                    .into_owned()
            }
        })
        .collect()
}

/// Names of `$env{...}` references still present outside comments, sorted and deduplicated.
pub fn unexpanded_env_vars(text: &str) -> Vec<String> {
    let mut vars: Vec<String> = text
        .lines()
        .filter(|line| !is_comment_line(line))
        .flat_map(|line| env_var_pattern().captures_iter(line))
        .map(|caps| caps[1].to_string())
        .collect();
    vars.sort();
    vars.dedup();
    vars
}

/// Expands tilde (~) in paths to the user's home directory.
/// Returns the path unchanged if it doesn't start with tilde or home directory cannot be determined.
pub fn expand_tilde(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();

    if let Some(rest) = path_str.strip_prefix("~/") {
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(rest);
        }
    } else if path_str == "~" {
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir;
        }
    }

    path.to_path_buf()
}

/// Resolves the config file path based on explicit argument or default locations.
/// Returns the first existing path from:
/// 1. Explicit path (if provided, with tilde expansion)
/// 2. ~/.config/audit-trail-receiver/config.yml
/// 3. /etc/audit-trail-receiver/config.yml
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(expand_tilde(path));
    }

    if let Some(user_config) = user_config_path() {
        if user_config.exists() {
            return Some(user_config);
        }
    }

    let system_config = system_config_path();
    if system_config.exists() {
        return Some(system_config);
    }

    None
}

pub fn user_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config").join(APP_DIR).join("config.yml"))
}

pub fn system_config_path() -> PathBuf {
    PathBuf::from("/etc").join(APP_DIR).join("config.yml")
}
