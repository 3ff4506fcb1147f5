//! Shell-wide constants.

/// Line/token length bounds and the prompt string. The env overrides exist
/// for tests that want to probe the boundary without constructing
/// 2000-character strings.
#[derive(Debug, Clone)]
pub struct ShellConfig {
    pub max_line_len: usize,
    pub max_token_len: usize,
    pub prompt: &'static str,
}

impl Default for ShellConfig {
    fn default() -> Self {
        ShellConfig {
            max_line_len: env_usize("YASH_MAX_LINE", 2000),
            max_token_len: env_usize("YASH_MAX_TOKEN", 30),
            prompt: "# ",
        }
    }
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
