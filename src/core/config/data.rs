use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_BOT_NICKNAME: &str = "Assistant";
const DEFAULT_BOT_AVATAR: &str = "https://api.dicebear.com/9.x/bottts-neutral/svg?seed=Confab";
const DEFAULT_USER_AVATAR: &str = "https://api.dicebear.com/9.x/avataaars/svg?seed=Felix";

/// Persisted user settings.
///
/// Several historical spellings of these keys exist in the wild
/// (`ai_provider`, `ollama_model`, `ollama_base_url`); they are accepted on
/// load and written back under the stable names, so old files upgrade
/// themselves on the next save. A blank string is treated the same as an
/// absent key.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Settings {
    /// Which backend to talk to: `local`, `hosted`, or `builtin`.
    /// Unset means `local`.
    #[serde(default, alias = "ai_provider", skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, alias = "ollama_model", skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(
        default,
        alias = "ollama_base_url",
        skip_serializing_if = "Option::is_none"
    )]
    pub base_url: Option<String>,
    #[serde(default)]
    pub profile: Profile,
}

/// How the two participants are presented in the thread.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Profile {
    #[serde(default = "default_bot_nickname")]
    pub bot_nickname: String,
    #[serde(default = "default_bot_avatar")]
    pub bot_avatar: String,
    #[serde(default = "default_user_avatar")]
    pub user_avatar: String,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            bot_nickname: default_bot_nickname(),
            bot_avatar: default_bot_avatar(),
            user_avatar: default_user_avatar(),
        }
    }
}

fn default_bot_nickname() -> String {
    DEFAULT_BOT_NICKNAME.to_string()
}

fn default_bot_avatar() -> String {
    DEFAULT_BOT_AVATAR.to_string()
}

fn default_user_avatar() -> String {
    DEFAULT_USER_AVATAR.to_string()
}

impl Settings {
    /// The configured provider kind, if one is meaningfully set.
    pub fn provider_hint(&self) -> Option<&str> {
        non_blank(self.provider.as_deref())
    }

    /// The configured model, if one is meaningfully set.
    pub fn model_hint(&self) -> Option<&str> {
        non_blank(self.model.as_deref())
    }

    /// The configured base URL, if one is meaningfully set.
    pub fn base_url_hint(&self) -> Option<&str> {
        non_blank(self.base_url.as_deref())
    }

    pub fn print_all(&self, path: &Path) {
        println!("Settings ({}):", path_display(path));
        print_setting("provider", self.provider_hint());
        print_setting("model", self.model_hint());
        print_setting("base-url", self.base_url_hint());
        println!("  bot-nickname: {}", self.profile.bot_nickname);
        println!("  bot-avatar: {}", self.profile.bot_avatar);
        println!("  user-avatar: {}", self.profile.user_avatar);
    }
}

fn print_setting(key: &str, value: Option<&str>) {
    match value {
        Some(value) => println!("  {key}: {value}"),
        None => println!("  {key}: (unset)"),
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Get a user-friendly display string for a path.
/// Converts absolute paths to use ~ notation on Unix-like systems when possible.
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
