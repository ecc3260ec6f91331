use anyhow::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub mymemory_url: String,
    pub libretranslate_url: String,
    pub libretranslate_api_key: Option<String>,
    pub source_lang: String,
    pub target_lang: String,
    pub debounce_ms: u64,
    pub notification_secs: u64,
    pub request_timeout_secs: u64,
    pub examples: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mymemory_url: "https://api.mymemory.translated.net/get".into(),
            libretranslate_url: "https://libretranslate.de/translate".into(),
            libretranslate_api_key: None,
            source_lang: "en".into(),
            target_lang: "es".into(),
            debounce_ms: 500,
            notification_secs: 3,
            request_timeout_secs: 10,
            examples: vec![
                "Hello, how are you?".into(),
                "Where is the nearest train station?".into(),
                "Thank you very much for your help.".into(),
                "I would like to order a coffee, please.".into(),
            ],
        }
    }
}

const DEFAULT_CONFIG: &str = "\
# quick-translate configuration

# Primary provider (MyMemory, GET)
# mymemory_url = \"https://api.mymemory.translated.net/get\"

# Fallback provider (LibreTranslate, POST)
# libretranslate_url = \"https://libretranslate.de/translate\"

# API key, only needed for LibreTranslate instances that require one
# libretranslate_api_key = \"\"

# Initial language selection
# source_lang = \"en\"
# target_lang = \"es\"

# Pause after the last keystroke before translating (milliseconds)
# debounce_ms = 500

# How long notifications stay visible (seconds)
# notification_secs = 3

# HTTP timeout per provider request (seconds)
# request_timeout_secs = 10

# Preset phrases selectable with :example <n>
# examples = [\"Hello, how are you?\"]
";

impl Config {
    pub fn app_dir() -> PathBuf {
        #[cfg(target_os = "windows")]
        {
            let appdata = std::env::var("APPDATA").unwrap_or_else(|_| ".".into());
            PathBuf::from(appdata).join("quick-translate")
        }
        #[cfg(target_os = "macos")]
        {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("quick-translate")
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        {
            if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
                if !xdg.is_empty() {
                    return PathBuf::from(xdg).join("quick-translate");
                }
            }
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            PathBuf::from(home).join(".config").join("quick-translate")
        }
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::app_dir())
    }

    /// Reads `config.toml` from `dir`, writing a commented template on first run.
    pub fn load_from(dir: &Path) -> Result<Self> {
        let path = dir.join("config.toml");
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&contents)?;
            tracing::info!("Loaded config from {}", path.display());
            return Ok(config);
        }

        if let Err(e) = std::fs::create_dir_all(dir) {
            tracing::warn!("Failed to create config directory: {}", e);
        } else if let Err(e) = std::fs::write(&path, DEFAULT_CONFIG) {
            tracing::warn!("Failed to write default config: {}", e);
        } else {
            tracing::info!("Created default config at {}", path.display());
        }
        Ok(Config::default())
    }
}
