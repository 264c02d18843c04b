use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::config::themes::ThemeRegistry;

pub mod themes;

const APP_DOMAIN: &str = "io";
const APP_ORG: &str = "Sujets";
const APP_NAME: &str = "sujets";

pub const CONFIG_ENV: &str = "SUJETS_CONFIG";
pub const SERVER_ENV: &str = "SUJETS_SERVER";

pub struct ConfigLoader {
    paths: ConfigPaths,
}

impl ConfigLoader {
    pub fn discover() -> Result<Self> {
        let paths = ConfigPaths::discover()?;
        Ok(Self { paths })
    }

    pub fn with_paths(paths: ConfigPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    pub fn load_or_init(&self) -> Result<AppConfig> {
        self.paths.ensure_directories()?;
        if !self.paths.config_file.exists() {
            let mut default_cfg = AppConfig::default();
            self.write_default_config(&default_cfg)?;
            default_cfg.post_load();
            return Ok(default_cfg);
        }

        self.load()
    }

    pub fn load(&self) -> Result<AppConfig> {
        let raw = fs::read_to_string(&self.paths.config_file)
            .with_context(|| format!("reading config {}", self.paths.config_file.display()))?;
        let mut cfg: AppConfig = toml::from_str(&raw).context("parsing config toml")?;
        cfg.post_load();
        Ok(cfg)
    }

    fn write_default_config(&self, cfg: &AppConfig) -> Result<()> {
        let toml = toml::to_string_pretty(cfg).context("serializing default config")?;
        if let Some(parent) = self.paths.config_file.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
        let mut file = fs::File::create(&self.paths.config_file)
            .with_context(|| format!("creating config {}", self.paths.config_file.display()))?;
        file.write_all(toml.as_bytes())
            .context("writing default config")?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
    pub log_dir: PathBuf,
    pub state_dir: PathBuf,
}

impl ConfigPaths {
    pub fn discover() -> Result<Self> {
        let override_config = env::var(CONFIG_ENV).ok().map(PathBuf::from);

        let project_dirs = ProjectDirs::from(APP_DOMAIN, APP_ORG, APP_NAME)
            .context("resolving XDG project directories")?;

        let config_dir = override_config
            .clone()
            .map(|p| {
                if p.is_dir() {
                    p
                } else {
                    p.parent().map(Path::to_path_buf).unwrap_or(p)
                }
            })
            .unwrap_or_else(|| project_dirs.config_dir().to_path_buf());

        let config_file = override_config
            .filter(|p| p.is_file() || p.extension().is_some())
            .unwrap_or_else(|| config_dir.join("config.toml"));

        let state_dir = project_dirs
            .state_dir()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| project_dirs.data_dir().join("state"));
        let log_dir = state_dir.join("logs");

        Ok(Self {
            config_dir,
            config_file,
            log_dir,
            state_dir,
        })
    }

    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [&self.config_dir, &self.log_dir, &self.state_dir] {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating application directory {}", dir.display()))?;
        }
        Ok(())
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_dir.join("sujets.log")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub theme: ThemeName,
    pub server: ServerOptions,
    pub vocabulary: VocabularyOptions,
    pub navigation: NavigationOptions,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            theme: ThemeName::Dark,
            server: ServerOptions::default(),
            vocabulary: VocabularyOptions::default(),
            navigation: NavigationOptions::default(),
        }
    }
}

impl AppConfig {
    fn post_load(&mut self) {
        if !ThemeRegistry::default().contains(&self.theme) {
            tracing::warn!(?self.theme, "unknown theme in config, falling back to Dark");
            self.theme = ThemeName::Dark;
        }
        if self.navigation.history_capacity == 0 {
            tracing::warn!("history_capacity of 0 is not usable, clamping to 1");
            self.navigation.history_capacity = 1;
        }
        if let Ok(server) = env::var(SERVER_ENV) {
            if !server.trim().is_empty() {
                self.server.base_url = server.trim().to_string();
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerOptions {
    pub base_url: String,
    pub timeout_ms: u64,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            timeout_ms: 10_000,
        }
    }
}

impl ServerOptions {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VocabularyOptions {
    pub tags: Vec<String>,
    pub people: Vec<String>,
    pub tag_abbreviations: IndexMap<String, String>,
    pub person_abbreviations: IndexMap<String, String>,
}

impl Default for VocabularyOptions {
    fn default() -> Self {
        let tags = [
            "AI",
            "Work",
            "Medical",
            "Science",
            "History",
            "Politics",
            "Culture",
            "Sports",
            "Travel",
            "Food & Drink",
            "Observation",
            "Quote",
            "People",
            "Idea/Project",
        ];
        let tag_abbreviations = [
            ("AI", "AI"),
            ("Work", "Wrk"),
            ("Medical", "Med"),
            ("Science", "Sci"),
            ("History", "Hist"),
            ("Politics", "Pol"),
            ("Culture", "Cult"),
            ("Sports", "Sprt"),
            ("Travel", "Trvl"),
            ("Food & Drink", "Food"),
            ("Observation", "Obs"),
            ("Quote", "Qte"),
            ("People", "Ppl"),
            ("Idea/Project", "Idea"),
        ];
        let people = ["S", "Fam", "Stef", "MD", "AK", "ML", "work"];
        Self {
            tags: tags.iter().map(|t| t.to_string()).collect(),
            people: people.iter().map(|p| p.to_string()).collect(),
            tag_abbreviations: tag_abbreviations
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            person_abbreviations: [("work".to_string(), "wrk".to_string())]
                .into_iter()
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationOptions {
    pub history_capacity: usize,
    pub cooldown_ms: u64,
    pub fast_cooldown_ms: u64,
    pub fast_forward_interval_ms: u64,
}

impl Default for NavigationOptions {
    fn default() -> Self {
        Self {
            history_capacity: 10,
            cooldown_ms: 200,
            fast_cooldown_ms: 50,
            fast_forward_interval_ms: 100,
        }
    }
}

impl NavigationOptions {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn fast_cooldown(&self) -> Duration {
        Duration::from_millis(self.fast_cooldown_ms)
    }

    pub fn fast_forward_interval(&self) -> Duration {
        Duration::from_millis(self.fast_forward_interval_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, std::hash::Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ThemeName {
    Dark,
    Light,
    HighContrast,
    Solarized,
}

impl Default for ThemeName {
    fn default() -> Self {
        ThemeName::Dark
    }
}
