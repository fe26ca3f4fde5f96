use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const APP_NAME: &str = "csv-form";
const CONFIG_VERSION: i64 = 1;
const CONFIG_PATH_ENV: &str = "CSV_FORM_CONFIG_PATH";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_MAX_COLUMN_WIDTH: u16 = 40;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            ui: Ui::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ui {
    /// Directory the open and save-as prompts start in.
    pub start_dir: Option<String>,
    pub auto_resize_columns: Option<bool>,
    pub max_column_width: Option<u16>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Log {
    pub enabled: Option<bool>,
    pub level: Option<String>,
    pub dir: Option<String>,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set {CONFIG_PATH_ENV} to the config file")
        })?;
        Ok(config_root.join(APP_NAME).join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} has no `version`; add `version = {CONFIG_VERSION}` at the top",
                    path.display()
                )
            })?;
        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = {CONFIG_VERSION}",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(dir) = &self.ui.start_dir
            && !Path::new(dir).is_dir()
        {
            bail!(
                "ui.start_dir in {} is not a directory: {}",
                path.display(),
                dir
            );
        }

        if let Some(width) = self.ui.max_column_width
            && width < 3
        {
            bail!(
                "ui.max_column_width in {} must be at least 3, got {}",
                path.display(),
                width
            );
        }

        if let Some(level) = &self.log.level {
            tracing_subscriber::EnvFilter::try_new(level).map_err(|e| {
                anyhow!("log.level in {} is invalid ({e}): {level:?}", path.display())
            })?;
        }

        Ok(())
    }

    pub fn start_dir(&self) -> Result<PathBuf> {
        match &self.ui.start_dir {
            Some(dir) => Ok(PathBuf::from(dir)),
            None => env::current_dir().context("resolve current directory"),
        }
    }

    pub fn auto_resize_columns(&self) -> bool {
        self.ui.auto_resize_columns.unwrap_or(true)
    }

    pub fn max_column_width(&self) -> u16 {
        self.ui.max_column_width.unwrap_or(DEFAULT_MAX_COLUMN_WIDTH)
    }

    pub fn log_enabled(&self) -> bool {
        self.log.enabled.unwrap_or(false)
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.log.dir {
            return Ok(PathBuf::from(dir));
        }
        let data_root = dirs::data_local_dir()
            .ok_or_else(|| anyhow!("cannot resolve data directory; set [log].dir"))?;
        Ok(data_root.join(APP_NAME).join("logs"))
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# csv-form config\n# Place this file at: {}\n\nversion = {CONFIG_VERSION}\n\n[ui]\n# Optional. Defaults to the directory csv-form is started from\n# start_dir = \"/absolute/path/to/csv/files\"\nauto_resize_columns = true\nmax_column_width = {DEFAULT_MAX_COLUMN_WIDTH}\n\n[log]\nenabled = false\nlevel = \"{DEFAULT_LOG_LEVEL}\"\n# dir = \"/absolute/path/to/logs\"\n",
            path.display(),
        )
    }
}
