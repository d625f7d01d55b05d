// config.rs — 启动配置：默认值 < JSON 配置文件 < 环境变量 < 命令行
//
// CLI:  virtual-tour [PANORAMA] [--config FILE] [--lang CODE] [--width W] [--height H]
//                     [--yaw DEG] [--pitch DEG]
// Env:  VIRTUAL_TOUR_URL, VIRTUAL_TOUR_LANG

use crate::loader::{PanoramaSource, DEFAULT_PANORAMA_URL};
use crate::panorama::Orientation;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ENV_URL: &str = "VIRTUAL_TOUR_URL";
pub const ENV_LANG: &str = "VIRTUAL_TOUR_LANG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewerConfig {
    pub panorama_url: String,
    pub lang: String,
    pub width: u32,
    pub height: u32,
    pub title: Option<String>,
    /// Horizontal starting angle in degrees.
    pub initial_yaw: f32,
    /// Vertical starting angle in degrees, clamped to the viewer's latitude range.
    pub initial_pitch: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            panorama_url: DEFAULT_PANORAMA_URL.to_string(),
            lang: crate::i18n::FALLBACK_LANG.to_string(),
            width: 1280,
            height: 720,
            title: None,
            initial_yaw: 0.0,
            initial_pitch: 0.0,
        }
    }
}

#[derive(Debug, Default, PartialEq)]
struct CliArgs {
    panorama: Option<String>,
    config: Option<PathBuf>,
    lang: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    yaw: Option<f32>,
    pitch: Option<f32>,
}

fn parse_dimension(flag: &str, value: Option<String>) -> Option<u32> {
    let v = value?;
    match v.parse::<u32>() {
        Ok(n) => Some(n),
        Err(_) => {
            log::warn!("ignoring {flag} {v:?}: not a positive integer");
            None
        }
    }
}

fn parse_angle(flag: &str, value: Option<String>) -> Option<f32> {
    let v = value?;
    match v.parse::<f32>() {
        Ok(deg) if deg.is_finite() => Some(deg),
        _ => {
            log::warn!("ignoring {flag} {v:?}: not an angle in degrees");
            None
        }
    }
}

fn parse_args(args: impl IntoIterator<Item = String>) -> CliArgs {
    let mut cli = CliArgs::default();
    let mut it = args.into_iter();
    while let Some(a) = it.next() {
        match a.as_str() {
            "--config" => cli.config = it.next().map(PathBuf::from),
            "--lang" => cli.lang = it.next(),
            "--width" => cli.width = parse_dimension("--width", it.next()),
            "--height" => cli.height = parse_dimension("--height", it.next()),
            "--yaw" => cli.yaw = parse_angle("--yaw", it.next()),
            "--pitch" => cli.pitch = parse_angle("--pitch", it.next()),
            flag if flag.starts_with("--") => log::warn!("unknown option {flag}"),
            _ if cli.panorama.is_none() => cli.panorama = Some(a.clone()),
            _ => log::warn!("ignoring extra argument {a:?}"),
        }
    }
    cli
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.trim().is_empty())
}

impl ViewerConfig {
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Configuration for this process.
    pub fn resolve() -> Self {
        Self::from_sources(std::env::args().skip(1), |k| std::env::var(k).ok())
    }

    pub fn from_sources(
        args: impl IntoIterator<Item = String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let cli = parse_args(args);

        let mut cfg = match &cli.config {
            Some(path) => Self::load_file(path).unwrap_or_else(|e| {
                log::error!("{e}; falling back to defaults");
                Self::default()
            }),
            None => Self::default(),
        };

        if let Some(url) = non_empty(env(ENV_URL)) {
            cfg.panorama_url = url;
        }
        if let Some(lang) = non_empty(env(ENV_LANG)) {
            cfg.lang = lang;
        }

        if let Some(p) = cli.panorama {
            cfg.panorama_url = p;
        }
        if let Some(lang) = cli.lang {
            cfg.lang = lang;
        }
        if let Some(w) = cli.width {
            cfg.width = w;
        }
        if let Some(h) = cli.height {
            cfg.height = h;
        }
        if let Some(yaw) = cli.yaw {
            cfg.initial_yaw = yaw;
        }
        if let Some(pitch) = cli.pitch {
            cfg.initial_pitch = pitch;
        }

        if cfg.panorama_url.trim().is_empty() {
            cfg.panorama_url = DEFAULT_PANORAMA_URL.to_string();
        }
        cfg
    }

    pub fn source(&self) -> PanoramaSource {
        PanoramaSource::parse(&self.panorama_url)
    }

    pub fn initial_orientation(&self) -> Orientation {
        Orientation::facing(self.initial_yaw, self.initial_pitch)
    }

    pub fn window_title(&self) -> String {
        self.title
            .clone()
            .unwrap_or_else(|| crate::i18n::tr("app.title"))
    }
}
