use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// 应用配置的根结构。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub resources: ResourceConfig,
}

impl AppConfig {
    /// 从显式路径加载配置。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// `PARKMAP_CONFIG` 指定的文件优先，其次是相对工作目录的 `config/default.toml`，
    /// 都没有时返回内建默认值。
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os("PARKMAP_CONFIG") {
            return Self::from_file(PathBuf::from(path));
        }

        let default_path = Path::new("config").join("default.toml");
        if default_path.is_file() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }
}

/// 日志配置，支持设置默认等级。
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

/// CSV → 画布几何流水线的可调参数。
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// 全局缩放的目标像素宽度：`scale = target_pixel_width / (max_x - min_x)`。
    #[serde(default = "PipelineConfig::default_target_pixel_width")]
    pub target_pixel_width: f64,
    #[serde(default = "PipelineConfig::default_flip_y")]
    pub flip_y: bool,
    #[serde(default = "PipelineConfig::default_icon_edge")]
    pub icon_width: f64,
    #[serde(default = "PipelineConfig::default_icon_edge")]
    pub icon_height: f64,
    #[serde(default = "PipelineConfig::default_fallback_fill")]
    pub fallback_fill: String,
    #[serde(default = "PipelineConfig::default_fallback_stroke")]
    pub fallback_stroke: String,
    #[serde(default = "PipelineConfig::default_fallback_icon")]
    pub fallback_icon: String,
    #[serde(default = "PipelineConfig::default_polygon_opacity")]
    pub polygon_opacity: f64,
    #[serde(default = "PipelineConfig::default_line_opacity")]
    pub line_opacity: f64,
}

impl PipelineConfig {
    fn default_target_pixel_width() -> f64 {
        1000.0
    }

    fn default_flip_y() -> bool {
        true
    }

    fn default_icon_edge() -> f64 {
        20.0
    }

    fn default_fallback_fill() -> String {
        "#e0e0e0".to_string()
    }

    fn default_fallback_stroke() -> String {
        "#9e9e9e".to_string()
    }

    fn default_fallback_icon() -> String {
        "icons/default.svg".to_string()
    }

    fn default_polygon_opacity() -> f64 {
        0.8
    }

    fn default_line_opacity() -> f64 {
        1.0
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_pixel_width: Self::default_target_pixel_width(),
            flip_y: Self::default_flip_y(),
            icon_width: Self::default_icon_edge(),
            icon_height: Self::default_icon_edge(),
            fallback_fill: Self::default_fallback_fill(),
            fallback_stroke: Self::default_fallback_stroke(),
            fallback_icon: Self::default_fallback_icon(),
            polygon_opacity: Self::default_polygon_opacity(),
            line_opacity: Self::default_line_opacity(),
        }
    }
}

/// 图标资源的查找根目录。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceConfig {
    #[serde(default)]
    pub asset_roots: Vec<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析配置文件 {path:?} 失败: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl ConfigError {
    /// 出错的配置文件路径。
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Io { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}
