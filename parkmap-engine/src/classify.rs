//! 图层名 → 渲染类别 / 颜色 / 图标的静态查找表。
//!
//! 各表按顺序线性匹配，先匹配者生效。类别判定只依赖图层名；
//! 唯一与几何相关的规则（未分类但闭合的实体按线段渲染）在 [`render_category`] 中。

use parkmap_config::PipelineConfig;
use parkmap_core::model::{Entity, LayerCategory};

use self::LayerPattern::{Contains, Exact, Prefix};

/// 停车位图层前缀。
pub const PARKING_PREFIX: &str = "p-parking-";
/// 电梯图层名（精确匹配）。
pub const ELEVATOR_LAYER: &str = "p-elevator";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerPattern {
    Prefix(&'static str),
    Contains(&'static str),
    Exact(&'static str),
}

impl LayerPattern {
    #[inline]
    pub fn matches(self, layer: &str) -> bool {
        match self {
            LayerPattern::Prefix(prefix) => layer.starts_with(prefix),
            LayerPattern::Contains(needle) => layer.contains(needle),
            LayerPattern::Exact(name) => layer == name,
        }
    }
}

const POINT_LAYERS: &[LayerPattern] = &[
    Prefix("p-cctv"),
    Prefix("p-ev-charger"),
    Prefix("p-charger"),
    Prefix("p-emergency-bell"),
    Prefix("p-fire-extinguisher"),
    Prefix("p-hydrant"),
    Prefix("p-exit-sign"),
    Prefix("p-sensor"),
];

const TEXT_LAYERS: &[LayerPattern] = &[Prefix("t-"), Prefix("p-text"), Prefix("p-label")];

/// 多边形候选规则，分组阶段的 `is_polygon` 与分类共用。
const POLYGON_LAYERS: &[LayerPattern] = &[
    Prefix(PARKING_PREFIX),
    Contains("area"),
    Exact(ELEVATOR_LAYER),
];

const LINE_LAYERS: &[LayerPattern] = &[
    Prefix("p-wall"),
    Prefix("p-lane"),
    Prefix("p-line"),
    Prefix("p-arrow"),
    Prefix("p-curb"),
    Prefix("p-pillar"),
    Prefix("p-ramp"),
];

/// 类别检查顺序：点 → 文字 → 多边形 → 线。
const CATEGORY_TABLES: &[(LayerCategory, &[LayerPattern])] = &[
    (LayerCategory::Point, POINT_LAYERS),
    (LayerCategory::Text, TEXT_LAYERS),
    (LayerCategory::Polygon, POLYGON_LAYERS),
    (LayerCategory::Line, LINE_LAYERS),
];

struct PaletteEntry {
    pattern: LayerPattern,
    fill: &'static str,
    stroke: &'static str,
}

const PALETTE: &[PaletteEntry] = &[
    PaletteEntry {
        pattern: Prefix("p-parking-ev"),
        fill: "#e8f5e9",
        stroke: "#43a047",
    },
    PaletteEntry {
        pattern: Prefix("p-parking-disabled"),
        fill: "#fff3e0",
        stroke: "#fb8c00",
    },
    PaletteEntry {
        pattern: Prefix("p-parking-compact"),
        fill: "#f3e5f5",
        stroke: "#8e24aa",
    },
    PaletteEntry {
        pattern: Prefix(PARKING_PREFIX),
        fill: "#e3f2fd",
        stroke: "#1e88e5",
    },
    PaletteEntry {
        pattern: Exact(ELEVATOR_LAYER),
        fill: "#ede7f6",
        stroke: "#5e35b1",
    },
    PaletteEntry {
        pattern: Contains("area"),
        fill: "#fffde7",
        stroke: "#fbc02d",
    },
    PaletteEntry {
        pattern: Prefix("p-wall"),
        fill: "#424242",
        stroke: "#424242",
    },
    PaletteEntry {
        pattern: Prefix("p-lane"),
        fill: "#fff9c4",
        stroke: "#fdd835",
    },
    PaletteEntry {
        pattern: Prefix("p-cctv"),
        fill: "#ffebee",
        stroke: "#d32f2f",
    },
    PaletteEntry {
        pattern: Prefix("p-ev-charger"),
        fill: "#e8f5e9",
        stroke: "#2e7d32",
    },
    PaletteEntry {
        pattern: Prefix("p-charger"),
        fill: "#e8f5e9",
        stroke: "#2e7d32",
    },
    PaletteEntry {
        pattern: Prefix("t-"),
        fill: "#ffffff",
        stroke: "#212121",
    },
];

const ICON_ASSETS: &[(LayerPattern, &str)] = &[
    (Prefix("p-cctv"), "icons/cctv.svg"),
    (Prefix("p-ev-charger"), "icons/ev_charger.svg"),
    (Prefix("p-charger"), "icons/charger.svg"),
    (Prefix("p-emergency-bell"), "icons/emergency_bell.svg"),
    (Prefix("p-fire-extinguisher"), "icons/fire_extinguisher.svg"),
    (Prefix("p-hydrant"), "icons/hydrant.svg"),
    (Prefix("p-exit-sign"), "icons/exit_sign.svg"),
    (Prefix("p-sensor"), "icons/sensor.svg"),
];

const ICON_SIZES: &[(LayerPattern, (f64, f64))] = &[
    (Prefix("p-cctv"), (24.0, 24.0)),
    (Prefix("p-ev-charger"), (28.0, 28.0)),
    (Prefix("p-charger"), (28.0, 28.0)),
    (Prefix("p-exit-sign"), (32.0, 16.0)),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerColors {
    pub fill: String,
    pub stroke: String,
}

#[inline]
fn matches_any(patterns: &[LayerPattern], layer: &str) -> bool {
    patterns.iter().any(|pattern| pattern.matches(layer))
}

/// 图层名是否满足多边形命名规则：停车位前缀、包含 `area`、或为电梯图层。
pub fn is_polygon_layer(layer: &str) -> bool {
    matches_any(POLYGON_LAYERS, layer)
}

/// 纯字符串判定，不看几何。
pub fn classify_layer(layer: &str) -> LayerCategory {
    CATEGORY_TABLES
        .iter()
        .find(|(_, patterns)| matches_any(patterns, layer))
        .map(|(category, _)| *category)
        .unwrap_or(LayerCategory::Unclassified)
}

/// 实际渲染类别：未分类但闭合（≥3 点）的实体退化为线段渲染。
pub fn render_category(entity: &Entity) -> LayerCategory {
    match classify_layer(entity.layer()) {
        LayerCategory::Unclassified if entity.is_closed() => LayerCategory::Line,
        category => category,
    }
}

pub fn layer_colors(layer: &str, config: &PipelineConfig) -> LayerColors {
    PALETTE
        .iter()
        .find(|entry| entry.pattern.matches(layer))
        .map(|entry| LayerColors {
            fill: entry.fill.to_string(),
            stroke: entry.stroke.to_string(),
        })
        .unwrap_or_else(|| LayerColors {
            fill: config.fallback_fill.clone(),
            stroke: config.fallback_stroke.clone(),
        })
}

pub fn icon_asset(layer: &str, config: &PipelineConfig) -> String {
    ICON_ASSETS
        .iter()
        .find(|(pattern, _)| pattern.matches(layer))
        .map(|(_, asset)| asset.to_string())
        .unwrap_or_else(|| config.fallback_icon.clone())
}

pub fn icon_size(layer: &str, config: &PipelineConfig) -> (f64, f64) {
    ICON_SIZES
        .iter()
        .find(|(pattern, _)| pattern.matches(layer))
        .map(|(_, size)| *size)
        .unwrap_or((config.icon_width, config.icon_height))
}
