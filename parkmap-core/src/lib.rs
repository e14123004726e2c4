pub mod geometry {
    use glam::DVec2;
    use serde::{Deserialize, Serialize};

    /// 二维点，内部以 `glam::DVec2` 表示，CAD 原始坐标与画布坐标共用此类型。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Point2(pub DVec2);

    impl Point2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn from_vec(vec: DVec2) -> Self {
            Self(vec)
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        #[inline]
        pub fn translate(self, dx: f64, dy: f64) -> Self {
            Self(self.0 + DVec2::new(dx, dy))
        }

        #[inline]
        pub fn is_finite(self) -> bool {
            self.0.is_finite()
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }
    }

    impl From<DVec2> for Point2 {
        fn from(value: DVec2) -> Self {
            Self::from_vec(value)
        }
    }

    /// 轴对齐边界框。`empty()` 以 +∞/−∞ 表示“无数据”。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Bounds2D {
        min: Point2,
        max: Point2,
    }

    impl Bounds2D {
        #[inline]
        pub fn new(min: Point2, max: Point2) -> Self {
            Self { min, max }
        }

        #[inline]
        pub fn empty() -> Self {
            Self {
                min: Point2::new(f64::INFINITY, f64::INFINITY),
                max: Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
            }
        }

        /// 对点集做简单的 min/max 归约；空输入返回 `empty()` 哨兵值。
        pub fn from_points<I>(points: I) -> Self
        where
            I: IntoIterator<Item = Point2>,
        {
            let mut bounds = Self::empty();
            for point in points {
                bounds.include_point(point);
            }
            bounds
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.min.x() > self.max.x() || self.min.y() > self.max.y()
        }

        #[inline]
        pub fn min(&self) -> Point2 {
            self.min
        }

        #[inline]
        pub fn max(&self) -> Point2 {
            self.max
        }

        #[inline]
        pub fn min_x(&self) -> f64 {
            self.min.x()
        }

        #[inline]
        pub fn min_y(&self) -> f64 {
            self.min.y()
        }

        #[inline]
        pub fn max_x(&self) -> f64 {
            self.max.x()
        }

        #[inline]
        pub fn max_y(&self) -> f64 {
            self.max.y()
        }

        /// 宽度；空边界框时为 −∞。
        #[inline]
        pub fn width(&self) -> f64 {
            self.max.x() - self.min.x()
        }

        #[inline]
        pub fn height(&self) -> f64 {
            self.max.y() - self.min.y()
        }

        pub fn include_point(&mut self, point: Point2) {
            if self.is_empty() {
                self.min = point;
                self.max = point;
                return;
            }
            let min_vec = self.min.as_vec2().min(point.as_vec2());
            let max_vec = self.max.as_vec2().max(point.as_vec2());
            self.min = Point2::from_vec(min_vec);
            self.max = Point2::from_vec(max_vec);
        }
    }
}

pub mod model {
    use serde::{Deserialize, Serialize};

    use crate::geometry::Point2;

    /// CSV 中的一行坐标记录。解析后不可变，`x`/`y` 保证为有限数。
    #[derive(Debug, Clone, PartialEq)]
    pub struct Row {
        pub x: f64,
        pub y: f64,
        /// 仅透传，二维渲染不使用。
        pub z: f64,
        pub layer: String,
        pub paper_space: String,
        pub sub_classes: String,
        pub linetype: String,
        pub entity_handle: String,
        pub text: Option<String>,
        pub style: Option<String>,
    }

    impl Row {
        #[inline]
        pub fn position(&self) -> Point2 {
            Point2::new(self.x, self.y)
        }

        /// 分组键 `layer + "_" + entity_handle`，同时作为输出描述的稳定 ID。
        pub fn entity_key(&self) -> String {
            entity_key(&self.layer, &self.entity_handle)
        }
    }

    #[inline]
    pub fn entity_key(layer: &str, entity_handle: &str) -> String {
        format!("{layer}_{entity_handle}")
    }

    /// 渲染类别，由图层名决定。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum LayerCategory {
        Point,
        Polygon,
        Line,
        Text,
        Unclassified,
    }

    impl LayerCategory {
        pub fn as_str(self) -> &'static str {
            match self {
                LayerCategory::Point => "point",
                LayerCategory::Polygon => "polygon",
                LayerCategory::Line => "line",
                LayerCategory::Text => "text",
                LayerCategory::Unclassified => "unclassified",
            }
        }
    }

    /// 同一 (layer, handle) 下的全部行，代表一个可绘制图形。创建后不再修改。
    #[derive(Debug, Clone, PartialEq)]
    pub struct Entity {
        key: String,
        layer: String,
        entity_handle: String,
        rows: Vec<Row>,
        is_closed: bool,
        is_polygon: bool,
    }

    impl Entity {
        /// 由分组结果构造实体；`rows` 为空时返回 `None`。
        /// `polygon_layer` 表示图层名是否满足多边形命名规则。
        pub fn new(key: impl Into<String>, rows: Vec<Row>, polygon_layer: bool) -> Option<Self> {
            let first = rows.first()?;
            let layer = first.layer.clone();
            let entity_handle = first.entity_handle.clone();
            let is_closed = is_closed_ring(&rows);
            Some(Self {
                key: key.into(),
                layer,
                entity_handle,
                is_closed,
                is_polygon: is_closed && polygon_layer,
                rows,
            })
        }

        #[inline]
        pub fn key(&self) -> &str {
            &self.key
        }

        #[inline]
        pub fn layer(&self) -> &str {
            &self.layer
        }

        #[inline]
        pub fn entity_handle(&self) -> &str {
            &self.entity_handle
        }

        #[inline]
        pub fn rows(&self) -> &[Row] {
            &self.rows
        }

        #[inline]
        pub fn point_count(&self) -> usize {
            self.rows.len()
        }

        #[inline]
        pub fn is_closed(&self) -> bool {
            self.is_closed
        }

        #[inline]
        pub fn is_polygon(&self) -> bool {
            self.is_polygon
        }

        pub fn points(&self) -> impl Iterator<Item = Point2> + '_ {
            self.rows.iter().map(Row::position)
        }

        /// 第一行携带的文字内容（文字图层使用）。
        pub fn text(&self) -> Option<&str> {
            self.rows.first().and_then(|row| row.text.as_deref())
        }

        pub fn text_style(&self) -> Option<&str> {
            self.rows.first().and_then(|row| row.style.as_deref())
        }
    }

    /// 至少 3 个点且首尾坐标完全相等（不带容差）。
    pub fn is_closed_ring(rows: &[Row]) -> bool {
        if rows.len() < 3 {
            return false;
        }
        match (rows.first(), rows.last()) {
            (Some(first), Some(last)) => first.x == last.x && first.y == last.y,
            _ => false,
        }
    }
}

pub mod descriptor {
    use serde::{Deserialize, Serialize};

    use crate::geometry::{Bounds2D, Point2};
    use crate::model::LayerCategory;

    /// 导出 JSON 的格式版本。
    pub const EXPORT_FORMAT_VERSION: u32 = 1;

    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Size2 {
        pub width: f64,
        pub height: f64,
    }

    impl Size2 {
        #[inline]
        pub fn new(width: f64, height: f64) -> Self {
            Self { width, height }
        }

        /// 任一维度为 0 时折叠为 1，避免生成无法渲染的图形。
        pub fn non_degenerate(width: f64, height: f64) -> Self {
            let fix = |value: f64| if value == 0.0 { 1.0 } else { value };
            Self {
                width: fix(width),
                height: fix(height),
            }
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    #[serde(tag = "op", content = "point", rename_all = "snake_case")]
    pub enum PathCommand {
        MoveTo(Point2),
        LineTo(Point2),
        Close,
    }

    /// 将路径指令转换为 SVG path data，例如 `M 0 0 L 10 0 Z`。
    pub fn svg_path_data(commands: &[PathCommand]) -> String {
        commands
            .iter()
            .map(|command| match command {
                PathCommand::MoveTo(p) => format!("M {} {}", p.x(), p.y()),
                PathCommand::LineTo(p) => format!("L {} {}", p.x(), p.y()),
                PathCommand::Close => "Z".to_string(),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(tag = "kind", rename_all = "snake_case")]
    pub enum Shape {
        Path {
            commands: Vec<PathCommand>,
            closed: bool,
        },
        Icon {
            asset: String,
            width: f64,
            height: f64,
        },
        Text {
            content: String,
            #[serde(default, skip_serializing_if = "Option::is_none")]
            style: Option<String>,
        },
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Style {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub fill: Option<String>,
        pub stroke: String,
        pub opacity: f64,
    }

    /// 单个实体在画布空间中的几何描述，交给外部渲染层消费。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct GeometryDescriptor {
        pub id: String,
        pub layer: String,
        pub category: LayerCategory,
        /// 包围盒左上角。
        pub position: Point2,
        pub size: Size2,
        pub shape: Shape,
        pub style: Style,
    }

    /// 导出文件的根结构。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct MapExport {
        pub format_version: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub source: Option<String>,
        pub bounds: Bounds2D,
        pub scale: f64,
        pub elements: Vec<GeometryDescriptor>,
    }

    impl MapExport {
        pub fn elements_by_category(
            &self,
            category: LayerCategory,
        ) -> impl Iterator<Item = &GeometryDescriptor> {
            self.elements
                .iter()
                .filter(move |element| element.category == category)
        }
    }
}
