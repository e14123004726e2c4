use parkmap_config::PipelineConfig;
use parkmap_core::descriptor::{
    EXPORT_FORMAT_VERSION, GeometryDescriptor, MapExport, Shape, Size2, Style,
};
use parkmap_core::geometry::{Bounds2D, Point2};
use parkmap_core::model::{Entity, LayerCategory, Row};
use tracing::{debug, info, trace, warn};

use crate::bounds::dataset_bounds;
use crate::classify::{classify_layer, icon_asset, icon_size, layer_colors, render_category};
use crate::errors::{EntityError, PipelineError};
use crate::grouping::group_entities;
use crate::path::{centroid, encode_path, relative_to_origin};
use crate::transform::{CoordinateTransform, global_scale};

/// 被跳过的实体及原因。
#[derive(Debug, Clone, PartialEq)]
pub struct EntityDiagnostic {
    pub entity_id: String,
    pub error: EntityError,
}

/// 单次流水线的输出，全部为新分配的数据。
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub bounds: Bounds2D,
    pub scale: f64,
    pub entity_count: usize,
    pub descriptors: Vec<GeometryDescriptor>,
    pub diagnostics: Vec<EntityDiagnostic>,
}

impl PipelineOutput {
    pub fn count_by_category(&self, category: LayerCategory) -> usize {
        self.descriptors
            .iter()
            .filter(|descriptor| descriptor.category == category)
            .count()
    }

    pub fn into_export(self, source: Option<String>) -> MapExport {
        MapExport {
            format_version: EXPORT_FORMAT_VERSION,
            source,
            bounds: self.bounds,
            scale: self.scale,
            elements: self.descriptors,
        }
    }
}

/// 解析 → 分组 → 范围 → 分类 → 变换 → 编码，同步一次跑完。
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    #[inline]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn run(&self, rows: &[Row]) -> Result<PipelineOutput, PipelineError> {
        let bounds = dataset_bounds(rows).ok_or(PipelineError::EmptyDataset)?;
        if bounds.width() == 0.0 || bounds.height() == 0.0 {
            return Err(PipelineError::DegenerateBounds {
                width: bounds.width(),
                height: bounds.height(),
            });
        }
        let scale = global_scale(&bounds, self.config.target_pixel_width)?;
        let transform = CoordinateTransform::from_bounds(&bounds, scale, self.config.flip_y);

        let entities = group_entities(rows);
        let mut descriptors = Vec::with_capacity(entities.len());
        let mut diagnostics = Vec::new();
        for entity in &entities {
            match self.build_descriptor(entity, &transform) {
                Ok(Some(descriptor)) => descriptors.push(descriptor),
                Ok(None) => {
                    trace!(entity = entity.key(), layer = entity.layer(), "实体无可渲染几何");
                }
                Err(error) => {
                    warn!(entity = entity.key(), error = %error, "实体构建失败，已跳过");
                    diagnostics.push(EntityDiagnostic {
                        entity_id: entity.key().to_string(),
                        error,
                    });
                }
            }
        }

        info!(
            rows = rows.len(),
            entities = entities.len(),
            elements = descriptors.len(),
            skipped = diagnostics.len(),
            scale,
            "几何流水线完成"
        );
        Ok(PipelineOutput {
            bounds,
            scale,
            entity_count: entities.len(),
            descriptors,
            diagnostics,
        })
    }

    /// 只处理指定图层，范围与缩放也按该子集计算。
    pub fn run_for_layer(
        &self,
        rows: &[Row],
        layer: &str,
    ) -> Result<PipelineOutput, PipelineError> {
        let subset: Vec<Row> = rows.iter().filter(|row| row.layer == layer).cloned().collect();
        debug!(layer, rows = subset.len(), "按图层筛选");
        self.run(&subset)
    }

    /// 构建单个实体的几何描述；`Ok(None)` 表示该实体不产生几何。
    pub fn build_descriptor(
        &self,
        entity: &Entity,
        transform: &CoordinateTransform,
    ) -> Result<Option<GeometryDescriptor>, EntityError> {
        // 点图层却以闭合多边形记录：在原始坐标质心处放置图标
        if classify_layer(entity.layer()) == LayerCategory::Point && entity.is_closed() {
            let anchor = centroid(entity.points()).ok_or(EntityError::InsufficientPoints {
                required: 1,
                actual: 0,
            })?;
            return self.icon(entity, transform.apply(anchor)).map(Some);
        }

        match render_category(entity) {
            LayerCategory::Point => {
                let anchor = first_point(entity)?;
                self.icon(entity, transform.apply(anchor)).map(Some)
            }
            LayerCategory::Text => match entity.text() {
                Some(content) => {
                    let anchor = transform.apply(first_point(entity)?);
                    self.text(entity, content, anchor).map(Some)
                }
                None => Ok(None),
            },
            LayerCategory::Polygon if entity.is_polygon() => self
                .path(entity, transform, LayerCategory::Polygon)
                .map(Some),
            LayerCategory::Polygon | LayerCategory::Line => {
                self.path(entity, transform, LayerCategory::Line).map(Some)
            }
            LayerCategory::Unclassified => Ok(None),
        }
    }

    fn path(
        &self,
        entity: &Entity,
        transform: &CoordinateTransform,
        category: LayerCategory,
    ) -> Result<GeometryDescriptor, EntityError> {
        if entity.point_count() < 2 {
            return Err(EntityError::InsufficientPoints {
                required: 2,
                actual: entity.point_count(),
            });
        }
        let canvas: Vec<Point2> = entity.points().map(|point| transform.apply(point)).collect();
        for point in &canvas {
            ensure_finite(*point)?;
        }
        let (bounds, relative) =
            relative_to_origin(&canvas).ok_or(EntityError::InsufficientPoints {
                required: 2,
                actual: 0,
            })?;

        let closed = category == LayerCategory::Polygon;
        let colors = layer_colors(entity.layer(), &self.config);
        let style = if closed {
            Style {
                fill: Some(colors.fill),
                stroke: colors.stroke,
                opacity: self.config.polygon_opacity,
            }
        } else {
            Style {
                fill: None,
                stroke: colors.stroke,
                opacity: self.config.line_opacity,
            }
        };

        Ok(GeometryDescriptor {
            id: entity.key().to_string(),
            layer: entity.layer().to_string(),
            category,
            position: bounds.min(),
            size: Size2::non_degenerate(bounds.width(), bounds.height()),
            shape: Shape::Path {
                commands: encode_path(&relative, closed),
                closed,
            },
            style,
        })
    }

    fn icon(&self, entity: &Entity, anchor: Point2) -> Result<GeometryDescriptor, EntityError> {
        ensure_finite(anchor)?;
        let (width, height) = icon_size(entity.layer(), &self.config);
        let colors = layer_colors(entity.layer(), &self.config);
        Ok(GeometryDescriptor {
            id: entity.key().to_string(),
            layer: entity.layer().to_string(),
            category: LayerCategory::Point,
            position: anchor.translate(-width / 2.0, -height / 2.0),
            size: Size2::non_degenerate(width, height),
            shape: Shape::Icon {
                asset: icon_asset(entity.layer(), &self.config),
                width,
                height,
            },
            style: Style {
                fill: None,
                stroke: colors.stroke,
                opacity: 1.0,
            },
        })
    }

    fn text(
        &self,
        entity: &Entity,
        content: &str,
        anchor: Point2,
    ) -> Result<GeometryDescriptor, EntityError> {
        ensure_finite(anchor)?;
        let colors = layer_colors(entity.layer(), &self.config);
        Ok(GeometryDescriptor {
            id: entity.key().to_string(),
            layer: entity.layer().to_string(),
            category: LayerCategory::Text,
            position: anchor,
            size: Size2::non_degenerate(0.0, 0.0),
            shape: Shape::Text {
                content: content.to_string(),
                style: entity.text_style().map(str::to_string),
            },
            style: Style {
                fill: None,
                stroke: colors.stroke,
                opacity: 1.0,
            },
        })
    }
}

fn first_point(entity: &Entity) -> Result<Point2, EntityError> {
    entity
        .points()
        .next()
        .ok_or(EntityError::InsufficientPoints {
            required: 1,
            actual: 0,
        })
}

fn ensure_finite(point: Point2) -> Result<(), EntityError> {
    if point.is_finite() {
        Ok(())
    } else {
        Err(EntityError::NonFiniteCoordinate {
            x: point.x(),
            y: point.y(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parkmap_core::descriptor::PathCommand;

    fn row(x: f64, y: f64, layer: &str, handle: &str) -> Row {
        Row {
            x,
            y,
            z: 0.0,
            layer: layer.to_string(),
            paper_space: "0".to_string(),
            sub_classes: String::new(),
            linetype: String::new(),
            entity_handle: handle.to_string(),
            text: None,
            style: None,
        }
    }

    fn find<'a>(output: &'a PipelineOutput, id: &str) -> &'a GeometryDescriptor {
        output
            .descriptors
            .iter()
            .find(|descriptor| descriptor.id == id)
            .unwrap_or_else(|| panic!("descriptor {id} missing"))
    }

    #[test]
    fn empty_rows_fail_pipeline() {
        let pipeline = Pipeline::default();
        assert_eq!(pipeline.run(&[]).unwrap_err(), PipelineError::EmptyDataset);
    }

    #[test]
    fn zero_width_or_height_fail_pipeline() {
        let pipeline = Pipeline::default();
        let vertical = vec![row(5.0, 0.0, "p-wall", "a"), row(5.0, 9.0, "p-wall", "a")];
        assert!(matches!(
            pipeline.run(&vertical),
            Err(PipelineError::DegenerateBounds { .. })
        ));
        let horizontal = vec![row(0.0, 2.0, "p-wall", "a"), row(9.0, 2.0, "p-wall", "a")];
        assert!(matches!(
            pipeline.run(&horizontal),
            Err(PipelineError::DegenerateBounds { .. })
        ));
    }

    #[test]
    fn parking_square_becomes_closed_polygon() {
        let rows = vec![
            row(0.0, 0.0, "p-parking-basic", "h1"),
            row(10.0, 0.0, "p-parking-basic", "h1"),
            row(10.0, 10.0, "p-parking-basic", "h1"),
            row(0.0, 10.0, "p-parking-basic", "h1"),
            row(0.0, 0.0, "p-parking-basic", "h1"),
        ];
        let output = Pipeline::default().run(&rows).expect("pipeline");
        assert!((output.scale - 100.0).abs() < 1e-9);
        assert_eq!(output.entity_count, 1);

        let spot = find(&output, "p-parking-basic_h1");
        assert_eq!(spot.category, LayerCategory::Polygon);
        assert_eq!(spot.position, Point2::new(0.0, 0.0));
        assert!((spot.size.width - 1000.0).abs() < 1e-9);
        assert!((spot.size.height - 1000.0).abs() < 1e-9);
        assert_eq!(spot.style.fill.as_deref(), Some("#e3f2fd"));
        assert_eq!(spot.style.stroke, "#1e88e5");
        match &spot.shape {
            Shape::Path { commands, closed } => {
                assert!(*closed);
                assert_eq!(commands.len(), 6);
                assert_eq!(commands[0], PathCommand::MoveTo(Point2::new(0.0, 0.0)));
                assert_eq!(commands[2], PathCommand::LineTo(Point2::new(1000.0, 1000.0)));
                assert_eq!(commands[5], PathCommand::Close);
            }
            other => panic!("unexpected shape: {other:?}"),
        }
    }

    #[test]
    fn path_is_relative_to_entity_corner() {
        let rows = vec![
            row(0.0, 0.0, "p-wall", "frame"),
            row(10.0, 10.0, "p-wall", "frame"),
            row(6.0, 2.0, "p-lane", "l1"),
            row(4.0, 5.0, "p-lane", "l1"),
        ];
        let output = Pipeline::default().run(&rows).expect("pipeline");
        let lane = find(&output, "p-lane_l1");
        assert_eq!(lane.category, LayerCategory::Line);
        assert!((lane.position.x() - 400.0).abs() < 1e-9);
        assert!((lane.position.y() - 200.0).abs() < 1e-9);
        assert!(lane.style.fill.is_none());
        match &lane.shape {
            Shape::Path { commands, closed } => {
                assert!(!*closed);
                assert_eq!(commands.len(), 2);
                match commands[0] {
                    PathCommand::MoveTo(p) => {
                        assert!((p.x() - 200.0).abs() < 1e-9);
                        assert!(p.y().abs() < 1e-9);
                    }
                    other => panic!("unexpected command: {other:?}"),
                }
            }
            other => panic!("unexpected shape: {other:?}"),
        }
    }

    #[test]
    fn closed_point_layer_uses_raw_centroid() {
        let rows = vec![
            row(0.0, 0.0, "p-wall", "frame"),
            row(10.0, 10.0, "p-wall", "frame"),
            row(0.0, 0.0, "p-cctv", "c1"),
            row(2.0, 0.0, "p-cctv", "c1"),
            row(2.0, 2.0, "p-cctv", "c1"),
            row(0.0, 2.0, "p-cctv", "c1"),
            row(0.0, 0.0, "p-cctv", "c1"),
        ];
        let output = Pipeline::default().run(&rows).expect("pipeline");
        let camera = find(&output, "p-cctv_c1");
        assert_eq!(camera.category, LayerCategory::Point);
        // 质心 (0.8, 0.8) → 画布 (80, 80)，24×24 图标居中
        assert!((camera.position.x() - 68.0).abs() < 1e-9);
        assert!((camera.position.y() - 68.0).abs() < 1e-9);
        match &camera.shape {
            Shape::Icon {
                asset,
                width,
                height,
            } => {
                assert_eq!(asset, "icons/cctv.svg");
                assert_eq!((*width, *height), (24.0, 24.0));
            }
            other => panic!("unexpected shape: {other:?}"),
        }
    }

    #[test]
    fn single_point_icon_and_text_label() {
        let mut label = row(5.0, 5.0, "t-label", "t1");
        label.text = Some("B1-001".to_string());
        label.style = Some("Standard".to_string());
        let rows = vec![
            row(0.0, 0.0, "p-wall", "frame"),
            row(10.0, 10.0, "p-wall", "frame"),
            row(1.0, 1.0, "p-sensor", "s1"),
            label,
            row(3.0, 3.0, "t-label", "empty"),
        ];
        let output = Pipeline::default().run(&rows).expect("pipeline");

        let sensor = find(&output, "p-sensor_s1");
        assert!((sensor.position.x() - 90.0).abs() < 1e-9);
        assert!((sensor.size.width - 20.0).abs() < 1e-9);

        let text = find(&output, "t-label_t1");
        assert_eq!(text.position, Point2::new(500.0, 500.0));
        assert_eq!(text.size, Size2::new(1.0, 1.0));
        assert_eq!(
            text.shape,
            Shape::Text {
                content: "B1-001".to_string(),
                style: Some("Standard".to_string()),
            }
        );
        // 无文字内容的文字图层不产生几何
        assert!(output.descriptors.iter().all(|d| d.id != "t-label_empty"));
        assert!(output.diagnostics.is_empty());
    }

    #[test]
    fn unknown_closed_triangle_falls_back_to_line() {
        let rows = vec![
            row(0.0, 0.0, "misc", "tri"),
            row(4.0, 3.0, "misc", "tri"),
            row(0.0, 0.0, "misc", "tri"),
            row(9.0, 9.0, "misc", "dot"),
        ];
        let output = Pipeline::default().run(&rows).expect("pipeline");
        let triangle = find(&output, "misc_tri");
        assert_eq!(triangle.category, LayerCategory::Line);
        match &triangle.shape {
            Shape::Path { commands, closed } => {
                assert!(!*closed);
                assert!(!commands.contains(&PathCommand::Close));
            }
            other => panic!("unexpected shape: {other:?}"),
        }
        // 未闭合的未知图层静默丢弃
        assert_eq!(output.descriptors.len(), 1);
        assert!(output.diagnostics.is_empty());
    }

    #[test]
    fn open_parking_outline_renders_as_line() {
        let rows = vec![
            row(0.0, 0.0, "p-parking-basic", "open"),
            row(10.0, 0.0, "p-parking-basic", "open"),
            row(10.0, 10.0, "p-parking-basic", "open"),
        ];
        let output = Pipeline::default().run(&rows).expect("pipeline");
        let outline = find(&output, "p-parking-basic_open");
        assert_eq!(outline.category, LayerCategory::Line);
        assert!(matches!(outline.shape, Shape::Path { closed: false, .. }));
    }

    #[test]
    fn failing_entities_are_isolated() {
        let rows = vec![
            row(0.0, 0.0, "p-wall", "w1"),
            row(1e-300, 0.0, "p-wall", "w1"),
            row(0.0, 1e10, "p-cctv", "far"),
            row(0.0, 0.0, "p-lane", "single"),
        ];
        let output = Pipeline::default().run(&rows).expect("pipeline");
        assert_eq!(output.descriptors.len(), 1);
        assert_eq!(output.descriptors[0].id, "p-wall_w1");

        let ids: Vec<&str> = output
            .diagnostics
            .iter()
            .map(|diagnostic| diagnostic.entity_id.as_str())
            .collect();
        assert_eq!(ids, vec!["p-cctv_far", "p-lane_single"]);
        assert!(matches!(
            output.diagnostics[0].error,
            EntityError::NonFiniteCoordinate { .. }
        ));
        assert_eq!(
            output.diagnostics[1].error,
            EntityError::InsufficientPoints {
                required: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn layer_run_uses_subset_bounds() {
        let rows = vec![
            row(0.0, 0.0, "p-wall", "w1"),
            row(100.0, 100.0, "p-wall", "w1"),
            row(10.0, 10.0, "p-lane", "l1"),
            row(20.0, 15.0, "p-lane", "l1"),
        ];
        let output = Pipeline::default()
            .run_for_layer(&rows, "p-lane")
            .expect("pipeline");
        assert_eq!(output.bounds.min(), Point2::new(10.0, 10.0));
        assert!((output.scale - 100.0).abs() < 1e-9);
        assert_eq!(output.descriptors.len(), 1);
        assert!(matches!(
            Pipeline::default().run_for_layer(&rows, "p-cctv"),
            Err(PipelineError::EmptyDataset)
        ));
    }

    #[test]
    fn export_carries_bounds_and_scale() {
        let rows = vec![row(0.0, 0.0, "p-wall", "w1"), row(4.0, 2.0, "p-wall", "w1")];
        let output = Pipeline::default().run(&rows).expect("pipeline");
        assert_eq!(output.count_by_category(LayerCategory::Line), 1);
        let export = output.into_export(Some("lot.csv".to_string()));
        assert_eq!(export.format_version, EXPORT_FORMAT_VERSION);
        assert_eq!(export.source.as_deref(), Some("lot.csv"));
        assert!((export.scale - 250.0).abs() < 1e-9);
        assert_eq!(export.elements.len(), 1);
    }
}
