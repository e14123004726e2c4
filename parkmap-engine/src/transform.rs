use glam::DVec2;
use parkmap_core::geometry::{Bounds2D, Point2};

use crate::errors::PipelineError;

const DEFAULT_SCALE: f64 = 1.0;
const DEFAULT_FLIP_Y: bool = true;

/// 将 CAD 原始坐标映射到画布空间：相对数据集最小值平移后乘以缩放系数。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateTransform {
    pub min_x: f64,
    pub min_y: f64,
    pub scale: f64,
    pub flip_y: bool,
}

impl CoordinateTransform {
    /// 使用默认缩放 1.0 与默认 `flip_y = true`。
    pub fn new(min_x: f64, min_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            scale: DEFAULT_SCALE,
            flip_y: DEFAULT_FLIP_Y,
        }
    }

    pub fn from_bounds(bounds: &Bounds2D, scale: f64, flip_y: bool) -> Self {
        Self {
            min_x: bounds.min_x(),
            min_y: bounds.min_y(),
            scale,
            flip_y,
        }
    }

    #[inline]
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    #[inline]
    pub fn with_flip_y(mut self, flip_y: bool) -> Self {
        self.flip_y = flip_y;
        self
    }

    /// `out_x = (x - min_x) * scale`；
    /// `flip_y` 时 `out_y = |y - min_y| * scale`，保证画布 Y 非负。
    pub fn apply(&self, point: Point2) -> Point2 {
        let offset = point.as_vec2() - DVec2::new(self.min_x, self.min_y);
        let y = if self.flip_y { offset.y.abs() } else { offset.y };
        Point2::from_vec(DVec2::new(offset.x, y) * self.scale)
    }
}

/// 全局缩放：让整张图的宽度固定为 `target_pixel_width` 像素。
pub fn global_scale(bounds: &Bounds2D, target_pixel_width: f64) -> Result<f64, PipelineError> {
    let width = bounds.width();
    if bounds.is_empty() || width == 0.0 || !width.is_finite() {
        return Err(PipelineError::DegenerateBounds {
            width,
            height: bounds.height(),
        });
    }
    let scale = target_pixel_width / width;
    if !scale.is_finite() || scale == 0.0 {
        return Err(PipelineError::InvalidScale(scale));
    }
    Ok(scale)
}
