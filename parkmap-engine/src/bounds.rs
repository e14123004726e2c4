use parkmap_core::geometry::{Bounds2D, Point2};
use parkmap_core::model::Row;

/// 对行集合做 min/max 归约。空输入返回 +∞/−∞ 哨兵，调用方需自行检查。
pub fn raw_bounds(rows: &[Row]) -> Bounds2D {
    Bounds2D::from_points(rows.iter().map(Row::position))
}

/// 数据集的全局范围；无数据时返回 `None`，避免无穷值流入缩放计算。
pub fn dataset_bounds(rows: &[Row]) -> Option<Bounds2D> {
    non_empty(raw_bounds(rows))
}

/// 仅统计指定图层的行。
pub fn layer_bounds(rows: &[Row], layer: &str) -> Option<Bounds2D> {
    non_empty(Bounds2D::from_points(
        rows.iter()
            .filter(|row| row.layer == layer)
            .map(Row::position),
    ))
}

pub fn point_bounds(points: &[Point2]) -> Option<Bounds2D> {
    non_empty(Bounds2D::from_points(points.iter().copied()))
}

#[inline]
fn non_empty(bounds: Bounds2D) -> Option<Bounds2D> {
    if bounds.is_empty() { None } else { Some(bounds) }
}
