use glam::DVec2;
use parkmap_core::descriptor::PathCommand;
use parkmap_core::geometry::{Bounds2D, Point2};

use crate::bounds::point_bounds;

/// 首点生成 `MoveTo`，其余生成 `LineTo`；`close` 时追加 `Close`。
pub fn encode_path(points: &[Point2], close: bool) -> Vec<PathCommand> {
    let mut commands = Vec::with_capacity(points.len() + usize::from(close));
    let mut iter = points.iter().copied();
    let Some(first) = iter.next() else {
        return commands;
    };
    commands.push(PathCommand::MoveTo(first));
    commands.extend(iter.map(PathCommand::LineTo));
    if close {
        commands.push(PathCommand::Close);
    }
    commands
}

/// 将点集平移到自身包围盒左上角为原点的坐标系，同时返回该包围盒。
pub fn relative_to_origin(points: &[Point2]) -> Option<(Bounds2D, Vec<Point2>)> {
    let bounds = point_bounds(points)?;
    let origin = bounds.min().as_vec2();
    let relative = points
        .iter()
        .map(|point| Point2::from_vec(point.as_vec2() - origin))
        .collect();
    Some((bounds, relative))
}

/// 原始坐标的算术平均值。图标放置时只变换这一个平均点。
pub fn centroid<I>(points: I) -> Option<Point2>
where
    I: IntoIterator<Item = Point2>,
{
    let (sum, count) = points
        .into_iter()
        .fold((DVec2::ZERO, 0usize), |(sum, count), point| {
            (sum + point.as_vec2(), count + 1)
        });
    if count == 0 {
        None
    } else {
        Some(Point2::from_vec(sum / count as f64))
    }
}
