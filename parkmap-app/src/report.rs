use parkmap_core::descriptor::{Shape, svg_path_data};
use parkmap_core::model::LayerCategory;
use parkmap_engine::PipelineOutput;

use crate::loader::LoadedRows;

const CATEGORIES: [LayerCategory; 4] = [
    LayerCategory::Polygon,
    LayerCategory::Line,
    LayerCategory::Point,
    LayerCategory::Text,
];

/// 生成转换概览文本，每个元素一行。
pub fn summary_lines(loaded: &LoadedRows, output: &PipelineOutput) -> Vec<String> {
    let mut lines = vec![
        "parkmap 转换概览".to_string(),
        format!("来源：{}", loaded.source.describe()),
        format!(
            "有效行：{}（丢弃 {} 行）",
            loaded.parsed.rows.len(),
            loaded.parsed.rejected.len()
        ),
        format!(
            "实体：{}，生成图元：{}（跳过 {}）",
            output.entity_count,
            output.descriptors.len(),
            output.diagnostics.len()
        ),
    ];
    for category in CATEGORIES {
        lines.push(format!(
            "  - {}: {}",
            category.as_str(),
            output.count_by_category(category)
        ));
    }

    let min = output.bounds.min();
    let max = output.bounds.max();
    lines.push(format!(
        "范围：({:.3}, {:.3}) - ({:.3}, {:.3})，缩放 {:.6}",
        min.x(),
        min.y(),
        max.x(),
        max.y(),
        output.scale
    ));

    for rejected in &loaded.parsed.rejected {
        lines.push(format!(
            "  ! 第 {} 行：{}",
            rejected.line_number, rejected.reason
        ));
    }
    for diagnostic in &output.diagnostics {
        lines.push(format!(
            "  ! 实体 {}：{}",
            diagnostic.entity_id, diagnostic.error
        ));
    }
    lines
}

pub fn print_summary(loaded: &LoadedRows, output: &PipelineOutput) {
    for line in summary_lines(loaded, output) {
        println!("{line}");
    }
}

/// 每个路径图元一行 SVG path data，坐标相对图元左上角。
pub fn path_lines(output: &PipelineOutput) -> Vec<String> {
    output
        .descriptors
        .iter()
        .filter_map(|descriptor| match &descriptor.shape {
            Shape::Path { commands, .. } => {
                Some(format!("  {}: {}", descriptor.id, svg_path_data(commands)))
            }
            _ => None,
        })
        .collect()
}

pub fn print_paths(output: &PipelineOutput) {
    println!("路径：");
    for line in path_lines(output) {
        println!("{line}");
    }
}
