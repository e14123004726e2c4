use std::fs;
use std::path::{Path, PathBuf};

use parkmap_core::descriptor::MapExport;
use parkmap_core::model::Row;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum IoError {
    #[error("failed to read file {path:?}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write file {path:?}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode export: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("invalid export file {path:?}: {source}")]
    InvalidExport {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub trait RowLoader {
    fn load(&self, path: &Path) -> Result<ParsedCsv, IoError>;
}

pub trait ExportSaver {
    fn save(&self, export: &MapExport, path: &Path) -> Result<(), IoError>;
}

pub trait ExportLoader {
    fn load_export(&self, path: &Path) -> Result<MapExport, IoError>;
}

/// CSV 解析结果：有效行与被丢弃行的诊断信息。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedCsv {
    pub rows: Vec<Row>,
    pub rejected: Vec<RejectedLine>,
}

/// 被丢弃的数据行，`line_number` 从 1 开始计数（表头为第 1 行）。
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedLine {
    pub line_number: usize,
    pub reason: String,
}

pub struct CsvFacade;

impl CsvFacade {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CsvFacade {
    fn default() -> Self {
        Self::new()
    }
}

impl RowLoader for CsvFacade {
    fn load(&self, path: &Path) -> Result<ParsedCsv, IoError> {
        let data = fs::read_to_string(path).map_err(|source| IoError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let parsed = parse_rows(&data);
        debug!(
            path = %path.display(),
            rows = parsed.rows.len(),
            rejected = parsed.rejected.len(),
            "CSV 读取完成"
        );
        Ok(parsed)
    }
}

/// 解析 AutoCAD 导出的 CSV 文本。表头无条件跳过，空白行静默跳过，
/// `x`/`y` 无法解析的行被丢弃并记录诊断；整个过程不会失败。
pub fn parse_rows(source: &str) -> ParsedCsv {
    CsvParser::new(source).parse()
}

#[derive(Debug)]
enum RowError {
    Coordinate { field: &'static str, raw: String },
}

impl RowError {
    fn describe(&self) -> String {
        match self {
            RowError::Coordinate { field, raw } => {
                format!("{field} 坐标解析失败（值：\"{raw}\"）")
            }
        }
    }
}

struct CsvParser<'a> {
    lines: std::str::Lines<'a>,
    line_number: usize,
}

impl<'a> CsvParser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            lines: source.lines(),
            line_number: 0,
        }
    }

    fn parse(mut self) -> ParsedCsv {
        let mut parsed = ParsedCsv::default();

        // 表头
        if self.next_line().is_none() {
            return parsed;
        }

        while let Some(line) = self.next_line() {
            if line.trim().is_empty() {
                continue;
            }
            match parse_row(line) {
                Ok(row) => parsed.rows.push(row),
                Err(err) => {
                    let reason = err.describe();
                    warn!(line = self.line_number, reason = %reason, "跳过无效的 CSV 行");
                    parsed.rejected.push(RejectedLine {
                        line_number: self.line_number,
                        reason,
                    });
                }
            }
        }
        parsed
    }

    fn next_line(&mut self) -> Option<&'a str> {
        let line = self.lines.next()?;
        self.line_number += 1;
        Some(line)
    }
}

fn parse_row(line: &str) -> Result<Row, RowError> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    let field = |index: usize| fields.get(index).copied().unwrap_or("");
    let optional = |index: usize| {
        fields
            .get(index)
            .filter(|value| !value.is_empty())
            .map(|value| value.to_string())
    };

    let x = parse_coordinate(field(0), "x")?;
    let y = parse_coordinate(field(1), "y")?;
    let z = match field(2).parse::<f64>() {
        Ok(value) => value,
        Err(_) => {
            debug!(raw = field(2), "z 坐标无法解析，按 0 处理");
            0.0
        }
    };

    Ok(Row {
        x,
        y,
        z,
        layer: field(3).to_string(),
        paper_space: field(4).to_string(),
        sub_classes: field(5).to_string(),
        linetype: field(6).to_string(),
        entity_handle: field(7).to_string(),
        text: optional(8),
        style: optional(9),
    })
}

fn parse_coordinate(raw: &str, field: &'static str) -> Result<f64, RowError> {
    raw.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| RowError::Coordinate {
            field,
            raw: raw.to_string(),
        })
}

/// 以 JSON 形式读写导出结果。
pub struct JsonFacade;

impl JsonFacade {
    pub fn new() -> Self {
        Self
    }

    pub fn to_string(&self, export: &MapExport) -> Result<String, IoError> {
        serde_json::to_string_pretty(export).map_err(IoError::Serialize)
    }
}

impl Default for JsonFacade {
    fn default() -> Self {
        Self::new()
    }
}

impl ExportSaver for JsonFacade {
    fn save(&self, export: &MapExport, path: &Path) -> Result<(), IoError> {
        let content = self.to_string(export)?;
        fs::write(path, content).map_err(|source| IoError::WriteError {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), elements = export.elements.len(), "导出 JSON 完成");
        Ok(())
    }
}

impl ExportLoader for JsonFacade {
    fn load_export(&self, path: &Path) -> Result<MapExport, IoError> {
        let data = fs::read_to_string(path).map_err(|source| IoError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&data).map_err(|source| IoError::InvalidExport {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "X,Y,Z,Layer,PS,SC,LT,Handle,Text,Style";

    #[test]
    fn empty_input_yields_no_rows() {
        assert!(parse_rows("").rows.is_empty());
        let header_only = parse_rows(HEADER);
        assert!(header_only.rows.is_empty());
        assert!(header_only.rejected.is_empty());
    }

    #[test]
    fn header_is_skipped_even_when_numeric() {
        let parsed = parse_rows("1,2,3,a,0,,,h1\n4,5,6,a,0,,,h1\n");
        assert_eq!(parsed.rows.len(), 1);
        assert!((parsed.rows[0].x - 4.0).abs() < 1e-9);
    }

    #[test]
    fn fields_map_in_fixed_order() {
        let text = format!("{HEADER}\n1.5,-2.25,0.5,t-label,1,AcDbText,CONTINUOUS,2F,B1-012,Standard\n");
        let parsed = parse_rows(&text);
        assert_eq!(parsed.rows.len(), 1);
        let row = &parsed.rows[0];
        assert!((row.x - 1.5).abs() < 1e-9);
        assert!((row.y + 2.25).abs() < 1e-9);
        assert!((row.z - 0.5).abs() < 1e-9);
        assert_eq!(row.layer, "t-label");
        assert_eq!(row.paper_space, "1");
        assert_eq!(row.sub_classes, "AcDbText");
        assert_eq!(row.linetype, "CONTINUOUS");
        assert_eq!(row.entity_handle, "2F");
        assert_eq!(row.text.as_deref(), Some("B1-012"));
        assert_eq!(row.style.as_deref(), Some("Standard"));
    }

    #[test]
    fn missing_trailing_fields_default() {
        let parsed = parse_rows(&format!("{HEADER}\n3,4,0,p-wall\n"));
        assert_eq!(parsed.rows.len(), 1);
        let row = &parsed.rows[0];
        assert_eq!(row.layer, "p-wall");
        assert_eq!(row.paper_space, "");
        assert_eq!(row.entity_handle, "");
        assert!(row.text.is_none());
        assert!(row.style.is_none());
    }

    #[test]
    fn empty_text_and_style_are_absent() {
        let parsed = parse_rows(&format!("{HEADER}\n0,0,0,p-parking-basic,0,,,h1,,\n"));
        assert!(parsed.rows[0].text.is_none());
        assert!(parsed.rows[0].style.is_none());
    }

    #[test]
    fn malformed_coordinates_are_rejected() {
        let text = format!(
            "{HEADER}\n0,0,0,layer,,,,h1,,\nabc,0,0,layer,,,,,h2,,\n1,,0,layer,,,,h3\n2,inf,0,layer,,,,h4\n"
        );
        let parsed = parse_rows(&text);
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].entity_handle, "h1");
        let lines: Vec<usize> = parsed.rejected.iter().map(|r| r.line_number).collect();
        assert_eq!(lines, vec![3, 4, 5]);
        assert!(parsed.rejected[0].reason.contains("abc"));
    }

    #[test]
    fn bad_z_is_zero() {
        let parsed = parse_rows(&format!("{HEADER}\n1,2,n/a,layer,,,,h1\n"));
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].z, 0.0);
    }

    #[test]
    fn blank_lines_and_crlf_are_tolerated() {
        let text = format!("{HEADER}\r\n1,2,0,a,0,,,h1\r\n   \r\n\r\n3,4,0,a,0,,,h1\r\n");
        let parsed = parse_rows(&text);
        assert_eq!(parsed.rows.len(), 2);
        assert!(parsed.rejected.is_empty());
        assert_eq!(parsed.rows[1].entity_handle, "h1");
    }
}
