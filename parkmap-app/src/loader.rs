use std::env;
use std::path::{Path, PathBuf};

use parkmap_io::{CsvFacade, IoError, ParsedCsv, RowLoader, parse_rows};
use tracing::{info, warn};

const SAMPLE_CSV_ENV: &str = "PARKMAP_SAMPLE_CSV";
const DEMO_LOT: &str = include_str!("../data/demo_lot.csv");

/// 数据来源，便于在概览和导出中标注。
#[derive(Debug, Clone)]
pub enum RowSource {
    Csv(PathBuf),
    Demo,
}

impl RowSource {
    pub fn describe(&self) -> String {
        match self {
            RowSource::Csv(path) => path.display().to_string(),
            RowSource::Demo => "demo".to_string(),
        }
    }

    /// CSV 所在目录，作为图标资源的首个查找根。
    pub fn base_dir(&self) -> Option<&Path> {
        match self {
            RowSource::Csv(path) => path.parent(),
            RowSource::Demo => None,
        }
    }
}

#[derive(Debug)]
pub struct LoadedRows {
    pub parsed: ParsedCsv,
    pub source: RowSource,
}

/// 显式指定的路径读取失败时直接报错；
/// 否则尝试环境变量 `PARKMAP_SAMPLE_CSV`，失败则回退到内置示例。
pub fn load_rows(explicit: Option<&Path>) -> Result<LoadedRows, IoError> {
    let loader = CsvFacade::new();
    if let Some(path) = explicit {
        let parsed = loader.load(path)?;
        info!(path = %path.display(), rows = parsed.rows.len(), "从 CSV 加载成功");
        return Ok(LoadedRows {
            parsed,
            source: RowSource::Csv(path.to_path_buf()),
        });
    }

    if let Some(path) = env::var_os(SAMPLE_CSV_ENV) {
        let path = PathBuf::from(path);
        match loader.load(&path) {
            Ok(parsed) => {
                info!(path = %path.display(), rows = parsed.rows.len(), "从 CSV 加载成功");
                return Ok(LoadedRows {
                    parsed,
                    source: RowSource::Csv(path),
                });
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "加载 CSV 失败，回退到内置示例");
            }
        }
    }

    Ok(demo_rows())
}

pub fn demo_rows() -> LoadedRows {
    LoadedRows {
        parsed: parse_rows(DEMO_LOT),
        source: RowSource::Demo,
    }
}
