use std::env;
use std::path::{Path, PathBuf};

use parkmap_config::AppConfig;
use parkmap_core::descriptor::{MapExport, Shape};
use tracing::{debug, trace};

const ASSET_ROOTS_ENV: &str = "PARKMAP_ASSET_ROOTS";

/// 按优先级在若干根目录下查找图标资源。
pub struct AssetLocator {
    search_roots: Vec<PathBuf>,
}

impl AssetLocator {
    pub fn from_config(base_dir: Option<&Path>, config: &AppConfig) -> Self {
        let mut roots: Vec<PathBuf> = Vec::new();

        if let Some(dir) = base_dir {
            roots.push(dir.to_path_buf());
        }

        roots.extend(config.resources.asset_roots.iter().cloned());

        if let Some(env_paths) = env::var_os(ASSET_ROOTS_ENV) {
            roots.extend(env::split_paths(&env_paths));
        }

        Self::with_roots(roots)
    }

    /// 丢弃不存在的目录并去重，保持靠前优先级。
    pub fn with_roots(roots: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut deduped: Vec<PathBuf> = Vec::new();
        for root in roots {
            if root.is_dir() && !deduped.iter().any(|existing| existing == &root) {
                deduped.push(root);
            }
        }
        AssetLocator {
            search_roots: deduped,
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.search_roots
    }

    pub fn resolve(&self, asset: &str) -> Option<PathBuf> {
        let raw_path = Path::new(asset);
        if raw_path.is_absolute() {
            if raw_path.exists() {
                return Some(Self::canonicalize_or_clone(raw_path));
            }
            debug!(path = %raw_path.display(), "图标路径为绝对路径但未找到对应文件");
            return None;
        }

        for root in &self.search_roots {
            let candidate = root.join(raw_path);
            trace!(candidate = %candidate.display(), "asset locator candidate");
            if candidate.exists() {
                return Some(Self::canonicalize_or_clone(&candidate));
            }
        }
        None
    }

    fn canonicalize_or_clone(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
    }
}

/// 将能解析到实际文件的图标路径替换为绝对路径，返回替换数量。
pub fn apply_asset_resolution(export: &mut MapExport, locator: &AssetLocator) -> usize {
    let mut resolved_count = 0;
    for element in &mut export.elements {
        let Shape::Icon { asset, .. } = &mut element.shape else {
            continue;
        };
        if let Some(resolved) = locator.resolve(asset) {
            *asset = resolved.to_string_lossy().into_owned();
            resolved_count += 1;
        }
    }
    resolved_count
}
