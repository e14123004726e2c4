use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use parkmap_config::AppConfig;
use parkmap_engine::Pipeline;
use parkmap_io::{ExportSaver, JsonFacade};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

mod asset_locator;
mod errors;
mod loader;
mod report;

use asset_locator::{AssetLocator, apply_asset_resolution};
use errors::AppError;

/// 将 AutoCAD 导出的停车场 CSV 转换为画布几何 JSON。
#[derive(Debug, Parser)]
#[command(name = "parkmap", version)]
struct Cli {
    /// 配置文件路径，缺省时按 PARKMAP_CONFIG 或 ./config/default.toml 查找
    #[arg(long)]
    config: Option<PathBuf>,
    /// 输入 CSV；缺省时尝试 PARKMAP_SAMPLE_CSV，再回退到内置示例
    #[arg(short, long)]
    input: Option<PathBuf>,
    /// 导出 JSON 路径
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// 只转换指定图层
    #[arg(long)]
    layer: Option<String>,
    /// 将图标路径解析为实际文件路径
    #[arg(long)]
    resolve_assets: bool,
    /// 额外打印每个路径图元的 SVG path data
    #[arg(long)]
    paths: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = load_configuration(cli.config.clone());
    init_logging(&config);
    info!("启动 parkmap");

    match run(&cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "转换失败");
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, config: &AppConfig) -> Result<(), AppError> {
    let loaded = loader::load_rows(cli.input.as_deref())?;
    let pipeline = Pipeline::new(config.pipeline.clone());
    let output = match &cli.layer {
        Some(layer) => pipeline.run_for_layer(&loaded.parsed.rows, layer)?,
        None => pipeline.run(&loaded.parsed.rows)?,
    };
    report::print_summary(&loaded, &output);
    if cli.paths {
        report::print_paths(&output);
    }

    let mut export = output.into_export(Some(loaded.source.describe()));
    if cli.resolve_assets {
        let locator = AssetLocator::from_config(loaded.source.base_dir(), config);
        let resolved = apply_asset_resolution(&mut export, &locator);
        info!(resolved, roots = locator.roots().len(), "图标资源解析完成");
    }

    if let Some(path) = &cli.output {
        JsonFacade::new().save(&export, path)?;
        info!(path = %path.display(), elements = export.elements.len(), "已写入导出文件");
        println!("已写入：{}", path.display());
    }
    Ok(())
}

fn load_configuration(override_path: Option<PathBuf>) -> AppConfig {
    match override_path {
        Some(path) => AppConfig::from_file(&path).unwrap_or_else(|err| {
            warn!(path = %path.display(), error = %err, "加载指定配置失败，使用默认配置");
            AppConfig::default()
        }),
        None => AppConfig::discover().unwrap_or_else(|err| {
            warn!(path = %err.path().display(), error = %err, "加载默认配置失败，使用内建默认值");
            AppConfig::default()
        }),
    }
}

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_new(config.logging.level.clone()).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if subscriber.try_init().is_err() {
        // 已初始化，忽略
    }
}
