use parkmap_engine::PipelineError;
use parkmap_io::IoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("读取或写入文件失败: {0}")]
    Io(#[from] IoError),
    #[error("几何转换失败: {0}")]
    Pipeline(#[from] PipelineError),
}
