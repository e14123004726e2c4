pub mod bounds;
pub mod classify;
pub mod grouping;
pub mod path;
pub mod pipeline;
pub mod transform;

pub mod errors {
    use thiserror::Error;

    /// 整个数据集无法生成几何时返回，由调用方决定展示空画布还是错误信息。
    #[derive(Debug, Clone, PartialEq, Error)]
    pub enum PipelineError {
        #[error("dataset contains no valid rows")]
        EmptyDataset,
        #[error("dataset bounds are degenerate (width {width}, height {height})")]
        DegenerateBounds { width: f64, height: f64 },
        #[error("scale factor {0} is not finite")]
        InvalidScale(f64),
    }

    /// 单个实体构建失败，只影响该实体。
    #[derive(Debug, Clone, PartialEq, Error)]
    pub enum EntityError {
        #[error("entity needs at least {required} points, found {actual}")]
        InsufficientPoints { required: usize, actual: usize },
        #[error("coordinate ({x}, {y}) is not finite after transform")]
        NonFiniteCoordinate { x: f64, y: f64 },
    }
}

pub use errors::{EntityError, PipelineError};
pub use pipeline::{EntityDiagnostic, Pipeline, PipelineOutput};
