use std::path::PathBuf;

use plotters::drawing::DrawingAreaErrorKind;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PlotError>;

#[derive(Error, Debug)]
pub enum PlotError {
    #[error("missing input file: {}", path.display())]
    MissingFile { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Npy {
        path: PathBuf,
        #[source]
        source: ndarray_npy::ReadNpyError,
    },

    /// A stored series does not have the length of the first one read.
    #[error("shape mismatch at {}: expected {expected} samples, found {found}", path.display())]
    ShapeMismatch {
        path: PathBuf,
        expected: usize,
        found: usize,
    },

    #[error("nothing to load: {0} list is empty")]
    EmptySelection(&'static str),

    #[error("x axis has {x_len} points but the table has {samples} samples per seed")]
    AxisMismatch { x_len: usize, samples: usize },

    #[error("logging interval must be positive, got {0}")]
    InvalidLoggingInterval(f64),

    #[error("metric '{0}' was not loaded")]
    MissingMetric(String),

    #[error("{algorithm} lists {metrics} metrics but the figure has {rows} rows")]
    MetricCountMismatch {
        algorithm: String,
        metrics: usize,
        rows: usize,
    },

    #[error("invalid progress bar template: {0}")]
    ProgressTemplate(#[from] indicatif::style::TemplateError),

    #[error("drawing failed: {0}")]
    Drawing(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl<E> From<DrawingAreaErrorKind<E>> for PlotError
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        PlotError::Drawing(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn drawing_errors_keep_their_source() {
        let err = PlotError::from(DrawingAreaErrorKind::<std::io::Error>::LayoutError);
        let source = err.source().unwrap();
        assert!(source
            .downcast_ref::<DrawingAreaErrorKind<std::io::Error>>()
            .is_some());
        assert!(err.to_string().starts_with("drawing failed: "));
    }
}
