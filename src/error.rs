use thiserror::Error;

#[derive(Error, Debug)]
pub enum EdaError {
    #[error("Data not loaded: {0}")]
    NotLoaded(String),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Category not present in pivot: {0}")]
    MissingCategory(String),

    #[error("Park not present in observations: {0}")]
    MissingPark(String),

    #[error("Chart rendering failed: {0}")]
    Chart(String),
}

impl<E: std::error::Error + Send + Sync> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for EdaError
{
    fn from(err: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        EdaError::Chart(err.to_string())
    }
}
