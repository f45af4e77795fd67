//! Error types for canopy

use thiserror::Error;

/// Main error type for canopy operations
///
/// Grid-level failures (`Alignment`, `EmptyHeightModel`) abort a run.
/// `TileProcessing` and `Clustering` are recoverable: the detector logs them
/// and keeps them in its report instead of returning them.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Raster size mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    SizeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    #[error("CRS mismatch: {0} vs {1}")]
    CrsMismatch(String, String),

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Grid alignment failed: {0}")]
    Alignment(String),

    #[error("Height model contains no valid cells")]
    EmptyHeightModel,

    #[error("Tile at ({row_offset}, {col_offset}) skipped: {reason}")]
    TileProcessing {
        row_offset: usize,
        col_offset: usize,
        reason: String,
    },

    #[error("Clustering produced no trees: {0}")]
    Clustering(String),

    #[error("Detection cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether a run can continue past this error
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::TileProcessing { .. } | Error::Clustering(_))
    }
}

/// Result type alias for canopy operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_split() {
        let tile = Error::TileProcessing {
            row_offset: 0,
            col_offset: 1000,
            reason: "no markers".into(),
        };
        assert!(tile.is_recoverable());
        assert!(Error::Clustering("empty".into()).is_recoverable());
        assert!(!Error::EmptyHeightModel.is_recoverable());
        assert!(!Error::Alignment("crs".into()).is_recoverable());
    }

    #[test]
    fn test_tile_message() {
        let err = Error::TileProcessing {
            row_offset: 2,
            col_offset: 3,
            reason: "no finite cells".into(),
        };
        assert_eq!(err.to_string(), "Tile at (2, 3) skipped: no finite cells");
    }
}
