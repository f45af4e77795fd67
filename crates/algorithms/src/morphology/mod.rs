//! Mathematical morphology over height rasters
//!
//! - **Erosion**: minimum filter (shrinks bright regions)
//! - **Dilation**: maximum filter (expands bright regions)
//! - **Closing**: dilation then erosion (fills small dark gaps)

mod closing;
mod dilate;
mod element;
mod erode;
mod filter;

pub use closing::{closing, Closing, ClosingParams};
pub use dilate::{dilate, Dilate, DilateParams};
pub use element::StructuringElement;
pub use erode::{erode, Erode, ErodeParams};
