//! I/O for reading height grids and writing detection results

mod geojson;
mod native;

pub use geojson::{to_geojson, write_geojson};
pub use native::{read_geotiff, read_geotiff_from_buffer, write_geotiff, write_geotiff_to_buffer};
