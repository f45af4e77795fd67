//! Raster element trait for generic cell values

use num_traits::{NumCast, Zero};
use std::fmt::Debug;

/// Trait for types that can be stored in a raster cell.
///
/// Height grids use `f64`; marker masks use `u8` and segment labels `u32`.
pub trait RasterElement:
    Copy + Clone + Debug + PartialOrd + PartialEq + NumCast + Zero + Send + Sync + 'static
{
    /// Value used for invalid cells when a grid has no explicit sentinel
    fn default_nodata() -> Self;

    /// Check if this value represents no-data
    fn is_nodata(&self, nodata: Option<Self>) -> bool;

    /// Convert self to f64
    fn to_f64(self) -> Option<f64> {
        NumCast::from(self)
    }

    /// Convert from f64, falling back to the default nodata value
    fn from_f64(value: f64) -> Self {
        NumCast::from(value).unwrap_or_else(Self::default_nodata)
    }
}

macro_rules! impl_raster_element_int {
    ($t:ty) => {
        impl RasterElement for $t {
            fn default_nodata() -> Self {
                <$t>::MIN
            }

            fn is_nodata(&self, nodata: Option<Self>) -> bool {
                nodata == Some(*self)
            }
        }
    };
}

macro_rules! impl_raster_element_float {
    ($t:ty) => {
        impl RasterElement for $t {
            fn default_nodata() -> Self {
                <$t>::NAN
            }

            // NaN is always invalid; infinities come from broken sensors
            fn is_nodata(&self, nodata: Option<Self>) -> bool {
                if !self.is_finite() {
                    return true;
                }
                match nodata {
                    Some(nd) if nd.is_finite() => (self - nd).abs() <= <$t>::EPSILON * nd.abs().max(1.0),
                    _ => false,
                }
            }
        }
    };
}

impl_raster_element_int!(u8);
impl_raster_element_int!(u16);
impl_raster_element_int!(i32);
impl_raster_element_int!(u32);
impl_raster_element_float!(f32);
impl_raster_element_float!(f64);
