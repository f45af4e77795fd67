//! Native GeoTIFF reading/writing
//!
//! Uses the `tiff` crate. Georeferencing is carried by the pixel-scale and
//! tiepoint tags, the coordinate system by the EPSG geokey and the nodata
//! sentinel by the GDAL nodata tag.

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster, RasterElement};
use std::fs::File;
use std::io::{BufWriter, Cursor, Write};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::Gray32Float;
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;

const GEOGRAPHIC_TYPE_KEY: u16 = 2048;
const PROJECTED_CS_TYPE_KEY: u16 = 3072;

/// Read a single-band GeoTIFF file into a Raster
pub fn read_geotiff<T, P>(path: P) -> Result<Raster<T>>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::open(path.as_ref())?;
    decode_geotiff(file)
}

/// Read a GeoTIFF from an in-memory buffer into a Raster
pub fn read_geotiff_from_buffer<T>(data: &[u8]) -> Result<Raster<T>>
where
    T: RasterElement,
{
    decode_geotiff(Cursor::new(data))
}

fn cast_all<S: Copy + num_traits::NumCast, T: RasterElement>(buf: &[S]) -> Vec<T> {
    buf.iter()
        .map(|&v| num_traits::cast(v).unwrap_or_else(T::default_nodata))
        .collect()
}

fn decode_geotiff<T, R>(reader: R) -> Result<Raster<T>>
where
    T: RasterElement,
    R: std::io::Read + std::io::Seek,
{
    let mut decoder = Decoder::new(reader)
        .map_err(|e| Error::Other(format!("TIFF decode error: {}", e)))?;

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| Error::Other(format!("Cannot read dimensions: {}", e)))?;
    let (rows, cols) = (height as usize, width as usize);

    let data: Vec<T> = match decoder
        .read_image()
        .map_err(|e| Error::Other(format!("Cannot read image data: {}", e)))?
    {
        DecodingResult::F32(buf) => cast_all(&buf),
        DecodingResult::F64(buf) => cast_all(&buf),
        DecodingResult::U8(buf) => cast_all(&buf),
        DecodingResult::U16(buf) => cast_all(&buf),
        DecodingResult::U32(buf) => cast_all(&buf),
        DecodingResult::I16(buf) => cast_all(&buf),
        DecodingResult::I32(buf) => cast_all(&buf),
        _ => return Err(Error::UnsupportedDataType("Unsupported TIFF pixel format".to_string())),
    };

    // Multi-band images decode interleaved; only the first band is supported
    if data.len() != rows * cols {
        return Err(Error::UnsupportedDataType(format!(
            "expected a single band ({} values), decoded {}",
            rows * cols,
            data.len()
        )));
    }

    let mut raster = Raster::from_vec(data, rows, cols)?;

    if let Some(transform) = read_geotransform(&mut decoder) {
        raster.set_transform(transform);
    }
    raster.set_crs(read_epsg(&mut decoder).map(CRS::from_epsg));

    if let Ok(text) = decoder.get_tag_ascii_string(Tag::GdalNodata) {
        let text = text.trim_matches(char::from(0)).trim();
        if let Ok(value) = text.parse::<f64>() {
            raster.set_nodata(Some(T::from_f64(value)));
        }
    }

    Ok(raster)
}

fn read_geotransform<R: std::io::Read + std::io::Seek>(decoder: &mut Decoder<R>) -> Option<GeoTransform> {
    let scale = decoder.get_tag_f64_vec(Tag::ModelPixelScaleTag).ok()?;
    let tiepoint = decoder.get_tag_f64_vec(Tag::ModelTiepointTag).ok()?;

    if scale.len() < 2 || tiepoint.len() < 6 {
        return None;
    }

    // tiepoint: [I, J, K, X, Y, Z], scale: [ScaleX, ScaleY, ScaleZ]
    let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
    let origin_y = tiepoint[4] + tiepoint[1] * scale[1];
    Some(GeoTransform::new(origin_x, origin_y, scale[0], -scale[1]))
}

fn read_epsg<R: std::io::Read + std::io::Seek>(decoder: &mut Decoder<R>) -> Option<u32> {
    let keys = decoder.get_tag_u16_vec(Tag::GeoKeyDirectoryTag).ok()?;
    if keys.len() < 4 {
        return None;
    }

    // Header [version, revision, minor, count], then [id, location, count, value] entries
    let mut geographic = None;
    for entry in keys[4..].chunks_exact(4) {
        let (id, location, value) = (entry[0], entry[1], entry[3]);
        if location != 0 {
            continue;
        }
        match id {
            PROJECTED_CS_TYPE_KEY => return Some(value as u32),
            GEOGRAPHIC_TYPE_KEY => geographic = Some(value as u32),
            _ => {}
        }
    }
    geographic
}

/// Write a Raster to a GeoTIFF file as 32-bit float
pub fn write_geotiff<T, P>(raster: &Raster<T>, path: P) -> Result<()>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    encode_geotiff(raster, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Write a Raster to an in-memory GeoTIFF buffer
pub fn write_geotiff_to_buffer<T>(raster: &Raster<T>) -> Result<Vec<u8>>
where
    T: RasterElement,
{
    let mut buf = Vec::new();
    encode_geotiff(raster, Cursor::new(&mut buf))?;
    Ok(buf)
}

fn encode_geotiff<T, W>(raster: &Raster<T>, writer: W) -> Result<()>
where
    T: RasterElement,
    W: std::io::Write + std::io::Seek,
{
    let encode_err = |what: &str, e: tiff::TiffError| Error::Other(format!("{}: {}", what, e));

    let mut encoder = TiffEncoder::new(writer).map_err(|e| encode_err("TIFF encoder error", e))?;

    let (rows, cols) = raster.shape();
    let data: Vec<f32> = raster
        .data()
        .iter()
        .map(|&v| num_traits::cast(v).unwrap_or(f32::NAN))
        .collect();

    let mut image = encoder
        .new_image::<Gray32Float>(cols as u32, rows as u32)
        .map_err(|e| encode_err("Cannot create TIFF image", e))?;

    let gt = raster.transform();
    if !gt.is_axis_aligned() {
        return Err(Error::UnsupportedDataType(
            "rotated geotransforms cannot be stored as pixel scale + tiepoint".to_string(),
        ));
    }

    let scale = [gt.pixel_width, gt.pixel_height.abs(), 0.0];
    image
        .encoder()
        .write_tag(Tag::ModelPixelScaleTag, &scale[..])
        .map_err(|e| encode_err("Cannot write scale tag", e))?;

    let tiepoint = [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
    image
        .encoder()
        .write_tag(Tag::ModelTiepointTag, &tiepoint[..])
        .map_err(|e| encode_err("Cannot write tiepoint tag", e))?;

    // GTModelTypeGeoKey = projected, GTRasterTypeGeoKey = pixel-is-area
    let mut geokeys: Vec<u16> = vec![1, 1, 0, 2, 1024, 0, 1, 1, 1025, 0, 1, 1];
    if let Some(code) = raster.crs().and_then(|c| c.epsg()).and_then(|c| u16::try_from(c).ok()) {
        geokeys.extend_from_slice(&[PROJECTED_CS_TYPE_KEY, 0, 1, code]);
        geokeys[3] = 3;
    }
    image
        .encoder()
        .write_tag(Tag::GeoKeyDirectoryTag, geokeys.as_slice())
        .map_err(|e| encode_err("Cannot write geokey tag", e))?;

    if let Some(nodata) = raster.nodata().and_then(|v| v.to_f64()) {
        let text = if nodata.is_nan() { "nan".to_string() } else { nodata.to_string() };
        image
            .encoder()
            .write_tag(Tag::GdalNodata, text.as_str())
            .map_err(|e| encode_err("Cannot write nodata tag", e))?;
    }

    image
        .write_data(&data)
        .map_err(|e| encode_err("Cannot write image data", e))?;

    Ok(())
}
