//! GeoTIFF reading and writing on top of the `tiff` crate.
//!
//! Georeferencing comes from `ModelTransformation` or `ModelPixelScale` +
//! `ModelTiepoint`, the CRS from the EPSG keys of the GeoKey directory and
//! nodata from the GDAL nodata tag.

use crate::error::IoError;
use fieldplots_core::{AffineTransform, Band, Crs, GeoImage};
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, Write};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::encoder::{colortype, DirectoryEncoder, TiffEncoder, TiffKind};
use tiff::tags::Tag;

use super::write_atomic;

#[cfg(feature = "tracing")]
use tracing::instrument;

const MODEL_TRANSFORMATION: u16 = 34264;
const GEO_KEY_DIRECTORY: u16 = 34735;
const GDAL_NODATA: u16 = 42113;

const GT_MODEL_TYPE: u32 = 1024;
const GT_RASTER_TYPE: u32 = 1025;
const GEOGRAPHIC_TYPE: u32 = 2048;
const PROJECTED_CS_TYPE: u32 = 3072;
const PROJ_LINEAR_UNITS: u32 = 3076;

const MODEL_PROJECTED: u16 = 1;
const MODEL_GEOGRAPHIC: u16 = 2;
const RASTER_PIXEL_IS_AREA: u16 = 1;
const LINEAR_METER: u32 = 9001;
const LINEAR_FOOT_US: u32 = 9003;

fn tag(code: u16) -> Tag {
    Tag::from_u16_exhaustive(code)
}

/// Read every band of a GeoTIFF as `f64`.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))
)]
pub fn read_geotiff(path: impl AsRef<Path>) -> Result<GeoImage, IoError> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let img = decode(BufReader::new(file))?;
    log::info!(
        "read {}: {}x{} px, {} band(s), crs {}",
        path.display(),
        img.width,
        img.height,
        img.band_count(),
        img.crs.as_ref().map_or_else(|| "unknown".to_string(), |c| c.to_string())
    );
    Ok(img)
}

/// Decode a GeoTIFF from any seekable reader.
pub fn decode<R: Read + Seek>(reader: R) -> Result<GeoImage, IoError> {
    let mut decoder = Decoder::new(reader)?.with_limits(Limits::unlimited());
    let (w, h) = decoder.dimensions()?;
    let (width, height) = (w as usize, h as usize);

    let transform = read_transform(&mut decoder)?;
    let crs = read_crs(&mut decoder);
    let nodata = read_nodata(&mut decoder);

    let samples = samples_to_f64(decoder.read_image()?);
    let pixels = width * height;
    if pixels == 0 || samples.len() % pixels != 0 {
        return Err(IoError::InvalidInput(format!(
            "{} samples do not fill a {width}x{height} image",
            samples.len()
        )));
    }
    let band_count = samples.len() / pixels;
    let bands = (0..band_count)
        .map(|b| {
            let data = samples.iter().skip(b).step_by(band_count).copied().collect();
            Band::from_vec(width, height, data)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut img = GeoImage::new(width, height, bands, transform)?;
    img.crs = crs;
    img.nodata = nodata;
    Ok(img)
}

fn samples_to_f64(result: DecodingResult) -> Vec<f64> {
    match result {
        DecodingResult::U8(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U16(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::U64(v) => v.into_iter().map(|x| x as f64).collect(),
        DecodingResult::I8(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I16(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::I64(v) => v.into_iter().map(|x| x as f64).collect(),
        DecodingResult::F32(v) => v.into_iter().map(f64::from).collect(),
        DecodingResult::F64(v) => v,
    }
}

fn read_transform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<AffineTransform, IoError> {
    if let Some(m) = decoder.find_tag(tag(MODEL_TRANSFORMATION))? {
        if let Some(t) = AffineTransform::from_model_transformation(&m.into_f64_vec()?) {
            return Ok(t);
        }
    }
    let scale = decoder.find_tag(Tag::ModelPixelScaleTag)?;
    let tie = decoder.find_tag(Tag::ModelTiepointTag)?;
    match (scale, tie) {
        (Some(scale), Some(tie)) => AffineTransform::from_pixel_scale_tiepoint(
            &scale.into_f64_vec()?,
            &tie.into_f64_vec()?,
        )
        .ok_or_else(|| IoError::InvalidInput("malformed GeoTIFF tiepoint tags".to_string())),
        _ => {
            log::warn!("no georeferencing tags, using the identity transform");
            Ok(AffineTransform::identity())
        }
    }
}

/// EPSG code and linear units from the GeoKey directory. Keys stored in
/// the double or ASCII parameter tags are ignored.
fn read_crs<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<Crs> {
    let keys = decoder
        .find_tag(tag(GEO_KEY_DIRECTORY))
        .ok()
        .flatten()?
        .into_u32_vec()
        .ok()?;
    // Header [version, revision, minor, count], then [id, location, count, value].
    let key = |id: u32| {
        keys.get(4..)?
            .chunks_exact(4)
            .find(|k| k[0] == id && k[1] == 0)
            .map(|k| k[3])
    };
    let code = key(PROJECTED_CS_TYPE)
        .or_else(|| key(GEOGRAPHIC_TYPE))
        .filter(|&c| c != 0 && c != 32767)?;
    let mut crs = Crs::epsg(code);
    match key(PROJ_LINEAR_UNITS) {
        Some(LINEAR_METER) => crs.linear_units = Some("metre".to_string()),
        Some(LINEAR_FOOT_US) => crs.linear_units = Some("US survey foot".to_string()),
        _ => {}
    }
    Some(crs)
}

fn read_nodata<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<f64> {
    let text = decoder
        .find_tag(tag(GDAL_NODATA))
        .ok()
        .flatten()?
        .into_string()
        .ok()?;
    let text = text.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    match text.parse::<f64>() {
        Ok(v) => Some(v),
        Err(_) => {
            log::warn!("ignoring unparsable GDAL nodata value {text:?}");
            None
        }
    }
}

fn geo_keys(crs: Option<&Crs>) -> Vec<u16> {
    let mut entries: Vec<[u16; 4]> = vec![[GT_RASTER_TYPE as u16, 0, 1, RASTER_PIXEL_IS_AREA]];
    if let Some(code) = crs.and_then(Crs::epsg_code).and_then(|c| u16::try_from(c).ok()) {
        let geographic = crs.and_then(|c| c.linear_units.as_deref()) == Some("degree");
        let (model, key) = if geographic {
            (MODEL_GEOGRAPHIC, GEOGRAPHIC_TYPE)
        } else {
            (MODEL_PROJECTED, PROJECTED_CS_TYPE)
        };
        entries.insert(0, [GT_MODEL_TYPE as u16, 0, 1, model]);
        entries.push([key as u16, 0, 1, code]);
    }
    let mut keys = vec![1, 1, 0, entries.len() as u16];
    keys.extend(entries.into_iter().flatten());
    keys
}

/// Write a 1-band (gray) or 3-band (RGB) `f32` GeoTIFF.
///
/// Other band counts are rejected. Values are narrowed to `f32`.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))
)]
pub fn write_geotiff(path: impl AsRef<Path>, img: &GeoImage) -> Result<(), IoError> {
    let path = path.as_ref();
    let band_count = img.band_count();
    if band_count != 1 && band_count != 3 {
        return Err(IoError::UnsupportedSampleFormat(format!(
            "cannot write {band_count} bands, expected 1 or 3"
        )));
    }
    let (w, h) = (
        u32::try_from(img.width).map_err(|_| IoError::InvalidInput("image too wide".into()))?,
        u32::try_from(img.height).map_err(|_| IoError::InvalidInput("image too tall".into()))?,
    );
    let mut data = Vec::with_capacity(img.width * img.height * band_count);
    for i in 0..img.width * img.height {
        data.extend(img.bands.iter().map(|b| b.data[i] as f32));
    }

    let mut buf = Cursor::new(Vec::new());
    encode(&mut buf, img, w, h, &data)?;
    write_atomic(path, |out| out.write_all(buf.get_ref()))?;
    log::info!("wrote {} ({}x{}, {band_count} band(s))", path.display(), w, h);
    Ok(())
}

fn encode<W: Write + Seek>(
    out: &mut W,
    img: &GeoImage,
    w: u32,
    h: u32,
    data: &[f32],
) -> Result<(), IoError> {
    let mut encoder = TiffEncoder::new(out)?;
    macro_rules! write_image {
        ($color:ty) => {{
            let mut image = encoder.new_image::<$color>(w, h)?;
            write_geo_tags(image.encoder(), img)?;
            image.write_data(data)?;
        }};
    }
    if img.band_count() == 1 {
        write_image!(colortype::Gray32Float);
    } else {
        write_image!(colortype::RGB32Float);
    }
    Ok(())
}

fn write_geo_tags<W: Write + Seek, K: TiffKind>(
    dir: &mut DirectoryEncoder<'_, W, K>,
    img: &GeoImage,
) -> Result<(), IoError> {
    let t = &img.transform;
    if t.is_north_up() {
        let scale = [t.a(), -t.e(), 0.0];
        let tie = [0.0, 0.0, 0.0, t.c(), t.f(), 0.0];
        dir.write_tag(Tag::ModelPixelScaleTag, &scale[..])?;
        dir.write_tag(Tag::ModelTiepointTag, &tie[..])?;
    } else {
        let m = [
            t.a(), t.b(), 0.0, t.c(),
            t.d(), t.e(), 0.0, t.f(),
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ];
        dir.write_tag(tag(MODEL_TRANSFORMATION), &m[..])?;
    }
    dir.write_tag(tag(GEO_KEY_DIRECTORY), &geo_keys(img.crs.as_ref())[..])?;
    if let Some(nodata) = img.nodata {
        dir.write_tag(tag(GDAL_NODATA), format!("{nodata}").as_str())?;
    }
    Ok(())
}
