//! Embedded raster images.
//!
//! Images are read straight from each page's `/XObject` resources with
//! lopdf, without rendering. JPEG and JPEG 2000 streams are passed through
//! untouched; raw 8-bit gray, RGB and indexed pixel data is re-encoded as
//! PNG, with `/ICCBased` spaces mapped by their component count. Other
//! encodings (CCITT, JBIG2, CMYK, image masks) and images too large to hold
//! in memory are skipped with a debug log.

use super::error::{PdfError, Result};
use crate::core::page_range::PageRange;
use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::HashSet;
use std::io::Cursor;

/// Parent-chain depth limit when resolving inherited page resources.
const MAX_RESOURCE_DEPTH: usize = 32;

/// One image pulled out of a page.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedImage {
    /// 1-based, contiguous across every page of the request.
    pub image_index: usize,
    pub page_index: usize,
    /// `page_{n}_image_{k}.{ext}`, both numbers 1-based.
    pub key: String,
    pub extension: &'static str,
    pub data: Vec<u8>,
}

impl ExtractedImage {
    pub fn content_type(&self) -> &'static str {
        match self.extension {
            "jpeg" => "image/jpeg",
            "jpx" => "image/jpx",
            "png" => "image/png",
            _ => "application/octet-stream",
        }
    }
}

/// Number of pages in a PDF.
pub fn page_count(bytes: &[u8]) -> Result<usize> {
    let document = Document::load_mem(bytes)?;
    Ok(document.get_pages().len())
}

/// Images on every page of `range`, in page order then resource order.
pub fn extract_images(bytes: &[u8], range: &PageRange) -> Result<Vec<ExtractedImage>> {
    let document = Document::load_mem(bytes)?;
    let mut images = Vec::new();

    for (page_number, page_id) in document.get_pages() {
        let page_index = page_number as usize - 1;
        if !range.contains(page_index) {
            continue;
        }

        let mut per_page = 0;
        for stream in page_image_streams(&document, page_id) {
            let Some((extension, data)) = encode_image(&document, stream) else {
                continue;
            };
            per_page += 1;
            images.push(ExtractedImage {
                image_index: images.len() + 1,
                page_index,
                key: image_key(page_index, per_page, extension),
                extension,
                data,
            });
        }
    }

    tracing::debug!(pages = range.len(), images = images.len(), "Collected embedded images");
    Ok(images)
}

/// Object key for the `ordinal`-th image (1-based) on page `page_index` (0-based).
pub fn image_key(page_index: usize, ordinal: usize, extension: &str) -> String {
    format!("page_{}_image_{}.{}", page_index + 1, ordinal, extension)
}

fn resolve<'a>(document: &'a Document, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => document.get_object(*id).unwrap_or(object),
        _ => object,
    }
}

fn resolve_dict<'a>(document: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Dictionary> {
    dict.get(key)
        .ok()
        .map(|object| resolve(document, object))
        .and_then(|object| object.as_dict().ok())
}

/// The page's `/Resources`, following `/Parent` when inherited.
fn page_resources(document: &Document, page_id: ObjectId) -> Option<&Dictionary> {
    let mut node = document.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_RESOURCE_DEPTH {
        if let Some(resources) = resolve_dict(document, node, b"Resources") {
            return Some(resources);
        }
        let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
        node = document.get_dictionary(parent).ok()?;
    }
    None
}

/// Distinct image XObjects of a page, in resource-dictionary order.
fn page_image_streams(document: &Document, page_id: ObjectId) -> Vec<&Stream> {
    let Some(xobjects) = page_resources(document, page_id).and_then(|r| resolve_dict(document, r, b"XObject"))
    else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut streams = Vec::new();
    for (_name, object) in xobjects.iter() {
        if let Object::Reference(id) = object
            && !seen.insert(*id)
        {
            continue;
        }
        if let Object::Stream(stream) = resolve(document, object)
            && is_image(&stream.dict)
        {
            streams.push(stream);
        }
    }
    streams
}

fn is_image(dict: &Dictionary) -> bool {
    dict.get(b"Subtype")
        .and_then(Object::as_name)
        .map(|name| name == b"Image")
        .unwrap_or(false)
}

fn filters(dict: &Dictionary) -> Vec<Vec<u8>> {
    match dict.get(b"Filter") {
        Ok(Object::Name(name)) => vec![name.clone()],
        Ok(Object::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_name().ok().map(<[u8]>::to_vec))
            .collect(),
        _ => Vec::new(),
    }
}

fn int_entry(dict: &Dictionary, key: &[u8]) -> Option<i64> {
    dict.get(key).ok().and_then(|object| object.as_i64().ok())
}

/// Bytes and extension for an image stream, or `None` when unsupported.
fn encode_image(document: &Document, stream: &Stream) -> Option<(&'static str, Vec<u8>)> {
    let filters = filters(&stream.dict);
    let passthrough = match filters.last().map(Vec::as_slice) {
        Some(b"DCTDecode") => Some("jpeg"),
        Some(b"JPXDecode") => Some("jpx"),
        _ => None,
    };

    if let Some(extension) = passthrough {
        let data = if filters.len() == 1 {
            stream.content.clone()
        } else {
            stream.decompressed_content().unwrap_or_else(|_| stream.content.clone())
        };
        return Some((extension, data));
    }

    match raw_to_png(document, stream, &filters) {
        Ok(png) => Some(("png", png)),
        Err(err) => {
            tracing::debug!(filters = ?filters_display(&filters), "Skipping image: {}", err);
            None
        }
    }
}

fn filters_display(filters: &[Vec<u8>]) -> Vec<String> {
    filters.iter().map(|f| String::from_utf8_lossy(f).into_owned()).collect()
}

/// Nesting limit for colour space arrays (`/Indexed` over `/ICCBased`, ...).
const MAX_COLOR_SPACE_DEPTH: usize = 4;

/// Colour spaces whose 8-bit samples can be written out as PNG.
#[derive(Debug, Clone, PartialEq)]
enum ColorSpace {
    Gray,
    Rgb,
    /// One index byte per pixel into `palette`, which holds
    /// `base.components()` bytes per entry.
    Indexed { base: Box<ColorSpace>, palette: Vec<u8> },
}

impl ColorSpace {
    fn components(&self) -> usize {
        match self {
            ColorSpace::Gray | ColorSpace::Indexed { .. } => 1,
            ColorSpace::Rgb => 3,
        }
    }

    /// Channels of the decoded pixels.
    fn output_channels(&self) -> usize {
        match self {
            ColorSpace::Indexed { base, .. } => base.components(),
            other => other.components(),
        }
    }
}

fn unsupported_color_space(detail: impl std::fmt::Debug) -> PdfError {
    PdfError::ImageExtractionFailed(format!("unsupported color space {:?}", detail))
}

/// Uncompressed bytes of a stream.
fn stream_bytes(stream: &Stream) -> Result<Vec<u8>> {
    if filters(&stream.dict).is_empty() {
        return Ok(stream.content.clone());
    }
    stream
        .decompressed_content()
        .map_err(|e| PdfError::ImageExtractionFailed(format!("Failed to inflate stream: {}", e)))
}

fn color_space(document: &Document, object: &Object, depth: usize) -> Result<ColorSpace> {
    if depth > MAX_COLOR_SPACE_DEPTH {
        return Err(unsupported_color_space("nested too deeply"));
    }

    match resolve(document, object) {
        Object::Name(name) => match name.as_slice() {
            b"DeviceGray" | b"CalGray" | b"G" => Ok(ColorSpace::Gray),
            b"DeviceRGB" | b"CalRGB" | b"RGB" => Ok(ColorSpace::Rgb),
            other => Err(unsupported_color_space(String::from_utf8_lossy(other))),
        },
        Object::Array(items) => {
            let family = items.first().map(|item| resolve(document, item)).and_then(|item| item.as_name().ok());
            match family {
                Some(b"CalGray") => Ok(ColorSpace::Gray),
                Some(b"CalRGB") => Ok(ColorSpace::Rgb),
                Some(b"ICCBased") => icc_color_space(document, items, depth),
                Some(b"Indexed") | Some(b"I") => indexed_color_space(document, items, depth),
                other => Err(unsupported_color_space(other.map(String::from_utf8_lossy))),
            }
        }
        _ => Err(unsupported_color_space("neither a name nor an array")),
    }
}

/// `[/ICCBased stream]`: the profile's `/N` picks gray or RGB.
fn icc_color_space(document: &Document, items: &[Object], depth: usize) -> Result<ColorSpace> {
    let Some(Object::Stream(profile)) = items.get(1).map(|item| resolve(document, item)) else {
        return Err(unsupported_color_space("ICCBased without a profile stream"));
    };

    match int_entry(&profile.dict, b"N") {
        Some(1) => Ok(ColorSpace::Gray),
        Some(3) => Ok(ColorSpace::Rgb),
        components => match profile.dict.get(b"Alternate") {
            Ok(alternate) => color_space(document, alternate, depth + 1),
            Err(_) => Err(unsupported_color_space(format!("ICCBased with N = {:?}", components))),
        },
    }
}

/// `[/Indexed base hival lookup]` with the lookup as a string or stream.
fn indexed_color_space(document: &Document, items: &[Object], depth: usize) -> Result<ColorSpace> {
    let [_, base, hival, lookup] = items else {
        return Err(unsupported_color_space("malformed Indexed array"));
    };

    let base = color_space(document, base, depth + 1)?;
    if matches!(base, ColorSpace::Indexed { .. }) {
        return Err(unsupported_color_space("Indexed over Indexed"));
    }

    let hival = resolve(document, hival)
        .as_i64()
        .ok()
        .filter(|h| (0..=255).contains(h))
        .ok_or_else(|| unsupported_color_space("Indexed hival outside 0..=255"))?;

    let mut palette = match resolve(document, lookup) {
        Object::String(bytes, _) => bytes.clone(),
        Object::Stream(stream) => stream_bytes(stream)?,
        _ => return Err(unsupported_color_space("Indexed lookup is neither string nor stream")),
    };

    let needed = (hival as usize + 1) * base.components();
    if palette.len() < needed {
        return Err(PdfError::ImageExtractionFailed(format!(
            "palette holds {} bytes, expected {}",
            palette.len(),
            needed
        )));
    }
    palette.truncate(needed);

    Ok(ColorSpace::Indexed {
        base: Box::new(base),
        palette,
    })
}

/// Image dimension as `u32`, rejecting values the PNG encoder cannot hold.
fn dimension(dict: &Dictionary, key: &[u8]) -> Result<u32> {
    let name = String::from_utf8_lossy(key);
    let value = int_entry(dict, key)
        .filter(|v| *v > 0)
        .ok_or_else(|| PdfError::ImageExtractionFailed(format!("missing image {}", name)))?;
    u32::try_from(value).map_err(|_| PdfError::ImageExtractionFailed(format!("image {} {} is out of range", name, value)))
}

/// `width * height * channels`, or an error when it does not fit in memory.
fn buffer_len(width: u32, height: u32, channels: usize) -> Result<usize> {
    usize::try_from(width)
        .ok()
        .zip(usize::try_from(height).ok())
        .and_then(|(w, h)| w.checked_mul(h))
        .and_then(|n| n.checked_mul(channels))
        .ok_or_else(|| {
            PdfError::ImageExtractionFailed(format!(
                "image of {}x{} with {} channel(s) is too large",
                width, height, channels
            ))
        })
}

fn raw_to_png(document: &Document, stream: &Stream, filters: &[Vec<u8>]) -> Result<Vec<u8>> {
    let dict = &stream.dict;
    if dict.get(b"ImageMask").and_then(Object::as_bool).unwrap_or(false) {
        return Err(PdfError::ImageExtractionFailed("image masks are not exported".to_string()));
    }

    match filters {
        [] => {}
        [only] if only.as_slice() == b"FlateDecode" => {}
        _ => {
            return Err(PdfError::ImageExtractionFailed(format!(
                "unsupported filter chain {:?}",
                filters_display(filters)
            )));
        }
    }

    let width = dimension(dict, b"Width")?;
    let height = dimension(dict, b"Height")?;

    if int_entry(dict, b"BitsPerComponent").unwrap_or(8) != 8 {
        return Err(PdfError::ImageExtractionFailed(
            "only 8 bits per component is supported".to_string(),
        ));
    }

    let color_space = match dict.get(b"ColorSpace") {
        Ok(object) => color_space(document, object, 0)?,
        Err(_) => return Err(unsupported_color_space("missing")),
    };

    let expected = buffer_len(width, height, color_space.components())?;
    let output_len = buffer_len(width, height, color_space.output_channels())?;

    let mut samples = stream_bytes(stream)?;
    if samples.len() < expected {
        return Err(PdfError::ImageExtractionFailed(format!(
            "pixel buffer holds {} bytes, expected {}",
            samples.len(),
            expected
        )));
    }
    samples.truncate(expected);

    let pixels = match &color_space {
        ColorSpace::Indexed { base, palette } => {
            let stride = base.components();
            let max_index = palette.len() / stride - 1;
            let mut pixels = Vec::with_capacity(output_len);
            for index in samples {
                let entry = usize::from(index).min(max_index) * stride;
                pixels.extend_from_slice(&palette[entry..entry + stride]);
            }
            pixels
        }
        _ => samples,
    };

    let image = if color_space.output_channels() == 1 {
        GrayImage::from_raw(width, height, pixels).map(DynamicImage::ImageLuma8)
    } else {
        RgbImage::from_raw(width, height, pixels).map(DynamicImage::ImageRgb8)
    }
    .ok_or_else(|| PdfError::ImageExtractionFailed("pixel buffer does not match dimensions".to_string()))?;

    let mut png = Cursor::new(Vec::new());
    image
        .write_to(&mut png, ImageFormat::Png)
        .map_err(|e| PdfError::ImageExtractionFailed(format!("PNG encode failed: {}", e)))?;
    Ok(png.into_inner())
}
