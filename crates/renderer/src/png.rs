//! PNG encoding for legend bitmaps.
//!
//! Images with at most 256 distinct RGBA values are written as indexed PNG
//! (color type 3, with `tRNS` when any color is translucent); anything else
//! falls back to truecolor with alpha (color type 6). Either form can carry
//! `tEXt` chunks, which legends use to record their label and value range.

use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::io::Write;

use window_common::{WindowError, WindowResult};

const SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

const MAX_PALETTE_SIZE: usize = 256;

/// Pixel count from which palette extraction runs on the rayon pool.
const PARALLEL_THRESHOLD: usize = 64 * 64;

#[derive(Debug, Clone, Copy)]
#[repr(u8)]
enum ColorType {
    Indexed = 3,
    Rgba = 6,
}

/// Encode straight-alpha RGBA pixels, `width * height * 4` bytes, with the
/// given `tEXt` keyword/value pairs.
pub fn encode_png(
    pixels: &[u8],
    width: usize,
    height: usize,
    text: &[(&str, &str)],
) -> WindowResult<Vec<u8>> {
    if width == 0 || height == 0 || pixels.len() != width * height * 4 {
        return Err(WindowError::RenderFailure(format!(
            "cannot encode {} bytes as a {}x{} RGBA image",
            pixels.len(),
            width,
            height
        )));
    }

    let mut png = PngWriter::new();
    match Palette::extract(pixels) {
        Some(palette) => {
            png.header(width, height, ColorType::Indexed);
            png.chunk(b"PLTE", &palette.rgb());
            if let Some(alpha) = palette.alpha() {
                png.chunk(b"tRNS", &alpha);
            }
            png.text(text)?;
            png.image_data(&palette.indices, width, height)?;
        }
        None => {
            png.header(width, height, ColorType::Rgba);
            png.text(text)?;
            png.image_data(pixels, width * 4, height)?;
        }
    }
    Ok(png.finish())
}

/// Read back the `tEXt` chunks of a PNG as (keyword, value) pairs.
pub fn read_text_chunks(png: &[u8]) -> WindowResult<Vec<(String, String)>> {
    let body = png
        .strip_prefix(&SIGNATURE[..])
        .ok_or_else(|| WindowError::InvalidFormat("not a PNG file".to_string()))?;

    let mut entries = Vec::new();
    let mut rest = body;
    while rest.len() >= 8 {
        let len = u32::from_be_bytes([rest[0], rest[1], rest[2], rest[3]]) as usize;
        let kind = &rest[4..8];
        // data plus CRC
        if rest.len() < 8 + len + 4 {
            return Err(WindowError::InvalidFormat("truncated PNG chunk".to_string()));
        }
        let data = &rest[8..8 + len];

        match kind {
            b"IEND" => break,
            b"tEXt" => {
                if let Some(nul) = data.iter().position(|&b| b == 0) {
                    entries.push((from_latin1(&data[..nul]), from_latin1(&data[nul + 1..])));
                }
            }
            _ => {}
        }
        rest = &rest[8 + len + 4..];
    }

    Ok(entries)
}

// ============================================================================
// Palette
// ============================================================================

/// Up to 256 colors and one palette index per pixel.
struct Palette {
    colors: Vec<[u8; 4]>,
    indices: Vec<u8>,
}

impl Palette {
    /// `None` when the image has more than 256 distinct colors.
    fn extract(pixels: &[u8]) -> Option<Self> {
        let parallel = pixels.len() / 4 >= PARALLEL_THRESHOLD;
        let colors = if parallel {
            distinct_colors_parallel(pixels)?
        } else {
            distinct_colors(pixels)?
        };

        let index: HashMap<[u8; 4], u8> = colors
            .iter()
            .enumerate()
            .map(|(i, c)| (*c, i as u8))
            .collect();
        let lookup = |px: &[u8]| index.get(&[px[0], px[1], px[2], px[3]]).copied().unwrap_or(0);

        let indices = if parallel {
            pixels.par_chunks_exact(4).map(&lookup).collect()
        } else {
            pixels.chunks_exact(4).map(&lookup).collect()
        };

        Some(Self { colors, indices })
    }

    fn rgb(&self) -> Vec<u8> {
        self.colors.iter().flat_map(|c| [c[0], c[1], c[2]]).collect()
    }

    /// Per-entry alpha for `tRNS`, or `None` when every entry is opaque.
    fn alpha(&self) -> Option<Vec<u8>> {
        self.colors
            .iter()
            .any(|c| c[3] < 255)
            .then(|| self.colors.iter().map(|c| c[3]).collect())
    }
}

/// Distinct colors in order of first appearance.
fn distinct_colors(pixels: &[u8]) -> Option<Vec<[u8; 4]>> {
    let mut seen = HashSet::with_capacity(MAX_PALETTE_SIZE);
    let mut colors = Vec::with_capacity(MAX_PALETTE_SIZE);
    for px in pixels.chunks_exact(4) {
        let color = [px[0], px[1], px[2], px[3]];
        if seen.insert(color) {
            if colors.len() == MAX_PALETTE_SIZE {
                return None;
            }
            colors.push(color);
        }
    }
    Some(colors)
}

/// Distinct colors gathered per chunk and merged, in sorted order.
fn distinct_colors_parallel(pixels: &[u8]) -> Option<Vec<[u8; 4]>> {
    let chunk_len = (pixels.len() / 4 / rayon::current_num_threads()).max(256) * 4;
    let merged = pixels
        .par_chunks(chunk_len)
        .map(|part| distinct_colors(part).map(HashSet::<[u8; 4]>::from_iter))
        .try_reduce(HashSet::new, |mut a, b| {
            a.extend(b);
            (a.len() <= MAX_PALETTE_SIZE).then_some(a)
        })?;

    let mut colors: Vec<[u8; 4]> = merged.into_iter().collect();
    colors.sort_unstable();
    Some(colors)
}

// ============================================================================
// Chunk writer
// ============================================================================

struct PngWriter {
    buf: Vec<u8>,
}

impl PngWriter {
    fn new() -> Self {
        Self {
            buf: SIGNATURE.to_vec(),
        }
    }

    fn chunk(&mut self, kind: &[u8; 4], data: &[u8]) {
        self.buf.extend_from_slice(&(data.len() as u32).to_be_bytes());
        self.buf.extend_from_slice(kind);
        self.buf.extend_from_slice(data);

        let mut crc = crc32fast::Hasher::new();
        crc.update(kind);
        crc.update(data);
        self.buf.extend_from_slice(&crc.finalize().to_be_bytes());
    }

    /// IHDR with 8-bit samples, deflate, no filtering extensions, no interlace.
    fn header(&mut self, width: usize, height: usize, color_type: ColorType) {
        let mut data = [0u8; 13];
        data[..4].copy_from_slice(&(width as u32).to_be_bytes());
        data[4..8].copy_from_slice(&(height as u32).to_be_bytes());
        data[8] = 8;
        data[9] = color_type as u8;
        self.chunk(b"IHDR", &data);
    }

    /// Keywords are 1-79 bytes without NUL; text is stored as Latin-1.
    fn text(&mut self, entries: &[(&str, &str)]) -> WindowResult<()> {
        for (keyword, value) in entries {
            if keyword.is_empty() || keyword.len() > 79 || keyword.contains('\0') {
                return Err(WindowError::RenderFailure(format!(
                    "invalid PNG text keyword '{}'",
                    keyword
                )));
            }
            let mut data = keyword.as_bytes().to_vec();
            data.push(0);
            data.extend(value.chars().map(to_latin1));
            self.chunk(b"tEXt", &data);
        }
        Ok(())
    }

    /// Compress `height` rows of `row_bytes` each, every row with filter 0.
    fn image_data(&mut self, rows: &[u8], row_bytes: usize, height: usize) -> WindowResult<()> {
        let mut raw = Vec::with_capacity(height * (row_bytes + 1));
        for row in rows.chunks_exact(row_bytes).take(height) {
            raw.push(0);
            raw.extend_from_slice(row);
        }

        let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(&raw)?;
        let compressed = encoder.finish()?;
        self.chunk(b"IDAT", &compressed);
        Ok(())
    }

    fn finish(mut self) -> Vec<u8> {
        self.chunk(b"IEND", &[]);
        self.buf
    }
}

fn to_latin1(c: char) -> u8 {
    u8::try_from(u32::from(c)).unwrap_or(b'?')
}

fn from_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}
