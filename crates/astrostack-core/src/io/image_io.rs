use std::path::Path;

use image::{ColorType, DynamicImage, ImageBuffer, ImageFormat, Rgba};

use crate::consts::CHANNELS;
use crate::error::{Result, StackError};
use crate::frame::Frame;

/// Decode an in-memory image of any format the `image` crate understands.
pub fn decode_frame(bytes: &[u8]) -> Result<Frame> {
    let img = image::load_from_memory(bytes)?;
    frame_from_image(img)
}

/// Load an image file into an RGBA frame labelled with its file name.
pub fn load_frame(path: &Path) -> Result<Frame> {
    let img = image::open(path)?;
    let frame = frame_from_image(img)?;
    Ok(match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => frame.with_label(name),
        None => frame,
    })
}

fn frame_from_image(img: DynamicImage) -> Result<Frame> {
    let bit_depth = bit_depth(img.color());
    let rgba = img.to_rgba32f();
    let (w, h) = rgba.dimensions();
    let pixels: Vec<f32> = rgba.into_raw().into_iter().map(|v| v.clamp(0.0, 1.0)).collect();
    Frame::from_rgba(w as usize, h as usize, pixels, bit_depth)
}

fn bit_depth(color: ColorType) -> u8 {
    match color {
        ColorType::L16 | ColorType::La16 | ColorType::Rgb16 | ColorType::Rgba16 => 16,
        ColorType::Rgb32F | ColorType::Rgba32F => 32,
        _ => 8,
    }
}

/// Save a frame as 16-bit RGBA TIFF.
pub fn save_tiff(frame: &Frame, path: &Path) -> Result<()> {
    let img = to_rgba16(frame)?;
    img.save_with_format(path, ImageFormat::Tiff)?;
    Ok(())
}

/// Save a frame as PNG, 16-bit if the source had more than 8 bits.
pub fn save_png(frame: &Frame, path: &Path) -> Result<()> {
    if frame.original_bit_depth > 8 {
        to_rgba16(frame)?.save_with_format(path, ImageFormat::Png)?;
    } else {
        to_rgba8(frame)?.save_with_format(path, ImageFormat::Png)?;
    }
    Ok(())
}

/// Save a frame, choosing the format from the file extension. TIFF and PNG
/// keep alpha; other formats get 8-bit RGB.
pub fn save_frame(frame: &Frame, path: &Path) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("tiff" | "tif") | None => save_tiff(frame, path),
        Some("png") => save_png(frame, path),
        Some(_) => {
            let rgb = DynamicImage::ImageRgba8(to_rgba8(frame)?).to_rgb8();
            rgb.save(path)?;
            Ok(())
        }
    }
}

fn to_rgba16(frame: &Frame) -> Result<ImageBuffer<Rgba<u16>, Vec<u16>>> {
    let samples: Vec<u16> = frame
        .data
        .iter()
        .map(|v| (v.clamp(0.0, 1.0) * 65535.0).round() as u16)
        .collect();
    ImageBuffer::from_raw(frame.width() as u32, frame.height() as u32, samples)
        .ok_or_else(|| buffer_error(frame))
}

fn to_rgba8(frame: &Frame) -> Result<ImageBuffer<Rgba<u8>, Vec<u8>>> {
    let samples: Vec<u8> = frame
        .data
        .iter()
        .map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
        .collect();
    ImageBuffer::from_raw(frame.width() as u32, frame.height() as u32, samples)
        .ok_or_else(|| buffer_error(frame))
}

fn buffer_error(frame: &Frame) -> StackError {
    StackError::InvalidFrame(format!(
        "{}x{} frame does not hold {} samples per pixel in standard layout",
        frame.width(),
        frame.height(),
        CHANNELS
    ))
}
