//! Frame snapshots for the download button.
//!
//! The raw format is the drawing buffer as-is: packed RGBA8, row-major,
//! no header and no compression. Rows come out bottom-up, the way
//! `readPixels` returns them.

use crate::error::{Error, Result};

pub const RAW_EXTENSION: &str = "rgba";
pub const PNG_MIME: &str = "image/png";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl RawFrame {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = byte_len(width, height);
        if pixels.len() != expected {
            return Err(Error::PixelReadback(format!(
                "expected {} bytes for {}x{}, got {}",
                expected,
                width,
                height,
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.pixels
    }

    /// `screensaver-<pattern>-<w>x<h>.rgba`; the size is part of the name
    /// because the blob carries no header.
    pub fn file_name(&self, pattern: &str) -> String {
        raw_file_name(pattern, self.width, self.height)
    }
}

pub fn raw_file_name(pattern: &str, width: u32, height: u32) -> String {
    format!(
        "screensaver-{}-{}x{}.{}",
        slug(pattern),
        width,
        height,
        RAW_EXTENSION
    )
}

pub fn byte_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * 4
}

fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') && !out.is_empty() {
            out.push('-');
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}
