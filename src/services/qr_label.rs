//! Composite item labels: the item name printed above a QR code that encodes
//! the item attributes as JSON, on a white canvas of fixed size.

use crate::error::Error;
use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{imageops, DynamicImage, ImageFormat, Luma, Rgb, RgbImage};
use qrcode::{EcLevel, QrCode};
use serde::Serialize;
use std::io::Cursor;

pub const CANVAS_WIDTH: u32 = 400;
pub const CANVAS_HEIGHT: u32 = 480;
/// Height of the band above the code that holds the label text
pub const TEXT_BAND_HEIGHT: u32 = 80;

const GLYPH_SIZE: u32 = 8;
const MAX_TEXT_SCALE: u32 = 4;
const TEXT_MARGIN: u32 = 10;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// Item attributes carried by the QR payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelInput {
    pub name: String,
    pub quantity: i32,
    pub code: String,
    pub brand: String,
    pub image: String,
}

#[derive(Debug, Clone, Default)]
pub struct QrLabelComposer;

impl QrLabelComposer {
    pub fn new() -> Self {
        Self
    }

    /// JSON text encoded in the QR code
    pub fn payload(&self, input: &LabelInput) -> Result<String, Error> {
        serde_json::to_string(input).map_err(|e| Error::Render(e.to_string()))
    }

    /// Render the label and return PNG bytes
    pub fn render_png(&self, input: &LabelInput) -> Result<Vec<u8>, Error> {
        let canvas = self.render(input)?;

        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(canvas)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| Error::Render(format!("Failed to encode PNG: {}", e)))?;

        Ok(bytes)
    }

    /// Render the label canvas
    pub fn render(&self, input: &LabelInput) -> Result<RgbImage, Error> {
        let payload = self.payload(input)?;
        let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::H)
            .map_err(|e| Error::Render(format!("Failed to encode QR code: {}", e)))?;

        let side = CANVAS_HEIGHT - TEXT_BAND_HEIGHT;
        let qr = code
            .render::<Luma<u8>>()
            .quiet_zone(true)
            .max_dimensions(side, side)
            .build();
        if qr.width() > side || qr.height() > side {
            return Err(Error::Render("QR payload does not fit on the label".to_string()));
        }
        let qr = DynamicImage::ImageLuma8(qr).to_rgb8();

        let mut canvas = RgbImage::from_pixel(CANVAS_WIDTH, CANVAS_HEIGHT, WHITE);

        let qr_x = (CANVAS_WIDTH - qr.width()) / 2;
        let qr_y = TEXT_BAND_HEIGHT + (side - qr.height()) / 2;
        imageops::overlay(&mut canvas, &qr, i64::from(qr_x), i64::from(qr_y));

        draw_label(&mut canvas, &input.name);

        Ok(canvas)
    }
}

/// Print `text` centered in the band above the code
fn draw_label(canvas: &mut RgbImage, text: &str) {
    let text = fit_text(text);
    let count = text.chars().count() as u32;
    if count == 0 {
        return;
    }

    let scale = text_scale(count);
    let glyph = GLYPH_SIZE * scale;
    let width = count * glyph;
    let x0 = (CANVAS_WIDTH.saturating_sub(width)) / 2;
    let y0 = (TEXT_BAND_HEIGHT.saturating_sub(glyph)) / 2;

    for (i, c) in text.chars().enumerate() {
        let rows = BASIC_FONTS
            .get(c)
            .or_else(|| BASIC_FONTS.get('?'))
            .unwrap_or([0; 8]);
        let gx = x0 + i as u32 * glyph;

        for (row, bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_SIZE {
                if bits & (1 << col) == 0 {
                    continue;
                }
                for dy in 0..scale {
                    for dx in 0..scale {
                        let x = gx + col * scale + dx;
                        let y = y0 + row as u32 * scale + dy;
                        if x < canvas.width() && y < canvas.height() {
                            canvas.put_pixel(x, y, BLACK);
                        }
                    }
                }
            }
        }
    }
}

/// Largest integer glyph scale that fits `count` characters on one line
fn text_scale(count: u32) -> u32 {
    let usable = CANVAS_WIDTH - 2 * TEXT_MARGIN;
    (usable / (count * GLYPH_SIZE)).clamp(1, MAX_TEXT_SCALE)
}

/// Truncate to what fits at the smallest scale
fn fit_text(text: &str) -> String {
    let max_chars = ((CANVAS_WIDTH - 2 * TEXT_MARGIN) / GLYPH_SIZE) as usize;
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_chars - 3).collect();
    cut.push_str("...");
    cut
}
