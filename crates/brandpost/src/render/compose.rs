//! Canvas assembly for a branded post image.

use std::io::Cursor;

use ab_glyph::PxScale;
use image::imageops::FilterType;
use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut};
use imageproc::rect::Rect;

use crate::error::RenderError;
use crate::render::brand::BrandKit;
use crate::render::layout::{
    char_slice, fit_block, phrase_spans, FontMeasure, TextMeasure,
};

/// Square output canvas, in pixels.
pub const CANVAS_SIZE: u32 = 1080;

/// Top share of the canvas reserved for the headline band.
const HEADLINE_BAND_RATIO: f32 = 0.30;

const SEPARATOR_THICKNESS: u32 = 6;
const HEADLINE_MARGIN_X: f32 = 60.0;
const HEADLINE_MARGIN_Y: f32 = 40.0;
const MAX_FONT_SIZE: f32 = 64.0;
const MIN_FONT_SIZE: f32 = 28.0;
const FONT_STEP: f32 = 2.0;

/// Highlight rectangles sit in the lower share of each line band.
const HIGHLIGHT_BAND_RATIO: f32 = 0.45;

const LOGO_HEIGHT: u32 = 80;
const CORNER_MARGIN: u32 = 40;
const BRAND_TEXT_SIZE: f32 = 30.0;
const SHADOW_OFFSET: i32 = 2;

/// Composition seam consumed by the orchestrator; implemented by
/// [`Compositor`] in production and by test doubles elsewhere.
pub trait PostComposer: Send + Sync {
    fn compose(
        &self,
        source: &DynamicImage,
        headline: &str,
        highlights: &[String],
    ) -> Result<Vec<u8>, RenderError>;
}

/// Assembles the fixed-size branded canvas. Performs no I/O: every image and
/// the font arrive pre-decoded inside the [`BrandKit`].
pub struct Compositor {
    kit: BrandKit,
}

impl Compositor {
    pub fn new(kit: BrandKit) -> Self {
        Self { kit }
    }

    fn draw_headline(&self, canvas: &mut RgbaImage, headline: &str, highlights: &[String]) {
        let band_height = headline_band_height() as f32;
        let measure = FontMeasure::new(&self.kit.font);

        let block = fit_block(
            &measure,
            headline,
            CANVAS_SIZE as f32 - 2.0 * HEADLINE_MARGIN_X,
            band_height - 2.0 * HEADLINE_MARGIN_Y,
            MAX_FONT_SIZE,
            MIN_FONT_SIZE,
            FONT_STEP,
        );

        let line_height = block.line_height();
        let mut y = (band_height - block.block_height()) / 2.0;

        for line in &block.lines {
            let line_width = measure.line_width(line, block.font_size);
            let x = (CANVAS_SIZE as f32 - line_width) / 2.0;

            // Rectangles go down first so they sit behind the glyphs.
            for phrase in highlights {
                for (start, end) in phrase_spans(line, phrase) {
                    let prefix = char_slice(line, 0, start);
                    let span = char_slice(line, start, end);
                    let offset = measure.line_width(prefix, block.font_size);
                    let span_width = measure.line_width(span, block.font_size);
                    if span_width <= 0.0 {
                        continue;
                    }

                    let rect_y = y + line_height * (1.0 - HIGHLIGHT_BAND_RATIO);
                    let rect_height = (line_height * HIGHLIGHT_BAND_RATIO).max(1.0);
                    draw_filled_rect_mut(
                        canvas,
                        Rect::at((x + offset) as i32, rect_y as i32)
                            .of_size(span_width.ceil() as u32, rect_height as u32),
                        self.kit.highlight,
                    );
                }
            }

            let glyph_y = y + (line_height - block.font_size) / 2.0;
            draw_text_mut(
                canvas,
                self.kit.text_color,
                x as i32,
                glyph_y as i32,
                PxScale::from(block.font_size),
                &self.kit.font,
                line,
            );

            y += line_height;
        }
    }

    fn draw_logo(&self, canvas: &mut RgbaImage) {
        let logo = &self.kit.logo;
        if logo.height() == 0 {
            return;
        }
        let width =
            ((logo.width() as f32 * LOGO_HEIGHT as f32 / logo.height() as f32).round() as u32)
                .max(1);
        let scaled = logo.resize_exact(width, LOGO_HEIGHT, FilterType::Lanczos3);
        let y = (CANVAS_SIZE - CORNER_MARGIN - LOGO_HEIGHT) as i64;
        image::imageops::overlay(canvas, &scaled.to_rgba8(), CORNER_MARGIN as i64, y);
    }

    fn draw_brand_text(&self, canvas: &mut RgbaImage) {
        let measure = FontMeasure::new(&self.kit.font);
        let width = measure.line_width(&self.kit.brand_text, BRAND_TEXT_SIZE);
        let x = (CANVAS_SIZE as f32 - CORNER_MARGIN as f32 - width) as i32;
        let y = (CANVAS_SIZE as f32 - CORNER_MARGIN as f32 - BRAND_TEXT_SIZE) as i32;

        // Drop shadow keeps the text legible on variable backgrounds.
        draw_text_mut(
            canvas,
            Rgba([0, 0, 0, 200]),
            x + SHADOW_OFFSET,
            y + SHADOW_OFFSET,
            PxScale::from(BRAND_TEXT_SIZE),
            &self.kit.font,
            &self.kit.brand_text,
        );
        draw_text_mut(
            canvas,
            self.kit.text_color,
            x,
            y,
            PxScale::from(BRAND_TEXT_SIZE),
            &self.kit.font,
            &self.kit.brand_text,
        );
    }
}

impl PostComposer for Compositor {
    fn compose(
        &self,
        source: &DynamicImage,
        headline: &str,
        highlights: &[String],
    ) -> Result<Vec<u8>, RenderError> {
        let _span = tracing::info_span!("compose", headline).entered();

        let band_height = headline_band_height();
        let image_height = CANVAS_SIZE - band_height;

        let mut canvas = RgbaImage::from_pixel(CANVAS_SIZE, CANVAS_SIZE, self.kit.background);

        // Source image cover-fits the lower band: crop to the band's aspect
        // ratio, then scale to fill exactly.
        let (cx, cy, cw, ch) = cover_crop(source.width(), source.height(), CANVAS_SIZE, image_height);
        let fitted = source
            .crop_imm(cx, cy, cw, ch)
            .resize_exact(CANVAS_SIZE, image_height, FilterType::Lanczos3);
        image::imageops::overlay(&mut canvas, &fitted.to_rgba8(), 0, band_height as i64);

        self.draw_headline(&mut canvas, headline, highlights);

        // Separator at the band boundary.
        draw_filled_rect_mut(
            &mut canvas,
            Rect::at(0, band_height as i32 - (SEPARATOR_THICKNESS / 2) as i32)
                .of_size(CANVAS_SIZE, SEPARATOR_THICKNESS),
            self.kit.highlight,
        );

        // Overlay stretches across the whole canvas after the content so it
        // acts as a global tint.
        let overlay = self
            .kit
            .overlay
            .resize_exact(CANVAS_SIZE, CANVAS_SIZE, FilterType::Triangle)
            .to_rgba8();
        image::imageops::overlay(&mut canvas, &overlay, 0, 0);

        self.draw_logo(&mut canvas);
        self.draw_brand_text(&mut canvas);

        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(canvas)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .map_err(|e| RenderError::Encode(e.to_string()))?;
        Ok(bytes)
    }
}

fn headline_band_height() -> u32 {
    (CANVAS_SIZE as f32 * HEADLINE_BAND_RATIO).round() as u32
}

/// Computes the centered source crop whose aspect ratio matches the target,
/// cropping width when the source is relatively wider and height when it is
/// relatively taller.
pub(crate) fn cover_crop(
    src_width: u32,
    src_height: u32,
    dst_width: u32,
    dst_height: u32,
) -> (u32, u32, u32, u32) {
    let src_ratio = src_width as f64 / src_height as f64;
    let dst_ratio = dst_width as f64 / dst_height as f64;

    if src_ratio > dst_ratio {
        let crop_width = ((src_height as f64 * dst_ratio).round() as u32)
            .clamp(1, src_width);
        let x = (src_width - crop_width) / 2;
        (x, 0, crop_width, src_height)
    } else {
        let crop_height = ((src_width as f64 / dst_ratio).round() as u32)
            .clamp(1, src_height);
        let y = (src_height - crop_height) / 2;
        (0, y, src_width, crop_height)
    }
}
