//! Text watermark rendering.
//!
//! Renders the configured text (with optional shadow and outline) into a
//! transparent layer the size of the canvas. The layer is composited onto
//! the canvas exactly once, so the glyphs' anti-aliased edges blend
//! correctly against arbitrary backgrounds without double-blending.

use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};

use crate::fonts::FontLibrary;
use crate::pipeline::placement;
use crate::types::{Color, WatermarkConfig};

/// Pixel offset of the drop shadow.
const SHADOW_OFFSET: i64 = 2;

/// Measure the tight bounding box of `text` at the given pixel size.
///
/// Uses the font's exact advance and kerning metrics; the same metrics
/// drive drawing, so the measured box is what actually gets drawn.
pub fn measure_text(font: &FontArc, text: &str, font_size: f32) -> (u32, u32) {
    let scale = PxScale::from(font_size);
    let scaled = font.as_scaled(scale);

    let mut width = 0.0f32;
    let mut prev: Option<ab_glyph::GlyphId> = None;
    for c in text.chars() {
        let glyph_id = scaled.glyph_id(c);
        if let Some(prev) = prev {
            width += scaled.kern(prev, glyph_id);
        }
        width += scaled.h_advance(glyph_id);
        prev = Some(glyph_id);
    }

    (width.ceil() as u32, scaled.height().ceil() as u32)
}

/// Render the text watermark into a canvas-sized transparent layer.
///
/// Returns `None` when no text is configured. Placement uses the measured
/// text box as the watermark footprint. Shadow and outline are drawn
/// beneath the fill, all at the same target alpha.
pub fn render(canvas: (u32, u32), config: &WatermarkConfig, fonts: &FontLibrary) -> Option<RgbaImage> {
    if config.text.is_empty() {
        return None;
    }

    let font = fonts.resolve(&config.font_family, config.bold, config.italic);
    let footprint = measure_text(&font, &config.text, config.font_size);
    let (x, y) = placement::resolve(canvas, footprint, &config.placement);

    let alpha = (255.0 * config.text_opacity() as f64 / 100.0).round() as u8;
    let mut layer = RgbaImage::new(canvas.0, canvas.1);

    if config.shadow {
        draw_text(
            &mut layer,
            &font,
            &config.text,
            config.font_size,
            (x + SHADOW_OFFSET, y + SHADOW_OFFSET),
            Color::black(),
            alpha,
        );
    }

    if config.outline {
        // Dense stroke: the full 5x5 neighborhood minus the center,
        // 24 offsets rather than the usual 8.
        for dx in -2i64..=2 {
            for dy in -2i64..=2 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                draw_text(
                    &mut layer,
                    &font,
                    &config.text,
                    config.font_size,
                    (x + dx, y + dy),
                    Color::black(),
                    alpha,
                );
            }
        }
    }

    draw_text(
        &mut layer,
        &font,
        &config.text,
        config.font_size,
        (x, y),
        config.color,
        alpha,
    );

    Some(layer)
}

/// Draw one pass of the text at a top-left origin, clipping to the layer.
fn draw_text(
    layer: &mut RgbaImage,
    font: &FontArc,
    text: &str,
    font_size: f32,
    origin: (i64, i64),
    color: Color,
    alpha: u8,
) {
    let scale = PxScale::from(font_size);
    let scaled = font.as_scaled(scale);
    let (layer_w, layer_h) = (layer.width() as i64, layer.height() as i64);

    let baseline_y = origin.1 as f32 + scaled.ascent();
    let mut cursor_x = origin.0 as f32;
    let mut prev: Option<ab_glyph::GlyphId> = None;

    for c in text.chars() {
        let glyph_id = scaled.glyph_id(c);
        if let Some(prev) = prev {
            cursor_x += scaled.kern(prev, glyph_id);
        }

        let glyph = glyph_id.with_scale_and_position(scale, ab_glyph::point(cursor_x, baseline_y));
        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|px, py, coverage| {
                let x = px as i64 + bounds.min.x as i64;
                let y = py as i64 + bounds.min.y as i64;
                if x >= 0 && y >= 0 && x < layer_w && y < layer_h {
                    let pixel_alpha = (coverage * alpha as f32) as u8;
                    let pixel = Rgba([color.r, color.g, color.b, pixel_alpha]);
                    let existing = layer.get_pixel(x as u32, y as u32);
                    layer.put_pixel(x as u32, y as u32, blend_over(*existing, pixel));
                }
            });
        }

        cursor_x += scaled.h_advance(glyph_id);
        prev = Some(glyph_id);
    }
}

/// Standard "over" alpha compositing of `top` onto `bottom`.
fn blend_over(bottom: Rgba<u8>, top: Rgba<u8>) -> Rgba<u8> {
    let top_a = top[3] as f32 / 255.0;
    let bottom_a = bottom[3] as f32 / 255.0;
    let out_a = top_a + bottom_a * (1.0 - top_a);

    if out_a < 0.001 {
        return Rgba([0, 0, 0, 0]);
    }

    let blend = |t: u8, b: u8| -> u8 {
        let t = t as f32 / 255.0;
        let b = b as f32 / 255.0;
        let v = (t * top_a + b * bottom_a * (1.0 - top_a)) / out_a;
        (v * 255.0) as u8
    };

    Rgba([
        blend(top[0], bottom[0]),
        blend(top[1], bottom[1]),
        blend(top[2], bottom[2]),
        (out_a * 255.0) as u8,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts;
    use crate::types::{Anchor, PlacementSpec};

    fn config(text: &str) -> WatermarkConfig {
        WatermarkConfig {
            text: text.to_string(),
            opacity: 100,
            placement: PlacementSpec::Anchor(Anchor::Center),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_text_renders_nothing() {
        let library = FontLibrary::empty();
        assert!(render((400, 300), &config(""), &library).is_none());
    }

    #[test]
    fn test_layer_is_canvas_sized_and_has_glyphs() {
        let library = FontLibrary::empty();
        let layer = render((400, 300), &config("Hello"), &library).unwrap();
        assert_eq!((layer.width(), layer.height()), (400, 300));
        assert!(layer.pixels().any(|p| p[3] > 0));
    }

    #[test]
    fn test_zero_opacity_layer_is_fully_transparent() {
        let library = FontLibrary::empty();
        let mut cfg = config("Hello");
        cfg.opacity = 0;
        let layer = render((400, 300), &cfg, &library).unwrap();
        assert!(layer.pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn test_measure_grows_with_size_and_length() {
        let font = fonts::default_font();
        let (w1, h1) = measure_text(&font, "Hello", 12.0);
        let (w2, h2) = measure_text(&font, "Hello", 24.0);
        let (w3, _) = measure_text(&font, "Hello Hello", 24.0);
        assert!(w2 > w1 && h2 > h1);
        assert!(w3 > w2);
    }

    #[test]
    fn test_shadow_adds_black_pixels() {
        let library = FontLibrary::empty();
        let mut cfg = config("X");
        cfg.color = Color::white();
        cfg.shadow = true;

        let layer = render((200, 200), &cfg, &library).unwrap();
        // Shadow pass draws black beneath the white fill; both must be
        // present somewhere in the layer.
        let has_darkish = layer
            .pixels()
            .any(|p| p[3] > 128 && p[0] < 64 && p[1] < 64 && p[2] < 64);
        let has_lightish = layer
            .pixels()
            .any(|p| p[3] > 128 && p[0] > 192 && p[1] > 192 && p[2] > 192);
        assert!(has_darkish, "expected shadow pixels");
        assert!(has_lightish, "expected fill pixels");
    }

    #[test]
    fn test_outline_covers_more_than_plain() {
        let library = FontLibrary::empty();
        let plain = render((200, 200), &config("X"), &library).unwrap();

        let mut cfg = config("X");
        cfg.outline = true;
        let outlined = render((200, 200), &cfg, &library).unwrap();

        let coverage = |img: &RgbaImage| img.pixels().filter(|p| p[3] > 0).count();
        assert!(coverage(&outlined) > coverage(&plain));
    }

    #[test]
    fn test_custom_placement_offscreen_is_clipped() {
        let library = FontLibrary::empty();
        let mut cfg = config("Hello");
        cfg.placement = PlacementSpec::Custom { fx: 0.99, fy: 0.99 };
        // Must not panic; glyphs falling outside the canvas are clipped
        let layer = render((100, 100), &cfg, &library).unwrap();
        assert_eq!((layer.width(), layer.height()), (100, 100));
    }
}
