//! SVG drawing surface for charts and diagrams.
//!
//! Diagram code positions shapes in figure fractions with the origin at the
//! bottom-left corner; `Canvas` converts to backend pixels.

use crate::utils::error::{render_error, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

pub type SvgArea<'a> = DrawingArea<SVGBackend<'a>, Shift>;

pub const FONT: &str = "sans-serif";

pub const NAVY: RGBColor = RGBColor(0, 0, 128);
pub const LIGHT_STEEL_BLUE: RGBColor = RGBColor(176, 196, 222);
pub const FOREST_GREEN: RGBColor = RGBColor(34, 139, 34);
pub const PALE_GREEN: RGBColor = RGBColor(152, 251, 152);
pub const GRAY: RGBColor = RGBColor(128, 128, 128);
pub const DARK_GRAY: RGBColor = RGBColor(51, 51, 51);
pub const LIGHT_YELLOW: RGBColor = RGBColor(255, 255, 224);

/// Renders into an in-memory SVG document of `width` x `height` pixels.
pub fn render_svg<F>(width: u32, height: u32, draw: F) -> Result<String>
where
    F: FnOnce(&SvgArea<'_>) -> Result<()>,
{
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(render_error)?;
        draw(&root)?;
        root.present().map_err(render_error)?;
    }
    Ok(svg)
}

pub fn text_style(size: f64, bold: bool, color: &RGBColor, h: HPos, v: VPos) -> TextStyle<'static> {
    let font = (FONT, size).into_font();
    let font = if bold { font.style(FontStyle::Bold) } else { font };
    font.color(color).pos(Pos::new(h, v))
}

pub fn centered(size: f64, bold: bool, color: &RGBColor) -> TextStyle<'static> {
    text_style(size, bold, color, HPos::Center, VPos::Center)
}

/// Outline and fill for `Canvas::rect`.
#[derive(Debug, Clone, Copy)]
pub struct BoxStyle {
    pub fill: Option<RGBAColor>,
    pub stroke: Option<RGBAColor>,
    pub stroke_width: u32,
}

impl BoxStyle {
    pub fn filled(fill: RGBColor, alpha: f64) -> Self {
        Self {
            fill: Some(fill.mix(alpha)),
            stroke: None,
            stroke_width: 0,
        }
    }

    pub fn with_stroke(mut self, stroke: RGBColor, width: u32) -> Self {
        self.stroke = Some(stroke.to_rgba());
        self.stroke_width = width;
        self
    }
}

pub struct Canvas<'a, 'b> {
    area: &'a SvgArea<'b>,
    width: f64,
    height: f64,
}

impl<'a, 'b> Canvas<'a, 'b> {
    pub fn new(area: &'a SvgArea<'b>) -> Self {
        let (w, h) = area.dim_in_pixel();
        Self {
            area,
            width: w as f64,
            height: h as f64,
        }
    }

    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    pub fn px(&self, fx: f64, fy: f64) -> (i32, i32) {
        (
            (fx * self.width).round() as i32,
            ((1.0 - fy) * self.height).round() as i32,
        )
    }

    /// Rectangle with lower-left corner at (`fx`, `fy`).
    pub fn rect(&self, fx: f64, fy: f64, fw: f64, fh: f64, style: BoxStyle) -> Result<()> {
        let top_left = self.px(fx, fy + fh);
        let bottom_right = self.px(fx + fw, fy);
        if let Some(fill) = style.fill {
            self.area
                .draw(&Rectangle::new([top_left, bottom_right], fill.filled()))
                .map_err(render_error)?;
        }
        if let Some(stroke) = style.stroke {
            self.area
                .draw(&Rectangle::new(
                    [top_left, bottom_right],
                    stroke.stroke_width(style.stroke_width),
                ))
                .map_err(render_error)?;
        }
        Ok(())
    }

    pub fn text(&self, fx: f64, fy: f64, text: &str, style: &TextStyle) -> Result<()> {
        self.area
            .draw_text(text, style, self.px(fx, fy))
            .map_err(render_error)
    }

    /// Newline-separated text; the block is centred vertically on `fy`.
    pub fn text_block(&self, fx: f64, fy: f64, text: &str, style: &TextStyle, spacing: f64) -> Result<()> {
        let lines: Vec<&str> = text.lines().collect();
        let step = style.font.get_size() * spacing / self.height;
        let top = fy + step * (lines.len() as f64 - 1.0) / 2.0;
        for (i, line) in lines.iter().enumerate() {
            self.text(fx, top - step * i as f64, line, style)?;
        }
        Ok(())
    }

    /// Newline-separated text flowing down from `fy`.
    pub fn text_down(&self, fx: f64, fy: f64, text: &str, style: &TextStyle, spacing: f64) -> Result<f64> {
        let step = style.font.get_size() * spacing / self.height;
        let mut y = fy;
        for line in text.lines() {
            self.text(fx, y, line, style)?;
            y -= step;
        }
        Ok(y)
    }

    pub fn line(&self, from: (f64, f64), to: (f64, f64), color: RGBAColor, width: u32) -> Result<()> {
        let path = vec![self.px(from.0, from.1), self.px(to.0, to.1)];
        self.area
            .draw(&PathElement::new(path, color.stroke_width(width)))
            .map_err(render_error)
    }

    /// Straight line broken into `dash` pixel strokes separated by `gap` pixels.
    pub fn dashed_line(
        &self,
        from: (f64, f64),
        to: (f64, f64),
        color: RGBAColor,
        width: u32,
        dash: f64,
        gap: f64,
    ) -> Result<()> {
        let (x0, y0) = self.px(from.0, from.1);
        let (x1, y1) = self.px(to.0, to.1);
        draw_dashed(self.area, (x0 as f64, y0 as f64), (x1 as f64, y1 as f64), color, width, dash, gap)
    }

    pub fn polygon(&self, points: &[(f64, f64)], style: ShapeStyle) -> Result<()> {
        let points: Vec<(i32, i32)> = points.iter().map(|&(x, y)| self.px(x, y)).collect();
        self.area
            .draw(&Polygon::new(points, style))
            .map_err(render_error)
    }
}

/// Arrow in backend pixel coordinates; `head` is the head length.
pub fn draw_arrow_px<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    from: (f64, f64),
    to: (f64, f64),
    color: RGBAColor,
    width: u32,
    head: f64,
) -> Result<()> {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let len = (dx * dx + dy * dy).sqrt();
    if len < 1.0 {
        return Ok(());
    }
    let (ux, uy) = (dx / len, dy / len);
    let head = head.min(len);
    let base = (to.0 - ux * head, to.1 - uy * head);
    let half = head * 0.45;
    let px = |x: f64, y: f64| (x.round() as i32, y.round() as i32);

    area.draw(&PathElement::new(
        vec![px(from.0, from.1), px(base.0, base.1)],
        color.stroke_width(width),
    ))
    .map_err(render_error)?;
    let tip = vec![
        px(to.0, to.1),
        px(base.0 - uy * half, base.1 + ux * half),
        px(base.0 + uy * half, base.1 - ux * half),
    ];
    area.draw(&Polygon::new(tip, color.filled()))
        .map_err(render_error)?;
    Ok(())
}

/// Dashed segment in backend pixel coordinates.
pub fn draw_dashed<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    from: (f64, f64),
    to: (f64, f64),
    color: RGBAColor,
    width: u32,
    dash: f64,
    gap: f64,
) -> Result<()> {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let len = (dx * dx + dy * dy).sqrt();
    if len == 0.0 || dash <= 0.0 {
        return Ok(());
    }
    let (ux, uy) = (dx / len, dy / len);
    let mut offset = 0.0;
    while offset < len {
        let end = (offset + dash).min(len);
        let a = (from.0 + ux * offset, from.1 + uy * offset);
        let b = (from.0 + ux * end, from.1 + uy * end);
        area.draw(&PathElement::new(
            vec![
                (a.0.round() as i32, a.1.round() as i32),
                (b.0.round() as i32, b.1.round() as i32),
            ],
            color.stroke_width(width),
        ))
        .map_err(render_error)?;
        offset += dash + gap;
    }
    Ok(())
}

/// Paints `img` scaled to fit `area` as a mosaic of `block` x `block` pixel
/// averages, centred.
pub fn draw_raster(area: &SvgArea<'_>, img: &image::RgbImage, block: u32) -> Result<()> {
    let (aw, ah) = area.dim_in_pixel();
    let (iw, ih) = img.dimensions();
    if iw == 0 || ih == 0 || block == 0 {
        return Ok(());
    }
    let scale = f64::min(aw as f64 / iw as f64, ah as f64 / ih as f64);
    let left = (aw as f64 - iw as f64 * scale) / 2.0;
    let top = (ah as f64 - ih as f64 * scale) / 2.0;

    for by in (0..ih).step_by(block as usize) {
        for bx in (0..iw).step_by(block as usize) {
            let (bw, bh) = (block.min(iw - bx), block.min(ih - by));
            let mut sum = [0u64; 3];
            for y in by..by + bh {
                for x in bx..bx + bw {
                    let p = img.get_pixel(x, y);
                    for c in 0..3 {
                        sum[c] += p[c] as u64;
                    }
                }
            }
            let n = (bw * bh) as u64;
            let color = RGBColor((sum[0] / n) as u8, (sum[1] / n) as u8, (sum[2] / n) as u8);
            let corner = |x: u32, y: u32| {
                (
                    (left + x as f64 * scale).round() as i32,
                    (top + y as f64 * scale).round() as i32,
                )
            };
            area.draw(&Rectangle::new(
                [corner(bx, by), corner(bx + bw, by + bh)],
                color.filled(),
            ))
            .map_err(render_error)?;
        }
    }
    Ok(())
}

/// `1,234,567` style grouping.
pub fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
