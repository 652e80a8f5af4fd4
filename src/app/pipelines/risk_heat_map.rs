use crate::adapters::svg_canvas::{draw_dashed, render_svg, text_style, Canvas, SvgArea};
use crate::core::{Pipeline, Storage};
use crate::utils::error::{render_error, Result};
use plotters::coord::combinators::BindKeyPoints;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, VPos};

const WIDTH: u32 = 1000;
const HEIGHT: u32 = 800;
const AXIS_MIN: f64 = 0.5;
const AXIS_MAX: f64 = 3.5;
const GRID_CELLS: usize = 60;
const BACKGROUND_ALPHA: f64 = 0.6;
const LABEL_OFFSET: f64 = 0.08;

/// Green, yellow and red stops of the soft traffic-light colormap.
const TRAFFIC_LIGHT: [(f64, f64, f64); 3] = [(0.16, 0.66, 0.27), (0.99, 0.86, 0.37), (0.84, 0.19, 0.16)];

#[derive(Debug, Clone, PartialEq)]
pub struct Risk {
    pub name: &'static str,
    pub likelihood: f64,
    pub impact: f64,
}

pub const RISKS: [Risk; 6] = [
    Risk { name: "Cyber-security / PHI exposure", likelihood: 3.3, impact: 3.3 },
    Risk { name: "Data-integrity & version drift", likelihood: 1.2, impact: 3.1 },
    Risk { name: "Interoperability & conformance drift", likelihood: 3.0, impact: 2.1 },
    Risk { name: "Annotation / workflow mis-alignment", likelihood: 2.5, impact: 2.8 },
    Risk { name: "Cost & operational complexity", likelihood: 3.0, impact: 2.5 },
    Risk { name: "Scalability / innovation bottleneck", likelihood: 2.2, impact: 2.3 },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Score is likelihood times impact.
    pub fn from_score(score: f64) -> Self {
        if score <= 2.0 {
            RiskLevel::Low
        } else if score <= 6.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }

    pub fn color(&self) -> RGBColor {
        match self {
            RiskLevel::Low => RGBColor(0, 100, 0),
            RiskLevel::Medium => RGBColor(255, 140, 0),
            RiskLevel::High => RGBColor(139, 0, 0),
        }
    }
}

/// A risk with its label placement resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedRisk {
    pub risk: Risk,
    pub level: RiskLevel,
    pub label_at: (f64, f64),
    pub anchor: HPos,
}

#[derive(Debug, Clone)]
pub struct RiskHeatMapOptions {
    pub output: String,
}

impl Default for RiskHeatMapOptions {
    fn default() -> Self {
        Self {
            output: "figures/risk_heat_map.svg".to_string(),
        }
    }
}

pub struct RiskHeatMapPipeline<S: Storage> {
    storage: S,
    options: RiskHeatMapOptions,
}

impl<S: Storage> RiskHeatMapPipeline<S> {
    pub fn new(storage: S, options: RiskHeatMapOptions) -> Self {
        Self { storage, options }
    }
}

impl<S: Storage> Pipeline for RiskHeatMapPipeline<S> {
    type Extracted = Vec<Risk>;
    type Transformed = Vec<PlacedRisk>;

    fn name(&self) -> &'static str {
        "risk-heat-map"
    }

    fn extract(&self) -> Result<Vec<Risk>> {
        Ok(RISKS.to_vec())
    }

    fn transform(&self, risks: Vec<Risk>) -> Result<Vec<PlacedRisk>> {
        Ok(risks.into_iter().map(place).collect())
    }

    fn load(&self, placed: Vec<PlacedRisk>) -> Result<Vec<String>> {
        let svg = render_heat_map(&placed)?;
        self.storage.write_file(&self.options.output, svg.as_bytes())?;
        Ok(vec![self.storage.display_path(&self.options.output)])
    }
}

/// Labels sit beside the point: to the right for low likelihood, to the
/// left otherwise, nudged toward the centre vertically.
pub fn place(risk: Risk) -> PlacedRisk {
    let dx = if risk.likelihood < 2.0 { LABEL_OFFSET } else { -LABEL_OFFSET };
    let dy = if risk.impact < 2.0 { LABEL_OFFSET } else { -LABEL_OFFSET };
    PlacedRisk {
        level: RiskLevel::from_score(risk.likelihood * risk.impact),
        label_at: (risk.likelihood + dx, risk.impact + dy),
        anchor: if risk.likelihood < 2.0 { HPos::Left } else { HPos::Right },
        risk,
    }
}

/// Samples the traffic-light colormap at `t` in `[0, 1]`.
pub fn traffic_light(t: f64) -> RGBColor {
    let t = t.clamp(0.0, 1.0) * (TRAFFIC_LIGHT.len() - 1) as f64;
    let i = (t.floor() as usize).min(TRAFFIC_LIGHT.len() - 2);
    let f = t - i as f64;
    let (a, b) = (TRAFFIC_LIGHT[i], TRAFFIC_LIGHT[i + 1]);
    let channel = |x: f64, y: f64| ((x + (y - x) * f) * 255.0).round() as u8;
    RGBColor(channel(a.0, b.0), channel(a.1, b.1), channel(a.2, b.2))
}

/// Colormap colour for a likelihood×impact score, composited over white.
fn score_color(score: f64) -> RGBColor {
    let (lo, hi) = (AXIS_MIN * AXIS_MIN, AXIS_MAX * AXIS_MAX);
    let RGBColor(r, g, b) = traffic_light((score - lo) / (hi - lo));
    let blend = |c: u8| (c as f64 * BACKGROUND_ALPHA + 255.0 * (1.0 - BACKGROUND_ALPHA)).round() as u8;
    RGBColor(blend(r), blend(g), blend(b))
}

/// Part of `y = intercept - x / 3` inside the plotted square.
pub fn zone_boundary(intercept: f64) -> Option<((f64, f64), (f64, f64))> {
    let y = |x: f64| intercept - x / 3.0;
    let x_at = |y: f64| (intercept - y) * 3.0;
    let x0 = AXIS_MIN.max(x_at(AXIS_MAX));
    let x1 = AXIS_MAX.min(x_at(AXIS_MIN));
    (x0 < x1).then(|| ((x0, y(x0)), (x1, y(x1))))
}

fn level_name(value: f64) -> String {
    match value.round() as i32 {
        1 => "Low",
        2 => "Moderate",
        3 => "High",
        _ => "",
    }
    .to_string()
}

fn render_heat_map(placed: &[PlacedRisk]) -> Result<String> {
    render_svg(WIDTH, HEIGHT, |root| {
        let (plot, bar) = root.split_horizontally(860);

        let mut chart = ChartBuilder::on(&plot)
            .caption(
                "DICOM Risk Heat Map for Pathology",
                ("sans-serif", 22).into_font().style(FontStyle::Bold),
            )
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(90)
            .build_cartesian_2d(
                (AXIS_MIN..AXIS_MAX).with_key_points(vec![1.0, 2.0, 3.0]),
                (AXIS_MIN..AXIS_MAX).with_key_points(vec![1.0, 2.0, 3.0]),
            )
            .map_err(render_error)?;

        let step = (AXIS_MAX - AXIS_MIN) / GRID_CELLS as f64;
        let cells = (0..GRID_CELLS).flat_map(|i| (0..GRID_CELLS).map(move |j| (i, j)));
        chart
            .draw_series(cells.map(|(i, j)| {
                let x = AXIS_MIN + step * i as f64;
                let y = AXIS_MIN + step * j as f64;
                let score = (x + step / 2.0) * (y + step / 2.0);
                Rectangle::new([(x, y), (x + step, y + step)], score_color(score).filled())
            }))
            .map_err(render_error)?;

        chart
            .configure_mesh()
            .x_label_formatter(&|v| level_name(*v))
            .y_label_formatter(&|v| level_name(*v))
            .x_desc("Likelihood")
            .y_desc("Impact")
            .axis_desc_style(("sans-serif", 18).into_font().style(FontStyle::Bold))
            .label_style(("sans-serif", 16))
            .bold_line_style(BLACK.mix(0.25))
            .draw()
            .map_err(render_error)?;

        for intercept in [4.0 / 3.0, 8.0 / 3.0] {
            if let Some((from, to)) = zone_boundary(intercept) {
                let (x0, y0) = chart.backend_coord(&from);
                let (x1, y1) = chart.backend_coord(&to);
                draw_dashed(
                    root,
                    (x0 as f64, y0 as f64),
                    (x1 as f64, y1 as f64),
                    BLACK.mix(0.5),
                    2,
                    8.0,
                    5.0,
                )?;
            }
        }

        let marker = RGBColor(31, 119, 180).mix(0.9);
        chart
            .draw_series(
                placed
                    .iter()
                    .map(|p| Circle::new((p.risk.likelihood, p.risk.impact), 7, marker.filled())),
            )
            .map_err(render_error)?;
        chart
            .draw_series(placed.iter().map(|p| {
                let style = text_style(18.0, true, &p.level.color(), p.anchor, VPos::Center);
                Text::new(p.risk.name.to_string(), p.label_at, style)
            }))
            .map_err(render_error)?;

        draw_colorbar(&bar)
    })
}

fn draw_colorbar(area: &SvgArea<'_>) -> Result<()> {
    let canvas = Canvas::new(area);
    let (bottom, top) = (0.1, 0.9);
    let (lo, hi) = (AXIS_MIN * AXIS_MIN, AXIS_MAX * AXIS_MAX);
    let steps = 120;
    let band = (top - bottom) / steps as f64;

    for i in 0..steps {
        let score = lo + (hi - lo) * (i as f64 + 0.5) / steps as f64;
        let y = bottom + band * i as f64;
        canvas.polygon(
            &[(0.1, y), (0.3, y), (0.3, y + band * 1.05), (0.1, y + band * 1.05)],
            score_color(score).filled(),
        )?;
    }
    canvas.line((0.1, bottom), (0.3, bottom), BLACK.to_rgba(), 1)?;
    canvas.line((0.1, top), (0.3, top), BLACK.to_rgba(), 1)?;
    canvas.line((0.1, bottom), (0.1, top), BLACK.to_rgba(), 1)?;
    canvas.line((0.3, bottom), (0.3, top), BLACK.to_rgba(), 1)?;

    let tick = text_style(15.0, false, &BLACK, HPos::Left, VPos::Center);
    for (score, label) in [(1.0, "Low"), (3.0, "Medium"), (9.0, "High")] {
        let y = bottom + (top - bottom) * (score - lo) / (hi - lo);
        canvas.line((0.3, y), (0.36, y), BLACK.to_rgba(), 1)?;
        canvas.text(0.4, y, label, &tick)?;
    }

    let title = text_style(16.0, true, &BLACK, HPos::Center, VPos::Center)
        .transform(FontTransform::Rotate270);
    canvas.text(0.85, 0.5, "Risk Level (Likelihood × Impact)", &title)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::FigureEngine;
    use crate::utils::test_support::MockStorage;

    #[test]
    fn test_risk_levels() {
        assert_eq!(RiskLevel::from_score(2.0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(2.64), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(6.3), RiskLevel::High);
        assert_eq!(place(RISKS[0].clone()).level, RiskLevel::High);
        assert_eq!(place(RISKS[5].clone()).level, RiskLevel::Medium);
    }

    #[test]
    fn test_label_placement() {
        let left = place(RISKS[1].clone());
        assert_eq!(left.anchor, HPos::Left);
        assert!((left.label_at.0 - 1.28).abs() < 1e-9);
        assert!((left.label_at.1 - 3.02).abs() < 1e-9);

        let right = place(RISKS[2].clone());
        assert_eq!(right.anchor, HPos::Right);
        assert!((right.label_at.0 - 2.92).abs() < 1e-9);
    }

    #[test]
    fn test_colormap_stops() {
        assert_eq!(traffic_light(0.0), RGBColor(41, 168, 69));
        assert_eq!(traffic_light(0.5), RGBColor(252, 219, 94));
        assert_eq!(traffic_light(1.0), RGBColor(214, 48, 41));
    }

    #[test]
    fn test_zone_boundaries_are_clipped() {
        let ((x0, y0), (x1, y1)) = zone_boundary(4.0 / 3.0).unwrap();
        assert!((x0 - 0.5).abs() < 1e-9);
        assert!((y0 - 7.0 / 6.0).abs() < 1e-9);
        assert!((x1 - 2.5).abs() < 1e-9);
        assert!((y1 - 0.5).abs() < 1e-9);

        let ((_, y0), (x1, y1)) = zone_boundary(8.0 / 3.0).unwrap();
        assert!((y0 - 2.5).abs() < 1e-9);
        assert!((x1 - 3.5).abs() < 1e-9);
        assert!((y1 - 1.5).abs() < 1e-9);

        assert!(zone_boundary(0.1).is_none());
    }

    #[test]
    fn test_writes_heat_map() {
        let storage = MockStorage::new();
        let pipeline = RiskHeatMapPipeline::new(storage.clone(), RiskHeatMapOptions::default());

        let outputs = FigureEngine::new(pipeline).run().unwrap();

        assert_eq!(outputs, vec!["figures/risk_heat_map.svg"]);
        let svg = storage.get_text("figures/risk_heat_map.svg").unwrap();
        assert!(svg.contains("DICOM Risk Heat Map for Pathology"));
        assert!(svg.contains("Moderate"));
    }
}
