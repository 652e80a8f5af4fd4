use crate::adapters::svg_canvas::{
    centered, draw_arrow_px, render_svg, text_style, thousands, BoxStyle, Canvas, SvgArea,
    DARK_GRAY, GRAY,
};
use crate::core::{BreachRecord, BreachReport, Pipeline, Storage};
use crate::domain::model::{LocationShare, COL_SUBMISSION_DATE, DEFAULT_SHEET, HEALTHCARE_PROVIDER};
use crate::utils::error::{render_error, FigureError, Result};
use chrono::NaiveDate;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, VPos};

const MAX_SLICES: usize = 7;
const OTHER_LOCATIONS: &str = "Other Locations";
const LABEL_THRESHOLD: f64 = 3.0;

const WIDTH: u32 = 1600;
const HEIGHT: u32 = 900;

/// Colour-blind friendly categorical palette.
pub const PALETTE: [RGBColor; 10] = [
    RGBColor(1, 115, 178),
    RGBColor(222, 143, 5),
    RGBColor(2, 158, 115),
    RGBColor(213, 94, 0),
    RGBColor(204, 120, 188),
    RGBColor(202, 145, 97),
    RGBColor(251, 175, 228),
    RGBColor(148, 148, 148),
    RGBColor(236, 225, 51),
    RGBColor(86, 180, 233),
];

#[derive(Debug, Clone)]
pub struct LocationPieOptions {
    pub input: String,
    pub output: String,
    pub sheet: String,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl Default for LocationPieOptions {
    fn default() -> Self {
        Self {
            input: "data/breach_report.xlsx".to_string(),
            output: "figures/healthcare_breach_viz.svg".to_string(),
            sheet: DEFAULT_SHEET.to_string(),
            start: None,
            end: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PieChart {
    pub slices: Vec<LocationShare>,
    /// Share of breaches per slice, rounded to one decimal.
    pub percentages: Vec<f64>,
    pub total_breaches: u64,
    pub total_affected: u64,
}

pub struct LocationPiePipeline<S: Storage> {
    storage: S,
    options: LocationPieOptions,
}

impl<S: Storage> LocationPiePipeline<S> {
    pub fn new(storage: S, options: LocationPieOptions) -> Self {
        Self { storage, options }
    }
}

impl<S: Storage> Pipeline for LocationPiePipeline<S> {
    type Extracted = BreachReport;
    type Transformed = PieChart;

    fn name(&self) -> &'static str {
        "location-pie"
    }

    fn extract(&self) -> Result<BreachReport> {
        BreachReport::load(
            &self.storage,
            &self.options.input,
            &self.options.sheet,
            &[COL_SUBMISSION_DATE],
        )
    }

    fn transform(&self, report: BreachReport) -> Result<PieChart> {
        let (start, end) = (self.options.start, self.options.end);
        let report = if start.is_some() || end.is_some() {
            let filtered = report.by_date_range(start, end);
            tracing::info!("Filtered to {} records in the date range", filtered.len());
            filtered
        } else {
            report
        };

        let providers = report.by_entity_type(Some(HEALTHCARE_PROVIDER));
        tracing::info!("Found {} healthcare provider records", providers.len());

        let slices = collapse_tail(group_by_location(&providers.records), MAX_SLICES);
        if slices.is_empty() {
            return Err(FigureError::ProcessingError {
                message: "no healthcare provider breaches with a location to chart".to_string(),
            });
        }

        Ok(PieChart {
            percentages: percentages(&slices),
            total_breaches: slices.iter().map(|s| s.breaches).sum(),
            total_affected: slices.iter().map(|s| s.affected).sum(),
            slices,
        })
    }

    fn load(&self, chart: PieChart) -> Result<Vec<String>> {
        tracing::info!("Saving visualization to {}...", self.options.output);
        let svg = render_pie(&chart)?;
        self.storage
            .write_file(&self.options.output, svg.as_bytes())?;
        Ok(vec![self.storage.display_path(&self.options.output)])
    }
}

/// Breach count and affected total per location, most breaches first.
/// Records without a location are left out; ties keep first-seen order.
pub fn group_by_location(records: &[BreachRecord]) -> Vec<LocationShare> {
    let mut groups: Vec<LocationShare> = Vec::new();
    for record in records {
        let Some(location) = record.location.as_deref() else {
            continue;
        };
        match groups.iter_mut().find(|g| g.label == location) {
            Some(group) => {
                group.breaches += 1;
                group.affected += record.individuals_affected;
            }
            None => groups.push(LocationShare {
                label: location.to_string(),
                breaches: 1,
                affected: record.individuals_affected,
            }),
        }
    }
    groups.sort_by(|a, b| b.breaches.cmp(&a.breaches));
    groups
}

/// Keeps the first `keep` groups and folds the rest into `Other Locations`.
pub fn collapse_tail(mut groups: Vec<LocationShare>, keep: usize) -> Vec<LocationShare> {
    if groups.len() <= keep {
        return groups;
    }
    let tail = groups.split_off(keep);
    groups.push(LocationShare {
        label: OTHER_LOCATIONS.to_string(),
        breaches: tail.iter().map(|g| g.breaches).sum(),
        affected: tail.iter().map(|g| g.affected).sum(),
    });
    groups
}

pub fn percentages(slices: &[LocationShare]) -> Vec<f64> {
    let total: u64 = slices.iter().map(|s| s.breaches).sum();
    slices
        .iter()
        .map(|s| {
            if total == 0 {
                0.0
            } else {
                (s.breaches as f64 / total as f64 * 1000.0).round() / 10.0
            }
        })
        .collect()
}

pub fn format_affected(count: u64) -> String {
    if count >= 1_000_000 {
        format!("{:.1}M affected", count as f64 / 1_000_000.0)
    } else if count >= 1_000 {
        format!("{:.1}K affected", count as f64 / 1_000.0)
    } else {
        format!("{} affected", thousands(count))
    }
}

fn render_pie(chart: &PieChart) -> Result<String> {
    render_svg(WIDTH, HEIGHT, |area| {
        let canvas = Canvas::new(area);
        let (center_x, center_y) = canvas.px(0.40, 0.48);
        let radius = 0.30 * HEIGHT as f64;
        let total = chart.total_breaches.max(1) as f64;

        // Wedges run counter-clockwise from 12 o'clock.
        let mut angle = 90.0_f64;
        let mut mids = Vec::with_capacity(chart.slices.len());
        for (i, slice) in chart.slices.iter().enumerate() {
            let sweep = slice.breaches as f64 / total * 360.0;
            let mid = angle + sweep / 2.0;
            let explode = radius * if i < 3 { 0.05 } else { 0.02 };
            let (ox, oy) = polar(center_x as f64, center_y as f64, explode, mid);

            let steps = (sweep.ceil() as usize).max(2);
            let mut points = vec![(ox.round() as i32, oy.round() as i32)];
            for step in 0..=steps {
                let theta = angle + sweep * step as f64 / steps as f64;
                let (x, y) = polar(ox, oy, radius, theta);
                points.push((x.round() as i32, y.round() as i32));
            }

            let color = PALETTE[i % PALETTE.len()];
            area.draw(&Polygon::new(points.clone(), color.filled()))
                .map_err(render_error)?;
            area.draw(&PathElement::new(
                [points.as_slice(), &points[..1]].concat(),
                WHITE.stroke_width(2),
            ))
            .map_err(render_error)?;

            mids.push((ox, oy, mid));
            angle += sweep;
        }

        for (i, pct) in chart.percentages.iter().enumerate() {
            if *pct < LABEL_THRESHOLD {
                continue;
            }
            let (ox, oy, mid) = mids[i];
            let (x, y) = polar(ox, oy, radius * 0.7, mid);
            area.draw_text(
                &format!("{}%", pct.trunc() as i64),
                &centered(24.0, true, &WHITE),
                (x.round() as i32, y.round() as i32),
            )
            .map_err(render_error)?;
        }

        draw_callouts(area, chart, (center_x as f64, center_y as f64), radius, &mids)?;
        draw_legend(&canvas, chart)?;

        canvas.text_block(
            0.5,
            0.93,
            "Healthcare Provider Data Breaches:\nLocation Distribution and Impact",
            &centered(34.0, true, &BLACK),
            1.2,
        )?;
        canvas.text(
            0.5,
            0.03,
            &format!(
                "Total: {} breaches affecting {} individuals",
                thousands(chart.total_breaches),
                thousands(chart.total_affected)
            ),
            &centered(24.0, true, &BLACK),
        )
    })
}

/// Affected-count boxes outside the pie, joined to their wedge by an arrow.
fn draw_callouts(
    area: &SvgArea<'_>,
    chart: &PieChart,
    center: (f64, f64),
    radius: f64,
    mids: &[(f64, f64, f64)],
) -> Result<()> {
    for (i, slice) in chart.slices.iter().enumerate() {
        if chart.percentages[i] < LABEL_THRESHOLD
            || slice.label == "Other"
            || slice.label == OTHER_LOCATIONS
        {
            continue;
        }
        let (_, _, mid) = mids[i];
        let distance = 1.3 + i as f64 * 0.05;
        let (unit_x, unit_y) = (mid.to_radians().cos(), mid.to_radians().sin());
        let x = distance * unit_x + 0.1 * ((i % 3) as f64 - 1.0);
        let y = distance * unit_y + 0.15 * ((i % 2) as f64 - 0.5);

        let label = (center.0 + x * radius, center.1 - y * radius);
        let anchor = (center.0 + 0.7 * x * radius, center.1 - 0.7 * y * radius);
        draw_arrow_px(area, anchor, label, GRAY.to_rgba(), 2, 12.0)?;

        let text = format_affected(slice.affected);
        let half_w = text.chars().count() as f64 * 5.5 + 12.0;
        let color = PALETTE[i % PALETTE.len()];
        let top_left = ((label.0 - half_w) as i32, (label.1 - 18.0) as i32);
        let bottom_right = ((label.0 + half_w) as i32, (label.1 + 18.0) as i32);
        area.draw(&Rectangle::new([top_left, bottom_right], WHITE.mix(0.9).filled()))
            .map_err(render_error)?;
        area.draw(&Rectangle::new([top_left, bottom_right], color.stroke_width(2)))
            .map_err(render_error)?;
        area.draw_text(
            &text,
            &centered(20.0, true, &BLACK),
            (label.0.round() as i32, label.1.round() as i32),
        )
        .map_err(render_error)?;
    }
    Ok(())
}

fn draw_legend(canvas: &Canvas<'_, '_>, chart: &PieChart) -> Result<()> {
    let rows = chart.slices.len() as f64;
    let row_h = 0.045;
    let (left, width) = (0.66, 0.32);
    let height = row_h * (rows + 1.0) + 0.03;
    let bottom = 0.30 - height / 2.0;

    canvas.rect(
        left,
        bottom,
        width,
        height,
        BoxStyle::filled(WHITE, 1.0).with_stroke(DARK_GRAY, 2),
    )?;
    canvas.text(
        left + width / 2.0,
        bottom + height - row_h * 0.7,
        "Breach Locations",
        &centered(26.0, false, &BLACK),
    )?;

    let entry = text_style(18.0, false, &BLACK, HPos::Left, VPos::Center);
    for (i, slice) in chart.slices.iter().enumerate() {
        let y = bottom + height - row_h * (i as f64 + 1.7);
        canvas.rect(
            left + 0.01,
            y - 0.012,
            0.015,
            0.024,
            BoxStyle::filled(PALETTE[i % PALETTE.len()], 1.0),
        )?;
        canvas.text(
            left + 0.032,
            y,
            &format!(
                "{} ({} breaches, {:.1}%)",
                slice.label,
                thousands(slice.breaches),
                chart.percentages[i]
            ),
            &entry,
        )?;
    }
    Ok(())
}

/// Point at `distance` from (`cx`, `cy`) towards `degrees`, y growing downwards.
fn polar(cx: f64, cy: f64, distance: f64, degrees: f64) -> (f64, f64) {
    let theta = degrees.to_radians();
    (cx + distance * theta.cos(), cy - distance * theta.sin())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::FigureEngine;
    use crate::utils::test_support::{sample_report, MockStorage};

    fn share(label: &str, breaches: u64, affected: u64) -> LocationShare {
        LocationShare {
            label: label.to_string(),
            breaches,
            affected,
        }
    }

    #[test]
    fn test_collapse_tail_folds_into_other_locations() {
        let groups: Vec<_> = (0..10).map(|i| share(&format!("L{}", i), 10 - i, 100)).collect();
        let collapsed = collapse_tail(groups, MAX_SLICES);

        assert_eq!(collapsed.len(), 8);
        assert_eq!(collapsed[7], share(OTHER_LOCATIONS, 3 + 2 + 1, 300));
    }

    #[test]
    fn test_collapse_tail_keeps_short_lists() {
        let groups = vec![share("Email", 2, 10), share("Laptop", 1, 5)];
        assert_eq!(collapse_tail(groups.clone(), MAX_SLICES), groups);
    }

    #[test]
    fn test_format_affected() {
        assert_eq!(format_affected(1_234_567), "1.2M affected");
        assert_eq!(format_affected(3_400), "3.4K affected");
        assert_eq!(format_affected(512), "512 affected");
    }

    #[test]
    fn test_percentages_round_to_one_decimal() {
        let slices = vec![share("a", 2, 0), share("b", 1, 0)];
        assert_eq!(percentages(&slices), vec![66.7, 33.3]);
    }

    #[test]
    fn test_pipeline_groups_providers_only() {
        let storage = MockStorage::new().with_file("report.csv", &sample_report());
        let options = LocationPieOptions {
            input: "report.csv".to_string(),
            output: "figures/pie.svg".to_string(),
            ..Default::default()
        };
        let pipeline = LocationPiePipeline::new(storage.clone(), options);

        let chart = pipeline.transform(pipeline.extract().unwrap()).unwrap();

        // Nine provider rows, one of them undated but still counted.
        assert_eq!(chart.total_breaches, 9);
        assert_eq!(chart.slices[0], share("Network Server", 3, 1500 + 700 + 65000));

        let outputs = pipeline.load(chart).unwrap();
        assert_eq!(outputs, vec!["figures/pie.svg"]);
        let svg = storage.get_text("figures/pie.svg").unwrap();
        assert!(svg.contains("Total: 9 breaches affecting"));
        assert!(svg.contains("Breach Locations"));
    }

    #[test]
    fn test_date_range_drops_undated_records() {
        let storage = MockStorage::new().with_file("report.csv", &sample_report());
        let options = LocationPieOptions {
            input: "report.csv".to_string(),
            start: NaiveDate::from_ymd_opt(2023, 3, 1),
            end: NaiveDate::from_ymd_opt(2023, 12, 31),
            ..Default::default()
        };
        let mut engine = FigureEngine::new(LocationPiePipeline::new(storage.clone(), options));

        engine.run().unwrap();

        let svg = storage.get_text("figures/healthcare_breach_viz.svg").unwrap();
        assert!(svg.contains("Total: 5 breaches affecting 112,200 individuals"));
    }

    #[test]
    fn test_missing_date_column_is_reported() {
        let storage = MockStorage::new().with_file(
            "report.csv",
            "Name of Covered Entity,Covered Entity Type\nA,Healthcare Provider\n",
        );
        let options = LocationPieOptions {
            input: "report.csv".to_string(),
            ..Default::default()
        };
        let pipeline = LocationPiePipeline::new(storage, options);

        assert!(matches!(
            pipeline.extract(),
            Err(FigureError::MissingColumn { .. })
        ));
    }
}
