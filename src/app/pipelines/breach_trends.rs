use crate::adapters::svg_canvas::{
    centered, render_svg, text_style, BoxStyle, Canvas, SvgArea, DARK_GRAY,
};
use crate::core::categorize::{CategoryScheme, SystemCategory};
use crate::core::periods::{month_display, TimePeriod};
use crate::core::{BreachReport, Pipeline, Storage};
use crate::domain::model::{PeriodCounts, DEFAULT_SHEET, HEALTHCARE_PROVIDER};
use crate::utils::error::{render_error, FigureError, Result};
use chrono::NaiveDate;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, VPos};
use std::collections::BTreeMap;

const WIDTH: u32 = 1600;
const HEIGHT: u32 = 1000;
const RECENT_MONTHS: u32 = 12;

#[derive(Debug, Clone)]
pub struct BreachTrendsOptions {
    pub input: String,
    /// Derived from the scheme, period and dates when `None`.
    pub output: Option<String>,
    /// Directory for derived output names.
    pub figures_dir: String,
    pub sheet: String,
    /// `None` keeps every covered-entity type.
    pub entity: Option<String>,
    pub scheme: CategoryScheme,
    pub period: TimePeriod,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    /// Legacy charts only: keep every month instead of the latest twelve.
    pub all_years: bool,
}

impl Default for BreachTrendsOptions {
    fn default() -> Self {
        Self {
            input: "data/breach_report.xlsx".to_string(),
            output: None,
            figures_dir: "figures".to_string(),
            sheet: DEFAULT_SHEET.to_string(),
            entity: Some(HEALTHCARE_PROVIDER.to_string()),
            scheme: CategoryScheme::default(),
            period: TimePeriod::default(),
            start: None,
            end: None,
            all_years: false,
        }
    }
}

impl BreachTrendsOptions {
    pub fn output_path(&self) -> String {
        if let Some(output) = &self.output {
            return output.clone();
        }
        let dir = self.figures_dir.trim_end_matches('/');
        match self.scheme {
            CategoryScheme::Legacy => format!("{}/breach_trends_viz.svg", dir),
            CategoryScheme::Focused => {
                let mut suffix = format!("_{}", self.period);
                if let Some(start) = self.start {
                    suffix.push_str(&format!("_from_{}", start));
                }
                if let Some(end) = self.end {
                    suffix.push_str(&format!("_to_{}", end));
                }
                format!("{}/breach_trends{}.svg", dir, suffix)
            }
        }
    }

    pub fn title(&self) -> String {
        let mut title = match self.scheme {
            CategoryScheme::Legacy => {
                "Monthly Trends of Healthcare Hacking Incidents by Target System".to_string()
            }
            CategoryScheme::Focused => {
                "Trends of Healthcare Hacking Incidents by Target System".to_string()
            }
        };

        let dated = self.scheme == CategoryScheme::Focused
            && (self.start.is_some() || self.end.is_some());
        if dated {
            let mut range = Vec::new();
            if let Some(start) = self.start {
                range.push(format!("From {}", start));
            }
            if let Some(end) = self.end {
                range.push(format!("To {}", end));
            }
            title.push_str(&format!("\n({})", range.join(" ")));
        } else if let Some(entity) = &self.entity {
            title.push_str(&format!("\n({}s Only)", entity));
        }
        title
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendTable {
    pub categories: Vec<SystemCategory>,
    /// One row per period present in the data, in chronological order.
    pub rows: Vec<PeriodCounts>,
}

impl TrendTable {
    pub fn totals(&self) -> Vec<u64> {
        (0..self.categories.len())
            .map(|i| self.rows.iter().map(|r| r.counts[i]).sum())
            .collect()
    }

    pub fn max_count(&self) -> u64 {
        self.rows
            .iter()
            .flat_map(|r| r.counts.iter().copied())
            .max()
            .unwrap_or(0)
    }
}

pub struct BreachTrendsPipeline<S: Storage> {
    storage: S,
    options: BreachTrendsOptions,
}

impl<S: Storage> BreachTrendsPipeline<S> {
    pub fn new(storage: S, options: BreachTrendsOptions) -> Self {
        Self { storage, options }
    }

    fn select(&self, report: BreachReport) -> BreachReport {
        let report = report.by_entity_type(self.options.entity.as_deref());
        match &self.options.entity {
            Some(entity) => tracing::info!("Found {} {} records", report.len(), entity),
            None => tracing::info!("Found {} total records", report.len()),
        }

        match self.options.scheme {
            CategoryScheme::Legacy => {
                if self.options.start.is_some() || self.options.end.is_some() {
                    tracing::warn!("Date bounds are ignored by the legacy chart");
                }
                let hacking = report.hacking_only().dated_only();
                tracing::info!("Found {} hacking incidents", hacking.len());
                if self.options.all_years {
                    hacking
                } else {
                    hacking.recent_months(RECENT_MONTHS)
                }
            }
            CategoryScheme::Focused => {
                let dated = report.by_date_range(self.options.start, self.options.end);
                let hacking = dated.hacking_only();
                tracing::info!("Found {} hacking incidents", hacking.len());
                hacking
            }
        }
    }

    fn period(&self) -> TimePeriod {
        match self.options.scheme {
            CategoryScheme::Legacy => TimePeriod::Month,
            CategoryScheme::Focused => self.options.period,
        }
    }
}

impl<S: Storage> Pipeline for BreachTrendsPipeline<S> {
    type Extracted = BreachReport;
    type Transformed = TrendTable;

    fn name(&self) -> &'static str {
        "breach-trends"
    }

    fn extract(&self) -> Result<BreachReport> {
        BreachReport::load(&self.storage, &self.options.input, &self.options.sheet, &[])
    }

    fn transform(&self, report: BreachReport) -> Result<TrendTable> {
        let selected = self.select(report);
        if selected.is_empty() {
            return Err(FigureError::ProcessingError {
                message: "no hacking incidents match the selected filters".to_string(),
            });
        }
        if let Some((first, last)) = selected.date_span() {
            tracing::info!(
                "Date range in data: {} to {}",
                first.format("%m/%d/%Y"),
                last.format("%m/%d/%Y")
            );
        }
        Ok(bucket(&selected, self.options.scheme, self.period()))
    }

    fn load(&self, table: TrendTable) -> Result<Vec<String>> {
        let output = self.options.output_path();
        tracing::info!("Saving visualization to {}...", output);
        let svg = render_trends(&table, &self.options, self.period())?;
        self.storage.write_file(&output, svg.as_bytes())?;
        Ok(vec![self.storage.display_path(&output)])
    }
}

/// Counts records per period and plotted category. Categories outside the
/// scheme's plotted set are dropped; periods are sorted by label.
pub fn bucket(report: &BreachReport, scheme: CategoryScheme, period: TimePeriod) -> TrendTable {
    let categories = scheme.plotted().to_vec();
    let mut counts: BTreeMap<String, Vec<u64>> = BTreeMap::new();

    for record in &report.records {
        let Some(date) = record.submission_date else {
            continue;
        };
        let category = scheme.categorize(record.location.as_deref());
        let row = counts
            .entry(period.label(date))
            .or_insert_with(|| vec![0; categories.len()]);
        if let Some(i) = categories.iter().position(|c| *c == category) {
            row[i] += 1;
        }
    }

    TrendTable {
        categories,
        rows: counts
            .into_iter()
            .map(|(period, counts)| PeriodCounts { period, counts })
            .collect(),
    }
}

/// Summary box text: total plus share per category, one decimal.
pub fn summary_lines(table: &TrendTable) -> Vec<String> {
    let totals = table.totals();
    let total: u64 = totals.iter().sum();
    let mut lines = vec![
        "Summary Statistics:".to_string(),
        format!("Total Hacking Incidents: {}", total),
    ];
    for (category, count) in table.categories.iter().zip(&totals) {
        let share = if total == 0 {
            0.0
        } else {
            *count as f64 / total as f64 * 100.0
        };
        let label = match category {
            SystemCategory::Other => "Other Systems",
            other => other.label(),
        };
        lines.push(format!(" • {}: {} ({:.1}%)", label, count, share));
    }
    lines
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Marker {
    Circle,
    Square,
    Diamond,
    Triangle,
}

fn series_style(scheme: CategoryScheme, category: SystemCategory) -> (RGBColor, Marker) {
    let blue = RGBColor(31, 119, 180);
    let orange = RGBColor(255, 127, 14);
    let green = RGBColor(44, 160, 44);
    let gray = RGBColor(127, 127, 127);
    match (scheme, category) {
        (_, SystemCategory::NetworkServer) => (blue, Marker::Circle),
        (CategoryScheme::Legacy, SystemCategory::ElectronicMedicalRecord) => (orange, Marker::Square),
        (CategoryScheme::Focused, SystemCategory::Email) => (orange, Marker::Square),
        (CategoryScheme::Focused, SystemCategory::ElectronicMedicalRecord) => (green, Marker::Diamond),
        (CategoryScheme::Legacy, _) => (green, Marker::Triangle),
        (CategoryScheme::Focused, _) => (gray, Marker::Triangle),
    }
}

fn marker_points(marker: Marker, size: i32) -> Vec<(i32, i32)> {
    match marker {
        Marker::Circle => (0..16)
            .map(|i| {
                let t = i as f64 / 16.0 * std::f64::consts::TAU;
                (
                    (size as f64 * t.cos()).round() as i32,
                    (size as f64 * t.sin()).round() as i32,
                )
            })
            .collect(),
        Marker::Square => vec![(-size, -size), (size, -size), (size, size), (-size, size)],
        Marker::Diamond => vec![(0, -size - 2), (size + 2, 0), (0, size + 2), (-size - 2, 0)],
        Marker::Triangle => vec![(0, -size - 2), (size + 1, size), (-size - 1, size)],
    }
}

fn tick_interval(table: &TrendTable, scheme: CategoryScheme, period: TimePeriod) -> usize {
    let n = table.rows.len();
    match (scheme, period) {
        (CategoryScheme::Legacy, _) if n <= 12 => 1,
        (CategoryScheme::Legacy, _) => 3,
        (CategoryScheme::Focused, TimePeriod::Month) => (n / 8).max(1),
        (CategoryScheme::Focused, _) => 1,
    }
}

fn show_point_labels(table: &TrendTable, scheme: CategoryScheme, period: TimePeriod) -> bool {
    scheme == CategoryScheme::Legacy || period != TimePeriod::Month || table.rows.len() < 15
}

fn render_trends(table: &TrendTable, options: &BreachTrendsOptions, period: TimePeriod) -> Result<String> {
    let scheme = options.scheme;
    let title = options.title();
    render_svg(WIDTH, HEIGHT, |root| {
        let (header, body) = root.split_vertically(120);
        Canvas::new(&header).text_block(0.5, 0.5, &title, &centered(30.0, true, &BLACK), 1.3)?;

        let (plot, side) = body.split_horizontally(1180);
        draw_chart(&plot, table, scheme, period)?;
        draw_side_panel(&side, table, scheme)
    })
}

fn draw_chart(area: &SvgArea<'_>, table: &TrendTable, scheme: CategoryScheme, period: TimePeriod) -> Result<()> {
    let n = table.rows.len() as i32;
    let y_top = {
        let max = table.max_count() as i32;
        max + max / 8 + 2
    };
    let labels: Vec<String> = table
        .rows
        .iter()
        .map(|r| match scheme {
            CategoryScheme::Legacy => month_display(&r.period),
            CategoryScheme::Focused => r.period.clone(),
        })
        .collect();
    let interval = tick_interval(table, scheme, period) as i32;
    let x_desc = match scheme {
        CategoryScheme::Legacy => "Month".to_string(),
        CategoryScheme::Focused => format!("Time Period ({})", period.capitalized()),
    };

    let mut chart = ChartBuilder::on(area)
        .margin(20)
        .x_label_area_size(90)
        .y_label_area_size(90)
        .build_cartesian_2d(-1i32..n, 0i32..y_top)
        .map_err(render_error)?;

    let formatter = |x: &i32| {
        if *x >= 0 && *x < n && *x % interval == 0 {
            labels[*x as usize].clone()
        } else {
            String::new()
        }
    };
    chart
        .configure_mesh()
        .x_labels((n + 2) as usize)
        .x_label_formatter(&formatter)
        .x_desc(x_desc)
        .y_desc("Number of Hacking Incidents")
        .axis_desc_style(("sans-serif", 24))
        .label_style(("sans-serif", 18))
        .light_line_style(WHITE.mix(0.0))
        .bold_line_style(BLACK.mix(0.12))
        .draw()
        .map_err(render_error)?;

    let labelled = show_point_labels(table, scheme, period);
    for (i, category) in table.categories.iter().enumerate() {
        let (color, marker) = series_style(scheme, *category);
        let points: Vec<(i32, i32)> = table
            .rows
            .iter()
            .enumerate()
            .map(|(x, r)| (x as i32, r.counts[i] as i32))
            .collect();

        chart
            .draw_series(LineSeries::new(points.clone(), color.stroke_width(3)))
            .map_err(render_error)?;
        chart
            .draw_series(points.iter().map(|&p| {
                EmptyElement::at(p) + Polygon::new(marker_points(marker, 7), color.filled())
            }))
            .map_err(render_error)?;

        // Legacy charts label every series; focused charts skip the catch-all.
        let label_series = scheme == CategoryScheme::Legacy || *category != SystemCategory::Other;
        if labelled && label_series {
            let style = text_style(16.0, true, &color, HPos::Center, VPos::Bottom);
            chart
                .draw_series(points.iter().filter(|p| p.1 > 0).map(|&p| {
                    EmptyElement::at(p) + Text::new(p.1.to_string(), (0, -12), style.clone())
                }))
                .map_err(render_error)?;
        }
    }
    Ok(())
}

fn draw_side_panel(area: &SvgArea<'_>, table: &TrendTable, scheme: CategoryScheme) -> Result<()> {
    let canvas = Canvas::new(area);
    let (_, height) = canvas.size();
    let row = 34.0 / height;

    let legend_h = row * (table.categories.len() as f64 + 1.6);
    let legend_bottom = 0.93 - legend_h;
    canvas.rect(
        0.04,
        legend_bottom,
        0.92,
        legend_h,
        BoxStyle::filled(WHITE, 1.0).with_stroke(DARK_GRAY, 2),
    )?;
    canvas.text(0.5, 0.93 - row * 0.7, "Target Systems", &centered(22.0, false, &BLACK))?;

    let entry = text_style(17.0, false, &BLACK, HPos::Left, VPos::Center);
    for (i, category) in table.categories.iter().enumerate() {
        let (color, marker) = series_style(scheme, *category);
        let y = 0.93 - row * (i as f64 + 1.7);
        canvas.line((0.08, y), (0.22, y), color.to_rgba(), 3)?;
        let center = canvas.px(0.15, y);
        area.draw(&(EmptyElement::at(center) + Polygon::new(marker_points(marker, 6), color.filled())))
            .map_err(render_error)?;
        canvas.text(0.26, y, category.label(), &entry)?;
    }

    let lines = summary_lines(table);
    let summary_h = row * (lines.len() as f64 + 0.8);
    let summary_top = legend_bottom - 0.06;
    canvas.rect(
        0.04,
        summary_top - summary_h,
        0.92,
        summary_h,
        BoxStyle::filled(RGBColor(245, 245, 245), 0.8).with_stroke(RGBColor(211, 211, 211), 1),
    )?;
    let text = text_style(15.0, false, &BLACK, HPos::Left, VPos::Center);
    for (i, line) in lines.iter().enumerate() {
        canvas.text(0.07, summary_top - row * (i as f64 + 0.9), line, &text)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::FigureEngine;
    use crate::utils::test_support::{sample_report, MockStorage, REPORT_HEADER};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn options(scheme: CategoryScheme) -> BreachTrendsOptions {
        BreachTrendsOptions {
            input: "report.csv".to_string(),
            scheme,
            ..Default::default()
        }
    }

    fn run_transform(options: BreachTrendsOptions) -> Result<TrendTable> {
        let storage = MockStorage::new().with_file("report.csv", &sample_report());
        let pipeline = BreachTrendsPipeline::new(storage, options);
        pipeline.transform(pipeline.extract()?)
    }

    #[test]
    fn test_output_paths() {
        let mut opts = options(CategoryScheme::Focused);
        assert_eq!(opts.output_path(), "figures/breach_trends_month.svg");

        opts.period = TimePeriod::Quarter;
        opts.start = Some(date(2023, 1, 1));
        opts.end = Some(date(2023, 12, 31));
        assert_eq!(
            opts.output_path(),
            "figures/breach_trends_quarter_from_2023-01-01_to_2023-12-31.svg"
        );

        assert_eq!(
            options(CategoryScheme::Legacy).output_path(),
            "figures/breach_trends_viz.svg"
        );
    }

    #[test]
    fn test_titles() {
        let mut opts = options(CategoryScheme::Focused);
        assert!(opts.title().ends_with("\n(Healthcare Providers Only)"));

        opts.start = Some(date(2023, 1, 1));
        assert!(opts.title().ends_with("\n(From 2023-01-01)"));

        opts.entity = None;
        opts.start = None;
        assert!(!opts.title().contains('\n'));
        assert!(options(CategoryScheme::Legacy).title().starts_with("Monthly Trends"));
    }

    #[test]
    fn test_focused_by_quarter() {
        let mut opts = options(CategoryScheme::Focused);
        opts.period = TimePeriod::Quarter;
        let table = run_transform(opts).unwrap();

        let periods: Vec<&str> = table.rows.iter().map(|r| r.period.as_str()).collect();
        assert_eq!(periods, vec!["2023-Q1", "2023-Q2", "2023-Q4", "2024-Q1"]);
        // Q1 2023: network server, email, EMR.
        assert_eq!(table.rows[0].counts, vec![1, 1, 1, 0]);
        // "Email, Network Server" counts as a network server.
        assert_eq!(table.rows[1].counts, vec![1, 0, 0, 0]);
        assert_eq!(table.rows[2].counts, vec![0, 0, 0, 1]);
        assert_eq!(table.totals(), vec![3, 1, 1, 1]);
    }

    #[test]
    fn test_legacy_keeps_recent_twelve_months() {
        let table = run_transform(options(CategoryScheme::Legacy)).unwrap();
        // Latest incident is 2024-02-02, so the window starts 2023-03-02.
        let periods: Vec<&str> = table.rows.iter().map(|r| r.period.as_str()).collect();
        assert_eq!(periods, vec!["2023-03", "2023-06", "2023-11", "2024-02"]);
        assert_eq!(table.categories.len(), 3);
        assert_eq!(table.totals(), vec![2, 1, 1]);
    }

    #[test]
    fn test_legacy_all_years() {
        let mut opts = options(CategoryScheme::Legacy);
        opts.all_years = true;
        let table = run_transform(opts).unwrap();
        assert_eq!(table.rows.len(), 6);
        assert_eq!(table.rows[0].period, "2023-01");
    }

    #[test]
    fn test_no_hacking_incidents_is_an_error() {
        let csv = format!(
            "{}\nA,CT,Healthcare Provider,10,01/01/2023,Theft,Laptop\n",
            REPORT_HEADER
        );
        let storage = MockStorage::new().with_file("report.csv", &csv);
        let pipeline = BreachTrendsPipeline::new(storage, options(CategoryScheme::Focused));
        let report = pipeline.extract().unwrap();

        assert!(matches!(
            pipeline.transform(report),
            Err(FigureError::ProcessingError { .. })
        ));
    }

    #[test]
    fn test_summary_lines() {
        let table = TrendTable {
            categories: CategoryScheme::Focused.plotted().to_vec(),
            rows: vec![PeriodCounts {
                period: "2023".to_string(),
                counts: vec![2, 1, 0, 1],
            }],
        };
        let lines = summary_lines(&table);
        assert_eq!(lines[1], "Total Hacking Incidents: 4");
        assert_eq!(lines[2], " • Network Server: 2 (50.0%)");
        assert_eq!(lines[5], " • Other Systems: 1 (25.0%)");
    }

    #[test]
    fn test_engine_writes_chart() {
        let storage = MockStorage::new().with_file("report.csv", &sample_report());
        let mut opts = options(CategoryScheme::Focused);
        opts.entity = None;
        opts.period = TimePeriod::Year;
        let mut engine = FigureEngine::new(BreachTrendsPipeline::new(storage.clone(), opts));

        let outputs = engine.run().unwrap();

        assert_eq!(outputs, vec!["figures/breach_trends_year.svg"]);
        let svg = storage.get_text("figures/breach_trends_year.svg").unwrap();
        assert!(svg.contains("Target Systems"));
        assert!(svg.contains("Total Hacking Incidents: 7"));
    }
}
