pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use args::*;

#[cfg(feature = "cli")]
mod args {
    use super::toml_config::{entity_filter, FigureConfig};
    use crate::app::pipelines::architecture::ArchitectureOptions;
    use crate::app::pipelines::breach_trends::BreachTrendsOptions;
    use crate::app::pipelines::csv_markdown::CsvMarkdownOptions;
    use crate::app::pipelines::dicom_metadata::DicomMetadataOptions;
    use crate::app::pipelines::location_pie::LocationPieOptions;
    use crate::app::pipelines::phi_overlay::PhiOverlayOptions;
    use crate::app::pipelines::risk_heat_map::RiskHeatMapOptions;
    use crate::app::pipelines::sample_dicom::SampleDicomOptions;
    use crate::core::categorize::CategoryScheme;
    use crate::core::periods::TimePeriod;
    use crate::utils::error::Result;
    use crate::utils::validation::parse_date_bound;
    use chrono::NaiveDate;
    use clap::{Args, Parser, Subcommand};

    #[derive(Debug, Clone, Parser)]
    #[command(name = "pathology-figures")]
    #[command(about = "Figures and sample files comparing DICOM with a modular format for digital pathology")]
    pub struct CliConfig {
        /// TOML file with shared paths and report settings; skipped if absent.
        #[arg(long, global = true, default_value = "figures.toml")]
        pub config: String,

        #[arg(short, long, global = true, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, global = true, help = "Log CPU and memory use per stage")]
        pub monitor: bool,

        #[arg(long, global = true, help = "Emit logs as JSON lines on stderr")]
        pub log_json: bool,

        #[command(subcommand)]
        pub command: Command,
    }

    #[derive(Debug, Clone, Subcommand)]
    pub enum Command {
        /// Pie chart of breach locations for healthcare providers
        LocationPie(LocationPieArgs),
        /// Line chart of hacking incidents by target system over time
        BreachTrends(BreachTrendsArgs),
        /// Likelihood/impact heat map of DICOM security risks
        RiskHeatMap(RiskHeatMapArgs),
        /// Monolithic and modular architecture diagrams
        Architecture(OutputDirArgs),
        /// Convert CSV files into Markdown tables
        CsvToMd(CsvToMdArgs),
        /// Synthetic slide with a GeoJSON PHI mask overlay
        PhiOverlay(OutputDirArgs),
        /// Synthetic whole-slide DICOM file and preview
        SampleDicom(SampleDicomArgs),
        /// DICOM-style metadata JSON and structure poster
        DicomMetadata(OutputDirArgs),
        /// Run every generator with configured defaults
        All,
    }

    #[derive(Debug, Clone, Default, Args)]
    pub struct ReportArgs {
        /// Breach report (.xlsx, .xls, .ods or .csv)
        #[arg(short, long)]
        pub input: Option<String>,

        #[arg(short, long)]
        pub output: Option<String>,

        /// Worksheet name for workbook inputs
        #[arg(short, long)]
        pub sheet: Option<String>,

        /// Inclusive lower bound, YYYY-MM-DD
        #[arg(long)]
        pub start_date: Option<String>,

        /// Inclusive upper bound, YYYY-MM-DD
        #[arg(long)]
        pub end_date: Option<String>,
    }

    impl ReportArgs {
        fn dates(&self) -> Result<(Option<NaiveDate>, Option<NaiveDate>)> {
            let start = self
                .start_date
                .as_deref()
                .map(|s| parse_date_bound("start", s))
                .transpose()?;
            let end = self
                .end_date
                .as_deref()
                .map(|s| parse_date_bound("end", s))
                .transpose()?;
            Ok((start, end))
        }
    }

    #[derive(Debug, Clone, Default, Args)]
    pub struct LocationPieArgs {
        #[command(flatten)]
        pub report: ReportArgs,
    }

    #[derive(Debug, Clone, Default, Args)]
    pub struct BreachTrendsArgs {
        #[command(flatten)]
        pub report: ReportArgs,

        /// Covered-entity type to keep, or `all`
        #[arg(short, long)]
        pub entity: Option<String>,

        #[arg(long, value_enum, default_value_t = CategoryScheme::Focused)]
        pub scheme: CategoryScheme,

        #[arg(long, value_enum, default_value_t = TimePeriod::Month)]
        pub period: TimePeriod,

        /// Legacy scheme: chart every month instead of the latest twelve
        #[arg(long)]
        pub all_years: bool,
    }

    #[derive(Debug, Clone, Default, Args)]
    pub struct RiskHeatMapArgs {
        #[arg(short, long)]
        pub output: Option<String>,
    }

    #[derive(Debug, Clone, Default, Args)]
    pub struct OutputDirArgs {
        #[arg(short, long, alias = "output")]
        pub output_dir: Option<String>,
    }

    #[derive(Debug, Clone, Args)]
    pub struct CsvToMdArgs {
        #[arg(required = true)]
        pub csv_files: Vec<String>,

        /// Output file; only honoured with a single input
        #[arg(long)]
        pub output: Option<String>,

        /// Comma-separated left/center/right, cycled over the columns
        #[arg(long)]
        pub align: Option<String>,

        #[arg(long)]
        pub output_dir: Option<String>,
    }

    #[derive(Debug, Clone, Default, Args)]
    pub struct SampleDicomArgs {
        #[arg(short, long, alias = "output")]
        pub output_dir: Option<String>,

        /// Embed a synthetic RGB image as pixel data
        #[arg(short = 'p', long)]
        pub with_pixel_data: bool,
    }

    fn in_dir(dir: &str, file: &str) -> String {
        format!("{}/{}", dir.trim_end_matches('/'), file)
    }

    impl LocationPieArgs {
        pub fn resolve(&self, config: &FigureConfig) -> Result<LocationPieOptions> {
            let (start, end) = self.report.dates()?;
            Ok(LocationPieOptions {
                input: self.report.input.clone().unwrap_or_else(|| config.paths.data.clone()),
                output: self
                    .report
                    .output
                    .clone()
                    .unwrap_or_else(|| in_dir(&config.paths.figures_dir, "healthcare_breach_viz.svg")),
                sheet: self.report.sheet.clone().unwrap_or_else(|| config.report.sheet.clone()),
                start,
                end,
            })
        }
    }

    impl BreachTrendsArgs {
        pub fn resolve(&self, config: &FigureConfig) -> Result<BreachTrendsOptions> {
            let (start, end) = self.report.dates()?;
            let entity = match &self.entity {
                Some(entity) => entity_filter(entity),
                None => config.entity_filter(),
            };
            Ok(BreachTrendsOptions {
                input: self.report.input.clone().unwrap_or_else(|| config.paths.data.clone()),
                output: self.report.output.clone(),
                figures_dir: config.paths.figures_dir.clone(),
                sheet: self.report.sheet.clone().unwrap_or_else(|| config.report.sheet.clone()),
                entity,
                scheme: self.scheme,
                period: self.period,
                start,
                end,
                all_years: self.all_years,
            })
        }
    }

    impl RiskHeatMapArgs {
        pub fn resolve(&self, config: &FigureConfig) -> RiskHeatMapOptions {
            RiskHeatMapOptions {
                output: self
                    .output
                    .clone()
                    .unwrap_or_else(|| in_dir(&config.paths.figures_dir, "risk_heat_map.svg")),
            }
        }
    }

    impl OutputDirArgs {
        fn dir_or(&self, default: &str) -> String {
            self.output_dir.clone().unwrap_or_else(|| default.to_string())
        }

        pub fn architecture(&self, config: &FigureConfig) -> ArchitectureOptions {
            ArchitectureOptions {
                output_dir: self.dir_or(&config.paths.figures_dir),
            }
        }

        pub fn phi_overlay(&self, config: &FigureConfig) -> PhiOverlayOptions {
            PhiOverlayOptions {
                output_dir: self.dir_or(&config.paths.samples_dir),
            }
        }

        pub fn dicom_metadata(&self, config: &FigureConfig) -> DicomMetadataOptions {
            DicomMetadataOptions {
                output_dir: self.dir_or(&config.paths.samples_dir),
            }
        }
    }

    impl CsvToMdArgs {
        pub fn resolve(&self, config: &FigureConfig) -> CsvMarkdownOptions {
            CsvMarkdownOptions {
                inputs: self.csv_files.clone(),
                output: self.output.clone(),
                output_dir: self
                    .output_dir
                    .clone()
                    .unwrap_or_else(|| config.paths.tables_dir.clone()),
                align: self.align.clone(),
            }
        }
    }

    impl SampleDicomArgs {
        pub fn resolve(&self, config: &FigureConfig) -> SampleDicomOptions {
            SampleDicomOptions {
                output_dir: self
                    .output_dir
                    .clone()
                    .unwrap_or_else(|| config.paths.samples_dir.clone()),
                with_pixel_data: self.with_pixel_data,
            }
        }
    }

}
