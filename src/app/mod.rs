pub mod pipelines;

#[cfg(feature = "cli")]
pub use runner::run_command;

#[cfg(feature = "cli")]
mod runner {
    use super::pipelines::architecture::ArchitecturePipeline;
    use super::pipelines::breach_trends::BreachTrendsPipeline;
    use super::pipelines::csv_markdown::CsvMarkdownPipeline;
    use super::pipelines::dicom_metadata::DicomMetadataPipeline;
    use super::pipelines::location_pie::LocationPiePipeline;
    use super::pipelines::phi_overlay::PhiOverlayPipeline;
    use super::pipelines::risk_heat_map::RiskHeatMapPipeline;
    use super::pipelines::sample_dicom::SampleDicomPipeline;
    use crate::config::toml_config::FigureConfig;
    use crate::config::{BreachTrendsArgs, Command, LocationPieArgs, OutputDirArgs, RiskHeatMapArgs, SampleDicomArgs};
    use crate::core::categorize::CategoryScheme;
    use crate::core::engine::FigureEngine;
    use crate::core::{Pipeline, Storage};
    use crate::utils::error::Result;

    fn run_pipeline<P: Pipeline>(pipeline: P, monitor: bool) -> Result<Vec<String>> {
        FigureEngine::new_with_monitoring(pipeline, monitor).run()
    }

    /// Runs one subcommand against `storage` and returns the written paths.
    pub fn run_command<S: Storage + Clone>(
        command: &Command,
        config: &FigureConfig,
        storage: &S,
        monitor: bool,
    ) -> Result<Vec<String>> {
        let storage = storage.clone();
        match command {
            Command::LocationPie(args) => run_pipeline(
                LocationPiePipeline::new(storage, args.resolve(config)?),
                monitor,
            ),
            Command::BreachTrends(args) => run_pipeline(
                BreachTrendsPipeline::new(storage, args.resolve(config)?),
                monitor,
            ),
            Command::RiskHeatMap(args) => run_pipeline(
                RiskHeatMapPipeline::new(storage, args.resolve(config)),
                monitor,
            ),
            Command::Architecture(args) => run_pipeline(
                ArchitecturePipeline::new(storage, args.architecture(config)),
                monitor,
            ),
            Command::CsvToMd(args) => run_pipeline(
                CsvMarkdownPipeline::new(storage, args.resolve(config)),
                monitor,
            ),
            Command::PhiOverlay(args) => run_pipeline(
                PhiOverlayPipeline::new(storage, args.phi_overlay(config)),
                monitor,
            ),
            Command::SampleDicom(args) => run_pipeline(
                SampleDicomPipeline::new(storage, args.resolve(config)),
                monitor,
            ),
            Command::DicomMetadata(args) => run_pipeline(
                DicomMetadataPipeline::new(storage, args.dicom_metadata(config)),
                monitor,
            ),
            Command::All => run_all(config, storage, monitor),
        }
    }

    /// Every generator with configured defaults. The report charts are
    /// skipped when the configured report is missing; `csv-to-md` needs
    /// explicit inputs and never runs here.
    fn run_all<S: Storage + Clone>(config: &FigureConfig, storage: S, monitor: bool) -> Result<Vec<String>> {
        let mut outputs = Vec::new();

        if storage.exists(&config.paths.data) {
            let pie = LocationPieArgs::default().resolve(config)?;
            outputs.extend(run_pipeline(LocationPiePipeline::new(storage.clone(), pie), monitor)?);

            for scheme in [CategoryScheme::Legacy, CategoryScheme::Focused] {
                let trends = BreachTrendsArgs {
                    scheme,
                    ..Default::default()
                }
                .resolve(config)?;
                outputs.extend(run_pipeline(BreachTrendsPipeline::new(storage.clone(), trends), monitor)?);
            }
        } else {
            tracing::warn!(
                "Skipping report charts: {} not found",
                storage.display_path(&config.paths.data)
            );
        }

        let dirs = OutputDirArgs::default();
        outputs.extend(run_pipeline(
            RiskHeatMapPipeline::new(storage.clone(), RiskHeatMapArgs::default().resolve(config)),
            monitor,
        )?);
        outputs.extend(run_pipeline(
            ArchitecturePipeline::new(storage.clone(), dirs.architecture(config)),
            monitor,
        )?);
        outputs.extend(run_pipeline(
            PhiOverlayPipeline::new(storage.clone(), dirs.phi_overlay(config)),
            monitor,
        )?);
        outputs.extend(run_pipeline(
            SampleDicomPipeline::new(storage.clone(), SampleDicomArgs::default().resolve(config)),
            monitor,
        )?);
        outputs.extend(run_pipeline(
            DicomMetadataPipeline::new(storage, dirs.dicom_metadata(config)),
            monitor,
        )?);

        tracing::info!("Generated {} files", outputs.len());
        Ok(outputs)
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::utils::test_support::{sample_report, MockStorage};

        #[test]
        fn test_all_skips_report_charts_without_report() {
            let storage = MockStorage::new();
            let outputs = run_command(&Command::All, &FigureConfig::default(), &storage, false).unwrap();

            assert!(outputs.contains(&"figures/risk_heat_map.svg".to_string()));
            assert!(outputs.contains(&"samples/sample_pathology_wsi.dcm".to_string()));
            assert!(outputs.contains(&"samples/dicom_wsi_structure.svg".to_string()));
            assert!(!outputs.iter().any(|o| o.contains("breach")));
        }

        #[test]
        fn test_all_includes_report_charts() {
            let storage = MockStorage::new().with_file("hhs.csv", &sample_report());
            let mut config = FigureConfig::default();
            config.paths.data = "hhs.csv".to_string();

            let outputs = run_command(&Command::All, &config, &storage, false).unwrap();

            assert_eq!(outputs[0], "figures/healthcare_breach_viz.svg");
            assert_eq!(outputs[1], "figures/breach_trends_viz.svg");
            assert_eq!(outputs[2], "figures/breach_trends_month.svg");
        }
    }
}
