mod common;

use clap::Parser;
use common::workspace;
use pathology_figures::app::run_command;
use pathology_figures::utils::validation::Validate;
use pathology_figures::{CliConfig, FigureConfig, FigureError};
use std::fs;

fn cli(args: &[&str]) -> CliConfig {
    CliConfig::try_parse_from(std::iter::once("pathology-figures").chain(args.iter().copied())).unwrap()
}

#[test]
fn test_config_file_redirects_outputs() {
    let (dir, storage) = workspace();
    let config_path = dir.path().join("figures.toml");
    fs::write(
        &config_path,
        "[paths]\ndata = \"data/breach_report.csv\"\nfigures_dir = \"paper/figs\"\n\n[report]\nentity = \"all\"\n",
    )
    .unwrap();
    let config = FigureConfig::load_optional(&config_path).unwrap();
    config.validate().unwrap();

    let command = cli(&["breach-trends", "--period", "year"]).command;
    let outputs = run_command(&command, &config, &storage, false).unwrap();

    assert!(outputs[0].ends_with("paper/figs/breach_trends_year.svg"));
    let svg = fs::read_to_string(dir.path().join("paper/figs/breach_trends_year.svg")).unwrap();
    // Health plans count once the entity filter is off.
    assert!(svg.contains("Total Hacking Incidents: 6"));
}

#[test]
fn test_all_generates_everything() {
    let (dir, storage) = workspace();
    let mut config = FigureConfig::default();
    config.paths.data = "data/breach_report.csv".to_string();

    let outputs = run_command(&cli(&["all"]).command, &config, &storage, false).unwrap();

    assert_eq!(outputs.len(), 16);
    for file in [
        "figures/healthcare_breach_viz.svg",
        "figures/breach_trends_viz.svg",
        "figures/breach_trends_month.svg",
        "figures/risk_heat_map.svg",
        "figures/architecture_comparison.svg",
        "samples/phi_masking_comparison.png",
        "samples/sample_pathology_wsi.dcm",
        "samples/dicom_wsi_structure.svg",
    ] {
        assert!(dir.path().join(file).is_file(), "{} missing", file);
    }
}

#[test]
fn test_invalid_date_flag_fails_before_writing() {
    let (dir, storage) = workspace();
    let mut config = FigureConfig::default();
    config.paths.data = "data/breach_report.csv".to_string();

    let command = cli(&["location-pie", "--start-date", "2024/01/01"]).command;
    let err = run_command(&command, &config, &storage, false).unwrap_err();

    assert!(matches!(err, FigureError::InvalidDate { .. }));
    assert_eq!(err.exit_code(), 2);
    assert!(!dir.path().join("figures").exists());
}
