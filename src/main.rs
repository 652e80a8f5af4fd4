use clap::Parser;
use pathology_figures::app::run_command;
use pathology_figures::utils::{logger, validation::Validate};
use pathology_figures::{CliConfig, FigureConfig, FigureError, LocalStorage};

fn fail(e: &FigureError) -> ! {
    tracing::error!(
        "❌ Generation failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
    std::process::exit(e.exit_code().max(1));
}

fn main() {
    let cli = CliConfig::parse();

    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting pathology-figures");
    tracing::debug!("CLI config: {:?}", cli);

    let config = match FigureConfig::load_optional(&cli.config) {
        Ok(config) => config,
        Err(e) => fail(&e),
    };
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        fail(&e);
    }

    if cli.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    match run_command(&cli.command, &config, &LocalStorage::default(), cli.monitor) {
        Ok(outputs) => {
            for output in &outputs {
                println!("📁 {}", output);
            }
            println!("✅ Done: {} file(s) written", outputs.len());
        }
        Err(e) => fail(&e),
    }
}
