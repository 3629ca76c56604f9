// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the witmotion-vibration project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

// Main entry point for the WitMotion vibration analyzer
use anyhow::Result;
use clap::Parser;
use log::{debug, info};
use std::path::PathBuf;

use witmotion_vibration::acquisition::{self, available_devices};
use witmotion_vibration::analysis::{
    ConsoleRenderer, NullRenderer, SpectrumRenderer, VibrationAnalyzer,
};
use witmotion_vibration::config::{self, Config};
use witmotion_vibration::VibrationError;

/// Dominant vibration frequencies from a WitMotion inertial sensor
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file (YAML format)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Serial device of the sensor (e.g. /dev/rfcomm0)
    #[arg(long)]
    serial_device: Option<String>,

    /// Serial line speed in baud
    #[arg(long)]
    baud_rate: Option<u32>,

    /// Sensor output rate in Hz
    #[arg(long)]
    sampling_rate: Option<f64>,

    /// Collection window in seconds
    #[arg(long)]
    duration: Option<f64>,

    /// Number of dominant frequencies reported per axis
    #[arg(long)]
    peak_count: Option<usize>,

    /// Use the simulated sensor instead of the serial device
    #[arg(long)]
    simulate: bool,

    /// Draw each spectrum as a text chart after the analysis
    #[arg(long)]
    plot: bool,

    /// Output file for the analysis report (JSON)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Path to a configuration to validate and exit
    #[arg(long)]
    validate_config: Option<PathBuf>,

    /// Output the configuration schema as JSON and exit
    #[arg(long)]
    show_config_schema: bool,

    /// List the serial ports of this host and exit
    #[arg(long = "list-devices", default_value_t = false)]
    list_devices: bool,

    /// Enable verbose logging (debug level)
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// Disable all logging output
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.quiet {
        log::LevelFilter::Off
    } else if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if args.show_config_schema {
        return config::output_config_schema();
    }

    if args.list_devices {
        let devices = available_devices()?;
        println!("Available serial devices:");
        for device in devices {
            println!("- {}", device);
        }
        return Ok(());
    }

    if let Some(validate_path) = args.validate_config {
        if !validate_path.exists() {
            return Err(anyhow::anyhow!(
                "Configuration file does not exist: {}",
                validate_path.display()
            ));
        }

        Config::from_file(&validate_path)
            .map_err(|err| anyhow::anyhow!("Configuration validation failed: {}", err))?;
        println!("Configuration file is valid: {}", validate_path.display());
        return Ok(());
    }

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from("config.yaml"));
    let mut config = Config::from_file(&config_path)?;

    config.apply_args(
        args.serial_device.clone(),
        args.baud_rate,
        args.sampling_rate,
        args.duration,
        args.peak_count,
        args.simulate,
        args.plot,
        args.output.clone(),
    );
    config.validate()?;
    debug!("Effective configuration: {:?}", config);

    let analyzer = VibrationAnalyzer::from_config(&config.analysis)?;
    let mut source = acquisition::create_sample_source(&config.device, config.analysis.sampling_rate);
    let mut renderer: Box<dyn SpectrumRenderer> = if config.analysis.plot {
        Box::new(ConsoleRenderer::stdout())
    } else {
        Box::new(NullRenderer)
    };

    info!(
        "Collecting data for {} seconds...",
        config.analysis.duration_seconds
    );
    match analyzer.run(source.as_mut(), renderer.as_mut()) {
        Ok(report) => {
            print!("{}", report);
            if let Some(report_file) = &config.output.report_file {
                match report.save_to_file(report_file) {
                    Ok(()) => println!("\nReport saved to {}", report_file),
                    Err(e) => eprintln!("Failed to save report: {:#}", e),
                }
            }
        }
        Err(VibrationError::ConnectionFailure { device, reason }) => {
            eprintln!("Failed to connect to device {}: {}", device, reason);
            println!("Exiting...");
            return Ok(());
        }
        Err(e) => eprintln!("Error during analysis: {}", e),
    }

    println!("\nAnalysis complete.");
    Ok(())
}
