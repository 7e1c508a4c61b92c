use std::process::ExitCode;
use clap::Parser;
use serde::Serialize;
use gridkit::{AsciiGridReader, Backend, Error, GridHeader, HttpOptions, ReadParams, Result};

#[derive(Parser, Debug)]
#[command(name = "gridkit-info")]
#[command(about = "Print the header and value range of an ESRI or GRASS ASCII grid", long_about = None)]
struct Cli {
    /// Local path or http(s) URL of the grid
    source: String,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Read every N-th row and column
    #[arg(long, default_value_t = 1, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    subsample: usize,
}

#[derive(Serialize)]
struct Report<'a> {
    source: &'a str,
    header: &'a GridHeader,
    bounding_box: (f64, f64, f64, f64),
    subsample: usize,
    width: usize,
    height: usize,
    min: Option<f64>,
    max: Option<f64>,
}

fn report<B: Backend>(mut reader: AsciiGridReader<B>, args: &Cli) -> Result<()> {
    let params = ReadParams::new().with_subsampling(args.subsample, args.subsample);
    let result = reader.read(&params)?;
    let header = reader.header();

    let report = Report {
        source: &args.source,
        header,
        bounding_box: header.bounding_box(),
        subsample: args.subsample,
        width: result.raster.width(),
        height: result.raster.height(),
        min: result.min,
        max: result.max,
    };

    if args.json {
        let text = serde_json::to_string_pretty(&report)
            .map_err(|e| Error::InvalidFormat(e.to_string()))?;
        println!("{}", text);
        return Ok(());
    }

    println!("{}", report.source);
    println!("  Format: {}", header.format.name());
    println!("  Size: {} x {}", header.ncols, header.nrows);
    println!("  Cell Size: {} x {}", header.cellsize_x, header.cellsize_y);
    println!("  NoData: {}", header.nodata_value());
    let (min_x, min_y, max_x, max_y) = report.bounding_box;
    println!("  Bounding Box:");
    println!("    Min: ({}, {})", min_x, min_y);
    println!("    Max: ({}, {})", max_x, max_y);
    println!("  Sampled: {} x {} (every {})", report.width, report.height, report.subsample);
    match (report.min, report.max) {
        (Some(min), Some(max)) => println!("  Range: {} .. {}", min, max),
        _ => println!("  Range: no valid samples"),
    }
    Ok(())
}

fn run(args: Cli) -> Result<()> {
    log::debug!("reading {}", args.source);

    if args.source.starts_with("http://") || args.source.starts_with("https://") {
        report(AsciiGridReader::open_url(&args.source, &HttpOptions::default())?, &args)
    } else {
        report(AsciiGridReader::open(&args.source)?, &args)
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Cli::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("gridkit-info: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["gridkit-info", "dem.asc"]).unwrap();
        assert_eq!(cli.source, "dem.asc");
        assert_eq!(cli.subsample, 1);
        assert!(!cli.json);
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::try_parse_from(["gridkit-info", "--json", "--subsample", "3", "dem.asc"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.subsample, 3);

        assert!(Cli::try_parse_from(["gridkit-info", "--subsample", "0", "dem.asc"]).is_err());
        assert!(Cli::try_parse_from(["gridkit-info"]).is_err());
    }
}
