use clap::{Parser, ValueEnum};
use log::{error, info, warn};
use std::path::PathBuf;
use std::process::ExitCode;

use qr_label_sheets::{load_records, Compositor, EcLevel, Error, LabelRenderer, LayoutConfig};

//
// cargo run -- --input labels.csv --output_dir sheets
//

/// Generate QR code label sheets from CSV data
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to CSV input file
    #[arg(long, default_value = "labels.csv")]
    input: PathBuf,

    /// Directory to save generated label sheets, created if absent
    #[arg(long = "output_dir", default_value = ".")]
    output_dir: PathBuf,

    /// Width of each label in pixels
    #[arg(long = "label_width", default_value_t = 1400)]
    label_width: u32,

    /// Height of each label in pixels
    #[arg(long = "label_height", default_value_t = 600)]
    label_height: u32,

    /// Number of columns on a label sheet
    #[arg(long, default_value_t = 4)]
    cols: u32,

    /// Number of rows on a label sheet
    #[arg(long, default_value_t = 12)]
    rows: u32,

    /// Side length of the QR code in pixels
    #[arg(long = "qr_size", default_value_t = 500)]
    qr_size: u32,

    /// CSV column containing the label text
    #[arg(long = "label_col", default_value = "label")]
    label_col: String,

    /// CSV column containing the description text
    #[arg(long = "desc_col", default_value = "description")]
    desc_col: String,

    /// TrueType/OpenType font for captions, the embedded stroke font is used otherwise
    #[arg(long)]
    font: Option<PathBuf>,

    /// QR error correction level
    #[arg(long = "ec_level", value_enum, default_value_t = Correction::H)]
    ec_level: Correction,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Correction {
    L,
    M,
    Q,
    H,
}

impl From<Correction> for EcLevel {
    fn from(level: Correction) -> Self {
        match level {
            Correction::L => EcLevel::L,
            Correction::M => EcLevel::M,
            Correction::Q => EcLevel::Q,
            Correction::H => EcLevel::H,
        }
    }
}

impl Args {
    fn layout(&self) -> LayoutConfig {
        let config = LayoutConfig::default()
            .grid(self.rows, self.cols)
            .cell_size(self.label_width, self.label_height)
            .qr_size(self.qr_size)
            .columns(&self.label_col, &self.desc_col)
            .ec_level(self.ec_level.into());
        match &self.font {
            Some(path) => config.font_path(path),
            None => config,
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            use std::io::Write;
            writeln!(buf, "[{}] {}", record.level(), record.args())
        })
        .init();

    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Error> {
    let config = args.layout();
    config.validate()?;

    let records = load_records(
        &args.input,
        config.label_column(),
        config.description_column(),
    )?;
    if records.is_empty() {
        info!("No data found in {}, nothing to do", args.input.display());
        return Ok(());
    }

    std::fs::create_dir_all(&args.output_dir)?;
    info!(
        "Generating labels for {} entries on {} sheets...",
        records.len(),
        config.sheet_count(records.len())
    );

    let compositor = Compositor::new(&config, LabelRenderer::new(&config))?;
    let mut failed = 0;
    for sheet in compositor.sheets(&records) {
        let path = sheet.save(&args.output_dir)?;
        failed += sheet.failed();
        info!("Generated sheet {}: {}", sheet.number(), path.display());
    }
    if failed > 0 {
        warn!("{} labels could not be rendered, see messages above", failed);
    }
    info!("Done!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_layout_defaults() {
        let args = Args::parse_from(["qr-label-sheets"]);
        let config = args.layout();
        assert_eq!(args.input, PathBuf::from("labels.csv"));
        assert_eq!(config.rows(), 12);
        assert_eq!(config.cols(), 4);
        assert_eq!(config.cell_width(), 1400);
        assert_eq!(config.cell_height(), 600);
        assert_eq!(config.get_qr_size(), 500);
        assert_eq!(config.get_ec_level(), EcLevel::H);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn underscore_flags_are_accepted() {
        let args = Args::parse_from([
            "qr-label-sheets",
            "--output_dir",
            "out",
            "--label_col",
            "sku",
            "--desc_col",
            "name",
            "--qr_size",
            "300",
            "--ec_level",
            "q",
        ]);
        let config = args.layout();
        assert_eq!(args.output_dir, PathBuf::from("out"));
        assert_eq!(config.label_column(), "sku");
        assert_eq!(config.description_column(), "name");
        assert_eq!(config.get_qr_size(), 300);
        assert_eq!(config.get_ec_level(), EcLevel::Q);
    }

    #[test]
    fn empty_table_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("labels.csv");
        std::fs::write(&input, "label,description\n").unwrap();
        let output = dir.path().join("sheets");
        let args = Args::parse_from([
            "qr-label-sheets",
            "--input",
            input.to_str().unwrap(),
            "--output_dir",
            output.to_str().unwrap(),
        ]);
        assert!(run(&args).is_ok());
        assert!(!output.exists());
    }

    #[test]
    fn missing_input_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("missing.csv");
        let args = Args::parse_from(["qr-label-sheets", "--input", input.to_str().unwrap()]);
        assert!(matches!(run(&args), Err(Error::Source { .. })));
    }
}
