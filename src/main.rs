//! imgdash: command-line front end for the image editing dashboard.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use imgdash::{
    BackgroundMode, CompressSettings, CompressionReport, Config, ConversionFormat, ConvertParams, CropRegion,
    CropSettings, Feature, FontBook, HexColor, IconFormat, Job, Point, Shape,
    SourceImage, WatermarkSettings,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding the log filter.
const LOG_ENV: &str = "IMGDASH_LOG";

#[derive(Parser)]
#[command(name = "imgdash")]
#[command(about = "Convert, compress, watermark, crop and make icons from images")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory the output file is written to
    #[arg(long, short, global = true, default_value = ".")]
    out_dir: PathBuf,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Re-encode an image in another format
    Convert {
        input: PathBuf,
        #[arg(long, short, value_enum, default_value_t = ConversionFormat::Png)]
        format: ConversionFormat,
    },
    /// Compress an image as JPEG
    Compress {
        input: PathBuf,
        /// JPEG quality, 1-100 (defaults to the configured quality)
        #[arg(long, short, value_parser = clap::value_parser!(u8).range(1..=100))]
        quality: Option<u8>,
    },
    /// Draw one or more lines of text over an image
    Watermark(WatermarkArgs),
    /// Crop a rectangle selected on the display canvas
    Crop(CropArgs),
    /// Generate a square icon
    Favicon(FaviconArgs),
    /// Run a JSON job file
    Run {
        input: PathBuf,
        /// Path to the job file
        #[arg(long)]
        job: PathBuf,
    },
}

#[derive(Args)]
struct WatermarkArgs {
    input: PathBuf,
    /// Watermark text; repeat for more lines, stacked downward
    #[arg(long, short, required = true)]
    text: Vec<String>,
    #[arg(long)]
    x: Option<f32>,
    #[arg(long)]
    y: Option<f32>,
    #[arg(long)]
    font_size: Option<f32>,
    #[arg(long)]
    opacity: Option<f32>,
    #[arg(long, value_parser = parse_color)]
    color: Option<HexColor>,
}

#[derive(Args)]
struct CropArgs {
    input: PathBuf,
    #[arg(long, allow_negative_numbers = true)]
    start_x: f32,
    #[arg(long, allow_negative_numbers = true)]
    start_y: f32,
    #[arg(long, allow_negative_numbers = true)]
    end_x: f32,
    #[arg(long, allow_negative_numbers = true)]
    end_y: f32,
}

#[derive(Args)]
struct FaviconArgs {
    input: PathBuf,
    #[arg(long, short)]
    text: Option<String>,
    /// Icon edge length, 1-256
    #[arg(long, short)]
    size: Option<u32>,
    #[arg(long, value_enum)]
    shape: Option<Shape>,
    #[arg(long, value_enum)]
    background: Option<BackgroundMode>,
    #[arg(long, value_parser = parse_color)]
    background_color: Option<HexColor>,
    #[arg(long, value_parser = parse_color)]
    text_color: Option<HexColor>,
    #[arg(long)]
    font: Option<String>,
    #[arg(long)]
    font_size: Option<u32>,
    #[arg(long, short, value_enum)]
    format: Option<IconFormat>,
    /// Output file name (the extension is added when missing)
    #[arg(long)]
    file_name: Option<String>,
}

fn parse_color(input: &str) -> Result<HexColor, imgdash::InvalidHexColor> {
    HexColor::try_from(input.to_owned())
}

impl Commands {
    /// Splits the command into its input file and the job to run on it.
    fn into_job(self, config: &Config) -> anyhow::Result<(PathBuf, Job)> {
        Ok(match self {
            Self::Convert { input, format } => (input, Job::Convert(ConvertParams::new(format))),
            Self::Compress { input, quality } => (
                input,
                Job::Compress(CompressSettings {
                    quality,
                    max_size: None,
                }),
            ),
            Self::Watermark(args) => {
                let style = &config.watermark;
                let font_size = args.font_size.unwrap_or(style.font_size);
                let top = args.y.unwrap_or(style.y);
                let watermarks = args
                    .text
                    .into_iter()
                    .enumerate()
                    .map(|(line, text)| WatermarkSettings {
                        x: args.x,
                        y: Some(top + line as f32 * font_size),
                        font_size: args.font_size,
                        opacity: args.opacity,
                        color: args.color,
                        ..WatermarkSettings::new(text)
                    })
                    .collect();
                (args.input, Job::Watermark { watermarks })
            }
            Self::Crop(args) => {
                let region = CropRegion::new(
                    Point::new(args.start_x, args.start_y),
                    Point::new(args.end_x, args.end_y),
                );
                (
                    args.input,
                    Job::Crop(CropSettings {
                        region,
                        viewport: None,
                    }),
                )
            }
            Self::Favicon(args) => {
                let mut favicon = config.favicon.clone();
                favicon.text = args.text.unwrap_or(favicon.text);
                favicon.size = args.size.unwrap_or(favicon.size);
                favicon.shape = args.shape.unwrap_or(favicon.shape);
                favicon.background_mode = args.background.unwrap_or(favicon.background_mode);
                favicon.background_color = args.background_color.unwrap_or(favicon.background_color);
                favicon.text_color = args.text_color.unwrap_or(favicon.text_color);
                favicon.font = args.font.unwrap_or(favicon.font);
                favicon.font_size = args.font_size.unwrap_or(favicon.font_size);
                favicon.export_format = args.format.unwrap_or(favicon.export_format);
                favicon.file_name = args.file_name.or(favicon.file_name);
                (args.input, Job::Favicon(favicon))
            }
            Self::Run { input, job } => {
                let json = std::fs::read_to_string(&job)
                    .with_context(|| format!("reading job file {}", job.display()))?;
                (input, Job::from_json(&json)?)
            }
        })
    }
}

fn init_tracing(config: &Config, verbose: u8) -> anyhow::Result<()> {
    let level = match verbose {
        0 => config.log_level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to set tracing subscriber: {e}"))
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load(path).with_context(|| format!("loading config {}", path.display())),
        None => Ok(Config::default()),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    init_tracing(&config, cli.verbose)?;

    let (input, job) = cli.command.into_job(&config)?;
    let bytes = std::fs::read(&input).with_context(|| format!("reading {}", input.display()))?;
    let source = SourceImage::decode(&bytes).with_context(|| format!("decoding {}", input.display()))?;

    let fonts = FontBook::system();
    let artifact = job.run(&source, &fonts, &config)?;

    std::fs::create_dir_all(&cli.out_dir)
        .with_context(|| format!("creating {}", cli.out_dir.display()))?;
    let path = artifact.save(&cli.out_dir)?;

    println!("Saved: {}", path.display());
    println!(
        "Format: {} ({}x{})",
        artifact.mime_type(),
        artifact.dimensions.width,
        artifact.dimensions.height
    );
    if job.feature() == Feature::Compression {
        let report = CompressionReport {
            original_bytes: source.byte_len,
            compressed_bytes: artifact.size(),
        };
        println!(
            "Size: {} -> {} ({:.0}%)",
            CompressionReport::kilobytes(report.original_bytes),
            CompressionReport::kilobytes(report.compressed_bytes),
            report.ratio() * 100.0
        );
    } else {
        println!("Size: {}", CompressionReport::kilobytes(artifact.size()));
    }

    Ok(())
}
