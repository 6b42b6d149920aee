use annotaug::{augment_dataset, AugmentConfig};
use clap::Parser;
use log::LevelFilter;
use std::path::PathBuf;
use std::process::ExitCode;

#[cfg(feature = "tracing")]
use annotaug::core::init_tracing;

/// Augment a box + keypoint annotated image dataset.
#[derive(Parser, Debug)]
#[command(name = "annotaug", version, about)]
struct Args {
    /// JSON config file; command line flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed of the augmentation stream [default: 234]
    #[arg(long)]
    seed: Option<u64>,

    /// Augmented copies per source image [default: 1]
    #[arg(long = "num-augment")]
    num_augment: Option<u32>,

    /// Directory the annotation file paths are relative to [default: in]
    #[arg(long = "image-path")]
    image_path: Option<PathBuf>,

    /// Input annotation file [default: output_imglab.xml]
    #[arg(long)]
    annotations: Option<PathBuf>,

    /// Output directory for augmented images [default: out]
    #[arg(long = "data-out")]
    data_out: Option<PathBuf>,

    /// Output annotation file [default: <data-out>/output.xml]
    #[arg(long = "output-xml")]
    output_xml: Option<PathBuf>,

    /// Process records on all cores.
    #[arg(long)]
    parallel: bool,

    /// Also write a preview with the box and keypoints drawn.
    #[arg(long = "draw-annotations")]
    draw_annotations: bool,

    /// off, error, warn, info, debug or trace.
    #[arg(long = "log-level", default_value = "info", value_parser = parse_level)]
    log_level: LevelFilter,
}

fn parse_level(raw: &str) -> Result<LevelFilter, String> {
    raw.parse::<LevelFilter>()
        .map_err(|_| format!("unknown log level {raw:?}"))
}

impl Args {
    fn into_config(self) -> Result<AugmentConfig, annotaug::ConfigError> {
        let mut cfg = match &self.config {
            Some(path) => AugmentConfig::load_json(path)?,
            None => AugmentConfig::default(),
        };
        if let Some(seed) = self.seed {
            cfg.seed = seed;
        }
        if let Some(n) = self.num_augment {
            cfg.num_augment = n;
        }
        if let Some(dir) = self.image_path {
            cfg.image_dir = dir;
        }
        if let Some(path) = self.annotations {
            cfg.annotations = path;
        }
        if let Some(dir) = self.data_out {
            cfg.output_dir = dir;
        }
        if self.output_xml.is_some() {
            cfg.output_xml = self.output_xml;
        }
        cfg.parallel |= self.parallel;
        cfg.draw_annotations |= self.draw_annotations;
        Ok(cfg)
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    #[cfg(feature = "tracing")]
    init_tracing(false);
    #[cfg(not(feature = "tracing"))]
    if let Err(err) = annotaug::core::init_with_level(args.log_level) {
        eprintln!("failed to install logger: {err}");
    }

    let config = match args.into_config() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: invalid config: {err}");
            return ExitCode::FAILURE;
        }
    };

    match augment_dataset(&config) {
        Ok(summary) => {
            println!("{summary}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
