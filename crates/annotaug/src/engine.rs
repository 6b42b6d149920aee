use crate::config::{AugmentConfig, ConfigError};
use crate::naming::{self, OutputBase};
use crate::{io, overlay};
use annotaug_annotations::{AnnotationError, AnnotationStore, Record};
use annotaug_pipeline::{GeometricPipeline, PipelineError, PipelineParams};
use rayon::prelude::*;
use std::fmt;
use std::fs;
use std::path::PathBuf;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Errors produced by a batch augmentation run.
#[derive(thiserror::Error, Debug)]
pub enum AugmentError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Annotation(#[from] AnnotationError),

    #[error("image not found: {}", path.display())]
    MissingImage { path: PathBuf },

    #[error("image {}: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Counters reported at the end of a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub records_seen: usize,
    pub records_skipped: usize,
    pub images_written: usize,
    /// Keypoints outside the frame of their augmented image, summed over all
    /// written images. They are still written with their coordinates.
    pub keypoints_out_of_frame: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} records, {} skipped, {} augmented images written, {} keypoints out of frame",
            self.records_seen,
            self.records_skipped,
            self.images_written,
            self.keypoints_out_of_frame
        )
    }
}

/// Records produced from one source record.
struct RecordOutcome {
    records: Vec<Record>,
    keypoints_out_of_frame: usize,
}

/// Where the engine reads from and writes to, and how.
#[derive(Clone, Debug)]
pub struct EngineOptions {
    pub image_dir: PathBuf,
    pub output_dir: PathBuf,
    pub parallel: bool,
    pub draw_annotations: bool,
    pub default_extension: String,
    pub clip_boxes: bool,
}

impl EngineOptions {
    pub fn from_config(config: &AugmentConfig) -> Self {
        Self {
            image_dir: config.image_dir.clone(),
            output_dir: config.output_dir.clone(),
            parallel: config.parallel,
            draw_annotations: config.draw_annotations,
            default_extension: config.default_extension.clone(),
            clip_boxes: config.clip_boxes,
        }
    }
}

/// Drives the pipeline over every (record, round) pair.
///
/// Round `j` of record `r` uses draw index `r * num_rounds + j`, so a unit's
/// result depends only on the seed and its position in the input. Parallel
/// runs therefore produce the same files and records as sequential ones.
#[derive(Clone, Debug)]
pub struct AugmentationEngine {
    pipeline: GeometricPipeline,
    options: EngineOptions,
}

impl AugmentationEngine {
    pub fn new(params: PipelineParams, options: EngineOptions) -> Result<Self, AugmentError> {
        Ok(Self {
            pipeline: GeometricPipeline::new(params)?,
            options,
        })
    }

    pub fn from_config(config: &AugmentConfig) -> Result<Self, AugmentError> {
        Self::new(config.pipeline.clone(), EngineOptions::from_config(config))
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Augment `records`, writing images below the output directory and
    /// appending one record per written image to `store` in input order.
    ///
    /// Records whose image is missing or undecodable are skipped with a
    /// warning. Write failures abort the run. Output names are assigned up
    /// front with [`naming::assign_output_bases`], so no two records share an
    /// output path.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, records, store), fields(records = records.len()))
    )]
    pub fn run(
        &self,
        records: &[Record],
        num_rounds: u32,
        seed: u64,
        store: &mut AnnotationStore,
    ) -> Result<RunSummary, AugmentError> {
        let bases = naming::assign_output_bases(
            records.iter().map(|r| r.file.as_str()),
            &self.options.default_extension,
        );
        let unit = |(index, (record, base)): (usize, (&Record, &OutputBase))| {
            self.augment_record(index, record, base, num_rounds, seed)
        };
        let outcomes: Vec<Option<RecordOutcome>> = if self.options.parallel {
            records
                .par_iter()
                .zip(bases.par_iter())
                .enumerate()
                .map(unit)
                .collect::<Result<_, _>>()?
        } else {
            records
                .iter()
                .zip(bases.iter())
                .enumerate()
                .map(unit)
                .collect::<Result<_, _>>()?
        };

        let mut summary = RunSummary {
            records_seen: records.len(),
            ..RunSummary::default()
        };
        for outcome in outcomes {
            match outcome {
                Some(outcome) => {
                    summary.images_written += outcome.records.len();
                    summary.keypoints_out_of_frame += outcome.keypoints_out_of_frame;
                    outcome.records.into_iter().for_each(|r| store.append(r));
                }
                None => summary.records_skipped += 1,
            }
        }
        log::info!("{summary}");
        Ok(summary)
    }

    /// All rounds of one record, or `None` when its image cannot be read.
    fn augment_record(
        &self,
        index: usize,
        record: &Record,
        base: &OutputBase,
        num_rounds: u32,
        seed: u64,
    ) -> Result<Option<RecordOutcome>, AugmentError> {
        let source = self.options.image_dir.join(&record.file);
        let image = match io::load_rgb(&source) {
            Ok(image) => image,
            Err(err @ (AugmentError::MissingImage { .. } | AugmentError::Image { .. })) => {
                log::warn!("skipping record #{index} ({}): {err}", record.file);
                return Ok(None);
            }
            Err(err) => return Err(err),
        };
        let annotated = record.to_annotated(image);

        let mut out = RecordOutcome {
            records: Vec::with_capacity(num_rounds as usize),
            keypoints_out_of_frame: 0,
        };
        for round in 0..num_rounds {
            let draw_index = index as u64 * u64::from(num_rounds) + u64::from(round);
            let instance = self.pipeline.build(seed, draw_index);
            let augmented = instance.apply_annotated(&annotated);

            let name = base.augmented(round);
            io::save_rgb(&augmented.image, &self.options.output_dir.join(&name))?;
            if self.options.draw_annotations {
                let preview = overlay::draw_annotations(&augmented);
                io::save_rgb(&preview, &self.options.output_dir.join(base.preview(round)))?;
            }

            let lost = augmented.out_of_frame_keypoints();
            if !lost.is_empty() {
                log::debug!("{}: keypoints {lost:?} left the frame", name.display());
                out.keypoints_out_of_frame += lost.len();
            }
            log::debug!(
                "record #{index} round {round} -> {} ({} stages)",
                name.display(),
                instance.stages().len()
            );
            out.records.push(Record::from_annotated(
                naming::to_reference(&name),
                &augmented,
                self.options.clip_boxes,
            ));
        }
        Ok(Some(out))
    }
}

/// Load the annotations, augment every record and write the output
/// annotation file.
///
/// A malformed annotation file fails before anything is written.
pub fn augment_dataset(config: &AugmentConfig) -> Result<RunSummary, AugmentError> {
    let records = AnnotationStore::load(&config.annotations)?;
    log::info!(
        "loaded {} records from {}",
        records.len(),
        config.annotations.display()
    );
    let engine = AugmentationEngine::from_config(config)?;

    fs::create_dir_all(&config.output_dir)?;
    let mut store = AnnotationStore::new();
    let summary = engine.run(&records, config.num_augment, config.seed, &mut store)?;

    let xml_path = config.output_xml_path();
    if let Some(parent) = xml_path.parent() {
        fs::create_dir_all(parent)?;
    }
    store.save(&xml_path)?;
    log::info!("wrote {} records to {}", store.len(), xml_path.display());
    Ok(summary)
}
