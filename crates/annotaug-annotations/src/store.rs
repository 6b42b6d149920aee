use crate::record::Record;
use crate::xml::{BoxXml, DatasetXml, ImageXml, ImagesXml, PartXml};
use annotaug_core::{BoundingBox, Keypoint, KEYPOINT_COUNT};
use serde::Serialize;
use std::{fs, path::Path};

const XML_DECLARATION: &str = "<?xml version=\"1.0\" ?>";
const INDENT: usize = 3;

/// Errors produced while reading or writing annotation files.
#[derive(thiserror::Error, Debug)]
pub enum AnnotationError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("malformed annotation xml: {0}")]
    Xml(String),
    #[error("image #{index} ({file}): {reason}")]
    Format {
        index: usize,
        file: String,
        reason: String,
    },
}

impl AnnotationError {
    fn format(index: usize, file: Option<&str>, reason: impl Into<String>) -> Self {
        AnnotationError::Format {
            index,
            file: file.unwrap_or("<no file>").to_string(),
            reason: reason.into(),
        }
    }
}

fn parse_number(
    index: usize,
    file: Option<&str>,
    what: &str,
    raw: Option<&String>,
) -> Result<f32, AnnotationError> {
    let raw = raw.ok_or_else(|| AnnotationError::format(index, file, format!("missing {what}")))?;
    raw.trim()
        .parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| AnnotationError::format(index, file, format!("{what} is not a number: {raw:?}")))
}

fn record_from_xml(index: usize, image: &ImageXml) -> Result<Record, AnnotationError> {
    let file_ref = image.file.as_deref();
    let file = match file_ref {
        Some(f) if !f.trim().is_empty() => f.to_string(),
        _ => return Err(AnnotationError::format(index, None, "missing file attribute")),
    };

    let bx = match image.boxes.as_slice() {
        [single] => single,
        [] => return Err(AnnotationError::format(index, file_ref, "missing <box>")),
        many => {
            return Err(AnnotationError::format(
                index,
                file_ref,
                format!("expected exactly one <box>, found {}", many.len()),
            ))
        }
    };

    let top = parse_number(index, file_ref, "box top", bx.top.as_ref())?;
    let left = parse_number(index, file_ref, "box left", bx.left.as_ref())?;
    let width = parse_number(index, file_ref, "box width", bx.width.as_ref())?;
    let height = parse_number(index, file_ref, "box height", bx.height.as_ref())?;
    if width < 0.0 || height < 0.0 {
        return Err(AnnotationError::format(
            index,
            file_ref,
            format!("negative box size {width}x{height}"),
        ));
    }

    if bx.parts.len() != KEYPOINT_COUNT {
        return Err(AnnotationError::format(
            index,
            file_ref,
            format!(
                "expected {KEYPOINT_COUNT} <part> entries, found {}",
                bx.parts.len()
            ),
        ));
    }
    let mut keypoints = [Keypoint::new(0.0, 0.0); KEYPOINT_COUNT];
    for (i, (kp, part)) in keypoints.iter_mut().zip(bx.parts.iter()).enumerate() {
        let x = parse_number(index, file_ref, &format!("part {i} x"), part.x.as_ref())?;
        let y = parse_number(index, file_ref, &format!("part {i} y"), part.y.as_ref())?;
        *kp = Keypoint::new(x, y);
    }

    Ok(Record::new(
        file,
        BoundingBox::from_top_left_size(top, left, width, height),
        keypoints,
    ))
}

#[inline]
fn int_attr(v: i64) -> Option<String> {
    Some(v.to_string())
}

#[inline]
fn rounded(v: f32) -> i64 {
    v.round() as i64
}

fn record_to_xml(record: &Record) -> ImageXml {
    let b = &record.bbox;
    // Round the edges, not the size, so a box clipped to the frame stays in it.
    let (left, top) = (rounded(b.x1), rounded(b.y1));
    let (right, bottom) = (rounded(b.x2), rounded(b.y2));
    ImageXml {
        file: Some(record.file.clone()),
        boxes: vec![BoxXml {
            top: int_attr(top),
            left: int_attr(left),
            width: int_attr(right - left),
            height: int_attr(bottom - top),
            parts: record
                .keypoints
                .iter()
                .enumerate()
                .map(|(i, kp)| PartXml {
                    name: Some(i.to_string()),
                    x: int_attr(rounded(kp.x())),
                    y: int_attr(rounded(kp.y())),
                })
                .collect(),
        }],
    }
}

/// Reads source records and accumulates augmented ones for a single final write.
#[derive(Clone, Debug, Default)]
pub struct AnnotationStore {
    records: Vec<Record>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every record of an annotation file.
    ///
    /// The first malformed record fails the whole load.
    pub fn load(path: impl AsRef<Path>) -> Result<Vec<Record>, AnnotationError> {
        let raw = fs::read_to_string(path)?;
        Self::parse_str(&raw)
    }

    /// Parse annotation XML from memory.
    pub fn parse_str(raw: &str) -> Result<Vec<Record>, AnnotationError> {
        let doc: DatasetXml =
            quick_xml::de::from_str(raw).map_err(|e| AnnotationError::Xml(e.to_string()))?;
        doc.images
            .images
            .iter()
            .enumerate()
            .map(|(index, image)| record_from_xml(index, image))
            .collect()
    }

    pub fn append(&mut self, record: Record) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Render all accumulated records as indented XML.
    pub fn to_xml_string(&self) -> Result<String, AnnotationError> {
        let doc = DatasetXml {
            images: ImagesXml {
                images: self.records.iter().map(record_to_xml).collect(),
            },
        };
        let mut body = String::new();
        let mut ser = quick_xml::se::Serializer::with_root(&mut body, Some("dataset"))
            .map_err(|e| AnnotationError::Xml(e.to_string()))?;
        ser.indent(' ', INDENT);
        doc.serialize(ser)
            .map_err(|e| AnnotationError::Xml(e.to_string()))?;
        Ok(format!("{XML_DECLARATION}\n{body}\n"))
    }

    /// Write all accumulated records to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), AnnotationError> {
        let xml = self.to_xml_string()?;
        fs::write(path.as_ref(), xml)?;
        log::debug!(
            "wrote {} records to {}",
            self.records.len(),
            path.as_ref().display()
        );
        Ok(())
    }
}
