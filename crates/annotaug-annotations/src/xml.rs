//! Serde mirror of the annotation file layout.
//!
//! Attributes are kept as raw strings so that missing or malformed values can
//! be reported per field instead of as one opaque parse error.

use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename = "dataset")]
pub(crate) struct DatasetXml {
    #[serde(default)]
    pub images: ImagesXml,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct ImagesXml {
    #[serde(rename = "image", default)]
    pub images: Vec<ImageXml>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct ImageXml {
    #[serde(rename = "@file", default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(rename = "box", default)]
    pub boxes: Vec<BoxXml>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct BoxXml {
    #[serde(rename = "@top", default, skip_serializing_if = "Option::is_none")]
    pub top: Option<String>,
    #[serde(rename = "@left", default, skip_serializing_if = "Option::is_none")]
    pub left: Option<String>,
    #[serde(rename = "@width", default, skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,
    #[serde(rename = "@height", default, skip_serializing_if = "Option::is_none")]
    pub height: Option<String>,
    #[serde(rename = "part", default)]
    pub parts: Vec<PartXml>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct PartXml {
    #[serde(rename = "@name", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "@x", default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    #[serde(rename = "@y", default, skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
}
