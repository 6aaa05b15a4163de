//! Content item contract and ingestion
//!
//! The stored record of a content item (an attraction, a museum piece, ...)
//! is read once when the AR view opens. This module owns the wire shapes of
//! that record and converts them into [`SceneContent`], the only shape the
//! renderer sees:
//!
//! - Positions arrive as `[x, y, z]` or `{ "x", "y", "z" }`; both become `Vec3`
//! - Scales may also be a single number (uniform)
//! - Ids may be strings or numbers
//! - Empty URLs count as missing
//! - Unknown hotspot/primitive kinds are kept as `Unknown` and render nothing

use crate::error::Result;
use glam::{Quat, Vec3};
use placement::ModelTransform;
use serde::{Deserialize, Serialize};

// ============================================================================
// Wire representations
// ============================================================================

/// A 3-vector in either accepted form
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Vec3Repr {
    Array([f32; 3]),
    Object { x: f32, y: f32, z: f32 },
}

impl From<Vec3Repr> for Vec3 {
    fn from(repr: Vec3Repr) -> Self {
        match repr {
            Vec3Repr::Array([x, y, z]) => Vec3::new(x, y, z),
            Vec3Repr::Object { x, y, z } => Vec3::new(x, y, z),
        }
    }
}

/// Scale as a uniform factor or a per-axis vector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScaleRepr {
    Uniform(f32),
    Vector(Vec3Repr),
}

impl From<ScaleRepr> for Vec3 {
    fn from(repr: ScaleRepr) -> Self {
        match repr {
            ScaleRepr::Uniform(s) => Vec3::splat(s),
            ScaleRepr::Vector(v) => v.into(),
        }
    }
}

/// Record id as stored (string or integer)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IdRepr {
    Text(String),
    Number(i64),
}

impl From<IdRepr> for String {
    fn from(id: IdRepr) -> Self {
        match id {
            IdRepr::Text(s) => s,
            IdRepr::Number(n) => n.to_string(),
        }
    }
}

/// Object-form vector used in the produced contract
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3Record {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<Vec3> for Vec3Record {
    fn from(v: Vec3) -> Self {
        Self {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

impl From<Vec3Record> for Vec3 {
    fn from(r: Vec3Record) -> Self {
        Vec3::new(r.x, r.y, r.z)
    }
}

/// `saved_transform` as stored
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformRecord {
    pub position: Vec3Repr,
    pub rotation: Vec3Repr,
    pub scale: ScaleRepr,
}

impl From<TransformRecord> for ModelTransform {
    fn from(r: TransformRecord) -> Self {
        ModelTransform::new(r.position.into(), r.rotation.into(), r.scale.into())
    }
}

impl From<&ModelTransform> for TransformRecord {
    fn from(t: &ModelTransform) -> Self {
        let object = |v: Vec3| Vec3Repr::Object {
            x: v.x,
            y: v.y,
            z: v.z,
        };
        Self {
            position: object(t.position),
            rotation: object(t.rotation),
            scale: ScaleRepr::Vector(object(t.scale)),
        }
    }
}

/// Hotspot as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotspotRecord {
    pub id: IdRepr,
    #[serde(rename = "type")]
    pub kind: String,
    pub position: Vec3Repr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<ScaleRepr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<Vec3Repr>,
}

/// Primitive as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimitiveRecord {
    pub id: IdRepr,
    #[serde(rename = "type")]
    pub kind: String,
    pub position: Vec3Repr,
    #[serde(default = "zero_vec")]
    pub rotation: Vec3Repr,
    #[serde(default = "unit_scale")]
    pub scale: ScaleRepr,
    #[serde(default)]
    pub color: Option<String>,
}

fn zero_vec() -> Vec3Repr {
    Vec3Repr::Array([0.0; 3])
}

fn unit_scale() -> ScaleRepr {
    ScaleRepr::Uniform(1.0)
}

/// A content item record as read at scene mount
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    #[serde(default)]
    pub model_url: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub hotspots: Vec<HotspotRecord>,
    #[serde(default)]
    pub primitives: Vec<PrimitiveRecord>,
    #[serde(default)]
    pub saved_transform: Option<TransformRecord>,
}

// ============================================================================
// Canonical scene content
// ============================================================================

/// Hotspot kind with its kind-specific payload
#[derive(Debug, Clone, PartialEq)]
pub enum HotspotKind {
    Info {
        title: Option<String>,
        description: Option<String>,
    },
    Image {
        url: Option<String>,
        title: Option<String>,
    },
    Video {
        url: Option<String>,
    },
    Audio {
        url: Option<String>,
        title: Option<String>,
    },
    Model {
        url: Option<String>,
    },
    /// A kind this build does not know; rendered as nothing
    Unknown(String),
}

/// A point of interest attached to the content, anchor-relative
#[derive(Debug, Clone, PartialEq)]
pub struct Hotspot {
    pub id: String,
    pub kind: HotspotKind,
    pub position: Vec3,
    pub scale: Vec3,
    /// XYZ Euler radians
    pub rotation: Vec3,
    /// Changed in this session and needs saving
    pub edited: bool,
}

impl Hotspot {
    pub fn rotation_quat(&self) -> Quat {
        Quat::from_euler(glam::EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z)
    }
}

/// Procedural shape kinds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Box,
    Sphere,
    Cylinder,
    Cone,
    Plane,
    /// A kind this build does not know; rendered as nothing
    Unknown(String),
}

impl Shape {
    fn parse(kind: &str) -> Self {
        match kind.to_ascii_lowercase().as_str() {
            "box" | "cube" => Self::Box,
            "sphere" => Self::Sphere,
            "cylinder" => Self::Cylinder,
            "cone" => Self::Cone,
            "plane" => Self::Plane,
            _ => Self::Unknown(kind.to_string()),
        }
    }
}

/// A procedural shape, anchor-relative
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    pub id: String,
    pub shape: Shape,
    pub position: Vec3,
    /// XYZ Euler radians
    pub rotation: Vec3,
    pub scale: Vec3,
    /// Linear RGBA
    pub color: [f32; 4],
}

impl Primitive {
    pub fn rotation_quat(&self) -> Quat {
        Quat::from_euler(glam::EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z)
    }
}

/// What stands in for the main content item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrimaryVisual {
    Model { url: String },
    Billboard { image_url: String },
    Placeholder,
}

/// Normalized content of one item
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SceneContent {
    pub item_id: String,
    pub model_url: Option<String>,
    pub image_url: Option<String>,
    pub hotspots: Vec<Hotspot>,
    pub primitives: Vec<Primitive>,
    pub saved_transform: Option<ModelTransform>,
}

/// Default color for primitives without one
pub const DEFAULT_PRIMITIVE_COLOR: [f32; 4] = [0.53, 0.81, 0.92, 1.0];

impl SceneContent {
    /// Parse and normalize a JSON record
    pub fn from_json(item_id: impl Into<String>, json: &str) -> Result<Self> {
        let record: ContentRecord = serde_json::from_str(json)?;
        Ok(Self::from_record(item_id, record))
    }

    /// Normalize a record. This is the only place wire shapes are handled.
    pub fn from_record(item_id: impl Into<String>, record: ContentRecord) -> Self {
        let item_id = item_id.into();

        let hotspots = record
            .hotspots
            .into_iter()
            .map(normalize_hotspot)
            .collect();
        let primitives = record
            .primitives
            .into_iter()
            .map(normalize_primitive)
            .collect();

        let saved_transform = record
            .saved_transform
            .map(ModelTransform::from)
            .and_then(|t| match t.validate() {
                Ok(()) => Some(t),
                Err(err) => {
                    tracing::warn!(item = %item_id, error = %err, "Ignoring invalid saved transform");
                    None
                }
            });

        Self {
            model_url: non_empty(record.model_url),
            image_url: non_empty(record.image_url),
            hotspots,
            primitives,
            saved_transform,
            item_id,
        }
    }

    /// Primary visual: model, else billboard, else placeholder.
    ///
    /// `model_failed` is set once the model asset could not be loaded.
    pub fn primary_visual(&self, model_failed: bool) -> PrimaryVisual {
        match (&self.model_url, &self.image_url) {
            (Some(url), _) if !model_failed => PrimaryVisual::Model { url: url.clone() },
            (_, Some(image_url)) => PrimaryVisual::Billboard {
                image_url: image_url.clone(),
            },
            _ => PrimaryVisual::Placeholder,
        }
    }

    /// Editor update of a hotspot's placement; returns false for unknown ids
    pub fn update_hotspot(
        &mut self,
        id: &str,
        position: Vec3,
        scale: Option<Vec3>,
        rotation: Option<Vec3>,
    ) -> bool {
        let Some(hotspot) = self.hotspots.iter_mut().find(|h| h.id == id) else {
            return false;
        };
        hotspot.position = position;
        if let Some(scale) = scale {
            hotspot.scale = scale;
        }
        if let Some(rotation) = rotation {
            hotspot.rotation = rotation;
        }
        hotspot.edited = true;
        true
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn normalize_hotspot(record: HotspotRecord) -> Hotspot {
    let url = non_empty(record.content_url);
    let title = non_empty(record.title);
    let kind = match record.kind.to_ascii_lowercase().as_str() {
        "info" => HotspotKind::Info {
            title,
            description: non_empty(record.description),
        },
        "image" => HotspotKind::Image { url, title },
        "video" => HotspotKind::Video { url },
        "audio" => HotspotKind::Audio { url, title },
        "3d_model" | "3d-model" | "model" => HotspotKind::Model { url },
        _ => {
            tracing::debug!(kind = %record.kind, "Unknown hotspot kind");
            HotspotKind::Unknown(record.kind)
        }
    };

    Hotspot {
        id: record.id.into(),
        kind,
        position: record.position.into(),
        scale: record.scale.map_or(Vec3::ONE, Vec3::from),
        rotation: record.rotation.map_or(Vec3::ZERO, Vec3::from),
        edited: false,
    }
}

fn normalize_primitive(record: PrimitiveRecord) -> Primitive {
    Primitive {
        id: record.id.into(),
        shape: Shape::parse(&record.kind),
        position: record.position.into(),
        rotation: record.rotation.into(),
        scale: record.scale.into(),
        color: record
            .color
            .as_deref()
            .and_then(parse_hex_color)
            .unwrap_or(DEFAULT_PRIMITIVE_COLOR),
    }
}

/// Parse `#rgb`, `#rrggbb` or `#rrggbbaa` into RGBA in [0, 1]
pub fn parse_hex_color(value: &str) -> Option<[f32; 4]> {
    let hex = value.trim().strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok().map(|v| f32::from(v) / 255.0);
    match hex.len() {
        3 => {
            let mut out = [1.0; 4];
            for (i, c) in hex.chars().enumerate() {
                out[i] = channel(&format!("{c}{c}"))?;
            }
            Some(out)
        }
        6 | 8 => {
            let mut out = [1.0; 4];
            for i in 0..hex.len() / 2 {
                out[i] = channel(&hex[i * 2..i * 2 + 2])?;
            }
            Some(out)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_forms_normalize_identically() {
        let array: Vec3Repr = serde_json::from_str("[1.5, -2, 0.25]").unwrap();
        let object: Vec3Repr = serde_json::from_str(r#"{"x": 1.5, "y": -2, "z": 0.25}"#).unwrap();
        assert_eq!(Vec3::from(array), Vec3::from(object));
        assert_eq!(Vec3::from(array), Vec3::new(1.5, -2.0, 0.25));
    }

    #[test]
    fn test_scale_forms() {
        let uniform: ScaleRepr = serde_json::from_str("2").unwrap();
        let vector: ScaleRepr = serde_json::from_str("[2, 2, 2]").unwrap();
        assert_eq!(Vec3::from(uniform), Vec3::from(vector));
    }

    #[test]
    fn test_primary_visual_selection() {
        let mut content = SceneContent {
            model_url: Some("models/tower.glb".into()),
            image_url: Some("img/tower.jpg".into()),
            ..Default::default()
        };
        assert_eq!(
            content.primary_visual(false),
            PrimaryVisual::Model {
                url: "models/tower.glb".into()
            }
        );
        assert_eq!(
            content.primary_visual(true),
            PrimaryVisual::Billboard {
                image_url: "img/tower.jpg".into()
            }
        );

        content.image_url = None;
        assert_eq!(content.primary_visual(true), PrimaryVisual::Placeholder);
        content.model_url = None;
        assert_eq!(content.primary_visual(false), PrimaryVisual::Placeholder);
    }

    #[test]
    fn test_empty_urls_count_as_missing() {
        let content = SceneContent::from_json("x", r#"{"model_url": "", "image_url": "  "}"#).unwrap();
        assert_eq!(content.primary_visual(false), PrimaryVisual::Placeholder);
    }

    #[test]
    fn test_unknown_kinds_are_kept() {
        let content = SceneContent::from_json(
            "x",
            r#"{
                "hotspots": [{"id": 7, "type": "hologram", "position": [0, 0, 0]}],
                "primitives": [{"id": "p", "type": "torus", "position": {"x": 0, "y": 0, "z": 0}}]
            }"#,
        )
        .unwrap();
        assert_eq!(content.hotspots[0].id, "7");
        assert_eq!(
            content.hotspots[0].kind,
            HotspotKind::Unknown("hologram".into())
        );
        assert_eq!(content.primitives[0].shape, Shape::Unknown("torus".into()));
    }

    #[test]
    fn test_invalid_saved_transform_is_dropped() {
        let content = SceneContent::from_json(
            "x",
            r#"{"saved_transform": {
                "position": {"x": 0, "y": 0, "z": 0},
                "rotation": {"x": 0, "y": 0, "z": 0},
                "scale": {"x": 0, "y": 1, "z": 1}
            }}"#,
        )
        .unwrap();
        assert!(content.saved_transform.is_none());
    }

    #[test]
    fn test_hex_colors() {
        assert_eq!(parse_hex_color("#ff0000"), Some([1.0, 0.0, 0.0, 1.0]));
        assert_eq!(parse_hex_color("#fff"), Some([1.0, 1.0, 1.0, 1.0]));
        assert_eq!(parse_hex_color("#00000080").map(|c| c[3]), Some(128.0 / 255.0));
        assert_eq!(parse_hex_color("red"), None);
        assert_eq!(parse_hex_color("#12345"), None);
    }

    #[test]
    fn test_update_hotspot_marks_edited() {
        let mut content = SceneContent::from_json(
            "x",
            r#"{"hotspots": [{"id": "a", "type": "info", "position": [0, 1, 0], "title": "Gate"}]}"#,
        )
        .unwrap();

        assert!(content.update_hotspot("a", Vec3::new(0.0, 2.0, 0.0), Some(Vec3::splat(0.5)), None));
        assert!(!content.update_hotspot("missing", Vec3::ZERO, None, None));

        let hotspot = &content.hotspots[0];
        assert!(hotspot.edited);
        assert_eq!(hotspot.position, Vec3::new(0.0, 2.0, 0.0));
        assert_eq!(hotspot.scale, Vec3::splat(0.5));
    }
}
