use serde::Serialize;

use crate::coerce::{parse_bool, parse_float};

/// Placement of a 2D/3D object relative to its anchor POI.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct SpatialTransform {
    /// Object keeps facing the viewer.
    pub rel: bool,
    /// Rotation around the vertical axis, degrees.
    pub angle: f64,
    pub scale: f64,
}

impl Default for SpatialTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl SpatialTransform {
    pub const FIELDS: [&'static str; 3] = ["rel", "angle", "scale"];

    pub fn identity() -> Self {
        Self {
            rel: false,
            angle: 0.0,
            scale: 1.0,
        }
    }

    /// Applies a named sub-field. Returns `false` for names that do not belong here.
    pub fn set_field(&mut self, name: &str, raw: &str) -> bool {
        match name {
            "rel" => self.rel = parse_bool(raw),
            "angle" => self.angle = parse_float(raw).unwrap_or(0.0),
            "scale" => self.scale = parse_float(raw).unwrap_or(1.0),
            _ => return false,
        }
        true
    }

    pub fn field(&self, name: &str) -> Option<String> {
        match name {
            "rel" => Some(crate::coerce::format_bool(self.rel).to_string()),
            "angle" => Some(self.angle.to_string()),
            "scale" => Some(self.scale.to_string()),
            _ => None,
        }
    }
}
