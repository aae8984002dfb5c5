use serde::Serialize;

use crate::coerce::{parse_float, parse_text};

/// Renderable asset attached to a 2D/3D POI.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderObject {
    /// Base URL all other references resolve against.
    #[serde(rename = "baseURL")]
    pub base_url: Option<String>,
    /// Asset name of the full object.
    pub full: Option<String>,
    /// Inner layer shown as part of this POI.
    pub poi_layer_name: Option<String>,
    pub relative_location: Option<String>,
    pub icon: Option<String>,
    /// Edge length of the smallest cube containing the object, meters.
    pub size: Option<f64>,
    #[serde(rename = "triggerImageURL")]
    pub trigger_image_url: Option<String>,
    /// Real-world width of the trigger image, meters.
    pub trigger_image_width: Option<f64>,
}

impl RenderObject {
    pub const FIELDS: [&'static str; 8] = [
        "baseURL",
        "full",
        "poiLayerName",
        "relativeLocation",
        "icon",
        "size",
        "triggerImageURL",
        "triggerImageWidth",
    ];

    pub fn set_field(&mut self, name: &str, raw: &str) -> bool {
        match name {
            "baseURL" => self.base_url = parse_text(raw),
            "full" => self.full = parse_text(raw),
            "poiLayerName" => self.poi_layer_name = parse_text(raw),
            "relativeLocation" => self.relative_location = parse_text(raw),
            "icon" => self.icon = parse_text(raw),
            "size" => self.size = parse_float(raw),
            "triggerImageURL" => self.trigger_image_url = parse_text(raw),
            "triggerImageWidth" => self.trigger_image_width = parse_float(raw),
            _ => return false,
        }
        true
    }

    pub fn field(&self, name: &str) -> Option<String> {
        match name {
            "baseURL" => self.base_url.clone(),
            "full" => self.full.clone(),
            "poiLayerName" => self.poi_layer_name.clone(),
            "relativeLocation" => self.relative_location.clone(),
            "icon" => self.icon.clone(),
            "size" => self.size.map(|v| v.to_string()),
            "triggerImageURL" => self.trigger_image_url.clone(),
            "triggerImageWidth" => self.trigger_image_width.map(|v| v.to_string()),
            _ => None,
        }
    }
}
