use crate::coerce::{format_bool, parse_bool, parse_int, parse_text};
use crate::components::{Action, Animation, AnimationEvent, Animations};
use crate::entity::DEFAULT_VISIBILITY_RANGE;

/// Layer-wide settings served alongside the hotspots of every page.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerProperties {
    /// 0 - 100.
    pub bleaching_value: i64,
    /// Seconds.
    pub refresh_interval: i64,
    /// Meters.
    pub visibility_range: i64,
    pub area_size: i64,
    pub area_width: i64,
    /// Meters the client moves before asking again.
    pub refresh_distance: i64,
    pub show_menu_button: bool,
    pub full_refresh: bool,
    pub apply_kalman_filter: bool,
    pub is_default_layer: bool,
    pub show_message: Option<String>,
    pub redirection_layer: Option<String>,
    pub redirection_url: Option<String>,
    pub layer_title: Option<String>,
    pub no_pois_message: Option<String>,
    pub actions: Vec<Action>,
    pub animations: Animations,
}

impl Default for LayerProperties {
    fn default() -> Self {
        Self {
            bleaching_value: 0,
            refresh_interval: 300,
            visibility_range: DEFAULT_VISIBILITY_RANGE,
            area_size: 0,
            area_width: 0,
            refresh_distance: 100,
            show_menu_button: true,
            full_refresh: true,
            apply_kalman_filter: true,
            is_default_layer: false,
            show_message: None,
            redirection_layer: None,
            redirection_url: None,
            layer_title: None,
            no_pois_message: None,
            actions: Vec::new(),
            animations: Animations::new(),
        }
    }
}

impl LayerProperties {
    pub const FIELDS: [&'static str; 15] = [
        "bleachingValue",
        "refreshInterval",
        "areaSize",
        "areaWidth",
        "visibilityRange",
        "refreshDistance",
        "showMenuButton",
        "fullRefresh",
        "applyKalmanFilter",
        "isDefaultLayer",
        "showMessage",
        "redirectionLayer",
        "redirectionUrl",
        "layerTitle",
        "noPoisMessage",
    ];

    pub fn set_field(&mut self, name: &str, raw: &str) -> bool {
        let int = |current: i64| parse_int(raw).unwrap_or(current);
        match name {
            "bleachingValue" => self.bleaching_value = int(self.bleaching_value),
            "refreshInterval" => self.refresh_interval = int(self.refresh_interval),
            "areaSize" => self.area_size = int(self.area_size),
            "areaWidth" => self.area_width = int(self.area_width),
            "visibilityRange" => self.visibility_range = int(self.visibility_range),
            "refreshDistance" => self.refresh_distance = int(self.refresh_distance),
            "showMenuButton" => self.show_menu_button = parse_bool(raw),
            "fullRefresh" => self.full_refresh = parse_bool(raw),
            "applyKalmanFilter" => self.apply_kalman_filter = parse_bool(raw),
            "isDefaultLayer" => self.is_default_layer = parse_bool(raw),
            "showMessage" => self.show_message = parse_text(raw),
            "redirectionLayer" => self.redirection_layer = parse_text(raw),
            "redirectionUrl" => self.redirection_url = parse_text(raw),
            "layerTitle" => self.layer_title = parse_text(raw),
            "noPoisMessage" => self.no_pois_message = parse_text(raw),
            _ => return false,
        }
        true
    }

    pub fn field(&self, name: &str) -> Option<String> {
        match name {
            "bleachingValue" => Some(self.bleaching_value.to_string()),
            "refreshInterval" => Some(self.refresh_interval.to_string()),
            "areaSize" => Some(self.area_size.to_string()),
            "areaWidth" => Some(self.area_width.to_string()),
            "visibilityRange" => Some(self.visibility_range.to_string()),
            "refreshDistance" => Some(self.refresh_distance.to_string()),
            "showMenuButton" => Some(format_bool(self.show_menu_button).to_string()),
            "fullRefresh" => Some(format_bool(self.full_refresh).to_string()),
            "applyKalmanFilter" => Some(format_bool(self.apply_kalman_filter).to_string()),
            "isDefaultLayer" => Some(format_bool(self.is_default_layer).to_string()),
            "showMessage" => self.show_message.clone(),
            "redirectionLayer" => self.redirection_layer.clone(),
            "redirectionUrl" => self.redirection_url.clone(),
            "layerTitle" => self.layer_title.clone(),
            "noPoisMessage" => self.no_pois_message.clone(),
            _ => None,
        }
    }

    pub fn push_animation(&mut self, event: AnimationEvent, animation: Animation) {
        self.animations.entry(event).or_default().push(animation);
    }
}
