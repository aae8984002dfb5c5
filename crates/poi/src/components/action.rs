use serde::Serialize;

use crate::coerce::{format_bool, parse_bool, parse_int, parse_text};

/// Label given to actions that only carry a URI (flat files).
pub const DEFAULT_ACTION_LABEL: &str = "Do something funky";

/// A user-triggerable action, either layer-wide or attached to one POI.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    pub uri: Option<String>,
    pub label: Option<String>,
    pub content_type: Option<String>,
    pub method: String,
    pub activity_type: Option<i64>,
    /// Request parameters the client includes when invoking `uri`.
    pub params: Vec<String>,
    pub close_biw: bool,
    pub show_activity: bool,
    pub activity_message: Option<String>,
    /// Range in meters in which the action fires on its own (POI actions only).
    pub auto_trigger_range: Option<i64>,
    pub auto_trigger_only: bool,
}

impl Default for Action {
    fn default() -> Self {
        Self {
            uri: None,
            label: None,
            content_type: None,
            method: "GET".to_string(),
            activity_type: None,
            params: Vec::new(),
            close_biw: false,
            show_activity: true,
            activity_message: None,
            auto_trigger_range: None,
            auto_trigger_only: false,
        }
    }
}

impl Action {
    pub const FIELDS: [&'static str; 11] = [
        "uri",
        "label",
        "contentType",
        "method",
        "activityType",
        "params",
        "closeBiw",
        "showActivity",
        "activityMessage",
        "autoTriggerRange",
        "autoTriggerOnly",
    ];

    pub fn from_uri(uri: impl Into<String>) -> Self {
        Self {
            uri: Some(uri.into()),
            label: Some(DEFAULT_ACTION_LABEL.to_string()),
            ..Default::default()
        }
    }

    pub fn set_field(&mut self, name: &str, raw: &str) -> bool {
        match name {
            "uri" => self.uri = parse_text(raw),
            "label" => self.label = parse_text(raw),
            "contentType" => self.content_type = parse_text(raw),
            "method" => {
                if let Some(method) = parse_text(raw) {
                    self.method = method;
                }
            }
            "activityType" => self.activity_type = parse_int(raw),
            "params" => {
                self.params = raw
                    .split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            "closeBiw" => self.close_biw = parse_bool(raw),
            "showActivity" => self.show_activity = parse_bool(raw),
            "activityMessage" => self.activity_message = parse_text(raw),
            "autoTriggerRange" => self.auto_trigger_range = parse_int(raw),
            "autoTriggerOnly" => self.auto_trigger_only = parse_bool(raw),
            _ => return false,
        }
        true
    }

    pub fn field(&self, name: &str) -> Option<String> {
        match name {
            "uri" => self.uri.clone(),
            "label" => self.label.clone(),
            "contentType" => self.content_type.clone(),
            "method" => Some(self.method.clone()),
            "activityType" => self.activity_type.map(|v| v.to_string()),
            "params" => Some(self.params.join(",")),
            "closeBiw" => Some(format_bool(self.close_biw).to_string()),
            "showActivity" => Some(format_bool(self.show_activity).to_string()),
            "activityMessage" => self.activity_message.clone(),
            "autoTriggerRange" => self.auto_trigger_range.map(|v| v.to_string()),
            "autoTriggerOnly" => Some(format_bool(self.auto_trigger_only).to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Action, DEFAULT_ACTION_LABEL};

    #[test]
    fn uri_only_action_gets_default_label() {
        let action = Action::from_uri("http://example.org");
        assert_eq!(action.label.as_deref(), Some(DEFAULT_ACTION_LABEL));
        assert_eq!(action.method, "GET");
        assert!(action.show_activity);
    }

    #[test]
    fn params_split_on_commas() {
        let mut action = Action::default();
        action.set_field("params", "lat, lon,,alt");
        assert_eq!(action.params, vec!["lat", "lon", "alt"]);
        assert_eq!(action.field("params").as_deref(), Some("lat,lon,alt"));

        action.set_field("params", "");
        assert!(action.params.is_empty());
    }

    #[test]
    fn empty_method_keeps_get() {
        let mut action = Action::default();
        action.set_field("method", "");
        assert_eq!(action.method, "GET");
        action.set_field("method", "POST");
        assert_eq!(action.method, "POST");
    }
}
