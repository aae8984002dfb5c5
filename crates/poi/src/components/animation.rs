use std::collections::BTreeMap;

use serde::Serialize;

use crate::coerce::{format_bool, parse_bool, parse_float, parse_text};

/// Client event an animation is bound to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AnimationEvent {
    OnCreate,
    OnFollow,
    OnFocus,
    InFocus,
    OnClick,
}

impl AnimationEvent {
    pub const ALL: [AnimationEvent; 5] = [
        AnimationEvent::OnCreate,
        AnimationEvent::OnFollow,
        AnimationEvent::OnFocus,
        AnimationEvent::InFocus,
        AnimationEvent::OnClick,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AnimationEvent::OnCreate => "onCreate",
            AnimationEvent::OnFollow => "onFollow",
            AnimationEvent::OnFocus => "onFocus",
            AnimationEvent::InFocus => "inFocus",
            AnimationEvent::OnClick => "onClick",
        }
    }

    /// Events named anywhere in an `events` attribute such as `"onCreate,onClick"`.
    pub fn parse_list(events: &str) -> Vec<AnimationEvent> {
        Self::ALL
            .into_iter()
            .filter(|e| events.contains(e.as_str()))
            .collect()
    }
}

/// Animations keyed by the event that starts them.
pub type Animations = BTreeMap<AnimationEvent, Vec<Animation>>;

/// Rotation/translation axis; all components unset means "no axis".
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize)]
pub struct Axis {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
}

impl Axis {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            z: Some(z),
        }
    }

    /// Parses `"x,y,z"`. Anything but exactly three components yields an unset axis.
    pub fn parse(raw: &str) -> Self {
        let parts: Vec<&str> = raw.split(',').collect();
        if parts.len() != 3 {
            return Self::default();
        }
        let c = |s: &str| parse_float(s).unwrap_or(0.0);
        Self::new(c(parts[0]), c(parts[1]), c(parts[2]))
    }

    pub fn to_field(&self) -> String {
        match (self.x, self.y, self.z) {
            (Some(x), Some(y), Some(z)) => format!("{x},{y},{z}"),
            _ => String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Animation {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Seconds.
    pub length: Option<f64>,
    /// Seconds before the animation starts.
    pub delay: Option<f64>,
    pub interpolation: Option<String>,
    pub interpolation_param: Option<f64>,
    /// Keep the end state once finished.
    pub persist: bool,
    pub repeat: bool,
    pub from: Option<f64>,
    pub to: Option<f64>,
    pub followed_by: Option<String>,
    pub axis: Axis,
}

impl Animation {
    pub const FIELDS: [&'static str; 12] = [
        "name",
        "type",
        "length",
        "delay",
        "interpolation",
        "interpolationParam",
        "persist",
        "repeat",
        "from",
        "to",
        "followedBy",
        "axis",
    ];

    pub fn set_field(&mut self, name: &str, raw: &str) -> bool {
        match name {
            "name" => self.name = parse_text(raw),
            "type" => self.kind = parse_text(raw),
            "length" => self.length = parse_float(raw),
            "delay" => self.delay = parse_float(raw),
            "interpolation" => self.interpolation = parse_text(raw),
            "interpolationParam" => self.interpolation_param = parse_float(raw),
            "persist" => self.persist = parse_bool(raw),
            "repeat" => self.repeat = parse_bool(raw),
            "from" => self.from = parse_float(raw),
            "to" => self.to = parse_float(raw),
            "followedBy" => self.followed_by = parse_text(raw),
            "axis" => self.axis = Axis::parse(raw),
            _ => return false,
        }
        true
    }

    pub fn field(&self, name: &str) -> Option<String> {
        match name {
            "name" => self.name.clone(),
            "type" => self.kind.clone(),
            "length" => self.length.map(|v| v.to_string()),
            "delay" => self.delay.map(|v| v.to_string()),
            "interpolation" => self.interpolation.clone(),
            "interpolationParam" => self.interpolation_param.map(|v| v.to_string()),
            "persist" => Some(format_bool(self.persist).to_string()),
            "repeat" => Some(format_bool(self.repeat).to_string()),
            "from" => self.from.map(|v| v.to_string()),
            "to" => self.to.map(|v| v.to_string()),
            "followedBy" => self.followed_by.clone(),
            "axis" => Some(self.axis.to_field()),
            _ => None,
        }
    }
}
