//! Wire format of layer responses.
//!
//! A page is serialized to JSON and then stripped of every optional field whose
//! value equals its documented default. The comparison is deliberately loose
//! (`null`, `false`, `0`, `""` and `[]` all match each other) because existing
//! clients expect exactly that payload.

use serde::Serialize;
use serde_json::{Map, Value, json};

use poi::{Action, Animations, LayerProperties, Poi, RenderObject, SpatialTransform};

use crate::page::ResultPage;

pub const ERROR_CODE_OK: i64 = 0;
pub const ERROR_CODE_DEFAULT: i64 = 20;
pub const ERROR_CODE_NO_POIS: i64 = 21;

pub const OK_MESSAGE: &str = "ok";
pub const DEFAULT_ERROR_MESSAGE: &str = "An error occurred";
pub const NO_POIS_MESSAGE: &str = "No POIs found. Increase range or adjust filters to see POIs";

/// Reported radius is inflated so POIs near the edge do not drop off while the
/// client moves.
pub const RADIUS_MARGIN: f64 = 1.25;

const MICRODEGREES: f64 = 1_000_000.0;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Hotspot<'a> {
    pub id: String,
    pub dimension: u8,
    /// Microdegrees.
    pub lat: i64,
    /// Microdegrees.
    pub lon: i64,
    pub distance: f64,
    pub title: Option<&'a str>,
    pub line1: Option<&'a str>,
    pub line2: Option<&'a str>,
    pub line3: Option<&'a str>,
    pub line4: Option<&'a str>,
    pub attribution: Option<&'a str>,
    #[serde(rename = "imageURL")]
    pub image_url: Option<&'a str>,
    #[serde(rename = "type")]
    pub kind: i64,
    pub visibility_range: i64,
    pub do_not_index: bool,
    pub show_small_biw: bool,
    pub show_biw_on_click: bool,
    pub is_visible: bool,
    pub actions: &'a [Action],
    pub animations: &'a Animations,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<Option<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relative_alt: Option<Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<&'a SpatialTransform>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<&'a RenderObject>,
}

impl<'a> Hotspot<'a> {
    pub fn from_poi(poi: &'a Poi) -> Self {
        let placement = poi.shape.placement();
        Self {
            id: poi.id.map(|id| id.to_string()).unwrap_or_default(),
            dimension: poi.dimension(),
            lat: to_microdegrees(poi.lat),
            lon: to_microdegrees(poi.lon),
            distance: poi.distance.unwrap_or(0.0),
            title: poi.title.as_deref(),
            line1: poi.line1.as_deref(),
            line2: poi.line2.as_deref(),
            line3: poi.line3.as_deref(),
            line4: poi.line4.as_deref(),
            attribution: poi.attribution.as_deref(),
            image_url: poi.image_url.as_deref(),
            kind: poi.kind.unwrap_or(0),
            visibility_range: poi.visibility_range,
            do_not_index: poi.do_not_index,
            show_small_biw: poi.show_small_biw,
            show_biw_on_click: poi.show_biw_on_click,
            is_visible: poi.is_visible,
            actions: &poi.actions,
            animations: &poi.animations,
            alt: placement.map(|p| p.alt),
            relative_alt: placement.map(|p| p.relative_alt),
            transform: placement.map(|p| &p.transform),
            object: placement.map(|p| &p.object),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerResponse<'a> {
    pub layer: &'a str,
    pub error_code: i64,
    pub error_string: &'a str,
    pub more_pages: bool,
    pub next_page_key: String,
    pub radius: i64,
    pub number_of_hotspots: usize,
    pub hotspots: Vec<Hotspot<'a>>,
    pub bleaching_value: i64,
    pub refresh_interval: i64,
    pub visibility_range: i64,
    pub area_size: i64,
    pub area_width: i64,
    pub refresh_distance: i64,
    pub show_menu_button: bool,
    pub full_refresh: bool,
    pub apply_kalman_filter: bool,
    pub is_default_layer: bool,
    pub show_message: Option<&'a str>,
    pub redirection_layer: Option<&'a str>,
    pub redirection_url: Option<&'a str>,
    pub layer_title: Option<&'a str>,
    pub no_pois_message: Option<&'a str>,
    pub actions: &'a [Action],
    pub animations: &'a Animations,
}

impl<'a> LayerResponse<'a> {
    pub fn new(layer: &'a str, page: &'a ResultPage) -> Self {
        let props: &LayerProperties = &page.properties;
        let (error_code, error_string) = if page.hotspots.is_empty() {
            (ERROR_CODE_NO_POIS, NO_POIS_MESSAGE)
        } else {
            (ERROR_CODE_OK, OK_MESSAGE)
        };
        Self {
            layer,
            error_code,
            error_string,
            more_pages: page.more_pages,
            next_page_key: page
                .next_page_key
                .map(|k| k.to_string())
                .unwrap_or_default(),
            radius: (RADIUS_MARGIN * page.radius) as i64,
            number_of_hotspots: page.total,
            hotspots: page.hotspots.iter().map(Hotspot::from_poi).collect(),
            bleaching_value: props.bleaching_value,
            refresh_interval: props.refresh_interval,
            visibility_range: props.visibility_range,
            area_size: props.area_size,
            area_width: props.area_width,
            refresh_distance: props.refresh_distance,
            show_menu_button: props.show_menu_button,
            full_refresh: props.full_refresh,
            apply_kalman_filter: props.apply_kalman_filter,
            is_default_layer: props.is_default_layer,
            show_message: props.show_message.as_deref(),
            redirection_layer: props.redirection_layer.as_deref(),
            redirection_url: props.redirection_url.as_deref(),
            layer_title: props.layer_title.as_deref(),
            no_pois_message: props.no_pois_message.as_deref(),
            actions: &props.actions,
            animations: &props.animations,
        }
    }
}

/// Degrees to integer microdegrees, truncated toward zero.
pub fn to_microdegrees(degrees: f64) -> i64 {
    (degrees * MICRODEGREES) as i64
}

/// Serializes a page and strips its default-valued optional fields.
pub fn shape_page(layer: &str, page: &ResultPage) -> Result<Value, serde_json::Error> {
    let mut value = serde_json::to_value(LayerResponse::new(layer, page))?;
    elide_defaults(&mut value);
    Ok(value)
}

/// Payload for a request that failed before any hotspots were produced.
pub fn error_response(layer: &str, code: i64, message: Option<&str>) -> Value {
    let message = match message {
        Some(m) if !m.is_empty() => m,
        _ if code == ERROR_CODE_NO_POIS => NO_POIS_MESSAGE,
        _ => DEFAULT_ERROR_MESSAGE,
    };
    json!({
        "layer": layer,
        "errorCode": code,
        "errorString": message,
        "hotspots": [],
        "nextPageKey": "",
        "morePages": false,
    })
}

fn poi_defaults() -> [(&'static str, Value); 8] {
    [
        ("alt", Value::Null),
        ("relativeAlt", Value::Null),
        ("timestamp", Value::Null),
        ("doNotIndex", json!(false)),
        ("showSmallBiw", json!(true)),
        ("showBiwOnClick", json!(true)),
        ("isVisible", json!(true)),
        ("visibilityRange", json!(1500)),
    ]
}

fn action_defaults() -> [(&'static str, Value); 9] {
    [
        ("autoTriggerRange", Value::Null),
        ("autoTriggerOnly", Value::Null),
        ("contentType", Value::Null),
        ("method", json!("GET")),
        ("activityType", Value::Null),
        ("params", json!([])),
        ("closeBiw", json!(false)),
        ("showActivity", json!(true)),
        ("activityMessage", Value::Null),
    ]
}

fn animation_defaults() -> [(&'static str, Value); 10] {
    [
        ("delay", Value::Null),
        ("interpolation", Value::Null),
        ("name", Value::Null),
        ("followedBy", Value::Null),
        ("interpolationParam", Value::Null),
        ("persist", json!(false)),
        ("repeat", json!(false)),
        ("from", Value::Null),
        ("to", Value::Null),
        ("axis", json!({ "x": null, "y": null, "z": null })),
    ]
}

fn response_defaults() -> [(&'static str, Value); 16] {
    [
        ("bleachingValue", json!(0)),
        ("refreshInterval", json!(300)),
        ("visibilityRange", json!(1500)),
        ("areaSize", json!(0)),
        ("areaWidth", json!(0)),
        ("refreshDistance", json!(100)),
        ("fullRefresh", json!(true)),
        ("applyKalmanFilter", json!(true)),
        ("isDefaultLayer", json!(false)),
        ("actions", json!([])),
        ("showMessage", Value::Null),
        ("redirectionLayer", Value::Null),
        ("redirectionUrl", Value::Null),
        ("noPoisMessage", Value::Null),
        ("layerTitle", Value::Null),
        ("deletedHotspots", json!([])),
    ]
}

/// Removes default-valued optional fields from a response, its hotspots, and their
/// actions and animations. Applying it twice changes nothing.
pub fn elide_defaults(response: &mut Value) {
    let Some(root) = response.as_object_mut() else {
        return;
    };
    if let Some(Value::Array(hotspots)) = root.get_mut("hotspots") {
        for hotspot in hotspots.iter_mut().filter_map(Value::as_object_mut) {
            strip(hotspot, &poi_defaults());
            elide_nested(hotspot);
        }
    }
    elide_nested(root);
    strip(root, &response_defaults());
}

fn elide_nested(record: &mut Map<String, Value>) {
    if let Some(Value::Array(actions)) = record.get_mut("actions") {
        for action in actions.iter_mut().filter_map(Value::as_object_mut) {
            strip(action, &action_defaults());
        }
    }
    let Some(animations) = record.get_mut("animations") else {
        return;
    };
    if let Some(events) = animations.as_object_mut() {
        for list in events.values_mut() {
            if let Some(list) = list.as_array_mut() {
                for animation in list.iter_mut().filter_map(Value::as_object_mut) {
                    strip(animation, &animation_defaults());
                }
                list.retain(|a| !a.as_object().is_some_and(Map::is_empty));
            }
        }
        events.retain(|_, list| !list.as_array().is_some_and(Vec::is_empty));
    }
    if !truthy(animations) {
        record.remove("animations");
    }
}

fn strip(record: &mut Map<String, Value>, defaults: &[(&str, Value)]) {
    for (field, default) in defaults {
        let matches = record
            .get(*field)
            .map_or(true, |value| loose_eq(value, default));
        if matches {
            record.remove(*field);
        }
    }
}

/// Truthiness in the client protocol's sense: `null`, `false`, `0`, `""`, `"0"`
/// and empty containers are false.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => !(s.is_empty() || s == "0"),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn numeric(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok()
}

/// Loose equality used for default elision.
///
/// Booleans compare by truthiness; `null` equals any falsy value except the string
/// `"0"`; numbers and numeric strings compare numerically; containers compare
/// element by element.
pub fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), other) | (other, Value::Bool(x)) => *x == truthy(other),
        (Value::Null, Value::String(s)) | (Value::String(s), Value::Null) => s.is_empty(),
        (Value::Null, other) | (other, Value::Null) => !truthy(other),
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            match numeric(s) {
                Some(v) => n.as_f64() == Some(v),
                None => n.to_string() == *s,
            }
        }
        (Value::String(x), Value::String(y)) => match (numeric(x), numeric(y)) {
            (Some(u), Some(v)) => u == v,
            _ => x == y,
        },
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(u, v)| loose_eq(u, v))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(k, u)| y.get(k).is_some_and(|v| loose_eq(u, v)))
        }
        (Value::Array(a), Value::Object(o)) | (Value::Object(o), Value::Array(a)) => {
            a.is_empty() && o.is_empty()
        }
        _ => false,
    }
}
