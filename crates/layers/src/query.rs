use std::fmt;

use foundation::PoiId;
use serde::Deserialize;

/// Raw request parameters as they arrive on the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryParams {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
    #[serde(rename = "layerName")]
    pub layer_name: Option<String>,
    pub lat: Option<String>,
    pub lon: Option<String>,
    pub accuracy: Option<String>,
    pub radius: Option<String>,
    #[serde(rename = "pageKey")]
    pub page_key: Option<String>,
    #[serde(rename = "requestedPoiId")]
    pub requested_poi_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryError {
    MissingField(&'static str),
    InvalidNumber { field: &'static str, value: String },
    LatitudeOutOfRange(f64),
    LongitudeOutOfRange(f64),
    UnknownLayer(String),
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::MissingField(field) => write!(f, "Missing parameter: {field}"),
            QueryError::InvalidNumber { field, value } => {
                write!(f, "Invalid {field} in request: {value}")
            }
            QueryError::LatitudeOutOfRange(lat) => write!(f, "Invalid latitude in request: {lat}"),
            QueryError::LongitudeOutOfRange(lon) => {
                write!(f, "Invalid longitude in request: {lon}")
            }
            QueryError::UnknownLayer(name) => write!(f, "Unknown layer in request: {name}"),
        }
    }
}

impl std::error::Error for QueryError {}

/// A validated layer request.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub session_id: String,
    pub layer_name: String,
    /// Degrees.
    pub lat: f64,
    /// Degrees.
    pub lon: f64,
    /// Meters; `None` means unbounded.
    pub radius: Option<f64>,
    /// Meters added to the radius.
    pub accuracy: f64,
    /// POI forced to the front of the result.
    pub pinned_id: Option<PoiId>,
    /// Only meaningful for the session and layer of an earlier request.
    pub page_key: Option<u32>,
}

impl Query {
    pub fn new(
        session_id: impl Into<String>,
        layer_name: impl Into<String>,
        lat: f64,
        lon: f64,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            layer_name: layer_name.into(),
            lat,
            lon,
            radius: None,
            accuracy: 0.0,
            pinned_id: None,
            page_key: None,
        }
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = (radius > 0.0).then_some(radius);
        self
    }

    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = accuracy;
        self
    }

    pub fn with_pinned(mut self, id: PoiId) -> Self {
        self.pinned_id = Some(id);
        self
    }

    pub fn with_page_key(mut self, page_key: u32) -> Self {
        self.page_key = Some(page_key);
        self
    }

    /// Search distance including accuracy, or `None` when the radius is unset.
    pub fn reach(&self) -> Option<f64> {
        self.radius.map(|r| r + self.accuracy)
    }

    pub fn is_pinned(&self, id: Option<PoiId>) -> bool {
        self.pinned_id.is_some() && self.pinned_id == id
    }

    pub fn validate(&self) -> Result<(), QueryError> {
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(QueryError::LatitudeOutOfRange(self.lat));
        }
        if !(-180.0..=180.0).contains(&self.lon) {
            return Err(QueryError::LongitudeOutOfRange(self.lon));
        }
        Ok(())
    }

    pub fn from_params(params: &QueryParams) -> Result<Self, QueryError> {
        let session_id = required(&params.user_id, "userId")?;
        let layer_name = required(&params.layer_name, "layerName")?;
        let lat = parse_number("lat", &required(&params.lat, "lat")?)?;
        let lon = parse_number("lon", &required(&params.lon, "lon")?)?;

        let mut query = Query::new(session_id, layer_name, lat, lon);
        if let Some(raw) = optional(&params.accuracy) {
            query = query.with_accuracy(parse_number("accuracy", raw)?);
        }
        if let Some(raw) = optional(&params.radius) {
            query = query.with_radius(parse_number("radius", raw)?);
        }
        if let Some(raw) = optional(&params.page_key) {
            let page_key = raw.parse::<u32>().map_err(|_| QueryError::InvalidNumber {
                field: "pageKey",
                value: raw.to_string(),
            })?;
            query = query.with_page_key(page_key);
        }
        query.pinned_id = optional(&params.requested_poi_id)
            .filter(|raw| *raw != "None")
            .and_then(|raw| raw.parse::<PoiId>().ok());

        query.validate()?;
        Ok(query)
    }
}

fn optional(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn required(value: &Option<String>, field: &'static str) -> Result<String, QueryError> {
    optional(value)
        .map(str::to_string)
        .ok_or(QueryError::MissingField(field))
}

fn parse_number(field: &'static str, raw: &str) -> Result<f64, QueryError> {
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| QueryError::InvalidNumber {
            field,
            value: raw.to_string(),
        })
}
