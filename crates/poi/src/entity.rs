use std::fmt;

use foundation::PoiId;

use crate::coerce::{FieldValue, coerce, format_bool};
use crate::components::{Action, Animations, RenderObject, SpatialTransform};

/// Visibility range of a POI when none is configured, meters.
pub const DEFAULT_VISIBILITY_RANGE: i64 = 1500;

/// Extra state carried by 2D and 3D POIs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Placement {
    /// Altitude, meters.
    pub alt: Option<i64>,
    /// Altitude relative to the viewer, meters.
    pub relative_alt: Option<f64>,
    pub transform: SpatialTransform,
    pub object: RenderObject,
}

/// Dimension-dependent part of a POI.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// 1D: a plain point.
    Point,
    /// 2D: a billboard.
    Flat(Placement),
    /// 3D: a model.
    Solid(Placement),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidDimension(pub i64);

impl fmt::Display for InvalidDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid dimension: {}", self.0)
    }
}

impl std::error::Error for InvalidDimension {}

impl Shape {
    pub fn from_dimension(dimension: i64) -> Result<Self, InvalidDimension> {
        match dimension {
            1 => Ok(Shape::Point),
            2 => Ok(Shape::Flat(Placement::default())),
            3 => Ok(Shape::Solid(Placement::default())),
            other => Err(InvalidDimension(other)),
        }
    }

    pub fn dimension(&self) -> u8 {
        match self {
            Shape::Point => 1,
            Shape::Flat(_) => 2,
            Shape::Solid(_) => 3,
        }
    }

    pub fn placement(&self) -> Option<&Placement> {
        match self {
            Shape::Point => None,
            Shape::Flat(p) | Shape::Solid(p) => Some(p),
        }
    }

    pub fn placement_mut(&mut self) -> Option<&mut Placement> {
        match self {
            Shape::Point => None,
            Shape::Flat(p) | Shape::Solid(p) => Some(p),
        }
    }
}

/// Point of interest.
#[derive(Debug, Clone, PartialEq)]
pub struct Poi {
    pub id: Option<PoiId>,
    /// Degrees.
    pub lat: f64,
    /// Degrees.
    pub lon: f64,
    pub title: Option<String>,
    pub line1: Option<String>,
    pub line2: Option<String>,
    pub line3: Option<String>,
    pub line4: Option<String>,
    pub attribution: Option<String>,
    pub image_url: Option<String>,
    /// Client icon selector.
    pub kind: Option<i64>,
    /// Meters.
    pub visibility_range: i64,
    /// Meters from the requester; set per query, never stored.
    pub distance: Option<f64>,
    pub do_not_index: bool,
    pub show_small_biw: bool,
    pub show_biw_on_click: bool,
    pub is_visible: bool,
    pub actions: Vec<Action>,
    pub animations: Animations,
    pub shape: Shape,
}

impl Default for Poi {
    fn default() -> Self {
        Self::with_shape(Shape::Point)
    }
}

impl Poi {
    /// Scalar field names in their canonical order.
    pub const FIELDS: [&'static str; 19] = [
        "id",
        "dimension",
        "lat",
        "lon",
        "title",
        "line1",
        "line2",
        "line3",
        "line4",
        "attribution",
        "imageURL",
        "type",
        "alt",
        "relativeAlt",
        "visibilityRange",
        "doNotIndex",
        "showSmallBiw",
        "showBiwOnClick",
        "isVisible",
    ];

    pub fn with_shape(shape: Shape) -> Self {
        Self {
            id: None,
            lat: 0.0,
            lon: 0.0,
            title: None,
            line1: None,
            line2: None,
            line3: None,
            line4: None,
            attribution: None,
            image_url: None,
            kind: None,
            visibility_range: DEFAULT_VISIBILITY_RANGE,
            distance: None,
            do_not_index: false,
            show_small_biw: true,
            show_biw_on_click: true,
            is_visible: true,
            actions: Vec::new(),
            animations: Animations::new(),
            shape,
        }
    }

    pub fn with_dimension(dimension: i64) -> Result<Self, InvalidDimension> {
        Shape::from_dimension(dimension).map(Self::with_shape)
    }

    pub fn point(id: u64, lat: f64, lon: f64) -> Self {
        Self {
            id: Some(PoiId::new(id)),
            lat,
            lon,
            ..Self::default()
        }
    }

    pub fn dimension(&self) -> u8 {
        self.shape.dimension()
    }

    /// Switches between 1D/2D/3D. Placement survives a 2D <-> 3D change and is
    /// defaulted when coming from 1D.
    pub fn set_dimension(&mut self, dimension: i64) -> Result<(), InvalidDimension> {
        let placement = self.shape.placement().cloned().unwrap_or_default();
        self.shape = match dimension {
            1 => Shape::Point,
            2 => Shape::Flat(placement),
            3 => Shape::Solid(placement),
            other => return Err(InvalidDimension(other)),
        };
        Ok(())
    }

    /// Assigns a scalar field from its raw text, coerced through the field table.
    ///
    /// Returns `Ok(false)` for names that are not POI scalars (sub-structures and
    /// unknown names) and for placement fields on 1D POIs.
    pub fn set_field(&mut self, name: &str, raw: &str) -> Result<bool, InvalidDimension> {
        match (name, coerce(name, raw)) {
            ("id", FieldValue::Text(v)) => {
                self.id = v.and_then(|s| s.parse::<PoiId>().ok());
            }
            ("dimension", FieldValue::Integer(v)) => self.set_dimension(v.unwrap_or(1))?,
            ("lat", FieldValue::Float(v)) => self.lat = v.unwrap_or(0.0),
            ("lon", FieldValue::Float(v)) => self.lon = v.unwrap_or(0.0),
            ("title", FieldValue::Text(v)) => self.title = v,
            ("line1", FieldValue::Text(v)) => self.line1 = v,
            ("line2", FieldValue::Text(v)) => self.line2 = v,
            ("line3", FieldValue::Text(v)) => self.line3 = v,
            ("line4", FieldValue::Text(v)) => self.line4 = v,
            ("attribution", FieldValue::Text(v)) => self.attribution = v,
            ("imageURL", FieldValue::Text(v)) => self.image_url = v,
            ("type", FieldValue::Integer(v)) => self.kind = v,
            // Present but empty reads as 0; only an absent field keeps the default.
            ("visibilityRange", FieldValue::Integer(v)) => self.visibility_range = v.unwrap_or(0),
            ("doNotIndex", FieldValue::Boolean(v)) => self.do_not_index = v,
            ("showSmallBiw", FieldValue::Boolean(v)) => self.show_small_biw = v,
            ("showBiwOnClick", FieldValue::Boolean(v)) => self.show_biw_on_click = v,
            ("isVisible", FieldValue::Boolean(v)) => self.is_visible = v,
            ("alt", FieldValue::Integer(v)) => match self.shape.placement_mut() {
                Some(p) => p.alt = v,
                None => return Ok(false),
            },
            ("relativeAlt", FieldValue::Float(v)) => match self.shape.placement_mut() {
                Some(p) => p.relative_alt = v,
                None => return Ok(false),
            },
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// Raw text of a scalar field, the inverse of [`Poi::set_field`]. Unset values
    /// come back as `None`.
    pub fn field(&self, name: &str) -> Option<String> {
        let placement = self.shape.placement();
        match name {
            "id" => self.id.map(|v| v.to_string()),
            "dimension" => Some(self.dimension().to_string()),
            "lat" => Some(self.lat.to_string()),
            "lon" => Some(self.lon.to_string()),
            "title" => self.title.clone(),
            "line1" => self.line1.clone(),
            "line2" => self.line2.clone(),
            "line3" => self.line3.clone(),
            "line4" => self.line4.clone(),
            "attribution" => self.attribution.clone(),
            "imageURL" => self.image_url.clone(),
            "type" => self.kind.map(|v| v.to_string()),
            "visibilityRange" => Some(self.visibility_range.to_string()),
            "doNotIndex" => Some(format_bool(self.do_not_index).to_string()),
            "showSmallBiw" => Some(format_bool(self.show_small_biw).to_string()),
            "showBiwOnClick" => Some(format_bool(self.show_biw_on_click).to_string()),
            "isVisible" => Some(format_bool(self.is_visible).to_string()),
            "alt" => placement.and_then(|p| p.alt).map(|v| v.to_string()),
            "relativeAlt" => placement.and_then(|p| p.relative_alt).map(|v| v.to_string()),
            _ => None,
        }
    }

    pub fn transform(&self) -> Option<&SpatialTransform> {
        self.shape.placement().map(|p| &p.transform)
    }

    pub fn object(&self) -> Option<&RenderObject> {
        self.shape.placement().map(|p| &p.object)
    }

    pub fn push_animation(&mut self, event: crate::AnimationEvent, animation: crate::Animation) {
        self.animations.entry(event).or_default().push(animation);
    }
}
