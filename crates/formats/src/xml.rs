//! XML layer documents.
//!
//! ```xml
//! <layer>
//!   <refreshInterval>60</refreshInterval>
//!   <action><uri>..</uri><label>..</label></action>
//!   <animation events="onCreate,onClick"><type>rotate</type></animation>
//!   <pois>
//!     <poi><id>1</id><lat>48.158</lat><lon>11.5787</lon>..</poi>
//!   </pois>
//! </layer>
//! ```
//!
//! Older documents with a bare `<pois>` root are read as a layer with default
//! properties.

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use poi::{
    Action, Animation, AnimationEvent, Animations, LayerProperties, Poi, RenderObject,
    SpatialTransform, parse_int,
};

use crate::error::FormatError;

/// A decoded layer file: layer-wide properties plus its POIs in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerDocument {
    pub properties: LayerProperties,
    pub pois: Vec<Poi>,
}

/// Minimal element tree; text content is kept raw and untrimmed.
#[derive(Debug, Clone, Default)]
struct XmlNode {
    name: String,
    attrs: Vec<(String, String)>,
    text: String,
    children: Vec<XmlNode>,
}

impl XmlNode {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name == name)
    }
}

fn xml_err(err: impl std::fmt::Display) -> FormatError {
    FormatError::Xml(err.to_string())
}

fn parse_tree(xml: &str) -> Result<XmlNode, FormatError> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root: Option<XmlNode> = None;

    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(ref e) => stack.push(open_node(e)?),
            Event::Empty(ref e) => {
                let node = open_node(e)?;
                attach(&mut stack, &mut root, node)?;
            }
            Event::End(_) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| FormatError::Xml("unbalanced end tag".to_string()))?;
                attach(&mut stack, &mut root, node)?;
            }
            Event::Text(ref e) => {
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&e.unescape().map_err(xml_err)?);
                }
            }
            Event::CData(e) => {
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(FormatError::Xml("unexpected end of document".to_string()));
    }
    root.ok_or(FormatError::Empty)
}

fn open_node(e: &BytesStart<'_>) -> Result<XmlNode, FormatError> {
    let mut node = XmlNode {
        name: String::from_utf8_lossy(e.local_name().as_ref()).to_string(),
        ..XmlNode::default()
    };
    for attr in e.attributes() {
        let attr = attr.map_err(xml_err)?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).to_string();
        let value = attr.unescape_value().map_err(xml_err)?.to_string();
        node.attrs.push((key, value));
    }
    Ok(node)
}

fn attach(
    stack: &mut [XmlNode],
    root: &mut Option<XmlNode>,
    node: XmlNode,
) -> Result<(), FormatError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None if root.is_none() => *root = Some(node),
        None => return Err(FormatError::Xml("multiple root elements".to_string())),
    }
    Ok(())
}

pub fn decode_layer(xml: &str) -> Result<LayerDocument, FormatError> {
    if xml.trim().is_empty() {
        return Err(FormatError::Empty);
    }
    let root = parse_tree(xml)?;
    let mut doc = LayerDocument::default();

    let pois_node = match root.name.as_str() {
        "layer" => {
            decode_properties(&root, &mut doc.properties);
            root.child("pois")
        }
        "pois" => Some(&root),
        other => {
            return Err(FormatError::Corrupt(format!(
                "unexpected root element <{other}>"
            )));
        }
    };

    if let Some(pois) = pois_node {
        for node in pois.children.iter().filter(|c| c.name == "poi") {
            doc.pois.push(decode_poi(node)?);
        }
    }
    Ok(doc)
}

fn decode_properties(layer: &XmlNode, props: &mut LayerProperties) {
    for child in &layer.children {
        match child.name.as_str() {
            "pois" => {}
            "action" => props.actions.push(decode_action(child)),
            "animation" => decode_animation(child, &mut props.animations),
            name => {
                props.set_field(name, &child.text);
            }
        }
    }
}

fn decode_poi(node: &XmlNode) -> Result<Poi, FormatError> {
    let dimension = node
        .child("dimension")
        .and_then(|d| parse_int(&d.text))
        .filter(|d| *d != 0)
        .unwrap_or(1);
    let mut poi = Poi::with_dimension(dimension)?;

    for child in &node.children {
        match child.name.as_str() {
            "dimension" => {}
            "action" => poi.actions.push(decode_action(child)),
            "animation" => decode_animation(child, &mut poi.animations),
            "object" => {
                if let Some(placement) = poi.shape.placement_mut() {
                    for field in &child.children {
                        placement.object.set_field(&field.name, &field.text);
                    }
                }
            }
            "transform" => {
                if let Some(placement) = poi.shape.placement_mut() {
                    for field in &child.children {
                        placement.transform.set_field(&field.name, &field.text);
                    }
                }
            }
            name => {
                poi.set_field(name, &child.text)?;
            }
        }
    }
    Ok(poi)
}

fn decode_action(node: &XmlNode) -> Action {
    let mut action = Action::default();
    for field in &node.children {
        action.set_field(&field.name, &field.text);
    }
    action
}

/// Files the animation under every event its `events` attribute names. Animations
/// without events (including the legacy bare `drop`/`spin`/`grow` form) are skipped.
fn decode_animation(node: &XmlNode, animations: &mut Animations) {
    let events = AnimationEvent::parse_list(node.attr("events").unwrap_or(""));
    if events.is_empty() {
        return;
    }
    let mut animation = Animation::default();
    for field in &node.children {
        animation.set_field(&field.name, &field.text);
    }
    for event in events {
        animations.entry(event).or_default().push(animation.clone());
    }
}

type XmlWriter = Writer<Vec<u8>>;

pub fn encode_layer(doc: &LayerDocument) -> Result<String, FormatError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_err)?;
    start(&mut writer, "layer")?;

    let props = &doc.properties;
    for name in LayerProperties::FIELDS {
        if let Some(value) = props.field(name) {
            text_element(&mut writer, name, &value)?;
        }
    }
    for action in &props.actions {
        write_action(&mut writer, action)?;
    }
    write_animations(&mut writer, &props.animations)?;

    start(&mut writer, "pois")?;
    for poi in &doc.pois {
        write_poi(&mut writer, poi)?;
    }
    end(&mut writer, "pois")?;
    end(&mut writer, "layer")?;

    String::from_utf8(writer.into_inner()).map_err(xml_err)
}

fn write_poi(writer: &mut XmlWriter, poi: &Poi) -> Result<(), FormatError> {
    start(writer, "poi")?;
    for name in Poi::FIELDS {
        if let Some(value) = poi.field(name) {
            text_element(writer, name, &value)?;
        }
    }
    for action in &poi.actions {
        write_action(writer, action)?;
    }
    write_animations(writer, &poi.animations)?;
    if let Some(placement) = poi.shape.placement() {
        start(writer, "transform")?;
        for name in SpatialTransform::FIELDS {
            if let Some(value) = placement.transform.field(name) {
                text_element(writer, name, &value)?;
            }
        }
        end(writer, "transform")?;

        start(writer, "object")?;
        for name in RenderObject::FIELDS {
            if let Some(value) = placement.object.field(name) {
                text_element(writer, name, &value)?;
            }
        }
        end(writer, "object")?;
    }
    end(writer, "poi")
}

fn write_action(writer: &mut XmlWriter, action: &Action) -> Result<(), FormatError> {
    start(writer, "action")?;
    for name in Action::FIELDS {
        if let Some(value) = action.field(name) {
            text_element(writer, name, &value)?;
        }
    }
    end(writer, "action")
}

fn write_animations(writer: &mut XmlWriter, animations: &Animations) -> Result<(), FormatError> {
    for (event, list) in animations {
        for animation in list {
            let mut element = BytesStart::new("animation");
            element.push_attribute(("events", event.as_str()));
            writer.write_event(Event::Start(element)).map_err(xml_err)?;
            for name in Animation::FIELDS {
                if let Some(value) = animation.field(name) {
                    text_element(writer, name, &value)?;
                }
            }
            end(writer, "animation")?;
        }
    }
    Ok(())
}

fn start(writer: &mut XmlWriter, name: &str) -> Result<(), FormatError> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(xml_err)
}

fn end(writer: &mut XmlWriter, name: &str) -> Result<(), FormatError> {
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(xml_err)
}

/// Empty values are left out; reading a missing element and an empty one is the same.
fn text_element(writer: &mut XmlWriter, name: &str, value: &str) -> Result<(), FormatError> {
    if value.is_empty() {
        return Ok(());
    }
    start(writer, name)?;
    writer
        .write_event(Event::Text(BytesText::new(value)))
        .map_err(xml_err)?;
    end(writer, name)
}

#[cfg(test)]
mod tests {
    use super::{LayerDocument, decode_layer, encode_layer};
    use crate::error::FormatError;
    use foundation::PoiId;
    use poi::{Action, Animation, AnimationEvent, Axis, Poi};

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<layer>
  <refreshInterval>60</refreshInterval>
  <showMenuButton>0</showMenuButton>
  <layerTitle>Walking tour</layerTitle>
  <action>
    <uri>http://example.org/info</uri>
    <label>Info</label>
    <params>lat,lon</params>
  </action>
  <pois>
    <poi>
      <id>1</id>
      <lat>48.158</lat>
      <lon>11.5787</lon>
      <title>Caf&#233; &amp; bar</title>
      <visibilityRange>1500</visibilityRange>
    </poi>
    <poi>
      <id>2</id>
      <dimension>3</dimension>
      <lat>0</lat>
      <lon>0</lon>
      <alt>15</alt>
      <animation events="onCreate,onClick">
        <type>rotate</type>
        <length>2</length>
        <axis>0,1,0</axis>
      </animation>
      <animation>drop</animation>
      <transform><angle>45</angle><scale>2</scale></transform>
      <object><baseURL>http://example.org/</baseURL><full>statue.l3d</full></object>
    </poi>
  </pois>
</layer>
"#;

    #[test]
    fn decodes_layer_properties_and_pois() {
        let doc = decode_layer(SAMPLE).expect("decode");

        assert_eq!(doc.properties.refresh_interval, 60);
        assert!(!doc.properties.show_menu_button);
        assert_eq!(doc.properties.layer_title.as_deref(), Some("Walking tour"));
        assert_eq!(doc.properties.actions.len(), 1);
        assert_eq!(doc.properties.actions[0].params, vec!["lat", "lon"]);

        assert_eq!(doc.pois.len(), 2);
        assert_eq!(doc.pois[0].title.as_deref(), Some("Café & bar"));
        assert_eq!(doc.pois[0].dimension(), 1);

        let solid = &doc.pois[1];
        assert_eq!(solid.id, Some(PoiId::new(2)));
        assert_eq!(solid.dimension(), 3);
        assert_eq!(solid.field("alt").as_deref(), Some("15"));
        assert_eq!(solid.transform().map(|t| (t.angle, t.scale)), Some((45.0, 2.0)));
        assert_eq!(
            solid.object().and_then(|o| o.full.as_deref()),
            Some("statue.l3d")
        );
        let on_click = &solid.animations[&AnimationEvent::OnClick];
        assert_eq!(on_click.len(), 1);
        assert_eq!(on_click[0].axis, Axis::new(0.0, 1.0, 0.0));
        assert!(solid.animations.contains_key(&AnimationEvent::OnCreate));
        assert_eq!(solid.animations.len(), 2);
    }

    #[test]
    fn bare_pois_root_is_accepted() {
        let doc = decode_layer("<pois><poi><id>3</id></poi></pois>").expect("decode");
        assert_eq!(doc.pois.len(), 1);
        assert_eq!(doc.properties, Default::default());
    }

    #[test]
    fn rejects_broken_documents() {
        assert!(matches!(decode_layer("  "), Err(FormatError::Empty)));
        assert!(matches!(
            decode_layer("<layer><pois></layer>"),
            Err(FormatError::Xml(_))
        ));
        assert!(matches!(
            decode_layer("<hotspots/>"),
            Err(FormatError::Corrupt(_))
        ));
        assert!(matches!(
            decode_layer("<pois><poi><dimension>7</dimension></poi></pois>"),
            Err(FormatError::InvalidDimension(7))
        ));
    }

    #[test]
    fn encode_then_decode_is_lossless() {
        let mut doc = LayerDocument::default();
        doc.properties.refresh_distance = 250;
        doc.properties.no_pois_message = Some("Nothing <here>".to_string());
        doc.properties.actions.push(Action::from_uri("http://example.org/?a=1&b=2"));

        let mut solid = Poi::with_dimension(3).expect("3d");
        solid.id = Some(PoiId::new(9));
        solid.lat = 52.3702;
        solid.lon = 4.8952;
        solid.kind = Some(2);
        solid.do_not_index = true;
        if let Some(placement) = solid.shape.placement_mut() {
            placement.relative_alt = Some(-3.5);
            placement.object.size = Some(1.5);
        }
        let mut spin = Animation::default();
        spin.kind = Some("rotate".to_string());
        spin.repeat = true;
        spin.axis = Axis::new(0.0, 0.0, 1.0);
        solid.push_animation(AnimationEvent::OnFocus, spin);
        let mut action = Action::from_uri("http://example.org/buy");
        action.params = vec!["id".to_string()];
        action.auto_trigger_range = Some(20);
        solid.actions.push(action);

        doc.pois = vec![solid, Poi::point(10, -33.8688, 151.2093)];

        let xml = encode_layer(&doc).expect("encode");
        assert_eq!(decode_layer(&xml).expect("decode"), doc);
    }
}
