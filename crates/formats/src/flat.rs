//! Tab-separated POI files.
//!
//! The first line names the columns; every following non-empty line is one POI whose
//! values map positionally onto those names. Object and transform sub-fields are
//! flattened into their own columns and only the URI of the first action fits.

use std::collections::HashMap;

use poi::{Action, Poi, RenderObject, SpatialTransform, parse_int, parse_text};

use crate::error::FormatError;

pub const SEPARATOR: char = '\t';

/// Column holding the URI of a POI's first action.
pub const ACTIONS_COLUMN: &str = "actions";

/// Columns written by [`encode_flat`], in order.
pub fn flat_columns() -> Vec<&'static str> {
    let mut columns: Vec<&'static str> = Poi::FIELDS.to_vec();
    columns.extend(RenderObject::FIELDS);
    columns.extend(SpatialTransform::FIELDS);
    columns.push(ACTIONS_COLUMN);
    columns
}

pub fn decode_flat(text: &str) -> Result<Vec<Poi>, FormatError> {
    let mut lines = text.lines();
    let header = match lines.next() {
        Some(line) if !line.trim().is_empty() => line.trim_end_matches(['\r', '\n']),
        _ => return Err(FormatError::Empty),
    };
    let headers: Vec<&str> = header.split(SEPARATOR).map(str::trim).collect();

    let mut pois = Vec::new();
    for (index, line) in lines.enumerate() {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            continue;
        }
        let values: Vec<&str> = line.split(SEPARATOR).collect();
        if values.len() > headers.len() {
            return Err(FormatError::Corrupt(format!(
                "line {} has {} fields, header has {}",
                index + 2,
                values.len(),
                headers.len()
            )));
        }
        // Columns missing from a short row stay absent and keep their defaults.
        let row: HashMap<&str, &str> = headers.iter().copied().zip(values).collect();
        pois.push(decode_row(&headers, &row)?);
    }
    Ok(pois)
}

fn decode_row(headers: &[&str], row: &HashMap<&str, &str>) -> Result<Poi, FormatError> {
    let dimension = row
        .get("dimension")
        .and_then(|raw| parse_int(raw))
        .filter(|d| *d != 0)
        .unwrap_or(1);
    let mut poi = Poi::with_dimension(dimension)?;

    for name in headers {
        let Some(raw) = row.get(name).copied() else {
            continue;
        };
        match *name {
            "dimension" => {}
            ACTIONS_COLUMN => {
                if let Some(uri) = parse_text(raw) {
                    poi.actions = vec![Action::from_uri(uri)];
                }
            }
            _ => {
                if poi.set_field(name, raw)? {
                    continue;
                }
                if let Some(placement) = poi.shape.placement_mut() {
                    if !placement.transform.set_field(name, raw) {
                        placement.object.set_field(name, raw);
                    }
                }
            }
        }
    }
    Ok(poi)
}

pub fn encode_flat(pois: &[Poi]) -> String {
    let columns = flat_columns();
    let mut out = columns.join(&SEPARATOR.to_string());
    out.push('\n');
    for poi in pois {
        let row: Vec<String> = columns
            .iter()
            .map(|name| clean(&cell(poi, name).unwrap_or_default()))
            .collect();
        out.push_str(&row.join(&SEPARATOR.to_string()));
        out.push('\n');
    }
    out
}

fn cell(poi: &Poi, name: &str) -> Option<String> {
    if name == ACTIONS_COLUMN {
        return poi.actions.first().and_then(|a| a.uri.clone());
    }
    if Poi::FIELDS.contains(&name) {
        return poi.field(name);
    }
    let placement = poi.shape.placement()?;
    placement
        .transform
        .field(name)
        .or_else(|| placement.object.field(name))
}

/// Separators inside a value would shift every following column.
fn clean(value: &str) -> String {
    value.replace([SEPARATOR, '\r', '\n'], " ")
}

#[cfg(test)]
mod tests {
    use super::{decode_flat, encode_flat, flat_columns};
    use crate::error::FormatError;
    use foundation::PoiId;
    use poi::{Action, Poi};

    const SAMPLE: &str = "id\tdimension\tlat\tlon\ttitle\tvisibilityRange\tactions\n\
1\t1\t48.158\t11.5787\tMarienplatz\t1500\thttp://example.org/a\n\
\n\
2\t2\t0\t0\tNull Island\t0\t\n";

    #[test]
    fn decodes_rows_by_header() {
        let pois = decode_flat(SAMPLE).expect("decode");
        assert_eq!(pois.len(), 2);

        assert_eq!(pois[0].id, Some(PoiId::new(1)));
        assert_eq!(pois[0].lat, 48.158);
        assert_eq!(pois[0].title.as_deref(), Some("Marienplatz"));
        assert_eq!(pois[0].actions.len(), 1);
        assert_eq!(pois[0].actions[0].uri.as_deref(), Some("http://example.org/a"));

        assert_eq!(pois[1].dimension(), 2);
        assert_eq!(pois[1].visibility_range, 0);
        assert!(pois[1].actions.is_empty());
        assert_eq!(pois[1].transform().map(|t| t.scale), Some(1.0));
    }

    #[test]
    fn empty_source_is_an_error() {
        assert!(matches!(decode_flat(""), Err(FormatError::Empty)));
        assert!(matches!(decode_flat("\n\n"), Err(FormatError::Empty)));
    }

    #[test]
    fn header_only_means_no_pois() {
        assert!(decode_flat("id\tlat\tlon\n").expect("decode").is_empty());
    }

    #[test]
    fn rejects_unknown_dimension() {
        let err = decode_flat("id\tdimension\n1\t4\n").expect_err("dimension 4");
        assert!(matches!(err, FormatError::InvalidDimension(4)));
    }

    #[test]
    fn rejects_rows_wider_than_header() {
        let err = decode_flat("id\tlat\n1\t2\t3\n").expect_err("too wide");
        assert!(matches!(err, FormatError::Corrupt(_)));
    }

    #[test]
    fn short_rows_leave_missing_columns_at_their_defaults() {
        let pois = decode_flat("id\tlat\tlon\ttitle\n7\t1.5\n").expect("decode");
        assert_eq!(pois[0].lat, 1.5);
        assert_eq!(pois[0].lon, 0.0);
        assert_eq!(pois[0].title, None);

        let text = "id\tlat\tlon\ttitle\tvisibilityRange\tshowSmallBiw\tisVisible\n\
1\t0\t0\tshort\n\
2\t0\t0\tblank\t\t\t\n";
        let pois = decode_flat(text).expect("decode");
        assert!(pois[0].is_visible && pois[0].show_small_biw);
        assert_eq!(pois[0].visibility_range, 1500);
        // Present but empty cells are read as written.
        assert!(!pois[1].is_visible && !pois[1].show_small_biw);
        assert_eq!(pois[1].visibility_range, 0);
    }

    #[test]
    fn encode_then_decode_keeps_flat_fields() {
        let mut solid = Poi::with_dimension(3).expect("3d");
        solid.id = Some(PoiId::new(4));
        solid.lat = 52.3702;
        solid.lon = 4.8952;
        solid.title = Some("tab\tinside".to_string());
        solid.actions = vec![Action::from_uri("http://example.org/b")];
        if let Some(placement) = solid.shape.placement_mut() {
            placement.alt = Some(12);
            placement.transform.angle = 90.0;
            placement.object.full = Some("model.l3d".to_string());
            placement.object.size = Some(2.5);
        }
        let point = Poi::point(5, -1.25, 2.5);

        let text = encode_flat(&[solid.clone(), point.clone()]);
        assert!(text.starts_with(&flat_columns().join("\t")));

        let decoded = decode_flat(&text).expect("decode");
        solid.title = Some("tab inside".to_string());
        assert_eq!(decoded, vec![solid, point]);
    }
}
