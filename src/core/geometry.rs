//! Geometry resolution for buyer search areas and listing coordinates.
//!
//! Buyers store their search area in several shapes and listings store their
//! position in several shapes. Both are normalized here into typed values:
//! a [`Coordinates`] point and a [`SearchArea`] that answers containment.
//!
//! All positions inside GeoJSON-like values are `[longitude, latitude]`.

use geo::coordinate_position::{CoordPos, CoordinatePosition};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::core::distance::is_within_radius;
use crate::models::{Coordinates, LocationField, NumericField, PropertyListing};

static NULL: Value = Value::Null;

/// Reasons a search area cannot be turned into a region test
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("search area is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("unsupported geometry type: {0}")]
    UnsupportedGeometry(String),

    #[error("malformed position: {0}")]
    MalformedPosition(String),

    #[error("ring has {0} positions, at least 3 required")]
    RingTooShort(usize),

    #[error("polygon has no rings")]
    EmptyPolygon,

    #[error("feature collection has no usable zones")]
    NoUsableZones,

    #[error("circle radius must be a finite non-negative number")]
    InvalidRadius,

    #[error("unrecognized search area shape")]
    UnrecognizedShape,
}

/// One named zone of a multi-zone search area
#[derive(Debug, Clone, PartialEq)]
pub enum Zone {
    Polygon(Polygon<f64>),
    MultiPolygon(MultiPolygon<f64>),
    /// Zone centre with an implicit radius
    Point { center: Coordinates, radius_m: f64 },
}

impl Zone {
    pub fn contains(&self, point: Coordinates) -> bool {
        match self {
            Zone::Polygon(polygon) => polygon_contains(polygon, point),
            Zone::MultiPolygon(multi) => multi.0.iter().any(|p| polygon_contains(p, point)),
            Zone::Point { center, radius_m } => is_within_radius(point, *center, *radius_m),
        }
    }
}

/// Canonical form of a buyer's geographic constraint
#[derive(Debug, Clone, PartialEq)]
pub enum SearchArea {
    /// FeatureCollection: inside any zone
    Zones(Vec<Zone>),
    /// Great-circle radius around a centre
    Circle { center: Coordinates, radius_m: f64 },
    /// Single polygon, from a GeoJSON Feature or a raw coordinate ring
    Polygon(Polygon<f64>),
}

impl SearchArea {
    /// Resolve a stored search area value.
    ///
    /// Shapes are tried in order: FeatureCollection, circle, Feature, raw
    /// coordinate ring. A string value is decoded as JSON first.
    pub fn parse(value: &Value, point_zone_radius_m: f64) -> Result<Self, GeometryError> {
        match value {
            Value::String(text) => {
                let decoded: Value = serde_json::from_str(text)
                    .map_err(|e| GeometryError::InvalidJson(e.to_string()))?;
                parse_shape(&decoded, point_zone_radius_m)
            }
            other => parse_shape(other, point_zone_radius_m),
        }
    }

    pub fn contains(&self, point: Coordinates) -> bool {
        match self {
            SearchArea::Zones(zones) => zones.iter().any(|zone| zone.contains(point)),
            SearchArea::Circle { center, radius_m } => is_within_radius(point, *center, *radius_m),
            SearchArea::Polygon(polygon) => polygon_contains(polygon, point),
        }
    }
}

/// Check a point against a raw search area value.
///
/// Malformed areas are logged and reported as not containing the point.
pub fn is_point_in_search_area(point: Coordinates, area: &Value, point_zone_radius_m: f64) -> bool {
    match SearchArea::parse(area, point_zone_radius_m) {
        Ok(area) => area.contains(point),
        Err(e) => {
            tracing::warn!(error = %e, "invalid search area, treating as no match");
            false
        }
    }
}

/// Extract a listing's position.
///
/// The nested `location` value wins when it yields finite coordinates;
/// otherwise the flat `latitude` / `longitude` fields are used.
pub fn extract_coordinates<L: PropertyListing + ?Sized>(listing: &L) -> Option<Coordinates> {
    listing
        .location()
        .and_then(nested_coordinates)
        .or_else(|| flat_coordinates(listing.latitude(), listing.longitude()))
}

fn nested_coordinates(location: &LocationField) -> Option<Coordinates> {
    match location {
        LocationField::Object(map) => coordinates_from_map(map),
        LocationField::Encoded(text) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => coordinates_from_map(&map),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!(error = %e, "location string is not valid JSON");
                None
            }
        },
        LocationField::Other(_) => None,
    }
}

fn coordinates_from_map(map: &Map<String, Value>) -> Option<Coordinates> {
    let lat = map.get("lat").and_then(finite_number)?;
    let lng = map.get("lng").and_then(finite_number)?;
    Some(Coordinates::new(lat, lng))
}

fn flat_coordinates(
    latitude: Option<&NumericField>,
    longitude: Option<&NumericField>,
) -> Option<Coordinates> {
    let lat = latitude.and_then(NumericField::value)?;
    let lng = longitude.and_then(NumericField::value)?;
    Some(Coordinates::new(lat, lng))
}

/// A JSON number or numeric string that parses to a finite value
fn finite_number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// Planar containment on `[lng, lat]`; boundary points count as inside
fn polygon_contains(polygon: &Polygon<f64>, point: Coordinates) -> bool {
    let coord = Coord { x: point.lng, y: point.lat };
    matches!(
        polygon.coordinate_position(&coord),
        CoordPos::Inside | CoordPos::OnBoundary
    )
}

fn parse_shape(value: &Value, point_zone_radius_m: f64) -> Result<SearchArea, GeometryError> {
    if let Some(features) = feature_collection(value) {
        return parse_zones(features, point_zone_radius_m);
    }

    if let Some(object) = value.as_object() {
        if let (Some(center), Some(radius)) = (object.get("center"), object.get("radius")) {
            return parse_circle(center, radius);
        }

        if type_name(value) == Some("Feature") {
            return parse_feature(value);
        }
    }

    if let Value::Array(positions) = value {
        return parse_ring(positions).map(|ring| SearchArea::Polygon(Polygon::new(ring, vec![])));
    }

    Err(GeometryError::UnrecognizedShape)
}

fn type_name(value: &Value) -> Option<&str> {
    value.get("type").and_then(Value::as_str)
}

fn feature_collection(value: &Value) -> Option<&Vec<Value>> {
    if type_name(value) != Some("FeatureCollection") {
        return None;
    }
    value.get("features").and_then(Value::as_array)
}

/// Unsupported geometry types are skipped; any malformed zone fails the
/// whole collection.
fn parse_zones(features: &[Value], point_zone_radius_m: f64) -> Result<SearchArea, GeometryError> {
    let mut zones = Vec::with_capacity(features.len());

    for (index, feature) in features.iter().enumerate() {
        match parse_zone(feature, point_zone_radius_m) {
            Ok(zone) => zones.push(zone),
            Err(GeometryError::UnsupportedGeometry(kind)) => {
                tracing::warn!(feature = index, geometry = %kind, "skipping unsupported search zone");
            }
            Err(e) => return Err(e),
        }
    }

    if zones.is_empty() {
        return Err(GeometryError::NoUsableZones);
    }

    Ok(SearchArea::Zones(zones))
}

fn parse_zone(feature: &Value, point_zone_radius_m: f64) -> Result<Zone, GeometryError> {
    let geometry = feature
        .get("geometry")
        .ok_or_else(|| GeometryError::UnsupportedGeometry("missing".to_string()))?;
    let coordinates = geometry.get("coordinates").unwrap_or(&NULL);

    match type_name(geometry) {
        Some("Polygon") => parse_polygon(coordinates).map(Zone::Polygon),
        Some("MultiPolygon") => parse_multi_polygon(coordinates).map(Zone::MultiPolygon),
        Some("Point") => {
            let position = parse_position(coordinates)?;
            Ok(Zone::Point {
                center: Coordinates::new(position.y, position.x),
                radius_m: point_zone_radius_m,
            })
        }
        Some(other) => Err(GeometryError::UnsupportedGeometry(other.to_string())),
        None => Err(GeometryError::UnsupportedGeometry("missing".to_string())),
    }
}

fn parse_circle(center: &Value, radius: &Value) -> Result<SearchArea, GeometryError> {
    let center = center
        .as_object()
        .and_then(coordinates_from_map)
        .ok_or_else(|| GeometryError::MalformedPosition(center.to_string()))?;
    let radius_m = finite_number(radius)
        .filter(|r| *r >= 0.0)
        .ok_or(GeometryError::InvalidRadius)?;

    Ok(SearchArea::Circle { center, radius_m })
}

fn parse_feature(feature: &Value) -> Result<SearchArea, GeometryError> {
    let geometry = feature.get("geometry").unwrap_or(&NULL);
    match type_name(geometry) {
        Some("Polygon") => {
            let coordinates = geometry.get("coordinates").unwrap_or(&NULL);
            parse_polygon(coordinates).map(SearchArea::Polygon)
        }
        Some(other) => Err(GeometryError::UnsupportedGeometry(other.to_string())),
        None => Err(GeometryError::UnsupportedGeometry("missing".to_string())),
    }
}

fn parse_multi_polygon(value: &Value) -> Result<MultiPolygon<f64>, GeometryError> {
    let polygons = value
        .as_array()
        .ok_or_else(|| GeometryError::MalformedPosition(value.to_string()))?;
    polygons
        .iter()
        .map(parse_polygon)
        .collect::<Result<Vec<_>, _>>()
        .map(MultiPolygon::new)
}

/// First ring is the exterior, the rest are holes
fn parse_polygon(value: &Value) -> Result<Polygon<f64>, GeometryError> {
    let rings = value
        .as_array()
        .ok_or_else(|| GeometryError::MalformedPosition(value.to_string()))?;
    let (exterior, holes) = rings.split_first().ok_or(GeometryError::EmptyPolygon)?;

    let exterior = parse_ring(ring_positions(exterior)?)?;
    let interiors = holes
        .iter()
        .map(|ring| ring_positions(ring).and_then(parse_ring))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Polygon::new(exterior, interiors))
}

fn ring_positions(value: &Value) -> Result<&Vec<Value>, GeometryError> {
    value
        .as_array()
        .ok_or_else(|| GeometryError::MalformedPosition(value.to_string()))
}

/// Parse a ring of at least 3 positions, closing it when first != last
fn parse_ring(positions: &Vec<Value>) -> Result<LineString<f64>, GeometryError> {
    if positions.len() < 3 {
        return Err(GeometryError::RingTooShort(positions.len()));
    }

    let mut coords = positions
        .iter()
        .map(parse_position)
        .collect::<Result<Vec<_>, _>>()?;

    if coords.first() != coords.last() {
        coords.push(coords[0]);
    }

    Ok(LineString::new(coords))
}

fn parse_position(value: &Value) -> Result<Coord<f64>, GeometryError> {
    let malformed = || GeometryError::MalformedPosition(value.to_string());
    let pair = value.as_array().filter(|p| p.len() >= 2).ok_or_else(malformed)?;
    let x = finite_number(&pair[0]).ok_or_else(malformed)?;
    let y = finite_number(&pair[1]).ok_or_else(malformed)?;
    Ok(Coord { x, y })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Listing, ListingStatus};
    use serde_json::json;

    const ZONE_RADIUS: f64 = 2000.0;

    fn meters_north(lat: f64, meters: f64) -> f64 {
        lat + (meters / 6_371_000.0).to_degrees()
    }

    fn square() -> Value {
        json!([[9.1, 45.4], [9.2, 45.4], [9.2, 45.5], [9.1, 45.5], [9.1, 45.4]])
    }

    fn bare_listing() -> Listing {
        Listing {
            id: "p1".to_string(),
            status: Some(ListingStatus::Available),
            property_type: None,
            size: None,
            price: None,
            location: None,
            latitude: None,
            longitude: None,
            title: None,
            address: None,
            agent_id: None,
        }
    }

    #[test]
    fn test_extract_nested_object() {
        let mut listing = bare_listing();
        listing.location = Some(LocationField::Object(
            json!({"lat": "45.46", "lng": 9.19}).as_object().unwrap().clone(),
        ));

        assert_eq!(extract_coordinates(&listing), Some(Coordinates::new(45.46, 9.19)));
    }

    #[test]
    fn test_extract_encoded_location() {
        let mut listing = bare_listing();
        listing.location = Some(LocationField::Encoded(r#"{"lat": 45.46, "lng": "9.19"}"#.to_string()));

        assert_eq!(extract_coordinates(&listing), Some(Coordinates::new(45.46, 9.19)));
    }

    #[test]
    fn test_extract_falls_back_to_flat_fields() {
        let mut listing = bare_listing();
        listing.location = Some(LocationField::Encoded("not json".to_string()));
        listing.latitude = Some(NumericField::Text("45.1".to_string()));
        listing.longitude = Some(NumericField::Number(9.2));

        assert_eq!(extract_coordinates(&listing), Some(Coordinates::new(45.1, 9.2)));
    }

    #[test]
    fn test_extract_none_without_coordinates() {
        let mut listing = bare_listing();
        assert_eq!(extract_coordinates(&listing), None);

        listing.latitude = Some(NumericField::Number(45.1));
        assert_eq!(extract_coordinates(&listing), None);

        listing.longitude = Some(NumericField::Text("east".to_string()));
        assert_eq!(extract_coordinates(&listing), None);
    }

    #[test]
    fn test_raw_ring_is_auto_closed() {
        let area = SearchArea::parse(&json!([[9.1, 45.4], [9.2, 45.4], [9.2, 45.5]]), ZONE_RADIUS).unwrap();

        match &area {
            SearchArea::Polygon(polygon) => assert_eq!(polygon.exterior().0.len(), 4),
            other => panic!("expected polygon, got {:?}", other),
        }
        assert!(area.contains(Coordinates::new(45.42, 9.18)));
        assert!(!area.contains(Coordinates::new(45.48, 9.11)));
    }

    #[test]
    fn test_closed_raw_ring_is_not_duplicated() {
        let area = SearchArea::parse(&square(), ZONE_RADIUS).unwrap();
        match area {
            SearchArea::Polygon(polygon) => assert_eq!(polygon.exterior().0.len(), 5),
            other => panic!("expected polygon, got {:?}", other),
        }
    }

    #[test]
    fn test_raw_ring_too_short() {
        let err = SearchArea::parse(&json!([[9.1, 45.4], [9.2, 45.4]]), ZONE_RADIUS).unwrap_err();
        assert_eq!(err, GeometryError::RingTooShort(2));
    }

    #[test]
    fn test_coordinate_order_is_lng_lat() {
        // Thin strip: longitudes 9.0..9.1, latitudes 45.0..46.0
        let area = SearchArea::parse(
            &json!([[9.0, 45.0], [9.1, 45.0], [9.1, 46.0], [9.0, 46.0]]),
            ZONE_RADIUS,
        )
        .unwrap();

        assert!(area.contains(Coordinates::new(45.5, 9.05)));
        assert!(!area.contains(Coordinates::new(9.05, 45.5)));
    }

    #[test]
    fn test_feature_collection_point_zone() {
        let area = SearchArea::parse(
            &json!({
                "type": "FeatureCollection",
                "features": [
                    {"type": "Feature", "properties": {"name": "Centro"},
                     "geometry": {"type": "Point", "coordinates": [9.19, 45.46]}}
                ]
            }),
            ZONE_RADIUS,
        )
        .unwrap();

        assert!(area.contains(Coordinates::new(meters_north(45.46, 1500.0), 9.19)));
        assert!(!area.contains(Coordinates::new(meters_north(45.46, 2500.0), 9.19)));
    }

    #[test]
    fn test_feature_collection_any_zone_matches() {
        let area = SearchArea::parse(
            &json!({
                "type": "FeatureCollection",
                "features": [
                    {"type": "Feature", "geometry": {"type": "LineString", "coordinates": [[0, 0], [1, 1]]}},
                    {"type": "Feature", "geometry": {"type": "Polygon", "coordinates": [square()]}},
                    {"type": "Feature", "geometry": {"type": "Point", "coordinates": [12.49, 41.89]}}
                ]
            }),
            ZONE_RADIUS,
        )
        .unwrap();

        match &area {
            SearchArea::Zones(zones) => assert_eq!(zones.len(), 2),
            other => panic!("expected zones, got {:?}", other),
        }
        assert!(area.contains(Coordinates::new(45.45, 9.15)));
        assert!(area.contains(Coordinates::new(41.891, 12.491)));
        assert!(!area.contains(Coordinates::new(44.0, 11.0)));
    }

    #[test]
    fn test_multi_polygon_zone_and_holes() {
        let area = SearchArea::parse(
            &json!({
                "type": "FeatureCollection",
                "features": [{
                    "type": "Feature",
                    "geometry": {
                        "type": "MultiPolygon",
                        "coordinates": [
                            [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]]],
                            [
                                [[10.0, 10.0], [14.0, 10.0], [14.0, 14.0], [10.0, 14.0], [10.0, 10.0]],
                                [[11.0, 11.0], [13.0, 11.0], [13.0, 13.0], [11.0, 13.0], [11.0, 11.0]]
                            ]
                        ]
                    }
                }]
            }),
            ZONE_RADIUS,
        )
        .unwrap();

        assert!(area.contains(Coordinates::new(0.5, 0.5)));
        assert!(area.contains(Coordinates::new(10.5, 10.5)));
        assert!(!area.contains(Coordinates::new(12.0, 12.0)));
        assert!(!area.contains(Coordinates::new(5.0, 5.0)));
    }

    #[test]
    fn test_feature_collection_without_usable_zones() {
        let err = SearchArea::parse(
            &json!({"type": "FeatureCollection", "features": []}),
            ZONE_RADIUS,
        )
        .unwrap_err();
        assert_eq!(err, GeometryError::NoUsableZones);
    }

    #[test]
    fn test_circle() {
        let area = SearchArea::parse(
            &json!({"center": {"lat": 45.46, "lng": 9.19}, "radius": 1000}),
            ZONE_RADIUS,
        )
        .unwrap();

        assert!(area.contains(Coordinates::new(meters_north(45.46, 900.0), 9.19)));
        assert!(!area.contains(Coordinates::new(meters_north(45.46, 1100.0), 9.19)));
    }

    #[test]
    fn test_circle_with_bad_radius() {
        let err = SearchArea::parse(
            &json!({"center": {"lat": 45.46, "lng": 9.19}, "radius": -5}),
            ZONE_RADIUS,
        )
        .unwrap_err();
        assert_eq!(err, GeometryError::InvalidRadius);
    }

    #[test]
    fn test_feature_polygon() {
        let area = SearchArea::parse(
            &json!({"type": "Feature", "geometry": {"type": "Polygon", "coordinates": [square()]}}),
            ZONE_RADIUS,
        )
        .unwrap();

        assert!(area.contains(Coordinates::new(45.45, 9.15)));
        // Boundary counts as inside
        assert!(area.contains(Coordinates::new(45.4, 9.15)));
    }

    #[test]
    fn test_feature_with_unsupported_geometry() {
        let err = SearchArea::parse(
            &json!({"type": "Feature", "geometry": {"type": "Point", "coordinates": [9.19, 45.46]}}),
            ZONE_RADIUS,
        )
        .unwrap_err();
        assert_eq!(err, GeometryError::UnsupportedGeometry("Point".to_string()));
    }

    #[test]
    fn test_encoded_search_area() {
        let encoded = Value::String(square().to_string());
        let area = SearchArea::parse(&encoded, ZONE_RADIUS).unwrap();
        assert!(area.contains(Coordinates::new(45.45, 9.15)));

        let err = SearchArea::parse(&json!("{not json"), ZONE_RADIUS).unwrap_err();
        assert!(matches!(err, GeometryError::InvalidJson(_)));
    }

    #[test]
    fn test_unrecognized_shapes() {
        for value in [json!(null), json!(42), json!({"type": "Polygon"}), json!({"foo": "bar"})] {
            assert_eq!(
                SearchArea::parse(&value, ZONE_RADIUS).unwrap_err(),
                GeometryError::UnrecognizedShape
            );
        }
    }

    #[test]
    fn test_malformed_zone_fails_whole_collection() {
        let point = Coordinates::new(45.46, 9.19);
        let area = json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "geometry": {"type": "Polygon", "coordinates": [[
                    [9.1, "bad"], [9.2, 45.4], [9.2, 45.5], [9.1, 45.4]
                ]]}},
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [9.19, 45.46]}}
            ]
        });

        assert!(matches!(
            SearchArea::parse(&area, ZONE_RADIUS),
            Err(GeometryError::MalformedPosition(_))
        ));
        assert!(!is_point_in_search_area(point, &area, ZONE_RADIUS));

        let short_ring = json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [9.19, 45.46]}},
                {"type": "Feature", "geometry": {"type": "Polygon", "coordinates": [[[9.1, 45.4], [9.2, 45.4]]]}}
            ]
        });
        assert_eq!(
            SearchArea::parse(&short_ring, ZONE_RADIUS).unwrap_err(),
            GeometryError::RingTooShort(2)
        );

        let not_an_array = json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "geometry": {"type": "MultiPolygon", "coordinates": "9.19,45.46"}},
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [9.19, 45.46]}}
            ]
        });
        assert!(!is_point_in_search_area(point, &not_an_array, ZONE_RADIUS));
    }

    #[test]
    fn test_malformed_positions_never_match() {
        let area = json!([[9.1, "x"], [9.2, 45.4], [9.2, 45.5]]);
        assert!(!is_point_in_search_area(Coordinates::new(45.45, 9.15), &area, ZONE_RADIUS));
    }
}
