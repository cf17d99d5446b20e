//! GeoJSON FeatureCollections in and out.
//!
//! Only the legacy `crs` foreign member carries the coordinate system; it is
//! kept verbatim on read and written back on output.

use crate::error::IoError;
use ::geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, Value};
use fieldplots_core::{Crs, Polygon, RegionGeometry, Ring};
use fieldplots_grid::GridCell;
use fieldplots_zonal::Region;
use nalgebra::Point2;
use serde_json::{json, Value as JsonValue};
use std::fs;
use std::io::Write;
use std::path::Path;

use super::write_atomic;

/// Regions read from one GeoJSON file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VectorLayer {
    pub regions: Vec<Region>,
    /// Legacy `crs` member of the collection, if any.
    pub crs: Option<JsonValue>,
}

impl VectorLayer {
    /// Point coordinates in file order. Every region must be a point.
    pub fn points(&self) -> Result<Vec<Point2<f64>>, IoError> {
        self.regions
            .iter()
            .enumerate()
            .map(|(i, r)| match r.geometry {
                RegionGeometry::Point(p) => Ok(p),
                _ => Err(IoError::InvalidInput(format!(
                    "feature {i} is not a point"
                ))),
            })
            .collect()
    }

    /// CRS named by the `crs` member.
    pub fn crs(&self) -> Option<Crs> {
        self.crs.as_ref().and_then(crs_from_member)
    }
}

/// Legacy `{"type": "name", "properties": {"name": ...}}` member for `crs`.
pub fn crs_member(crs: &Crs) -> JsonValue {
    json!({"type": "name", "properties": {"name": crs.name}})
}

/// Parse a legacy `crs` member. URNs such as
/// `urn:ogc:def:crs:EPSG::32614` become `EPSG:32614`.
pub fn crs_from_member(member: &JsonValue) -> Option<Crs> {
    let name = member.get("properties")?.get("name")?.as_str()?;
    let code = name
        .rsplit_once("EPSG::")
        .or_else(|| name.rsplit_once("EPSG:"))
        .and_then(|(_, code)| code.trim().parse::<u32>().ok());
    Some(match code {
        Some(code) => Crs::epsg(code),
        None if name.contains("CRS84") => Crs::epsg(4326),
        None => Crs::new(name),
    })
}

pub fn read_vector(path: impl AsRef<Path>) -> Result<VectorLayer, IoError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)?;
    let layer = parse_vector(&raw)?;
    log::debug!("read {} features from {}", layer.regions.len(), path.display());
    Ok(layer)
}

/// Parse a FeatureCollection, a single Feature or a bare Geometry.
pub fn parse_vector(text: &str) -> Result<VectorLayer, IoError> {
    match text.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(fc) => {
            let crs = fc
                .foreign_members
                .as_ref()
                .and_then(|m| m.get("crs"))
                .cloned();
            let regions = fc
                .features
                .iter()
                .enumerate()
                .map(|(i, f)| feature_to_region(i, f))
                .collect::<Result<_, _>>()?;
            Ok(VectorLayer { regions, crs })
        }
        GeoJson::Feature(f) => Ok(VectorLayer {
            regions: vec![feature_to_region(0, &f)?],
            crs: None,
        }),
        GeoJson::Geometry(g) => Ok(VectorLayer {
            regions: vec![Region::new(geometry_from_value(0, &g.value)?)],
            crs: None,
        }),
    }
}

/// Read the ordered point list of a corner or plot-anchor file.
pub fn read_points(
    path: impl AsRef<Path>,
) -> Result<(Vec<Point2<f64>>, Option<JsonValue>), IoError> {
    let layer = read_vector(path)?;
    let points = layer.points()?;
    Ok((points, layer.crs))
}

fn feature_to_region(index: usize, feature: &Feature) -> Result<Region, IoError> {
    let geometry = feature
        .geometry
        .as_ref()
        .ok_or_else(|| IoError::InvalidInput(format!("feature {index} has no geometry")))?;
    let mut region = Region::new(geometry_from_value(index, &geometry.value)?);
    if let Some(props) = &feature.properties {
        region.properties = props.clone();
    }
    Ok(region)
}

fn position(index: usize, pos: &[f64]) -> Result<Point2<f64>, IoError> {
    match pos {
        [x, y, ..] => Ok(Point2::new(*x, *y)),
        _ => Err(IoError::InvalidInput(format!(
            "feature {index} has a position with fewer than 2 coordinates"
        ))),
    }
}

fn polygon_from_rings(index: usize, rings: &[Vec<Vec<f64>>]) -> Result<Polygon, IoError> {
    let mut rings = rings.iter().map(|ring| {
        ring.iter()
            .map(|p| position(index, p))
            .collect::<Result<Vec<_>, _>>()
            .map(Ring::new)
    });
    let exterior = rings
        .next()
        .ok_or_else(|| IoError::InvalidInput(format!("feature {index} has an empty polygon")))??;
    let interiors = rings.collect::<Result<Vec<_>, _>>()?;
    Ok(Polygon::with_interiors(exterior, interiors))
}

fn geometry_from_value(index: usize, value: &Value) -> Result<RegionGeometry, IoError> {
    match value {
        Value::Point(p) => Ok(RegionGeometry::Point(position(index, p)?)),
        // Digitized corners sometimes arrive as one-point MultiPoints.
        Value::MultiPoint(points) => {
            let first = points.first().ok_or_else(|| {
                IoError::InvalidInput(format!("feature {index} has an empty MultiPoint"))
            })?;
            Ok(RegionGeometry::Point(position(index, first)?))
        }
        Value::Polygon(rings) => Ok(RegionGeometry::Polygon(polygon_from_rings(index, rings)?)),
        Value::MultiPolygon(polys) => Ok(RegionGeometry::MultiPolygon(
            polys
                .iter()
                .map(|rings| polygon_from_rings(index, rings))
                .collect::<Result<_, _>>()?,
        )),
        Value::LineString(_) | Value::MultiLineString(_) | Value::GeometryCollection(_) => {
            Err(IoError::InvalidInput(format!(
                "feature {index} is not a point or polygon geometry"
            )))
        }
    }
}

fn ring_positions(ring: &Ring) -> Vec<Vec<f64>> {
    ring.closed().iter().map(|p| vec![p.x, p.y]).collect()
}

fn polygon_rings(polygon: &Polygon) -> Vec<Vec<Vec<f64>>> {
    std::iter::once(&polygon.exterior)
        .chain(&polygon.interiors)
        .map(ring_positions)
        .collect()
}

fn geometry_value(geometry: &RegionGeometry) -> Value {
    match geometry {
        RegionGeometry::Point(p) => Value::Point(vec![p.x, p.y]),
        RegionGeometry::Polygon(poly) => Value::Polygon(polygon_rings(poly)),
        RegionGeometry::MultiPolygon(polys) => {
            Value::MultiPolygon(polys.iter().map(polygon_rings).collect())
        }
    }
}

fn feature(value: Value, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(value)),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

fn write_collection(
    path: &Path,
    features: Vec<Feature>,
    crs: Option<&JsonValue>,
) -> Result<(), IoError> {
    let foreign_members = crs.map(|crs| {
        let mut members = JsonObject::new();
        members.insert("crs".to_string(), crs.clone());
        members
    });
    let count = features.len();
    let fc = FeatureCollection {
        bbox: None,
        features,
        foreign_members,
    };
    let text = serde_json::to_string_pretty(&fc)?;
    write_atomic(path, |w| w.write_all(text.as_bytes()))?;
    log::info!("wrote {count} features to {}", path.display());
    Ok(())
}

/// Write grid cells as polygons with `id`, `range`, `column`, `row`, `plot`
/// and `label` properties (indices 1-based, `id` 0-based).
pub fn write_grid(
    path: impl AsRef<Path>,
    cells: &[GridCell],
    crs: Option<&JsonValue>,
) -> Result<(), IoError> {
    let features = cells
        .iter()
        .enumerate()
        .map(|(id, cell)| {
            let mut props = JsonObject::new();
            props.insert("id".to_string(), json!(id));
            props.insert("range".to_string(), json!(cell.range + 1));
            props.insert("column".to_string(), json!(cell.column + 1));
            if let Some(row) = cell.row {
                props.insert("row".to_string(), json!(row + 1));
            }
            if let Some(plot) = cell.plot {
                props.insert("plot".to_string(), json!(plot + 1));
            }
            props.insert("label".to_string(), json!(cell.label()));
            feature(Value::Polygon(polygon_rings(&cell.polygon())), props)
        })
        .collect();
    write_collection(path.as_ref(), features, crs)
}

/// Write regions with their properties.
pub fn write_regions(
    path: impl AsRef<Path>,
    regions: &[Region],
    crs: Option<&JsonValue>,
) -> Result<(), IoError> {
    let features = regions
        .iter()
        .map(|r| feature(geometry_value(&r.geometry), r.properties.clone()))
        .collect();
    write_collection(path.as_ref(), features, crs)
}

/// Write CRS points, e.g. digitized clicks already mapped through
/// [`PixelTransformer::points_to_geo`](fieldplots_zonal::PixelTransformer::points_to_geo).
pub fn points_to_geojson(
    path: impl AsRef<Path>,
    points: &[Point2<f64>],
    crs: Option<&Crs>,
) -> Result<(), IoError> {
    let features = points
        .iter()
        .map(|p| feature(Value::Point(vec![p.x, p.y]), JsonObject::new()))
        .collect();
    let member = crs.map(crs_member);
    write_collection(path.as_ref(), features, member.as_ref())
}

/// Write digitized outlines as closed polygons.
pub fn shapes_to_geojson(
    path: impl AsRef<Path>,
    shapes: &[Ring],
    crs: Option<&Crs>,
) -> Result<(), IoError> {
    let features = shapes
        .iter()
        .filter(|ring| {
            let ok = ring.len() >= 3;
            if !ok {
                log::warn!("skipping shape with {} vertices", ring.len());
            }
            ok
        })
        .map(|ring| feature(Value::Polygon(vec![ring_positions(ring)]), JsonObject::new()))
        .collect();
    let member = crs.map(crs_member);
    write_collection(path.as_ref(), features, member.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLOTS: &str = r#"{
        "type": "FeatureCollection",
        "crs": {"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG::32614"}},
        "features": [
            {"type": "Feature", "properties": {"ID": 7},
             "geometry": {"type": "Polygon", "coordinates": [[[0,0],[2,0],[2,1],[0,1],[0,0]]]}},
            {"type": "Feature", "properties": {},
             "geometry": {"type": "MultiPoint", "coordinates": [[5,6],[7,8]]}}
        ]
    }"#;

    #[test]
    fn reads_regions_and_crs_member() {
        let layer = parse_vector(PLOTS).expect("parse");
        assert_eq!(layer.regions.len(), 2);
        assert_eq!(layer.crs().expect("crs"), Crs::epsg(32614));
        assert_eq!(layer.regions[0].label(0), "7");
        match &layer.regions[0].geometry {
            RegionGeometry::Polygon(p) => assert_eq!(p.exterior.len(), 4),
            other => panic!("unexpected geometry {other:?}"),
        }
        assert_eq!(
            layer.regions[1].geometry,
            RegionGeometry::Point(Point2::new(5.0, 6.0))
        );
        assert!(layer.points().is_err());
    }

    #[test]
    fn rejects_line_strings() {
        let text = r#"{"type": "LineString", "coordinates": [[0,0],[1,1]]}"#;
        assert!(matches!(parse_vector(text), Err(IoError::InvalidInput(_))));
    }

    #[test]
    fn grid_cells_round_trip_with_crs() {
        use fieldplots_grid::{generate_grid, DirectionFrame, GridParams};
        use nalgebra::Vector2;

        let frame =
            DirectionFrame::new(Point2::origin(), Vector2::x(), Vector2::y()).expect("frame");
        let params = GridParams {
            num_ranges: 2,
            num_columns: 3,
            num_rows: 1,
            ..GridParams::default()
        };
        let cells = generate_grid(&frame, &params).expect("grid");
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("grid.geojson");
        let crs = crs_member(&Crs::epsg(32614));
        write_grid(&path, &cells, Some(&crs)).expect("write");

        let layer = read_vector(&path).expect("read");
        assert_eq!(layer.regions.len(), 6);
        assert_eq!(layer.crs, Some(crs));
        let last = &layer.regions[5];
        assert_eq!(last.properties["label"], json!("(2,3)"));
        assert_eq!(last.properties["id"], json!(5));
        let text = fs::read_to_string(&path).expect("text");
        let value: JsonValue = serde_json::from_str(&text).expect("json");
        let ring = &value["features"][0]["geometry"]["coordinates"][0];
        assert_eq!(ring[0], ring[4]);
    }

    #[test]
    fn points_file_preserves_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("points.geojson");
        let pts = [Point2::new(1.0, 2.0), Point2::new(3.0, 4.0), Point2::new(5.0, 6.0)];
        points_to_geojson(&path, &pts, Some(&Crs::epsg(4326))).expect("write");
        let (back, crs) = read_points(&path).expect("read");
        assert_eq!(back, pts.to_vec());
        assert_eq!(
            crs.as_ref().and_then(crs_from_member),
            Some(Crs::epsg(4326))
        );
    }

    #[test]
    fn short_shapes_are_skipped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("shapes.geojson");
        let square = Ring::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ]);
        let line = Ring::new(vec![Point2::new(0.0, 0.0), Point2::new(1.0, 1.0)]);
        shapes_to_geojson(&path, &[square, line], None).expect("write");
        let layer = read_vector(&path).expect("read");
        assert_eq!(layer.regions.len(), 1);
        assert!(layer.crs.is_none());
    }
}
