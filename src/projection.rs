use geo::{CoordsIter, MapCoordsInPlace};
use geo_types::{Coord, Geometry};
use std::f64::consts::PI;

use crate::error::{MapError, Result};

/// WGS84 长半轴（米）
pub const EARTH_RADIUS: f64 = 6378137.0;

/// Web Mercator 能表示的最大纬度
pub const MAX_LATITUDE: f64 = 85.0511287798;

/// Web Mercator 投影（EPSG:3857）
/// 将经纬度（WGS84）转换为平面坐标（米）
pub fn project_point(lon: f64, lat: f64) -> (f64, f64) {
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);

    let lon_rad = lon * (PI / 180.0);
    let lat_rad = lat * (PI / 180.0);

    let x = lon_rad * EARTH_RADIUS;
    let y = lat_rad.tan().asinh() * EARTH_RADIUS;

    (x, y)
}

/// 批量投影坐标点
pub fn project_points(coords: &[(f64, f64)]) -> Vec<(f64, f64)> {
    coords
        .iter()
        .map(|(lon, lat)| project_point(*lon, *lat))
        .collect()
}

/// 几何类型名（用于错误信息）
pub fn geometry_kind(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

/// 只接受 Point / LineString / Polygon / MultiPolygon
pub fn ensure_supported(geometry: &Geometry<f64>) -> Result<()> {
    match geometry {
        Geometry::Point(_)
        | Geometry::LineString(_)
        | Geometry::Polygon(_)
        | Geometry::MultiPolygon(_) => Ok(()),
        other => Err(MapError::UnsupportedGeometry {
            kind: geometry_kind(other),
        }),
    }
}

/// 原地投影几何的所有顶点（包括所有环和子多边形）
pub fn project_geometry(geometry: &mut Geometry<f64>) -> Result<()> {
    ensure_supported(geometry)?;

    if let Some(c) = geometry
        .coords_iter()
        .find(|c| !(-180.0..=180.0).contains(&c.x) || !(-90.0..=90.0).contains(&c.y))
    {
        return Err(MapError::CoordinateOutOfRange { lon: c.x, lat: c.y });
    }

    geometry.map_coords_in_place(|c| {
        let (x, y) = project_point(c.x, c.y);
        Coord { x, y }
    });

    Ok(())
}
