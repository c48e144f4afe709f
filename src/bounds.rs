use geo::BoundingRect;
use geo_types::Geometry;

use crate::error::Result;
use crate::projection::{ensure_supported, project_point};
use crate::types::{BoundingBox, MapFeature};

/// 欧洲范围（EPSG:4326）
pub const REGION_LON_MIN: f64 = -31.266001;
pub const REGION_LAT_MIN: f64 = 34.5428;
pub const REGION_LON_MAX: f64 = 39.869301;
pub const REGION_LAT_MAX: f64 = 71.185474;

/// 单个几何的边界框
///
/// Point 得到退化边界框；
/// LineString / Polygon / MultiPolygon 扫描所有环的所有顶点。
/// 没有顶点的几何返回 `None`，不支持的类型直接报错。
pub fn bounds_of_geometry(geometry: &Geometry<f64>) -> Result<Option<BoundingBox>> {
    ensure_supported(geometry)?;

    let rect = match geometry {
        Geometry::Point(point) => return Ok(Some(BoundingBox::from_point(point.x(), point.y()))),
        Geometry::LineString(line) => line.bounding_rect(),
        Geometry::Polygon(polygon) => polygon.bounding_rect(),
        Geometry::MultiPolygon(multi) => multi.bounding_rect(),
        _ => None,
    };

    Ok(rect.map(|r| BoundingBox::new(r.min().x, r.max().x, r.min().y, r.max().y)))
}

/// 合并所有要素的边界框，没有要素时返回单位正方形
pub fn bounds_of_features<'a, I>(features: I) -> Result<BoundingBox>
where
    I: IntoIterator<Item = &'a MapFeature>,
{
    let mut total: Option<BoundingBox> = None;

    for feature in features {
        if let Some(bbox) = bounds_of_geometry(&feature.geometry)? {
            total = Some(match total {
                Some(current) => current.union(&bbox),
                None => bbox,
            });
        }
    }

    Ok(total.unwrap_or_else(BoundingBox::empty))
}

/// 欧洲范围（投影后）
pub fn bounds_of_region() -> BoundingBox {
    let (min_x, min_y) = project_point(REGION_LON_MIN, REGION_LAT_MIN);
    let (max_x, max_y) = project_point(REGION_LON_MAX, REGION_LAT_MAX);
    BoundingBox::new(min_x, max_x, min_y, max_y)
}
