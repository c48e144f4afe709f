use thiserror::Error;
use wasm_bindgen::JsValue;

use crate::dataset::Tier;

/// 地图引擎错误
#[derive(Debug, Error)]
pub enum MapError {
    #[error("failed to parse GeoJSON: {0}")]
    InvalidGeoJson(#[from] geojson::Error),

    #[error("dataset is not a FeatureCollection")]
    NotAFeatureCollection,

    #[error("feature #{position} has no geometry")]
    MissingGeometry { position: usize },

    /// 只支持 Point / LineString / Polygon / MultiPolygon
    #[error("unsupported geometry type: {kind}")]
    UnsupportedGeometry { kind: &'static str },

    #[error("coordinate out of range: ({lon}, {lat})")]
    CoordinateOutOfRange { lon: f64, lat: f64 },

    #[error("can not find feature.id or feature.properties.wb_a2 for feature #{position}")]
    MissingIdentifier { position: usize },

    #[error("duplicate feature id: {id}")]
    DuplicateIdentifier { id: String },

    #[error("no dataset registered for tier {0}")]
    DatasetUnavailable(Tier),

    #[error("invalid options: {0}")]
    InvalidOptions(String),

    #[error("raster snapshot failed: {0}")]
    Raster(String),

    #[error("serialization failed: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, MapError>;

impl From<MapError> for JsValue {
    fn from(err: MapError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

impl From<serde_json::Error> for MapError {
    fn from(err: serde_json::Error) -> Self {
        MapError::InvalidOptions(err.to_string())
    }
}

impl From<rmp_serde::encode::Error> for MapError {
    fn from(err: rmp_serde::encode::Error) -> Self {
        MapError::Serialization(err.to_string())
    }
}
