use geo_types::{Geometry, Point};
use serde::{Deserialize, Serialize};

use crate::cities::CITIES;
use crate::dataset::Tier;
use crate::error::{MapError, Result};

/// 国家要素的 id 属性（没有 feature.id 时使用）
pub const ID_PROPERTY: &str = "wb_a2";

/// 边界框（投影后的坐标范围）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    /// 没有任何要素时使用的单位正方形
    pub fn empty() -> Self {
        Self::new(0.0, 1.0, 0.0, 1.0)
    }

    /// 退化边界框（单点）
    pub fn from_point(x: f64, y: f64) -> Self {
        Self::new(x, x, y, y)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// 合并两个边界框
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox::new(
            self.min_x.min(other.min_x),
            self.max_x.max(other.max_x),
            self.min_y.min(other.min_y),
            self.max_y.max(other.max_y),
        )
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}

/// 当前可见窗口（输出图像坐标系，受平移/缩放影响）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ViewBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn to_array(self) -> [f64; 4] {
        [self.x, self.y, self.width, self.height]
    }
}

/// 要素样式与标识属性
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureProperties {
    pub name: Option<String>,
    pub fill: Option<String>,
    pub stroke: Option<String>,
    pub stroke_width: Option<f64>,
    pub class: Option<String>,
    /// `wb_a2` 国家代码
    pub country_code: Option<String>,
}

impl FeatureProperties {
    /// 从 GeoJSON properties 中提取需要的字段
    pub fn from_json(props: Option<&serde_json::Map<String, serde_json::Value>>) -> Self {
        let Some(props) = props else {
            return Self::default();
        };
        let text = |key: &str| props.get(key).and_then(|v| v.as_str()).map(str::to_string);

        Self {
            name: text("name"),
            fill: text("fill"),
            stroke: text("stroke"),
            stroke_width: props.get("stroke-width").and_then(|v| v.as_f64()),
            class: text("class"),
            country_code: text(ID_PROPERTY),
        }
    }
}

/// 地图要素（国家或城市点）
#[derive(Debug, Clone, PartialEq)]
pub struct MapFeature {
    pub id: Option<String>,
    pub geometry: Geometry<f64>,
    pub properties: FeatureProperties,
}

impl MapFeature {
    /// 城市点要素，id 为 `Place-<name>`
    pub fn city(name: &str, lon: f64, lat: f64, fill: &str) -> Self {
        Self {
            id: Some(format!("Place-{}", name)),
            geometry: Geometry::Point(Point::new(lon, lat)),
            properties: FeatureProperties {
                name: Some(name.to_string()),
                fill: Some(fill.to_string()),
                stroke_width: Some(0.0),
                ..Default::default()
            },
        }
    }

    /// 显示名：name > id > "Not specified"
    pub fn title(&self) -> &str {
        self.properties
            .name
            .as_deref()
            .or(self.id.as_deref())
            .unwrap_or("Not specified")
    }
}

/// 要素集合
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureCollection {
    pub features: Vec<MapFeature>,
    cities_added: bool,
}

impl FeatureCollection {
    pub fn new(features: Vec<MapFeature>) -> Self {
        Self {
            features,
            cities_added: false,
        }
    }

    /// 解析 GeoJSON FeatureCollection
    pub fn from_geojson(source: &str) -> Result<Self> {
        let geojson: geojson::GeoJson = source.parse()?;
        let geojson::GeoJson::FeatureCollection(collection) = geojson else {
            return Err(MapError::NotAFeatureCollection);
        };

        let mut features = Vec::with_capacity(collection.features.len());
        for (position, feature) in collection.features.into_iter().enumerate() {
            let geometry = feature
                .geometry
                .ok_or(MapError::MissingGeometry { position })?;
            let geometry = Geometry::<f64>::try_from(geometry)?;

            let id = match feature.id {
                Some(geojson::feature::Id::String(s)) => Some(s),
                Some(geojson::feature::Id::Number(n)) => Some(n.to_string()),
                None => None,
            };

            features.push(MapFeature {
                id,
                geometry,
                properties: FeatureProperties::from_json(feature.properties.as_ref()),
            });
        }

        Ok(Self::new(features))
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn cities_added(&self) -> bool {
        self.cities_added
    }

    /// 追加城市点（同一个集合只追加一次）
    pub fn append_cities(&mut self, fill: &str) {
        if self.cities_added {
            return;
        }

        self.features.extend(
            CITIES
                .iter()
                .map(|city| MapFeature::city(city.name, city.lon, city.lat, fill)),
        );
        self.cities_added = true;
    }
}

/// 配色
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    #[serde(default = "default_country_fill")]
    pub country_fill: String,
    #[serde(default = "default_country_stroke")]
    pub country_stroke: String,
    #[serde(default = "default_country_stroke_width")]
    pub country_stroke_width: f64,
    #[serde(default = "default_highlight_fill")]
    pub highlight_fill: String,
    #[serde(default = "default_country_stroke")]
    pub highlight_stroke: String,
    #[serde(default = "default_country_stroke_width")]
    pub highlight_stroke_width: f64,
    #[serde(default = "default_city_fill")]
    pub city_fill: String,
    #[serde(default = "default_background")]
    pub background: String,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            country_fill: default_country_fill(),
            country_stroke: default_country_stroke(),
            country_stroke_width: default_country_stroke_width(),
            highlight_fill: default_highlight_fill(),
            highlight_stroke: default_country_stroke(),
            highlight_stroke_width: default_country_stroke_width(),
            city_fill: default_city_fill(),
            background: default_background(),
        }
    }
}

/// 地图配置（从 JS 传入）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapOptions {
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default = "default_width")]
    pub width: f64,
    #[serde(default = "default_height")]
    pub height: f64,
    #[serde(default)]
    pub tier: Tier,
    #[serde(default = "default_zoom_country")]
    pub zoom_country: bool,
    #[serde(default)]
    pub palette: Palette,
    /// 每次滚轮事件的缩放倍数
    #[serde(default = "default_wheel_step")]
    pub wheel_step: f64,
    /// 页面上元素的实际像素尺寸（默认等于输出尺寸）
    #[serde(default)]
    pub element_width: Option<f64>,
    #[serde(default)]
    pub element_height: Option<f64>,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            country: None,
            width: default_width(),
            height: default_height(),
            tier: Tier::default(),
            zoom_country: default_zoom_country(),
            palette: Palette::default(),
            wheel_step: default_wheel_step(),
            element_width: None,
            element_height: None,
        }
    }
}

impl MapOptions {
    pub fn from_json(json: &str) -> Result<Self> {
        let options: MapOptions = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.width.is_finite() && self.width > 0.0) {
            return Err(MapError::InvalidOptions(format!(
                "width must be positive, got {}",
                self.width
            )));
        }
        if !(self.height.is_finite() && self.height > 0.0) {
            return Err(MapError::InvalidOptions(format!(
                "height must be positive, got {}",
                self.height
            )));
        }
        if !(self.wheel_step.is_finite() && self.wheel_step > 1.0) {
            return Err(MapError::InvalidOptions(format!(
                "wheel_step must be greater than 1, got {}",
                self.wheel_step
            )));
        }
        for size in [self.element_width, self.element_height].into_iter().flatten() {
            if !(size.is_finite() && size > 0.0) {
                return Err(MapError::InvalidOptions(format!(
                    "element size must be positive, got {}",
                    size
                )));
            }
        }
        Ok(())
    }

    pub fn element_size(&self) -> (f64, f64) {
        (
            self.element_width.unwrap_or(self.width),
            self.element_height.unwrap_or(self.height),
        )
    }
}

fn default_width() -> f64 {
    200.0
}

fn default_height() -> f64 {
    110.0
}

fn default_zoom_country() -> bool {
    true
}

fn default_wheel_step() -> f64 {
    1.1
}

fn default_country_fill() -> String {
    "#d0d0d0".to_string()
}

fn default_country_stroke() -> String {
    "#a0a0a0".to_string()
}

fn default_country_stroke_width() -> f64 {
    0.1
}

fn default_highlight_fill() -> String {
    "#c0e0c0".to_string()
}

fn default_city_fill() -> String {
    "#808080".to_string()
}

fn default_background() -> String {
    "#ffffff".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r##"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "id": "FR",
                "properties": { "name": "France", "fill": "#ff0000" },
                "geometry": { "type": "Polygon", "coordinates": [[[0, 45], [5, 45], [5, 50], [0, 45]]] }
            },
            {
                "type": "Feature",
                "properties": { "wb_a2": "DE", "stroke-width": 0.5 },
                "geometry": { "type": "Point", "coordinates": [10, 51] }
            }
        ]
    }"##;

    #[test]
    fn test_from_geojson() {
        let collection = FeatureCollection::from_geojson(SAMPLE).unwrap();
        assert_eq!(collection.len(), 2);

        let france = &collection.features[0];
        assert_eq!(france.id.as_deref(), Some("FR"));
        assert_eq!(france.properties.fill.as_deref(), Some("#ff0000"));
        assert_eq!(france.title(), "France");

        let germany = &collection.features[1];
        assert_eq!(germany.id, None);
        assert_eq!(germany.properties.country_code.as_deref(), Some("DE"));
        assert_eq!(germany.properties.stroke_width, Some(0.5));
        assert_eq!(germany.title(), "Not specified");
    }

    #[test]
    fn test_from_geojson_rejects_single_feature() {
        let single = r#"{
            "type": "Feature",
            "properties": {},
            "geometry": { "type": "Point", "coordinates": [0, 0] }
        }"#;
        assert!(matches!(
            FeatureCollection::from_geojson(single),
            Err(MapError::NotAFeatureCollection)
        ));
    }

    #[test]
    fn test_append_cities_is_idempotent() {
        let mut collection = FeatureCollection::new(vec![]);
        collection.append_cities("#808080");
        collection.append_cities("#808080");

        assert!(collection.cities_added());
        assert_eq!(collection.len(), CITIES.len());

        let berlin = collection
            .features
            .iter()
            .filter(|f| f.id.as_deref() == Some("Place-Berlin"))
            .count();
        assert_eq!(berlin, 1);
    }

    #[test]
    fn test_bounding_box_union() {
        let a = BoundingBox::new(0.0, 1.0, 0.0, 1.0);
        let b = BoundingBox::new(-2.0, 0.5, 0.5, 3.0);
        assert_eq!(a.union(&b), BoundingBox::new(-2.0, 1.0, 0.0, 3.0));
        assert_eq!(a.center(), (0.5, 0.5));
    }

    #[test]
    fn test_options_defaults() {
        let options = MapOptions::from_json("{}").unwrap();
        assert_eq!(options.width, 200.0);
        assert_eq!(options.height, 110.0);
        assert_eq!(options.tier, Tier::Low);
        assert!(options.zoom_country);
        assert_eq!(options.palette.country_fill, "#d0d0d0");
        assert_eq!(options.element_size(), (200.0, 110.0));
    }

    #[test]
    fn test_options_validation() {
        assert!(MapOptions::from_json(r#"{"width": 0}"#).is_err());
        assert!(MapOptions::from_json(r#"{"wheel_step": 0.5}"#).is_err());
        assert!(MapOptions::from_json(r#"{"element_width": -1}"#).is_err());

        let options = MapOptions::from_json(r#"{"country": "de", "tier": "medium"}"#).unwrap();
        assert_eq!(options.country.as_deref(), Some("de"));
        assert_eq!(options.tier, Tier::Medium);
    }
}
