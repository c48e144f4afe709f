use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{MapError, Result};
use crate::feature_index::{FeatureIndex, feature_id};
use crate::projection::project_geometry;
use crate::types::{FeatureCollection, Palette};
use crate::utils::{time, time_end};

const EUROPE_LOW: &str = include_str!("../data/europe-low.geojson");
const EUROPE_MEDIUM: &str = include_str!("../data/europe-medium.geojson");
const EUROPE_HIGH: &str = include_str!("../data/europe-high.geojson");

/// 数据精度等级
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Low,
    Medium,
    High,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Low, Tier::Medium, Tier::High];

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Low => "low",
            Tier::Medium => "medium",
            Tier::High => "high",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Tier::Low),
            "medium" => Ok(Tier::Medium),
            "high" => Ok(Tier::High),
            other => Err(MapError::InvalidOptions(format!("unknown tier: {}", other))),
        }
    }
}

/// 各精度等级对应的 GeoJSON 数据源
#[derive(Debug, Clone, Default)]
pub struct DatasetCatalog {
    sources: HashMap<Tier, String>,
}

impl DatasetCatalog {
    /// 空目录（用于自定义数据）
    pub fn new() -> Self {
        Self::default()
    }

    /// 内置的欧洲国家边界数据
    pub fn bundled() -> Self {
        Self::new()
            .with_source(Tier::Low, EUROPE_LOW)
            .with_source(Tier::Medium, EUROPE_MEDIUM)
            .with_source(Tier::High, EUROPE_HIGH)
    }

    pub fn with_source(mut self, tier: Tier, geojson: impl Into<String>) -> Self {
        self.sources.insert(tier, geojson.into());
        self
    }

    pub fn source(&self, tier: Tier) -> Option<&str> {
        self.sources.get(&tier).map(String::as_str)
    }
}

/// 一次解析的结果：新的要素集合 + 索引 + 实际生效的选中国家
#[derive(Debug, Clone)]
pub struct Resolution {
    pub tier: Tier,
    pub collection: FeatureCollection,
    pub index: FeatureIndex,
    /// 选中的国家不在当前数据中时为 `None`
    pub selection: Option<String>,
}

/// 加载并准备某个精度等级的数据
pub struct DatasetResolver {
    catalog: DatasetCatalog,
    palette: Palette,
    prepared: HashMap<Tier, (FeatureCollection, FeatureIndex)>,
}

impl DatasetResolver {
    pub fn new(catalog: DatasetCatalog, palette: Palette) -> Self {
        Self {
            catalog,
            palette,
            prepared: HashMap::new(),
        }
    }

    /// 解析数据并给选中的国家加高亮样式
    pub fn resolve(&mut self, tier: Tier, selected: Option<&str>) -> Result<Resolution> {
        let (base, index) = self.prepared(tier)?;
        let mut collection = base.clone();
        let index = index.clone();

        let selection = selected
            .map(|code| code.trim().to_uppercase())
            .filter(|code| index.contains(code));

        if let Some(position) = selection.as_deref().and_then(|code| index.position(code)) {
            let properties = &mut collection.features[position].properties;
            properties.fill = Some(self.palette.highlight_fill.clone());
            properties.stroke = Some(self.palette.highlight_stroke.clone());
            properties.stroke_width = Some(self.palette.highlight_stroke_width);
        }

        match (selected, selection.as_deref()) {
            (Some(requested), None) => log::debug!(
                "country {} not available in tier {}, falling back",
                requested,
                tier
            ),
            (_, Some(code)) => log::debug!("highlighting {} in tier {}", code, tier),
            _ => {}
        }

        Ok(Resolution {
            tier,
            collection,
            index,
            selection,
        })
    }

    /// 追加城市、投影、写入 id（每个等级只做一次）
    fn prepared(&mut self, tier: Tier) -> Result<&(FeatureCollection, FeatureIndex)> {
        if !self.prepared.contains_key(&tier) {
            let source = self
                .catalog
                .source(tier)
                .ok_or(MapError::DatasetUnavailable(tier))?;

            time("dataset: prepare");
            let prepared = prepare(source, &self.palette);
            time_end("dataset: prepare");

            let prepared = prepared?;
            log::info!("prepared tier {}: {} features", tier, prepared.0.len());
            self.prepared.insert(tier, prepared);
        }

        self.prepared
            .get(&tier)
            .ok_or(MapError::DatasetUnavailable(tier))
    }
}

fn prepare(source: &str, palette: &Palette) -> Result<(FeatureCollection, FeatureIndex)> {
    let mut collection = FeatureCollection::from_geojson(source)?;
    collection.append_cities(&palette.city_fill);

    for (position, feature) in collection.features.iter_mut().enumerate() {
        project_geometry(&mut feature.geometry)?;
        let id = feature_id(feature, position)?.to_string();
        feature.id = Some(id);
    }

    let index = FeatureIndex::build(&collection)?;
    Ok((collection, index))
}
