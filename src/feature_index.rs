use std::collections::HashMap;

use crate::error::{MapError, Result};
use crate::types::{FeatureCollection, MapFeature};

/// 要素 id：优先 feature.id，其次 properties.wb_a2
pub fn feature_id(feature: &MapFeature, position: usize) -> Result<&str> {
    feature
        .id
        .as_deref()
        .or(feature.properties.country_code.as_deref())
        .ok_or(MapError::MissingIdentifier { position })
}

/// id -> 要素位置 的查找表，每次加载数据时整体重建
#[derive(Debug, Clone, Default)]
pub struct FeatureIndex {
    positions: HashMap<String, usize>,
}

impl FeatureIndex {
    pub fn build(collection: &FeatureCollection) -> Result<Self> {
        let mut positions = HashMap::with_capacity(collection.len());

        for (position, feature) in collection.features.iter().enumerate() {
            let id = feature_id(feature, position)?;
            if positions.insert(id.to_string(), position).is_some() {
                return Err(MapError::DuplicateIdentifier { id: id.to_string() });
            }
        }

        Ok(Self { positions })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.positions.contains_key(id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.positions.get(id).copied()
    }

    pub fn get<'a>(&self, collection: &'a FeatureCollection, id: &str) -> Option<&'a MapFeature> {
        self.position(id).and_then(|i| collection.features.get(i))
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// 按要素顺序返回所有 id
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<(&str, usize)> = self
            .positions
            .iter()
            .map(|(id, position)| (id.as_str(), *position))
            .collect();
        ids.sort_by_key(|(_, position)| *position);
        ids.into_iter().map(|(id, _)| id).collect()
    }
}
