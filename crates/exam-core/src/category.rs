//! Exam categories and category-keyed maps.

use serde::de::{DeserializeOwned, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::{Index, IndexMut};

/// One of the five fixed topical buckets of the exam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    PrincipesValeurs,
    SystemeInstitutionnel,
    DroitsDevoirs,
    HistoireGeographieCulture,
    VivreSociete,
}

impl Category {
    /// All categories in display order.
    pub const ALL: [Category; 5] = [
        Self::PrincipesValeurs,
        Self::SystemeInstitutionnel,
        Self::DroitsDevoirs,
        Self::HistoireGeographieCulture,
        Self::VivreSociete,
    ];

    /// Stable key used in persisted data.
    pub fn key(&self) -> &'static str {
        match self {
            Self::PrincipesValeurs => "principes-valeurs",
            Self::SystemeInstitutionnel => "systeme-institutionnel",
            Self::DroitsDevoirs => "droits-devoirs",
            Self::HistoireGeographieCulture => "histoire-geographie-culture",
            Self::VivreSociete => "vivre-societe",
        }
    }

    /// Get display name.
    pub fn label(&self) -> &'static str {
        match self {
            Self::PrincipesValeurs => "Principes et valeurs de la République",
            Self::SystemeInstitutionnel => "Système institutionnel et politique",
            Self::DroitsDevoirs => "Droits et devoirs",
            Self::HistoireGeographieCulture => "Histoire, géographie et culture",
            Self::VivreSociete => "Vivre dans la société française",
        }
    }

    /// Parse from a persisted key.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.key() == key)
    }

    fn position(self) -> usize {
        match self {
            Self::PrincipesValeurs => 0,
            Self::SystemeInstitutionnel => 1,
            Self::DroitsDevoirs => 2,
            Self::HistoireGeographieCulture => 3,
            Self::VivreSociete => 4,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// A value for every category.
///
/// Backed by a fixed array, so a map with a missing category cannot exist.
/// Serialized as a JSON object keyed by [`Category::key`]. Deserialization
/// merges per key with `T::default()`: missing or malformed categories get
/// the default value and unknown keys are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CategoryMap<T> {
    values: [T; 5],
}

impl<T> CategoryMap<T> {
    /// Build a map by computing a value for every category.
    pub fn from_fn(mut f: impl FnMut(Category) -> T) -> Self {
        Self {
            values: Category::ALL.map(&mut f),
        }
    }

    pub fn get(&self, category: Category) -> &T {
        &self.values[category.position()]
    }

    pub fn get_mut(&mut self, category: Category) -> &mut T {
        &mut self.values[category.position()]
    }

    /// Iterate in display order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, &T)> {
        Category::ALL.into_iter().zip(self.values.iter())
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.values.iter()
    }
}

impl<T: Default> CategoryMap<T> {
    /// Merge a partial keyed map over defaults.
    pub fn from_partial(mut partial: BTreeMap<String, T>) -> Self {
        Self::from_fn(|category| partial.remove(category.key()).unwrap_or_default())
    }
}

impl<T> Index<Category> for CategoryMap<T> {
    type Output = T;

    fn index(&self, category: Category) -> &T {
        self.get(category)
    }
}

impl<T> IndexMut<Category> for CategoryMap<T> {
    fn index_mut(&mut self, category: Category) -> &mut T {
        self.get_mut(category)
    }
}

impl<T: Serialize> Serialize for CategoryMap<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Category::ALL.len()))?;
        for (category, value) in self.iter() {
            map.serialize_entry(category.key(), value)?;
        }
        map.end()
    }
}

impl<'de, T: DeserializeOwned + Default> Deserialize<'de> for CategoryMap<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, serde_json::Value>::deserialize(deserializer)?;
        let partial = raw
            .into_iter()
            .filter_map(|(key, value)| serde_json::from_value(value).ok().map(|v| (key, v)))
            .collect();
        Ok(Self::from_partial(partial))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_roundtrip() {
        for category in Category::ALL {
            assert_eq!(Category::from_key(category.key()), Some(category));
        }
        assert_eq!(Category::from_key("economie"), None);
    }

    #[test]
    fn test_serde_key_matches_key() {
        let json = serde_json::to_string(&Category::HistoireGeographieCulture).unwrap();
        assert_eq!(json, "\"histoire-geographie-culture\"");
    }

    #[test]
    fn test_partial_map_fills_missing_categories() {
        let map: CategoryMap<u32> =
            serde_json::from_str(r#"{"droits-devoirs": 7, "unknown": 3}"#).unwrap();

        assert_eq!(map[Category::DroitsDevoirs], 7);
        assert_eq!(map[Category::PrincipesValeurs], 0);
        assert_eq!(map.values().count(), 5);
    }

    #[test]
    fn test_map_serializes_every_key() {
        let map = CategoryMap::from_fn(|c| c.key().len());
        let value = serde_json::to_value(map).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object.len(), 5);
        assert_eq!(object["vivre-societe"], 13);
    }
}
