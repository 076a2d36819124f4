use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::models::FoodItem;

/// Number of positions in a [`FeatureVector`]
pub const FEATURE_DIMENSIONS: usize = 6;

/// Code returned for categories missing from a table
pub const UNKNOWN_CATEGORY_CODE: f64 = 0.0;

const DIET_CODES: &[(&str, f64)] = &[("vegetarian", 1.0), ("non vegetarian", 0.0)];

const COURSE_CODES: &[(&str, f64)] = &[
    ("main course", 1.0),
    ("dessert", 2.0),
    ("starter", 3.0),
    ("beverage", 4.0),
    ("snack", 5.0),
    ("breakfast", 6.0),
    ("lunch", 7.0),
    ("dinner", 8.0),
];

const FLAVOR_CODES: &[(&str, f64)] = &[
    ("sweet", 1.0),
    ("spicy", 2.0),
    ("bitter", 3.0),
    ("sour", 4.0),
    ("umami", 5.0),
    ("salty", 6.0),
    ("neutral", 7.0),
];

/// Fixed-length numeric encoding of a food item
///
/// Positions: `[diet, course, flavor, prep_hours, cook_hours, ingredient_count]`.
/// Similarity is computed positionally, so the order is part of the contract.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; FEATURE_DIMENSIONS]);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

/// Serialized shape of a [`CategoryTable`]
#[derive(Debug, Deserialize)]
struct CategoryTableDef {
    codes: HashMap<String, f64>,
    #[serde(default)]
    default_code: Option<f64>,
    #[serde(default)]
    case_insensitive: bool,
}

/// Maps categorical values to numeric codes
///
/// Values absent from the table encode as `default_code`, which is shared with
/// any real category mapped to the same number. Two different unknown values
/// are therefore indistinguishable after encoding.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "CategoryTableDef")]
pub struct CategoryTable {
    codes: HashMap<String, f64>,
    default_code: f64,
    case_insensitive: bool,
}

impl From<CategoryTableDef> for CategoryTable {
    fn from(def: CategoryTableDef) -> Self {
        let entries: Vec<(String, f64)> = def.codes.into_iter().collect();
        Self::build(
            entries,
            def.default_code.unwrap_or(UNKNOWN_CATEGORY_CODE),
            def.case_insensitive,
        )
    }
}

impl CategoryTable {
    /// Table matched on the exact value
    pub fn exact(entries: &[(&str, f64)]) -> Self {
        Self::build(owned(entries), UNKNOWN_CATEGORY_CODE, false)
    }

    /// Table matched after lowercasing the value
    pub fn case_insensitive(entries: &[(&str, f64)]) -> Self {
        Self::build(owned(entries), UNKNOWN_CATEGORY_CODE, true)
    }

    /// Replaces the code used for unmapped values
    pub fn with_default(mut self, default_code: f64) -> Self {
        self.default_code = default_code;
        self
    }

    fn build(entries: Vec<(String, f64)>, default_code: f64, case_insensitive: bool) -> Self {
        let codes = entries
            .into_iter()
            .map(|(name, code)| {
                let name = if case_insensitive {
                    name.to_lowercase()
                } else {
                    name
                };
                (name, code)
            })
            .collect();

        Self {
            codes,
            default_code,
            case_insensitive,
        }
    }

    /// Looks up the code for `value`, falling back to the default code
    pub fn code(&self, value: &str) -> f64 {
        let found = if self.case_insensitive {
            self.codes.get(&value.to_lowercase())
        } else {
            self.codes.get(value)
        };
        found.copied().unwrap_or(self.default_code)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

fn owned(entries: &[(&str, f64)]) -> Vec<(String, f64)> {
    entries
        .iter()
        .map(|(name, code)| (name.to_string(), *code))
        .collect()
}

/// The category tables read by the encoder
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EncoderTables {
    pub diet: CategoryTable,
    pub course: CategoryTable,
    pub flavor_profile: CategoryTable,
}

impl Default for EncoderTables {
    fn default() -> Self {
        Self {
            diet: CategoryTable::exact(DIET_CODES),
            course: CategoryTable::case_insensitive(COURSE_CODES),
            flavor_profile: CategoryTable::case_insensitive(FLAVOR_CODES),
        }
    }
}

impl EncoderTables {
    /// Loads tables from a JSON document
    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
        let tables = serde_json::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("Invalid category tables in {}: {}", path.display(), e))?;
        Ok(tables)
    }
}

/// Turns food items into feature vectors
#[derive(Debug, Clone, Default)]
pub struct FeatureEncoder {
    tables: EncoderTables,
}

impl FeatureEncoder {
    pub fn new(tables: EncoderTables) -> Self {
        Self { tables }
    }

    /// Encodes an item. Never fails: unmapped categories take the table's
    /// default code and times pass through without clamping.
    pub fn encode(&self, item: &FoodItem) -> FeatureVector {
        // Raw list length; duplicates are counted.
        let ingredient_count = item.ingredients.len() as f64;

        FeatureVector([
            self.tables.diet.code(&item.diet),
            self.tables.course.code(&item.course),
            self.tables.flavor_profile.code(&item.flavor_profile),
            f64::from(item.prep_time) / 60.0,
            f64::from(item.cook_time) / 60.0,
            ingredient_count,
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::food;

    #[test]
    fn test_encode_dessert() {
        let encoder = FeatureEncoder::default();
        let item = food("A", "R1", "vegetarian", "dessert", "sweet", 10, 20, &["sugar", "flour"]);

        let vector = encoder.encode(&item);
        assert_eq!(vector.as_slice().len(), FEATURE_DIMENSIONS);
        assert_eq!(
            vector.as_slice(),
            &[1.0, 2.0, 1.0, 10.0 / 60.0, 20.0 / 60.0, 2.0]
        );
    }

    #[test]
    fn test_course_and_flavor_are_case_insensitive() {
        let encoder = FeatureEncoder::default();
        let item = food("X", "R", "non vegetarian", "Main Course", "SPICY", 0, 0, &[]);

        let vector = encoder.encode(&item);
        assert_eq!(vector.as_slice()[0], 0.0);
        assert_eq!(vector.as_slice()[1], 1.0);
        assert_eq!(vector.as_slice()[2], 2.0);
    }

    #[test]
    fn test_diet_lookup_is_exact() {
        let encoder = FeatureEncoder::default();
        let item = food("X", "R", "Vegetarian", "dessert", "sweet", 0, 0, &[]);
        assert_eq!(encoder.encode(&item).as_slice()[0], UNKNOWN_CATEGORY_CODE);
    }

    #[test]
    fn test_unknown_categories_share_default_code() {
        let encoder = FeatureEncoder::default();
        let a = food("X", "R", "vegan", "-1", "-1", 0, 0, &[]);
        let b = food("Y", "R", "pescatarian", "brunch", "smoky", 0, 0, &[]);

        assert_eq!(encoder.encode(&a), encoder.encode(&b));
        assert_eq!(encoder.encode(&a).as_slice()[1], UNKNOWN_CATEGORY_CODE);
    }

    #[test]
    fn test_times_are_not_clamped() {
        let encoder = FeatureEncoder::default();
        let item = food("X", "R", "vegetarian", "snack", "salty", -1, 6000, &[]);

        let vector = encoder.encode(&item);
        assert_eq!(vector.as_slice()[3], -1.0 / 60.0);
        assert_eq!(vector.as_slice()[4], 100.0);
    }

    #[test]
    fn test_ingredient_count_keeps_duplicates() {
        let encoder = FeatureEncoder::default();
        let item = food("X", "R", "vegetarian", "snack", "salty", 0, 0, &["salt", "salt", "rice"]);
        assert_eq!(encoder.encode(&item).as_slice()[5], 3.0);
    }

    #[test]
    fn test_tables_from_json() {
        let json = r#"{
            "diet": { "codes": { "vegetarian": 1, "non vegetarian": 0, "vegan": 2 } },
            "course": { "codes": { "Dessert": 2, "Brunch": 9 }, "case_insensitive": true },
            "flavor_profile": { "codes": { "sweet": 1 }, "default_code": 7, "case_insensitive": true }
        }"#;

        let tables: EncoderTables = serde_json::from_str(json).unwrap();
        assert_eq!(tables.diet.code("vegan"), 2.0);
        assert_eq!(tables.diet.code("Vegan"), 0.0);
        assert_eq!(tables.course.code("brunch"), 9.0);
        assert_eq!(tables.course.code("DESSERT"), 2.0);
        assert_eq!(tables.flavor_profile.code("smoky"), 7.0);

        let encoder = FeatureEncoder::new(tables);
        let item = food("X", "R", "vegan", "brunch", "sweet", 60, 0, &["a"]);
        assert_eq!(encoder.encode(&item).as_slice(), &[2.0, 9.0, 1.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_bundled_tables_match_builtin() {
        let tables = EncoderTables::from_path("data/category_tables.json").unwrap();
        assert_eq!(tables, EncoderTables::default());
    }

    #[test]
    fn test_builtin_table_sizes() {
        let tables = EncoderTables::default();
        assert_eq!(tables.diet.len(), 2);
        assert_eq!(tables.course.len(), 8);
        assert_eq!(tables.flavor_profile.len(), 7);
        assert_eq!(
            CategoryTable::exact(&[]).with_default(3.0).code("anything"),
            3.0
        );
    }
}
