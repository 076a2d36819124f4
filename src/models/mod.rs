use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub mod chat;

pub use chat::{ChatMessage, ChatReply, ChatRole};

/// A dish served by a restaurant, as it appears in the catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FoodItem {
    pub name: String,
    pub ingredients: Vec<String>,
    /// "vegetarian" or "non vegetarian"; other values are kept as-is
    pub diet: String,
    /// Minutes
    pub prep_time: i32,
    /// Minutes
    pub cook_time: i32,
    pub flavor_profile: String,
    pub course: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub img_url: String,
    pub restaurant: String,
    #[serde(default)]
    pub zomato_link: String,
}

impl FoodItem {
    /// Identity of the item within the catalog
    pub fn key(&self) -> FoodKey {
        FoodKey {
            name: self.name.clone(),
            restaurant: self.restaurant.clone(),
        }
    }

    /// Checks whether this item is identified by `key`
    pub fn matches(&self, key: &FoodKey) -> bool {
        self.name == key.name && self.restaurant == key.restaurant
    }
}

/// Uniqueness key of a food item: the same dish name may be served by
/// several restaurants
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FoodKey {
    pub name: String,
    pub restaurant: String,
}

impl Display for FoodKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.name, self.restaurant)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_food_key_display() {
        let key = FoodKey {
            name: "Gulab jamun".to_string(),
            restaurant: "Haldiram's".to_string(),
        };
        assert_eq!(format!("{}", key), "Gulab jamun-Haldiram's");
    }

    #[test]
    fn test_key_and_matches() {
        let item = fixtures::food("Dosa", "Sagar", "vegetarian", "breakfast", "savory", 5, 10, &[]);
        let key = item.key();
        assert!(item.matches(&key));

        let other = FoodKey {
            name: "Dosa".to_string(),
            restaurant: "Udupi".to_string(),
        };
        assert!(!item.matches(&other));
    }

    #[test]
    fn test_food_item_deserializes_without_optional_fields() {
        let json = r#"{
            "name": "Jalebi",
            "ingredients": ["maida", "sugar"],
            "diet": "vegetarian",
            "prep_time": 10,
            "cook_time": 50,
            "flavor_profile": "sweet",
            "course": "dessert",
            "restaurant": "Chandni Chowk"
        }"#;

        let item: FoodItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.name, "Jalebi");
        assert_eq!(item.ingredients.len(), 2);
        assert!(item.state.is_empty());
        assert!(item.zomato_link.is_empty());
    }
}
