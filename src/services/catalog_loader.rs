use serde::Deserialize;
use std::io::Read;
use std::path::Path;

use crate::error::AppResult;
use crate::models::FoodItem;

const ZOMATO_SEARCH_URL: &str = "https://www.zomato.com/search";

/// One row of the food/restaurant dataset, before cleanup
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(default)]
    name: String,
    #[serde(default)]
    ingredients: String,
    #[serde(default)]
    diet: String,
    #[serde(default)]
    prep_time: String,
    #[serde(default)]
    cook_time: String,
    #[serde(default)]
    flavor_profile: String,
    #[serde(default)]
    course: String,
    #[serde(default)]
    state: String,
    #[serde(default)]
    region: String,
    #[serde(default)]
    img_url: String,
    #[serde(default)]
    restaurant: String,
    #[serde(default)]
    zomato_link: String,
}

/// Loads the catalog from a CSV file with a header row
pub fn load_catalog(path: impl AsRef<Path>) -> AppResult<Vec<FoodItem>> {
    let path = path.as_ref();
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)?;

    let items = read_rows(reader)?;
    tracing::info!(path = %path.display(), items = items.len(), "Catalog loaded");
    Ok(items)
}

/// Parses catalog CSV from any reader
pub fn parse_catalog<R: Read>(input: R) -> AppResult<Vec<FoodItem>> {
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(input);
    read_rows(reader)
}

fn read_rows<R: Read>(mut reader: csv::Reader<R>) -> AppResult<Vec<FoodItem>> {
    let mut items = Vec::new();

    for (index, row) in reader.deserialize::<CsvRow>().enumerate() {
        let row = row?;
        // Header is line 1
        let line = index + 2;

        if row.name.is_empty() {
            tracing::debug!(line, "Skipping row without a name");
            continue;
        }

        items.push(into_food_item(row, line));
    }

    Ok(items)
}

fn into_food_item(row: CsvRow, line: usize) -> FoodItem {
    // Empty pieces are kept: they count towards the ingredient total
    let ingredients = row
        .ingredients
        .split(',')
        .map(|ingredient| ingredient.trim().to_string())
        .collect();

    let zomato_link = if row.zomato_link.is_empty() {
        zomato_search_link(&row.restaurant)
    } else {
        row.zomato_link
    };

    FoodItem {
        prep_time: parse_minutes(&row.prep_time, "prep_time", &row.name, line),
        cook_time: parse_minutes(&row.cook_time, "cook_time", &row.name, line),
        name: row.name,
        ingredients,
        diet: row.diet,
        flavor_profile: row.flavor_profile,
        course: row.course,
        state: row.state,
        region: row.region,
        img_url: row.img_url,
        restaurant: row.restaurant,
        zomato_link,
    }
}

fn parse_minutes(raw: &str, field: &str, name: &str, line: usize) -> i32 {
    leading_integer(raw).unwrap_or_else(|| {
        tracing::warn!(line, field, value = %raw, item = %name, "Unparseable time, using 0");
        0
    })
}

/// Reads the integer at the start of `raw`, ignoring whatever follows it
///
/// `"45.0"` gives 45 and `"30 min"` gives 30. `None` when no digit leads the
/// value or the number does not fit in an `i32`.
fn leading_integer(raw: &str) -> Option<i32> {
    let raw = raw.trim_start();
    let sign_len = usize::from(raw.starts_with(['-', '+']));
    let digits_len = raw[sign_len..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();

    if digits_len == 0 {
        return None;
    }
    raw[..sign_len + digits_len].parse().ok()
}

/// Search link used when the dataset has no direct restaurant link
pub fn zomato_search_link(restaurant: &str) -> String {
    reqwest::Url::parse_with_params(ZOMATO_SEARCH_URL, &[("q", restaurant)])
        .map(String::from)
        .unwrap_or_else(|_| ZOMATO_SEARCH_URL.to_string())
}
