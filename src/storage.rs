//! Persistence adapter: saved-state documents, export files and imports
//!
//! The saved document is a single JSON object stored under [`STORAGE_KEY`].
//! Keyed collections are written as `[name, value]` pairs so their order
//! survives a round trip. Loading merges onto whatever state is already in
//! memory: absent fields keep their current value, the cost table and design
//! merge field by field, and every other field is replaced wholesale.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::costs::CostTable;
use crate::db;
use crate::error::{FarmError, Result};
use crate::models::{
    DesignParameters, PlantProfile, RecentCalculation, ScenarioResult, ShopItem, Suggestion,
};
use crate::state::{upsert_by, AppState};

/// Key the application state is stored under
pub const STORAGE_KEY: &str = "farmCalculatorData";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SavedData<'a> {
    plant_profiles: Vec<(&'a str, &'a PlantProfile)>,
    cost_profile: &'a CostTable,
    design_params: &'a DesignParameters,
    recent_calculations: &'a [RecentCalculation],
    comparison_data: &'a [ScenarioResult],
    shop_items: Vec<(&'a str, &'a ShopItem)>,
    suggestions: &'a [Suggestion],
    #[serde(skip_serializing_if = "Option::is_none")]
    export_date: Option<DateTime<Utc>>,
}

impl<'a> SavedData<'a> {
    fn new(state: &'a AppState, export_date: Option<DateTime<Utc>>) -> Self {
        Self {
            plant_profiles: state.plants.iter().map(|p| (p.name.as_str(), p)).collect(),
            cost_profile: &state.costs,
            design_params: &state.design,
            recent_calculations: &state.recent,
            comparison_data: &state.comparison,
            shop_items: state.shop_items.iter().map(|i| (i.name.as_str(), i)).collect(),
            suggestions: &state.suggestions,
            export_date,
        }
    }
}

/// Serialize the state in the compact form kept in the store
pub fn to_json(state: &AppState) -> Result<String> {
    Ok(serde_json::to_string(&SavedData::new(state, None))?)
}

/// Serialize the state for an export file, stamped with `exported_at`
pub fn to_export_json(state: &AppState, exported_at: DateTime<Utc>) -> Result<String> {
    Ok(serde_json::to_string_pretty(&SavedData::new(
        state,
        Some(exported_at),
    ))?)
}

/// Overlay `patch`'s top-level keys onto `base`
fn merge_object<T: Serialize + DeserializeOwned>(base: &T, patch: &Value) -> serde_json::Result<T> {
    let mut merged = serde_json::to_value(base)?;
    if let (Value::Object(target), Value::Object(updates)) = (&mut merged, patch) {
        for (key, value) in updates {
            target.insert(key.clone(), value.clone());
        }
    }
    serde_json::from_value(merged)
}

fn field<T: DeserializeOwned>(name: &'static str, value: &Value) -> Result<T> {
    T::deserialize(value).map_err(|source| FarmError::Field {
        field: name,
        source,
    })
}

/// Collect `[key, value]` pairs. The pair key names the entry, and a repeated
/// key overwrites the earlier entry in place.
fn keyed<T>(
    pairs: Vec<(String, T)>,
    name: impl Fn(&T) -> &str,
    rename: impl Fn(&mut T, String),
) -> Vec<T> {
    let mut items = Vec::with_capacity(pairs.len());
    for (key, mut item) in pairs {
        if name(&item) != key {
            debug!(key = %key, name = name(&item), "entry renamed to its key");
            rename(&mut item, key);
        }
        upsert_by(&mut items, item, &name);
    }
    items
}

/// Top-level fields, in the order they are merged
const FIELDS: [&str; 7] = [
    "plantProfiles",
    "costProfile",
    "designParams",
    "recentCalculations",
    "comparisonData",
    "shopItems",
    "suggestions",
];

/// Fields of `doc` that carry a value; `null` counts as absent
fn present_fields(doc: &Value) -> Vec<(&'static str, &Value)> {
    let Some(fields) = doc.as_object() else {
        debug!("saved data is not an object, nothing to merge");
        return Vec::new();
    };
    FIELDS
        .into_iter()
        .filter_map(|name| {
            fields
                .get(name)
                .filter(|v| !v.is_null())
                .map(|value| (name, value))
        })
        .collect()
}

fn apply_field(state: &mut AppState, name: &'static str, value: &Value) -> Result<()> {
    let invalid = |source: serde_json::Error| FarmError::Field { field: name, source };
    match name {
        "plantProfiles" => {
            let pairs: Vec<(String, PlantProfile)> = field(name, value)?;
            state.plants = keyed(pairs, |p| p.name.as_str(), |p, key| p.name = key);
        }
        "costProfile" => state.costs = merge_object(&state.costs, value).map_err(invalid)?,
        "designParams" => state.design = merge_object(&state.design, value).map_err(invalid)?,
        "recentCalculations" => state.recent = field(name, value)?,
        "comparisonData" => state.comparison = field(name, value)?,
        "shopItems" => {
            let pairs: Vec<(String, ShopItem)> = field(name, value)?;
            state.shop_items = keyed(pairs, |i| i.name.as_str(), |i, key| i.name = key);
        }
        "suggestions" => state.suggestions = field(name, value)?,
        _ => {}
    }
    Ok(())
}

/// Merge a parsed document into `state`.
///
/// Fields are applied one at a time in a fixed order. A field with the
/// wrong shape stops the merge there; fields before it stay applied.
pub fn merge_document(state: &mut AppState, doc: &Value) -> Result<()> {
    for (name, value) in present_fields(doc) {
        apply_field(state, name, value)?;
    }
    Ok(())
}

/// Write the state to the key-value store
pub fn save_to_storage(conn: &Connection, state: &AppState) -> Result<()> {
    db::set_value(conn, STORAGE_KEY, &to_json(state)?)?;
    debug!(key = STORAGE_KEY, "state saved");
    Ok(())
}

/// Merge saved state into `state`.
///
/// Returns false when nothing usable was stored. Corrupt saved data is
/// logged and otherwise ignored; only store failures are errors. A field
/// with the wrong shape keeps its current value while the other fields
/// still load.
pub fn load_from_storage(conn: &Connection, state: &mut AppState) -> Result<bool> {
    let Some(text) = db::get_value(conn, STORAGE_KEY)? else {
        debug!(key = STORAGE_KEY, "no saved state");
        return Ok(false);
    };

    let doc: Value = match serde_json::from_str(&text) {
        Ok(doc) => doc,
        Err(e) => {
            warn!("Failed to load data from storage: {e}");
            return Ok(false);
        }
    };

    for (name, value) in present_fields(&doc) {
        if let Err(e) = apply_field(state, name, value) {
            warn!(field = name, "Failed to load data from storage: {e}");
        }
    }
    Ok(true)
}

/// Merge an exported document into `state`.
///
/// Text that is not valid JSON is rejected before anything changes.
pub fn import_json(state: &mut AppState, text: &str) -> Result<()> {
    let doc: Value = serde_json::from_str(text)?;
    merge_document(state, &doc)
}

/// Import an export file and persist the result
pub fn import_file(conn: &Connection, state: &mut AppState, path: &Path) -> Result<()> {
    let text = fs::read_to_string(path)?;
    import_json(state, &text)?;
    save_to_storage(conn, state)?;
    info!(file = %path.display(), "data imported");
    Ok(())
}

/// File name used for an export made on `date`
pub fn export_file_name(date: NaiveDate) -> String {
    format!("farm-calculator-{}.json", date.format("%Y-%m-%d"))
}

/// Write an export file into `dir` and return its path
pub fn export_to_dir(state: &AppState, dir: &Path, now: DateTime<Utc>) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(export_file_name(now.date_naive()));
    fs::write(&path, to_export_json(state, now)?)?;
    info!(file = %path.display(), "data exported");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LayoutOverrides;
    use chrono::TimeZone;
    use serde_json::json;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 4, 12, 0, 0).unwrap()
    }

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();
        conn
    }

    fn busy_state() -> AppState {
        let mut state = AppState::default();
        state.upsert_plant(PlantProfile::new("Melon", 9.0, 0.1, 1.0));
        state
            .upsert_shop_item(ShopItem {
                name: "Bone Meal".to_string(),
                price: 5.0,
                category: "farming".to_string(),
                description: "growth boost".to_string(),
            })
            .unwrap();
        state.set_cost("rail", 80.0).unwrap();
        state
            .calculate("Wheat", &LayoutOverrides::default(), noon())
            .unwrap();
        state
            .add_to_comparison(
                "Sugar Cane",
                &LayoutOverrides {
                    pistons_per_plant: Some(true),
                    ..Default::default()
                },
            )
            .unwrap();
        // zero-yield plant: break-even is infinite
        state.upsert_plant(PlantProfile::new("Dead Bush", 1.0, 0.1, 0.0));
        state
            .add_to_comparison("Dead Bush", &LayoutOverrides::default())
            .unwrap();
        state.submit_suggestion("feature", "Kelp", "kelp farms", "medium", noon());
        state
    }

    #[test]
    fn storage_round_trip_is_lossless() {
        let conn = memory_db();
        let state = busy_state();
        save_to_storage(&conn, &state).unwrap();

        let mut loaded = AppState::default();
        assert!(load_from_storage(&conn, &mut loaded).unwrap());
        assert_eq!(loaded, state);
        assert!(loaded.comparison()[1].break_even_hours.is_infinite());
    }

    #[test]
    fn document_uses_pairs_for_keyed_collections() {
        let doc: Value = serde_json::from_str(&to_json(&busy_state()).unwrap()).unwrap();
        assert_eq!(doc["plantProfiles"][0][0], "Wheat");
        assert_eq!(doc["plantProfiles"][0][1]["sellPrice"], 7.0);
        assert_eq!(doc["shopItems"][0][0], "Bone Meal");
        assert_eq!(doc["costProfile"]["rail"], 80.0);
        assert!(doc.get("exportDate").is_none());
    }

    #[test]
    fn missing_store_entry_keeps_defaults() {
        let conn = memory_db();
        let mut state = AppState::default();
        assert!(!load_from_storage(&conn, &mut state).unwrap());
        assert_eq!(state, AppState::default());
    }

    #[test]
    fn corrupt_store_entry_is_ignored() {
        let conn = memory_db();
        db::set_value(&conn, STORAGE_KEY, "{not json").unwrap();

        let mut state = AppState::default();
        assert!(!load_from_storage(&conn, &mut state).unwrap());
        assert_eq!(state, AppState::default());
    }

    #[test]
    fn bad_stored_field_does_not_discard_the_rest() {
        let conn = memory_db();
        save_to_storage(&conn, &busy_state()).unwrap();

        let mut doc: Value =
            serde_json::from_str(&db::get_value(&conn, STORAGE_KEY).unwrap().unwrap()).unwrap();
        doc["recentCalculations"] = json!([{ "farmType": "Wheat" }]);
        db::set_value(&conn, STORAGE_KEY, &doc.to_string()).unwrap();

        let mut state = AppState::default();
        assert!(load_from_storage(&conn, &mut state).unwrap());
        assert!(state.recent_calculations().is_empty());
        assert_eq!(state.shop_items().len(), 1);
        assert_eq!(state.comparison().len(), 2);
        assert_eq!(state.suggestions().len(), 1);

        // the next command saves over the stored document
        state
            .calculate("Wheat", &LayoutOverrides::default(), noon())
            .unwrap();
        save_to_storage(&conn, &state).unwrap();

        let mut reloaded = AppState::default();
        load_from_storage(&conn, &mut reloaded).unwrap();
        assert_eq!(reloaded.shop_items()[0].name, "Bone Meal");
        assert_eq!(reloaded.recent_calculations().len(), 1);
    }

    #[test]
    fn pair_key_names_the_entry() {
        let mut state = AppState::default();
        let doc = json!({
            "plantProfiles": [
                ["Wheat", {
                    "name": "Wheat", "sellPrice": 7, "densityPerBlock": 0.2,
                    "yieldPerPlantPerHour": 0.5, "derivedProduct": false,
                    "extraProcessStationPerLayerCost": 0
                }],
                ["Kelp", {
                    "name": "Seaweed", "sellPrice": 2, "densityPerBlock": 1,
                    "yieldPerPlantPerHour": 3, "derivedProduct": false,
                    "extraProcessStationPerLayerCost": 0
                }],
                ["Wheat", {
                    "name": "Kelp", "sellPrice": 9, "densityPerBlock": 0.2,
                    "yieldPerPlantPerHour": 0.5, "derivedProduct": false,
                    "extraProcessStationPerLayerCost": 0
                }]
            ],
            "shopItems": [["Bone Meal", { "name": "bonemeal", "price": 4, "category": "farming" }]]
        });
        merge_document(&mut state, &doc).unwrap();

        let names: Vec<_> = state.plants().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Wheat", "Kelp"]);
        assert_eq!(state.plant("Wheat").unwrap().sell_price, 9.0);
        assert_eq!(state.plant("Kelp").unwrap().sell_price, 2.0);
        assert!(state.plant("Seaweed").is_none());
        assert_eq!(state.evaluate("Kelp", &LayoutOverrides::default()).unwrap().farm_type, "Kelp");

        state.set_cost("Bone Meal", 6.0).unwrap();
        assert_eq!(state.shop_items()[0].price, 6.0);
    }

    #[test]
    fn cost_and_design_merge_field_by_field() {
        let mut state = AppState::default();
        let doc = json!({
            "costProfile": { "hopper": 250 },
            "designParams": { "layers": 6, "pistonsPerPlant": true }
        });
        merge_document(&mut state, &doc).unwrap();

        assert_eq!(state.costs().hopper, 250.0);
        assert_eq!(state.costs().rail, 100.0);
        assert_eq!(state.design().layers, 6);
        assert!(state.design().pistons_per_plant);
        assert_eq!(state.design().plot_width, 74);
        assert_eq!(state.plants().len(), 6);
    }

    #[test]
    fn other_fields_replace_wholesale() {
        let mut state = busy_state();
        let doc = json!({
            "plantProfiles": [["Kelp", {
                "name": "Kelp", "sellPrice": 2, "densityPerBlock": 1,
                "yieldPerPlantPerHour": 3, "derivedProduct": false,
                "extraProcessStationPerLayerCost": 0
            }]],
            "comparisonData": [],
            "suggestions": null
        });
        merge_document(&mut state, &doc).unwrap();

        assert_eq!(state.plants().len(), 1);
        assert_eq!(state.plant("Kelp").unwrap().sell_price, 2.0);
        assert!(state.comparison().is_empty());
        assert_eq!(state.suggestions().len(), 1);
        assert_eq!(state.recent_calculations().len(), 1);
    }

    #[test]
    fn malformed_import_changes_nothing() {
        let mut state = busy_state();
        let before = state.clone();
        assert!(matches!(
            import_json(&mut state, "{\"plantProfiles\": ["),
            Err(FarmError::Parse(_))
        ));
        assert_eq!(state, before);
    }

    #[test]
    fn bad_field_stops_merge_after_earlier_fields() {
        let mut state = AppState::default();
        let text = r#"{
            "costProfile": { "chest": 42 },
            "designParams": { "layers": "many" },
            "suggestions": []
        }"#;
        let err = import_json(&mut state, text).unwrap_err();
        assert!(matches!(err, FarmError::Field { field: "designParams", .. }));
        assert_eq!(state.costs().chest, 42.0);
        assert_eq!(state.design().layers, 2);
    }

    #[test]
    fn browser_saved_state_loads() {
        // Shape written by the web version: integer-valued floats, null
        // break-even, millisecond timestamps
        let text = r#"{
            "plantProfiles": [["Wheat", {"name":"Wheat","sellPrice":7,"densityPerBlock":0.2,"yieldPerPlantPerHour":0.5,"derivedProduct":false,"extraProcessStationPerLayerCost":0}]],
            "costProfile": {"redstoneTorch":10,"repeater":1000,"comparator":1000,"chest":100,"smoker":1000,"piston":1000,"dispenser":1000,"dropper":1000,"observer":1000,"minecart":100,"hopper":500,"rail":100,"leverButton":1000,"redstoneLamp":100,"furnace":0},
            "designParams": {"plotWidth":74,"plotDepth":74,"layers":2,"lanes":10,"observerShare":16,"pistonsPerPlant":false,"includeUnloaders":true,"budget":2000000},
            "recentCalculations": [{"farmType":"Wheat","layers":2,"plantsPerLayer":1095,"totalPlants":2190,"costPerLayer":86200,"totalCost":172400,"revenuePerPlantPerHour":3.5,"revenuePerHourTotal":7665,"breakEvenHours":22.49,"underBudget":true,"timestamp":"2025-01-02T03:04:05.678Z"}],
            "comparisonData": [{"farmType":"Wheat","layers":2,"plantsPerLayer":1095,"totalPlants":2190,"costPerLayer":86200,"totalCost":172400,"revenuePerPlantPerHour":0,"revenuePerHourTotal":0,"breakEvenHours":null,"underBudget":true}],
            "shopItems": [],
            "suggestions": []
        }"#;
        let mut state = AppState::default();
        import_json(&mut state, text).unwrap();

        assert_eq!(state.plants().len(), 1);
        assert_eq!(state.costs().furnace, 0.0);
        assert_eq!(state.recent_calculations()[0].result.total_plants, 2190);
        assert!(state.comparison()[0].break_even_hours.is_infinite());
    }

    #[test]
    fn export_names_and_stamps_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = export_to_dir(&busy_state(), dir.path(), noon()).unwrap();
        assert_eq!(path.file_name().unwrap(), "farm-calculator-2025-07-04.json");

        let doc: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(doc["exportDate"], "2025-07-04T12:00:00Z");
    }

    #[test]
    fn export_then_import_reproduces_results() {
        let dir = tempfile::tempdir().unwrap();
        let conn = memory_db();
        let original = busy_state();
        let path = export_to_dir(&original, dir.path(), noon()).unwrap();

        let mut restored = AppState::default();
        import_file(&conn, &mut restored, &path).unwrap();
        assert_eq!(restored, original);

        let overrides = LayoutOverrides::default();
        assert_eq!(
            restored.evaluate("Melon", &overrides).unwrap(),
            original.evaluate("Melon", &overrides).unwrap()
        );
        assert!(db::get_value(&conn, STORAGE_KEY).unwrap().is_some());
    }
}
