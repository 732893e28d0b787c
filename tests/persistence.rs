use std::fs;
use std::path::Path;

use chrono::{TimeZone, Utc};
use rusqlite::Connection;
use tempfile::tempdir;

use farm_calculator::{
    db, exports, storage, AppState, DesignParameters, LayoutOverrides, PlantProfile, ShopItem,
};

fn open_state(path: &Path) -> (Connection, AppState) {
    let conn = Connection::open(path).expect("database opens");
    db::init_schema(&conn).unwrap();
    let mut state = AppState::default();
    storage::load_from_storage(&conn, &mut state).unwrap();
    (conn, state)
}

#[test]
fn edits_survive_reopening_the_database() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("farm.db");

    {
        let (conn, mut state) = open_state(&db_path);
        state.upsert_plant(PlantProfile::new("Melon", 9.0, 0.1, 1.0));
        state.remove_plant("Bread");
        state.set_cost("piston", 750.0).unwrap();
        state.save_design(DesignParameters {
            plot_width: 32,
            plot_depth: 48,
            ..DesignParameters::default()
        });
        state
            .calculate("Melon", &LayoutOverrides::default(), Utc::now())
            .unwrap();
        storage::save_to_storage(&conn, &state).unwrap();
    }

    let (_conn, state) = open_state(&db_path);
    assert!(state.plant("Bread").is_none());
    assert_eq!(state.plants().last().unwrap().name, "Melon");
    assert_eq!(state.costs().piston, 750.0);
    assert_eq!(state.design().plot_width, 32);
    assert_eq!(state.recent_calculations().len(), 1);
    // floor(32 * 48 * 0.1) = 153
    assert_eq!(state.recent_calculations()[0].result.plants_per_layer, 153);
}

#[test]
fn latest_export_is_reimported() {
    let dir = tempdir().unwrap();
    let export_dir = dir.path().join("exports");

    let mut older = AppState::default();
    older
        .upsert_shop_item(ShopItem {
            name: "Bone Meal".into(),
            price: 3.0,
            category: "farming".into(),
            description: String::new(),
        })
        .unwrap();
    storage::export_to_dir(&older, &export_dir, Utc.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).unwrap())
        .unwrap();

    let mut newer = older.clone();
    newer.set_cost("Bone Meal", 4.5).unwrap();
    newer
        .add_to_comparison("Cactus", &LayoutOverrides::default())
        .unwrap();
    storage::export_to_dir(&newer, &export_dir, Utc.with_ymd_and_hms(2025, 2, 1, 9, 0, 0).unwrap())
        .unwrap();

    let latest = exports::latest_export(&export_dir).unwrap().expect("an export");
    assert_eq!(latest.date.to_string(), "2025-02-01");

    let (conn, mut state) = open_state(&dir.path().join("farm.db"));
    storage::import_file(&conn, &mut state, &latest.path).unwrap();
    assert_eq!(state, newer);

    // import saved to the store
    let (_conn, reopened) = open_state(&dir.path().join("farm.db"));
    assert_eq!(reopened.shop_items()[0].price, 4.5);
    assert_eq!(reopened.comparison().len(), 1);
}

#[test]
fn broken_import_file_is_rejected() {
    let dir = tempdir().unwrap();
    let bad = dir.path().join("farm-calculator-2025-01-01.json");
    fs::write(&bad, "{\"plantProfiles\": [[\"Wheat\"").unwrap();

    let (conn, mut state) = open_state(&dir.path().join("farm.db"));
    let before = state.clone();
    assert!(storage::import_file(&conn, &mut state, &bad).is_err());
    assert_eq!(state, before);
    assert!(db::get_value(&conn, storage::STORAGE_KEY).unwrap().is_none());
}

#[test]
fn export_round_trip_reproduces_every_scenario() {
    let dir = tempdir().unwrap();
    let mut state = AppState::default();
    state.upsert_plant(PlantProfile::new("Kelp", 1.3, 0.9, 2.7).processed(350.5));
    state.set_cost("observer", 333.33).unwrap();

    let path = storage::export_to_dir(&state, dir.path(), Utc::now()).unwrap();
    let mut restored = AppState::default();
    storage::import_json(&mut restored, &fs::read_to_string(path).unwrap()).unwrap();

    let piston = LayoutOverrides {
        pistons_per_plant: Some(true),
        observer_share: Some(7),
        ..Default::default()
    };
    for plant in state.plants() {
        for overrides in [LayoutOverrides::default(), piston] {
            assert_eq!(
                restored.evaluate(&plant.name, &overrides).unwrap(),
                state.evaluate(&plant.name, &overrides).unwrap(),
                "{} differs after round trip",
                plant.name
            );
        }
    }
}
