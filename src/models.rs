//! Data models for plants, farm designs and calculation results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlantProfile {
    pub name: String,
    pub sell_price: f64,
    pub density_per_block: f64, // plants per block of floor area
    pub yield_per_plant_per_hour: f64,
    pub derived_product: bool, // needs a processing station (e.g. dye from cactus)
    pub extra_process_station_per_layer_cost: f64,
}

impl PlantProfile {
    pub fn new(name: impl Into<String>, sell_price: f64, density: f64, yield_per_hour: f64) -> Self {
        Self {
            name: name.into(),
            sell_price,
            density_per_block: density,
            yield_per_plant_per_hour: yield_per_hour,
            derived_product: false,
            extra_process_station_per_layer_cost: 0.0,
        }
    }

    /// Mark the plant as a processed product with a per-layer station cost
    pub fn processed(mut self, station_cost: f64) -> Self {
        self.derived_product = true;
        self.extra_process_station_per_layer_cost = station_cost;
        self
    }
}

/// Plant profiles available before any saved data is loaded
pub fn default_plants() -> Vec<PlantProfile> {
    vec![
        PlantProfile::new("Wheat", 7.00, 0.20, 0.5),
        PlantProfile::new("Bread", 25.00, 0.20, 0.167),
        PlantProfile::new("Baked Potato", 11.00, 0.22, 0.5),
        PlantProfile::new("Sugar Cane", 12.00, 0.33, 0.90),
        PlantProfile::new("Cactus", 10.00, 0.25, 0.60),
        PlantProfile::new("Green Dye", 14.00, 0.25, 0.60).processed(2000.0),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plot {
    pub width: u32,
    pub depth: u32,
}

impl Plot {
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.depth)
    }
}

/// Per-layer layout choices fed to the evaluator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FarmLayout {
    pub layers: u32,
    pub lanes: u32,
    pub observer_share: u32, // plants sharing one observer
    pub pistons_per_plant: bool,
    pub include_unloaders: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignParameters {
    pub plot_width: u32,
    pub plot_depth: u32,
    pub layers: u32,
    pub lanes: u32,
    pub observer_share: u32,
    pub pistons_per_plant: bool,
    pub include_unloaders: bool,
    pub budget: f64,
}

impl Default for DesignParameters {
    fn default() -> Self {
        Self {
            plot_width: 74,
            plot_depth: 74,
            layers: 2,
            lanes: 10,
            observer_share: 16,
            pistons_per_plant: false,
            include_unloaders: true,
            budget: 2_000_000.0,
        }
    }
}

impl DesignParameters {
    pub fn plot(&self) -> Plot {
        Plot {
            width: self.plot_width,
            depth: self.plot_depth,
        }
    }

    pub fn layout(&self) -> FarmLayout {
        FarmLayout {
            layers: self.layers,
            lanes: self.lanes,
            observer_share: self.observer_share,
            pistons_per_plant: self.pistons_per_plant,
            include_unloaders: self.include_unloaders,
        }
    }

    /// Layout with any per-calculation overrides applied
    pub fn layout_with(&self, overrides: &LayoutOverrides) -> FarmLayout {
        let base = self.layout();
        FarmLayout {
            layers: overrides.layers.unwrap_or(base.layers),
            lanes: overrides.lanes.unwrap_or(base.lanes),
            observer_share: overrides.observer_share.unwrap_or(base.observer_share),
            pistons_per_plant: overrides.pistons_per_plant.unwrap_or(base.pistons_per_plant),
            include_unloaders: overrides.include_unloaders.unwrap_or(base.include_unloaders),
        }
    }
}

/// Optional replacements for the active design, used by single calculations
/// and comparison entries. Plot size and budget always come from the design.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayoutOverrides {
    pub layers: Option<u32>,
    pub lanes: Option<u32>,
    pub observer_share: Option<u32>,
    pub pistons_per_plant: Option<bool>,
    pub include_unloaders: Option<bool>,
}

/// Result of a single farm evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioResult {
    pub farm_type: String,
    pub layers: u32,
    pub plants_per_layer: u64,
    pub total_plants: u64,
    pub cost_per_layer: f64,
    pub total_cost: f64,
    pub revenue_per_plant_per_hour: f64,
    pub revenue_per_hour_total: f64,
    #[serde(with = "break_even")]
    pub break_even_hours: f64, // +inf when the farm earns nothing
    pub under_budget: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentCalculation {
    #[serde(flatten)]
    pub result: ScenarioResult,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopItem {
    pub name: String,
    pub price: f64,
    pub category: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub description: String,
    pub priority: String,
    pub timestamp: DateTime<Utc>,
}

/// JSON has no infinity; it is written as `null` and read back as +inf.
mod break_even {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(hours: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if hours.is_finite() {
            serializer.serialize_f64(*hours)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
    }
}
