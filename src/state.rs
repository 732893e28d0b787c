//! Application state: every user-editable collection in one place

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::calculator::evaluate_scenario;
use crate::costs::{CostTable, Material};
use crate::error::{FarmError, Result};
use crate::models::{
    default_plants, DesignParameters, LayoutOverrides, PlantProfile, RecentCalculation,
    ScenarioResult, ShopItem, Suggestion,
};

/// How many recent calculations are kept
pub const RECENT_LIMIT: usize = 10;
/// How many recent calculations the dashboard lists
pub const DASHBOARD_RECENT: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub(crate) plants: Vec<PlantProfile>,
    pub(crate) costs: CostTable,
    pub(crate) design: DesignParameters,
    pub(crate) recent: Vec<RecentCalculation>,
    pub(crate) comparison: Vec<ScenarioResult>,
    pub(crate) shop_items: Vec<ShopItem>,
    pub(crate) suggestions: Vec<Suggestion>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            plants: default_plants(),
            costs: CostTable::default(),
            design: DesignParameters::default(),
            recent: Vec::new(),
            comparison: Vec::new(),
            shop_items: Vec::new(),
            suggestions: Vec::new(),
        }
    }
}

/// Headline numbers shown on the dashboard
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard<'a> {
    pub latest: Option<&'a RecentCalculation>,
    pub recent: Vec<&'a RecentCalculation>, // newest first
}

/// Insert keeping position when the key already exists, append otherwise
pub(crate) fn upsert_by<T>(items: &mut Vec<T>, item: T, key: impl Fn(&T) -> &str) -> bool {
    match items.iter().position(|existing| key(existing) == key(&item)) {
        Some(index) => {
            items[index] = item;
            false
        }
        None => {
            items.push(item);
            true
        }
    }
}

impl AppState {
    // Plant profiles

    pub fn plants(&self) -> &[PlantProfile] {
        &self.plants
    }

    pub fn plant(&self, name: &str) -> Option<&PlantProfile> {
        self.plants.iter().find(|p| p.name == name)
    }

    /// Save a plant profile under its name. Returns true if it is new.
    pub fn upsert_plant(&mut self, plant: PlantProfile) -> bool {
        let name = plant.name.clone();
        let created = upsert_by(&mut self.plants, plant, |p| p.name.as_str());
        debug!(plant = %name, created, "saved plant profile");
        created
    }

    pub fn remove_plant(&mut self, name: &str) -> Option<PlantProfile> {
        let index = self.plants.iter().position(|p| p.name == name)?;
        Some(self.plants.remove(index))
    }

    // Costs

    pub fn costs(&self) -> &CostTable {
        &self.costs
    }

    /// Replace the whole cost table
    pub fn save_costs(&mut self, costs: CostTable) {
        self.costs = costs;
    }

    /// Set one price. Material names win; otherwise a shop item of that name
    /// is repriced.
    pub fn set_cost(&mut self, name: &str, price: f64) -> Result<()> {
        if let Ok(material) = name.parse::<Material>() {
            self.costs.set_price(material, price);
            return Ok(());
        }

        match self.shop_items.iter_mut().find(|item| item.name == name) {
            Some(item) => {
                item.price = price;
                Ok(())
            }
            None => Err(FarmError::UnknownCostEntry(name.to_string())),
        }
    }

    /// Restore the default price list
    pub fn reset_costs(&mut self) {
        self.costs = CostTable::default();
        info!("cost table reset to defaults");
    }

    // Shop items

    pub fn shop_items(&self) -> &[ShopItem] {
        &self.shop_items
    }

    /// Save a shop item under its name. Returns true if it is new.
    ///
    /// Material keys and labels are reserved, since `set_cost` resolves them
    /// to the material first.
    pub fn upsert_shop_item(&mut self, item: ShopItem) -> Result<bool> {
        if item.name.parse::<Material>().is_ok() {
            return Err(FarmError::ReservedShopName(item.name));
        }
        Ok(upsert_by(&mut self.shop_items, item, |i| i.name.as_str()))
    }

    pub fn remove_shop_item(&mut self, name: &str) -> Option<ShopItem> {
        let index = self.shop_items.iter().position(|i| i.name == name)?;
        Some(self.shop_items.remove(index))
    }

    // Design

    pub fn design(&self) -> &DesignParameters {
        &self.design
    }

    pub fn save_design(&mut self, design: DesignParameters) {
        self.design = design;
    }

    // Calculations

    /// Evaluate a plant against the active design without recording anything
    pub fn evaluate(&self, plant_name: &str, overrides: &LayoutOverrides) -> Result<ScenarioResult> {
        let plant = self
            .plant(plant_name)
            .ok_or_else(|| FarmError::UnknownPlant(plant_name.to_string()))?;

        Ok(evaluate_scenario(
            &self.design.plot(),
            plant,
            &self.design.layout_with(overrides),
            &self.costs,
            self.design.budget,
        ))
    }

    /// Run a calculation and append it to the recent log
    pub fn calculate(
        &mut self,
        plant_name: &str,
        overrides: &LayoutOverrides,
        now: DateTime<Utc>,
    ) -> Result<ScenarioResult> {
        let result = self.evaluate(plant_name, overrides)?;
        self.record_recent(result.clone(), now);
        Ok(result)
    }

    fn record_recent(&mut self, result: ScenarioResult, timestamp: DateTime<Utc>) {
        self.recent.push(RecentCalculation { result, timestamp });
        if self.recent.len() > RECENT_LIMIT {
            let excess = self.recent.len() - RECENT_LIMIT;
            self.recent.drain(..excess);
        }
    }

    pub fn recent_calculations(&self) -> &[RecentCalculation] {
        &self.recent
    }

    pub fn add_to_comparison(
        &mut self,
        plant_name: &str,
        overrides: &LayoutOverrides,
    ) -> Result<ScenarioResult> {
        let result = self.evaluate(plant_name, overrides)?;
        self.comparison.push(result.clone());
        Ok(result)
    }

    pub fn comparison(&self) -> &[ScenarioResult] {
        &self.comparison
    }

    pub fn clear_comparison(&mut self) {
        self.comparison.clear();
    }

    pub fn dashboard(&self) -> Dashboard<'_> {
        Dashboard {
            latest: self.recent.last(),
            recent: self.recent.iter().rev().take(DASHBOARD_RECENT).collect(),
        }
    }

    // Suggestions

    pub fn submit_suggestion(
        &mut self,
        kind: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        priority: impl Into<String>,
        now: DateTime<Utc>,
    ) -> &Suggestion {
        self.suggestions.push(Suggestion {
            kind: kind.into(),
            title: title.into(),
            description: description.into(),
            priority: priority.into(),
            timestamp: now,
        });
        &self.suggestions[self.suggestions.len() - 1]
    }

    pub fn suggestions(&self) -> &[Suggestion] {
        &self.suggestions
    }
}
