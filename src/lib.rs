//! Farm ROI Calculator
//!
//! Estimates construction cost, hourly revenue and break-even time for
//! automated Minecraft crop farms, and keeps the plant profiles, prices and
//! designs those estimates are made from.

pub mod calculator;
pub mod costs;
pub mod db;
pub mod error;
pub mod exports;
pub mod models;
pub mod state;
pub mod storage;

pub use calculator::evaluate_scenario;
pub use costs::{CostTable, Material};
pub use error::{FarmError, Result};
pub use models::{
    DesignParameters, FarmLayout, LayoutOverrides, PlantProfile, Plot, ScenarioResult, ShopItem,
    Suggestion,
};
pub use state::AppState;
