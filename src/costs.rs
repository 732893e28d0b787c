//! Building material cost table

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FarmError;

/// The fixed set of materials every farm design is priced from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Material {
    RedstoneTorch,
    Repeater,
    Comparator,
    Chest,
    Smoker,
    Piston,
    Dispenser,
    Dropper,
    Observer,
    Minecart,
    Hopper,
    Rail,
    LeverButton,
    RedstoneLamp,
    Furnace,
}

impl Material {
    pub const ALL: [Material; 15] = [
        Material::RedstoneTorch,
        Material::Repeater,
        Material::Comparator,
        Material::Chest,
        Material::Smoker,
        Material::Piston,
        Material::Dispenser,
        Material::Dropper,
        Material::Observer,
        Material::Minecart,
        Material::Hopper,
        Material::Rail,
        Material::LeverButton,
        Material::RedstoneLamp,
        Material::Furnace,
    ];

    /// Key used in saved data
    pub fn key(self) -> &'static str {
        match self {
            Material::RedstoneTorch => "redstoneTorch",
            Material::Repeater => "repeater",
            Material::Comparator => "comparator",
            Material::Chest => "chest",
            Material::Smoker => "smoker",
            Material::Piston => "piston",
            Material::Dispenser => "dispenser",
            Material::Dropper => "dropper",
            Material::Observer => "observer",
            Material::Minecart => "minecart",
            Material::Hopper => "hopper",
            Material::Rail => "rail",
            Material::LeverButton => "leverButton",
            Material::RedstoneLamp => "redstoneLamp",
            Material::Furnace => "furnace",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Material::RedstoneTorch => "Redstone Torch",
            Material::Repeater => "Repeater",
            Material::Comparator => "Comparator",
            Material::Chest => "Chest",
            Material::Smoker => "Smoker",
            Material::Piston => "Piston",
            Material::Dispenser => "Dispenser",
            Material::Dropper => "Dropper",
            Material::Observer => "Observer",
            Material::Minecart => "Minecart",
            Material::Hopper => "Hopper",
            Material::Rail => "Rail",
            Material::LeverButton => "Lever/Button",
            Material::RedstoneLamp => "Redstone Lamp",
            Material::Furnace => "Furnace",
        }
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Material {
    type Err = FarmError;

    /// Accepts either the saved key ("leverButton") or the label ("Lever/Button")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Material::ALL
            .into_iter()
            .find(|m| m.key().eq_ignore_ascii_case(wanted) || m.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| FarmError::UnknownCostEntry(wanted.to_string()))
    }
}

/// Unit prices for each material.
///
/// Fields missing from saved data take their default price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CostTable {
    pub redstone_torch: f64,
    pub repeater: f64,
    pub comparator: f64,
    pub chest: f64,
    pub smoker: f64,
    pub piston: f64,
    pub dispenser: f64,
    pub dropper: f64,
    pub observer: f64,
    pub minecart: f64,
    pub hopper: f64,
    pub rail: f64,
    pub lever_button: f64,
    pub redstone_lamp: f64,
    pub furnace: f64,
}

impl Default for CostTable {
    fn default() -> Self {
        Self {
            redstone_torch: 10.0,
            repeater: 1000.0,
            comparator: 1000.0,
            chest: 100.0,
            smoker: 1000.0,
            piston: 1000.0,
            dispenser: 1000.0,
            dropper: 1000.0,
            observer: 1000.0,
            minecart: 100.0,
            hopper: 500.0,
            rail: 100.0,
            lever_button: 1000.0,
            redstone_lamp: 100.0,
            furnace: 1000.0,
        }
    }
}

impl CostTable {
    /// A table with every price set to zero
    pub fn zeroed() -> Self {
        let mut table = Self::default();
        for material in Material::ALL {
            table.set_price(material, 0.0);
        }
        table
    }

    /// Build a table from explicit prices; anything not listed costs nothing
    pub fn from_prices(prices: impl IntoIterator<Item = (Material, f64)>) -> Self {
        let mut table = Self::zeroed();
        for (material, price) in prices {
            table.set_price(material, price);
        }
        table
    }

    pub fn price(&self, material: Material) -> f64 {
        match material {
            Material::RedstoneTorch => self.redstone_torch,
            Material::Repeater => self.repeater,
            Material::Comparator => self.comparator,
            Material::Chest => self.chest,
            Material::Smoker => self.smoker,
            Material::Piston => self.piston,
            Material::Dispenser => self.dispenser,
            Material::Dropper => self.dropper,
            Material::Observer => self.observer,
            Material::Minecart => self.minecart,
            Material::Hopper => self.hopper,
            Material::Rail => self.rail,
            Material::LeverButton => self.lever_button,
            Material::RedstoneLamp => self.redstone_lamp,
            Material::Furnace => self.furnace,
        }
    }

    pub fn set_price(&mut self, material: Material, price: f64) {
        let slot = match material {
            Material::RedstoneTorch => &mut self.redstone_torch,
            Material::Repeater => &mut self.repeater,
            Material::Comparator => &mut self.comparator,
            Material::Chest => &mut self.chest,
            Material::Smoker => &mut self.smoker,
            Material::Piston => &mut self.piston,
            Material::Dispenser => &mut self.dispenser,
            Material::Dropper => &mut self.dropper,
            Material::Observer => &mut self.observer,
            Material::Minecart => &mut self.minecart,
            Material::Hopper => &mut self.hopper,
            Material::Rail => &mut self.rail,
            Material::LeverButton => &mut self.lever_button,
            Material::RedstoneLamp => &mut self.redstone_lamp,
            Material::Furnace => &mut self.furnace,
        };
        *slot = price;
    }

    pub fn entries(&self) -> impl Iterator<Item = (Material, f64)> + '_ {
        Material::ALL.into_iter().map(|m| (m, self.price(m)))
    }
}
