//! Farm ROI calculator logic

use std::fmt;

use crate::costs::{CostTable, Material};
use crate::models::{FarmLayout, PlantProfile, Plot, ScenarioResult};

/// Evaluate a farm design for one plant.
///
/// Pure and deterministic: plant count comes from the plot area and plant
/// density, construction cost from the chosen harvester mechanism, and
/// break-even from total cost over hourly revenue. A farm with no revenue
/// never breaks even (`f64::INFINITY`).
pub fn evaluate_scenario(
    plot: &Plot,
    plant: &PlantProfile,
    layout: &FarmLayout,
    costs: &CostTable,
    budget: f64,
) -> ScenarioResult {
    let plants_per_layer = plants_per_layer(plot, plant);
    let total_plants = plants_per_layer.saturating_mul(u64::from(layout.layers));

    let mut layer_cost = if layout.pistons_per_plant {
        piston_layer_cost(plot, plants_per_layer, layout, costs)
    } else {
        rail_layer_cost(plot, layout, costs)
    };

    // Processing station is priced per layer, not per plant
    if plant.derived_product {
        layer_cost += plant.extra_process_station_per_layer_cost;
    }

    let total_cost = layer_cost * f64::from(layout.layers);
    let revenue_per_plant_per_hour = plant.yield_per_plant_per_hour * plant.sell_price;
    let revenue_per_hour_total = revenue_per_plant_per_hour * total_plants as f64;
    let break_even_hours = if revenue_per_hour_total > 0.0 {
        total_cost / revenue_per_hour_total
    } else {
        f64::INFINITY
    };

    ScenarioResult {
        farm_type: plant.name.clone(),
        layers: layout.layers,
        plants_per_layer,
        total_plants,
        cost_per_layer: layer_cost,
        total_cost,
        revenue_per_plant_per_hour,
        revenue_per_hour_total,
        break_even_hours,
        under_budget: total_cost <= budget,
    }
}

/// Number of plants that fit on one layer of the plot.
///
/// Counts past `u64::MAX` clamp to `u64::MAX`.
pub fn plants_per_layer(plot: &Plot, plant: &PlantProfile) -> u64 {
    (plot.width as f64 * plot.depth as f64 * plant.density_per_block).floor() as u64
}

/// Per-layer cost of a minecart harvester: rails across every lane, one cart
/// and two hoppers per lane, a chest pair and an optional unloader comparator.
pub fn rail_layer_cost(plot: &Plot, layout: &FarmLayout, costs: &CostTable) -> f64 {
    let rails = f64::from(plot.width) * f64::from(layout.lanes);
    let carts = f64::from(layout.lanes);
    let hoppers = f64::from(layout.lanes) * 2.0;
    let chests = 2.0;
    let comparators = if layout.include_unloaders { 1.0 } else { 0.0 };

    rails * costs.price(Material::Rail)
        + carts * costs.price(Material::Minecart)
        + hoppers * costs.price(Material::Hopper)
        + chests * costs.price(Material::Chest)
        + comparators * costs.price(Material::Comparator)
}

/// Per-layer cost of a piston harvester: one piston per plant and one
/// observer per `observer_share` plants on top of the minecart collection line.
pub fn piston_layer_cost(
    plot: &Plot,
    plants_per_layer: u64,
    layout: &FarmLayout,
    costs: &CostTable,
) -> f64 {
    let pistons = plants_per_layer as f64;
    let observers = plants_per_layer.div_ceil(u64::from(layout.observer_share.max(1))) as f64;
    let rails = f64::from(plot.width) * f64::from(layout.lanes);
    let carts = f64::from(layout.lanes);
    let hoppers = f64::from(layout.lanes) * 2.0;
    let chests = 2.0;
    let comparators = if layout.include_unloaders { 1.0 } else { 0.0 };

    pistons * costs.price(Material::Piston)
        + observers * costs.price(Material::Observer)
        + rails * costs.price(Material::Rail)
        + carts * costs.price(Material::Minecart)
        + hoppers * costs.price(Material::Hopper)
        + chests * costs.price(Material::Chest)
        + comparators * costs.price(Material::Comparator)
}

/// Format an amount with thousands separators and at most two decimals
pub fn format_amount(value: f64) -> String {
    if !value.is_finite() {
        return if value > 0.0 { "∞".to_string() } else { "-∞".to_string() };
    }

    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let frac = frac_part.trim_end_matches('0');
    let sign = if value < 0.0 && (int_part != "0" || !frac.is_empty()) { "-" } else { "" };
    if frac.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{frac}")
    }
}

/// Break-even time for display; a farm without revenue never pays back
pub fn format_break_even(hours: f64) -> String {
    if hours.is_finite() {
        format!("{:.1}h", hours)
    } else {
        "never".to_string()
    }
}

impl fmt::Display for ScenarioResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Calculation Results ===")?;
        writeln!(f, "Farm type:              {}", self.farm_type)?;
        writeln!(f, "Layers:                 {}", self.layers)?;
        writeln!(f, "Plants per layer:       {}", format_amount(self.plants_per_layer as f64))?;
        writeln!(f, "Total plants:           {}", format_amount(self.total_plants as f64))?;
        writeln!(f, "Cost per layer:         ${}", format_amount(self.cost_per_layer))?;
        writeln!(f, "Total cost:             ${}", format_amount(self.total_cost))?;
        writeln!(f, "Revenue per plant/hour: ${:.2}", self.revenue_per_plant_per_hour)?;
        writeln!(f, "Total revenue/hour:     ${}", format_amount(self.revenue_per_hour_total))?;
        writeln!(f, "Break-even time:        {}", format_break_even(self.break_even_hours))?;
        write!(
            f,
            "Under budget:           {}",
            if self.under_budget { "Yes" } else { "No" }
        )
    }
}

/// Render results side by side: one row per metric, one column per farm
pub fn format_comparison(results: &[ScenarioResult]) -> String {
    if results.is_empty() {
        return "Add farms to compare their performance\n".to_string();
    }

    let rows: [(&str, fn(&ScenarioResult) -> String); 9] = [
        ("Layers", |r| r.layers.to_string()),
        ("Plants/Layer", |r| format_amount(r.plants_per_layer as f64)),
        ("Total Plants", |r| format_amount(r.total_plants as f64)),
        ("Cost/Layer", |r| format!("${}", format_amount(r.cost_per_layer))),
        ("Total Cost", |r| format!("${}", format_amount(r.total_cost))),
        ("Rev/Plant/Hr", |r| format!("${:.2}", r.revenue_per_plant_per_hour)),
        ("Rev Total/Hr", |r| format!("${}", format_amount(r.revenue_per_hour_total))),
        ("Break-even (h)", |r| {
            if r.break_even_hours.is_finite() {
                format!("{:.1}", r.break_even_hours)
            } else {
                "never".to_string()
            }
        }),
        ("Under Budget", |r| if r.under_budget { "Yes" } else { "No" }.to_string()),
    ];

    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|(_, cell)| results.iter().map(cell).collect())
        .collect();

    let label_width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0).max(6);
    let column_widths: Vec<usize> = results
        .iter()
        .enumerate()
        .map(|(col, r)| {
            cells
                .iter()
                .map(|row| row[col].chars().count())
                .chain(std::iter::once(r.farm_type.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut output = String::new();
    output.push_str(&format!("{:<label_width$}", "Metric"));
    for (r, width) in results.iter().zip(&column_widths) {
        output.push_str(&format!("  {:>width$}", r.farm_type));
    }
    output.push('\n');
    let total_width = label_width + column_widths.iter().map(|w| w + 2).sum::<usize>();
    output.push_str(&"-".repeat(total_width));
    output.push('\n');

    for ((label, _), row) in rows.iter().zip(&cells) {
        output.push_str(&format!("{:<label_width$}", label));
        for (value, width) in row.iter().zip(&column_widths) {
            output.push_str(&format!("  {:>width$}", value));
        }
        output.push('\n');
    }

    output
}
