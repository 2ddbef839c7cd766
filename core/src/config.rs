//! Tunable simulation parameters.

use std::time::Duration;

use serde::Deserialize;

/// Tuning knobs for the fixed-tick simulation and its presentation.
///
/// Every field has a default so configuration documents only list overrides.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Simulation ticks per second.
    pub tick_rate: u32,
    /// Divides a vehicle's rules speed into world units per tick.
    pub vehicle_speed_divisor: f32,
    /// Divides an infantry's rules speed into world units per tick.
    pub infantry_speed_divisor: f32,
    /// Divides a projectile's rules speed into world units per tick.
    pub projectile_speed_divisor: f32,
    /// Rendered frames between fog mask redraws.
    pub fog_redraw_interval: u32,
    /// World units the camera keeps between the viewport and the map edge.
    pub camera_margin: f32,
    /// Fewest ticks between smoke trail puffs.
    pub smoke_trail_min_ticks: u32,
    /// Most ticks between smoke trail puffs.
    pub smoke_trail_max_ticks: u32,
    /// Lifetime of effects whose rules declare none.
    pub effect_lifetime: u32,
    /// Percentage of the build cost refunded when a structure is sold.
    pub refund_percent: u32,
    /// Seed for the simulation's random stream.
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_rate: 30,
            vehicle_speed_divisor: 18.0,
            infantry_speed_divisor: 20.0,
            projectile_speed_divisor: 6.0,
            fog_redraw_interval: 4,
            camera_margin: 48.0,
            smoke_trail_min_ticks: 2,
            smoke_trail_max_ticks: 4,
            effect_lifetime: 12,
            refund_percent: 50,
            seed: 0x5eed_cafe_f00d_d00d,
        }
    }
}

impl SimulationConfig {
    /// Parses a configuration document, filling absent fields with defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Simulated time covered by a single tick.
    #[must_use]
    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs(1) / self.tick_rate.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_documents_keep_defaults() {
        let config = SimulationConfig::from_toml_str("tick_rate = 15").expect("config parse");
        assert_eq!(config.tick_rate, 15);
        assert_eq!(config.vehicle_speed_divisor, 18.0);
        assert_eq!(config.tick_duration(), Duration::from_secs(1) / 15);
    }
}
