//! Thermal constants.

use std::path::Path;

use gridflow_core::config::{self, ConfigError};
use gridflow_core::fixed::{Fixed64, f64_to_fixed64};
use serde::{Deserialize, Serialize};

/// Largest magnitude accepted for a thermal constant. Keeps the values well
/// inside the Q32.32 integer range.
const MAX_CONSTANT: f64 = 1_000_000.0;

/// Constants shared by every participant of a heat module.
///
/// Stored as `f64` so config files stay human-readable; converted to
/// [`Fixed64`] once when the module is built.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThermalConfig {
    /// Ambient temperature, used as the cold side of the Carnot ratio.
    pub ambient_temperature: f64,
    /// Inverse conduction coefficient of open air, applied on every side
    /// without a heat-exchanging neighbour.
    pub air_inverse_conduction: f64,
    /// Fuel units a participant with a fuel tank burns per tick.
    pub fuel_rate: u64,
    /// Heat released by one tick's worth of fuel.
    pub heat_generation: f64,
    /// Heat added every tick for each adjacent heat source.
    pub source_boost: f64,
}

impl Default for ThermalConfig {
    fn default() -> Self {
        Self {
            ambient_temperature: 300.0,
            air_inverse_conduction: 10_000.0,
            fuel_rate: 10,
            heat_generation: 200.0,
            source_boost: 30.0,
        }
    }
}

impl ThermalConfig {
    pub fn ambient(&self) -> Fixed64 {
        f64_to_fixed64(self.ambient_temperature)
    }

    pub fn air_inverse(&self) -> Fixed64 {
        f64_to_fixed64(self.air_inverse_conduction)
    }

    pub fn heat_generation(&self) -> Fixed64 {
        f64_to_fixed64(self.heat_generation)
    }

    pub fn source_boost(&self) -> Fixed64 {
        f64_to_fixed64(self.source_boost)
    }

    /// Load and validate a config file (RON, TOML or JSON).
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config: ThermalConfig = config::load_file(path)?;
        config.validate().map_err(|detail| ConfigError::Invalid {
            file: path.to_path_buf(),
            detail,
        })?;
        Ok(config)
    }

    /// Ambient and air constants must be positive, the heat amounts
    /// non-negative, all of them finite, and the fuel rate at least one.
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("ambient_temperature", self.ambient_temperature),
            ("air_inverse_conduction", self.air_inverse_conduction),
        ] {
            if !value.is_finite() || value <= 0.0 || value > MAX_CONSTANT {
                return Err(format!("{name} must be in (0, {MAX_CONSTANT}], got {value}"));
            }
        }
        for (name, value) in [
            ("heat_generation", self.heat_generation),
            ("source_boost", self.source_boost),
        ] {
            if !value.is_finite() || value < 0.0 || value > MAX_CONSTANT {
                return Err(format!("{name} must be in [0, {MAX_CONSTANT}], got {value}"));
            }
        }
        if self.fuel_rate == 0 {
            return Err("fuel_rate must be at least 1".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridflow_core::config::{Format, from_str};

    #[test]
    fn defaults() {
        let config = ThermalConfig::default();
        assert_eq!(config.ambient(), Fixed64::from_num(300));
        assert_eq!(config.air_inverse(), Fixed64::from_num(10_000));
        assert_eq!(config.fuel_rate, 10);
        assert_eq!(config.heat_generation(), Fixed64::from_num(200));
        assert_eq!(config.source_boost(), Fixed64::from_num(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: ThermalConfig =
            from_str(Format::Toml, "ambient_temperature = 273.0", Path::new("t.toml")).unwrap();
        assert_eq!(config.ambient_temperature, 273.0);
        assert_eq!(config.air_inverse_conduction, 10_000.0);
    }

    #[test]
    fn ron_and_json() {
        let ron: ThermalConfig = from_str(
            Format::Ron,
            "(ambient_temperature: 250.0, air_inverse_conduction: 500.0)",
            Path::new("t.ron"),
        )
        .unwrap();
        let json: ThermalConfig = from_str(
            Format::Json,
            r#"{"ambient_temperature": 250.0, "air_inverse_conduction": 500.0}"#,
            Path::new("t.json"),
        )
        .unwrap();
        assert_eq!(ron, json);
    }

    #[test]
    fn non_positive_constants_are_invalid() {
        let config = ThermalConfig {
            ambient_temperature: 0.0,
            ..ThermalConfig::default()
        };
        assert!(config.validate().is_err());
        let config = ThermalConfig {
            air_inverse_conduction: f64::NAN,
            ..ThermalConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn fuel_settings_are_checked() {
        let zero_heat = ThermalConfig {
            heat_generation: 0.0,
            source_boost: 0.0,
            ..ThermalConfig::default()
        };
        assert!(zero_heat.validate().is_ok());
        let negative = ThermalConfig {
            source_boost: -1.0,
            ..ThermalConfig::default()
        };
        assert!(negative.validate().is_err());
        let no_rate = ThermalConfig {
            fuel_rate: 0,
            ..ThermalConfig::default()
        };
        assert!(no_rate.validate().is_err());
    }

    #[test]
    fn load_rejects_invalid_file() {
        let path = std::env::temp_dir().join("gridflow_thermal_invalid.json");
        std::fs::write(&path, r#"{"ambient_temperature": -5.0}"#).unwrap();
        let result = ThermalConfig::load(&path);
        let _ = std::fs::remove_file(&path);
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }
}
