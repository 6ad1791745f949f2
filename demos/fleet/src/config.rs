//! Demo configuration: an optional TOML file, then environment overrides.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

use rf_sim::{SimOptions, SyntheticRoster};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Road geometry.  The embedded sample network is used when absent.
    pub geojson_path: Option<PathBuf>,
    /// JSON roster served as the adapter source (`use_adapter = true`).
    pub roster_file:  Option<PathBuf>,
    /// Size of the synthetic roster.
    pub agents:       usize,
    pub seed:         u64,
    /// Stop after this many wall-clock seconds; run until ctrl-c otherwise.
    pub run_secs:     Option<u64>,
    pub sim:          SimOptions,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            geojson_path: None,
            roster_file:  None,
            agents:       SyntheticRoster::DEFAULT_COUNT,
            seed:         0,
            run_secs:     None,
            sim:          SimOptions::default(),
        }
    }
}

impl AppConfig {
    /// Read `path` (defaults when `None`), overlay the process environment,
    /// and validate the resulting options.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => {
                let text = std::fs::read_to_string(p)
                    .with_context(|| format!("reading config {}", p.display()))?;
                toml::from_str(&text).with_context(|| format!("parsing config {}", p.display()))?
            }
            None => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        config.sim.validate()?;
        Ok(config)
    }

    /// Overlay variables looked up through `var`.  Milliseconds for
    /// intervals, km/h for speeds.  `ACCELERATION` and `DECELERATION` are
    /// km/h per update and are rescaled to km/h per hour using the
    /// interval in effect after the overlay.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        macro_rules! overlay {
            ($($name:literal => $field:expr),* $(,)?) => {$(
                if let Some(raw) = var($name) {
                    $field = raw
                        .trim()
                        .parse()
                        .map_err(|e| anyhow!("{}={raw:?}: {e}", $name))?;
                }
            )*};
        }

        let sim = &mut self.sim;
        overlay! {
            "UPDATE_INTERVAL"       => sim.update_interval_ms,
            "MIN_SPEED"             => sim.min_speed,
            "MAX_SPEED"             => sim.max_speed,
            "TURN_THRESHOLD"        => sim.turn_threshold,
            "SPEED_VARIATION"       => sim.speed_variation,
            "HEATZONE_SPEED_FACTOR" => sim.heat_zone_speed_factor,
            "UPDATE_SERVER"         => sim.update_server,
            "UPDATE_SERVER_TIMEOUT" => sim.sync_timeout_ms,
        }

        let ticks_per_hour = 3_600_000.0 / sim.update_interval_ms.max(1) as f64;
        let per_update = |name: &str| -> Result<Option<f64>> {
            var(name)
                .map(|raw| raw.trim().parse::<f64>().map_err(|e| anyhow!("{name}={raw:?}: {e}")))
                .transpose()
        };
        if let Some(v) = per_update("ACCELERATION")? {
            sim.acceleration = v * ticks_per_hour;
        }
        if let Some(v) = per_update("DECELERATION")? {
            sim.deceleration = v * ticks_per_hour;
        }

        if let Some(path) = var("GEOJSON_PATH") {
            self.geojson_path = Some(PathBuf::from(path));
        }
        Ok(())
    }
}
