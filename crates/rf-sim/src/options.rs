//! Live simulation configuration and partial updates.

use serde::{Deserialize, Serialize};

use rf_mobility::MotionParams;
use rf_zones::ZoneParams;

use crate::{SimError, SimResult};

/// Everything the orchestrator reads while running.
///
/// Speeds are km/h, intervals milliseconds.  `acceleration` and
/// `deceleration` are km/h per hour of simulated time: the defaults of 3600
/// and 5040 add 5 and shed 7 km/h over one 5 s update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimOptions {
    pub update_interval_ms: u64,
    pub min_speed: f64,
    pub max_speed: f64,
    pub acceleration: f64,
    pub deceleration: f64,
    /// Degrees; sharper turns brake.
    pub turn_threshold: f64,
    pub speed_variation: f64,
    pub heat_zone_speed_factor: f64,
    /// Push batched locations to the sync service.
    pub update_server: bool,
    pub sync_interval_ms: u64,
    /// Upper bound on one roster fetch or sync push.
    pub sync_timeout_ms: u64,
    pub heat_zone_interval_ms: u64,
    /// Agents that have not covered any distance for longer than this are
    /// reset.  Must exceed `update_interval_ms`; `None` disables the check.
    pub stuck_timeout_ms: Option<u64>,
    /// Load the roster from the external adapter instead of the built-in
    /// synthetic source.
    pub use_adapter: bool,
    pub heat_zones: ZoneParams,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            update_interval_ms:     5_000,
            min_speed:              20.0,
            max_speed:              60.0,
            acceleration:           3_600.0,
            deceleration:           5_040.0,
            turn_threshold:         30.0,
            speed_variation:        0.1,
            heat_zone_speed_factor: 0.5,
            update_server:          false,
            sync_interval_ms:       5_000,
            sync_timeout_ms:        5_000,
            heat_zone_interval_ms:  300_000,
            stuck_timeout_ms:       None,
            use_adapter:            false,
            heat_zones:             ZoneParams::default(),
        }
    }
}

impl SimOptions {
    /// Reject configurations the speed rule cannot honor.
    pub fn validate(&self) -> SimResult<()> {
        let reals = [
            ("min_speed", self.min_speed),
            ("max_speed", self.max_speed),
            ("acceleration", self.acceleration),
            ("deceleration", self.deceleration),
            ("turn_threshold", self.turn_threshold),
            ("speed_variation", self.speed_variation),
            ("heat_zone_speed_factor", self.heat_zone_speed_factor),
        ];
        for (name, v) in reals {
            if !v.is_finite() {
                return Err(SimError::Config(format!("{name} must be finite, got {v}")));
            }
            if v < 0.0 {
                return Err(SimError::Config(format!("{name} must not be negative, got {v}")));
            }
        }
        if self.min_speed > self.max_speed {
            return Err(SimError::Config(format!(
                "min_speed {} exceeds max_speed {}",
                self.min_speed, self.max_speed
            )));
        }
        if self.speed_variation >= 1.0 {
            return Err(SimError::Config(format!(
                "speed_variation must be in [0, 1), got {}",
                self.speed_variation
            )));
        }
        if self.heat_zone_speed_factor == 0.0 || self.heat_zone_speed_factor > 1.0 {
            return Err(SimError::Config(format!(
                "heat_zone_speed_factor must be in (0, 1], got {}",
                self.heat_zone_speed_factor
            )));
        }
        let intervals = [
            ("update_interval_ms", self.update_interval_ms),
            ("sync_interval_ms", self.sync_interval_ms),
            ("sync_timeout_ms", self.sync_timeout_ms),
            ("heat_zone_interval_ms", self.heat_zone_interval_ms),
        ];
        if let Some((name, _)) = intervals.iter().find(|(_, v)| *v == 0) {
            return Err(SimError::Config(format!("{name} must be positive")));
        }
        if let Some(stuck) = self.stuck_timeout_ms {
            if stuck <= self.update_interval_ms {
                return Err(SimError::Config(format!(
                    "stuck_timeout_ms {stuck} must exceed update_interval_ms {}",
                    self.update_interval_ms
                )));
            }
        }
        self.heat_zones.validate()?;
        Ok(())
    }

    /// A copy with every field present in `patch` replaced.
    pub fn merged(&self, patch: &OptionsPatch) -> SimOptions {
        let mut out = self.clone();
        macro_rules! take {
            ($($field:ident),* $(,)?) => {
                $( if let Some(v) = patch.$field { out.$field = v; } )*
            };
        }
        take!(
            update_interval_ms,
            min_speed,
            max_speed,
            acceleration,
            deceleration,
            turn_threshold,
            speed_variation,
            heat_zone_speed_factor,
            update_server,
            sync_interval_ms,
            sync_timeout_ms,
            heat_zone_interval_ms,
            use_adapter,
        );
        if let Some(ms) = patch.stuck_timeout_ms {
            out.stuck_timeout_ms = (ms > 0).then_some(ms);
        }
        if let Some(z) = &patch.heat_zones {
            out.heat_zones = z.clone();
        }
        out
    }

    pub fn motion_params(&self) -> MotionParams {
        MotionParams {
            min_speed:              self.min_speed,
            max_speed:              self.max_speed,
            acceleration:           self.acceleration,
            deceleration:           self.deceleration,
            turn_threshold:         self.turn_threshold,
            speed_variation:        self.speed_variation,
            heat_zone_speed_factor: self.heat_zone_speed_factor,
        }
    }
}

/// Partial options as sent by `start` and `set_options`.  Absent fields keep
/// their current value.  `stuck_timeout_ms: 0` turns the stuck check off.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptionsPatch {
    pub update_interval_ms: Option<u64>,
    pub min_speed: Option<f64>,
    pub max_speed: Option<f64>,
    pub acceleration: Option<f64>,
    pub deceleration: Option<f64>,
    pub turn_threshold: Option<f64>,
    pub speed_variation: Option<f64>,
    pub heat_zone_speed_factor: Option<f64>,
    pub update_server: Option<bool>,
    pub sync_interval_ms: Option<u64>,
    pub sync_timeout_ms: Option<u64>,
    pub heat_zone_interval_ms: Option<u64>,
    pub stuck_timeout_ms: Option<u64>,
    pub use_adapter: Option<bool>,
    pub heat_zones: Option<ZoneParams>,
}

impl OptionsPatch {
    pub fn is_empty(&self) -> bool {
        *self == OptionsPatch::default()
    }
}
