// firewatch_core/src/config.rs

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

// =========================================================================
// == Control Stage Gains ==
// =========================================================================

/// Gains for a single scalar stage. Unused gains stay at zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StageGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    /// Symmetric output limit. `None` disables saturation.
    pub saturation: Option<f64>,
}

impl StageGains {
    pub const fn p(kp: f64, saturation: f64) -> Self {
        Self {
            kp,
            ki: 0.0,
            kd: 0.0,
            saturation: Some(saturation),
        }
    }

    pub const fn pi(kp: f64, ki: f64, saturation: f64) -> Self {
        Self {
            kp,
            ki,
            kd: 0.0,
            saturation: Some(saturation),
        }
    }

    pub const fn pid(kp: f64, ki: f64, kd: f64, saturation: f64) -> Self {
        Self {
            kp,
            ki,
            kd,
            saturation: Some(saturation),
        }
    }
}

// =========================================================================
// == Flight Controller ==
// =========================================================================

/// # ControllerConfig
/// Every tuning constant of the cascaded flight controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControllerConfig {
    /// Calibrated per-motor thrust that holds the craft level in still air [N].
    pub hover_feed_forward: f64,

    /// Altitude error -> vertical velocity target.
    pub altitude: StageGains,
    /// Vertical velocity error -> thrust correction.
    pub vertical_velocity: StageGains,

    /// Horizontal position error -> velocity target, per axis.
    pub position_x: StageGains,
    pub position_y: StageGains,
    /// Horizontal velocity error -> tilt target [rad], per axis.
    pub velocity_x: StageGains,
    pub velocity_y: StageGains,

    /// Angle error -> angular rate target.
    pub roll_angle: StageGains,
    pub pitch_angle: StageGains,
    /// Angular rate error -> motor command correction.
    pub roll_rate: StageGains,
    pub pitch_rate: StageGains,

    /// Upper bound of the tilt-compensated thrust, as a multiple of the base.
    pub tilt_compensation_cap: f64,
    /// Below this `cos(tilt)` compensation is skipped.
    pub tilt_compensation_min_cos: f64,

    /// Initial targets `[x, y, z]` before any state machine writes them.
    pub initial_target: [f64; 3],
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            hover_feed_forward: 3.59,
            altitude: StageGains::p(2.0, 2.0),
            vertical_velocity: StageGains::pi(5.0, 2.0, 5.0),
            position_x: StageGains::p(0.5, 3.0),
            position_y: StageGains::p(0.5, 1.5),
            velocity_x: StageGains::p(0.4, 15f64.to_radians()),
            velocity_y: StageGains::p(0.4, 8f64.to_radians()),
            roll_angle: StageGains::p(4.0, 2.0),
            pitch_angle: StageGains::p(4.0, 2.0),
            roll_rate: StageGains::pid(0.75, 0.0, 0.05, 2.0),
            pitch_rate: StageGains::pid(0.75, 0.0, 0.05, 2.0),
            tilt_compensation_cap: 1.3,
            tilt_compensation_min_cos: 0.5,
            initial_target: [0.0, 0.0, 1.0],
        }
    }
}

impl ControllerConfig {
    pub fn validate(&self) -> CoreResult<()> {
        if !self.hover_feed_forward.is_finite() || self.hover_feed_forward <= 0.0 {
            return Err(CoreError::InvalidConfig(format!(
                "hover_feed_forward must be positive, got {}",
                self.hover_feed_forward
            )));
        }
        if self.tilt_compensation_cap < 1.0 {
            return Err(CoreError::InvalidConfig(format!(
                "tilt_compensation_cap must be >= 1.0, got {}",
                self.tilt_compensation_cap
            )));
        }
        if !(0.0..1.0).contains(&self.tilt_compensation_min_cos) {
            return Err(CoreError::InvalidConfig(format!(
                "tilt_compensation_min_cos must be in [0, 1), got {}",
                self.tilt_compensation_min_cos
            )));
        }
        Ok(())
    }
}

// =========================================================================
// == Mission / State Machine ==
// =========================================================================

/// # MissionConfig
/// Thresholds of the per-agent state machine and the allocation rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MissionConfig {
    /// Patrol altitude reached during TAKEOFF.
    pub cruise_altitude: f64,
    /// TAKEOFF ends once `|z - cruise_altitude|` drops below this.
    pub takeoff_tolerance: f64,
    /// Time spent in HOVER before patrolling [s].
    pub hover_settle_secs: f64,
    /// Horizontal acceptance radius for patrol waypoints.
    pub waypoint_radius: f64,
    /// RETURN accepts the waypoint within `waypoint_radius * return_radius_factor`.
    pub return_radius_factor: f64,
    /// Horizontal radius around a fire at which suppression starts.
    pub fire_radius: f64,
    /// Time spent over a fire before it is declared resolved [s].
    pub suppress_secs: f64,
    /// A peer counts as responding when its claim lies within this radius of the event.
    pub responder_radius: f64,
    /// Subtracted from the own distance when comparing against free peers.
    pub hysteresis: f64,
    /// How many agents should answer a single event.
    pub responder_quota: usize,
}

impl Default for MissionConfig {
    fn default() -> Self {
        Self {
            cruise_altitude: 8.0,
            takeoff_tolerance: 0.5,
            hover_settle_secs: 2.0,
            waypoint_radius: 2.0,
            return_radius_factor: 3.0,
            fire_radius: 2.5,
            suppress_secs: 5.0,
            responder_radius: 5.0,
            hysteresis: 0.5,
            responder_quota: 1,
        }
    }
}

impl MissionConfig {
    pub fn return_radius(&self) -> f64 {
        self.waypoint_radius * self.return_radius_factor
    }

    pub fn validate(&self) -> CoreResult<()> {
        let positive = [
            ("cruise_altitude", self.cruise_altitude),
            ("takeoff_tolerance", self.takeoff_tolerance),
            ("waypoint_radius", self.waypoint_radius),
            ("return_radius_factor", self.return_radius_factor),
            ("fire_radius", self.fire_radius),
            ("responder_radius", self.responder_radius),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(CoreError::InvalidConfig(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        if self.hover_settle_secs < 0.0 || self.suppress_secs < 0.0 || self.hysteresis < 0.0 {
            return Err(CoreError::InvalidConfig(
                "durations and hysteresis must not be negative".to_string(),
            ));
        }
        if self.responder_quota == 0 {
            return Err(CoreError::InvalidConfig(
                "responder_quota must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

// =========================================================================
// == Coverage ==
// =========================================================================

/// # CoverageConfig
/// Parameters of the square patrol area shared by the swarm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoverageConfig {
    /// Side of the square area `[0, area_size] x [0, area_size]`.
    pub area_size: f64,
    /// Distance between consecutive patrol rows.
    pub row_spacing: f64,
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self {
            area_size: 150.0,
            row_spacing: 8.0,
        }
    }
}

impl CoverageConfig {
    pub fn validate(&self) -> CoreResult<()> {
        if !self.area_size.is_finite() || self.area_size <= 0.0 {
            return Err(CoreError::InvalidConfig(format!(
                "area_size must be positive, got {}",
                self.area_size
            )));
        }
        if !self.row_spacing.is_finite() || self.row_spacing <= 0.0 {
            return Err(CoreError::InvalidConfig(format!(
                "row_spacing must be positive, got {}",
                self.row_spacing
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(ControllerConfig::default().validate().is_ok());
        assert!(MissionConfig::default().validate().is_ok());
        assert!(CoverageConfig::default().validate().is_ok());
    }

    #[test]
    fn test_return_radius_is_a_multiple_of_acceptance() {
        let mission = MissionConfig::default();
        assert_eq!(mission.return_radius(), 6.0);
    }

    #[test]
    fn test_zero_quota_is_rejected() {
        let mission = MissionConfig {
            responder_quota: 0,
            ..Default::default()
        };
        assert!(matches!(
            mission.validate(),
            Err(CoreError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_negative_row_spacing_is_rejected() {
        let coverage = CoverageConfig {
            row_spacing: -1.0,
            ..Default::default()
        };
        assert!(coverage.validate().is_err());
    }
}
