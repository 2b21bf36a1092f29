// firewatch_core/src/control/flight.rs

//! Cascaded quad-rotor flight controller.
//!
//! ```text
//!  altitude:   z_tgt -> [P] -> vz_tgt -> [PI] -> f_corr ; f_base = hover_ff + f_corr
//!  position:   x_tgt -> [P] -> vx_tgt -> [P] -> -roll_tgt
//!              y_tgt -> [P] -> vy_tgt -> [P] ->  pitch_tgt
//!  attitude:   roll_tgt  -> [P] -> roll_rate_tgt  -> [PID] -> roll_cmd
//!              pitch_tgt -> [P] -> pitch_rate_tgt -> [PID] -> pitch_cmd
//!  output:     f = tilt_compensate(f_base) ; X-quad mixer ; floor at 0
//! ```

use crate::config::ControllerConfig;
use crate::control::stages::{ControlStage, PController, PiController, PidController};
use crate::types::{FlightTargets, TelemetrySample};

/// Which parts of the cascade run this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMode {
    /// Vertical ascent only: every motor gets the altitude-loop thrust.
    AltitudeOnly,
    /// Altitude, horizontal position and attitude loops.
    Full,
}

/// Intermediate values of the last evaluation, kept for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CascadeTrace {
    pub vz_target: f64,
    pub thrust_base: f64,
    pub vx_target: f64,
    pub vy_target: f64,
    pub roll_target: f64,
    pub pitch_target: f64,
    pub roll_cmd: f64,
    pub pitch_cmd: f64,
    pub collective: f64,
}

/// Divides `base` by `cos(tilt)` to recover the lift lost to tilting.
///
/// The result is capped at `base * cap`; when `cos(tilt) <= min_cos` the
/// uncompensated base is returned.
pub fn tilt_compensate(base: f64, roll: f64, pitch: f64, cap: f64, min_cos: f64) -> f64 {
    let tilt = (roll * roll + pitch * pitch).sqrt();
    let cos_tilt = tilt.cos();
    if cos_tilt > min_cos {
        (base / cos_tilt).min(base * cap)
    } else {
        base
    }
}

/// X-quad mixer. Motors are front-right, front-left, rear-left, rear-right.
/// Rotors cannot brake, so every output is floored at zero.
pub fn mix(collective: f64, roll_cmd: f64, pitch_cmd: f64) -> [f64; 4] {
    [
        collective + roll_cmd - pitch_cmd,
        collective - roll_cmd - pitch_cmd,
        collective - roll_cmd + pitch_cmd,
        collective + roll_cmd + pitch_cmd,
    ]
    .map(|f| f.max(0.0))
}

#[derive(Debug, Clone)]
pub struct FlightController {
    hover_feed_forward: f64,
    tilt_compensation_cap: f64,
    tilt_compensation_min_cos: f64,

    altitude: PController,
    vertical_velocity: PiController,

    position_x: PController,
    position_y: PController,
    velocity_x: PController,
    velocity_y: PController,

    roll_angle: PController,
    pitch_angle: PController,
    roll_rate: PidController,
    pitch_rate: PidController,

    targets: FlightTargets,
    trace: CascadeTrace,
}

impl FlightController {
    pub fn new(config: &ControllerConfig) -> Self {
        Self {
            hover_feed_forward: config.hover_feed_forward,
            tilt_compensation_cap: config.tilt_compensation_cap,
            tilt_compensation_min_cos: config.tilt_compensation_min_cos,
            altitude: (&config.altitude).into(),
            vertical_velocity: (&config.vertical_velocity).into(),
            position_x: (&config.position_x).into(),
            position_y: (&config.position_y).into(),
            velocity_x: (&config.velocity_x).into(),
            velocity_y: (&config.velocity_y).into(),
            roll_angle: (&config.roll_angle).into(),
            pitch_angle: (&config.pitch_angle).into(),
            roll_rate: (&config.roll_rate).into(),
            pitch_rate: (&config.pitch_rate).into(),
            targets: config.initial_target.into(),
            trace: CascadeTrace::default(),
        }
    }

    /// Sparse target update; `None` leaves the stored component unchanged.
    pub fn set_target(&mut self, x: Option<f64>, y: Option<f64>, z: Option<f64>) {
        self.targets.set(x, y, z);
    }

    pub fn targets(&self) -> FlightTargets {
        self.targets
    }

    pub fn trace(&self) -> &CascadeTrace {
        &self.trace
    }

    /// Clears the inner attitude-rate stages.
    pub fn reset_attitude_rates(&mut self) {
        self.roll_rate.reset();
        self.pitch_rate.reset();
    }

    /// Runs the cascade and returns the four motor thrusts.
    pub fn evaluate(&mut self, dt: f64, state: &TelemetrySample, mode: ControlMode) -> [f64; 4] {
        let thrust_base = self.altitude_thrust(dt, state);

        if mode == ControlMode::AltitudeOnly {
            // Keeps stale rate history out of the first full tick.
            self.reset_attitude_rates();
            self.trace.collective = thrust_base;
            self.trace.roll_cmd = 0.0;
            self.trace.pitch_cmd = 0.0;
            return [thrust_base; 4];
        }

        let (roll_target, pitch_target) = self.tilt_targets(dt, state);
        let (roll_cmd, pitch_cmd) = self.attitude_commands(dt, state, roll_target, pitch_target);

        let collective = tilt_compensate(
            thrust_base,
            state.attitude.roll,
            state.attitude.pitch,
            self.tilt_compensation_cap,
            self.tilt_compensation_min_cos,
        );
        self.trace.roll_cmd = roll_cmd;
        self.trace.pitch_cmd = pitch_cmd;
        self.trace.collective = collective;

        mix(collective, roll_cmd, pitch_cmd)
    }

    /// Altitude P -> vertical velocity PI, plus the hover feed-forward.
    fn altitude_thrust(&mut self, dt: f64, state: &TelemetrySample) -> f64 {
        let vz_target = self
            .altitude
            .evaluate(dt, self.targets.z - state.position.z);
        let correction = self
            .vertical_velocity
            .evaluate(dt, vz_target - state.velocity.z);
        let thrust_base = self.hover_feed_forward + correction;

        self.trace.vz_target = vz_target;
        self.trace.thrust_base = thrust_base;
        thrust_base
    }

    /// Position P -> velocity P for both horizontal axes.
    /// Roll acts against the x error in this body frame, hence the sign flip.
    fn tilt_targets(&mut self, dt: f64, state: &TelemetrySample) -> (f64, f64) {
        let vx_target = self
            .position_x
            .evaluate(dt, self.targets.x - state.position.x);
        let roll_target = -self
            .velocity_x
            .evaluate(dt, vx_target - state.velocity.x);

        let vy_target = self
            .position_y
            .evaluate(dt, self.targets.y - state.position.y);
        let pitch_target = self
            .velocity_y
            .evaluate(dt, vy_target - state.velocity.y);

        self.trace.vx_target = vx_target;
        self.trace.vy_target = vy_target;
        self.trace.roll_target = roll_target;
        self.trace.pitch_target = pitch_target;
        (roll_target, pitch_target)
    }

    /// Angle P -> rate PID for roll and pitch.
    fn attitude_commands(
        &mut self,
        dt: f64,
        state: &TelemetrySample,
        roll_target: f64,
        pitch_target: f64,
    ) -> (f64, f64) {
        let pitch_rate_target = self
            .pitch_angle
            .evaluate(dt, pitch_target - state.attitude.pitch);
        let pitch_cmd = self
            .pitch_rate
            .evaluate(dt, pitch_rate_target - state.angular_rate.pitch);

        let roll_rate_target = self
            .roll_angle
            .evaluate(dt, roll_target - state.attitude.roll);
        let roll_cmd = self
            .roll_rate
            .evaluate(dt, roll_rate_target - state.angular_rate.roll);

        (roll_cmd, pitch_cmd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StageGains;
    use crate::types::Euler;
    use approx::assert_abs_diff_eq;
    use nalgebra::Vector3;

    const DT: f64 = 1.0 / 60.0;

    fn hovering_at(z: f64) -> TelemetrySample {
        TelemetrySample {
            position: Vector3::new(0.0, 0.0, z),
            ..Default::default()
        }
    }

    #[test]
    fn test_hover_feed_forward_equilibrium() {
        let mut ctrl = FlightController::new(&ControllerConfig::default());
        ctrl.set_target(None, None, Some(8.0));
        let thrusts = ctrl.evaluate(DT, &hovering_at(8.0), ControlMode::AltitudeOnly);
        assert_eq!(ctrl.trace().thrust_base, 3.59);
        assert_eq!(thrusts, [3.59; 4]);
    }

    #[test]
    fn test_altitude_error_raises_thrust() {
        let mut ctrl = FlightController::new(&ControllerConfig::default());
        ctrl.set_target(None, None, Some(8.0));
        ctrl.evaluate(DT, &hovering_at(0.0), ControlMode::AltitudeOnly);
        // Outer P saturates at 2 m/s, inner PI saturates at 5.
        assert_abs_diff_eq!(ctrl.trace().vz_target, 2.0);
        assert_abs_diff_eq!(ctrl.trace().thrust_base, 3.59 + 5.0);
    }

    #[test]
    fn test_full_mode_level_hover_is_symmetric() {
        let mut ctrl = FlightController::new(&ControllerConfig::default());
        ctrl.set_target(Some(0.0), Some(0.0), Some(8.0));
        let thrusts = ctrl.evaluate(DT, &hovering_at(8.0), ControlMode::Full);
        for f in thrusts {
            assert_abs_diff_eq!(f, 3.59, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_horizontal_axis_signs() {
        let mut ctrl = FlightController::new(&ControllerConfig::default());
        ctrl.set_target(Some(10.0), Some(10.0), Some(8.0));
        ctrl.evaluate(DT, &hovering_at(8.0), ControlMode::Full);
        let trace = ctrl.trace();
        assert!(trace.vx_target > 0.0);
        assert!(trace.roll_target < 0.0);
        assert!(trace.vy_target > 0.0);
        assert!(trace.pitch_target > 0.0);
        // Tilt targets respect their velocity-stage limits.
        assert_abs_diff_eq!(trace.roll_target, -15f64.to_radians(), epsilon = 1e-12);
        assert_abs_diff_eq!(trace.pitch_target, 8f64.to_radians(), epsilon = 1e-12);
    }

    #[test]
    fn test_tilt_compensation_bounds() {
        // Level: untouched.
        assert_abs_diff_eq!(tilt_compensate(4.0, 0.0, 0.0, 1.3, 0.5), 4.0);
        // Small tilt: plain 1/cos.
        let tilt = 0.2_f64;
        assert_abs_diff_eq!(
            tilt_compensate(4.0, tilt, 0.0, 1.3, 0.5),
            4.0 / tilt.cos(),
            epsilon = 1e-12
        );
        // cos = 0.6 would need x1.67, capped at x1.3.
        let tilt = 0.6_f64.acos();
        assert_abs_diff_eq!(tilt_compensate(4.0, 0.0, tilt, 1.3, 0.5), 5.2, epsilon = 1e-12);
        // Beyond ~60 degrees compensation is skipped entirely.
        let steep = 70f64.to_radians();
        assert_abs_diff_eq!(tilt_compensate(4.0, steep, 0.0, 1.3, 0.5), 4.0);
    }

    #[test]
    fn test_mixer_sign_pattern() {
        let [f1, f2, f3, f4] = mix(5.0, 1.0, 0.5);
        assert_abs_diff_eq!(f1, 5.5);
        assert_abs_diff_eq!(f2, 3.5);
        assert_abs_diff_eq!(f3, 4.5);
        assert_abs_diff_eq!(f4, 6.5);
    }

    #[test]
    fn test_mixer_floors_negative_thrust() {
        let cases = [(0.5, 2.0, 0.0), (0.0, -1.0, 1.0), (1.0, 1.0, 3.0), (-2.0, 0.0, 0.0)];
        for (f, roll, pitch) in cases {
            let raw = [f + roll - pitch, f - roll - pitch, f - roll + pitch, f + roll + pitch];
            let mixed = mix(f, roll, pitch);
            for (out, raw) in mixed.iter().zip(raw) {
                if raw < 0.0 {
                    assert_eq!(*out, 0.0);
                } else {
                    assert_eq!(*out, raw);
                }
            }
        }
    }

    #[test]
    fn test_altitude_only_resets_rate_stages() {
        let config = ControllerConfig {
            roll_rate: StageGains::pid(0.75, 1.0, 0.05, 2.0),
            pitch_rate: StageGains::pid(0.75, 1.0, 0.05, 2.0),
            ..Default::default()
        };
        let mut ctrl = FlightController::new(&config);
        let mut state = hovering_at(1.0);
        state.angular_rate = Euler::new(0.3, -0.2, 0.0);

        ctrl.evaluate(DT, &state, ControlMode::Full);
        assert!(ctrl.roll_rate.integral() != 0.0);
        assert!(ctrl.pitch_rate.integral() != 0.0);

        let thrusts = ctrl.evaluate(DT, &state, ControlMode::AltitudeOnly);
        assert_eq!(ctrl.roll_rate.integral(), 0.0);
        assert_eq!(ctrl.pitch_rate.integral(), 0.0);
        assert!(thrusts.iter().all(|&f| f == thrusts[0]));
    }

    #[test]
    fn test_set_target_is_sparse() {
        let mut ctrl = FlightController::new(&ControllerConfig::default());
        assert_eq!(ctrl.targets(), FlightTargets::from([0.0, 0.0, 1.0]));
        ctrl.set_target(Some(3.0), None, None);
        ctrl.set_target(None, None, Some(8.0));
        assert_eq!(ctrl.targets(), FlightTargets::from([3.0, 0.0, 8.0]));
    }
}
