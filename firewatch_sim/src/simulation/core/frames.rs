// firewatch_sim/src/simulation/core/frames.rs

//! Conversions between the environment frame and the controller frame.
//!
//! The environment is Y-up. The controller uses `x`, `y` horizontal and `z`
//! up, so the environment's Y and Z axes swap places. The swap is its own
//! inverse and preserves distances.

use firewatch_core::types::{Euler, TelemetrySample};
use nalgebra::Vector3;

/// Environment (X, Y-up, Z) -> controller (x, y, z-up).
pub fn env_to_controller(v: &Vector3<f64>) -> Vector3<f64> {
    Vector3::new(v.x, v.z, v.y)
}

/// Controller (x, y, z-up) -> environment (X, Y-up, Z).
pub fn controller_to_env(v: &Vector3<f64>) -> Vector3<f64> {
    Vector3::new(v.x, v.z, v.y)
}

/// Builds a controller-frame sample from the raw channels
/// `X Y Z VX VY VZ TX TY TZ WX WY WZ`.
///
/// Roll is the rotation about the environment's Z axis, pitch about X and
/// yaw about the vertical Y.
pub fn telemetry_from_env(raw: &[f64; 12]) -> TelemetrySample {
    let [x, y, z, vx, vy, vz, tx, ty, tz, wx, wy, wz] = *raw;
    TelemetrySample {
        position: env_to_controller(&Vector3::new(x, y, z)),
        velocity: env_to_controller(&Vector3::new(vx, vy, vz)),
        attitude: Euler::new(tz, tx, ty),
        angular_rate: Euler::new(wz, wx, wy),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_telemetry_mapping() {
        let raw = [
            1.0, 8.0, 2.0, // X Y Z
            0.1, 0.2, 0.3, // VX VY VZ
            0.01, 0.02, 0.03, // TX TY TZ
            0.4, 0.5, 0.6, // WX WY WZ
        ];
        let sample = telemetry_from_env(&raw);
        assert_eq!(sample.position, Vector3::new(1.0, 2.0, 8.0));
        assert_abs_diff_eq!(sample.altitude(), 8.0);
        assert_eq!(sample.velocity, Vector3::new(0.1, 0.3, 0.2));
        assert_eq!(sample.attitude, Euler::new(0.03, 0.01, 0.02));
        assert_eq!(sample.angular_rate, Euler::new(0.6, 0.4, 0.5));
    }

    #[test]
    fn test_swap_round_trips_and_keeps_distance() {
        let a = Vector3::new(3.0, -4.0, 12.0);
        let b = Vector3::new(-1.0, 2.0, 0.5);
        assert_eq!(controller_to_env(&env_to_controller(&a)), a);
        assert_abs_diff_eq!(
            (a - b).norm(),
            (env_to_controller(&a) - env_to_controller(&b)).norm(),
            epsilon = 1e-12
        );
    }
}
