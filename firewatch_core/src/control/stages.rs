// firewatch_core/src/control/stages.rs

//! Single-input/single-output control primitives.
//!
//! Every stage takes an error that the caller has already computed
//! (`target - measurement`) and returns a command. The cascades in
//! [`crate::control::flight`] are built entirely out of these.

use crate::config::StageGains;

// =========================================================================
// == Saturation ==
// =========================================================================

/// Symmetric saturation. Returns `(clamped, in_saturation)`.
///
/// `input` is returned untouched (and `false`) iff `-limit <= input <= limit`.
pub fn saturate(input: f64, limit: f64) -> (f64, bool) {
    if input > limit {
        (limit, true)
    } else if input < -limit {
        (-limit, true)
    } else {
        (input, false)
    }
}

/// Applies an optional limit. A missing, non-finite or non-positive limit
/// disables saturation.
fn apply_limit(input: f64, limit: Option<f64>) -> (f64, bool) {
    match limit {
        Some(limit) if limit.is_finite() && limit > 0.0 => saturate(input, limit),
        _ => (input, false),
    }
}

// =========================================================================
// == Numeric Building Blocks ==
// =========================================================================

/// Forward Euler integrator: `acc += input * dt`.
#[derive(Debug, Clone, Default)]
pub struct EulerIntegrator {
    accumulator: f64,
}

impl EulerIntegrator {
    pub fn evaluate(&mut self, dt: f64, input: f64) -> f64 {
        self.accumulator += input * dt;
        self.accumulator
    }

    /// The current accumulated value, without advancing it.
    pub fn value(&self) -> f64 {
        self.accumulator
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

/// Backward finite difference: `(input - previous) / dt`.
///
/// The first sample after construction or [`reset`](Self::reset), and any
/// sample with `dt <= 0`, yields exactly 0 and only records the input.
#[derive(Debug, Clone, Default)]
pub struct BackwardDifference {
    previous: Option<f64>,
}

impl BackwardDifference {
    pub fn evaluate(&mut self, dt: f64, input: f64) -> f64 {
        let out = match self.previous {
            Some(previous) if dt > 0.0 => (input - previous) / dt,
            _ => 0.0,
        };
        self.previous = Some(input);
        out
    }

    pub fn reset(&mut self) {
        self.previous = None;
    }
}

// =========================================================================
// == Control Stages ==
// =========================================================================

/// The contract shared by all scalar stages.
pub trait ControlStage {
    /// Computes the stage output for an already-computed error.
    fn evaluate(&mut self, dt: f64, error: f64) -> f64;

    /// Clears any internal state (integrators, derivative history).
    fn reset(&mut self) {}
}

/// Pure proportional stage: `clamp(kp * error, ±sat)`.
#[derive(Debug, Clone)]
pub struct PController {
    pub kp: f64,
    pub saturation: Option<f64>,
}

impl PController {
    pub fn new(kp: f64, saturation: Option<f64>) -> Self {
        Self { kp, saturation }
    }
}

impl From<&StageGains> for PController {
    fn from(gains: &StageGains) -> Self {
        Self::new(gains.kp, gains.saturation)
    }
}

impl ControlStage for PController {
    fn evaluate(&mut self, _dt: f64, error: f64) -> f64 {
        apply_limit(self.kp * error, self.saturation).0
    }
}

/// Proportional-integral stage with anti-windup.
///
/// While the previous output was saturated the integral is frozen: its value
/// is still used, but the accumulator is not advanced.
#[derive(Debug, Clone)]
pub struct PiController {
    pub kp: f64,
    pub ki: f64,
    pub saturation: Option<f64>,
    integrator: EulerIntegrator,
    in_saturation: bool,
}

impl PiController {
    pub fn new(kp: f64, ki: f64, saturation: Option<f64>) -> Self {
        Self {
            kp,
            ki,
            saturation,
            integrator: EulerIntegrator::default(),
            in_saturation: false,
        }
    }

    /// `kp * e + ki * acc`, honouring the freeze but without clamping.
    ///
    /// Callers that compose this stage must follow up with
    /// [`report_saturation`](Self::report_saturation).
    pub fn unsaturated(&mut self, dt: f64, error: f64) -> f64 {
        let acc = if self.in_saturation {
            self.integrator.value()
        } else {
            self.integrator.evaluate(dt, error)
        };
        self.kp * error + self.ki * acc
    }

    /// Records whether the final output of this tick ended up saturated.
    pub fn report_saturation(&mut self, saturated: bool) {
        self.in_saturation = saturated;
    }

    pub fn integral(&self) -> f64 {
        self.integrator.value()
    }

    pub fn in_saturation(&self) -> bool {
        self.in_saturation
    }
}

impl From<&StageGains> for PiController {
    fn from(gains: &StageGains) -> Self {
        Self::new(gains.kp, gains.ki, gains.saturation)
    }
}

impl ControlStage for PiController {
    fn evaluate(&mut self, dt: f64, error: f64) -> f64 {
        let raw = self.unsaturated(dt, error);
        let (out, saturated) = apply_limit(raw, self.saturation);
        self.report_saturation(saturated);
        out
    }

    fn reset(&mut self) {
        self.integrator.reset();
        self.in_saturation = false;
    }
}

/// PID stage composed from a [`PiController`] and a [`BackwardDifference`].
///
/// The limit is applied once, to the combined P+I+D sum. The PI part never
/// clamps on its own, otherwise the derivative could push the output past
/// the limit on a setpoint step.
#[derive(Debug, Clone)]
pub struct PidController {
    pi: PiController,
    pub kd: f64,
    derivative: BackwardDifference,
}

impl PidController {
    pub fn new(kp: f64, ki: f64, kd: f64, saturation: Option<f64>) -> Self {
        Self {
            pi: PiController::new(kp, ki, saturation),
            kd,
            derivative: BackwardDifference::default(),
        }
    }

    pub fn integral(&self) -> f64 {
        self.pi.integral()
    }

    pub fn in_saturation(&self) -> bool {
        self.pi.in_saturation()
    }
}

impl From<&StageGains> for PidController {
    fn from(gains: &StageGains) -> Self {
        Self::new(gains.kp, gains.ki, gains.kd, gains.saturation)
    }
}

impl ControlStage for PidController {
    fn evaluate(&mut self, dt: f64, error: f64) -> f64 {
        let pi = self.pi.unsaturated(dt, error);
        let d = self.kd * self.derivative.evaluate(dt, error);
        let (out, saturated) = apply_limit(pi + d, self.pi.saturation);
        self.pi.report_saturation(saturated);
        out
    }

    fn reset(&mut self) {
        self.pi.reset();
        self.derivative.reset();
    }
}
