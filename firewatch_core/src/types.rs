// firewatch_core/src/types.rs

use nalgebra::{Vector2, Vector3};
use std::fmt;
use std::num::NonZeroU32;

// --- Core Identifiers ---

/// Index of an agent inside its swarm (`0..n_agents`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct AgentId(pub usize);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a fire event as broadcast by the environment.
///
/// The environment encodes ids as small integers carried in a float, and
/// `0` means "no event". Equality is exact floating-point equality, which
/// only holds up while ids are assigned rather than computed.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct FireId(f64);

impl FireId {
    /// Interprets a raw bus value. Zero (and NaN) mean "no event".
    pub fn from_raw(raw: f64) -> Option<Self> {
        if raw == 0.0 || raw.is_nan() {
            None
        } else {
            Some(Self(raw))
        }
    }

    pub fn raw(self) -> f64 {
        self.0
    }
}

impl From<NonZeroU32> for FireId {
    fn from(id: NonZeroU32) -> Self {
        Self(id.get() as f64)
    }
}

impl fmt::Display for FireId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.0}", self.0)
    }
}

// --- Telemetry ---

/// Roll / pitch / yaw triple, used both for angles [rad] and rates [rad/s].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Euler {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

impl Euler {
    pub fn new(roll: f64, pitch: f64, yaw: f64) -> Self {
        Self { roll, pitch, yaw }
    }
}

/// Instantaneous vehicle state for one tick, in the controller frame:
/// `x`, `y` horizontal and `z` up.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TelemetrySample {
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
    pub attitude: Euler,
    pub angular_rate: Euler,
}

impl TelemetrySample {
    /// Horizontal projection of the position.
    pub fn horizontal(&self) -> Vector2<f64> {
        self.position.xy()
    }

    pub fn altitude(&self) -> f64 {
        self.position.z
    }
}

// --- Targets ---

/// Desired position in the controller frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlightTargets {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl FlightTargets {
    /// Sparse update: each provided component overwrites the stored one.
    pub fn set(&mut self, x: Option<f64>, y: Option<f64>, z: Option<f64>) {
        if let Some(x) = x {
            self.x = x;
        }
        if let Some(y) = y {
            self.y = y;
        }
        if let Some(z) = z {
            self.z = z;
        }
    }
}

impl From<[f64; 3]> for FlightTargets {
    fn from(v: [f64; 3]) -> Self {
        Self {
            x: v[0],
            y: v[1],
            z: v[2],
        }
    }
}
