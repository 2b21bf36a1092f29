// firewatch_core/src/agent/fsm.rs

//! Per-agent mission logic.
//!
//! One [`Agent`] owns its state machine, its flight controller and its patrol
//! route. The host feeds it one telemetry sample, a peer snapshot and the fire
//! feed per tick and publishes whatever [`TickOutput`] comes back. Nothing in
//! here touches the network.

use nalgebra::{Vector2, Vector3};
use tracing::{debug, info};

use crate::agent::allocation::{AllocationRule, Verdict};
use crate::agent::state::AgentState;
use crate::config::{ControllerConfig, CoverageConfig, MissionConfig};
use crate::control::flight::{ControlMode, FlightController};
use crate::error::{CoreError, CoreResult};
use crate::messages::{AgentBroadcast, FireEvent, FireFeed, PeerSnapshot, TickOutput};
use crate::planning::CoveragePlanner;
use crate::types::{AgentId, FireId, TelemetrySample};

/// A fire this agent has committed to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FireClaim {
    pub id: FireId,
    pub position: Vector3<f64>,
}

impl From<FireEvent> for FireClaim {
    fn from(event: FireEvent) -> Self {
        Self {
            id: event.id,
            position: event.position,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Agent {
    id: AgentId,
    mission: MissionConfig,
    rule: AllocationRule,
    controller: FlightController,

    state: AgentState,
    waypoints: Vec<Vector2<f64>>,
    waypoint_index: usize,
    claim: Option<FireClaim>,

    /// Sum of every `dt` seen so far [s].
    mission_time: f64,
    hover_started_at: f64,
    suppress_elapsed: f64,

    /// Fire this agent resolved most recently. The global feed may lag behind it.
    last_resolved: Option<FireId>,
    /// Last fire whose allocation verdict was logged.
    last_logged_fire: Option<FireId>,
}

impl Agent {
    pub fn new(
        id: AgentId,
        waypoints: Vec<Vector2<f64>>,
        mission: MissionConfig,
        controller: &ControllerConfig,
    ) -> CoreResult<Self> {
        if waypoints.is_empty() {
            return Err(CoreError::NoWaypoints(id.0));
        }
        mission.validate()?;
        controller.validate()?;

        Ok(Self {
            id,
            rule: AllocationRule::from(&mission),
            mission,
            controller: FlightController::new(controller),
            state: AgentState::Idle,
            waypoints,
            waypoint_index: 0,
            claim: None,
            mission_time: 0.0,
            hover_started_at: 0.0,
            suppress_elapsed: 0.0,
            last_resolved: None,
            last_logged_fire: None,
        })
    }

    /// Builds agent `index` of a `count`-strong swarm with its coverage sector.
    pub fn for_swarm(
        index: usize,
        count: usize,
        mission: MissionConfig,
        controller: &ControllerConfig,
        coverage: &CoverageConfig,
    ) -> CoreResult<Self> {
        let waypoints = CoveragePlanner::sector(index, count, coverage)?;
        Self::new(AgentId(index), waypoints, mission, controller)
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    pub fn waypoint_index(&self) -> usize {
        self.waypoint_index
    }

    pub fn current_waypoint(&self) -> Vector2<f64> {
        self.waypoints[self.waypoint_index]
    }

    pub fn claim(&self) -> Option<FireClaim> {
        self.claim
    }

    pub fn controller(&self) -> &FlightController {
        &self.controller
    }

    /// Leaves `Idle` and starts climbing. No effect in any other state.
    pub fn engage(&mut self) {
        if self.state == AgentState::Idle {
            self.controller
                .set_target(None, None, Some(self.mission.cruise_altitude));
            self.controller.reset_attitude_rates();
            self.transition(AgentState::Takeoff);
        }
    }

    /// Advances the agent by one tick.
    pub fn step(
        &mut self,
        dt: f64,
        telemetry: &TelemetrySample,
        peers: &PeerSnapshot,
        fires: &FireFeed,
    ) -> TickOutput {
        self.mission_time += dt;

        let resolved_fire = self.update_state(dt, telemetry, peers, fires);

        let thrusts = match self.state {
            AgentState::Idle => [0.0; 4],
            AgentState::Takeoff => {
                self.controller
                    .evaluate(dt, telemetry, ControlMode::AltitudeOnly)
            }
            _ => self.controller.evaluate(dt, telemetry, ControlMode::Full),
        };

        TickOutput {
            thrusts,
            broadcast: AgentBroadcast {
                state: self.state,
                position: telemetry.position,
                claimed_fire: self.claim.map(|c| c.position),
            },
            resolved_fire,
            targets: self.controller.targets(),
        }
    }

    // =========================================================================
    // == State Handlers ==
    // =========================================================================

    /// Runs the handler of the current state. Returns the id of a fire that
    /// was resolved during this tick.
    fn update_state(
        &mut self,
        dt: f64,
        telemetry: &TelemetrySample,
        peers: &PeerSnapshot,
        fires: &FireFeed,
    ) -> Option<FireId> {
        match self.state {
            AgentState::Idle => None,
            AgentState::Takeoff => {
                self.takeoff(telemetry);
                None
            }
            AgentState::Hover => {
                self.hover(telemetry);
                None
            }
            AgentState::Explore => {
                self.explore(telemetry);
                self.check_fire(telemetry, peers, fires);
                None
            }
            AgentState::Move => {
                self.move_to_fire(telemetry, fires);
                None
            }
            AgentState::Suppress => self.suppress(dt),
            AgentState::Return => {
                self.return_to_route(telemetry);
                self.check_fire(telemetry, peers, fires);
                None
            }
        }
    }

    fn takeoff(&mut self, telemetry: &TelemetrySample) {
        let cruise = self.mission.cruise_altitude;
        self.controller.set_target(None, None, Some(cruise));

        if (telemetry.altitude() - cruise).abs() < self.mission.takeoff_tolerance {
            self.hold_position(telemetry);
            self.hover_started_at = self.mission_time;
            self.transition(AgentState::Hover);
        }
    }

    fn hover(&mut self, telemetry: &TelemetrySample) {
        self.hold_position(telemetry);

        if self.mission_time - self.hover_started_at > self.mission.hover_settle_secs {
            self.waypoint_index = self.nearest_waypoint(&telemetry.horizontal());
            self.target_waypoint();
            self.transition(AgentState::Explore);
        }
    }

    fn explore(&mut self, telemetry: &TelemetrySample) {
        let distance = (telemetry.horizontal() - self.current_waypoint()).norm();
        if distance < self.mission.waypoint_radius {
            self.waypoint_index = (self.waypoint_index + 1) % self.waypoints.len();
            debug!(agent = %self.id, waypoint = self.waypoint_index, "next waypoint");
            self.target_waypoint();
        }
    }

    fn move_to_fire(&mut self, telemetry: &TelemetrySample, fires: &FireFeed) {
        let Some(claim) = self.claim else {
            self.transition(AgentState::Explore);
            return;
        };

        if fires.is_resolved(claim.id) {
            info!(agent = %self.id, fire = %claim.id, "fire resolved by a peer, abandoning");
            self.claim = None;
            self.transition(AgentState::Return);
            return;
        }

        let distance = (telemetry.horizontal() - claim.position.xy()).norm();
        if distance < self.mission.fire_radius {
            self.suppress_elapsed = 0.0;
            self.transition(AgentState::Suppress);
        }
    }

    fn suppress(&mut self, dt: f64) -> Option<FireId> {
        let Some(claim) = self.claim else {
            self.transition(AgentState::Return);
            return None;
        };

        self.controller
            .set_target(Some(claim.position.x), Some(claim.position.y), None);
        self.suppress_elapsed += dt;

        if self.suppress_elapsed >= self.mission.suppress_secs {
            info!(agent = %self.id, fire = %claim.id, "fire suppressed");
            self.claim = None;
            self.last_resolved = Some(claim.id);
            self.transition(AgentState::Return);
            return Some(claim.id);
        }
        None
    }

    fn return_to_route(&mut self, telemetry: &TelemetrySample) {
        self.target_waypoint();
        let distance = (telemetry.horizontal() - self.current_waypoint()).norm();
        if distance < self.mission.return_radius() {
            self.transition(AgentState::Explore);
        }
    }

    /// Considers the latest fire event and claims it if the allocation rule
    /// says so.
    fn check_fire(&mut self, telemetry: &TelemetrySample, peers: &PeerSnapshot, fires: &FireFeed) {
        let Some(event) = fires.unresolved() else {
            return;
        };
        if self.claim.map(|c| c.id) == Some(event.id) || self.last_resolved == Some(event.id) {
            return;
        }

        let verdict = self
            .rule
            .evaluate(self.state, &telemetry.position, &event.position, peers);

        if self.last_logged_fire != Some(event.id) {
            self.last_logged_fire = Some(event.id);
            debug!(agent = %self.id, fire = %event.id, ?verdict, "allocation evaluated");
        }

        if verdict == Verdict::Accept {
            info!(
                agent = %self.id,
                fire = %event.id,
                x = event.position.x,
                y = event.position.y,
                "claiming fire"
            );
            self.claim = Some(event.into());
            self.controller
                .set_target(Some(event.position.x), Some(event.position.y), None);
            self.transition(AgentState::Move);
        }
    }

    // =========================================================================
    // == Helpers ==
    // =========================================================================

    fn hold_position(&mut self, telemetry: &TelemetrySample) {
        self.controller
            .set_target(Some(telemetry.position.x), Some(telemetry.position.y), None);
    }

    fn target_waypoint(&mut self) {
        let wp = self.current_waypoint();
        self.controller.set_target(Some(wp.x), Some(wp.y), None);
    }

    fn nearest_waypoint(&self, position: &Vector2<f64>) -> usize {
        self.waypoints
            .iter()
            .enumerate()
            .map(|(i, wp)| (i, (wp - position).norm_squared()))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
            .unwrap_or(0)
    }

    fn transition(&mut self, next: AgentState) {
        if next != self.state {
            info!(agent = %self.id, from = %self.state, to = %next, t = self.mission_time, "state transition");
            self.state = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::PeerRecord;
    use approx::assert_abs_diff_eq;

    const DT: f64 = 1.0 / 60.0;
    const GRAVITY: f64 = 9.81;

    fn route() -> Vec<Vector2<f64>> {
        vec![
            Vector2::new(10.0, 0.0),
            Vector2::new(30.0, 0.0),
            Vector2::new(30.0, 8.0),
            Vector2::new(10.0, 8.0),
        ]
    }

    fn agent() -> Agent {
        Agent::new(
            AgentId(0),
            route(),
            MissionConfig::default(),
            &ControllerConfig::default(),
        )
        .unwrap()
    }

    fn at(x: f64, y: f64, z: f64) -> TelemetrySample {
        TelemetrySample {
            position: Vector3::new(x, y, z),
            ..Default::default()
        }
    }

    fn quiet() -> FireFeed {
        FireFeed::default()
    }

    fn fire(id: f64, x: f64, y: f64) -> FireEvent {
        FireEvent {
            id: FireId::from_raw(id).unwrap(),
            position: Vector3::new(x, y, 0.0),
        }
    }

    /// Skips takeoff and hover by teleporting to cruise altitude near `(x, y)`.
    fn exploring_agent_at(x: f64, y: f64) -> Agent {
        let mut agent = agent();
        agent.engage();
        let peers = PeerSnapshot::new();
        agent.step(DT, &at(x, y, 8.0), &peers, &quiet());
        assert_eq!(agent.state(), AgentState::Hover);
        agent.step(2.5, &at(x, y, 8.0), &peers, &quiet());
        assert_eq!(agent.state(), AgentState::Explore);
        agent
    }

    #[test]
    fn test_empty_route_is_rejected() {
        let result = Agent::new(
            AgentId(3),
            Vec::new(),
            MissionConfig::default(),
            &ControllerConfig::default(),
        );
        assert_eq!(result.err(), Some(CoreError::NoWaypoints(3)));
    }

    #[test]
    fn test_idle_agent_outputs_zero_thrust() {
        let mut agent = agent();
        let out = agent.step(DT, &at(0.0, 0.0, 0.0), &PeerSnapshot::new(), &quiet());
        assert_eq!(out.thrusts, [0.0; 4]);
        assert_eq!(agent.state(), AgentState::Idle);
        assert_eq!(out.broadcast.status_code(), 0.0);
    }

    #[test]
    fn test_takeoff_reaches_hover_with_point_mass() {
        // Vertical point mass whose weight is exactly balanced by the feed-forward.
        let mass = 4.0 * ControllerConfig::default().hover_feed_forward / GRAVITY;
        let mut z = 0.0;
        let mut vz = 0.0;

        let mut agent = agent();
        agent.engage();
        assert_eq!(agent.state(), AgentState::Takeoff);

        let peers = PeerSnapshot::new();
        let mut ticks = 0;
        while agent.state() == AgentState::Takeoff {
            assert!(ticks < 1200, "still climbing after {ticks} ticks, z = {z}");
            let sample = TelemetrySample {
                position: Vector3::new(0.0, 0.0, z),
                velocity: Vector3::new(0.0, 0.0, vz),
                ..Default::default()
            };
            let out = agent.step(DT, &sample, &peers, &quiet());
            let thrusts = out.thrusts;
            if agent.state() == AgentState::Takeoff {
                // Altitude-only mode drives all motors identically.
                assert!(thrusts.iter().all(|f| *f == thrusts[0]));
            }
            let accel = thrusts.iter().sum::<f64>() / mass - GRAVITY;
            vz += accel * DT;
            z += vz * DT;
            if z < 0.0 {
                z = 0.0;
                vz = vz.max(0.0);
            }
            ticks += 1;
        }
        assert_eq!(agent.state(), AgentState::Hover);

        // Keeps holding altitude while settling.
        for _ in 0..60 {
            let sample = TelemetrySample {
                position: Vector3::new(0.0, 0.0, z),
                velocity: Vector3::new(0.0, 0.0, vz),
                ..Default::default()
            };
            let out = agent.step(DT, &sample, &peers, &quiet());
            let accel = out.thrusts.iter().sum::<f64>() / mass - GRAVITY;
            vz += accel * DT;
            z += vz * DT;
        }
        assert_eq!(agent.state(), AgentState::Hover);
        assert!((z - 8.0).abs() < 0.5, "z = {z}");
    }

    #[test]
    fn test_hover_holds_position_then_picks_nearest_waypoint() {
        let mut agent = agent();
        agent.engage();
        let peers = PeerSnapshot::new();
        let near_third = at(29.0, 7.0, 8.0);

        let out = agent.step(0.5, &near_third, &peers, &quiet());
        assert_eq!(agent.state(), AgentState::Hover);
        assert_abs_diff_eq!(out.targets.x, 29.0);
        assert_abs_diff_eq!(out.targets.y, 7.0);

        // 1.5 s into the hover: not settled yet.
        for _ in 0..3 {
            agent.step(0.5, &near_third, &peers, &quiet());
        }
        assert_eq!(agent.state(), AgentState::Hover);

        agent.step(0.6, &near_third, &peers, &quiet());
        assert_eq!(agent.state(), AgentState::Explore);
        assert_eq!(agent.waypoint_index(), 2);
        let targets = agent.controller().targets();
        assert_abs_diff_eq!(targets.x, 30.0);
        assert_abs_diff_eq!(targets.y, 8.0);
        assert_abs_diff_eq!(targets.z, 8.0);
    }

    #[test]
    fn test_explore_cycles_through_route() {
        let mut agent = exploring_agent_at(10.0, 0.0);
        let peers = PeerSnapshot::new();
        let start = agent.waypoint_index();
        assert_eq!(start, 0);

        let mut visited = Vec::new();
        for _ in 0..route().len() {
            let wp = agent.current_waypoint();
            agent.step(DT, &at(wp.x + 0.5, wp.y, 8.0), &peers, &quiet());
            visited.push(agent.waypoint_index());
        }
        assert_eq!(visited, vec![1, 2, 3, 0]);
        assert_eq!(agent.state(), AgentState::Explore);
    }

    #[test]
    fn test_explore_waits_outside_waypoint_radius() {
        let mut agent = exploring_agent_at(10.0, 0.0);
        agent.step(DT, &at(20.0, 0.0, 8.0), &PeerSnapshot::new(), &quiet());
        assert_eq!(agent.waypoint_index(), 0);
    }

    #[test]
    fn test_full_fire_response_cycle() {
        let mut agent = exploring_agent_at(10.0, 0.0);
        let peers = PeerSnapshot::new();
        let event = fire(1.0, 20.0, 40.0);
        let feed = FireFeed {
            latest: Some(event),
            resolved: None,
        };

        // Claim.
        let out = agent.step(DT, &at(10.0, 0.0, 8.0), &peers, &feed);
        assert_eq!(agent.state(), AgentState::Move);
        assert_eq!(agent.claim().map(|c| c.id), Some(event.id));
        assert_abs_diff_eq!(out.targets.x, 20.0);
        assert_abs_diff_eq!(out.targets.y, 40.0);
        assert_eq!(out.broadcast.claimed_fire, Some(event.position));
        assert_eq!(out.broadcast.status_code(), 2.0);

        // Still en route.
        agent.step(DT, &at(15.0, 20.0, 8.0), &peers, &feed);
        assert_eq!(agent.state(), AgentState::Move);

        // Arrival, horizontal distance only.
        agent.step(DT, &at(21.0, 41.0, 8.0), &peers, &feed);
        assert_eq!(agent.state(), AgentState::Suppress);

        let mut resolved = None;
        let mut elapsed = 0.0;
        while resolved.is_none() {
            let out = agent.step(0.5, &at(20.0, 40.0, 8.0), &peers, &feed);
            resolved = out.resolved_fire;
            elapsed += 0.5;
            assert!(elapsed <= 5.0);
        }
        assert_abs_diff_eq!(elapsed, 5.0);
        assert_eq!(resolved, Some(event.id));
        assert_eq!(agent.state(), AgentState::Return);
        assert_eq!(agent.claim(), None);

        // Does not reclaim its own fire before the resolution is echoed back.
        agent.step(DT, &at(20.0, 40.0, 8.0), &peers, &feed);
        assert_eq!(agent.state(), AgentState::Return);

        let after = FireFeed {
            latest: Some(event),
            resolved: Some(event.id),
        };
        let wp = agent.current_waypoint();
        let out = agent.step(DT, &at(20.0, 40.0, 8.0), &peers, &after);
        assert_eq!(agent.state(), AgentState::Return);
        assert_abs_diff_eq!(out.targets.x, wp.x);
        assert_eq!(out.broadcast.claimed_fire_or_zero(), Vector3::zeros());

        // Back on the route within the relaxed radius.
        agent.step(DT, &at(wp.x + 5.0, wp.y, 8.0), &peers, &after);
        assert_eq!(agent.state(), AgentState::Explore);
    }

    #[test]
    fn test_move_abandons_fire_resolved_by_peer() {
        let mut agent = exploring_agent_at(10.0, 0.0);
        let peers = PeerSnapshot::new();
        let event = fire(4.0, 60.0, 60.0);
        let mut feed = FireFeed {
            latest: Some(event),
            resolved: None,
        };
        agent.step(DT, &at(10.0, 0.0, 8.0), &peers, &feed);
        assert_eq!(agent.state(), AgentState::Move);

        feed.resolved = Some(event.id);
        agent.step(DT, &at(30.0, 30.0, 8.0), &peers, &feed);
        assert_eq!(agent.state(), AgentState::Return);
        assert_eq!(agent.claim(), None);
    }

    #[test]
    fn test_busy_agent_ignores_new_fire() {
        let mut agent = exploring_agent_at(10.0, 0.0);
        let peers = PeerSnapshot::new();
        let first = fire(1.0, 20.0, 40.0);
        agent.step(
            DT,
            &at(10.0, 0.0, 8.0),
            &peers,
            &FireFeed {
                latest: Some(first),
                resolved: None,
            },
        );
        assert_eq!(agent.state(), AgentState::Move);

        let second = fire(2.0, 11.0, 1.0);
        agent.step(
            DT,
            &at(10.0, 0.0, 8.0),
            &peers,
            &FireFeed {
                latest: Some(second),
                resolved: None,
            },
        );
        assert_eq!(agent.state(), AgentState::Move);
        assert_eq!(agent.claim().map(|c| c.id), Some(first.id));
    }

    #[test]
    fn test_agent_yields_to_closer_free_peer() {
        let mut agent = exploring_agent_at(10.0, 0.0);
        let event = fire(7.0, 10.0, 30.0);
        let feed = FireFeed {
            latest: Some(event),
            resolved: None,
        };
        let peers: PeerSnapshot = [(
            AgentId(1),
            PeerRecord {
                status_code: AgentState::Explore.status_code(),
                position: Vector3::new(10.0, 25.0, 8.0),
                claimed_fire: Vector3::zeros(),
            },
        )]
        .into_iter()
        .collect();

        agent.step(DT, &at(10.0, 0.0, 8.0), &peers, &feed);
        assert_eq!(agent.state(), AgentState::Explore);
        assert_eq!(agent.claim(), None);
    }

    #[test]
    fn test_engage_is_ignored_once_airborne() {
        let mut agent = exploring_agent_at(10.0, 0.0);
        agent.engage();
        assert_eq!(agent.state(), AgentState::Explore);
    }
}
