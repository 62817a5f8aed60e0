//! The node-spring simulation: spawning, cluster lifecycle, capacity
//! policy and the per-frame physics step.

use crate::{
    config::{EvictionPolicy, SimConfig},
    error::ConfigError,
    force_buffer::ForceBuffer,
    input::InputEvent,
    node::{Network, Node, Spring, SpringKind},
    noise_field::{AmbientField, PhantomSet},
    phases,
    types::{ClusterId, NodeId},
};
use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::f32::consts::TAU;
use tracing::{debug, info, trace};

/// Read-only view of the simulation as of the last completed call.
#[derive(Clone, Copy, Debug)]
pub struct Snapshot<'a> {
    pub nodes: &'a [Node],
    pub springs: &'a [Spring],
    pub time: f32,
}

/// Owns every node and spring and advances them frame by frame.
///
/// All randomness (scatter jitter, brace targets, spawn-center moves,
/// unsettle impulses) is drawn from the injected `rng`, and the noise
/// sources are seeded from [`SimConfig::seed`], so a simulation is fully
/// reproducible from its config, its rng seed and its input sequence.
pub struct Simulation<R: Rng = ChaCha8Rng> {
    cfg: SimConfig,
    net: Network,
    acc: ForceBuffer,
    ambient: AmbientField,
    phantoms: PhantomSet,
    rng: R,

    next_id: NodeId,
    cluster: ClusterId,
    spawn_center: Vec2,
    time: f32,
    /// Unintegrated time carried between frames.
    backlog: f32,
    locked: bool,
    /// Held pointer position, applied on every sub-step.
    pointer: Option<Vec2>,
}

impl Simulation<ChaCha8Rng> {
    /// Builds a simulation driven by a ChaCha8 stream seeded from `seed`.
    pub fn seeded(cfg: SimConfig, seed: u64) -> Result<Self, ConfigError> {
        Self::new(cfg, ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<R: Rng> Simulation<R> {
    /// Builds an empty simulation.
    ///
    /// ### Parameters
    /// - `cfg` - Validated before anything else is built.
    /// - `rng` - Source of every random choice the simulation makes.
    ///
    /// ### Returns
    /// The simulation, or the [`ConfigError`] that rejected `cfg`.
    pub fn new(cfg: SimConfig, rng: R) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(Self {
            net: Network::default(),
            acc: ForceBuffer::default(),
            ambient: AmbientField::new(cfg.seed),
            phantoms: PhantomSet::new(cfg.seed, cfg.phantoms.count),
            rng,
            next_id: 0,
            cluster: 0,
            spawn_center: cfg.cluster.initial_center,
            time: 0.0,
            backlog: 0.0,
            locked: false,
            pointer: None,
            cfg,
        })
    }

    /// Spawns one node near `origin_hint`, or near the cluster spawn
    /// center when no usable hint is given.
    ///
    /// The node is chained to the previous node of the active cluster and,
    /// once the cluster has at least three members, braced to a random
    /// earlier member. Capacity is enforced before returning.
    ///
    /// ### Returns
    /// The new node id, or `None` while the simulation is locked.
    pub fn spawn(&mut self, symbol: char, origin_hint: Option<Vec2>) -> Option<NodeId> {
        if self.locked {
            trace!(%symbol, "spawn ignored while locked");
            return None;
        }

        let center = origin_hint
            .filter(|p| p.is_finite())
            .unwrap_or(self.spawn_center);
        let sc = self.cfg.scatter;
        let angle = self.rng.random_range(0.0..TAU);
        // Uniform over the annulus area, not over the radius.
        let u: f32 = self.rng.random_range(0.0..=1.0);
        let (r0, r1) = (sc.min_radius * sc.min_radius, sc.max_radius * sc.max_radius);
        let dist = (r0 + (r1 - r0) * u).sqrt();
        let pos = center + Vec2::from_angle(angle) * dist;

        let id = self.next_id;
        self.next_id += 1;

        let prev = self.net.last_in_cluster(self.cluster).map(|n| n.id);
        self.net
            .push(Node::new(id, symbol, self.cluster, pos, sc.node_radius));

        if let Some(prev) = prev {
            self.net
                .link(Spring::new(prev, id, SpringKind::Chain, self.cfg.springs.chain));

            // Candidates exclude the new node and its chain partner.
            let candidates: Vec<NodeId> = self
                .net
                .nodes
                .iter()
                .filter(|n| n.cluster == self.cluster && n.id != id && n.id != prev)
                .map(|n| n.id)
                .collect();
            if !candidates.is_empty() {
                let target = candidates[self.rng.random_range(0..candidates.len())];
                self.net
                    .link(Spring::new(target, id, SpringKind::Brace, self.cfg.springs.brace));
            }
        }

        debug!(id, %symbol, cluster = self.cluster, x = pos.x, y = pos.y, "spawned node");
        self.enforce_capacity();
        Some(id)
    }

    /// Applies the configured [`EvictionPolicy`] after an insertion.
    fn enforce_capacity(&mut self) {
        let cap = self.cfg.capacity;

        if cap.policy == EvictionPolicy::Fade {
            let excess = self.net.live_count().saturating_sub(cap.live_limit);
            let mut marked = 0;
            for n in self.net.nodes.iter_mut().filter(|n| !n.dying).take(excess) {
                n.dying = true;
                marked += 1;
            }
            if marked > 0 {
                debug!(marked, "nodes started fading");
            }
        }

        // Hard ceiling for both policies.
        while self.net.nodes.len() > cap.max_nodes {
            let evicted = self.net.remove_at(0);
            debug!(id = evicted.id, dying = evicted.dying, "evicted oldest node");
        }
    }

    /// Closes the active cluster and moves the spawn center.
    ///
    /// The new center lies at a random angle and a distance in
    /// `[min_distance, max_distance]` from the previous one, reflected back
    /// into the visible extents when needed. Every existing node then gets
    /// a random-direction velocity kick.
    ///
    /// ### Returns
    /// The id of the newly active cluster.
    pub fn finalize_cluster(&mut self) -> ClusterId {
        let cl = self.cfg.cluster;
        self.cluster += 1;

        let angle = self.rng.random_range(0.0..TAU);
        let dist = self.rng.random_range(cl.min_distance..=cl.max_distance);
        let candidate = self.spawn_center + Vec2::from_angle(angle) * dist;
        self.spawn_center = keep_inside(candidate, cl.half_extents, cl.clamp_passes);

        for n in &mut self.net.nodes {
            let dir = Vec2::from_angle(self.rng.random_range(0.0..TAU));
            n.vel += dir * cl.unsettle_impulse;
        }

        debug!(
            cluster = self.cluster,
            x = self.spawn_center.x,
            y = self.spawn_center.y,
            "finalized cluster"
        );
        self.cluster
    }

    /// Advances the simulation by `dt` seconds.
    ///
    /// Fading is advanced by the full `dt`. Physics runs in fixed
    /// sub-steps of `integrator.substep`, at most `integrator.max_substeps`
    /// per call; leftover time below one sub-step carries over to the next
    /// call and any larger backlog is dropped. Each sub-step samples the
    /// time-varying forces at its own time. Non-finite or non-positive
    /// `dt` is ignored.
    ///
    /// ### Parameters
    /// - `dt` - Wall-clock seconds since the previous call.
    pub fn step(&mut self, dt: f32) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }
        // Time of the last integrated sub-step.
        let mut clock = self.time - self.backlog;
        self.time += dt;
        self.fade_phase(dt);

        let it = self.cfg.integrator;
        self.backlog += dt;
        let mut substeps = 0;
        while self.backlog >= it.substep && substeps < it.max_substeps {
            clock += it.substep;
            self.substep(it.substep, clock);
            self.backlog -= it.substep;
            substeps += 1;
        }
        if substeps == it.max_substeps {
            self.backlog = self.backlog.min(it.substep);
        }

        trace!(t = self.time, substeps, nodes = self.net.nodes.len(), "stepped");
    }

    fn substep(&mut self, h: f32, t: f32) {
        self.acc.ensure_len(self.net.nodes.len());

        if self.cfg.ambient.enabled {
            phases::ambient_phase(&self.net, &self.ambient, &self.cfg.ambient, t, &mut self.acc);
        }
        if self.cfg.phantoms.enabled && !self.net.nodes.is_empty() {
            let anchor = self.centroid();
            for p in self.phantoms.positions(&self.cfg.phantoms, anchor, t) {
                phases::point_interaction_phase(&self.net, p, &self.cfg.interaction, &mut self.acc);
            }
        }
        if let Some(p) = self.pointer {
            phases::point_interaction_phase(&self.net, p, &self.cfg.interaction, &mut self.acc);
        }
        phases::repulsion_phase(&self.net, &self.cfg.repulsion, t, &mut self.acc);
        phases::spring_phase(&self.net, &mut self.acc);

        phases::integrate_phase(&mut self.net, &self.acc, &self.cfg.integrator, h);
    }

    /// Shrinks dying nodes and removes those whose radius ran out.
    fn fade_phase(&mut self, dt: f32) {
        let shrink = self.cfg.capacity.fade_rate * dt;
        let mut any_gone = false;
        for n in self.net.nodes.iter_mut().filter(|n| n.dying) {
            n.radius -= shrink;
            any_gone |= n.radius <= 0.0;
        }
        if any_gone {
            let removed = self.net.remove_where(|n| n.dying && n.radius <= 0.0);
            debug!(count = removed.len(), "faded nodes removed");
        }
    }

    /// Moves or releases the held pointer.
    ///
    /// While held, the pointer repels every node within the interaction
    /// radius on each physics sub-step, so the push per second does not
    /// depend on how often this is called.
    ///
    /// ### Parameters
    /// - `point` - New pointer position in world space. `None` or a
    ///   non-finite point releases the pointer.
    pub fn apply_point_interaction(&mut self, point: Option<Vec2>) {
        self.pointer = point.filter(|p| p.is_finite());
    }

    /// Held pointer position, if any.
    pub fn pointer(&self) -> Option<Vec2> {
        self.pointer
    }

    /// Removes everything and returns to the initial cluster and center.
    /// Node ids keep counting up.
    pub fn reset(&mut self) {
        self.net.clear();
        self.acc.ensure_len(0);
        self.cluster = 0;
        self.spawn_center = self.cfg.cluster.initial_center;
        self.time = 0.0;
        self.backlog = 0.0;
        self.locked = false;
        self.pointer = None;
        info!("simulation reset");
    }

    /// Mean node position, or the origin when there are no nodes.
    pub fn centroid(&self) -> Vec2 {
        if self.net.nodes.is_empty() {
            return Vec2::ZERO;
        }
        let sum: Vec2 = self.net.nodes.iter().map(|n| n.pos).sum();
        sum / self.net.nodes.len() as f32
    }

    /// Borrows the current nodes, springs and time for rendering.
    ///
    /// ### Returns
    /// A [`Snapshot`] that stays valid until the next mutating call.
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            nodes: &self.net.nodes,
            springs: &self.net.springs,
            time: self.time,
        }
    }

    /// Dispatches one external input event.
    pub fn handle(&mut self, event: InputEvent) {
        match event {
            InputEvent::CharacterTyped(c) if !c.is_control() => {
                self.spawn(c, None);
            }
            InputEvent::CharacterTyped(_) => {}
            InputEvent::Commit => {
                self.finalize_cluster();
            }
            InputEvent::Reset => self.reset(),
            InputEvent::PointerMoved(p) => self.apply_point_interaction(p),
        }
    }

    /// Crystallizes the piece: spawning becomes a no-op until [`Self::unlock`].
    pub fn lock(&mut self) {
        if !self.locked {
            info!("simulation locked");
        }
        self.locked = true;
    }

    /// Re-enables spawning after [`Self::lock`].
    pub fn unlock(&mut self) {
        if self.locked {
            info!("simulation unlocked");
        }
        self.locked = false;
    }

    /// Whether spawning is currently disabled.
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Current phantom cursor positions (empty when phantoms are disabled).
    pub fn phantom_positions(&self) -> Vec<Vec2> {
        if !self.cfg.phantoms.enabled || self.net.nodes.is_empty() {
            return Vec::new();
        }
        self.phantoms
            .positions(&self.cfg.phantoms, self.centroid(), self.time)
            .collect()
    }

    /// All nodes, oldest first.
    pub fn nodes(&self) -> &[Node] {
        &self.net.nodes
    }

    pub fn springs(&self) -> &[Spring] {
        &self.net.springs
    }

    /// Looks up a node by id.
    ///
    /// ### Returns
    /// `None` once the node has been evicted, faded out or reset away.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.net.get(id)
    }

    /// Id of the cluster new nodes join.
    pub fn cluster_id(&self) -> ClusterId {
        self.cluster
    }

    /// Number of nodes, dying or not, that belong to `cluster`.
    pub fn cluster_size(&self, cluster: ClusterId) -> usize {
        self.net.cluster_size(cluster)
    }

    /// Number of nodes not marked as dying.
    pub fn live_count(&self) -> usize {
        self.net.live_count()
    }

    /// Center around which the next node without a hint is scattered.
    pub fn spawn_center(&self) -> Vec2 {
        self.spawn_center
    }

    /// Simulated seconds since creation or the last reset.
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn config(&self) -> &SimConfig {
        &self.cfg
    }

    pub fn policy(&self) -> EvictionPolicy {
        self.cfg.capacity.policy
    }

    /// Replaces the configuration, keeping nodes and springs.
    ///
    /// The noise sources are rebuilt if the seed or phantom count changed.
    /// Fading is re-evaluated from scratch: every dying node is revived
    /// and capacity is re-enforced, so under [`EvictionPolicy::Fade`] the
    /// oldest nodes above the new live limit keep fading from their
    /// current radius. Surviving nodes take `scatter.node_radius`.
    ///
    /// ### Parameters
    /// - `cfg` - The new configuration.
    ///
    /// ### Returns
    /// The validation error, in which case nothing changes.
    pub fn set_config(&mut self, cfg: SimConfig) -> Result<(), ConfigError> {
        cfg.validate()?;
        if cfg.seed != self.cfg.seed {
            self.ambient = AmbientField::new(cfg.seed);
        }
        if cfg.seed != self.cfg.seed || cfg.phantoms.count != self.cfg.phantoms.count {
            self.phantoms = PhantomSet::new(cfg.seed, cfg.phantoms.count);
        }
        self.cfg = cfg;

        for n in &mut self.net.nodes {
            n.dying = false;
        }
        self.enforce_capacity();
        let radius = self.cfg.scatter.node_radius;
        for n in self.net.nodes.iter_mut().filter(|n| !n.dying) {
            n.radius = radius;
        }
        Ok(())
    }
}

/// Reflects `p` back across the `±half` box edges, at most `passes` times,
/// then clamps whatever is still outside.
fn keep_inside(mut p: Vec2, half: Vec2, passes: u32) -> Vec2 {
    for _ in 0..passes {
        if p.x.abs() <= half.x && p.y.abs() <= half.y {
            break;
        }
        if p.x.abs() > half.x {
            p.x = p.x.signum() * (2.0 * half.x - p.x.abs());
        }
        if p.y.abs() > half.y {
            p.y = p.y.signum() * (2.0 * half.y - p.y.abs());
        }
    }
    p.clamp(-half, half)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CapacityConfig, EvictionPolicy};

    fn sim() -> Simulation {
        Simulation::seeded(SimConfig::default(), 7).unwrap()
    }

    fn assert_no_dangling(sim: &Simulation) {
        for s in sim.springs() {
            assert!(sim.node(s.a).is_some(), "dangling endpoint {}", s.a);
            assert!(sim.node(s.b).is_some(), "dangling endpoint {}", s.b);
        }
    }

    #[test]
    fn spawning_three_builds_a_chain_in_cluster_zero() {
        let mut sim = sim();
        for c in ['a', 'b', 'c'] {
            sim.spawn(c, None).unwrap();
        }

        assert_eq!(sim.nodes().len(), 3);
        assert!(sim.springs().len() >= 2);
        assert!(sim.nodes().iter().all(|n| n.cluster == 0));

        let chains = sim
            .springs()
            .iter()
            .filter(|s| s.kind == SpringKind::Chain)
            .count();
        assert_eq!(chains, 2);
        // Third node gets exactly one brace, to the first node.
        let braces: Vec<&Spring> = sim
            .springs()
            .iter()
            .filter(|s| s.kind == SpringKind::Brace)
            .collect();
        assert_eq!(braces.len(), 1);
        assert_eq!((braces[0].a, braces[0].b), (0, 2));
    }

    #[test]
    fn spawn_scatters_within_disc_around_center() {
        let mut sim = sim();
        let sc = sim.config().scatter;
        for i in 0..50 {
            let id = sim.spawn('x', None).unwrap();
            let d = sim.node(id).unwrap().pos.length();
            assert!(d >= sc.min_radius - 1e-5 && d <= sc.max_radius + 1e-5, "{i}: {d}");
        }
    }

    #[test]
    fn spawn_uses_origin_hint_when_finite() {
        let mut sim = sim();
        let hint = Vec2::new(3.0, -2.0);
        let id = sim.spawn('h', Some(hint)).unwrap();
        let d = sim.node(id).unwrap().pos.distance(hint);
        assert!(d <= sim.config().scatter.max_radius + 1e-5);

        let id = sim.spawn('n', Some(Vec2::NAN)).unwrap();
        assert!(sim.node(id).unwrap().pos.length() <= sim.config().scatter.max_radius + 1e-5);
    }

    #[test]
    fn chain_only_links_within_cluster() {
        let mut sim = sim();
        let a = sim.spawn('a', None).unwrap();
        sim.finalize_cluster();
        let b = sim.spawn('b', None).unwrap();

        assert!(sim.springs().is_empty(), "{a} and {b} must not be linked");
        assert_eq!(sim.node(b).unwrap().cluster, 1);
    }

    #[test]
    fn finalize_moves_center_within_annulus() {
        let mut sim = sim();
        for c in "abc".chars() {
            sim.spawn(c, None);
        }
        let before = sim.spawn_center();
        let cl = sim.config().cluster;

        let id = sim.finalize_cluster();

        let d = sim.spawn_center().distance(before);
        assert_eq!(id, 1);
        assert_eq!(sim.cluster_id(), 1);
        assert_eq!(sim.nodes().len(), 3);
        assert!(d >= cl.min_distance - 1e-4 && d <= cl.max_distance + 1e-4, "{d}");

        let d_id = sim.spawn('d', None).unwrap();
        assert_eq!(sim.node(d_id).unwrap().cluster, 1);
    }

    #[test]
    fn finalize_keeps_center_inside_extents() {
        let mut sim = sim();
        let half = sim.config().cluster.half_extents;
        for _ in 0..200 {
            sim.finalize_cluster();
            let c = sim.spawn_center();
            assert!(c.x.abs() <= half.x + 1e-5 && c.y.abs() <= half.y + 1e-5, "{c:?}");
        }
    }

    #[test]
    fn finalize_on_empty_simulation_is_well_defined() {
        let mut sim = sim();
        sim.finalize_cluster();
        assert!(sim.nodes().is_empty());
        assert!(sim.spawn_center().is_finite());
        assert_eq!(sim.centroid(), Vec2::ZERO);
    }

    #[test]
    fn finalize_unsettles_existing_nodes() {
        let mut sim = sim();
        sim.spawn('a', None);
        sim.spawn('b', None);
        sim.finalize_cluster();

        let impulse = sim.config().cluster.unsettle_impulse;
        for n in sim.nodes() {
            assert!((n.vel.length() - impulse).abs() < 1e-5);
        }
    }

    #[test]
    fn keep_inside_reflects_then_clamps() {
        let half = Vec2::new(5.0, 3.0);
        assert_eq!(keep_inside(Vec2::new(6.0, 0.0), half, 3), Vec2::new(4.0, 0.0));
        assert_eq!(keep_inside(Vec2::new(-1.0, -4.0), half, 3), Vec2::new(-1.0, -2.0));
        // Too far for one reflection; the final clamp still bounds it.
        let p = keep_inside(Vec2::new(40.0, 0.0), half, 1);
        assert!(p.x.abs() <= half.x);
        assert_eq!(keep_inside(Vec2::new(1.0, 1.0), half, 0), Vec2::new(1.0, 1.0));
    }

    #[test]
    fn fifo_evicts_exactly_the_oldest() {
        let mut cfg = SimConfig::default();
        cfg.capacity = CapacityConfig {
            policy: EvictionPolicy::Fifo,
            max_nodes: 10,
            live_limit: 10,
            ..CapacityConfig::default()
        };
        let mut sim = Simulation::seeded(cfg, 1).unwrap();

        for _ in 0..13 {
            sim.spawn('f', None);
            assert!(sim.nodes().len() <= 10);
            assert_no_dangling(&sim);
        }

        let ids: Vec<NodeId> = sim.nodes().iter().map(|n| n.id).collect();
        assert_eq!(ids, (3..13).collect::<Vec<_>>());
    }

    #[test]
    fn fade_marks_oldest_and_removes_when_radius_runs_out() {
        let mut cfg = SimConfig::default();
        cfg.capacity = CapacityConfig {
            policy: EvictionPolicy::Fade,
            max_nodes: 10,
            live_limit: 5,
            fade_rate: 1.0,
        };
        let mut sim = Simulation::seeded(cfg, 2).unwrap();

        for _ in 0..7 {
            sim.spawn('g', None);
        }
        assert_eq!(sim.nodes().len(), 7);
        assert_eq!(sim.live_count(), 5);
        let dying: Vec<NodeId> = sim.nodes().iter().filter(|n| n.dying).map(|n| n.id).collect();
        assert_eq!(dying, vec![0, 1]);

        // 0.35 radius at 1.0/s: gone within half a second.
        for _ in 0..30 {
            sim.step(1.0 / 60.0);
            assert_no_dangling(&sim);
        }
        assert_eq!(sim.nodes().len(), 5);
        assert!(sim.nodes().iter().all(|n| !n.dying));
        assert!(sim.node(0).is_none() && sim.node(1).is_none());
    }

    #[test]
    fn fade_radius_decreases_while_dying() {
        let mut cfg = SimConfig::default();
        cfg.capacity.live_limit = 1;
        cfg.capacity.fade_rate = 0.1;
        let mut sim = Simulation::seeded(cfg, 3).unwrap();
        sim.spawn('a', None);
        sim.spawn('b', None);

        let r0 = sim.node(0).unwrap().radius;
        sim.step(0.5);
        let r1 = sim.node(0).unwrap().radius;
        assert!((r0 - r1 - 0.05).abs() < 1e-5);
        assert_eq!(sim.node(1).unwrap().radius, r0);
    }

    #[test]
    fn fade_still_respects_hard_ceiling() {
        let mut cfg = SimConfig::default();
        cfg.capacity.max_nodes = 8;
        cfg.capacity.live_limit = 4;
        let mut sim = Simulation::seeded(cfg, 4).unwrap();

        for _ in 0..20 {
            sim.spawn('z', None);
            assert!(sim.nodes().len() <= 8);
        }
        let ids: Vec<NodeId> = sim.nodes().iter().map(|n| n.id).collect();
        assert_eq!(ids, (12..20).collect::<Vec<_>>());
        assert_eq!(sim.live_count(), 4);
    }

    #[test]
    fn spawn_is_noop_while_locked() {
        let mut sim = sim();
        sim.spawn('a', None);
        sim.lock();

        assert!(sim.spawn('b', None).is_none());
        assert_eq!(sim.nodes().len(), 1);
        assert!(sim.is_locked());

        sim.unlock();
        assert!(sim.spawn('b', None).is_some());
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut sim = sim();
        for c in "hello".chars() {
            sim.spawn(c, None);
        }
        sim.finalize_cluster();
        sim.spawn('w', None);
        sim.step(0.1);
        sim.lock();

        sim.reset();

        assert!(sim.nodes().is_empty());
        assert!(sim.springs().is_empty());
        assert_eq!(sim.cluster_id(), 0);
        assert_eq!(sim.spawn_center(), sim.config().cluster.initial_center);
        assert_eq!(sim.time(), 0.0);
        assert!(!sim.is_locked());
    }

    #[test]
    fn centroid_of_empty_and_single() {
        let mut sim = sim();
        assert_eq!(sim.centroid(), Vec2::ZERO);

        let id = sim.spawn('a', None).unwrap();
        assert_eq!(sim.centroid(), sim.node(id).unwrap().pos);
    }

    /// No ambient drift, phantoms, breathing or drag: only springs,
    /// repulsion and explicit pointers move nodes.
    fn still_config() -> SimConfig {
        let mut cfg = SimConfig::default();
        cfg.ambient.enabled = false;
        cfg.phantoms.enabled = false;
        cfg.repulsion.breathing.enabled = false;
        cfg.integrator.drag = 0.0;
        cfg
    }

    #[test]
    fn far_point_interaction_leaves_node_untouched() {
        let mut held = Simulation::seeded(still_config(), 5).unwrap();
        let mut free = Simulation::seeded(still_config(), 5).unwrap();
        let id = held.spawn('a', None).unwrap();
        free.spawn('a', None);

        held.apply_point_interaction(Some(Vec2::new(100.0, 100.0)));
        for _ in 0..30 {
            held.step(1.0 / 60.0);
            free.step(1.0 / 60.0);
        }

        assert_eq!(held.node(id), free.node(id));
    }

    #[test]
    fn invalid_pointer_releases_it() {
        let mut sim = sim();
        sim.apply_point_interaction(Some(Vec2::ONE));
        assert_eq!(sim.pointer(), Some(Vec2::ONE));

        sim.apply_point_interaction(Some(Vec2::new(f32::NAN, 0.0)));
        assert_eq!(sim.pointer(), None);

        sim.handle(InputEvent::PointerMoved(Some(Vec2::ONE)));
        sim.handle(InputEvent::PointerMoved(None));
        assert_eq!(sim.pointer(), None);
    }

    #[test]
    fn near_point_interaction_pushes_node_away() {
        let mut sim = Simulation::seeded(still_config(), 5).unwrap();
        let id = sim.spawn('a', None).unwrap();
        let start = sim.node(id).unwrap().pos;

        sim.apply_point_interaction(Some(start - Vec2::new(0.3, 0.0)));
        // Nothing moves until physics runs.
        assert_eq!(sim.node(id).unwrap().pos, start);

        sim.step(1.0 / 60.0);
        assert!(sim.node(id).unwrap().pos.x > start.x);
    }

    /// Holds the pointer 0.6 left of a lone node for half a second at
    /// `fps` frames per second, re-sending it every frame.
    fn held_pointer_displacement(fps: u32) -> f32 {
        let mut sim = Simulation::seeded(still_config(), 12).unwrap();
        let id = sim.spawn('p', None).unwrap();
        let start = sim.node(id).unwrap().pos;
        let point = start - Vec2::new(0.6, 0.0);

        for _ in 0..fps / 2 {
            sim.handle(InputEvent::PointerMoved(Some(point)));
            sim.step(1.0 / fps as f32);
        }
        sim.node(id).unwrap().pos.x - start.x
    }

    #[test]
    fn held_pointer_push_does_not_depend_on_frame_rate() {
        let slow = held_pointer_displacement(30);
        let fast = held_pointer_displacement(144);

        assert!(slow > 0.0);
        // Within one sub-step of rounding between the two frame rates.
        assert!((slow - fast).abs() / slow < 0.15, "30 fps {slow}, 144 fps {fast}");
    }

    #[test]
    fn repeated_pointer_events_do_not_accumulate() {
        let mut once = Simulation::seeded(still_config(), 13).unwrap();
        let mut spammed = Simulation::seeded(still_config(), 13).unwrap();
        let id = once.spawn('a', None).unwrap();
        spammed.spawn('a', None);
        let point = once.node(id).unwrap().pos - Vec2::new(0.5, 0.0);

        once.handle(InputEvent::PointerMoved(Some(point)));
        for _ in 0..600 {
            spammed.handle(InputEvent::PointerMoved(Some(point)));
        }
        once.step(1.0 / 60.0);
        spammed.step(1.0 / 60.0);

        assert_eq!(once.node(id), spammed.node(id));
        assert!(spammed.node(id).unwrap().vel.length() < 1.0);
    }

    fn phantom_config(enabled: bool) -> SimConfig {
        let mut cfg = still_config();
        cfg.phantoms.enabled = enabled;
        cfg.phantoms.scale = Vec2::splat(0.1);
        cfg.interaction.radius = 1.5;
        cfg
    }

    /// Two far-apart singleton clusters and one node near the centroid.
    fn spread_out(sim: &mut Simulation) -> [NodeId; 3] {
        let left = sim.spawn('l', Some(Vec2::new(-6.0, 0.0))).unwrap();
        sim.finalize_cluster();
        let right = sim.spawn('r', Some(Vec2::new(6.0, 0.0))).unwrap();
        sim.finalize_cluster();
        let middle = sim.spawn('m', Some(Vec2::new(0.2, 0.0))).unwrap();
        [left, right, middle]
    }

    #[test]
    fn phantoms_push_nearby_nodes_during_step() {
        let mut with = Simulation::seeded(phantom_config(true), 21).unwrap();
        let mut without = Simulation::seeded(phantom_config(false), 21).unwrap();
        let [_, _, middle] = spread_out(&mut with);
        spread_out(&mut without);

        for _ in 0..30 {
            with.step(1.0 / 60.0);
            without.step(1.0 / 60.0);
        }

        let a = with.node(middle).unwrap().pos;
        let b = without.node(middle).unwrap().pos;
        assert!(a.distance(b) > 1e-3, "{a:?} vs {b:?}");
    }

    #[test]
    fn phantoms_leave_distant_nodes_alone() {
        let mut with = Simulation::seeded(phantom_config(true), 22).unwrap();
        let mut without = Simulation::seeded(phantom_config(false), 22).unwrap();
        let [left, right, _] = spread_out(&mut with);
        spread_out(&mut without);

        for _ in 0..30 {
            with.step(1.0 / 60.0);
            without.step(1.0 / 60.0);
            let radius = with.config().interaction.radius;
            for p in with.phantom_positions() {
                assert!(p.distance(with.node(left).unwrap().pos) > radius);
                assert!(p.distance(with.node(right).unwrap().pos) > radius);
            }
        }

        assert_eq!(with.node(left), without.node(left));
        assert_eq!(with.node(right), without.node(right));
    }

    #[test]
    fn spawn_fills_the_scatter_annulus_by_area() {
        let mut cfg = SimConfig::default();
        cfg.capacity.policy = EvictionPolicy::Fifo;
        let mut sim = Simulation::seeded(cfg, 31).unwrap();
        let sc = sim.config().scatter;
        // Half the annulus area lies inside this radius.
        let median =
            ((sc.min_radius * sc.min_radius + sc.max_radius * sc.max_radius) / 2.0).sqrt();

        let samples = 400;
        let inside = (0..samples)
            .filter(|_| {
                let id = sim.spawn('s', None).unwrap();
                sim.node(id).unwrap().pos.length() < median
            })
            .count();

        let share = inside as f32 / samples as f32;
        assert!((0.4..0.6).contains(&share), "{share}");
    }

    #[test]
    fn substeps_sample_forces_at_their_own_time() {
        let mut cfg = SimConfig::default();
        cfg.phantoms.enabled = false;
        // Fast, strong ambient drift makes the sample time matter.
        cfg.ambient.time_scale = 30.0;
        cfg.ambient.strength = 50.0;
        cfg.integrator.max_substeps = 8;
        let mut whole = Simulation::seeded(cfg, 41).unwrap();
        let mut split = Simulation::seeded(cfg, 41).unwrap();
        for c in "abcd".chars() {
            whole.spawn(c, None);
            split.spawn(c, None);
        }

        // 4 sub-steps in one frame, or one per frame.
        whole.step(4.0 / 60.0 + 1e-4);
        for _ in 0..4 {
            split.step(1.0 / 60.0 + 0.25e-4);
        }

        for (a, b) in whole.nodes().iter().zip(split.nodes()) {
            assert!(a.pos.distance(b.pos) < 1e-4, "{:?} vs {:?}", a.pos, b.pos);
        }
    }

    #[test]
    fn switching_to_fifo_revives_fading_nodes() {
        let mut cfg = SimConfig::default();
        cfg.capacity.live_limit = 3;
        let mut sim = Simulation::seeded(cfg, 51).unwrap();
        for _ in 0..5 {
            sim.spawn('v', None);
        }
        sim.step(0.2);
        assert_eq!(sim.live_count(), 3);

        let mut fifo = *sim.config();
        fifo.capacity.policy = EvictionPolicy::Fifo;
        sim.set_config(fifo).unwrap();

        assert_eq!(sim.live_count(), 5);
        let radius = sim.config().scatter.node_radius;
        assert!(sim.nodes().iter().all(|n| n.radius == radius));
    }

    #[test]
    fn raising_live_limit_revives_the_newest_dying_nodes() {
        let mut cfg = SimConfig::default();
        cfg.capacity.live_limit = 2;
        let mut sim = Simulation::seeded(cfg, 52).unwrap();
        for _ in 0..6 {
            sim.spawn('w', None);
        }
        sim.step(0.2);
        let faded = sim.node(0).unwrap().radius;

        let mut more = *sim.config();
        more.capacity.live_limit = 4;
        sim.set_config(more).unwrap();

        let dying: Vec<NodeId> = sim.nodes().iter().filter(|n| n.dying).map(|n| n.id).collect();
        assert_eq!(dying, vec![0, 1]);
        // Still-dying nodes keep fading from where they were.
        assert_eq!(sim.node(0).unwrap().radius, faded);
        assert_eq!(sim.node(3).unwrap().radius, sim.config().scatter.node_radius);
    }

    #[test]
    fn step_ignores_degenerate_dt() {
        let mut sim = sim();
        sim.spawn('a', None);
        let before = sim.nodes().to_vec();

        sim.step(0.0);
        sim.step(-1.0);
        sim.step(f32::NAN);
        sim.step(f32::INFINITY);

        assert_eq!(sim.nodes(), before.as_slice());
        assert_eq!(sim.time(), 0.0);
    }

    #[test]
    fn step_carries_partial_substeps() {
        let mut cfg = SimConfig::default();
        cfg.ambient.enabled = false;
        cfg.phantoms.enabled = false;
        let mut sim = Simulation::seeded(cfg, 6).unwrap();
        let id = sim.spawn('a', None).unwrap();
        sim.apply_point_interaction(Some(sim.node(id).unwrap().pos - Vec2::new(0.1, 0.0)));
        let start = sim.node(id).unwrap().pos;

        // Less than one sub-step: time advances, physics waits.
        sim.step(0.01);
        assert_eq!(sim.node(id).unwrap().pos, start);
        assert!((sim.time() - 0.01).abs() < 1e-6);

        sim.step(0.01);
        assert_ne!(sim.node(id).unwrap().pos, start);
    }

    #[test]
    fn handle_dispatches_input_events() {
        let mut sim = sim();
        sim.handle(InputEvent::CharacterTyped('a'));
        sim.handle(InputEvent::CharacterTyped('\n'));
        sim.handle(InputEvent::CharacterTyped('b'));
        assert_eq!(sim.nodes().len(), 2);

        sim.handle(InputEvent::Commit);
        assert_eq!(sim.cluster_id(), 1);

        sim.handle(InputEvent::PointerMoved(None));
        sim.handle(InputEvent::Reset);
        assert!(sim.nodes().is_empty());
        assert_eq!(sim.cluster_id(), 0);
    }

    #[test]
    fn node_ids_keep_counting_after_reset() {
        let mut sim = sim();
        sim.spawn('a', None);
        sim.spawn('b', None);
        sim.reset();
        assert_eq!(sim.spawn('c', None), Some(2));
    }

    #[test]
    fn set_config_reenforces_capacity() {
        let mut sim = sim();
        for _ in 0..20 {
            sim.spawn('q', None);
        }
        let mut cfg = *sim.config();
        cfg.capacity.policy = EvictionPolicy::Fifo;
        cfg.capacity.max_nodes = 5;
        cfg.capacity.live_limit = 5;

        sim.set_config(cfg).unwrap();

        assert_eq!(sim.policy(), EvictionPolicy::Fifo);
        assert_eq!(sim.nodes().len(), 5);
        assert_no_dangling(&sim);
    }

    #[test]
    fn phantom_positions_follow_config() {
        let mut sim = sim();
        assert!(sim.phantom_positions().is_empty());
        sim.spawn('a', None);
        assert_eq!(sim.phantom_positions().len(), 3);

        let mut cfg = *sim.config();
        cfg.phantoms.enabled = false;
        sim.set_config(cfg).unwrap();
        assert!(sim.phantom_positions().is_empty());
    }
}
