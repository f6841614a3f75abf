//! Iterative force layout with an alpha cooling schedule.
//!
//! Each tick composes link springs, pairwise repulsion and a centering pull
//! into node velocities, integrates them, then separates overlapping
//! circles. Ticking stops once alpha cools below `alpha_min`.

use std::collections::HashMap;
use std::f64::consts::PI;

use log::{debug, warn};

use super::config::MindmapConfig;
use super::model::Derived;
use super::types::{LinkKind, LinkSegment, Node, NodeKind, NodeSnapshot, NodeState};

/// Result of one [`ForceSimulation::tick`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickStatus {
	/// Not running; nothing moved.
	Idle,
	/// Still cooling.
	Running,
	/// Alpha just fell below the threshold. Reported once per cooling episode.
	Settled,
}

#[derive(Clone, Debug)]
struct SimLink {
	source: usize,
	target: usize,
	kind: LinkKind,
	strength: f64,
	bias: f64,
}

#[derive(Clone, Copy, Debug)]
struct Forces {
	link_distance: f64,
	charge_strength: f64,
	center_strength: f64,
	collision_padding: f64,
	collision_iterations: usize,
	velocity_decay: f64,
	alpha_min: f64,
	alpha_decay: f64,
	initial_radius: f64,
}

impl From<&MindmapConfig> for Forces {
	fn from(config: &MindmapConfig) -> Self {
		Self {
			link_distance: config.link_distance,
			charge_strength: config.charge_strength,
			center_strength: config.center_strength,
			collision_padding: config.collision_padding,
			collision_iterations: config.collision_iterations,
			velocity_decay: config.velocity_decay,
			alpha_min: config.alpha_min,
			alpha_decay: config.alpha_decay,
			initial_radius: config.initial_radius,
		}
	}
}

/// Deterministic linear congruential source for placement jitter.
#[derive(Clone, Debug)]
struct Lcg(u32);

impl Lcg {
	fn next(&mut self) -> f64 {
		self.0 = self.0.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
		self.0 as f64 / 4_294_967_296.0
	}

	fn jiggle(&mut self) -> f64 {
		(self.next() - 0.5) * 1e-6
	}
}

const RELAX_PASSES: usize = 200;
const RELAX_TOLERANCE: f64 = 1e-3;

pub struct ForceSimulation {
	nodes: Vec<Node>,
	links: Vec<SimLink>,
	index: HashMap<String, usize>,
	forces: Forces,
	center: (f64, f64),
	alpha: f64,
	alpha_target: f64,
	running: bool,
	random: Lcg,
}

impl ForceSimulation {
	pub fn new(config: &MindmapConfig, center: (f64, f64)) -> Self {
		Self {
			nodes: Vec::new(),
			links: Vec::new(),
			index: HashMap::new(),
			forces: config.into(),
			center,
			alpha: 1.0,
			alpha_target: 0.0,
			running: false,
			random: Lcg(1),
		}
	}

	pub fn nodes(&self) -> &[Node] {
		&self.nodes
	}

	pub fn node(&self, id: &str) -> Option<&Node> {
		self.index.get(id).map(|&i| &self.nodes[i])
	}

	fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
		self.index.get(id).map(|&i| &mut self.nodes[i])
	}

	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	#[cfg(test)]
	pub fn alpha_target(&self) -> f64 {
		self.alpha_target
	}

	pub fn is_running(&self) -> bool {
		self.running
	}

	pub fn set_center(&mut self, x: f64, y: f64) {
		self.center = (x, y);
	}

	/// Solver state keyed by id, to carry into the next derivation.
	pub fn states(&self) -> HashMap<String, NodeState> {
		self.nodes
			.iter()
			.map(|n| {
				(
					n.id.clone(),
					NodeState {
						x: n.x,
						y: n.y,
						vx: n.vx,
						vy: n.vy,
						pin: n.pin,
					},
				)
			})
			.collect()
	}

	/// Swaps in a freshly derived node/link set. Positioned nodes keep their
	/// state; unpositioned ones are seeded around their book or the center.
	pub fn replace(&mut self, derived: Derived) {
		self.nodes = derived.nodes;
		self.index = self
			.nodes
			.iter()
			.enumerate()
			.map(|(i, n)| (n.id.clone(), i))
			.collect();
		self.seed_new_nodes();

		let mut links = Vec::with_capacity(derived.links.len());
		for link in derived.links {
			let (Some(&source), Some(&target)) =
				(self.index.get(&link.source), self.index.get(&link.target))
			else {
				if cfg!(debug_assertions) {
					panic!(
						"link {} -> {} references a missing node",
						link.source, link.target
					);
				}
				warn!("dropping dangling link {} -> {}", link.source, link.target);
				continue;
			};
			links.push(SimLink {
				source,
				target,
				kind: link.kind,
				strength: 0.0,
				bias: 0.0,
			});
		}

		let mut degree = vec![0usize; self.nodes.len()];
		for link in &links {
			degree[link.source] += 1;
			degree[link.target] += 1;
		}
		for link in &mut links {
			let (s, t) = (degree[link.source] as f64, degree[link.target] as f64);
			link.strength = 1.0 / s.min(t);
			link.bias = s / (s + t);
		}
		self.links = links;

		if self.nodes.is_empty() {
			self.running = false;
		}
	}

	fn seed_new_nodes(&mut self) {
		let golden = PI * (3.0 - 5f64.sqrt());
		for i in 0..self.nodes.len() {
			if self.nodes[i].positioned {
				continue;
			}
			let anchor = match &self.nodes[i].kind {
				NodeKind::Chapter { book_id } => self
					.index
					.get(book_id)
					.map(|&b| &self.nodes[b])
					.filter(|book| book.positioned)
					.map(|book| (book.x, book.y)),
				NodeKind::Book | NodeKind::Concept { .. } => None,
			}
			.unwrap_or(self.center);

			let radius = self.forces.initial_radius * (0.5 + i as f64).sqrt();
			let angle = i as f64 * golden;
			let (jx, jy) = (self.random.jiggle(), self.random.jiggle());
			let node = &mut self.nodes[i];
			node.x = anchor.0 + radius * angle.cos() + jx;
			node.y = anchor.1 + radius * angle.sin() + jy;
			node.vx = 0.0;
			node.vy = 0.0;
			node.positioned = true;
		}
	}

	/// Sets alpha and resumes ticking. Ignored when there is nothing to lay out.
	pub fn restart_with_alpha(&mut self, alpha: f64) {
		self.alpha = alpha;
		self.resume();
	}

	/// Raises alpha to at least `alpha` and resumes ticking.
	pub fn reheat(&mut self, alpha: f64) {
		self.alpha = self.alpha.max(alpha);
		self.resume();
	}

	pub fn set_alpha_target(&mut self, target: f64) {
		self.alpha_target = target;
		if target >= self.forces.alpha_min {
			self.resume();
		}
	}

	fn resume(&mut self) {
		if self.nodes.is_empty() {
			return;
		}
		if !self.running {
			debug!("simulation resumed at alpha {:.3}", self.alpha);
		}
		self.running = true;
	}

	/// Stops ticking. Safe to call repeatedly.
	pub fn stop(&mut self) {
		self.running = false;
	}

	/// Holds a node at `(x, y)` until [`ForceSimulation::unpin`].
	pub fn pin(&mut self, id: &str, x: f64, y: f64) -> bool {
		let Some(node) = self.node_mut(id) else {
			return false;
		};
		node.pin = Some((x, y));
		node.x = x;
		node.y = y;
		node.vx = 0.0;
		node.vy = 0.0;
		true
	}

	/// Releases a pin; the node continues from where it was held.
	pub fn unpin(&mut self, id: &str) -> bool {
		let Some(node) = self.node_mut(id) else {
			return false;
		};
		node.pin = None;
		true
	}

	pub fn tick(&mut self) -> TickStatus {
		if !self.running || self.nodes.is_empty() {
			self.running = false;
			return TickStatus::Idle;
		}

		self.alpha += (self.alpha_target - self.alpha) * self.forces.alpha_decay;
		self.apply_links();
		self.apply_many_body();
		self.apply_center();
		self.integrate();
		self.separate(self.forces.collision_iterations);

		if self.alpha < self.forces.alpha_min {
			self.running = false;
			self.separate(RELAX_PASSES);
			debug!("simulation settled with {} nodes", self.nodes.len());
			return TickStatus::Settled;
		}
		TickStatus::Running
	}

	/// Ticks until settled or `max_ticks` elapse. Returns whether it settled.
	#[cfg(test)]
	pub fn run_to_settle(&mut self, max_ticks: usize) -> bool {
		for _ in 0..max_ticks {
			match self.tick() {
				TickStatus::Settled => return true,
				TickStatus::Idle => return false,
				TickStatus::Running => {}
			}
		}
		false
	}

	fn apply_links(&mut self) {
		let alpha = self.alpha;
		for i in 0..self.links.len() {
			let link = &self.links[i];
			let (s, t) = (&self.nodes[link.source], &self.nodes[link.target]);
			let mut x = t.x + t.vx - s.x - s.vx;
			let mut y = t.y + t.vy - s.y - s.vy;
			if x == 0.0 {
				x = self.random.jiggle();
			}
			if y == 0.0 {
				y = self.random.jiggle();
			}
			let link = &self.links[i];
			let len = (x * x + y * y).sqrt();
			let l = (len - self.forces.link_distance) / len * alpha * link.strength;
			let (x, y) = (x * l, y * l);
			let (source, target, bias) = (link.source, link.target, link.bias);

			let t = &mut self.nodes[target];
			t.vx -= x * bias;
			t.vy -= y * bias;
			let s = &mut self.nodes[source];
			s.vx += x * (1.0 - bias);
			s.vy += y * (1.0 - bias);
		}
	}

	fn apply_many_body(&mut self) {
		let strength = self.forces.charge_strength * self.alpha;
		let n = self.nodes.len();
		for i in 0..n {
			for j in (i + 1)..n {
				let mut dx = self.nodes[j].x - self.nodes[i].x;
				let mut dy = self.nodes[j].y - self.nodes[i].y;
				let mut l = dx * dx + dy * dy;
				if l == 0.0 {
					dx = self.random.jiggle();
					dy = self.random.jiggle();
					l = dx * dx + dy * dy;
				}
				if l < 1.0 {
					l = l.sqrt();
				}
				let w = strength / l;
				self.nodes[i].vx += dx * w;
				self.nodes[i].vy += dy * w;
				self.nodes[j].vx -= dx * w;
				self.nodes[j].vy -= dy * w;
			}
		}
	}

	fn apply_center(&mut self) {
		let n = self.nodes.len() as f64;
		let (sx, sy) = self
			.nodes
			.iter()
			.fold((0.0, 0.0), |(sx, sy), node| (sx + node.x, sy + node.y));
		let k = self.forces.center_strength;
		let (dx, dy) = ((sx / n - self.center.0) * k, (sy / n - self.center.1) * k);
		for node in &mut self.nodes {
			node.x -= dx;
			node.y -= dy;
		}
	}

	fn integrate(&mut self) {
		let keep = 1.0 - self.forces.velocity_decay;
		for node in &mut self.nodes {
			if let Some((fx, fy)) = node.pin {
				node.x = fx;
				node.y = fy;
				node.vx = 0.0;
				node.vy = 0.0;
			} else {
				node.vx *= keep;
				node.vy *= keep;
				node.x += node.vx;
				node.y += node.vy;
			}
		}
	}

	/// Pushes overlapping circles apart; pinned nodes never move. Returns the
	/// largest overlap seen in the last pass.
	fn separate(&mut self, passes: usize) -> f64 {
		let pad = self.forces.collision_padding;
		let n = self.nodes.len();
		let mut worst = 0.0;
		for _ in 0..passes {
			worst = 0.0;
			for i in 0..n {
				for j in (i + 1)..n {
					let (a, b) = (&self.nodes[i], &self.nodes[j]);
					let (ra, rb) = (a.radius + pad, b.radius + pad);
					let min = ra + rb;
					let (mut dx, mut dy) = (b.x - a.x, b.y - a.y);
					let mut d2 = dx * dx + dy * dy;
					if d2 >= min * min {
						continue;
					}
					if d2 == 0.0 {
						dx = self.random.jiggle();
						dy = self.random.jiggle();
						d2 = dx * dx + dy * dy;
						if d2 == 0.0 {
							(dx, dy, d2) = (1.0, 0.0, 1.0);
						}
					}
					let d = d2.sqrt();
					let overlap = min - d;
					worst = f64::max(worst, overlap);

					let (wa, wb) = match (a.is_pinned(), b.is_pinned()) {
						(false, false) => {
							let (ra2, rb2) = (ra * ra, rb * rb);
							(rb2 / (ra2 + rb2), ra2 / (ra2 + rb2))
						}
						(true, false) => (0.0, 1.0),
						(false, true) => (1.0, 0.0),
						(true, true) => (0.0, 0.0),
					};
					let (ux, uy) = (dx / d * overlap, dy / d * overlap);
					let a = &mut self.nodes[i];
					a.x -= ux * wa;
					a.y -= uy * wa;
					let b = &mut self.nodes[j];
					b.x += ux * wb;
					b.y += uy * wb;
				}
			}
			if worst < RELAX_TOLERANCE {
				break;
			}
		}
		worst
	}

	/// Topmost node whose circle contains the model-space point.
	pub fn node_at(&self, x: f64, y: f64) -> Option<&Node> {
		self.nodes.iter().rev().find(|n| {
			let (dx, dy) = (n.x - x, n.y - y);
			dx * dx + dy * dy <= n.radius * n.radius
		})
	}

	pub fn snapshots(&self) -> Vec<NodeSnapshot> {
		self.nodes
			.iter()
			.map(|n| NodeSnapshot {
				id: n.id.clone(),
				x: n.x,
				y: n.y,
			})
			.collect()
	}

	pub fn link_segments(&self) -> Vec<LinkSegment> {
		self.links
			.iter()
			.map(|link| {
				let (s, t) = (&self.nodes[link.source], &self.nodes[link.target]);
				LinkSegment {
					source: s.id.clone(),
					target: t.id.clone(),
					kind: link.kind,
					from: (s.x, s.y),
					to: (t.x, t.y),
					highlighted: s.highlighted && t.highlighted,
				}
			})
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::mindmap::color::Rgb;
	use crate::components::mindmap::types::Link;

	fn book(id: &str) -> Node {
		Node::new(id.into(), NodeKind::Book, id.into(), Rgb::NEUTRAL)
	}

	fn chapter(id: &str, book_id: &str) -> Node {
		let kind = NodeKind::Chapter {
			book_id: book_id.into(),
		};
		Node::new(id.into(), kind, id.into(), Rgb::NEUTRAL)
	}

	fn star(chapters: usize) -> Derived {
		let mut nodes = vec![book("b")];
		let mut links = Vec::new();
		for i in 0..chapters {
			let id = format!("c{i}");
			nodes.push(chapter(&id, "b"));
			links.push(Link {
				source: "b".into(),
				target: id,
				kind: LinkKind::Containment,
			});
		}
		Derived { nodes, links }
	}

	fn sim(derived: Derived) -> ForceSimulation {
		let mut sim = ForceSimulation::new(&MindmapConfig::default(), (400.0, 300.0));
		sim.replace(derived);
		sim.restart_with_alpha(1.0);
		sim
	}

	#[test]
	fn empty_simulation_never_ticks() {
		let mut sim = sim(Derived::default());
		assert!(!sim.is_running());
		sim.reheat(0.5);
		assert!(!sim.is_running());
		for _ in 0..10 {
			assert_eq!(sim.tick(), TickStatus::Idle);
		}
	}

	#[test]
	fn settles_exactly_once_per_episode() {
		let mut sim = sim(star(4));
		let settled = (0..1000)
			.map(|_| sim.tick())
			.filter(|s| *s == TickStatus::Settled)
			.count();
		assert_eq!(settled, 1);
		assert!(!sim.is_running());

		sim.reheat(0.1);
		assert!(sim.run_to_settle(1000));
		assert_eq!(sim.tick(), TickStatus::Idle);
	}

	#[test]
	fn alpha_cools_monotonically() {
		let mut sim = sim(star(2));
		let mut last = sim.alpha();
		while sim.tick() == TickStatus::Running {
			assert!(sim.alpha() < last);
			last = sim.alpha();
		}
		assert!(sim.alpha() < 0.001);
	}

	#[test]
	fn alpha_target_keeps_it_warm() {
		let mut sim = sim(star(2));
		sim.set_alpha_target(0.3);
		for _ in 0..2000 {
			assert_ne!(sim.tick(), TickStatus::Settled);
		}
		assert!((sim.alpha() - 0.3).abs() < 0.01);
		sim.set_alpha_target(0.0);
		assert!(sim.run_to_settle(1000));
	}

	#[test]
	fn new_chapters_seed_around_their_book() {
		let mut derived = star(3);
		derived.nodes[0].x = -500.0;
		derived.nodes[0].y = 900.0;
		derived.nodes[0].positioned = true;
		let sim = sim(derived);
		for node in &sim.nodes()[1..] {
			let d = ((node.x + 500.0).powi(2) + (node.y - 900.0).powi(2)).sqrt();
			assert!(d < 50.0, "{} seeded {d} away", node.id);
		}
	}

	#[test]
	fn unrelated_new_nodes_seed_near_center() {
		let sim = sim(Derived {
			nodes: vec![book("a"), book("b")],
			links: vec![],
		});
		for node in sim.nodes() {
			let d = ((node.x - 400.0).powi(2) + (node.y - 300.0).powi(2)).sqrt();
			assert!(d < 30.0);
		}
	}

	#[test]
	fn replace_keeps_positioned_nodes_exactly() {
		let mut sim = sim(star(3));
		sim.run_to_settle(1000);
		let before = sim.states();

		let mut derived = star(3);
		let prior = sim.states();
		for node in &mut derived.nodes {
			let s = prior[&node.id];
			(node.x, node.y, node.vx, node.vy, node.positioned) = (s.x, s.y, s.vx, s.vy, true);
		}
		sim.replace(derived);
		assert_eq!(sim.states(), before);
	}

	#[test]
	fn pinned_node_holds_its_position() {
		let mut sim = sim(star(3));
		assert!(sim.pin("c0", 100.0, 100.0));
		sim.set_alpha_target(0.3);
		for _ in 0..50 {
			sim.tick();
		}
		let c0 = sim.node("c0").unwrap();
		assert_eq!((c0.x, c0.y), (100.0, 100.0));

		assert!(sim.unpin("c0"));
		let c0 = sim.node("c0").unwrap();
		assert_eq!((c0.x, c0.y), (100.0, 100.0));
		assert!(!c0.is_pinned());
		assert!(!sim.pin("missing", 0.0, 0.0));
	}

	#[test]
	fn settled_layout_has_no_overlaps() {
		let mut derived = star(8);
		for node in &mut derived.nodes {
			node.positioned = true;
			(node.x, node.y) = (10.0, 10.0);
		}
		let mut sim = sim(derived);
		assert!(sim.run_to_settle(2000));
		let nodes = sim.nodes();
		for (i, a) in nodes.iter().enumerate() {
			for b in &nodes[i + 1..] {
				let d = ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt();
				assert!(d >= a.radius + b.radius + 8.0 - 0.01, "{} {} at {d}", a.id, b.id);
			}
		}
	}

	#[test]
	fn stop_is_idempotent() {
		let mut sim = sim(star(1));
		sim.stop();
		sim.stop();
		assert_eq!(sim.tick(), TickStatus::Idle);
	}

	#[test]
	fn link_segments_resolve_positions_and_highlight() {
		let mut derived = star(2);
		derived.nodes[2].highlighted = false;
		let sim = sim(derived);
		let segments = sim.link_segments();
		assert_eq!(segments.len(), 2);
		let b = sim.node("b").unwrap();
		assert_eq!(segments[0].from, (b.x, b.y));
		assert!(segments[0].highlighted);
		assert!(!segments[1].highlighted);
	}

	#[test]
	fn hit_test_prefers_topmost() {
		let mut derived = star(1);
		for node in &mut derived.nodes {
			node.positioned = true;
		}
		let sim = sim(derived);
		assert_eq!(sim.node_at(0.0, 0.0).map(|n| n.id.as_str()), Some("c0"));
		assert_eq!(sim.node_at(20.0, 0.0).map(|n| n.id.as_str()), Some("b"));
		assert!(sim.node_at(100.0, 100.0).is_none());
	}
}
