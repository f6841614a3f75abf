use std::collections::HashSet;

use log::{debug, info};

use super::config::MindmapConfig;
use super::interaction::{ClickOutcome, InteractionController};
use super::model::{ViewState, derive};
use super::simulation::{ForceSimulation, TickStatus};
use super::types::{DomainGraph, LinkSegment, Node, NodeSnapshot};
use super::viewport::{ViewTransform, ViewportController, ease_in_out_cubic};

/// One mounted mindmap: domain data, view state, solver, gestures and camera.
///
/// Every mutation happens through `&mut self`, so a re-derivation always
/// lands between two ticks. There is exactly one solver per engine; a new
/// [`DomainGraph`] means a new engine.
pub struct MindmapEngine {
	graph: DomainGraph,
	config: MindmapConfig,
	view: ViewState,
	simulation: ForceSimulation,
	interaction: InteractionController,
	viewport: ViewportController,
	hovered: Option<String>,
	/// Seconds of ticking since mount; drives the entrance fade.
	elapsed: f64,
	started: bool,
	disposed: bool,
}

impl MindmapEngine {
	/// Derives the first node set with every book expanded. Nothing moves
	/// until [`Self::start`].
	pub fn new(graph: DomainGraph, config: MindmapConfig, width: f64, height: f64) -> Self {
		let simulation = ForceSimulation::new(&config, (width / 2.0, height / 2.0));
		let mut engine = Self {
			interaction: InteractionController::new(config.drag_alpha_target),
			viewport: ViewportController::new(&config, width, height, false),
			view: ViewState::default(),
			hovered: None,
			elapsed: 0.0,
			started: false,
			disposed: false,
			graph,
			config,
			simulation,
		};
		engine.view.expand_all_if_first(&engine.graph);
		engine.rederive();
		info!(
			"mindmap mounted: {} books, {} nodes",
			engine.graph.books.len(),
			engine.simulation.nodes().len()
		);
		engine
	}

	/// Starts a cold layout. Waits for a non-empty surface.
	pub fn start(&mut self) {
		if self.disposed {
			return;
		}
		if !self.viewport.has_surface() {
			debug!("mindmap start deferred: no surface");
			return;
		}
		self.started = true;
		self.simulation.restart_with_alpha(1.0);
	}

	/// Pauses the solver. Idempotent.
	pub fn stop(&mut self) {
		self.simulation.stop();
	}

	/// Stops ticking and drops gestures and pending focus. Idempotent; every
	/// later call on the engine is a no-op.
	pub fn dispose(&mut self) {
		if self.disposed {
			return;
		}
		self.simulation.stop();
		self.interaction.release_all(&mut self.simulation);
		self.simulation.stop();
		self.view.focus_target_id = None;
		self.hovered = None;
		self.disposed = true;
		info!("mindmap disposed");
	}

	/// Whether [`Self::dispose`] has run.
	pub fn is_disposed(&self) -> bool {
		self.disposed
	}

	/// Whether the solver is still cooling.
	pub fn is_running(&self) -> bool {
		self.simulation.is_running()
	}

	/// Current solver energy.
	pub fn alpha(&self) -> f64 {
		self.simulation.alpha()
	}

	/// Expansion, filter and pending focus.
	pub fn view(&self) -> &ViewState {
		&self.view
	}

	/// The domain data this engine was mounted with.
	pub fn graph(&self) -> &DomainGraph {
		&self.graph
	}

	/// Current nodes in draw order.
	pub fn nodes(&self) -> &[Node] {
		self.simulation.nodes()
	}

	/// Looks up a current node by id.
	pub fn node(&self, id: &str) -> Option<&Node> {
		self.simulation.node(id)
	}

	/// Per-node positions for this frame.
	pub fn snapshots(&self) -> Vec<NodeSnapshot> {
		self.simulation.snapshots()
	}

	/// Links with both endpoints resolved to positions.
	pub fn link_segments(&self) -> Vec<LinkSegment> {
		self.simulation.link_segments()
	}

	/// Current camera transform.
	pub fn transform(&self) -> ViewTransform {
		self.viewport.transform()
	}

	/// The camera, for coordinate conversion and surface size.
	pub fn viewport(&self) -> &ViewportController {
		&self.viewport
	}

	/// Advances solver and camera by one frame.
	pub fn tick(&mut self, dt: f64) -> TickStatus {
		if self.disposed {
			return TickStatus::Idle;
		}
		let status = self.simulation.tick();
		if status == TickStatus::Settled {
			self.viewport.on_settled(&mut self.view, &self.simulation);
		}
		self.viewport.advance(dt);
		self.elapsed += dt;
		status
	}

	/// Fade-in opacity of the node at `index` in draw order. Nodes appear one
	/// after another after mount; under reduced motion they are fully opaque.
	pub fn entrance_opacity(&self, index: usize) -> f64 {
		let duration = self.config.entrance_duration;
		if self.viewport.reduced_motion() || duration <= 0.0 {
			return 1.0;
		}
		let t = (self.elapsed - index as f64 * self.config.entrance_stagger) / duration;
		ease_in_out_cubic(t.clamp(0.0, 1.0))
	}

	/// Rebuilds nodes/links from the current view. Returns how many node ids
	/// were added or removed.
	fn rederive(&mut self) -> usize {
		let before: HashSet<String> = self.simulation.nodes().iter().map(|n| n.id.clone()).collect();
		let derived = derive(
			&self.graph,
			&self.view,
			&self.simulation.states(),
			self.config.desaturation,
		);
		let after: HashSet<&str> = derived.nodes.iter().map(|n| n.id.as_str()).collect();
		let changed = before.iter().filter(|id| !after.contains(id.as_str())).count()
			+ after.iter().filter(|id| !before.contains(**id)).count();
		self.simulation.replace(derived);
		self.interaction.retain_present(&mut self.simulation);
		changed
	}

	/// Re-derives and warms the solver in proportion to the population change.
	/// At least `reheat_alpha`; at least `material_reheat_alpha` once the added
	/// plus removed count reaches `material_change_ratio` of the old population.
	fn rederive_and_reheat(&mut self) {
		let before = self.simulation.nodes().len();
		let changed = self.rederive();
		if !self.started || changed == 0 {
			return;
		}
		let material = changed as f64 >= self.config.material_change_ratio * before.max(1) as f64;
		let alpha = if material {
			self.config.material_reheat_alpha
		} else {
			self.config.reheat_alpha
		};
		debug!("{changed} nodes changed, reheating to {alpha}");
		self.simulation.reheat(alpha);
	}

	/// Dispatches a click on node `id` by kind. Book clicks re-derive here;
	/// the other outcomes are for the host.
	pub fn click(&mut self, id: &str) -> ClickOutcome {
		if self.disposed {
			return ClickOutcome::Missed;
		}
		let outcome = self
			.interaction
			.click(&mut self.view, &self.graph, &self.simulation, id);
		if let ClickOutcome::BookToggled { .. } = outcome {
			self.rederive_and_reheat();
		}
		outcome
	}

	/// Clicks whatever lies under a model-space point.
	pub fn click_at(&mut self, x: f64, y: f64) -> ClickOutcome {
		match self.node_at(x, y).map(|n| n.id.clone()) {
			Some(id) => self.click(&id),
			None => ClickOutcome::Missed,
		}
	}

	/// Topmost node containing the model-space point.
	pub fn node_at(&self, x: f64, y: f64) -> Option<&Node> {
		self.simulation.node_at(x, y)
	}

	/// Pins `id` where it is and holds the layout warm. False if the node is
	/// unknown or already held.
	pub fn drag_start(&mut self, id: &str) -> bool {
		!self.disposed && self.interaction.drag_start(&mut self.simulation, id)
	}

	/// `x`/`y` are model-space; see [`ViewportController::screen_to_model`].
	pub fn drag_move(&mut self, id: &str, x: f64, y: f64) -> bool {
		!self.disposed && self.interaction.drag_move(&mut self.simulation, id, x, y)
	}

	/// Releases the pin at the node's current position.
	pub fn drag_end(&mut self, id: &str) -> bool {
		!self.disposed && self.interaction.drag_end(&mut self.simulation, id)
	}

	/// Whether an unreleased drag holds `id`.
	pub fn is_dragging(&self, id: &str) -> bool {
		self.interaction.is_dragging(id)
	}

	/// Ends every drag, e.g. when the pointer leaves the surface.
	pub fn release_drags(&mut self) {
		if !self.disposed {
			self.interaction.release_all(&mut self.simulation);
		}
	}

	/// Shows or hides concept nodes and re-derives warm.
	pub fn set_show_concepts(&mut self, show: bool) {
		if self.disposed || self.view.show_concepts == show {
			return;
		}
		self.view.show_concepts = show;
		self.rederive_and_reheat();
	}

	/// Replaces the filter. Highlighting changes; positions do not.
	pub fn set_concept_filter(&mut self, filter: Option<&str>) {
		if self.disposed {
			return;
		}
		self.view.set_concept_filter(filter);
		self.rederive();
	}

	/// Applies the toggle rule and re-derives. Returns the new filter.
	pub fn toggle_concept_filter(&mut self, concept_id: &str) -> Option<String> {
		if self.disposed {
			return None;
		}
		self.view.toggle_concept_filter(concept_id);
		self.rederive();
		self.view.concept_filter.clone()
	}

	/// Centers `id` once the layout next settles, after a focus-strength restart.
	pub fn focus_node(&mut self, id: &str) {
		if self.disposed {
			return;
		}
		self.viewport.request_focus(&mut self.view, id);
		self.started = true;
		self.simulation.restart_with_alpha(self.config.focus_alpha);
	}

	/// Expands a book if needed and focuses it.
	pub fn focus_book(&mut self, book_id: &str) {
		if self.disposed || !self.graph.books.iter().any(|b| b.id == book_id) {
			return;
		}
		if self.view.expanded_book_ids.insert(book_id.to_string()) {
			self.rederive();
		}
		self.focus_node(book_id);
	}

	/// Focuses a book (expanding it) or any other node by id.
	pub fn focus(&mut self, id: &str) {
		if self.graph.books.iter().any(|b| b.id == id) {
			self.focus_book(id);
		} else {
			self.focus_node(id);
		}
	}

	/// New surface size. Starts a deferred layout once the surface is usable.
	pub fn resize(&mut self, width: f64, height: f64) {
		if self.disposed {
			return;
		}
		self.viewport.resize(width, height);
		self.simulation.set_center(width / 2.0, height / 2.0);
		if !self.started {
			self.start();
		}
	}

	/// Host preference; skips camera animation and the entrance fade.
	pub fn set_reduced_motion(&mut self, reduced: bool) {
		self.viewport.set_reduced_motion(reduced);
	}

	/// Converts a surface-relative pointer position to model space.
	pub fn screen_to_model(&self, sx: f64, sy: f64) -> (f64, f64) {
		self.viewport.screen_to_model(sx, sy)
	}

	/// Pans by a screen-space delta.
	pub fn pan_by(&mut self, dx: f64, dy: f64) {
		self.viewport.pan_by(dx, dy);
	}

	/// Zooms about a screen point; scale stays within the configured extent.
	pub fn zoom_at(&mut self, sx: f64, sy: f64, factor: f64) {
		self.viewport.zoom_at(sx, sy, factor);
	}

	/// Marks the node under the pointer, or none.
	pub fn set_hovered(&mut self, id: Option<&str>) {
		self.hovered = id.map(str::to_string);
	}

	/// The hovered node, if it is still in the layout.
	pub fn hovered(&self) -> Option<&Node> {
		self.hovered.as_deref().and_then(|id| self.simulation.node(id))
	}
}
