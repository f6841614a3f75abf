//! Click and drag handling against the current node set.

use std::collections::HashSet;

use log::debug;

use super::model::ViewState;
use super::simulation::ForceSimulation;
use super::types::{DomainGraph, NodeKind};

/// What a click asks of the host or the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClickOutcome {
	/// Host should open this chapter's notes.
	ChapterSelected(String),
	/// Host should toggle its concept filter on this concept id.
	ConceptFilterToggled(String),
	/// A book was expanded or collapsed; the engine re-derives.
	BookToggled {
		/// The clicked book.
		book_id: String,
		/// Its state after the click.
		expanded: bool,
	},
	/// No node under the pointer, or the id is unknown.
	Missed,
}

/// Tracks drag gestures. A node held by an unreleased gesture cannot be
/// grabbed again.
#[derive(Debug, Default)]
pub struct InteractionController {
	dragging: HashSet<String>,
	drag_alpha_target: f64,
}

impl InteractionController {
	pub fn new(drag_alpha_target: f64) -> Self {
		Self {
			dragging: HashSet::new(),
			drag_alpha_target,
		}
	}

	pub fn click(
		&self,
		view: &mut ViewState,
		graph: &DomainGraph,
		sim: &ForceSimulation,
		id: &str,
	) -> ClickOutcome {
		let Some(node) = sim.node(id) else {
			return ClickOutcome::Missed;
		};
		match &node.kind {
			NodeKind::Chapter { .. } => ClickOutcome::ChapterSelected(node.id.clone()),
			NodeKind::Concept { concept_id, .. } => {
				ClickOutcome::ConceptFilterToggled(concept_id.clone())
			}
			NodeKind::Book => match view.toggle_book(graph, &node.id) {
				Some(expanded) => ClickOutcome::BookToggled {
					book_id: node.id.clone(),
					expanded,
				},
				None => ClickOutcome::Missed,
			},
		}
	}

	pub fn is_dragging(&self, id: &str) -> bool {
		self.dragging.contains(id)
	}

	#[cfg(test)]
	pub fn has_active_drag(&self) -> bool {
		!self.dragging.is_empty()
	}

	/// Pins the node where it stands and warms the solver.
	pub fn drag_start(&mut self, sim: &mut ForceSimulation, id: &str) -> bool {
		if self.dragging.contains(id) {
			return false;
		}
		let Some((x, y)) = sim.node(id).map(|n| (n.x, n.y)) else {
			return false;
		};
		sim.pin(id, x, y);
		if self.dragging.is_empty() {
			sim.set_alpha_target(self.drag_alpha_target);
		}
		self.dragging.insert(id.to_string());
		debug!("drag start {id}");
		true
	}

	/// Moves the pin to a model-space point.
	pub fn drag_move(&mut self, sim: &mut ForceSimulation, id: &str, x: f64, y: f64) -> bool {
		self.dragging.contains(id) && sim.pin(id, x, y)
	}

	/// Releases the pin and lets the solver cool once no drag remains.
	pub fn drag_end(&mut self, sim: &mut ForceSimulation, id: &str) -> bool {
		if !self.dragging.remove(id) {
			return false;
		}
		sim.unpin(id);
		if self.dragging.is_empty() {
			sim.set_alpha_target(0.0);
		}
		debug!("drag end {id}");
		true
	}

	/// Ends every gesture, e.g. when the pointer leaves the surface.
	pub fn release_all(&mut self, sim: &mut ForceSimulation) {
		for id in std::mem::take(&mut self.dragging) {
			sim.unpin(&id);
		}
		sim.set_alpha_target(0.0);
	}

	/// Forgets gestures on nodes that a re-derivation removed.
	pub fn retain_present(&mut self, sim: &mut ForceSimulation) {
		self.dragging.retain(|id| sim.node(id).is_some());
		if self.dragging.is_empty() {
			sim.set_alpha_target(0.0);
		}
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashMap;

	use super::*;
	use crate::components::mindmap::config::MindmapConfig;
	use crate::components::mindmap::model::derive;
	use crate::components::mindmap::types::{Book, Chapter, Concept, ConceptGraph};

	fn graph() -> DomainGraph {
		DomainGraph {
			books: vec![Book {
				id: "b1".into(),
				title: "Book".into(),
				color: None,
				chapters: vec![Chapter {
					id: "c1".into(),
					title: "One".into(),
					chapter: 1,
					concepts: vec!["flow".into()],
					key_themes: vec![],
				}],
			}],
			concept_graph: Some(ConceptGraph {
				nodes: vec![Concept {
					id: "flow".into(),
					label: Some("Flow".into()),
					chapters: vec!["c1".into()],
					weight: None,
				}],
				edges: vec![],
			}),
		}
	}

	fn setup() -> (ViewState, ForceSimulation) {
		let mut view = ViewState::new(true);
		view.expand_all_if_first(&graph());
		let mut sim = ForceSimulation::new(&MindmapConfig::default(), (0.0, 0.0));
		sim.replace(derive(&graph(), &view, &HashMap::new(), 0.4));
		(view, sim)
	}

	#[test]
	fn click_dispatches_by_kind() {
		let (mut view, sim) = setup();
		let ctl = InteractionController::new(0.3);
		let graph = graph();

		assert_eq!(
			ctl.click(&mut view, &graph, &sim, "c1"),
			ClickOutcome::ChapterSelected("c1".into())
		);
		assert_eq!(
			ctl.click(&mut view, &graph, &sim, "concept-flow"),
			ClickOutcome::ConceptFilterToggled("flow".into())
		);
		assert_eq!(
			ctl.click(&mut view, &graph, &sim, "b1"),
			ClickOutcome::BookToggled {
				book_id: "b1".into(),
				expanded: false
			}
		);
		assert!(view.expanded_book_ids.is_empty());
		assert_eq!(ctl.click(&mut view, &graph, &sim, "nope"), ClickOutcome::Missed);
	}

	#[test]
	fn drag_pins_and_warms_then_releases() {
		let (_, mut sim) = setup();
		let mut ctl = InteractionController::new(0.3);

		assert!(ctl.drag_start(&mut sim, "b1"));
		assert!(sim.node("b1").unwrap().is_pinned());
		assert_eq!(sim.alpha_target(), 0.3);
		assert!(sim.is_running());

		assert!(ctl.drag_move(&mut sim, "b1", 100.0, 100.0));
		assert!(ctl.drag_end(&mut sim, "b1"));
		let b1 = sim.node("b1").unwrap();
		assert!(!b1.is_pinned());
		assert_eq!((b1.x, b1.y), (100.0, 100.0));
		assert_eq!(sim.alpha_target(), 0.0);
	}

	#[test]
	fn held_node_cannot_be_grabbed_twice() {
		let (_, mut sim) = setup();
		let mut ctl = InteractionController::new(0.3);
		assert!(ctl.drag_start(&mut sim, "c1"));
		assert!(!ctl.drag_start(&mut sim, "c1"));
		assert!(ctl.drag_start(&mut sim, "b1"));

		assert!(ctl.drag_end(&mut sim, "c1"));
		assert_eq!(sim.alpha_target(), 0.3, "b1 is still held");
		assert!(!ctl.drag_end(&mut sim, "c1"));
		assert!(!ctl.drag_move(&mut sim, "c1", 1.0, 1.0));

		ctl.release_all(&mut sim);
		assert!(!ctl.has_active_drag());
		assert!(!sim.node("b1").unwrap().is_pinned());
	}

	#[test]
	fn unknown_node_cannot_be_dragged() {
		let (_, mut sim) = setup();
		let mut ctl = InteractionController::new(0.3);
		assert!(!ctl.drag_start(&mut sim, "ghost"));
		assert!(!ctl.has_active_drag());
	}
}
