//! Derivation of the node/link set from domain data and view state.

use std::collections::{HashMap, HashSet};

use log::{debug, warn};

use super::color::{CONCEPT_HEX, Rgb, concept_matches, normalize_concept};
use super::types::{
	Book, Chapter, Concept, DomainGraph, Link, LinkKind, Node, NodeKind, NodeState,
	concept_node_id,
};

/// View fields that drive derivation. Only interaction and viewport code mutate it.
#[derive(Clone, Debug, Default)]
pub struct ViewState {
	/// Books whose chapters are shown.
	pub expanded_book_ids: HashSet<String>,
	/// Whether concept nodes are derived.
	pub show_concepts: bool,
	/// Stored normalized.
	pub concept_filter: Option<String>,
	/// One-shot camera target, consumed once the layout settles.
	pub focus_target_id: Option<String>,
	initialized: bool,
}

impl ViewState {
	/// Nothing expanded yet; see [`ViewState::expand_all_if_first`].
	pub fn new(show_concepts: bool) -> Self {
		Self {
			show_concepts,
			..Default::default()
		}
	}

	/// Expands every book on the first derivation when nothing was expanded yet.
	pub fn expand_all_if_first(&mut self, graph: &DomainGraph) {
		if self.initialized {
			return;
		}
		self.initialized = true;
		if self.expanded_book_ids.is_empty() {
			self.expanded_book_ids = graph.books.iter().map(|b| b.id.clone()).collect();
		}
	}

	/// Flips a book's expansion. Returns the new state, or `None` for unknown ids.
	pub fn toggle_book(&mut self, graph: &DomainGraph, book_id: &str) -> Option<bool> {
		if !graph.books.iter().any(|b| b.id == book_id) {
			return None;
		}
		if self.expanded_book_ids.remove(book_id) {
			Some(false)
		} else {
			self.expanded_book_ids.insert(book_id.to_string());
			Some(true)
		}
	}

	/// Sets the filter, normalized. Blank input clears it.
	pub fn set_concept_filter(&mut self, filter: Option<&str>) {
		self.concept_filter = filter.map(normalize_concept).filter(|f| !f.is_empty());
	}

	/// Selecting the active concept clears the filter; any other replaces it.
	pub fn toggle_concept_filter(&mut self, concept: &str) -> Option<&str> {
		toggle_concept_filter(&mut self.concept_filter, concept);
		self.concept_filter.as_deref()
	}
}

/// Toggle rule shared by the engine and hosts holding the filter themselves.
pub fn toggle_concept_filter(filter: &mut Option<String>, concept: &str) {
	let normalized = normalize_concept(concept);
	if normalized.is_empty() || filter.as_deref() == Some(normalized.as_str()) {
		*filter = None;
	} else {
		*filter = Some(normalized);
	}
}

/// Output of one derivation pass.
#[derive(Clone, Debug, Default)]
pub struct Derived {
	pub nodes: Vec<Node>,
	pub links: Vec<Link>,
}

fn chapter_matches(chapter: &Chapter, filter: Option<&str>) -> bool {
	let Some(filter) = filter else {
		return true;
	};
	chapter
		.concepts
		.iter()
		.chain(&chapter.key_themes)
		.any(|c| concept_matches(filter, c))
}

fn book_matches(book: &Book, filter: Option<&str>) -> bool {
	filter.is_none() || book.chapters.iter().any(|ch| chapter_matches(ch, filter))
}

fn concept_label(concept: &Concept) -> &str {
	concept.label.as_deref().unwrap_or(&concept.id)
}

fn concept_highlighted(concept: &Concept, filter: Option<&str>) -> bool {
	filter.is_none_or(|f| concept_matches(f, &concept.id) || concept_matches(f, concept_label(concept)))
}

struct Builder<'a> {
	prior: &'a HashMap<String, NodeState>,
	ids: HashSet<String>,
	out: Derived,
}

impl Builder<'_> {
	fn push_node(&mut self, mut node: Node) -> bool {
		if !self.ids.insert(node.id.clone()) {
			warn!("duplicate node id `{}` skipped", node.id);
			return false;
		}
		if let Some(state) = self.prior.get(&node.id) {
			node.x = state.x;
			node.y = state.y;
			node.vx = state.vx;
			node.vy = state.vy;
			node.pin = state.pin;
			node.positioned = true;
		}
		self.out.nodes.push(node);
		true
	}

	fn push_link(&mut self, source: String, target: String, kind: LinkKind) {
		if self.ids.contains(&source) && self.ids.contains(&target) {
			self.out.links.push(Link {
				source,
				target,
				kind,
			});
		}
	}
}

/// Builds the node/link set for `graph` under `view`.
///
/// Nodes whose id appears in `prior` take over its position, velocity and
/// pin; all others come out unpositioned. Links are only emitted between
/// nodes of this pass.
pub fn derive(
	graph: &DomainGraph,
	view: &ViewState,
	prior: &HashMap<String, NodeState>,
	desaturation: f64,
) -> Derived {
	let filter = view.concept_filter.as_deref();
	let mut builder = Builder {
		prior,
		ids: HashSet::new(),
		out: Derived::default(),
	};

	for book in &graph.books {
		let color = Rgb::from_hex_or_neutral(book.color.as_deref());
		let mut node = Node::new(book.id.clone(), NodeKind::Book, book.title.clone(), color);
		node.highlighted = book_matches(book, filter);
		if !builder.push_node(node) || !view.expanded_book_ids.contains(&book.id) {
			continue;
		}

		let chapter_color = color.desaturate(desaturation);
		for chapter in &book.chapters {
			let kind = NodeKind::Chapter {
				book_id: book.id.clone(),
			};
			let mut node = Node::new(chapter.id.clone(), kind, chapter.title.clone(), chapter_color);
			node.highlighted = chapter_matches(chapter, filter);
			if builder.push_node(node) {
				builder.push_link(book.id.clone(), chapter.id.clone(), LinkKind::Containment);
			}
		}
	}

	if let Some(concepts) = graph.concept_graph.as_ref().filter(|_| view.show_concepts) {
		let concept_color = Rgb::from_hex_or_neutral(Some(CONCEPT_HEX));
		let mut concept_ids = HashSet::new();

		for concept in &concepts.nodes {
			let id = concept_node_id(&concept.id);
			let weight = concept.weight.unwrap_or(concept.chapters.len() as u32);
			let label = concept_label(concept).to_string();
			let kind = NodeKind::Concept {
				concept_id: concept.id.clone(),
				weight,
			};
			let mut node = Node::new(id.clone(), kind, label.clone(), concept_color);
			node.tooltip = format!("{label} ({weight} chapters)");
			node.highlighted = concept_highlighted(concept, filter);
			if !builder.push_node(node) {
				continue;
			}
			concept_ids.insert(concept.id.as_str());
			for chapter_id in &concept.chapters {
				builder.push_link(id.clone(), chapter_id.clone(), LinkKind::ConceptAssociation);
			}
		}

		for edge in &concepts.edges {
			let resolve = |end: &str| {
				if concept_ids.contains(end) {
					concept_node_id(end)
				} else {
					end.to_string()
				}
			};
			let (source, target) = (resolve(&edge.source), resolve(&edge.target));
			builder.push_link(source, target, LinkKind::ConceptAssociation);
		}
	}

	debug!(
		"derived {} nodes, {} links",
		builder.out.nodes.len(),
		builder.out.links.len()
	);
	builder.out
}
