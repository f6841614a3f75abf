use serde::Deserialize;

use super::color::Rgb;
use super::error::MindmapError;

/// The reading corpus as delivered by the host. Read-only for the engine.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainGraph {
	/// Every book on the shelf, in display order.
	#[serde(default)]
	pub books: Vec<Book>,
	/// Cross-book concept index, when the host has one.
	#[serde(default)]
	pub concept_graph: Option<ConceptGraph>,
}

impl DomainGraph {
	/// Parses the host's `graph-data.json` shape. Unknown fields are ignored.
	pub fn from_json(json: &str) -> Result<Self, MindmapError> {
		Ok(serde_json::from_str(json)?)
	}
}

/// A book and its chapters.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
	/// Node id of the book.
	pub id: String,
	/// Drawn as the book label.
	#[serde(default)]
	pub title: String,
	/// Hex color; neutral gray when absent or unparseable.
	#[serde(default)]
	pub color: Option<String>,
	/// Chapters in reading order.
	#[serde(default)]
	pub chapters: Vec<Chapter>,
}

/// One chapter of a [`Book`].
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
	/// Node id of the chapter, unique across books.
	pub id: String,
	/// Drawn as the chapter label.
	#[serde(default)]
	pub title: String,
	/// Chapter number within its book.
	#[serde(default)]
	pub chapter: u32,
	/// Concept labels, matched against the filter.
	#[serde(default)]
	pub concepts: Vec<String>,
	/// Also matched against the filter.
	#[serde(default)]
	pub key_themes: Vec<String>,
}

/// Concepts and the declared relations between them.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ConceptGraph {
	/// One node per concept when concepts are shown.
	#[serde(default)]
	pub nodes: Vec<Concept>,
	/// Declared relations, emitted when both endpoints are present.
	#[serde(default)]
	pub edges: Vec<ConceptEdge>,
}

/// A concept shared by one or more chapters.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Concept {
	/// Concept id; the node id is namespaced as `concept-<id>`.
	pub id: String,
	/// Display label; the id when absent.
	#[serde(default)]
	pub label: Option<String>,
	/// Ids of the chapters this concept appears in.
	#[serde(default)]
	pub chapters: Vec<String>,
	/// Explicit weight; the chapter count when absent.
	#[serde(default)]
	pub weight: Option<u32>,
}

/// A declared concept relation. Endpoints are concept ids or chapter ids.
#[derive(Clone, Debug, Deserialize)]
pub struct ConceptEdge {
	/// First endpoint.
	pub source: String,
	/// Second endpoint.
	pub target: String,
}

/// Node ids for concepts live in their own namespace so they can never
/// collide with book or chapter ids.
pub fn concept_node_id(concept_id: &str) -> String {
	format!("concept-{concept_id}")
}

/// What a derived node stands for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
	/// Always present, one per book.
	Book,
	/// Present while its book is expanded.
	Chapter {
		/// Containing book.
		book_id: String,
	},
	/// Present while concepts are shown.
	Concept {
		/// Id without the `concept-` prefix.
		concept_id: String,
		/// Explicit weight or chapter count.
		weight: u32,
	},
}

impl NodeKind {
	/// Drawn radius, also the base of the collision radius.
	pub fn radius(&self) -> f64 {
		match self {
			NodeKind::Book => 32.0,
			NodeKind::Chapter { .. } => 16.0,
			NodeKind::Concept { .. } => 8.0,
		}
	}
}

/// A derived node plus the solver state carried on it.
#[derive(Clone, Debug)]
pub struct Node {
	/// Stable across derivations; carries position forward.
	pub id: String,
	/// Book, chapter or concept.
	pub kind: NodeKind,
	/// Drawn next to books and chapters.
	pub label: String,
	/// Shown while hovered.
	pub tooltip: String,
	/// Fill color, already desaturated for chapters.
	pub color: Rgb,
	/// Drawn radius.
	pub radius: f64,
	/// Matches the concept filter, or no filter is set.
	pub highlighted: bool,
	/// False until the solver has placed the node.
	pub positioned: bool,
	/// Model-space position.
	pub x: f64,
	/// Model-space position.
	pub y: f64,
	/// Velocity carried between ticks.
	pub vx: f64,
	/// Velocity carried between ticks.
	pub vy: f64,
	/// Pinned position while a drag holds the node.
	pub pin: Option<(f64, f64)>,
}

impl Node {
	/// An unplaced, highlighted node sized by its kind.
	pub fn new(id: String, kind: NodeKind, label: String, color: Rgb) -> Self {
		let radius = kind.radius();
		Self {
			tooltip: label.clone(),
			id,
			kind,
			label,
			color,
			radius,
			highlighted: true,
			positioned: false,
			x: 0.0,
			y: 0.0,
			vx: 0.0,
			vy: 0.0,
			pin: None,
		}
	}

	/// Whether a drag currently holds the node.
	pub fn is_pinned(&self) -> bool {
		self.pin.is_some()
	}
}

/// What a link stands for; also picks its stroke.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkKind {
	/// Book to chapter.
	Containment,
	/// Concept to chapter, or between concept-graph endpoints.
	ConceptAssociation,
}

/// A derived edge between two node ids.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Link {
	/// Source node id.
	pub source: String,
	/// Target node id.
	pub target: String,
	/// Containment or concept association.
	pub kind: LinkKind,
}

/// Solver state of one node, keyed by id between derivation passes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeState {
	pub x: f64,
	pub y: f64,
	pub vx: f64,
	pub vy: f64,
	pub pin: Option<(f64, f64)>,
}

/// Per-tick node output for the renderer.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeSnapshot {
	/// Node id.
	pub id: String,
	/// Model-space x.
	pub x: f64,
	/// Model-space y.
	pub y: f64,
}

/// A link with both endpoints resolved to current positions.
#[derive(Clone, Debug, PartialEq)]
pub struct LinkSegment {
	/// Source node id.
	pub source: String,
	/// Target node id.
	pub target: String,
	/// Picks the stroke.
	pub kind: LinkKind,
	/// Source position.
	pub from: (f64, f64),
	/// Target position.
	pub to: (f64, f64),
	/// Both endpoints highlighted.
	pub highlighted: bool,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_host_graph_json() {
		let json = r##"{
			"generated": "2025-01-01T00:00:00Z",
			"books": [{
				"id": "meditations",
				"title": "Meditations",
				"color": "#7A5AF8",
				"chapters": [{
					"id": "meditations-ch1",
					"chapter": 1,
					"title": "Debts and Lessons",
					"keyThemes": ["gratitude"],
					"concepts": ["stoicism"],
					"rawNotes": "ignored"
				}]
			}],
			"conceptGraph": {
				"nodes": [{ "id": "stoicism", "label": "Stoicism", "chapters": ["meditations-ch1"], "weight": 1 }],
				"edges": []
			}
		}"##;
		let graph = DomainGraph::from_json(json).unwrap();
		assert_eq!(graph.books.len(), 1);
		assert_eq!(graph.books[0].chapters[0].key_themes, vec!["gratitude"]);
		let concepts = graph.concept_graph.unwrap();
		assert_eq!(concepts.nodes[0].weight, Some(1));
	}

	#[test]
	fn rejects_malformed_json() {
		assert!(matches!(
			DomainGraph::from_json("{ not json"),
			Err(MindmapError::Json(_))
		));
	}

	#[test]
	fn radius_follows_kind() {
		assert_eq!(NodeKind::Book.radius(), 32.0);
		assert_eq!(
			NodeKind::Chapter {
				book_id: "b".into()
			}
			.radius(),
			16.0
		);
		assert_eq!(concept_node_id("flow"), "concept-flow");
	}
}
