//! Reading-notes mindmap: a headless layout engine plus its canvas adapter.

mod color;
mod component;
mod config;
mod engine;
mod error;
mod interaction;
mod model;
mod render;
mod simulation;
mod types;
mod viewport;

pub use color::{Rgb, normalize_concept};
pub use component::MindmapCanvas;
pub use config::MindmapConfig;
pub use engine::MindmapEngine;
pub use error::MindmapError;
pub use interaction::ClickOutcome;
pub use model::{ViewState, toggle_concept_filter};
pub use simulation::TickStatus;
pub use types::{
	Book, Chapter, Concept, ConceptEdge, ConceptGraph, DomainGraph, Link, LinkKind, LinkSegment,
	Node, NodeKind, NodeSnapshot,
};
pub use viewport::{ViewTransform, ViewportController};
