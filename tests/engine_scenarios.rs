use std::collections::HashSet;

use reading_mindmap::mindmap::{
	Book, Chapter, ClickOutcome, Concept, ConceptGraph, DomainGraph, LinkKind, MindmapConfig,
	MindmapEngine, NodeKind, TickStatus,
};

fn chapter(id: &str, concepts: &[&str]) -> Chapter {
	Chapter {
		id: id.to_string(),
		title: id.to_uppercase(),
		chapter: 1,
		concepts: concepts.iter().map(|c| c.to_string()).collect(),
		key_themes: vec![],
	}
}

fn one_book() -> DomainGraph {
	DomainGraph {
		books: vec![Book {
			id: "b1".into(),
			title: "Meditations".into(),
			color: Some("#7a5af8".into()),
			chapters: vec![
				chapter("c1", &["Stoicism"]),
				chapter("c2", &["Duty"]),
				chapter("c3", &[]),
			],
		}],
		concept_graph: None,
	}
}

fn shelf() -> DomainGraph {
	let books = (0..3)
		.map(|b| Book {
			id: format!("b{b}"),
			title: format!("Book {b}"),
			color: None,
			chapters: (0..4)
				.map(|c| chapter(&format!("b{b}-c{c}"), &["focus"]))
				.collect(),
		})
		.collect();
	DomainGraph {
		books,
		concept_graph: Some(ConceptGraph {
			nodes: vec![
				Concept {
					id: "focus".into(),
					label: Some("Focus".into()),
					chapters: vec!["b0-c0".into(), "b1-c0".into(), "b2-c0".into()],
					weight: None,
				},
				Concept {
					id: "rest".into(),
					label: None,
					chapters: vec!["b0-c1".into()],
					weight: None,
				},
			],
			edges: vec![],
		}),
	}
}

fn mounted(graph: DomainGraph) -> MindmapEngine {
	let mut engine = MindmapEngine::new(graph, MindmapConfig::default(), 800.0, 600.0);
	engine.start();
	engine
}

fn settle(engine: &mut MindmapEngine) {
	for _ in 0..5000 {
		if engine.tick(0.016) == TickStatus::Settled {
			return;
		}
	}
	panic!("layout never settled");
}

fn node_ids(engine: &MindmapEngine) -> HashSet<String> {
	engine.nodes().iter().map(|n| n.id.clone()).collect()
}

fn link_pairs(engine: &MindmapEngine) -> HashSet<(String, String)> {
	engine
		.link_segments()
		.into_iter()
		.map(|l| (l.source, l.target))
		.collect()
}

fn ids(list: &[&str]) -> HashSet<String> {
	list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn first_mount_expands_every_book() {
	let engine = mounted(one_book());
	assert_eq!(node_ids(&engine), ids(&["b1", "c1", "c2", "c3"]));
	let expected: HashSet<_> = ["c1", "c2", "c3"]
		.iter()
		.map(|c| ("b1".to_string(), c.to_string()))
		.collect();
	assert_eq!(link_pairs(&engine), expected);
	assert!(
		engine
			.link_segments()
			.iter()
			.all(|l| l.kind == LinkKind::Containment)
	);
}

#[test]
fn clicking_a_book_twice_collapses_then_restores() {
	let mut engine = mounted(one_book());
	settle(&mut engine);

	assert_eq!(
		engine.click("b1"),
		ClickOutcome::BookToggled {
			book_id: "b1".into(),
			expanded: false
		}
	);
	assert_eq!(node_ids(&engine), ids(&["b1"]));
	assert!(engine.link_segments().is_empty());
	assert!(engine.is_running());

	settle(&mut engine);
	engine.click("b1");
	assert_eq!(node_ids(&engine), ids(&["b1", "c1", "c2", "c3"]));
	assert_eq!(engine.link_segments().len(), 3);
}

#[test]
fn chapter_and_concept_clicks_go_to_the_host() {
	let mut engine = mounted(shelf());
	engine.set_show_concepts(true);
	assert_eq!(
		engine.click("b0-c2"),
		ClickOutcome::ChapterSelected("b0-c2".into())
	);
	assert_eq!(
		engine.click("concept-focus"),
		ClickOutcome::ConceptFilterToggled("focus".into())
	);
	assert!(engine.view().concept_filter.is_none());
}

#[test]
fn double_toggle_clears_the_filter() {
	let mut engine = mounted(shelf());
	assert_eq!(engine.toggle_concept_filter("Focus").as_deref(), Some("focus"));
	assert_eq!(engine.toggle_concept_filter("focus"), None);
	assert!(engine.nodes().iter().all(|n| n.highlighted));
}

#[test]
fn filter_highlights_matching_chapter_and_its_book() {
	let mut engine = mounted(one_book());
	engine.set_concept_filter(Some("stoicism"));
	let lit: HashSet<String> = engine
		.nodes()
		.iter()
		.filter(|n| n.highlighted)
		.map(|n| n.id.clone())
		.collect();
	assert_eq!(lit, ids(&["b1", "c1"]));
	assert!(engine.link_segments().iter().any(|l| l.target == "c1" && l.highlighted));
	assert!(engine.link_segments().iter().any(|l| l.target == "c2" && !l.highlighted));
}

#[test]
fn rederiving_unchanged_state_keeps_positions_exactly() {
	let mut engine = mounted(shelf());
	for _ in 0..40 {
		engine.tick(0.016);
	}
	let before = engine.snapshots();
	engine.set_concept_filter(None);
	engine.set_concept_filter(None);
	assert_eq!(engine.snapshots(), before);
}

#[test]
fn node_count_follows_expansion_and_concepts() {
	let mut engine = mounted(shelf());
	assert_eq!(engine.nodes().len(), 3 + 12);
	engine.set_show_concepts(true);
	assert_eq!(engine.nodes().len(), 3 + 12 + 2);
	engine.click("b2");
	assert_eq!(engine.nodes().len(), 3 + 8 + 2);
	// The focus link into the collapsed book is gone, not dangling.
	assert!(engine.link_segments().iter().all(|l| l.target != "b2-c0"));
}

#[test]
fn drag_release_resumes_from_the_drop_point() {
	let mut engine = mounted(one_book());
	settle(&mut engine);

	assert!(engine.drag_start("b1"));
	assert!(engine.is_running());
	for step in 1..=10 {
		let t = step as f64 / 10.0;
		engine.drag_move("b1", 100.0 * t, 100.0 * t);
		engine.tick(0.016);
	}
	let held = engine.node("b1").unwrap();
	assert_eq!((held.x, held.y), (100.0, 100.0));

	assert!(engine.drag_end("b1"));
	let released = engine.node("b1").unwrap();
	assert!(!released.is_pinned());
	assert_eq!((released.x, released.y), (100.0, 100.0));
	assert!(engine.is_running());

	engine.tick(0.016);
	let moved = engine.node("b1").unwrap();
	assert!((moved.x - 100.0).abs() < 30.0 && (moved.y - 100.0).abs() < 30.0);
}

#[test]
fn focus_waits_while_a_drag_holds_the_layout() {
	let mut engine = mounted(one_book());
	engine.set_reduced_motion(true);
	engine.focus_node("c2");
	engine.drag_start("c1");
	for _ in 0..2000 {
		assert_ne!(engine.tick(0.016), TickStatus::Settled);
	}
	assert_eq!(engine.view().focus_target_id.as_deref(), Some("c2"));

	engine.drag_end("c1");
	settle(&mut engine);
	assert!(engine.view().focus_target_id.is_none());
	let c2 = engine.node("c2").unwrap();
	let (sx, sy) = engine.viewport().model_to_screen(c2.x, c2.y);
	assert!((sx - 400.0).abs() < 1e-6 && (sy - 300.0).abs() < 1e-6);
}

#[test]
fn settled_layout_respects_collision_spacing() {
	let mut engine = mounted(shelf());
	engine.set_show_concepts(true);
	settle(&mut engine);
	let nodes = engine.nodes();
	for (i, a) in nodes.iter().enumerate() {
		for b in &nodes[i + 1..] {
			let d = (a.x - b.x).hypot(a.y - b.y);
			assert!(
				d >= a.radius + b.radius + 8.0 - 0.01,
				"{} and {} are {d} apart",
				a.id,
				b.id
			);
		}
	}
}

#[test]
fn empty_graph_renders_nothing_and_never_settles() {
	let mut engine = mounted(DomainGraph::default());
	assert!(engine.nodes().is_empty());
	for _ in 0..10 {
		assert_eq!(engine.tick(0.016), TickStatus::Idle);
	}
	assert_eq!(engine.click_at(0.0, 0.0), ClickOutcome::Missed);
}

#[test]
fn concept_nodes_are_namespaced() {
	let mut engine = mounted(shelf());
	engine.set_show_concepts(true);
	let concept = engine.node("concept-focus").unwrap();
	assert!(matches!(
		concept.kind,
		NodeKind::Concept { weight: 3, .. }
	));
	assert_eq!(concept.radius, 8.0);
}
