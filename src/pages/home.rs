use std::collections::BTreeMap;

use leptos::prelude::*;

use crate::components::mindmap::{
	Book, Chapter, Concept, ConceptEdge, ConceptGraph, DomainGraph, MindmapCanvas,
	toggle_concept_filter,
};

const SHELF: &[(&str, &str, &str)] = &[
	("meditations", "Meditations", "#7A5AF8"),
	("walden", "Walden", "#2EA043"),
	("deep-work", "Deep Work", "#DB6D28"),
	("flow", "Flow", "#1F6FEB"),
	("antifragile", "Antifragile", "#DA3633"),
];

const CONCEPTS: &[&str] = &[
	"stoicism",
	"attention",
	"solitude",
	"habit",
	"resilience",
	"craft",
	"simplicity",
];

/// Simple pseudo-random number generator (deterministic for consistency).
fn rand_simple(seed: usize) -> f64 {
	let x = ((seed + 1) * 9301 + 49297) % 233280;
	(x as f64) / 233280.0
}

/// Generate a sample shelf: a few books, their chapters, and concepts shared
/// by more than one chapter.
fn generate_sample_data() -> DomainGraph {
	let mut index: BTreeMap<&str, Vec<String>> = BTreeMap::new();
	let books: Vec<Book> = SHELF
		.iter()
		.enumerate()
		.map(|(b, &(id, title, color))| {
			let count = 3 + (rand_simple(b * 7) * 5.0) as usize;
			let chapters = (1..=count)
				.map(|n| {
					let chapter_id = format!("{id}-ch{n}");
					let mut picks: Vec<&str> = (0..2)
						.map(|k| CONCEPTS[(rand_simple(b * 31 + n * 5 + k) * CONCEPTS.len() as f64) as usize])
						.collect();
					picks.dedup();
					for &concept in &picks {
						index.entry(concept).or_default().push(chapter_id.clone());
					}
					Chapter {
						id: chapter_id,
						title: format!("Chapter {n}"),
						chapter: n as u32,
						concepts: picks.iter().map(|c| c.to_string()).collect(),
						key_themes: vec![],
					}
				})
				.collect();
			Book {
				id: id.to_string(),
				title: title.to_string(),
				color: Some(color.to_string()),
				chapters,
			}
		})
		.collect();

	let nodes: Vec<Concept> = index
		.into_iter()
		.filter(|(_, chapters)| chapters.len() > 1)
		.map(|(id, chapters)| Concept {
			id: id.to_string(),
			label: Some(id[..1].to_uppercase() + &id[1..]),
			weight: Some(chapters.len() as u32),
			chapters,
		})
		.collect();
	let edges = nodes
		.windows(2)
		.map(|pair| ConceptEdge {
			source: pair[0].id.clone(),
			target: pair[1].id.clone(),
		})
		.collect();

	DomainGraph {
		books,
		concept_graph: Some(ConceptGraph { nodes, edges }),
	}
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let graph_data = Signal::derive(generate_sample_data);
	let (show_concepts, set_show_concepts) = signal(false);
	let (concept_filter, set_concept_filter) = signal(None::<String>);
	let (focus_target, set_focus_target) = signal(None::<String>);
	let (selected, set_selected) = signal(None::<String>);

	let on_chapter_select = Callback::new(move |id: String| set_selected.set(Some(id)));
	let on_concept_filter_toggle = Callback::new(move |concept: String| {
		set_concept_filter.update(|filter| toggle_concept_filter(filter, &concept));
	});

	let focus_buttons = move || {
		graph_data
			.get()
			.books
			.into_iter()
			.map(|book| {
				let id = book.id.clone();
				view! {
					<button on:click=move |_| set_focus_target.set(Some(id.clone()))>
						{book.title}
					</button>
				}
			})
			.collect_view()
	};

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="fullscreen-graph">
				<MindmapCanvas
					data=graph_data
					show_concepts=show_concepts
					concept_filter=concept_filter
					focus_target=focus_target
					on_chapter_select=on_chapter_select
					on_concept_filter_toggle=on_concept_filter_toggle
					fullscreen=true
				/>
				<div class="graph-overlay">
					<h1>"Reading Mindmap"</h1>
					<p class="subtitle">
						"Click a book to fold its chapters. Drag nodes to reposition. Scroll to zoom."
					</p>
					<div class="graph-controls">
						<button
							class:active=move || show_concepts.get()
							on:click=move |_| set_show_concepts.update(|show| *show = !*show)
						>
							"Concepts"
						</button>
						{focus_buttons}
					</div>
					{move || {
						concept_filter
							.get()
							.map(|filter| {
								view! {
									<button class="filter-chip" on:click=move |_| set_concept_filter.set(None)>
										{format!("Filter: {filter} ×")}
									</button>
								}
							})
					}}
					{move || {
						selected
							.get()
							.map(|id| view! { <p class="selected-chapter">{format!("Reading {id}")}</p> })
					}}
				</div>
			</div>
		</ErrorBoundary>
	}
}
