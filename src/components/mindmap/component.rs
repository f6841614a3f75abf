use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::prelude::*;
use log::warn;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::config::MindmapConfig;
use super::engine::MindmapEngine;
use super::interaction::ClickOutcome;
use super::render;
use super::types::DomainGraph;

const FRAME_DT: f64 = 0.016;
/// Screen pixels a press may travel and still count as a click.
const CLICK_SLOP: f64 = 3.0;

/// A pressed mouse button, over a node or over the background.
struct Press {
	node: Option<String>,
	start_x: f64,
	start_y: f64,
	last_x: f64,
	last_y: f64,
	dragging: bool,
}

/// The engine and the browser hooks feeding it, shared by the effects, the
/// frame loop and the pointer handlers.
#[derive(Clone, Default)]
struct EngineSlot {
	engine: Rc<RefCell<Option<MindmapEngine>>>,
	generation: Rc<Cell<u32>>,
	resize: Rc<RefCell<Option<Closure<dyn FnMut()>>>>,
}

impl EngineSlot {
	/// Installs `next`, disposing the engine it replaces. Returns the
	/// generation the new frame loop runs under.
	fn install(&self, next: MindmapEngine) -> u32 {
		if let Some(mut previous) = self.engine.borrow_mut().replace(next) {
			previous.dispose();
		}
		self.advance_generation()
	}

	fn advance_generation(&self) -> u32 {
		let next = self.generation.get().wrapping_add(1);
		self.generation.set(next);
		next
	}

	fn is_current(&self, generation: u32) -> bool {
		self.generation.get() == generation
	}

	/// Stops every frame loop, disposes the engine and detaches the resize
	/// listener. Idempotent.
	fn teardown(&self) {
		self.advance_generation();
		if let Ok(mut engine) = self.engine.try_borrow_mut() {
			if let Some(mut e) = engine.take() {
				e.dispose();
			}
		}
		let Some(listener) = self.resize.borrow_mut().take() else {
			return;
		};
		if let Some(window) = web_sys::window() {
			let _ = window
				.remove_event_listener_with_callback("resize", listener.as_ref().unchecked_ref());
		}
	}
}

fn surface_size(
	window: &Window,
	canvas: &HtmlCanvasElement,
	fullscreen: bool,
	width: Option<f64>,
	height: Option<f64>,
) -> (f64, f64) {
	if fullscreen {
		return (
			window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(0.0),
			window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(0.0),
		);
	}
	(
		width.unwrap_or_else(|| {
			canvas
				.parent_element()
				.map(|p| p.client_width() as f64)
				.unwrap_or(800.0)
		}),
		height.unwrap_or_else(|| {
			canvas
				.parent_element()
				.map(|p| p.client_height() as f64)
				.unwrap_or(600.0)
		}),
	)
}

fn context_2d(canvas: &HtmlCanvasElement) -> Option<CanvasRenderingContext2d> {
	canvas
		.get_context("2d")
		.ok()
		.flatten()
		.and_then(|ctx| ctx.dyn_into().ok())
}

fn pointer_position(
	canvas_ref: NodeRef<leptos::html::Canvas>,
	ev: &MouseEvent,
) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

fn prefers_reduced_motion(window: &Window) -> bool {
	window
		.match_media("(prefers-reduced-motion: reduce)")
		.ok()
		.flatten()
		.is_some_and(|query| query.matches())
}

/// Canvas-backed mindmap. Owns one [`MindmapEngine`] per `data` value and
/// drives it from `requestAnimationFrame` until the canvas leaves the DOM.
#[component]
pub fn MindmapCanvas(
	#[prop(into)] data: Signal<DomainGraph>,
	#[prop(into)] show_concepts: Signal<bool>,
	#[prop(into)] concept_filter: Signal<Option<String>>,
	#[prop(into)] focus_target: Signal<Option<String>>,
	#[prop(optional)] on_chapter_select: Option<Callback<String>>,
	#[prop(optional)] on_concept_filter_toggle: Option<Callback<String>>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let slot = EngineSlot::default();
	let engine = slot.engine.clone();
	let press: Rc<RefCell<Option<Press>>> = Rc::new(RefCell::new(None));

	let slot_cleanup = StoredValue::new_local(slot.clone());
	on_cleanup(move || {
		slot_cleanup.try_with_value(EngineSlot::teardown);
	});

	let slot_init = slot.clone();
	Effect::new(move |_| {
		let graph = data.get();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};
		let Some(ctx) = context_2d(&canvas) else {
			warn!("canvas has no 2d context");
			return;
		};

		let (w, h) = surface_size(&window, &canvas, fullscreen, width, height);
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let mut next = MindmapEngine::new(graph, MindmapConfig::default(), w, h);
		next.set_reduced_motion(prefers_reduced_motion(&window));
		next.set_show_concepts(show_concepts.get_untracked());
		next.set_concept_filter(concept_filter.get_untracked().as_deref());
		next.start();
		if let Some(id) = focus_target.get_untracked() {
			next.focus(&id);
		}
		let current = slot_init.install(next);

		if slot_init.resize.borrow().is_none() {
			let (engine_resize, canvas_resize) = (slot_init.engine.clone(), canvas.clone());
			*slot_init.resize.borrow_mut() = Some(Closure::new(move || {
				let Some(win) = web_sys::window() else {
					return;
				};
				let (nw, nh) = surface_size(&win, &canvas_resize, fullscreen, width, height);
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				if let Some(ref mut e) = *engine_resize.borrow_mut() {
					e.resize(nw, nh);
				}
			}));
			if let Some(ref cb) = *slot_init.resize.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		// Each engine gets its own frame loop; a loop exits once a newer
		// engine replaces it or the slot is torn down. A detached canvas
		// tears the slot down itself in case cleanup never ran.
		let frame: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
		let (slot_anim, frame_inner) = (slot_init.clone(), frame.clone());
		*frame.borrow_mut() = Some(Closure::new(move || {
			if slot_anim.is_current(current) && !canvas.is_connected() {
				slot_anim.teardown();
			}
			if !slot_anim.is_current(current) {
				let _ = frame_inner.borrow_mut().take();
				return;
			}
			if let Some(ref mut e) = *slot_anim.engine.borrow_mut() {
				e.tick(FRAME_DT);
				render::render(e, &ctx);
			}
			if let (Some(cb), Some(win)) = (frame_inner.borrow().as_ref(), web_sys::window()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *frame.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let engine_view = engine.clone();
	Effect::new(move |_| {
		let (show, filter) = (show_concepts.get(), concept_filter.get());
		if let Some(ref mut e) = *engine_view.borrow_mut() {
			e.set_show_concepts(show);
			e.set_concept_filter(filter.as_deref());
		}
	});

	let engine_focus = engine.clone();
	Effect::new(move |_| {
		let Some(id) = focus_target.get() else {
			return;
		};
		if let Some(ref mut e) = *engine_focus.borrow_mut() {
			e.focus(&id);
		}
	});

	let (engine_md, press_md) = (engine.clone(), press.clone());
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = pointer_position(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref e) = *engine_md.borrow() {
			let (mx, my) = e.screen_to_model(x, y);
			*press_md.borrow_mut() = Some(Press {
				node: e.node_at(mx, my).map(|n| n.id.clone()),
				start_x: x,
				start_y: y,
				last_x: x,
				last_y: y,
				dragging: false,
			});
		}
	};

	let (engine_mm, press_mm) = (engine.clone(), press.clone());
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = pointer_position(canvas_ref, &ev) else {
			return;
		};
		let mut engine = engine_mm.borrow_mut();
		let Some(e) = engine.as_mut() else {
			return;
		};
		let (mx, my) = e.screen_to_model(x, y);
		let mut press = press_mm.borrow_mut();
		let Some(p) = press.as_mut() else {
			let hovered = e.node_at(mx, my).map(|n| n.id.clone());
			e.set_hovered(hovered.as_deref());
			return;
		};

		let moved = (x - p.start_x).hypot(y - p.start_y) > CLICK_SLOP;
		match p.node.clone() {
			Some(id) => {
				if !p.dragging && moved {
					p.dragging = e.drag_start(&id);
				}
				if p.dragging {
					e.drag_move(&id, mx, my);
				}
			}
			None => {
				e.pan_by(x - p.last_x, y - p.last_y);
				p.dragging = p.dragging || moved;
			}
		}
		(p.last_x, p.last_y) = (x, y);
	};

	let (engine_mu, press_mu) = (engine.clone(), press.clone());
	let on_mouseup = move |_: MouseEvent| {
		let Some(p) = press_mu.borrow_mut().take() else {
			return;
		};
		let outcome = {
			let mut engine = engine_mu.borrow_mut();
			let Some(e) = engine.as_mut() else {
				return;
			};
			match p.node {
				Some(id) if p.dragging => {
					e.drag_end(&id);
					ClickOutcome::Missed
				}
				Some(id) => e.click(&id),
				None => ClickOutcome::Missed,
			}
		};
		// The engine borrow is released before host callbacks run.
		match outcome {
			ClickOutcome::ChapterSelected(id) => {
				if let Some(cb) = on_chapter_select.as_ref() {
					cb.run(id);
				}
			}
			ClickOutcome::ConceptFilterToggled(id) => {
				if let Some(cb) = on_concept_filter_toggle.as_ref() {
					cb.run(id);
				}
			}
			ClickOutcome::BookToggled { .. } | ClickOutcome::Missed => {}
		}
	};

	let (engine_ml, press_ml) = (engine.clone(), press.clone());
	let on_mouseleave = move |_: MouseEvent| {
		*press_ml.borrow_mut() = None;
		if let Some(ref mut e) = *engine_ml.borrow_mut() {
			e.release_drags();
			e.set_hovered(None);
		}
	};

	let engine_wh = engine.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = pointer_position(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut e) = *engine_wh.borrow_mut() {
			let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
			e.zoom_at(x, y, factor);
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="mindmap-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			style="display: block; cursor: pointer;"
		/>
	}
}
