use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::engine::MindmapEngine;
use super::types::{LinkKind, Node, NodeKind};

const BACKGROUND: &str = "#0d1117";
const DIMMED_LINK: f64 = 0.15;
const DIMMED_NODE: f64 = 0.25;

pub fn render(engine: &MindmapEngine, ctx: &CanvasRenderingContext2d) {
	let (width, height) = engine.viewport().size();
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, width, height);
	let transform = engine.transform();
	ctx.save();
	let _ = ctx.translate(transform.x, transform.y);
	let _ = ctx.scale(transform.k, transform.k);
	draw_links(engine, ctx);
	draw_nodes(engine, ctx, transform.k);
	ctx.restore();
}

fn draw_links(engine: &MindmapEngine, ctx: &CanvasRenderingContext2d) {
	for segment in engine.link_segments() {
		let (stroke, width) = match segment.kind {
			LinkKind::Containment => ("rgba(255, 255, 255, 0.06)", 1.0),
			LinkKind::ConceptAssociation => ("rgba(230, 168, 23, 0.4)", 1.5),
		};
		ctx.set_global_alpha(if segment.highlighted { 1.0 } else { DIMMED_LINK });
		ctx.set_stroke_style_str(stroke);
		ctx.set_line_width(width);
		ctx.begin_path();
		ctx.move_to(segment.from.0, segment.from.1);
		ctx.line_to(segment.to.0, segment.to.1);
		ctx.stroke();
	}
	ctx.set_global_alpha(1.0);
}

fn draw_nodes(engine: &MindmapEngine, ctx: &CanvasRenderingContext2d, k: f64) {
	let hovered = engine.hovered();
	let mut raised = None;
	for (index, node) in engine.nodes().iter().enumerate() {
		let opacity = engine.entrance_opacity(index);
		if hovered.is_some_and(|h| h.id == node.id) {
			raised = Some((node, opacity));
			continue;
		}
		draw_node(node, ctx, k, opacity);
	}

	// Hovered node is raised above its neighbours and shows its tooltip.
	let Some((node, opacity)) = raised else {
		return;
	};
	draw_node(node, ctx, k, opacity);
	ctx.set_global_alpha(opacity);
	ctx.begin_path();
	let _ = ctx.arc(node.x, node.y, node.radius + 3.0 / k, 0.0, 2.0 * PI);
	ctx.set_stroke_style_str("rgba(255, 255, 255, 0.7)");
	ctx.set_line_width(1.5 / k);
	ctx.stroke();

	ctx.set_fill_style_str("white");
	ctx.set_font(&format!("{}px sans-serif", 12.0 / k.max(0.5)));
	let _ = ctx.fill_text(&node.tooltip, node.x + node.radius + 6.0, node.y - node.radius);
	ctx.set_global_alpha(1.0);
}

fn draw_node(node: &Node, ctx: &CanvasRenderingContext2d, k: f64, opacity: f64) {
	let (x, y, radius) = (node.x, node.y, node.radius);
	let alpha = if node.highlighted { 1.0 } else { DIMMED_NODE };
	ctx.set_global_alpha(alpha * opacity);

	if node.kind == NodeKind::Book {
		if let Ok(gradient) = ctx.create_radial_gradient(x, y, radius * 0.6, x, y, radius * 1.6) {
			let _ = gradient.add_color_stop(0.0, &node.color.to_css_alpha(0.45));
			let _ = gradient.add_color_stop(1.0, &node.color.to_css_alpha(0.0));
			ctx.begin_path();
			let _ = ctx.arc(x, y, radius * 1.6, 0.0, 2.0 * PI);
			#[allow(deprecated)]
			ctx.set_fill_style(&gradient);
			ctx.fill();
		}
	}

	ctx.begin_path();
	let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
	ctx.set_fill_style_str(&node.color.to_string());
	ctx.fill();
	if node.kind == NodeKind::Book {
		ctx.set_stroke_style_str(&node.color.to_string());
		ctx.set_line_width(2.0);
		ctx.stroke();
	}

	let font_size = match node.kind {
		NodeKind::Book => 13.0,
		NodeKind::Chapter { .. } => 10.0,
		NodeKind::Concept { .. } => 0.0,
	};
	if font_size > 0.0 {
		ctx.set_fill_style_str("rgba(255, 255, 255, 0.85)");
		ctx.set_font(&format!("{}px sans-serif", font_size / k.max(0.5)));
		let _ = ctx.fill_text(&node.label, x + radius + 3.0, y + 3.0);
	}
	ctx.set_global_alpha(1.0);
}
