//! Pan/zoom transform and the settle-synchronized focus move.

use log::{debug, warn};

use super::config::MindmapConfig;
use super::model::ViewState;
use super::simulation::ForceSimulation;

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

pub(super) fn ease_in_out_cubic(t: f64) -> f64 {
	if t < 0.5 {
		4.0 * t * t * t
	} else {
		1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
	}
}

/// Screen = model * k + (x, y).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	/// Horizontal translation in screen pixels.
	pub x: f64,
	/// Vertical translation in screen pixels.
	pub y: f64,
	/// Uniform scale.
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			k: 1.0,
		}
	}
}

impl ViewTransform {
	fn lerp(&self, to: &ViewTransform, t: f64) -> ViewTransform {
		ViewTransform {
			x: self.x + (to.x - self.x) * t,
			y: self.y + (to.y - self.y) * t,
			k: self.k + (to.k - self.k) * t,
		}
	}
}

#[derive(Clone, Debug)]
struct CameraMove {
	from: ViewTransform,
	to: ViewTransform,
	elapsed: f64,
	duration: f64,
}

/// Camera over the model: clamped pan/zoom plus the focus move.
#[derive(Clone, Debug)]
pub struct ViewportController {
	transform: ViewTransform,
	width: f64,
	height: f64,
	min_scale: f64,
	max_scale: f64,
	focus_duration: f64,
	reduced_motion: bool,
	camera_move: Option<CameraMove>,
}

impl ViewportController {
	/// Identity transform over a `width` x `height` surface.
	pub fn new(config: &MindmapConfig, width: f64, height: f64, reduced_motion: bool) -> Self {
		Self {
			transform: ViewTransform::default(),
			width,
			height,
			min_scale: config.min_scale,
			max_scale: config.max_scale,
			focus_duration: config.focus_duration,
			reduced_motion,
			camera_move: None,
		}
	}

	/// Current transform, mid-animation included.
	pub fn transform(&self) -> ViewTransform {
		self.transform
	}

	/// Surface size in screen pixels.
	pub fn size(&self) -> (f64, f64) {
		(self.width, self.height)
	}

	/// False while the host surface is missing or collapsed.
	pub fn has_surface(&self) -> bool {
		self.width > 0.0 && self.height > 0.0
	}

	/// Records a new surface size. The transform is kept.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}

	/// When set, focus moves and entrance fades complete instantly.
	pub fn set_reduced_motion(&mut self, reduced: bool) {
		self.reduced_motion = reduced;
	}

	/// Whether reduced motion is in effect.
	pub fn reduced_motion(&self) -> bool {
		self.reduced_motion
	}

	/// Whether a focus move is in flight.
	pub fn is_animating(&self) -> bool {
		self.camera_move.is_some()
	}

	/// Inverse of [`Self::model_to_screen`].
	pub fn screen_to_model(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	/// Applies the current transform to a model-space point.
	pub fn model_to_screen(&self, x: f64, y: f64) -> (f64, f64) {
		(
			x * self.transform.k + self.transform.x,
			y * self.transform.k + self.transform.y,
		)
	}

	/// Applies a transform with the scale clamped. Cancels any camera move.
	pub fn set_transform(&mut self, transform: ViewTransform) {
		self.camera_move = None;
		self.transform = ViewTransform {
			k: transform.k.clamp(self.min_scale, self.max_scale),
			..transform
		};
	}

	/// Translates by a screen-space delta.
	pub fn pan_by(&mut self, dx: f64, dy: f64) {
		let t = self.transform;
		self.set_transform(ViewTransform {
			x: t.x + dx,
			y: t.y + dy,
			..t
		});
	}

	/// Zooms by `factor` keeping the screen point under the cursor fixed.
	pub fn zoom_at(&mut self, sx: f64, sy: f64, factor: f64) {
		let t = self.transform;
		let k = (t.k * factor).clamp(self.min_scale, self.max_scale);
		let ratio = k / t.k;
		self.set_transform(ViewTransform {
			x: sx - (sx - t.x) * ratio,
			y: sy - (sy - t.y) * ratio,
			k,
		});
	}

	/// Queues a one-shot focus, served by the next [`Self::on_settled`].
	pub fn request_focus(&self, view: &mut ViewState, id: &str) {
		view.focus_target_id = Some(id.to_string());
	}

	/// Centers the pending focus target at scale 1. Returns whether a move started.
	pub fn on_settled(&mut self, view: &mut ViewState, sim: &ForceSimulation) -> bool {
		let Some(id) = view.focus_target_id.take() else {
			return false;
		};
		let Some(node) = sim.node(&id) else {
			warn!("focus target {id} is not in the layout");
			return false;
		};
		if !self.has_surface() {
			debug!("focus on {id} dropped: no surface");
			return false;
		}
		let to = ViewTransform {
			x: self.width / 2.0 - node.x,
			y: self.height / 2.0 - node.y,
			k: 1.0,
		};
		debug!("focusing {id}");
		if self.reduced_motion || self.focus_duration <= 0.0 {
			self.set_transform(to);
		} else {
			self.camera_move = Some(CameraMove {
				from: self.transform,
				to,
				elapsed: 0.0,
				duration: self.focus_duration,
			});
		}
		true
	}

	/// Steps the camera move by `dt` seconds. Returns whether the transform changed.
	pub fn advance(&mut self, dt: f64) -> bool {
		let Some(camera) = self.camera_move.as_mut() else {
			return false;
		};
		camera.elapsed += dt;
		let t = (camera.elapsed / camera.duration).min(1.0);
		self.transform = camera.from.lerp(&camera.to, ease_out_cubic(t));
		if t >= 1.0 {
			self.transform = camera.to;
			self.camera_move = None;
		}
		true
	}
}
