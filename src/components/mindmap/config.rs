use serde::Deserialize;

use super::error::MindmapError;

/// Tunables for layout, interaction and camera.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct MindmapConfig {
	/// Rest length of every link spring.
	#[serde(default = "default_link_distance")]
	pub link_distance: f64,
	/// Pairwise charge; negative repels.
	#[serde(default = "default_charge_strength")]
	pub charge_strength: f64,
	/// Fraction of the centroid offset removed per tick.
	#[serde(default = "default_center_strength")]
	pub center_strength: f64,
	/// Added to each node radius for collision.
	#[serde(default = "default_collision_padding")]
	pub collision_padding: f64,
	/// Separation passes per tick.
	#[serde(default = "default_collision_iterations")]
	pub collision_iterations: usize,
	/// Fraction of velocity lost per tick.
	#[serde(default = "default_velocity_decay")]
	pub velocity_decay: f64,
	/// Alpha below which the layout counts as settled.
	#[serde(default = "default_alpha_min")]
	pub alpha_min: f64,
	/// Per-tick fraction of the gap to the alpha target closed.
	#[serde(default = "default_alpha_decay")]
	pub alpha_decay: f64,
	/// Alpha target held while any node is dragged.
	#[serde(default = "default_drag_alpha_target")]
	pub drag_alpha_target: f64,
	/// Alpha for the restart that precedes a focus move.
	#[serde(default = "default_focus_alpha")]
	pub focus_alpha: f64,
	/// Minimum alpha after a re-derivation.
	#[serde(default = "default_reheat_alpha")]
	pub reheat_alpha: f64,
	/// Minimum alpha after a re-derivation that changed the population materially.
	#[serde(default = "default_material_reheat_alpha")]
	pub material_reheat_alpha: f64,
	/// Share of the previous population that must be added or removed to count as material.
	#[serde(default = "default_material_change_ratio")]
	pub material_change_ratio: f64,
	/// Chroma kept when deriving chapter colors from book colors.
	#[serde(default = "default_desaturation")]
	pub desaturation: f64,
	/// Smallest zoom factor.
	#[serde(default = "default_min_scale")]
	pub min_scale: f64,
	/// Largest zoom factor.
	#[serde(default = "default_max_scale")]
	pub max_scale: f64,
	/// Seconds for the animated focus move.
	#[serde(default = "default_focus_duration")]
	pub focus_duration: f64,
	/// Spacing of the phyllotaxis used to seed new nodes.
	#[serde(default = "default_initial_radius")]
	pub initial_radius: f64,
	/// Seconds each node takes to fade in after mount.
	#[serde(default = "default_entrance_duration")]
	pub entrance_duration: f64,
	/// Seconds between the fade-in starts of consecutive nodes.
	#[serde(default = "default_entrance_stagger")]
	pub entrance_stagger: f64,
}

fn default_link_distance() -> f64 {
	80.0
}

fn default_charge_strength() -> f64 {
	-200.0
}

fn default_center_strength() -> f64 {
	0.1
}

fn default_collision_padding() -> f64 {
	8.0
}

fn default_collision_iterations() -> usize {
	2
}

fn default_velocity_decay() -> f64 {
	0.4
}

fn default_alpha_min() -> f64 {
	0.001
}

fn default_alpha_decay() -> f64 {
	1.0 - 0.001_f64.powf(1.0 / 300.0)
}

fn default_drag_alpha_target() -> f64 {
	0.3
}

fn default_focus_alpha() -> f64 {
	0.5
}

fn default_reheat_alpha() -> f64 {
	0.1
}

fn default_material_reheat_alpha() -> f64 {
	0.3
}

fn default_material_change_ratio() -> f64 {
	0.25
}

fn default_desaturation() -> f64 {
	0.4
}

fn default_min_scale() -> f64 {
	0.2
}

fn default_max_scale() -> f64 {
	4.0
}

fn default_focus_duration() -> f64 {
	0.3
}

fn default_initial_radius() -> f64 {
	10.0
}

fn default_entrance_duration() -> f64 {
	0.3
}

fn default_entrance_stagger() -> f64 {
	0.05
}

impl Default for MindmapConfig {
	fn default() -> Self {
		Self {
			link_distance: default_link_distance(),
			charge_strength: default_charge_strength(),
			center_strength: default_center_strength(),
			collision_padding: default_collision_padding(),
			collision_iterations: default_collision_iterations(),
			velocity_decay: default_velocity_decay(),
			alpha_min: default_alpha_min(),
			alpha_decay: default_alpha_decay(),
			drag_alpha_target: default_drag_alpha_target(),
			focus_alpha: default_focus_alpha(),
			reheat_alpha: default_reheat_alpha(),
			material_reheat_alpha: default_material_reheat_alpha(),
			material_change_ratio: default_material_change_ratio(),
			desaturation: default_desaturation(),
			min_scale: default_min_scale(),
			max_scale: default_max_scale(),
			focus_duration: default_focus_duration(),
			initial_radius: default_initial_radius(),
			entrance_duration: default_entrance_duration(),
			entrance_stagger: default_entrance_stagger(),
		}
	}
}

impl MindmapConfig {
	/// Parses a partial JSON override; missing fields keep their defaults.
	pub fn from_json(json: &str) -> Result<Self, MindmapError> {
		Ok(serde_json::from_str(json)?)
	}

	/// Like [`MindmapConfig::from_json`] but logs and falls back to defaults.
	pub fn from_json_or_default(json: &str) -> Self {
		match Self::from_json(json) {
			Ok(config) => config,
			Err(e) => {
				log::warn!("ignoring mindmap config: {e}");
				Self::default()
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn partial_override_keeps_defaults() {
		let config = MindmapConfig::from_json(r#"{ "link_distance": 120.0 }"#).unwrap();
		assert_eq!(config.link_distance, 120.0);
		assert_eq!(config.charge_strength, -200.0);
		assert_eq!(config.collision_padding, 8.0);
		assert_eq!(config.entrance_duration, 0.3);
		assert_eq!(config.entrance_stagger, 0.05);
	}

	#[test]
	fn defaults_match_an_empty_override() {
		assert_eq!(
			MindmapConfig::from_json("{}").unwrap(),
			MindmapConfig::default()
		);
	}

	#[test]
	fn bad_override_falls_back() {
		assert_eq!(
			MindmapConfig::from_json_or_default("[1, 2"),
			MindmapConfig::default()
		);
	}

	#[test]
	fn default_decay_cools_in_about_300_ticks() {
		let config = MindmapConfig::default();
		let mut alpha = 1.0;
		let mut ticks = 0;
		while alpha >= config.alpha_min {
			alpha += (0.0 - alpha) * config.alpha_decay;
			ticks += 1;
		}
		assert!((299..=301).contains(&ticks), "{ticks} ticks");
	}
}
