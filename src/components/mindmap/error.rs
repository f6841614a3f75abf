/// Failures from the fallible helpers around the engine.
///
/// The engine itself never surfaces these; callers recover with a fallback.
#[derive(Debug, thiserror::Error)]
pub enum MindmapError {
	/// A color string that is not `#rgb` or `#rrggbb`.
	#[error("invalid color `{0}`")]
	InvalidColor(String),
	/// Graph data or config overrides that failed to parse.
	#[error("invalid json: {0}")]
	Json(#[from] serde_json::Error),
}
