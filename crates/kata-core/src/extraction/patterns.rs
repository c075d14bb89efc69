//! Patterns for recognizing code-fence wrapping in model output.

use lazy_static::lazy_static;
use regex::Regex;

/// Closing fence marker.
pub const FENCE: &str = "```";

lazy_static! {
    // Opening fence with an optional language tag: ```json, ```JSON, ```
    pub static ref LEADING_FENCE: Regex = Regex::new(
        r"^```[A-Za-z0-9_+\-]*"
    ).unwrap();
}
