//! Background colour classification of roster rows.

use crate::clan::sheets::model::Color;

/// "Light green 3" of the provider palette (`#d9ead3`), marking an active row.
pub const ACTIVE_COLOR: Color = Color::new(0.850_980_4, 0.917_647_06, 0.827_451);
/// "Light red 3" of the provider palette (`#f4cccc`), marking an absent row.
pub const ABSENT_COLOR: Color = Color::new(0.956_862_8, 0.8, 0.8);
/// Largest per-channel difference still considered the same colour.
pub const DEFAULT_TOLERANCE: f32 = 0.01;

/// Returns `true` when `candidate` lies within `tolerance` of `reference` on
/// each channel independently. Missing colours never match.
pub fn is_active(candidate: Option<Color>, reference: Option<Color>, tolerance: f32) -> bool {
    let (Some(candidate), Some(reference)) = (candidate, reference) else {
        return false;
    };
    (candidate.red - reference.red).abs() < tolerance
        && (candidate.green - reference.green).abs() < tolerance
        && (candidate.blue - reference.blue).abs() < tolerance
}
