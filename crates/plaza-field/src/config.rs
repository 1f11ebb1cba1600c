//! Field configuration.

/// Configuration for the shared 2D field.
///
/// The defaults reproduce the classic setup: a 600×400 canvas and a
/// 10-unit movement step.
#[derive(Debug, Clone)]
pub struct FieldConfig {
    /// Field width in units.
    pub width: u32,

    /// Field height in units.
    pub height: u32,

    /// Displacement applied per recognized movement key.
    pub step: i32,

    /// Whether to clamp positions to `[0, width] × [0, height]` after a
    /// move. Off by default: the historical behavior lets an avatar walk
    /// past the visible edge, and whether that is a feature or a bug is
    /// a deployment decision, so it is a policy knob rather than a
    /// hard-coded answer.
    pub clamp: bool,
}

impl FieldConfig {
    /// The spawn margin for one axis: a strip of `extent / 30` units on
    /// each end where new avatars never appear.
    pub fn spawn_margin(extent: u32) -> u32 {
        extent / 30
    }
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            width: 600,
            height: 400,
            step: 10,
            clamp: false,
        }
    }
}
