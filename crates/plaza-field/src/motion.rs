//! Movement arithmetic: spawn positions and key-code displacement.
//!
//! Pure functions, kept separate from the actor so the exact numbers
//! can be pinned down in unit tests without spinning up tasks.

use rand::Rng;

use plaza_protocol::Position;

use crate::FieldConfig;

/// Key code for `W` (up).
pub const KEY_W: u32 = 87;
/// Key code for `A` (left).
pub const KEY_A: u32 = 65;
/// Key code for `S` (down).
pub const KEY_S: u32 = 83;
/// Key code for `D` (right).
pub const KEY_D: u32 = 68;

/// Draws a spawn position, independently and uniformly per axis, inside
/// the inner region of the field: each axis excludes a margin of
/// `extent / 30` on both ends.
pub fn spawn_position(
    config: &FieldConfig,
    rng: &mut impl Rng,
) -> Position {
    Position {
        x: spawn_axis(config.width, rng),
        y: spawn_axis(config.height, rng),
    }
}

fn spawn_axis(extent: u32, rng: &mut impl Rng) -> i32 {
    let min = FieldConfig::spawn_margin(extent);
    let span = extent - 2 * min;
    (min + rng.random_range(0..=span)) as i32
}

/// Computes the position after applying a movement key.
///
/// W/A/S/D move one `config.step` up/left/down/right; any other key code
/// yields no displacement. The result is purely additive on `pos` unless
/// `config.clamp` is set, in which case it is clamped to
/// `[0, width] × [0, height]`.
pub fn apply_move(
    pos: Position,
    key: u32,
    config: &FieldConfig,
) -> Position {
    let step = config.step;
    let (dx, dy) = match key {
        KEY_W => (0, -step),
        KEY_A => (-step, 0),
        KEY_S => (0, step),
        KEY_D => (step, 0),
        _ => (0, 0),
    };

    let mut next = Position {
        x: pos.x + dx,
        y: pos.y + dy,
    };

    if config.clamp {
        next.x = next.x.clamp(0, config.width as i32);
        next.y = next.y.clamp(0, config.height as i32);
    }

    next
}
