//! Image primitives shared by operators, the evaluator and capture.
//!
//! - [`Color`] - RGBA with `f32` channels and Rec.601 luma.
//! - [`PixelBuffer`] - row-major color grid with a total out-of-bounds policy.
//! - [`grid_index`] - the `floor((dim + 0.5) * c)` rule mapping normalized
//!   coordinates onto any integer grid.

mod buffer;
mod color;

pub use buffer::{cell_center, grid_index, PixelBuffer};
pub use color::Color;
