//! # pixelgraph: node-graph image engine
//!
//! Image operators (color sources, filters, blends, geometric remaps and a
//! live camera feed) are composed into a directed graph. Evaluating the
//! graph produces the image feeding its single Output operator.
//!
//! ## Architecture
//!
//! - **Graph**: fixed-capacity operator and connection tables behind one lock,
//!   with generation-tagged handles
//! - **Evaluation**: a depth-first plan from Output, executed per pixel or per
//!   image with each operator computed at most once per pass
//! - **Capture**: a background thread polls a camera and hands frames over
//!   through a single-slot mailbox
//!
//! ## Configuration
//!
//! Engine settings are read from `engine.toml` in the platform config
//! directory under `pixelgraph` (see [`config`]).
//!
//! ## Example
//!
//! ```
//! use pixelgraph::graph::{operators::{ImageSourceOp, MirrorOp}, NodeSystem};
//! use pixelgraph::image::{Color, PixelBuffer};
//!
//! let system = NodeSystem::default();
//! let bitmap = PixelBuffer::from_pixels(2, 1, vec![Color::WHITE, Color::BLACK]).unwrap();
//! let source = system.create(ImageSourceOp::from_buffer(bitmap));
//! let mirror = system.create(MirrorOp::default());
//! system.connect(source, mirror, 0);
//! system.connect(mirror, system.output(), 0);
//!
//! let image = system.process(4, 1);
//! assert_eq!(
//!     image.pixels(),
//!     &[Color::WHITE, Color::BLACK, Color::BLACK, Color::WHITE]
//! );
//! ```

pub mod capture;
pub mod config;
pub mod error;
pub mod graph;
pub mod image;

// Re-export commonly used types
pub use config::EngineConfig;
pub use error::{PixelGraphError, Result, ResultExt};
pub use graph::{ConnectionId, EvalMode, GraphDocument, NodeId, NodeSystem, OperatorKind};
pub use image::{Color, PixelBuffer};
