//! Rendering module
//!
//! - `iso`: depth-sorted display list, no GPU needed
//! - `shapes`: display list to triangle lists
//! - `pipeline`: WebGPU upload and present

pub mod iso;
pub mod pipeline;
pub mod shapes;
pub mod vertex;

pub use iso::{DrawCommand, DrawItem, Frame, IsoRenderer};
pub use pipeline::{RenderError, RenderState};
pub use vertex::{Vertex, colors};
