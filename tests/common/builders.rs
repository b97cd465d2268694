//! Test data builders for graphs and images

use pixelgraph::graph::{AnyOperator, Inputs, NodeId, NodeSystem, OperatorPlugin, SlotDescriptor};
use pixelgraph::image::{Color, PixelBuffer};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Builder for linear operator chains ending in Output
pub struct ChainBuilder<'a> {
    system: &'a NodeSystem,
    nodes: Vec<NodeId>,
}

impl<'a> ChainBuilder<'a> {
    pub fn new(system: &'a NodeSystem) -> Self {
        Self {
            system,
            nodes: Vec::new(),
        }
    }

    /// Append an operator, feeding the previous one into its slot 0
    pub fn then(mut self, op: impl Into<AnyOperator>) -> Self {
        let id = self.system.create(op);
        assert!(id.is_valid(), "chain operator rejected");
        if let Some(&prev) = self.nodes.last() {
            assert!(self.system.connect(prev, id, 0).is_valid());
        }
        self.nodes.push(id);
        self
    }

    /// Connect the last operator into Output and return the chain
    pub fn into_output(self) -> Vec<NodeId> {
        if let Some(&last) = self.nodes.last() {
            assert!(self.system.connect(last, self.system.output(), 0).is_valid());
        }
        self.nodes
    }
}

/// Image whose pixel `(x, y)` encodes its own position
pub fn coordinate_image(width: usize, height: usize) -> PixelBuffer {
    PixelBuffer::from_fn(width, height, |x, y| {
        Color::rgb(
            x as f32 / width as f32,
            y as f32 / height as f32,
            ((x + y) % 2) as f32,
        )
    })
}

pub fn checkerboard(width: usize, height: usize) -> PixelBuffer {
    PixelBuffer::from_fn(width, height, |x, y| {
        if (x + y) % 2 == 0 {
            Color::WHITE
        } else {
            Color::BLACK
        }
    })
}

static PASS_THROUGH_SLOTS: [SlotDescriptor; 1] = [SlotDescriptor::input("In")];

/// Plugin that passes slot 0 through and counts its invocations
#[derive(Clone, Default)]
pub struct CountingOp {
    calls: Arc<AtomicUsize>,
}

impl CountingOp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.calls.store(0, Ordering::SeqCst);
    }

    pub fn operator(&self) -> AnyOperator {
        AnyOperator::plugin(self.clone())
    }
}

impl OperatorPlugin for CountingOp {
    fn name(&self) -> &str {
        "Counting"
    }

    fn slots(&self) -> &[SlotDescriptor] {
        &PASS_THROUGH_SLOTS
    }

    fn sample(&self, inputs: &mut dyn Inputs, x: f64, y: f64) -> Color {
        self.calls.fetch_add(1, Ordering::SeqCst);
        inputs.sample(0, x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_image_corners() {
        let img = coordinate_image(4, 2);
        assert_eq!(img.get(0, 0), Color::rgb(0.0, 0.0, 0.0));
        assert_eq!(img.get(3, 1), Color::rgb(0.75, 0.5, 0.0));
    }
}
