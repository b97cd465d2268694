//! Plan execution.
//!
//! Two modes share one operator rule (`sample`) and one read rule: every
//! read an operator makes of a slot is snapped to the pass grid with
//! [`grid_index`] and resolved at that pixel's centre. Because of that the
//! modes agree pixel for pixel on acyclic graphs.
//!
//! - **Per-image**: each planned operator is rendered once into a
//!   `width x height` buffer, in step order. Consumers read producer buffers.
//! - **Per-pixel**: for every output pixel the slot caches are reset and the
//!   steps are walked, copying each producer's value into its consumer's slot
//!   cache. Reads that land on another pixel (windows, remaps) evaluate the
//!   producer chain there recursively, guarded by a visiting set. Every value
//!   computed at a cell is kept for the rest of the pass, so each operator
//!   runs at most once per pixel however many consumers reach that cell.

use super::operator::Inputs;
use super::plan::EvalPlan;
use crate::image::{cell_center, grid_index, Color, PixelBuffer};
use serde::{Deserialize, Serialize};

/// Execution granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvalMode {
    #[default]
    PerPixel,
    PerImage,
}

/// Target grid of a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Grid {
    width: usize,
    height: usize,
}

impl Grid {
    #[inline]
    fn locate(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        Some((grid_index(self.width, x)?, grid_index(self.height, y)?))
    }

    #[inline]
    fn center(&self, (i, j): (usize, usize)) -> (f64, f64) {
        (cell_center(i, self.width), cell_center(j, self.height))
    }

    #[inline]
    fn step(&self) -> (f64, f64) {
        (1.0 / self.width as f64, 1.0 / self.height as f64)
    }
}

/// Executes an [`EvalPlan`] against a camera frame.
pub struct Evaluator<'a> {
    plan: &'a EvalPlan,
    camera: &'a PixelBuffer,
    invocations: u64,
}

impl<'a> Evaluator<'a> {
    pub fn new(plan: &'a EvalPlan, camera: &'a PixelBuffer) -> Self {
        Self {
            plan,
            camera,
            invocations: 0,
        }
    }

    /// Operator `sample` calls made so far (per-pixel mode) or operators
    /// rendered (per-image mode).
    pub fn invocations(&self) -> u64 {
        self.invocations
    }

    /// Produce the image feeding Output at `width x height`.
    pub fn run(&mut self, mode: EvalMode, width: usize, height: usize) -> PixelBuffer {
        if self.plan.is_empty() {
            return PixelBuffer::new(width, height);
        }
        let grid = Grid { width, height };
        match mode {
            EvalMode::PerImage => self.run_per_image(grid),
            EvalMode::PerPixel => self.run_per_pixel(grid),
        }
    }

    fn run_per_image(&mut self, grid: Grid) -> PixelBuffer {
        let plan = self.plan;
        let mut buffers: Vec<Option<PixelBuffer>> = vec![None; plan.nodes.len()];

        for step in &plan.steps {
            if buffers[step.source].is_none() {
                let image = self.render(step.source, grid, &buffers);
                buffers[step.source] = Some(image);
            }
        }
        match buffers[plan.output].take() {
            Some(image) => image,
            None => self.render(plan.output, grid, &buffers),
        }
    }

    fn render(&mut self, node: usize, grid: Grid, buffers: &[Option<PixelBuffer>]) -> PixelBuffer {
        self.invocations += 1;
        let planned = &self.plan.nodes[node];
        let mut inputs = ImageInputs {
            sources: &planned.sources,
            buffers,
            grid,
            camera: self.camera,
        };
        PixelBuffer::from_fn(grid.width, grid.height, |i, j| {
            let (x, y) = grid.center((i, j));
            planned.operator.sample(&mut inputs, x, y)
        })
    }

    fn run_per_pixel(&mut self, grid: Grid) -> PixelBuffer {
        let plan = self.plan;
        let n = plan.nodes.len();
        let mut pass = PixelPass {
            plan,
            camera: self.camera,
            grid,
            current: (0, 0),
            cells: vec![Vec::new(); n],
            slot_values: plan
                .nodes
                .iter()
                .map(|node| vec![None; node.sources.len()])
                .collect(),
            visiting: vec![false; n],
            invocations: 0,
        };
        let image = PixelBuffer::from_fn(grid.width, grid.height, |i, j| pass.resolve((i, j)));
        self.invocations += pass.invocations;
        image
    }
}

/// Per-image view: slots read the producer's rendered buffer.
struct ImageInputs<'b> {
    sources: &'b [Option<usize>],
    buffers: &'b [Option<PixelBuffer>],
    grid: Grid,
    camera: &'b PixelBuffer,
}

impl Inputs for ImageInputs<'_> {
    fn sample(&mut self, slot: usize, x: f64, y: f64) -> Color {
        let Some(&Some(source)) = self.sources.get(slot) else {
            return Color::DEFAULT;
        };
        let Some((i, j)) = self.grid.locate(x, y) else {
            return Color::DEFAULT;
        };
        match &self.buffers[source] {
            Some(buffer) => buffer.get(i as i64, j as i64),
            None => Color::DEFAULT,
        }
    }

    fn is_connected(&self, slot: usize) -> bool {
        matches!(self.sources.get(slot), Some(Some(_)))
    }

    fn pixel_step(&self) -> (f64, f64) {
        self.grid.step()
    }

    fn camera_frame(&self) -> &PixelBuffer {
        self.camera
    }
}

/// Per-pixel pass state. `slot_values` is reset for each output pixel;
/// `cells` lives for the whole pass and `visiting` is balanced by `value_at`.
struct PixelPass<'a> {
    plan: &'a EvalPlan,
    camera: &'a PixelBuffer,
    grid: Grid,
    current: (usize, usize),
    /// Per plan node, row-major values already computed this pass.
    /// Allocated on first use.
    cells: Vec<Vec<Option<Color>>>,
    slot_values: Vec<Vec<Option<Color>>>,
    visiting: Vec<bool>,
    invocations: u64,
}

impl PixelPass<'_> {
    fn resolve(&mut self, pixel: (usize, usize)) -> Color {
        self.current = pixel;
        for slots in &mut self.slot_values {
            slots.fill(None);
        }

        let plan = self.plan;
        for step in &plan.steps {
            let value = self.value_at(step.source, pixel);
            self.slot_values[step.dest][step.slot] = Some(value);
        }
        self.value_at(plan.output, pixel)
    }

    /// Value of plan node `node` at grid cell `at`, computed at most once per
    /// pass. Re-entering a node that is already on the evaluation stack
    /// yields the default color, which is not cached.
    fn value_at(&mut self, node: usize, at: (usize, usize)) -> Color {
        let index = at.1 * self.grid.width + at.0;
        if let Some(Some(color)) = self.cells[node].get(index) {
            return *color;
        }
        if self.visiting[node] {
            return Color::DEFAULT;
        }
        let color = self.compute(node, at);

        let cells = &mut self.cells[node];
        if cells.is_empty() {
            cells.resize(self.grid.width * self.grid.height, None);
        }
        cells[index] = Some(color);
        color
    }

    fn compute(&mut self, node: usize, at: (usize, usize)) -> Color {
        self.visiting[node] = true;
        self.invocations += 1;

        let plan = self.plan;
        let (x, y) = self.grid.center(at);
        let color = plan.nodes[node]
            .operator
            .sample(&mut PixelInputs { pass: self, node }, x, y);

        self.visiting[node] = false;
        color
    }
}

/// Per-pixel view for one operator.
struct PixelInputs<'p, 'a> {
    pass: &'p mut PixelPass<'a>,
    node: usize,
}

impl Inputs for PixelInputs<'_, '_> {
    fn sample(&mut self, slot: usize, x: f64, y: f64) -> Color {
        let plan = self.pass.plan;
        let Some(&Some(source)) = plan.nodes[self.node].sources.get(slot) else {
            return Color::DEFAULT;
        };
        let Some(cell) = self.pass.grid.locate(x, y) else {
            return Color::DEFAULT;
        };
        if cell == self.pass.current {
            // Filled by the step walk; still empty only when the producer sits
            // on a cycle and has not been solved yet.
            return self.pass.slot_values[self.node][slot].unwrap_or(Color::DEFAULT);
        }
        self.pass.value_at(source, cell)
    }

    fn is_connected(&self, slot: usize) -> bool {
        matches!(
            self.pass.plan.nodes[self.node].sources.get(slot),
            Some(Some(_))
        )
    }

    fn pixel_step(&self) -> (f64, f64) {
        self.pass.grid.step()
    }

    fn camera_frame(&self) -> &PixelBuffer {
        self.pass.camera
    }
}
