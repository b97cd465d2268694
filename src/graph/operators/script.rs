//! Script operator: a user-supplied Rhai file computes each pixel.
//!
//! ## Script Interface
//!
//! The script defines `fn process(x, y)` and may end with a map naming the
//! operator and its inputs:
//!
//! ```rhai
//! fn process(x, y) {
//!     let c = param(0);
//!     [c.g, c.r, c.b]
//! }
//!
//! #{ name: "Swap", inputs: ["Image"] }
//! ```
//!
//! Inside `process`:
//! - `param(i)` - value of input slot `i` at this pixel (a `Color` with
//!   `.r`, `.g`, `.b`, `.a`)
//! - `luma(color)` - Rec.601 luma
//! - `unorm(v, max)` - `int((max + 0.5) * v)`, the grid index of `v`
//!
//! `process` returns a number (gray), an array of 1 to 4 channels (missing
//! color channels are 0, missing alpha is 1) or a `Color`. Anything else, a
//! runtime error, or a script that failed to load yields `Color::DEFAULT`.

use crate::error::{PixelGraphError, Result, ResultExt};
use crate::graph::operator::Inputs;
use crate::graph::slot::{SlotDescriptor, NO_SLOTS};
use crate::image::Color;
use rhai::{CallFnOptions, Dynamic, Engine, Map, Scope, AST};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

const DEFAULT_SCRIPT_NAME: &str = "Script";
const PROCESS_FN: &str = "process";

/// Slot values of the pixel being processed, read by `param(i)`.
type SharedParams = Arc<RwLock<Vec<Color>>>;

/// Runs a Rhai script per pixel.
///
/// Only `path` is persisted; the script is recompiled from it when a
/// document is restored. Without a loaded script the operator has no slots
/// and outputs the default color.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ScriptOp {
    pub path: Option<PathBuf>,
    #[serde(skip)]
    script: Option<Arc<CompiledScript>>,
}

impl ScriptOp {
    /// Compile the script at `path` and remember it for persistence.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut op = Self::default();
        op.load(path)?;
        Ok(op)
    }

    /// Compile an in-memory script. It has no path and does not survive a save.
    pub fn from_source(source: &str) -> Result<Self> {
        Ok(Self {
            path: None,
            script: Some(Arc::new(CompiledScript::compile(source)?)),
        })
    }

    /// Point the operator at `path` and compile it. On failure the path is
    /// kept and the operator falls back to the default color.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.path = Some(path.as_ref().to_path_buf());
        self.reload()
    }

    /// Recompile from `path`. No-op without a path.
    pub fn reload(&mut self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        self.script = None;
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read script {}", path.display()))?;
        let script = CompiledScript::compile(&source)
            .with_context(|| format!("Failed to compile script {}", path.display()))?;
        self.script = Some(Arc::new(script));
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.script.is_some()
    }

    /// Name declared by the script, or "Script".
    pub fn name(&self) -> &str {
        self.script
            .as_ref()
            .map_or(DEFAULT_SCRIPT_NAME, |s| s.name.as_str())
    }

    pub fn slots(&self) -> &[SlotDescriptor] {
        match &self.script {
            Some(script) => &script.slots,
            None => NO_SLOTS,
        }
    }

    pub fn sample(&self, inputs: &mut dyn Inputs, x: f64, y: f64) -> Color {
        let Some(script) = &self.script else {
            return Color::DEFAULT;
        };
        let params: Vec<Color> = (0..script.slots.len())
            .map(|slot| inputs.sample(slot, x, y))
            .collect();
        script.process(params, x, y)
    }
}

impl fmt::Debug for ScriptOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptOp")
            .field("path", &self.path)
            .field("name", &self.name())
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

/// A compiled script with the engine that runs it.
struct CompiledScript {
    name: String,
    slots: Vec<SlotDescriptor>,
    engine: Engine,
    ast: AST,
    has_process: bool,
    params: SharedParams,
    /// Serializes calls so `param` reads the values written for that call.
    call_lock: Mutex<()>,
}

impl CompiledScript {
    fn compile(source: &str) -> Result<Self> {
        let params: SharedParams = Arc::new(RwLock::new(Vec::new()));
        let mut engine = Engine::new();
        configure_engine(&mut engine, params.clone());

        let ast = engine
            .compile(source)
            .map_err(|e| PixelGraphError::Script(format!("Compile error: {}", e)))?;
        let header = engine
            .eval_ast_with_scope::<Dynamic>(&mut Scope::new(), &ast)
            .map_err(|e| PixelGraphError::Script(format!("Execution error: {}", e)))?;

        let (name, slots) = match header.try_cast::<Map>() {
            Some(map) => read_header(&map),
            None => (DEFAULT_SCRIPT_NAME.to_string(), Vec::new()),
        };
        let has_process = ast
            .iter_functions()
            .any(|f| f.name == PROCESS_FN && f.params.len() == 2);
        if !has_process {
            tracing::warn!(script = %name, "Script defines no process(x, y)");
        }

        tracing::debug!(script = %name, inputs = slots.len(), "Script compiled");
        Ok(Self {
            name,
            slots,
            engine,
            ast,
            has_process,
            params,
            call_lock: Mutex::new(()),
        })
    }

    fn process(&self, params: Vec<Color>, x: f64, y: f64) -> Color {
        if !self.has_process {
            return Color::DEFAULT;
        }
        let _guard = self.call_lock.lock().unwrap_or_else(PoisonError::into_inner);
        *self.params.write().unwrap_or_else(PoisonError::into_inner) = params;

        let options = CallFnOptions::new().eval_ast(false).rewind_scope(true);
        match self.engine.call_fn_with_options::<Dynamic>(
            options,
            &mut Scope::new(),
            &self.ast,
            PROCESS_FN,
            (x, y),
        ) {
            Ok(value) => to_color(value),
            Err(e) => {
                tracing::trace!(script = %self.name, "Script execution error: {}", e);
                Color::DEFAULT
            }
        }
    }
}

/// Register the pixel API and the safety limits.
fn configure_engine(engine: &mut Engine, params: SharedParams) {
    engine.set_max_expr_depths(64, 64);
    engine.set_max_call_levels(32);
    engine.set_max_operations(100_000);
    engine.set_max_string_size(10_000);
    engine.set_max_array_size(1_000);
    engine.set_max_map_size(1_000);

    engine.register_type_with_name::<Color>("Color");
    engine.register_get("r", |c: &mut Color| c.r as f64);
    engine.register_get("g", |c: &mut Color| c.g as f64);
    engine.register_get("b", |c: &mut Color| c.b as f64);
    engine.register_get("a", |c: &mut Color| c.a as f64);

    engine.register_fn("param", move |i: i64| -> Color {
        let values = params.read().unwrap_or_else(PoisonError::into_inner);
        usize::try_from(i)
            .ok()
            .and_then(|i| values.get(i).copied())
            .unwrap_or(Color::DEFAULT)
    });
    engine.register_fn("luma", |c: Color| c.luma() as f64);
    engine.register_fn("unorm", |v: f64, max: i64| ((max as f64 + 0.5) * v) as i64);
}

fn read_header(map: &Map) -> (String, Vec<SlotDescriptor>) {
    let name = map
        .get("name")
        .and_then(|v| v.clone().into_string().ok())
        .unwrap_or_else(|| DEFAULT_SCRIPT_NAME.to_string());
    let slots = map
        .get("inputs")
        .and_then(|v| v.clone().into_array().ok())
        .map(|inputs| {
            inputs
                .into_iter()
                .filter_map(|v| v.into_string().ok())
                .map(SlotDescriptor::named)
                .collect()
        })
        .unwrap_or_default();
    (name, slots)
}

fn to_number(value: &Dynamic) -> Option<f32> {
    value
        .as_float()
        .ok()
        .or_else(|| value.as_int().ok().map(|i| i as f64))
        .map(|v| v as f32)
}

/// Interpret a `process` result as a color.
fn to_color(value: Dynamic) -> Color {
    if let Some(v) = to_number(&value) {
        return Color::gray(v);
    }
    if value.is::<Color>() {
        return value.cast::<Color>();
    }
    let Ok(channels) = value.into_array() else {
        return Color::DEFAULT;
    };
    let Some(c) = channels.iter().map(to_number).collect::<Option<Vec<f32>>>() else {
        return Color::DEFAULT;
    };
    match c.as_slice() {
        [r] => Color::new(*r, 0.0, 0.0, 1.0),
        [r, g] => Color::new(*r, *g, 0.0, 1.0),
        [r, g, b] => Color::new(*r, *g, *b, 1.0),
        [r, g, b, a] => Color::new(*r, *g, *b, *a),
        _ => Color::DEFAULT,
    }
}
