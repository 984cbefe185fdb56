use std::cell::RefCell;
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};

use bevy::prelude::*;
use rhai::{Array, Dynamic, Engine, ImmutableString, Map, Scope, AST, FLOAT, INT};
use serde::{Deserialize, Serialize};

use crate::events::GameEventBus;

pub const DEFAULT_RHAI_MAX_OPERATIONS: u64 = 500_000;
pub const DEFAULT_RHAI_MAX_CALL_LEVELS: usize = 64;
const MAX_SCRIPT_ERRORS: usize = 100;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ScriptError {
    pub script_name: String,
    pub source: String,
    pub error_message: String,
    pub frame: u64,
}

/// A script run requested by gameplay code, executed by [`run_pending_scripts`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptRequest {
    pub script: String,
    pub source: String,
}

/// Named level scripts plus the state they share.
#[derive(Resource, Default)]
pub struct LevelScripts {
    pub sources: HashMap<String, String>,
    pub vars: HashMap<String, serde_json::Value>,
    pub pending: VecDeque<ScriptRequest>,
    pub errors: VecDeque<ScriptError>,
    pub completed_runs: u64,
}

impl LevelScripts {
    pub fn load_script(&mut self, name: impl Into<String>, source: impl Into<String>) {
        self.sources.insert(name.into(), source.into());
    }

    pub fn request(&mut self, script: &str, source: &str) {
        self.pending.push_back(ScriptRequest {
            script: script.to_string(),
            source: source.to_string(),
        });
    }

    fn push_error(&mut self, error: ScriptError) {
        warn!(
            "[Badguy scripts] {} ({}) failed: {}",
            error.script_name, error.source, error.error_message
        );
        self.errors.push_back(error);
        while self.errors.len() > MAX_SCRIPT_ERRORS {
            self.errors.pop_front();
        }
    }
}

#[derive(Default)]
struct ScriptCallContext {
    vars: HashMap<String, serde_json::Value>,
    events: Vec<(String, serde_json::Value)>,
}

thread_local! {
    static SCRIPT_CALL_CONTEXT: RefCell<ScriptCallContext> = RefCell::new(ScriptCallContext::default());
}

/// rhai engine and compiled-AST cache. Not `Send`, so it lives as a
/// non-send resource.
pub struct RhaiRuntime {
    engine: Engine,
    compiled: HashMap<String, (u64, AST)>,
}

impl Default for RhaiRuntime {
    fn default() -> Self {
        Self {
            engine: make_rhai_engine(),
            compiled: HashMap::new(),
        }
    }
}

impl RhaiRuntime {
    fn compile_ast(&mut self, key: &str, source: &str) -> Result<AST, String> {
        let hash = source_hash(source);
        if let Some((cached_hash, ast)) = self.compiled.get(key) {
            if *cached_hash == hash {
                return Ok(ast.clone());
            }
        }
        let ast = self.engine.compile(source).map_err(|e| e.to_string())?;
        self.compiled.insert(key.to_string(), (hash, ast.clone()));
        Ok(ast)
    }

    /// Runs `script`: a registered script name, or inline source when no
    /// script of that name exists.
    pub fn run(
        &mut self,
        scripts: &mut LevelScripts,
        script: &str,
        source_label: &str,
        frame: u64,
        bus: Option<&mut GameEventBus>,
    ) -> Result<(), String> {
        let (name, source) = match scripts.sources.get(script) {
            Some(source) => (script.to_string(), source.clone()),
            None => (format!("inline:{:016x}", source_hash(script)), script.to_string()),
        };

        let result = self.compile_ast(&name, &source).and_then(|ast| {
            SCRIPT_CALL_CONTEXT.with(|ctx| {
                let mut ctx = ctx.borrow_mut();
                ctx.vars = std::mem::take(&mut scripts.vars);
                ctx.events.clear();
            });
            let mut scope = Scope::new();
            scope.push_constant("SOURCE", source_label.to_string());
            let run = self
                .engine
                .run_ast_with_scope(&mut scope, &ast)
                .map_err(|e| e.to_string());
            let events = SCRIPT_CALL_CONTEXT.with(|ctx| {
                let mut ctx = ctx.borrow_mut();
                scripts.vars = std::mem::take(&mut ctx.vars);
                std::mem::take(&mut ctx.events)
            });
            if let Some(bus) = bus {
                for (event, data) in events {
                    bus.emit(event, data, None);
                }
            }
            run
        });

        match result {
            Ok(()) => {
                scripts.completed_runs += 1;
                debug!("[Badguy scripts] Ran {name} ({source_label})");
                Ok(())
            }
            Err(error_message) => {
                scripts.push_error(ScriptError {
                    script_name: name,
                    source: source_label.to_string(),
                    error_message: error_message.clone(),
                    frame,
                });
                Err(error_message)
            }
        }
    }
}

fn source_hash(source: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    source.hash(&mut hasher);
    hasher.finish()
}

fn make_rhai_engine() -> Engine {
    let mut engine = Engine::new();
    let max_ops = std::env::var("BADGUY_RHAI_MAX_OPERATIONS")
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_RHAI_MAX_OPERATIONS)
        .max(10_000);
    let max_call_levels = std::env::var("BADGUY_RHAI_MAX_CALL_LEVELS")
        .ok()
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(DEFAULT_RHAI_MAX_CALL_LEVELS)
        .max(8);
    engine.set_max_operations(max_ops);
    engine.set_max_call_levels(max_call_levels);
    engine.on_print(|text| info!("[Badguy scripts] {text}"));
    engine.register_fn("get_var", script_get_var);
    engine.register_fn("set_var", script_set_var);
    engine.register_fn("emit", script_emit);
    engine.register_fn("emit", script_emit_with_data);
    engine
}

fn script_get_var(name: ImmutableString) -> Dynamic {
    SCRIPT_CALL_CONTEXT.with(|ctx| {
        ctx.borrow()
            .vars
            .get(name.as_str())
            .map(json_to_dynamic)
            .unwrap_or(Dynamic::UNIT)
    })
}

fn script_set_var(name: ImmutableString, value: Dynamic) {
    SCRIPT_CALL_CONTEXT.with(|ctx| {
        ctx.borrow_mut()
            .vars
            .insert(name.to_string(), dynamic_to_json(&value));
    });
}

fn script_emit(name: ImmutableString) {
    script_emit_with_data(name, Dynamic::UNIT);
}

fn script_emit_with_data(name: ImmutableString, data: Dynamic) {
    SCRIPT_CALL_CONTEXT.with(|ctx| {
        ctx.borrow_mut()
            .events
            .push((name.to_string(), dynamic_to_json(&data)));
    });
}

fn json_to_dynamic(value: &serde_json::Value) -> Dynamic {
    match value {
        serde_json::Value::Null => Dynamic::UNIT,
        serde_json::Value::Bool(v) => (*v).into(),
        serde_json::Value::Number(v) => {
            if let Some(i) = v.as_i64() {
                (i as INT).into()
            } else if let Some(f) = v.as_f64() {
                (f as FLOAT).into()
            } else {
                Dynamic::UNIT
            }
        }
        serde_json::Value::String(v) => v.as_str().into(),
        serde_json::Value::Array(arr) => {
            let out: Array = arr.iter().map(json_to_dynamic).collect();
            out.into()
        }
        serde_json::Value::Object(obj) => {
            let mut out = Map::new();
            for (k, v) in obj {
                out.insert(k.as_str().into(), json_to_dynamic(v));
            }
            out.into()
        }
    }
}

fn dynamic_to_json(value: &Dynamic) -> serde_json::Value {
    if value.is::<()>() {
        return serde_json::Value::Null;
    }
    if let Some(v) = value.clone().try_cast::<bool>() {
        return serde_json::Value::Bool(v);
    }
    if let Some(v) = value.clone().try_cast::<INT>() {
        return serde_json::json!(v);
    }
    if let Some(v) = value.clone().try_cast::<FLOAT>() {
        return serde_json::json!(v);
    }
    if let Some(v) = value.clone().try_cast::<ImmutableString>() {
        return serde_json::Value::String(v.to_string());
    }
    if let Some(v) = value.clone().try_cast::<Array>() {
        return serde_json::Value::Array(v.iter().map(dynamic_to_json).collect());
    }
    if let Some(v) = value.clone().try_cast::<Map>() {
        let mut out = serde_json::Map::new();
        for (k, item) in v {
            out.insert(k.to_string(), dynamic_to_json(&item));
        }
        return serde_json::Value::Object(out);
    }
    serde_json::Value::Null
}

pub struct ScriptingPlugin;

impl Plugin for ScriptingPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<LevelScripts>()
            .init_non_send_resource::<RhaiRuntime>();
    }
}

/// Drains queued script runs. Failures are recorded, never propagated.
pub fn run_pending_scripts(
    mut scripts: ResMut<LevelScripts>,
    mut runtime: NonSendMut<RhaiRuntime>,
    mut bus: ResMut<GameEventBus>,
) {
    let frame = bus.frame;
    while let Some(request) = scripts.pending.pop_front() {
        let _ = runtime.run(
            &mut scripts,
            &request.script,
            &request.source,
            frame,
            Some(&mut bus),
        );
    }
}
