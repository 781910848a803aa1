//! Sandboxed script runtime for runScript actions.
//!
//! Scripts run in an embedded [rhai](https://rhai.rs) engine on a blocking
//! worker thread, with no ambient filesystem, network, or process access.
//! Three bindings are injected:
//!
//! - `base` — table/record storage (`base.getTable("Tasks")` returns a
//!   table handle with `selectRecordsAsync`, `selectRecordAsync`,
//!   `createRecordAsync`, `updateRecordAsync`, `deleteRecordAsync`)
//! - `context` — a read-only snapshot of the run context
//! - `fetch(url)` / `fetch(url, options)` — outbound HTTP through the
//!   engine's HTTP port
//!
//! Records surface as plain maps carrying an `id` field plus the record's
//! fields, with a `getCellValue("field")` convenience method. Storage and
//! HTTP calls block the worker thread on the async ports via a runtime
//! handle; the async caller is never blocked.

use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rhai::{Dynamic, Engine, EvalAltResult, Position, Scope};
use serde_json::Value;
use tokio::runtime::Handle;

use relay_domain::error::ScriptError;
use relay_domain::id::RecordId;

use crate::ports::{HttpClient, RecordStore};

/// Default wall-clock deadline for one script.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// What a finished script produced.
#[derive(Debug, Clone)]
pub struct ScriptOutcome {
    /// The script's return value, JSON-encoded. Scripts without an
    /// explicit `return` yield their last expression; a bare script
    /// yields JSON null.
    pub result: Value,
    /// `print`/`debug` lines captured during the run, in order.
    pub console: Vec<String>,
}

/// A failed script, with whatever console output it managed to emit.
#[derive(Debug)]
pub struct ScriptFailure {
    pub error: ScriptError,
    pub console: Vec<String>,
}

/// Executes untrusted scripts against the storage and HTTP ports.
pub struct ScriptRuntime<S, H> {
    records: S,
    http: H,
    timeout_secs: u64,
}

impl<S: RecordStore, H: HttpClient> ScriptRuntime<S, H> {
    pub fn new(records: S, http: H) -> Self {
        Self {
            records,
            http,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Override the per-script deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Run one script against a context snapshot.
    ///
    /// # Errors
    ///
    /// Fails with a [`ScriptFailure`] carrying the console lines captured
    /// before the failure, and one of:
    ///
    /// - [`ScriptError::EmptySource`] when the source is blank
    /// - [`ScriptError::Timeout`] when the deadline elapses
    /// - [`ScriptError::Runtime`] for any script-thrown error, including
    ///   failures surfaced by the storage and HTTP bindings
    #[tracing::instrument(skip_all, fields(source_len = source.len()))]
    pub async fn run(&self, source: &str, context: &Value) -> Result<ScriptOutcome, ScriptFailure> {
        if source.trim().is_empty() {
            return Err(ScriptFailure {
                error: ScriptError::EmptySource,
                console: Vec::new(),
            });
        }

        let source = source.to_string();
        let context = context.clone();
        let records = self.records.clone();
        let http = self.http.clone();
        let timeout_secs = self.timeout_secs;
        let handle = Handle::current();

        let console: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let console_out = Arc::clone(&console);

        let evaluated = tokio::task::spawn_blocking(move || {
            let engine = build_engine(records, http, handle, timeout_secs, &console);
            let mut scope = Scope::new();
            scope.push("base", BaseApi);
            scope.push(
                "context",
                rhai::serde::to_dynamic(&context).unwrap_or(Dynamic::UNIT),
            );
            engine.eval_with_scope::<Dynamic>(&mut scope, &source)
        })
        .await;

        let console = console_out
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default();

        let evaluated = match evaluated {
            Ok(result) => result,
            Err(err) => {
                return Err(ScriptFailure {
                    error: ScriptError::Runtime(format!("script task failed: {err}")),
                    console,
                });
            }
        };

        match evaluated {
            Ok(value) => Ok(ScriptOutcome {
                result: dynamic_to_json(value),
                console,
            }),
            Err(err) => {
                let error = match *err {
                    EvalAltResult::ErrorTerminated(..) => ScriptError::Timeout(timeout_secs),
                    other => ScriptError::Runtime(other.to_string()),
                };
                Err(ScriptFailure { error, console })
            }
        }
    }
}

/// Marker behind the `base` binding; `getTable` hangs off it.
#[derive(Debug, Clone, Copy)]
struct BaseApi;

/// Handle to one named table, as held by a script.
#[derive(Clone)]
struct TableApi<S> {
    name: String,
    records: S,
    handle: Handle,
}

fn build_engine<S: RecordStore, H: HttpClient>(
    records: S,
    http: H,
    handle: Handle,
    timeout_secs: u64,
    console: &Arc<Mutex<Vec<String>>>,
) -> Engine {
    let mut engine = Engine::new();

    let started = Instant::now();
    let deadline = Duration::from_secs(timeout_secs);
    engine.on_progress(move |_| (started.elapsed() > deadline).then(|| "deadline".into()));

    let print_sink = Arc::clone(console);
    engine.on_print(move |line| {
        if let Ok(mut lines) = print_sink.lock() {
            lines.push(line.to_string());
        }
    });
    let debug_sink = Arc::clone(console);
    engine.on_debug(move |line, _source, _pos| {
        if let Ok(mut lines) = debug_sink.lock() {
            lines.push(line.to_string());
        }
    });

    engine.register_type_with_name::<BaseApi>("Base");
    engine.register_type_with_name::<TableApi<S>>("Table");

    let table_records = records;
    let table_handle = handle.clone();
    engine.register_fn("getTable", move |_base: &mut BaseApi, name: &str| {
        TableApi {
            name: name.to_string(),
            records: table_records.clone(),
            handle: table_handle.clone(),
        }
    });

    engine.register_fn(
        "selectRecordsAsync",
        |table: &mut TableApi<S>| -> Result<rhai::Array, Box<EvalAltResult>> {
            let records = table
                .handle
                .block_on(table.records.list(&table.name))
                .map_err(runtime_err)?;
            records
                .into_iter()
                .map(|record| rhai::serde::to_dynamic(record.to_context_value()))
                .collect()
        },
    );

    engine.register_fn(
        "selectRecordsAsync",
        |table: &mut TableApi<S>, options: rhai::Map| -> Result<rhai::Array, Box<EvalAltResult>> {
            let filter = match options.get("filter") {
                Some(value) => rhai::serde::from_dynamic::<Value>(value)?
                    .as_object()
                    .cloned()
                    .unwrap_or_default(),
                None => serde_json::Map::new(),
            };
            let sort = match options.get("sort") {
                Some(value) => rhai::serde::from_dynamic::<Value>(value)?
                    .as_object()
                    .cloned(),
                None => None,
            };

            let mut records = table
                .handle
                .block_on(table.records.list(&table.name))
                .map_err(runtime_err)?;
            records.retain(|record| {
                filter
                    .iter()
                    .all(|(field, expected)| &record.cell_value(field) == expected)
            });
            if let Some(sort) = sort {
                if let Some(field) = sort.get("field").and_then(Value::as_str) {
                    let field = field.to_string();
                    records.sort_by(|a, b| {
                        json_ordering(&a.cell_value(&field), &b.cell_value(&field))
                    });
                    if sort.get("direction").and_then(Value::as_str) == Some("desc") {
                        records.reverse();
                    }
                }
            }
            records
                .into_iter()
                .map(|record| rhai::serde::to_dynamic(record.to_context_value()))
                .collect()
        },
    );

    engine.register_fn(
        "selectRecordAsync",
        |table: &mut TableApi<S>, id: &str| -> Result<Dynamic, Box<EvalAltResult>> {
            let id = RecordId::from_str(id).map_err(runtime_err)?;
            let record = table
                .handle
                .block_on(table.records.get(&table.name, id))
                .map_err(runtime_err)?;
            rhai::serde::to_dynamic(record.to_context_value())
        },
    );

    engine.register_fn(
        "createRecordAsync",
        |table: &mut TableApi<S>, fields: rhai::Map| -> Result<String, Box<EvalAltResult>> {
            let fields = fields_from_map(fields)?;
            let record = table
                .handle
                .block_on(table.records.create(&table.name, fields))
                .map_err(runtime_err)?;
            Ok(record.id.to_string())
        },
    );

    engine.register_fn(
        "updateRecordAsync",
        |table: &mut TableApi<S>,
         id: &str,
         fields: rhai::Map|
         -> Result<Dynamic, Box<EvalAltResult>> {
            let id = RecordId::from_str(id).map_err(runtime_err)?;
            let fields = fields_from_map(fields)?;
            let record = table
                .handle
                .block_on(table.records.update(&table.name, id, fields))
                .map_err(runtime_err)?;
            rhai::serde::to_dynamic(record.to_context_value())
        },
    );

    engine.register_fn(
        "deleteRecordAsync",
        |table: &mut TableApi<S>, id: &str| -> Result<(), Box<EvalAltResult>> {
            let id = RecordId::from_str(id).map_err(runtime_err)?;
            table
                .handle
                .block_on(table.records.delete(&table.name, id))
                .map_err(runtime_err)
        },
    );

    // Records surface as plain maps, so getCellValue is a map method.
    engine.register_fn("getCellValue", |record: &mut rhai::Map, field: &str| {
        record.get(field).cloned().unwrap_or(Dynamic::UNIT)
    });

    let get_http = http.clone();
    let get_handle = handle.clone();
    engine.register_fn(
        "fetch",
        move |url: &str| -> Result<Dynamic, Box<EvalAltResult>> {
            let response = get_handle
                .block_on(get_http.request("GET", url, None))
                .map_err(runtime_err)?;
            rhai::serde::to_dynamic(&response.body)
        },
    );

    engine.register_fn(
        "fetch",
        move |url: &str, options: rhai::Map| -> Result<Dynamic, Box<EvalAltResult>> {
            let method = options
                .get("method")
                .map_or_else(|| "GET".to_string(), ToString::to_string);
            let payload = match options.get("payload") {
                Some(value) => Some(rhai::serde::from_dynamic::<Value>(value)?),
                None => None,
            };
            let response = handle
                .block_on(http.request(&method, url, payload))
                .map_err(runtime_err)?;
            rhai::serde::to_dynamic(&response.body)
        },
    );

    engine
}

fn runtime_err(err: impl std::fmt::Display) -> Box<EvalAltResult> {
    EvalAltResult::ErrorRuntime(err.to_string().into(), Position::NONE).into()
}

fn fields_from_map(
    map: rhai::Map,
) -> Result<serde_json::Map<String, Value>, Box<EvalAltResult>> {
    map.into_iter()
        .map(|(key, value)| Ok((key.to_string(), rhai::serde::from_dynamic(&value)?)))
        .collect()
}

/// Total order over JSON scalars for script-side sorting: nulls first,
/// then numbers, strings, booleans; mixed types keep their relative order.
fn json_ordering(left: &Value, right: &Value) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

fn dynamic_to_json(value: Dynamic) -> Value {
    if value.is_unit() {
        return Value::Null;
    }
    rhai::serde::from_dynamic(&value).unwrap_or(Value::Null)
}
