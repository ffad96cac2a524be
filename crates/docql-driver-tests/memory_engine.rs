//! In-memory script engine used by the test suite.
//!
//! Understands a small command subset, enough to drive the driver end to end:
//!
//! - `CREATE CLASS <name> [EXTENDS <parent>]`
//! - `CREATE PROPERTY <class>.<name> <type>`
//! - `CREATE INDEX <name> ON <class> (<field>, ...) UNIQUE|NOTUNIQUE`
//! - `INSERT INTO <class> SET <field> = <literal>, ...`
//! - `UPDATE <class> SET <field> = <literal>, ... [WHERE <field> = <literal>]`
//! - `DELETE FROM <class> [WHERE <field> = <literal>]`
//! - `SELECT FROM <class> [WHERE <field> = <literal>]`
//!
//! Scripts honour `BEGIN`/`COMMIT`: statements between the markers run
//! against a working copy of the store, which replaces the live store only
//! when `COMMIT` is reached. A failing statement discards the working copy.

use async_trait::async_trait;
use docql_core::{
    ClassDef, ConnectionConfig, EngineCatalog, EngineConnector, EngineError, FunctionDef,
    IndexDef, IndexKind, PropertyDef, PropertyType, RawResult, Record, RecordId, Result,
    ScriptEngine, Value,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

type EngineResult<T> = std::result::Result<T, EngineError>;

/// First cluster id handed out to user classes
const FIRST_CLUSTER: i32 = 10;

static CREATE_CLASS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^CREATE\s+CLASS\s+(\w+)(?:\s+EXTENDS\s+(\w+))?$").expect("valid regex")
});

static CREATE_PROPERTY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^CREATE\s+PROPERTY\s+(\w+)\.(\w+)\s+(\w+)$").expect("valid regex")
});

static CREATE_INDEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^CREATE\s+INDEX\s+([\w.]+)\s+ON\s+(\w+)\s*\(([^)]*)\)\s+(UNIQUE|NOTUNIQUE)$")
        .expect("valid regex")
});

static INSERT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^INSERT\s+INTO\s+(\w+)\s+SET\s+(.+)$").expect("valid regex")
});

static UPDATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^UPDATE\s+(\w+)\s+SET\s+(.+?)(?:\s+WHERE\s+(.+))?$").expect("valid regex")
});

static DELETE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^DELETE\s+FROM\s+(\w+)(?:\s+WHERE\s+(.+))?$").expect("valid regex")
});

static SELECT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^SELECT\s+FROM\s+(\w+)(?:\s+WHERE\s+(.+))?$").expect("valid regex")
});

static ASSIGNMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\w+)\s*=\s*('[^']*'|[^,]+?)\s*(?:,|$)").expect("valid regex")
});

/// Classes, indexes and records of one database
#[derive(Debug, Clone, Default)]
struct Store {
    catalog: EngineCatalog,
    records: Vec<Record>,
    next_position: HashMap<String, i64>,
    next_property_id: i32,
}

/// Outcome of one statement
enum Outcome {
    Written(i64),
    Rows(Vec<Record>),
}

impl Store {
    fn apply(&mut self, statement: &str) -> EngineResult<Outcome> {
        let statement = statement.trim().trim_end_matches(';').trim();

        if let Some(caps) = CREATE_CLASS.captures(statement) {
            let mut class = ClassDef::new(&caps[1]);
            if let Some(parent) = caps.get(2) {
                let parent = self.class_name(parent.as_str())?;
                class = class.with_super_class(parent);
            }
            if self.catalog.class(&class.name).is_some() {
                return Err(EngineError::Execution(format!(
                    "Class '{}' already exists",
                    class.name
                )));
            }
            self.catalog.classes.push(class);
            return Ok(Outcome::Written(0));
        }

        if let Some(caps) = CREATE_PROPERTY.captures(statement) {
            let property_type = PropertyType::parse(&caps[3])
                .ok_or_else(|| EngineError::Parse(format!("Unknown type '{}'", &caps[3])))?;
            let id = self.next_property_id;
            let class = self.class_mut(&caps[1])?;
            class
                .properties
                .push(PropertyDef::new(&caps[2], property_type).with_id(id));
            self.next_property_id += 1;
            return Ok(Outcome::Written(0));
        }

        if let Some(caps) = CREATE_INDEX.captures(statement) {
            let class = self.class_name(&caps[2])?;
            let kind = if caps[4].eq_ignore_ascii_case("UNIQUE") {
                IndexKind::Unique
            } else {
                IndexKind::NotUnique
            };
            let fields = caps[3]
                .split(',')
                .map(|f| f.trim().to_string())
                .filter(|f| !f.is_empty())
                .collect();
            self.catalog
                .indexes
                .push(IndexDef::new(&caps[1], class, kind, fields));
            return Ok(Outcome::Written(0));
        }

        if let Some(caps) = INSERT.captures(statement) {
            let class = self.class_name(&caps[1])?;
            let mut record = Record::of_class(class.as_str());
            for (name, value) in parse_assignments(&caps[2])? {
                record.set(name, value);
            }
            self.check_unique(&record, None)?;

            let cluster = self.cluster_of(&class);
            let position = self.next_position.entry(class).or_insert(0);
            let rid = RecordId::new(cluster, *position);
            *position += 1;
            self.records.push(record.with_rid(rid));
            return Ok(Outcome::Written(1));
        }

        if let Some(caps) = UPDATE.captures(statement) {
            let class = self.class_name(&caps[1])?;
            let assignments = parse_assignments(&caps[2])?;
            let filter = caps.get(3).map(|w| parse_condition(w.as_str())).transpose()?;

            let targets: Vec<usize> = self.matching(&class, filter.as_ref()).collect();
            for &idx in &targets {
                let mut updated = self.records[idx].clone();
                for (name, value) in &assignments {
                    updated.set(name.clone(), value.clone());
                }
                self.check_unique(&updated, Some(idx))?;
                self.records[idx] = updated;
            }
            return Ok(Outcome::Written(targets.len() as i64));
        }

        if let Some(caps) = DELETE.captures(statement) {
            let class = self.class_name(&caps[1])?;
            let filter = caps.get(2).map(|w| parse_condition(w.as_str())).transpose()?;
            let doomed: Vec<usize> = self.matching(&class, filter.as_ref()).collect();
            for &idx in doomed.iter().rev() {
                self.records.remove(idx);
            }
            return Ok(Outcome::Written(doomed.len() as i64));
        }

        if let Some(caps) = SELECT.captures(statement) {
            let class = self.class_name(&caps[1])?;
            let filter = caps.get(2).map(|w| parse_condition(w.as_str())).transpose()?;
            let rows = self
                .matching(&class, filter.as_ref())
                .map(|idx| self.records[idx].clone())
                .collect();
            return Ok(Outcome::Rows(rows));
        }

        Err(EngineError::Parse(format!(
            "Unrecognized command: '{}'",
            statement
        )))
    }

    /// Canonical name of an existing class
    fn class_name(&self, name: &str) -> EngineResult<String> {
        self.catalog
            .class(name)
            .map(|c| c.name.clone())
            .ok_or_else(|| EngineError::Execution(format!("Class '{}' was not found", name)))
    }

    fn class_mut(&mut self, name: &str) -> EngineResult<&mut ClassDef> {
        self.catalog
            .classes
            .iter_mut()
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| EngineError::Execution(format!("Class '{}' was not found", name)))
    }

    fn cluster_of(&self, class: &str) -> i32 {
        let idx = self
            .catalog
            .classes
            .iter()
            .position(|c| c.name == class)
            .unwrap_or_default();
        FIRST_CLUSTER + idx as i32
    }

    fn matching<'a>(
        &'a self,
        class: &'a str,
        filter: Option<&'a (String, Value)>,
    ) -> impl Iterator<Item = usize> + 'a {
        self.records
            .iter()
            .enumerate()
            .filter(move |(_, r)| r.class_name.as_deref() == Some(class))
            .filter(move |(_, r)| match filter {
                Some((name, value)) => r.get(name) == Some(value),
                None => true,
            })
            .map(|(idx, _)| idx)
    }

    /// Reject a record whose unique-index key is already taken
    fn check_unique(&self, record: &Record, skip: Option<usize>) -> EngineResult<()> {
        let Some(class) = record.class_name.as_deref() else {
            return Ok(());
        };
        for index in self
            .catalog
            .class_indexes(class)
            .filter(|i| i.kind.is_unique())
        {
            let key: Vec<Option<&Value>> = index.fields.iter().map(|f| record.get(f)).collect();
            let taken = self.matching(class, None).any(|idx| {
                Some(idx) != skip
                    && index
                        .fields
                        .iter()
                        .map(|f| self.records[idx].get(f))
                        .eq(key.iter().copied())
            });
            if taken {
                return Err(EngineError::Execution(format!(
                    "Cannot index record {}: found duplicated key in index '{}'",
                    class, index.name
                )));
            }
        }
        Ok(())
    }
}

fn parse_literal(text: &str) -> EngineResult<Value> {
    let text = text.trim();
    if let Some(inner) = text.strip_prefix('\'').and_then(|t| t.strip_suffix('\'')) {
        return Ok(Value::String(inner.to_string()));
    }
    if text.eq_ignore_ascii_case("null") {
        return Ok(Value::Null);
    }
    if let Ok(b) = text.to_ascii_lowercase().parse::<bool>() {
        return Ok(Value::Bool(b));
    }
    if let Ok(i) = text.parse::<i64>() {
        return Ok(Value::Int64(i));
    }
    if let Ok(f) = text.parse::<f64>() {
        return Ok(Value::Float64(f));
    }
    Err(EngineError::Parse(format!("Invalid literal '{}'", text)))
}

fn parse_assignments(text: &str) -> EngineResult<Vec<(String, Value)>> {
    let mut rest = text.trim();
    let mut assignments = Vec::new();
    while !rest.is_empty() {
        let caps = ASSIGNMENT
            .captures(rest)
            .ok_or_else(|| EngineError::Parse(format!("Invalid assignment near '{}'", rest)))?;
        assignments.push((caps[1].to_string(), parse_literal(&caps[2])?));
        rest = rest[caps[0].len()..].trim_start();
    }
    Ok(assignments)
}

fn parse_condition(text: &str) -> EngineResult<(String, Value)> {
    let mut assignments = parse_assignments(text)?;
    match (assignments.pop(), assignments.is_empty()) {
        (Some(condition), true) => Ok(condition),
        _ => Err(EngineError::Parse(format!(
            "Only a single equality condition is supported: '{}'",
            text
        ))),
    }
}

/// An in-process database
pub struct MemoryEngine {
    name: String,
    store: Mutex<Store>,
    scripts: AtomicUsize,
}

impl std::fmt::Debug for MemoryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryEngine")
            .field("name", &self.name)
            .finish()
    }
}

impl MemoryEngine {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            store: Mutex::new(Store::default()),
            scripts: AtomicUsize::new(0),
        }
    }

    /// Register a stored function
    pub async fn define_function(&self, function: FunctionDef) {
        self.store.lock().await.catalog.functions.push(function);
    }

    /// Number of scripts submitted so far
    pub fn script_count(&self) -> usize {
        self.scripts.load(Ordering::SeqCst)
    }

    /// Records currently stored for a class
    pub async fn records_of(&self, class: &str) -> Vec<Record> {
        self.store
            .lock()
            .await
            .records
            .iter()
            .filter(|r| {
                r.class_name
                    .as_deref()
                    .is_some_and(|c| c.eq_ignore_ascii_case(class))
            })
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ScriptEngine for MemoryEngine {
    #[tracing::instrument(skip(self, script), fields(database = %self.name))]
    async fn execute_script(&self, language: &str, script: &str) -> EngineResult<RawResult> {
        self.scripts.fetch_add(1, Ordering::SeqCst);
        if !language.eq_ignore_ascii_case("sql") {
            return Err(EngineError::Execution(format!(
                "Unsupported script language '{}'",
                language
            )));
        }

        let mut store = self.store.lock().await;
        let mut transaction: Option<Store> = None;
        let mut written = 0;

        for line in script.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if line.eq_ignore_ascii_case("BEGIN") {
                transaction = Some(store.clone());
            } else if line.eq_ignore_ascii_case("COMMIT") {
                if let Some(committed) = transaction.take() {
                    *store = committed;
                }
            } else {
                let target = transaction.as_mut().unwrap_or(&mut *store);
                if let Outcome::Written(count) = target.apply(line)? {
                    written += count;
                }
            }
        }

        if transaction.is_some() {
            tracing::debug!("script ended inside a transaction, discarding it");
        }
        Ok(RawResult::Count(written))
    }

    async fn execute_command(&self, command: &str) -> EngineResult<RawResult> {
        let mut store = self.store.lock().await;
        match store.apply(command)? {
            Outcome::Written(count) => Ok(RawResult::Count(count)),
            Outcome::Rows(rows) => Ok(RawResult::Records(rows)),
        }
    }

    async fn load_record(&self, rid: RecordId) -> EngineResult<Option<Record>> {
        let store = self.store.lock().await;
        Ok(store.records.iter().find(|r| r.rid == Some(rid)).cloned())
    }

    async fn catalog(&self) -> EngineResult<EngineCatalog> {
        Ok(self.store.lock().await.catalog.clone())
    }

    fn database_name(&self) -> String {
        self.name.clone()
    }

    fn url(&self) -> String {
        format!("docql:memory:{}", self.name)
    }

    fn user_name(&self) -> Option<String> {
        Some("admin".to_string())
    }

    fn product_version(&self) -> String {
        "memory".to_string()
    }
}

/// Hands out one shared [`MemoryEngine`] per database name
#[derive(Debug, Default)]
pub struct MemoryConnector {
    databases: Mutex<HashMap<String, Arc<MemoryEngine>>>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// The engine behind a database, created on first use
    pub async fn database(&self, name: &str) -> Arc<MemoryEngine> {
        self.databases
            .lock()
            .await
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(MemoryEngine::new(name)))
            .clone()
    }
}

#[async_trait]
impl EngineConnector for MemoryConnector {
    async fn open(&self, config: &ConnectionConfig) -> Result<Arc<dyn ScriptEngine>> {
        let name = config.database.as_deref().unwrap_or(&config.name);
        Ok(self.database(name).await)
    }
}
