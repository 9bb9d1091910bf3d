use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use pxr_reconcile::{AdminChannel, ChannelError, Statement, MATCH_COUNT_COLUMN};
use pxr_schemas::{
    ConfigSettings, Direction, FieldValue, PersistenceLayer, StoredRecord, TransferAction,
};

use crate::tables::{table_def, transfer_scope, TableDef, ALL_TABLES};

type Tables = BTreeMap<&'static str, Vec<StoredRecord>>;

enum Reply {
    Rows(Vec<StoredRecord>),
    Affected(u64),
}

#[derive(Default)]
struct AdminState {
    layers: BTreeMap<PersistenceLayer, Tables>,
    log: Vec<Statement>,
    failures: Vec<(String, ChannelError)>,
    next_id: u64,
}

/// In-memory stand-in for the ProxySQL admin interface. Used ONLY in tests.
///
/// Reads and writes go to the MEMORY layer. `LOAD`/`SAVE` commands copy whole
/// families between layers with ProxySQL's verb semantics, so propagation and
/// bulk transfers are observable through [`layer_rows`](Self::layer_rows).
/// Every statement received is logged, including ones that fail.
pub struct InMemoryAdmin {
    state: Mutex<AdminState>,
}

impl Default for InMemoryAdmin {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryAdmin {
    pub fn new() -> Self {
        let mut layers = BTreeMap::new();
        for layer in PersistenceLayer::ALL {
            let tables: Tables = ALL_TABLES.iter().map(|t| (t.name, Vec::new())).collect();
            layers.insert(layer, tables);
        }
        Self {
            state: Mutex::new(AdminState {
                layers,
                next_id: 1,
                ..AdminState::default()
            }),
        }
    }

    /// A store holding a handful of stock global variables in every layer.
    pub fn with_proxysql_defaults() -> Result<Self, ChannelError> {
        let admin = Self::new();
        let stock = [
            ("mysql-max_connections", "2048"),
            ("mysql-threads", "4"),
            ("mysql-monitor_username", "monitor"),
            ("admin-refresh_interval", "2000"),
        ];
        for layer in PersistenceLayer::ALL {
            for (name, value) in stock {
                admin.seed_layer(
                    layer,
                    "global_variables",
                    &[("variable_name", name), ("variable_value", value)],
                )?;
            }
        }
        Ok(admin)
    }

    fn lock(&self) -> MutexGuard<'_, AdminState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    // -----------------------------------------------------------------------
    // Seeding and inspection
    // -----------------------------------------------------------------------

    /// Inserts a MEMORY row without logging it. Unset columns take defaults.
    pub fn seed(&self, table: &str, fields: &[(&str, &str)]) -> Result<(), ChannelError> {
        self.seed_layer(PersistenceLayer::Memory, table, fields)
    }

    pub fn seed_layer(
        &self,
        layer: PersistenceLayer,
        table: &str,
        fields: &[(&str, &str)],
    ) -> Result<(), ChannelError> {
        let def = lookup_table(table)?;
        let mut state = self.lock();
        let mut row = def.default_row();
        if let Some(id_col) = def.auto_id {
            row.insert(id_col.to_string(), Some(state.next_id.to_string()));
            state.next_id += 1;
        }
        for (column, value) in fields {
            check_column(def, column)?;
            row.insert(column.to_string(), Some(value.to_string()));
        }
        state.tables_mut(layer).entry(def.name).or_default().push(row);
        Ok(())
    }

    /// Overwrites one cell in every MEMORY row matching `key`, bypassing the log.
    pub fn set_cell(
        &self,
        table: &str,
        key: &[(&str, &str)],
        column: &str,
        value: Option<&str>,
    ) -> Result<usize, ChannelError> {
        let def = lookup_table(table)?;
        check_column(def, column)?;
        let mut state = self.lock();
        let mut touched = 0;
        for row in state.tables_mut(PersistenceLayer::Memory).entry(def.name).or_default() {
            let hit = key
                .iter()
                .all(|(c, v)| row.get(*c).and_then(|x| x.as_deref()) == Some(*v));
            if hit {
                row.insert(column.to_string(), value.map(str::to_string));
                touched += 1;
            }
        }
        Ok(touched)
    }

    /// MEMORY rows of `table`.
    pub fn rows(&self, table: &str) -> Vec<StoredRecord> {
        self.layer_rows(PersistenceLayer::Memory, table)
    }

    pub fn layer_rows(&self, layer: PersistenceLayer, table: &str) -> Vec<StoredRecord> {
        let mut state = self.lock();
        state
            .tables_mut(layer)
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    /// Every statement received, in order.
    pub fn statements(&self) -> Vec<Statement> {
        self.lock().log.clone()
    }

    /// Admin commands (`SAVE ...`, `LOAD ...`) received, in order.
    pub fn admin_commands(&self) -> Vec<String> {
        self.lock()
            .log
            .iter()
            .filter_map(|s| match s {
                Statement::Admin { command } => Some(command.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of INSERT/UPDATE/DELETE statements received.
    pub fn mutation_count(&self) -> usize {
        self.lock().log.iter().filter(|s| s.is_mutation()).count()
    }

    /// Any later statement whose SQL contains `fragment` fails with `error`.
    pub fn fail_when(&self, fragment: &str, error: ChannelError) {
        self.lock().failures.push((fragment.to_string(), error));
    }

    pub fn clear_failures(&self) {
        self.lock().failures.clear();
    }

    // -----------------------------------------------------------------------
    // Statement interpreter
    // -----------------------------------------------------------------------

    fn run(&self, stmt: &Statement) -> Result<Reply, ChannelError> {
        let mut state = self.lock();
        state.log.push(stmt.clone());

        let sql = stmt.sql();
        if let Some((_, err)) = state.failures.iter().find(|(f, _)| sql.contains(f.as_str())) {
            return Err(err.clone());
        }

        match stmt {
            Statement::Count { table, predicate } => {
                let n = state.memory_table(table)?.iter().filter(|r| predicate.matches(r)).count();
                let mut row = StoredRecord::new();
                row.insert(MATCH_COUNT_COLUMN.to_string(), Some(n.to_string()));
                Ok(Reply::Rows(vec![row]))
            }
            Statement::Select { table, predicate } => {
                let rows = state
                    .memory_table(table)?
                    .iter()
                    .filter(|r| predicate.matches(r))
                    .cloned()
                    .collect();
                Ok(Reply::Rows(rows))
            }
            Statement::Insert { table, columns } => {
                let def = lookup_table(table)?;
                let mut row = def.default_row();
                for (column, value) in columns {
                    check_column(def, column)?;
                    row.insert(column.to_string(), value.canonical_text());
                }
                if let Some(id_col) = def.auto_id {
                    if row.get(id_col).map_or(true, Option::is_none) {
                        row.insert(id_col.to_string(), Some(state.next_id.to_string()));
                        state.next_id += 1;
                    }
                }
                let rows = state.memory_table(table)?;
                check_unique(def, rows, &row)?;
                rows.push(row);
                Ok(Reply::Affected(1))
            }
            Statement::Update {
                table,
                assignments,
                predicate,
            } => {
                let def = lookup_table(table)?;
                for (column, _) in assignments {
                    check_column(def, column)?;
                }
                let mut n = 0;
                for row in state.memory_table(table)?.iter_mut() {
                    if predicate.matches(row) {
                        for (column, value) in assignments {
                            row.insert(column.to_string(), value.canonical_text());
                        }
                        n += 1;
                    }
                }
                Ok(Reply::Affected(n))
            }
            Statement::Delete { table, predicate } => {
                let rows = state.memory_table(table)?;
                let before = rows.len();
                rows.retain(|r| !predicate.matches(r));
                Ok(Reply::Affected((before - rows.len()) as u64))
            }
            Statement::Admin { command } => {
                state.apply_transfer(command)?;
                Ok(Reply::Affected(0))
            }
        }
    }
}

#[async_trait]
impl AdminChannel for InMemoryAdmin {
    async fn query(&self, stmt: &Statement) -> Result<Vec<StoredRecord>, ChannelError> {
        match self.run(stmt)? {
            Reply::Rows(rows) => Ok(rows),
            Reply::Affected(_) => Ok(Vec::new()),
        }
    }

    async fn execute(&self, stmt: &Statement) -> Result<u64, ChannelError> {
        match self.run(stmt)? {
            Reply::Affected(n) => Ok(n),
            Reply::Rows(rows) => Ok(rows.len() as u64),
        }
    }
}

impl AdminState {
    fn tables_mut(&mut self, layer: PersistenceLayer) -> &mut Tables {
        self.layers.entry(layer).or_default()
    }

    fn memory_table(&mut self, table: &str) -> Result<&mut Vec<StoredRecord>, ChannelError> {
        let def = lookup_table(table)?;
        Ok(self
            .tables_mut(PersistenceLayer::Memory)
            .entry(def.name)
            .or_default())
    }

    /// Parses `{LOAD|SAVE} <family> {FROM|TO} <layer>` and copies the family.
    fn apply_transfer(&mut self, command: &str) -> Result<(), ChannelError> {
        let parsed = parse_transfer(command)
            .ok_or_else(|| ChannelError::Rejected(format!("near \"{command}\": syntax error")))?;
        let (action, settings, direction, layer) = parsed;

        use Direction as D;
        use PersistenceLayer as L;
        use TransferAction as A;
        let (src, dst) = match (action, direction, layer) {
            (A::Load, D::From, L::Disk) | (A::Load, D::To, L::Memory) => (L::Disk, L::Memory),
            (A::Load, D::From, L::Memory) | (A::Load, D::To, L::Runtime) => (L::Memory, L::Runtime),
            (A::Load, D::From, L::Config) => (L::Config, L::Memory),
            (A::Save, D::To, L::Disk) | (A::Save, D::From, L::Memory) => (L::Memory, L::Disk),
            (A::Save, D::From, L::Runtime) | (A::Save, D::To, L::Memory) => (L::Runtime, L::Memory),
            _ => {
                return Err(ChannelError::Rejected(format!(
                    "near \"{command}\": unsupported transfer"
                )))
            }
        };

        let (table, prefix) = transfer_scope(settings);
        let in_scope = |row: &StoredRecord| match prefix {
            None => true,
            Some(p) => row
                .get("variable_name")
                .and_then(|v| v.as_deref())
                .is_some_and(|name| name.starts_with(p)),
        };

        let copied: Vec<StoredRecord> = self
            .tables_mut(src)
            .get(table)
            .map(|rows| rows.iter().filter(|r| in_scope(*r)).cloned().collect())
            .unwrap_or_default();
        let target = self.tables_mut(dst).entry(table).or_default();
        target.retain(|r| !in_scope(r));
        target.extend(copied);
        Ok(())
    }
}

fn parse_transfer(
    command: &str,
) -> Option<(TransferAction, ConfigSettings, Direction, PersistenceLayer)> {
    let words: Vec<&str> = command.split_whitespace().collect();
    let [first, middle @ .., dir, layer] = words.as_slice() else {
        return None;
    };
    let action = first.parse().ok()?;
    let settings = middle.join(" ").parse().ok()?;
    let direction = dir.parse().ok()?;
    let layer = layer.parse().ok()?;
    Some((action, settings, direction, layer))
}

fn lookup_table(table: &str) -> Result<&'static TableDef, ChannelError> {
    table_def(table).ok_or_else(|| ChannelError::Rejected(format!("no such table: {table}")))
}

fn check_column(def: &TableDef, column: &str) -> Result<(), ChannelError> {
    if def.has_column(column) {
        Ok(())
    } else {
        Err(ChannelError::Rejected(format!(
            "table {} has no column named {column}",
            def.name
        )))
    }
}

fn check_unique(def: &TableDef, rows: &[StoredRecord], row: &StoredRecord) -> Result<(), ChannelError> {
    if def.unique.is_empty() {
        return Ok(());
    }
    let clash = rows
        .iter()
        .any(|existing| def.unique.iter().all(|c| existing.get(*c) == row.get(*c)));
    if clash {
        let cols: Vec<String> = def.unique.iter().map(|c| format!("{}.{c}", def.name)).collect();
        return Err(ChannelError::Rejected(format!(
            "UNIQUE constraint failed: {}",
            cols.join(", ")
        )));
    }
    Ok(())
}

/// Cell text of `column`, flattening missing and NULL to `None`.
pub fn cell(row: &StoredRecord, column: &str) -> Option<String> {
    row.get(column).cloned().flatten()
}

/// Canonical text a field value is stored as.
pub fn stored(value: impl Into<FieldValue>) -> Option<String> {
    value.into().canonical_text()
}
