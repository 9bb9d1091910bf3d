//! Column layouts and defaults of the admin tables the fake store serves.
//!
//! Defaults mirror what the ProxySQL admin interface fills in when an INSERT
//! leaves a column out.

use pxr_schemas::{ConfigSettings, StoredRecord};

pub struct TableDef {
    pub name: &'static str,
    /// (column, default). `None` default is SQL NULL.
    pub columns: &'static [(&'static str, Option<&'static str>)],
    /// Columns of the uniqueness constraint; empty means none.
    pub unique: &'static [&'static str],
    /// Auto-increment primary key, if any.
    pub auto_id: Option<&'static str>,
}

impl TableDef {
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|(c, _)| *c == column)
    }

    pub fn default_row(&self) -> StoredRecord {
        self.columns
            .iter()
            .map(|(c, d)| (c.to_string(), d.map(str::to_string)))
            .collect()
    }
}

pub static GLOBAL_VARIABLES: TableDef = TableDef {
    name: "global_variables",
    columns: &[("variable_name", None), ("variable_value", None)],
    unique: &["variable_name"],
    auto_id: None,
};

pub static MYSQL_USERS: TableDef = TableDef {
    name: "mysql_users",
    columns: &[
        ("username", None),
        ("password", None),
        ("active", Some("1")),
        ("use_ssl", Some("0")),
        ("default_hostgroup", Some("0")),
        ("default_schema", None),
        ("schema_locked", Some("0")),
        ("transaction_persistent", Some("1")),
        ("fast_forward", Some("0")),
        ("backend", Some("1")),
        ("frontend", Some("1")),
        ("max_connections", Some("10000")),
    ],
    unique: &["username", "backend"],
    auto_id: None,
};

pub static MYSQL_SERVERS: TableDef = TableDef {
    name: "mysql_servers",
    columns: &[
        ("hostgroup_id", Some("0")),
        ("hostname", None),
        ("port", Some("3306")),
        ("status", Some("ONLINE")),
        ("weight", Some("1")),
        ("compression", Some("0")),
        ("max_connections", Some("1000")),
        ("max_replication_lag", Some("0")),
        ("use_ssl", Some("0")),
        ("max_latency_ms", Some("0")),
        ("comment", Some("")),
    ],
    unique: &["hostgroup_id", "hostname", "port"],
    auto_id: None,
};

pub static SCHEDULER: TableDef = TableDef {
    name: "scheduler",
    columns: &[
        ("id", None),
        ("active", Some("1")),
        ("interval_ms", Some("10000")),
        ("filename", None),
        ("arg1", None),
        ("arg2", None),
        ("arg3", None),
        ("arg4", None),
        ("arg5", None),
        ("comment", Some("")),
    ],
    unique: &[],
    auto_id: Some("id"),
};

pub static MYSQL_QUERY_RULES: TableDef = TableDef {
    name: "mysql_query_rules",
    columns: &[
        ("rule_id", None),
        ("active", Some("0")),
        ("username", None),
        ("match_pattern", None),
        ("destination_hostgroup", None),
        ("apply", Some("0")),
        ("comment", None),
    ],
    unique: &[],
    auto_id: Some("rule_id"),
};

pub static ALL_TABLES: [&TableDef; 5] = [
    &GLOBAL_VARIABLES,
    &MYSQL_USERS,
    &MYSQL_SERVERS,
    &SCHEDULER,
    &MYSQL_QUERY_RULES,
];

pub fn table_def(name: &str) -> Option<&'static TableDef> {
    ALL_TABLES.iter().copied().find(|t| t.name == name)
}

/// Rows a LOAD/SAVE of `settings` moves: a table, optionally narrowed to
/// variables carrying a name prefix.
pub fn transfer_scope(settings: ConfigSettings) -> (&'static str, Option<&'static str>) {
    match settings {
        ConfigSettings::MysqlUsers => ("mysql_users", None),
        ConfigSettings::MysqlServers => ("mysql_servers", None),
        ConfigSettings::MysqlQueryRules => ("mysql_query_rules", None),
        ConfigSettings::MysqlVariables => ("global_variables", Some("mysql-")),
        ConfigSettings::AdminVariables => ("global_variables", Some("admin-")),
        ConfigSettings::Scheduler => ("scheduler", None),
    }
}
