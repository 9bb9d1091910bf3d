//! Record-family schemas.
//!
//! One static declaration per family replaces per-family CRUD code: the
//! matcher, repository and engine are generic over [`RecordFamilySchema`].
//!
//! Field order inside `key_fields` / `attribute_fields` is significant. Every
//! predicate and statement is built by walking these slices, so generated SQL
//! is identical from run to run.

use crate::{ConfigSettings, FieldKind, RecordDescriptor};

// ---------------------------------------------------------------------------
// Field declarations
// ---------------------------------------------------------------------------

/// Value substituted when the caller omits a key field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldDefault {
    Required,
    Bool(bool),
    Int(i64),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Whether the column accepts an explicit NULL.
    pub nullable: bool,
    /// Only consulted for key fields.
    pub default: FieldDefault,
}

impl FieldSpec {
    const fn key(name: &'static str, kind: FieldKind, default: FieldDefault) -> Self {
        Self {
            name,
            kind,
            nullable: false,
            default,
        }
    }

    const fn attr(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            nullable: false,
            default: FieldDefault::Required,
        }
    }

    const fn nullable_attr(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            nullable: true,
            default: FieldDefault::Required,
        }
    }
}

/// Inclusive bounds on an integer field, checked before any store call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RangeCheck {
    pub field: &'static str,
    pub min: i64,
    pub max: i64,
}

/// How a family picks the LOAD/SAVE family for propagation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettingsSelector {
    Fixed(ConfigSettings),
    /// Global variables: `admin-*` names belong to ADMIN VARIABLES, everything
    /// else to MYSQL VARIABLES.
    VariablePrefix,
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq)]
pub struct RecordFamilySchema {
    /// Stable identifier used in outcomes and logs.
    pub name: &'static str,
    pub table: &'static str,
    /// Singular noun used in operator messages ("user", "schedule", ...).
    pub noun: &'static str,
    pub key_fields: &'static [FieldSpec],
    pub attribute_fields: &'static [FieldSpec],
    pub range_checks: &'static [RangeCheck],
    pub settings: SettingsSelector,
    /// `true` when the store enforces uniqueness on the key fields. Families
    /// without it never update in place: a divergent desired record is a new row.
    pub unique_key: bool,
    /// `false` when rows cannot be created through the admin interface.
    pub insertable: bool,
}

impl RecordFamilySchema {
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.key_fields
            .iter()
            .chain(self.attribute_fields.iter())
            .find(|f| f.name == name)
    }

    pub fn is_key(&self, name: &str) -> bool {
        self.key_fields.iter().any(|f| f.name == name)
    }

    pub fn config_settings(&self, desired: &RecordDescriptor) -> ConfigSettings {
        match self.settings {
            SettingsSelector::Fixed(s) => s,
            SettingsSelector::VariablePrefix => {
                let is_admin = desired
                    .key("variable_name")
                    .and_then(|v| v.canonical_text())
                    .map(|name| name.starts_with("admin"))
                    .unwrap_or(false);
                if is_admin {
                    ConfigSettings::AdminVariables
                } else {
                    ConfigSettings::MysqlVariables
                }
            }
        }
    }

    /// Noun with its first letter upper-cased, for sentence starts.
    pub fn noun_capitalized(&self) -> String {
        let mut chars = self.noun.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Families
// ---------------------------------------------------------------------------

pub static GLOBAL_VARIABLES: RecordFamilySchema = RecordFamilySchema {
    name: "global_variable",
    table: "global_variables",
    noun: "variable",
    key_fields: &[FieldSpec::key(
        "variable_name",
        FieldKind::Text,
        FieldDefault::Required,
    )],
    attribute_fields: &[FieldSpec::attr("variable_value", FieldKind::Text)],
    range_checks: &[],
    settings: SettingsSelector::VariablePrefix,
    unique_key: true,
    insertable: false,
};

pub static MYSQL_USERS: RecordFamilySchema = RecordFamilySchema {
    name: "mysql_user",
    table: "mysql_users",
    noun: "user",
    key_fields: &[
        FieldSpec::key("username", FieldKind::Text, FieldDefault::Required),
        FieldSpec::key("backend", FieldKind::Bool, FieldDefault::Bool(true)),
        FieldSpec::key("frontend", FieldKind::Bool, FieldDefault::Bool(true)),
    ],
    attribute_fields: &[
        FieldSpec::nullable_attr("password", FieldKind::Text),
        FieldSpec::attr("active", FieldKind::Bool),
        FieldSpec::attr("use_ssl", FieldKind::Bool),
        FieldSpec::attr("default_hostgroup", FieldKind::Int),
        FieldSpec::nullable_attr("default_schema", FieldKind::Text),
        FieldSpec::attr("transaction_persistent", FieldKind::Bool),
        FieldSpec::attr("fast_forward", FieldKind::Bool),
        FieldSpec::attr("max_connections", FieldKind::Int),
    ],
    range_checks: &[],
    settings: SettingsSelector::Fixed(ConfigSettings::MysqlUsers),
    unique_key: true,
    insertable: true,
};

pub static MYSQL_SERVERS: RecordFamilySchema = RecordFamilySchema {
    name: "mysql_server",
    table: "mysql_servers",
    noun: "server",
    key_fields: &[
        FieldSpec::key("hostgroup_id", FieldKind::Int, FieldDefault::Int(0)),
        FieldSpec::key("hostname", FieldKind::Text, FieldDefault::Required),
        FieldSpec::key("port", FieldKind::Int, FieldDefault::Int(3306)),
    ],
    attribute_fields: &[
        FieldSpec::attr("status", FieldKind::Text),
        FieldSpec::attr("weight", FieldKind::Int),
        FieldSpec::attr("compression", FieldKind::Int),
        FieldSpec::attr("max_connections", FieldKind::Int),
        FieldSpec::attr("max_replication_lag", FieldKind::Int),
        FieldSpec::attr("use_ssl", FieldKind::Bool),
        FieldSpec::attr("max_latency_ms", FieldKind::Int),
        FieldSpec::attr("comment", FieldKind::Text),
    ],
    range_checks: &[
        RangeCheck {
            field: "port",
            min: 0,
            max: 65535,
        },
        RangeCheck {
            field: "compression",
            min: 0,
            max: 102_400,
        },
        RangeCheck {
            field: "max_replication_lag",
            min: 0,
            max: 126_144_000,
        },
    ],
    settings: SettingsSelector::Fixed(ConfigSettings::MysqlServers),
    unique_key: true,
    insertable: true,
};

pub static SCHEDULER: RecordFamilySchema = RecordFamilySchema {
    name: "schedule",
    table: "scheduler",
    noun: "schedule",
    key_fields: &[
        FieldSpec::key("active", FieldKind::Bool, FieldDefault::Bool(true)),
        FieldSpec::key("interval_ms", FieldKind::Int, FieldDefault::Int(10_000)),
        FieldSpec::key("filename", FieldKind::Text, FieldDefault::Required),
    ],
    attribute_fields: &[
        FieldSpec::nullable_attr("arg1", FieldKind::Text),
        FieldSpec::nullable_attr("arg2", FieldKind::Text),
        FieldSpec::nullable_attr("arg3", FieldKind::Text),
        FieldSpec::nullable_attr("arg4", FieldKind::Text),
        FieldSpec::nullable_attr("arg5", FieldKind::Text),
        FieldSpec::attr("comment", FieldKind::Text),
    ],
    range_checks: &[RangeCheck {
        field: "interval_ms",
        min: 100,
        max: 100_000_000,
    }],
    settings: SettingsSelector::Fixed(ConfigSettings::Scheduler),
    unique_key: false,
    insertable: true,
};

pub static ALL_FAMILIES: [&RecordFamilySchema; 4] =
    [&GLOBAL_VARIABLES, &MYSQL_USERS, &MYSQL_SERVERS, &SCHEDULER];

pub fn family_by_name(name: &str) -> Option<&'static RecordFamilySchema> {
    ALL_FAMILIES
        .iter()
        .copied()
        .find(|f| f.name == name || f.table == name)
}
