//! Catalog object model
//!
//! These are the snapshots the diagram layer reads: object identities,
//! containers (data sources, catalogs, schemas), entities (tables, views)
//! with their columns and keys, and aliases.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::{IdentifierRules, NameFilter};

/// Identifier of a configured data source (connection)
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataSourceId(pub String);

impl DataSourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for DataSourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DataSourceId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for DataSourceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Identifier of the logical project a data source belongs to
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub String);

impl ProjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProjectId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ProjectId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

const NODE_URI_SCHEME: &str = "database://";

/// Identity of a catalog object.
///
/// `path` holds the names below the data source root, outermost first, e.g.
/// `["sales", "public", "orders"]` for catalog `sales`, schema `public`,
/// table `orders`. The data source itself has an empty path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectRef {
    pub data_source: DataSourceId,
    #[serde(default)]
    pub path: Vec<String>,
}

impl ObjectRef {
    /// Reference to a data source root
    pub fn root(data_source: impl Into<DataSourceId>) -> Self {
        Self {
            data_source: data_source.into(),
            path: Vec::new(),
        }
    }

    /// Reference built from a data source and a path
    pub fn new<I, S>(data_source: impl Into<DataSourceId>, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            data_source: data_source.into(),
            path: path.into_iter().map(Into::into).collect(),
        }
    }

    /// Reference to a direct child of this object
    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut path = self.path.clone();
        path.push(name.into());
        Self {
            data_source: self.data_source.clone(),
            path,
        }
    }

    /// Reference to the containing object, `None` for a data source root
    pub fn parent(&self) -> Option<Self> {
        if self.path.is_empty() {
            return None;
        }
        let mut path = self.path.clone();
        path.pop();
        Some(Self {
            data_source: self.data_source.clone(),
            path,
        })
    }

    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }

    /// Object name (last path segment, or the data source id for roots)
    pub fn name(&self) -> &str {
        self.path
            .last()
            .map(String::as_str)
            .unwrap_or_else(|| self.data_source.as_str())
    }

    /// Dotted name without quoting (e.g. `sales.public.orders`)
    pub fn qualified_name(&self) -> String {
        self.path.join(".")
    }

    /// Navigator node id: `<data source>/<segment>/...`
    pub fn node_id(&self) -> String {
        let mut id = escape_segment(self.data_source.as_str());
        for segment in &self.path {
            id.push('/');
            id.push_str(&escape_segment(segment));
        }
        id
    }

    /// Navigator node URI: `database://<node id>`
    pub fn node_uri(&self) -> String {
        format!("{}{}", NODE_URI_SCHEME, self.node_id())
    }

    /// Parse a node id or node URI back into a reference
    pub fn parse_node_path(path: &str) -> Option<Self> {
        let path = path.strip_prefix(NODE_URI_SCHEME).unwrap_or(path);
        let mut segments = path.split('/');
        let data_source = unescape_segment(segments.next()?);
        if data_source.is_empty() {
            return None;
        }
        let path = segments
            .filter(|s| !s.is_empty())
            .map(unescape_segment)
            .collect();
        Some(Self {
            data_source: DataSourceId(data_source),
            path,
        })
    }
}

impl Default for ObjectRef {
    fn default() -> Self {
        Self::root(DataSourceId::default())
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.data_source)
        } else {
            write!(f, "{}:{}", self.data_source, self.qualified_name())
        }
    }
}

fn escape_segment(segment: &str) -> String {
    segment.replace('%', "%25").replace('/', "%2F")
}

fn unescape_segment(segment: &str) -> String {
    segment.replace("%2F", "/").replace("%25", "%")
}

/// Table type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableType {
    #[default]
    Table,
    View,
    MaterializedView,
    ForeignTable,
    Temporary,
    System,
    /// Non-relational class/collection exposed as an entity
    Class,
}

impl TableType {
    pub fn is_view(&self) -> bool {
        matches!(self, TableType::View | TableType::MaterializedView)
    }
}

/// Coarse data kind of a column, derived from its type name
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataKind {
    String,
    Numeric,
    Boolean,
    Datetime,
    Binary,
    Content,
    Structure,
    Array,
    #[default]
    Unknown,
}

impl DataKind {
    /// Guess the kind from a SQL type name such as `varchar(64)` or `INT8`
    pub fn from_type_name(type_name: &str) -> Self {
        let base = type_name
            .split(|c: char| c == '(' || c.is_whitespace())
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        if base.ends_with("[]") || base == "array" {
            return DataKind::Array;
        }
        match base.as_str() {
            "char" | "varchar" | "nchar" | "nvarchar" | "character" | "string" | "uuid"
            | "enum" | "citext" | "varchar2" | "nvarchar2" => DataKind::String,
            "int" | "integer" | "int2" | "int4" | "int8" | "smallint" | "bigint" | "tinyint"
            | "mediumint" | "serial" | "bigserial" | "decimal" | "numeric" | "number" | "real"
            | "float" | "float4" | "float8" | "double" | "money" => DataKind::Numeric,
            "bool" | "boolean" | "bit" => DataKind::Boolean,
            "date" | "time" | "timetz" | "datetime" | "datetime2" | "timestamp"
            | "timestamptz" | "interval" | "year" => DataKind::Datetime,
            "binary" | "varbinary" | "bytea" | "raw" => DataKind::Binary,
            "blob" | "clob" | "nclob" | "text" | "mediumtext" | "longtext" | "longblob"
            | "mediumblob" | "tinyblob" | "tinytext" | "xml" | "json" | "jsonb" => {
                DataKind::Content
            }
            "struct" | "record" | "object" | "row" => DataKind::Structure,
            _ => DataKind::Unknown,
        }
    }
}

/// Column information
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnInfo {
    pub name: String,
    pub ordinal: usize,
    pub data_type: String,
    pub nullable: bool,
    pub default_value: Option<String>,
    /// Column inherited from a parent table
    pub is_inherited: bool,
    /// Column hidden by the database (e.g. system or invisible columns)
    pub is_hidden: bool,
    pub comment: Option<String>,
    pub icon: Option<String>,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, ordinal: usize, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ordinal,
            data_type: data_type.into(),
            nullable: true,
            ..Default::default()
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.is_hidden = true;
        self
    }

    pub fn inherited(mut self) -> Self {
        self.is_inherited = true;
        self
    }

    pub fn data_kind(&self) -> DataKind {
        DataKind::from_type_name(&self.data_type)
    }
}

/// Primary key information
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryKeyInfo {
    pub name: Option<String>,
    pub columns: Vec<String>,
}

/// Index information
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexInfo {
    pub name: String,
    pub columns: Vec<String>,
    pub is_unique: bool,
    pub is_primary: bool,
}

/// Constraint type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintType {
    PrimaryKey,
    ForeignKey,
    Unique,
    Check,
}

/// Constraint information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintInfo {
    pub name: String,
    pub constraint_type: ConstraintType,
    pub columns: Vec<String>,
}

/// Whether a relationship exists in the database or only in the diagram
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    #[default]
    ForeignKey,
    /// User-declared relationship that is not stored in the database
    Logical,
}

impl ConstraintKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConstraintKind::ForeignKey => "fk",
            ConstraintKind::Logical => "logical",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "fk" | "foreign_key" | "FOREIGN KEY" => Some(ConstraintKind::ForeignKey),
            "logical" | "LOGICAL" => Some(ConstraintKind::Logical),
            _ => None,
        }
    }
}

/// Foreign key action
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForeignKeyAction {
    #[default]
    NoAction,
    Restrict,
    Cascade,
    SetNull,
    SetDefault,
}

/// Foreign key information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyInfo {
    pub name: String,
    #[serde(default)]
    pub kind: ConstraintKind,
    /// Columns of the owning (source) table
    pub columns: Vec<String>,
    /// Referenced (target) table
    pub referenced: ObjectRef,
    /// Referenced columns, parallel to `columns`
    pub referenced_columns: Vec<String>,
    #[serde(default)]
    pub on_update: ForeignKeyAction,
    #[serde(default)]
    pub on_delete: ForeignKeyAction,
}

impl ForeignKeyInfo {
    pub fn new(
        name: impl Into<String>,
        columns: Vec<String>,
        referenced: ObjectRef,
        referenced_columns: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: ConstraintKind::ForeignKey,
            columns,
            referenced,
            referenced_columns,
            on_update: ForeignKeyAction::NoAction,
            on_delete: ForeignKeyAction::NoAction,
        }
    }

    /// Column pairs (source column, referenced column)
    pub fn column_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.columns
            .iter()
            .zip(self.referenced_columns.iter())
            .map(|(s, t)| (s.as_str(), t.as_str()))
    }
}

/// Cached metadata for a table, view or class
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityInfo {
    pub object: ObjectRef,
    pub kind: TableType,
    pub is_partition: bool,
    pub is_hidden: bool,
    pub is_system: bool,
    pub columns: Vec<ColumnInfo>,
    pub primary_key: Option<PrimaryKeyInfo>,
    pub indexes: Vec<IndexInfo>,
    pub constraints: Vec<ConstraintInfo>,
    pub foreign_keys: Vec<ForeignKeyInfo>,
    pub comment: Option<String>,
    pub icon: Option<String>,
}

impl EntityInfo {
    pub fn new(object: ObjectRef, kind: TableType) -> Self {
        Self {
            object,
            kind,
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        self.object.name()
    }

    pub fn is_view(&self) -> bool {
        self.kind.is_view()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Columns of the best available identifying key.
    ///
    /// The primary key wins; otherwise a primary or unique index, then a
    /// unique constraint. Empty when the entity has no identifying key.
    pub fn best_identifier(&self) -> Vec<&str> {
        if let Some(pk) = &self.primary_key
            && !pk.columns.is_empty()
        {
            return pk.columns.iter().map(String::as_str).collect();
        }
        let index = self
            .indexes
            .iter()
            .find(|i| i.is_primary && !i.columns.is_empty())
            .or_else(|| {
                self.indexes
                    .iter()
                    .find(|i| i.is_unique && !i.columns.is_empty())
            });
        if let Some(index) = index {
            return index.columns.iter().map(String::as_str).collect();
        }
        self.constraints
            .iter()
            .find(|c| {
                matches!(
                    c.constraint_type,
                    ConstraintType::PrimaryKey | ConstraintType::Unique
                ) && !c.columns.is_empty()
            })
            .map(|c| c.columns.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Columns taking part in foreign keys or key constraints
    pub fn referential_columns(&self) -> HashSet<&str> {
        let mut columns: HashSet<&str> = self
            .foreign_keys
            .iter()
            .flat_map(|fk| fk.columns.iter().map(String::as_str))
            .collect();
        for constraint in &self.constraints {
            if constraint.constraint_type != ConstraintType::Check {
                columns.extend(constraint.columns.iter().map(String::as_str));
            }
        }
        columns
    }

    /// Columns referenced by a foreign key of this entity
    pub fn foreign_key_columns(&self) -> HashSet<&str> {
        self.foreign_keys
            .iter()
            .flat_map(|fk| fk.columns.iter().map(String::as_str))
            .collect()
    }
}

/// Kind of container node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerKind {
    DataSource,
    Catalog,
    #[default]
    Schema,
}

/// A catalog, schema or data source root that holds other objects
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerInfo {
    pub object: ObjectRef,
    pub kind: ContainerKind,
    /// Active navigator filter for the container's children
    pub name_filter: Option<NameFilter>,
}

impl ContainerInfo {
    pub fn new(object: ObjectRef, kind: ContainerKind) -> Self {
        Self {
            object,
            kind,
            name_filter: None,
        }
    }

    pub fn with_filter(mut self, filter: NameFilter) -> Self {
        self.name_filter = Some(filter);
        self
    }
}

/// A synonym pointing at another catalog object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasInfo {
    pub object: ObjectRef,
    pub target: ObjectRef,
}

/// Node in the catalog navigation tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum CatalogNode {
    Container(ContainerInfo),
    Entity(EntityInfo),
    Alias(AliasInfo),
}

impl CatalogNode {
    pub fn object(&self) -> &ObjectRef {
        match self {
            CatalogNode::Container(c) => &c.object,
            CatalogNode::Entity(e) => &e.object,
            CatalogNode::Alias(a) => &a.object,
        }
    }
}

/// Configured data source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSourceInfo {
    pub id: DataSourceId,
    pub name: String,
    pub project: ProjectId,
    #[serde(default)]
    pub rules: IdentifierRules,
    /// Filter applied to attribute names shown in diagrams
    #[serde(default)]
    pub attribute_filter: Option<NameFilter>,
}

impl DataSourceInfo {
    pub fn new(id: impl Into<DataSourceId>, project: impl Into<ProjectId>) -> Self {
        let id = id.into();
        Self {
            name: id.to_string(),
            id,
            project: project.into(),
            rules: IdentifierRules::default(),
            attribute_filter: None,
        }
    }

    pub fn with_rules(mut self, rules: IdentifierRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_attribute_filter(mut self, filter: NameFilter) -> Self {
        self.attribute_filter = Some(filter);
        self
    }
}
