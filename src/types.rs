//! Core data model types for ingestion.
//!
//! Uploads are extracted according to an [`ExtractionSchema`] (required header labels plus a
//! fixed column position and cleanup rule per output key) into a [`ResultSet`] of [`Row`]s.

use std::collections::HashSet;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{IngestionError, IngestionResult};

const DEFAULT_MISMATCH_MESSAGE: &str = "Os títulos das colunas não estão no padrão esperado: \
     Documento, Razão social, Cep, Produto, Numero do pedido e Data";

/// How a raw cell is turned into the stored value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum CellRule {
    /// Keep the cell text unchanged.
    #[default]
    Raw,
    /// Remove every occurrence of the listed characters.
    Strip { chars: String },
    /// Interpret the cell as an OLE Automation serial date (epoch 1899-12-30).
    ///
    /// Unparseable cells fall back to 1900-01-01, so these columns are always populated.
    OleDate,
}

impl CellRule {
    /// Whether the rule yields a value even for an empty cell.
    pub fn always_populated(&self) -> bool {
        matches!(self, Self::OleDate)
    }
}

/// A single extracted column: where it is read from and what it is called.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Label that must appear somewhere in the header row.
    pub header: String,
    /// Key used in the extracted [`Row`].
    pub key: String,
    /// 1-based column the value is read from.
    pub position: usize,
    /// Cleanup applied to the cell text.
    #[serde(default)]
    pub rule: CellRule,
}

impl ColumnSpec {
    /// Create a new column spec.
    pub fn new(header: impl Into<String>, key: impl Into<String>, position: usize, rule: CellRule) -> Self {
        Self {
            header: header.into(),
            key: key.into(),
            position,
            rule,
        }
    }
}

/// Header validation and extraction layout for uploaded spreadsheets.
///
/// Validation only checks that every [`ColumnSpec::header`] is present in the header row, in
/// any order. Extraction reads the fixed [`ColumnSpec::position`]s regardless of where those
/// headers actually sit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionSchema {
    /// Ordered column layout; output rows keep this key order.
    pub columns: Vec<ColumnSpec>,
    /// Message used for [`IngestionError::SchemaMismatch`]. Derived from the headers if unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mismatch_message: Option<String>,
}

impl Default for ExtractionSchema {
    /// The order upload layout: document, company name, postal code, product, order number
    /// and date in columns 1 to 6.
    fn default() -> Self {
        Self {
            columns: vec![
                ColumnSpec::new("Documento", "Documento", 1, CellRule::Strip { chars: ".-".to_string() }),
                ColumnSpec::new("Razão Social", "Razão social", 2, CellRule::Raw),
                ColumnSpec::new("CEP", "CEP", 3, CellRule::Strip { chars: "-".to_string() }),
                ColumnSpec::new("Produto", "Produto", 4, CellRule::Raw),
                ColumnSpec::new("Número do pedido", "Número do pedido", 5, CellRule::Raw),
                ColumnSpec::new("Data", "Data", 6, CellRule::OleDate),
            ],
            mismatch_message: Some(DEFAULT_MISMATCH_MESSAGE.to_string()),
        }
    }
}

impl ExtractionSchema {
    /// Create a schema from columns, with a mismatch message derived from the headers.
    pub fn new(columns: Vec<ColumnSpec>) -> Self {
        Self {
            columns,
            mismatch_message: None,
        }
    }

    /// Decode a schema from JSON and validate it.
    pub fn from_json_str(json: &str) -> IngestionResult<Self> {
        let schema: Self = serde_json::from_str(json)?;
        schema.validate()?;
        Ok(schema)
    }

    /// Iterate required header labels in order.
    pub fn required_headers(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.header.as_str())
    }

    /// Iterate output keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.key.as_str())
    }

    /// Message reported when the header row lacks required labels.
    pub fn mismatch_message(&self) -> String {
        match &self.mismatch_message {
            Some(message) => message.clone(),
            None => format!(
                "Os títulos das colunas não estão no padrão esperado: {}",
                self.required_headers().collect::<Vec<_>>().join(", ")
            ),
        }
    }

    /// Reject layouts that cannot produce well-formed rows.
    ///
    /// Columns must be non-empty, positions 1-based, keys and positions unique.
    pub fn validate(&self) -> IngestionResult<()> {
        if self.columns.is_empty() {
            return Err(invalid_config("schema has no columns"));
        }

        let mut keys = HashSet::new();
        let mut positions = HashSet::new();
        for c in &self.columns {
            if c.position == 0 {
                return Err(invalid_config(format!(
                    "column '{}' has position 0 (positions are 1-based)",
                    c.key
                )));
            }
            if !keys.insert(c.key.as_str()) {
                return Err(invalid_config(format!("duplicate key '{}'", c.key)));
            }
            if !positions.insert(c.position) {
                return Err(invalid_config(format!(
                    "position {} is used by more than one column",
                    c.position
                )));
            }
        }
        Ok(())
    }
}

fn invalid_config(message: impl Into<String>) -> IngestionError {
    IngestionError::InvalidConfig {
        message: message.into(),
    }
}

/// One extracted data row: output key -> cell value, in schema order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Row {
    fields: Vec<(String, Option<String>)>,
}

impl Row {
    /// Create a row from `(key, value)` pairs.
    pub fn new(fields: Vec<(String, Option<String>)>) -> Self {
        Self { fields }
    }

    /// Value stored under `key`. `None` if the key is unknown or the cell was empty.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_deref())
    }

    /// Whether the row carries `key` at all.
    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.iter().any(|(k, _)| k == key)
    }

    /// Iterate `(key, value)` pairs in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    /// Number of keys in the row.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the row has no keys.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Rows extracted from a batch of uploads, in file order then row order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct ResultSet {
    rows: Vec<Row>,
}

impl ResultSet {
    /// Create a result set from rows.
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    /// Append rows from one worksheet.
    pub fn extend(&mut self, rows: impl IntoIterator<Item = Row>) {
        self.rows.extend(rows);
    }

    /// Render as a JSON array of objects, keys in schema order.
    pub fn to_json(&self) -> IngestionResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}
