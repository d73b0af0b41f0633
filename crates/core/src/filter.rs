//! Structured filter/sort/limit grammar for meet-result queries.
//!
//! These types are the wire contract of the `get_meet_results` tool call:
//! the LLM emits JSON matching this shape and serde decodes it here. The
//! grammar is deliberately closed - a fixed operator set, AND-only clause
//! joining, no grouping - so the compiler can reason about every input.

use serde::{Deserialize, Serialize};

/// Comparison operator of one filter clause.
///
/// Wire spellings match the store's SQL dialect exactly; the enum is the
/// only path from wire text to query text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOperator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = "ILIKE")]
    Ilike,
    #[serde(rename = "NOT ILIKE")]
    NotIlike,
    #[serde(rename = "IS NULL")]
    IsNull,
    #[serde(rename = "IS NOT NULL")]
    IsNotNull,
}

impl FilterOperator {
    /// SQL spelling, safe to interpolate: the set is closed.
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Gte => ">=",
            Self::Lte => "<=",
            Self::Ilike => "ILIKE",
            Self::NotIlike => "NOT ILIKE",
            Self::IsNull => "IS NULL",
            Self::IsNotNull => "IS NOT NULL",
        }
    }

    /// Null checks compile without a bound parameter.
    pub fn requires_value(self) -> bool {
        !matches!(self, Self::IsNull | Self::IsNotNull)
    }

    /// Pattern operators wrap their bound value in `%` wildcards.
    pub fn is_pattern(self) -> bool {
        matches!(self, Self::Ilike | Self::NotIlike)
    }
}

/// A filter value as the tool call supplies it: string or number.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Number(f64),
    Text(String),
}

impl FilterValue {
    /// Render for parameter binding. Numbers use their shortest display
    /// form (`2024`, `23.5`), which the store parses back by declared type.
    pub fn render(&self) -> String {
        match self {
            Self::Number(value) => value.to_string(),
            Self::Text(value) => value.clone(),
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Self::Number(_))
    }
}

/// One `{column, operator, value?}` clause.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilterClause {
    pub column: String,
    pub operator: FilterOperator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<FilterValue>,
}

/// Sort direction; descending when the caller does not say otherwise.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    #[serde(rename = "ASC")]
    Asc,
    #[default]
    #[serde(rename = "DESC")]
    Desc,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Full query intent of one tool call: filters, ordering, and row limit.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuerySpec {
    #[serde(default)]
    pub filters: Vec<FilterClause>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_direction: Option<SortDirection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::{FilterOperator, FilterValue, QuerySpec, SortDirection};

    #[test]
    fn operators_deserialize_from_wire_spellings() {
        let op: FilterOperator = serde_json::from_str("\"NOT ILIKE\"").expect("decode");
        assert_eq!(op, FilterOperator::NotIlike);
        assert!(op.requires_value());
        assert!(op.is_pattern());

        let op: FilterOperator = serde_json::from_str("\"IS NULL\"").expect("decode");
        assert!(!op.requires_value());
        assert!(!op.is_pattern());
    }

    #[test]
    fn spec_decodes_original_tool_argument_shape() {
        let raw = serde_json::json!({
            "filters": [
                { "column": "Name", "operator": "ILIKE", "value": "Jakob" },
                { "column": "TotalKg", "operator": ">=", "value": 700.5 }
            ],
            "orderBy": "Date",
            "sortDirection": "DESC",
            "limit": 1
        });

        let spec: QuerySpec = serde_json::from_value(raw).expect("decode spec");
        assert_eq!(spec.filters.len(), 2);
        assert_eq!(spec.filters[1].value, Some(FilterValue::Number(700.5)));
        assert_eq!(spec.order_by.as_deref(), Some("Date"));
        assert_eq!(spec.sort_direction, Some(SortDirection::Desc));
        assert_eq!(spec.limit, Some(1));
    }

    #[test]
    fn empty_object_is_a_valid_spec() {
        let spec: QuerySpec = serde_json::from_str("{}").expect("decode empty");
        assert!(spec.filters.is_empty());
        assert!(spec.order_by.is_none());
        assert!(spec.limit.is_none());
    }

    #[test]
    fn number_rendering_drops_trailing_zero_fraction() {
        assert_eq!(FilterValue::Number(2024.0).render(), "2024");
        assert_eq!(FilterValue::Number(23.5).render(), "23.5");
        assert_eq!(FilterValue::Text("houston".into()).render(), "houston");
    }
}
