//! Decoding of BigQuery query responses. The REST API returns every cell as
//! a string wrapped in `{"f": [{"v": ...}]}` envelopes; this module walks the
//! response schema and rebuilds plain JSON objects that deserialize straight
//! into the row structs.

use serde::Deserialize;
use serde_json::Map;
use serde_json::Value;

#[derive(Clone, Debug, Deserialize)]
pub struct QueryField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub fields: Vec<QueryField>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct QuerySchema {
    pub fields: Vec<QueryField>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    #[serde(default)]
    pub job_complete: Option<bool>,
    #[serde(default)]
    pub schema: Option<QuerySchema>,
    #[serde(default)]
    pub rows: Option<Vec<Value>>,
}

fn decode_scalar(field: &QueryField, value: &Value) -> Result<Value, String> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    match field.field_type.as_str() {
        "RECORD" | "STRUCT" => {
            let cells = value
                .get("f")
                .and_then(Value::as_array)
                .ok_or_else(|| format!("field {} is not a record", field.name))?;
            decode_cells(&field.fields, cells)
        }
        "BOOLEAN" | "BOOL" => match value.as_str() {
            Some("true") => Ok(Value::Bool(true)),
            Some("false") => Ok(Value::Bool(false)),
            _ => Err(format!("field {} is not a boolean: {value}", field.name)),
        },
        "INTEGER" | "INT64" => value
            .as_str()
            .and_then(|s| s.parse::<i64>().ok())
            .map(Value::from)
            .ok_or_else(|| format!("field {} is not an integer: {value}", field.name)),
        "FLOAT" | "FLOAT64" => value
            .as_str()
            .and_then(|s| s.parse::<f64>().ok())
            .map(Value::from)
            .ok_or_else(|| format!("field {} is not a float: {value}", field.name)),
        // STRING, DATE, TIMESTAMP and friends all stay textual.
        _ => value
            .as_str()
            .map(|s| Value::String(s.to_string()))
            .ok_or_else(|| format!("field {} is not a string: {value}", field.name)),
    }
}

fn decode_field(field: &QueryField, value: &Value) -> Result<Value, String> {
    if field.mode.as_deref() == Some("REPEATED") {
        if value.is_null() {
            return Ok(Value::Array(Vec::new()));
        }
        let items = value
            .as_array()
            .ok_or_else(|| format!("field {} is not repeated: {value}", field.name))?;
        let decoded = items
            .iter()
            .map(|item| decode_scalar(field, item.get("v").unwrap_or(&Value::Null)))
            .collect::<Result<Vec<Value>, String>>()?;
        return Ok(Value::Array(decoded));
    }
    decode_scalar(field, value)
}

fn decode_cells(fields: &[QueryField], cells: &[Value]) -> Result<Value, String> {
    if fields.len() != cells.len() {
        return Err(format!(
            "schema has {} fields but row has {} cells",
            fields.len(),
            cells.len()
        ));
    }
    let mut object = Map::new();
    for (field, cell) in fields.iter().zip(cells) {
        let raw = cell.get("v").unwrap_or(&Value::Null);
        object.insert(field.name.clone(), decode_field(field, raw)?);
    }
    Ok(Value::Object(object))
}

/// Turns a query response into one plain JSON object per row.
pub fn decode_response(response: &QueryResponse) -> Result<Vec<Value>, String> {
    let Some(schema) = &response.schema else {
        return Ok(Vec::new());
    };
    let Some(rows) = &response.rows else {
        return Ok(Vec::new());
    };
    rows.iter()
        .map(|row| {
            let cells = row
                .get("f")
                .and_then(Value::as_array)
                .ok_or_else(|| format!("row is not a cell list: {row}"))?;
            decode_cells(&schema.fields, cells)
        })
        .collect()
}
