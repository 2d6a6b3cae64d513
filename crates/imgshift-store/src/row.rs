//! Wire shapes exchanged with `PostgREST`.

use imgshift_core::ProductRecord;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub(crate) const RECORD_COLUMNS: &str = "id,name,image";
pub(crate) const ID_COLUMN: &str = "id";

/// Row as returned by `select=id,name,image`; the id column may be numeric or textual.
#[derive(Debug, Deserialize)]
pub(crate) struct RecordRow {
    id: Value,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    image: Option<String>,
}

/// Row as returned by `select=id`.
#[derive(Debug, Deserialize)]
pub(crate) struct IdRow {
    id: Value,
}

/// Body of the image write-back.
#[derive(Debug, Serialize)]
pub(crate) struct ImagePatch<'a> {
    pub(crate) image: &'a str,
}

/// `PostgREST` error body; only the message is surfaced.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    message: Option<String>,
}

impl RecordRow {
    pub(crate) fn into_record(self) -> Result<ProductRecord, UnsupportedId> {
        Ok(ProductRecord::new(
            render_id(self.id)?,
            self.name.unwrap_or_default(),
            self.image,
        ))
    }
}

impl IdRow {
    pub(crate) fn into_id(self) -> Result<String, UnsupportedId> {
        render_id(self.id)
    }
}

/// Id column held something other than a string or a number.
#[derive(Debug, thiserror::Error)]
#[error("unsupported id value {0}")]
pub(crate) struct UnsupportedId(Value);

fn render_id(id: Value) -> Result<String, UnsupportedId> {
    match id {
        Value::String(text) => Ok(text),
        Value::Number(number) => Ok(number.to_string()),
        other => Err(UnsupportedId(other)),
    }
}

/// Best message for a failed response: the `PostgREST` `message`, the raw body, or nothing.
pub(crate) fn failure_message(body: &[u8]) -> String {
    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.message)
        .unwrap_or_else(|| String::from_utf8_lossy(body).trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_and_text_ids_render_as_strings() -> Result<(), Box<dyn std::error::Error>> {
        let numeric: RecordRow =
            serde_json::from_value(json!({"id": 42, "name": "Mug", "image": null}))?;
        let record = numeric.into_record()?;
        assert_eq!(record.id, "42");
        assert_eq!(record.image, None);

        let text: IdRow = serde_json::from_value(json!({"id": "a1b2"}))?;
        assert_eq!(text.into_id()?, "a1b2");
        Ok(())
    }

    #[test]
    fn missing_name_defaults_to_empty() -> Result<(), Box<dyn std::error::Error>> {
        let row: RecordRow = serde_json::from_value(json!({"id": 7, "image": "data:x"}))?;
        let record = row.into_record()?;
        assert_eq!(record.name, "");
        assert_eq!(record.image.as_deref(), Some("data:x"));
        Ok(())
    }

    #[test]
    fn structured_ids_are_rejected() -> Result<(), serde_json::Error> {
        let row: IdRow = serde_json::from_value(json!({"id": {"nested": true}}))?;
        assert!(row.into_id().is_err());
        Ok(())
    }

    #[test]
    fn failure_message_prefers_postgrest_message() {
        assert_eq!(
            failure_message(br#"{"code":"42P01","message":"relation does not exist"}"#),
            "relation does not exist"
        );
        assert_eq!(failure_message(b"  bad gateway \n"), "bad gateway");
    }
}
