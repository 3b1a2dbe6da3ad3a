//! Where a value's versioning record lives for the duration of one operation.
//!
//! A record is either embedded in the value under a reserved field, or held
//! by the caller and lent to the store. Both sides implement
//! [`RecordSource`]; the store detaches the record, works on it, and hands
//! it back whether or not the operation succeeded.

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::error::{StoreError, StoreResult};
use crate::record::VersioningRecord;

/// Access to the versioning record of a value.
pub trait RecordSource {
    /// Detach the record, leaving `value` in the form that gets serialized.
    ///
    /// A value without a record yields an empty one.
    fn take(&mut self, value: &mut Value) -> StoreResult<VersioningRecord>;

    /// Give the (possibly updated) record back after an operation.
    fn restore(&mut self, value: &mut Value, record: VersioningRecord) -> StoreResult<()>;

    /// Attach a copy of `record` to a value reconstructed from history.
    ///
    /// Sources that keep the record outside the value do nothing.
    fn attach(&self, _value: &mut Value, _record: &VersioningRecord) -> StoreResult<()> {
        Ok(())
    }
}

/// Record stored in a reserved field of an object value.
#[derive(Clone, Copy, Debug)]
pub struct EmbeddedRecord<'a> {
    label: &'a str,
}

impl<'a> EmbeddedRecord<'a> {
    pub fn new(label: &'a str) -> Self {
        Self { label }
    }

    pub fn label(&self) -> &str {
        self.label
    }

    /// Read the record without detaching it.
    pub fn peek(&self, value: &Value) -> StoreResult<VersioningRecord> {
        let object = value.as_object().ok_or(StoreError::NotAnObject)?;
        match object.get(self.label) {
            None | Some(Value::Null) => Ok(VersioningRecord::default()),
            Some(raw) => parse_record(self.label, raw),
        }
    }
}

impl RecordSource for EmbeddedRecord<'_> {
    fn take(&mut self, value: &mut Value) -> StoreResult<VersioningRecord> {
        let object = value.as_object_mut().ok_or(StoreError::NotAnObject)?;
        match object.remove(self.label) {
            None | Some(Value::Null) => Ok(VersioningRecord::default()),
            Some(raw) => match parse_record(self.label, &raw) {
                Ok(record) => Ok(record),
                Err(e) => {
                    object.insert(self.label.to_string(), raw);
                    Err(e)
                }
            },
        }
    }

    fn restore(&mut self, value: &mut Value, record: VersioningRecord) -> StoreResult<()> {
        // A value that never had history stays free of the reserved field.
        if record == VersioningRecord::default() {
            return Ok(());
        }
        self.attach(value, &record)
    }

    fn attach(&self, value: &mut Value, record: &VersioningRecord) -> StoreResult<()> {
        let object = value.as_object_mut().ok_or(StoreError::NotAnObject)?;
        let raw =
            serde_json::to_value(record).map_err(|e| StoreError::MalformedRecord(e.to_string()))?;
        object.insert(self.label.to_string(), raw);
        Ok(())
    }
}

/// Record owned by the caller, outside the value.
#[derive(Debug)]
pub struct ExternalRecord<'r> {
    record: &'r mut VersioningRecord,
}

impl<'r> ExternalRecord<'r> {
    pub fn new(record: &'r mut VersioningRecord) -> Self {
        Self { record }
    }
}

impl RecordSource for ExternalRecord<'_> {
    fn take(&mut self, _value: &mut Value) -> StoreResult<VersioningRecord> {
        Ok(std::mem::take(self.record))
    }

    fn restore(&mut self, _value: &mut Value, record: VersioningRecord) -> StoreResult<()> {
        *self.record = record;
        Ok(())
    }
}

fn parse_record(label: &str, raw: &Value) -> StoreResult<VersioningRecord> {
    VersioningRecord::deserialize(raw).map_err(|e| {
        warn!(label, error = %e, "embedded versioning record is malformed");
        StoreError::MalformedRecord(e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::HistoryEntry;
    use chrono::Utc;
    use serde_json::json;

    fn sample_record() -> VersioningRecord {
        let mut record = VersioningRecord::new();
        record.append(HistoryEntry::created(Utc::now()));
        record.str_last = Some(r#"{"a":1}"#.into());
        record
    }

    #[test]
    fn embedded_take_detaches_field() {
        let mut value = json!({"a": 1, "versioning": serde_json::to_value(sample_record()).unwrap()});
        let mut source = EmbeddedRecord::new("versioning");

        let record = source.take(&mut value).unwrap();
        assert_eq!(record.len(), 1);
        assert_eq!(value, json!({"a": 1}));

        source.restore(&mut value, record).unwrap();
        assert!(value.get("versioning").is_some());
    }

    #[test]
    fn embedded_missing_or_null_is_empty() {
        let mut source = EmbeddedRecord::new("versioning");
        assert!(source.take(&mut json!({"a": 1})).unwrap().is_empty());

        let mut value = json!({"a": 1, "versioning": null});
        assert!(source.take(&mut value).unwrap().is_empty());
        assert_eq!(value, json!({"a": 1}));

        source.restore(&mut value, VersioningRecord::default()).unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn embedded_requires_object() {
        let mut source = EmbeddedRecord::new("versioning");
        assert_eq!(
            source.take(&mut json!([1, 2])).unwrap_err(),
            StoreError::NotAnObject
        );
        assert_eq!(
            source.peek(&json!("text")).unwrap_err(),
            StoreError::NotAnObject
        );
    }

    #[test]
    fn embedded_malformed_record_is_left_in_place() {
        let mut value = json!({"a": 1, "versioning": {"history": "nope"}});
        let mut source = EmbeddedRecord::new("versioning");

        let err = source.take(&mut value).unwrap_err();
        assert!(matches!(err, StoreError::MalformedRecord(_)));
        assert_eq!(value["versioning"], json!({"history": "nope"}));
    }

    #[test]
    fn embedded_peek_does_not_detach() {
        let value = json!({"a": 1, "meta": serde_json::to_value(sample_record()).unwrap()});
        let record = EmbeddedRecord::new("meta").peek(&value).unwrap();
        assert_eq!(record.len(), 1);
        assert_eq!(record.snapshot(), Some(r#"{"a":1}"#));
        assert!(value.get("meta").is_some());
    }

    #[test]
    fn external_take_and_restore() {
        let mut held = sample_record();
        let mut value = json!({"versioning": "untouched"});
        {
            let mut source = ExternalRecord::new(&mut held);
            let mut record = source.take(&mut value).unwrap();
            assert_eq!(record.len(), 1);
            record.append(HistoryEntry::deleted(Utc::now()));
            source.attach(&mut value, &record).unwrap();
            source.restore(&mut value, record).unwrap();
        }
        assert_eq!(held.len(), 2);
        assert_eq!(value, json!({"versioning": "untouched"}));
    }
}
