//! Record use cases behind the list/show/create/update/delete commands

use crate::application::catalog;
use crate::application::store::ContentStore;
use crate::domain::collection::find_by_id;
use crate::domain::record::{new_id, today_stamp};
use crate::domain::{
    ApiResponse, Attachment, CbciMaterial, EvaluationMaterial, Grade, LessonMaterial, Notice,
    Record, RecordKind, ResearchMaterial, SchoolType,
};
use crate::error::{CbciError, Result};
use serde_json::{Map, Value};
use tracing::{debug, instrument};

/// `--data` argument: inline JSON object, or `@path` to a JSON file
pub fn parse_data(data: &str) -> Result<Map<String, Value>> {
    let text = match data.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)?,
        None => data.to_string(),
    };
    match serde_json::from_str(&text)? {
        Value::Object(map) => Ok(map),
        _ => Err(CbciError::Validation(
            "record data must be a JSON object".to_string(),
        )),
    }
}

/// Fill the fields the site stamps on new records
pub fn stamp_new(kind: RecordKind, fields: &mut Map<String, Value>) {
    let today = Value::String(today_stamp());
    fields
        .entry("id")
        .or_insert_with(|| Value::String(new_id()));
    fields.entry("createdAt").or_insert_with(|| today.clone());
    fields.entry("updatedAt").or_insert_with(|| today.clone());
    match kind {
        RecordKind::Notice | RecordKind::Research | RecordKind::Evaluation => {
            fields.entry("date").or_insert(today);
        }
        RecordKind::Lesson => {
            fields.entry("updated").or_insert(today);
        }
        RecordKind::Cbci => {}
    }
}

/// Decode loose fields into a typed record so serde fills the defaults
fn build<R: Record>(fields: Map<String, Value>, attachment: Option<Attachment>) -> Result<Value> {
    let mut record: R = serde_json::from_value(Value::Object(fields))
        .map_err(|e| CbciError::Validation(format!("malformed record: {}", e)))?;
    if let Some(attachment) = attachment {
        record.attach(attachment);
    }
    record.validate()?;
    Ok(serde_json::to_value(record)?)
}

fn to_values<R: Record>(response: ApiResponse<Vec<R>>) -> ApiResponse<Vec<Value>> {
    response.map(|records| {
        records
            .iter()
            .filter_map(|r| serde_json::to_value(r).ok())
            .collect()
    })
}

pub struct RecordService<'a> {
    store: &'a ContentStore,
}

impl<'a> RecordService<'a> {
    pub fn new(store: &'a ContentStore) -> Self {
        RecordService { store }
    }

    /// Records of a kind, optionally scoped to one school level and grade.
    ///
    /// Backend failures come back as a degraded, empty listing.
    pub async fn list(
        &self,
        kind: RecordKind,
        scope: Option<(SchoolType, Grade)>,
    ) -> Result<ApiResponse<Vec<Value>>> {
        let Some((school, grade)) = scope else {
            return Ok(self.store.list_documents(kind).await);
        };
        let store = self.store;
        Ok(match kind {
            RecordKind::Notice => {
                return Err(CbciError::Validation(
                    "notices are not organized by school and grade".to_string(),
                ))
            }
            RecordKind::Lesson => {
                to_values(catalog::by_school_grade::<LessonMaterial>(store, school, grade).await)
            }
            RecordKind::Research => {
                to_values(catalog::by_school_grade::<ResearchMaterial>(store, school, grade).await)
            }
            RecordKind::Evaluation => {
                to_values(catalog::by_school_grade::<EvaluationMaterial>(store, school, grade).await)
            }
            RecordKind::Cbci => {
                to_values(catalog::by_school_grade::<CbciMaterial>(store, school, grade).await)
            }
        })
    }

    /// One record by id. Opening research material counts a view.
    pub async fn show(&self, kind: RecordKind, id: &str) -> Result<Value> {
        if kind == RecordKind::Research {
            let opened = catalog::try_open_research(self.store, id).await?;
            return Ok(serde_json::to_value(opened)?);
        }
        let documents = self.store.try_list_documents(kind).await?;
        find_by_id(&documents, id)
            .cloned()
            .ok_or_else(|| CbciError::NotFound(kind.not_found_message()))
    }

    #[instrument(name = "record_create", skip_all, fields(kind = %kind))]
    pub async fn create(
        &self,
        kind: RecordKind,
        mut fields: Map<String, Value>,
        attachment: Option<Attachment>,
    ) -> Result<Value> {
        stamp_new(kind, &mut fields);
        let document = match kind {
            RecordKind::Notice => build::<Notice>(fields, attachment)?,
            RecordKind::Lesson => build::<LessonMaterial>(fields, attachment)?,
            RecordKind::Research => build::<ResearchMaterial>(fields, attachment)?,
            RecordKind::Evaluation => build::<EvaluationMaterial>(fields, attachment)?,
            RecordKind::Cbci => build::<CbciMaterial>(fields, attachment)?,
        };
        let created = self.store.try_create_document(kind, document).await?;
        debug!(id = created.get("id").and_then(serde_json::Value::as_str), "record created");
        Ok(created)
    }

    /// Merge `patch` into a record. A new attachment replaces the old one.
    #[instrument(name = "record_update", skip_all, fields(kind = %kind, id = %id))]
    pub async fn update(
        &self,
        kind: RecordKind,
        id: &str,
        mut patch: Map<String, Value>,
        attachment: Option<Attachment>,
    ) -> Result<Value> {
        patch.insert("updatedAt".to_string(), Value::String(today_stamp()));
        if let Some(attachment) = attachment {
            patch.extend(attachment.to_patch());
            if kind == RecordKind::Lesson {
                patch.insert("files".to_string(), Value::from(1));
            }
        }
        self.store
            .try_update_document(kind, id, Value::Object(patch))
            .await
    }

    pub async fn delete(&self, kind: RecordKind, id: &str) -> Result<()> {
        self.store.try_delete_document(kind, id).await
    }
}
