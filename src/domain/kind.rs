//! Record kinds and their storage keys

use crate::domain::record::{
    CbciMaterial, EvaluationMaterial, LessonMaterial, Notice, Record, ResearchMaterial,
};
use crate::error::{CbciError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// The five record categories of the site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Notice,
    Lesson,
    Research,
    Evaluation,
    Cbci,
}

impl RecordKind {
    /// All kinds in the order the site presents them
    pub fn all() -> [RecordKind; 5] {
        [
            RecordKind::Notice,
            RecordKind::Lesson,
            RecordKind::Research,
            RecordKind::Evaluation,
            RecordKind::Cbci,
        ]
    }

    /// Key of the collection in the local store
    pub fn storage_key(&self) -> &'static str {
        self.route()
    }

    /// Path segment of the kind's HTTP routes
    pub fn route(&self) -> &'static str {
        match self {
            RecordKind::Notice => "notices",
            RecordKind::Lesson => "lessons",
            RecordKind::Research => "research",
            RecordKind::Evaluation => "evaluations",
            RecordKind::Cbci => "cbci",
        }
    }

    /// Key of the collection in the server-side KV table
    pub fn remote_key(&self) -> &'static str {
        match self {
            RecordKind::Notice => "notices",
            RecordKind::Lesson => "lessonMaterials",
            RecordKind::Research => "researchMaterials",
            RecordKind::Evaluation => "evaluationMaterials",
            RecordKind::Cbci => "cbciMaterials",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            RecordKind::Notice => "Notice",
            RecordKind::Lesson => "Lesson",
            RecordKind::Research => "Research",
            RecordKind::Evaluation => "Evaluation",
            RecordKind::Cbci => "CBCI",
        }
    }

    /// Error message used when an id is missing from the collection
    pub fn not_found_message(&self) -> String {
        format!("{} not found", self.label())
    }

    /// Tab title shown on the site
    pub fn display_name(&self) -> &'static str {
        match self {
            RecordKind::Notice => "공지사항",
            RecordKind::Lesson => "수업자료",
            RecordKind::Research => "탐구자료",
            RecordKind::Evaluation => "평가자료",
            RecordKind::Cbci => "CBCI 설계",
        }
    }

    /// Decode a stored document as this kind's record and validate it.
    pub fn check_document(&self, document: &Value) -> Result<()> {
        self.normalize_document(document).map(|_| ())
    }

    /// Decode, validate and re-encode a document so every defaulted field is
    /// materialized. Fields the record does not know are dropped.
    pub fn normalize_document(&self, document: &Value) -> Result<Value> {
        fn normalize<R: Record>(document: &Value) -> Result<Value> {
            let record: R = serde_json::from_value(document.clone())
                .map_err(|e| CbciError::Validation(format!("malformed record: {}", e)))?;
            record.validate()?;
            Ok(serde_json::to_value(&record)?)
        }

        match self {
            RecordKind::Notice => normalize::<Notice>(document),
            RecordKind::Lesson => normalize::<LessonMaterial>(document),
            RecordKind::Research => normalize::<ResearchMaterial>(document),
            RecordKind::Evaluation => normalize::<EvaluationMaterial>(document),
            RecordKind::Cbci => normalize::<CbciMaterial>(document),
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.route())
    }
}

impl FromStr for RecordKind {
    type Err = CbciError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "notices" | "notice" => Ok(RecordKind::Notice),
            "lessons" | "lesson" | "lessonmaterials" => Ok(RecordKind::Lesson),
            "research" | "researchmaterials" => Ok(RecordKind::Research),
            "evaluations" | "evaluation" | "evaluationmaterials" => Ok(RecordKind::Evaluation),
            "cbci" | "cbcimaterials" => Ok(RecordKind::Cbci),
            _ => Err(CbciError::UnknownKind(s.to_string())),
        }
    }
}
