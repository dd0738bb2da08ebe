//! Typed records for each kind

use crate::domain::attachment::Attachment;
use crate::domain::kind::RecordKind;
use crate::error::{CbciError, Result};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// School level a material belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchoolType {
    #[default]
    Middle,
    High,
}

impl SchoolType {
    /// One-character Korean label (중 / 고)
    pub fn short_label(&self) -> &'static str {
        match self {
            SchoolType::Middle => "중",
            SchoolType::High => "고",
        }
    }
}

impl std::str::FromStr for SchoolType {
    type Err = CbciError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "middle" | "중" => Ok(SchoolType::Middle),
            "high" | "고" => Ok(SchoolType::High),
            _ => Err(CbciError::Validation(format!(
                "Invalid school type: {} (expected middle or high)",
                s
            ))),
        }
    }
}

/// Grade within a school level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Grade {
    #[default]
    #[serde(rename = "1")]
    First,
    #[serde(rename = "2")]
    Second,
    #[serde(rename = "3")]
    Third,
}

impl Grade {
    pub fn number(&self) -> u8 {
        match self {
            Grade::First => 1,
            Grade::Second => 2,
            Grade::Third => 3,
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

impl std::str::FromStr for Grade {
    type Err = CbciError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "1" => Ok(Grade::First),
            "2" => Ok(Grade::Second),
            "3" => Ok(Grade::Third),
            _ => Err(CbciError::Validation(format!(
                "Invalid grade: {} (expected 1, 2 or 3)",
                s
            ))),
        }
    }
}

/// Well-known evaluation statuses. The field itself stays free-form.
pub mod status {
    pub const PLANNED: &str = "예정";
    pub const IN_PROGRESS: &str = "진행중";
    pub const DONE: &str = "완료";
}

/// Timestamp-derived record id
pub fn new_id() -> String {
    Utc::now().timestamp_millis().to_string()
}

/// Today's date in the site's `YYYY.MM.DD` format
pub fn today_stamp() -> String {
    Utc::now().format("%Y.%m.%d").to_string()
}

fn require(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CbciError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

/// Behaviour shared by every record kind
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: RecordKind;

    fn id(&self) -> &str;
    fn title(&self) -> &str;
    fn content(&self) -> &str;
    fn attachment(&self) -> &Attachment;

    /// Replace the attached file (all four fields at once)
    fn attach(&mut self, attachment: Attachment);

    /// Check the fields the site requires before submission
    fn validate(&self) -> Result<()>;

    /// Category line shown in search results
    fn search_category(&self) -> String;

    /// School/grade scoping, None for unscoped kinds
    fn school_grade(&self) -> Option<(SchoolType, Grade)> {
        None
    }
}

/// Site notice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub date: String,
    #[serde(default = "default_notice_category")]
    pub category: String,
    #[serde(default)]
    pub important: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub attachment: Attachment,
}

fn default_notice_category() -> String {
    "공지".to_string()
}

impl Notice {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        let now = today_stamp();
        Notice {
            id: new_id(),
            title: title.into(),
            content: content.into(),
            date: now.clone(),
            category: default_notice_category(),
            important: false,
            created_at: Some(now.clone()),
            updated_at: Some(now),
            attachment: Attachment::default(),
        }
    }
}

impl Record for Notice {
    const KIND: RecordKind = RecordKind::Notice;

    fn id(&self) -> &str {
        &self.id
    }
    fn title(&self) -> &str {
        &self.title
    }
    fn content(&self) -> &str {
        &self.content
    }
    fn attachment(&self) -> &Attachment {
        &self.attachment
    }
    fn attach(&mut self, attachment: Attachment) {
        self.attachment = attachment;
    }

    fn validate(&self) -> Result<()> {
        require(&self.title, "title")?;
        require(&self.content, "content")
    }

    fn search_category(&self) -> String {
        self.category.clone()
    }
}

/// Per-grade lesson material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonMaterial {
    pub id: String,
    #[serde(default)]
    pub school_type: SchoolType,
    #[serde(default)]
    pub grade: Grade,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    /// Number of files in the catalog entry
    #[serde(default)]
    pub files: u32,
    #[serde(default)]
    pub updated: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge_understanding: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub attachment: Attachment,
}

impl LessonMaterial {
    pub fn new(
        school_type: SchoolType,
        grade: Grade,
        unit: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        let now = today_stamp();
        LessonMaterial {
            id: new_id(),
            school_type,
            grade,
            unit: unit.into(),
            title: title.into(),
            content: String::new(),
            files: 0,
            updated: now.clone(),
            link: None,
            content_system: None,
            knowledge_understanding: None,
            created_at: Some(now.clone()),
            updated_at: Some(now),
            attachment: Attachment::default(),
        }
    }
}

impl Record for LessonMaterial {
    const KIND: RecordKind = RecordKind::Lesson;

    fn id(&self) -> &str {
        &self.id
    }
    fn title(&self) -> &str {
        &self.title
    }
    fn content(&self) -> &str {
        &self.content
    }
    fn attachment(&self) -> &Attachment {
        &self.attachment
    }
    fn attach(&mut self, attachment: Attachment) {
        self.files = u32::from(attachment.file_data.is_some());
        self.attachment = attachment;
    }

    fn validate(&self) -> Result<()> {
        require(&self.title, "title")?;
        require(&self.unit, "unit")
    }

    fn search_category(&self) -> String {
        format!(
            "수업자료 - {}{}",
            self.school_type.short_label(),
            self.grade
        )
    }

    fn school_grade(&self) -> Option<(SchoolType, Grade)> {
        Some((self.school_type, self.grade))
    }
}

/// Research (inquiry) material with a view counter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchMaterial {
    pub id: String,
    #[serde(default)]
    pub school_type: SchoolType,
    #[serde(default)]
    pub grade: Grade,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default = "default_author")]
    pub author: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub views: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge_understanding: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub attachment: Attachment,
}

fn default_author() -> String {
    "MASTER".to_string()
}

impl ResearchMaterial {
    pub fn new(
        school_type: SchoolType,
        grade: Grade,
        unit: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        let now = today_stamp();
        ResearchMaterial {
            id: new_id(),
            school_type,
            grade,
            unit: unit.into(),
            title: title.into(),
            content: String::new(),
            author: default_author(),
            date: now.clone(),
            views: 0,
            link: None,
            content_system: None,
            knowledge_understanding: None,
            created_at: Some(now.clone()),
            updated_at: Some(now),
            attachment: Attachment::default(),
        }
    }
}

impl Record for ResearchMaterial {
    const KIND: RecordKind = RecordKind::Research;

    fn id(&self) -> &str {
        &self.id
    }
    fn title(&self) -> &str {
        &self.title
    }
    fn content(&self) -> &str {
        &self.content
    }
    fn attachment(&self) -> &Attachment {
        &self.attachment
    }
    fn attach(&mut self, attachment: Attachment) {
        self.attachment = attachment;
    }

    fn validate(&self) -> Result<()> {
        require(&self.title, "title")?;
        require(&self.unit, "unit")
    }

    fn search_category(&self) -> String {
        format!(
            "탐구자료 - {}{} - {}",
            self.school_type.short_label(),
            self.grade,
            self.author
        )
    }

    fn school_grade(&self) -> Option<(SchoolType, Grade)> {
        Some((self.school_type, self.grade))
    }
}

/// Evaluation material (tests, performance assessments, …)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationMaterial {
    pub id: String,
    #[serde(default)]
    pub school_type: SchoolType,
    #[serde(default)]
    pub grade: Grade,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(rename = "type", default = "default_evaluation_type")]
    pub evaluation_type: String,
    #[serde(default)]
    pub date: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge_understanding: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub attachment: Attachment,
}

fn default_evaluation_type() -> String {
    "시험".to_string()
}

fn default_status() -> String {
    status::PLANNED.to_string()
}

impl EvaluationMaterial {
    pub fn new(school_type: SchoolType, grade: Grade, title: impl Into<String>) -> Self {
        let now = today_stamp();
        EvaluationMaterial {
            id: new_id(),
            school_type,
            grade,
            title: title.into(),
            content: String::new(),
            evaluation_type: default_evaluation_type(),
            date: now.clone(),
            status: default_status(),
            link: None,
            content_system: None,
            knowledge_understanding: None,
            created_at: Some(now.clone()),
            updated_at: Some(now),
            attachment: Attachment::default(),
        }
    }
}

impl Record for EvaluationMaterial {
    const KIND: RecordKind = RecordKind::Evaluation;

    fn id(&self) -> &str {
        &self.id
    }
    fn title(&self) -> &str {
        &self.title
    }
    fn content(&self) -> &str {
        &self.content
    }
    fn attachment(&self) -> &Attachment {
        &self.attachment
    }
    fn attach(&mut self, attachment: Attachment) {
        self.attachment = attachment;
    }

    fn validate(&self) -> Result<()> {
        require(&self.title, "title")
    }

    fn search_category(&self) -> String {
        format!("평가자료 - {} - {}", self.evaluation_type, self.status)
    }

    fn school_grade(&self) -> Option<(SchoolType, Grade)> {
        Some((self.school_type, self.grade))
    }
}

/// Concept-based curriculum design artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CbciMaterial {
    pub id: String,
    #[serde(default)]
    pub school_type: SchoolType,
    #[serde(default)]
    pub grade: Grade,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub deadline: String,
    /// Percentage; only the UI bounds it to 0..=100
    #[serde(default)]
    pub progress: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge_understanding: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub attachment: Attachment,
}

impl CbciMaterial {
    pub fn new(
        school_type: SchoolType,
        grade: Grade,
        unit: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        let now = today_stamp();
        CbciMaterial {
            id: new_id(),
            school_type,
            grade,
            unit: unit.into(),
            title: title.into(),
            content: String::new(),
            description: String::new(),
            deadline: String::new(),
            progress: 0,
            link: None,
            content_system: None,
            knowledge_understanding: None,
            created_at: Some(now.clone()),
            updated_at: Some(now),
            attachment: Attachment::default(),
        }
    }
}

impl Record for CbciMaterial {
    const KIND: RecordKind = RecordKind::Cbci;

    fn id(&self) -> &str {
        &self.id
    }
    fn title(&self) -> &str {
        &self.title
    }
    fn content(&self) -> &str {
        &self.content
    }
    fn attachment(&self) -> &Attachment {
        &self.attachment
    }
    fn attach(&mut self, attachment: Attachment) {
        self.attachment = attachment;
    }

    fn validate(&self) -> Result<()> {
        require(&self.title, "title")?;
        require(&self.unit, "unit")
    }

    fn search_category(&self) -> String {
        format!("CBCI 설계 - {}", self.description)
    }

    fn school_grade(&self) -> Option<(SchoolType, Grade)> {
        Some((self.school_type, self.grade))
    }
}
