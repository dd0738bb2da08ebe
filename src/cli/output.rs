//! Output formatting utilities

use crate::application::SessionStatus;
use crate::domain::{RecordKind, SchoolType, SearchHit};
use serde_json::Value;

fn field<'a>(document: &'a Value, name: &str) -> &'a str {
    document.get(name).and_then(Value::as_str).unwrap_or("")
}

fn school_grade(document: &Value) -> String {
    let school = match field(document, "schoolType") {
        "high" => SchoolType::High,
        _ => SchoolType::Middle,
    };
    format!("{}{}", school.short_label(), field(document, "grade"))
}

/// Short per-kind description shown between id and title
fn meta(kind: RecordKind, document: &Value) -> String {
    match kind {
        RecordKind::Notice => {
            let important = document
                .get("important")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            format!(
                "{} [{}]{}",
                field(document, "date"),
                field(document, "category"),
                if important { " !" } else { "" }
            )
        }
        RecordKind::Lesson => format!("{} {}", school_grade(document), field(document, "unit")),
        RecordKind::Research => format!(
            "{} {} by {} ({} views)",
            school_grade(document),
            field(document, "unit"),
            field(document, "author"),
            document.get("views").and_then(Value::as_u64).unwrap_or(0)
        ),
        RecordKind::Evaluation => format!(
            "{} {} {}",
            school_grade(document),
            field(document, "type"),
            field(document, "status")
        ),
        RecordKind::Cbci => format!(
            "{} {} {}%",
            school_grade(document),
            field(document, "unit"),
            document.get("progress").and_then(Value::as_i64).unwrap_or(0)
        ),
    }
}

/// Format records of one kind for display
pub fn format_record_list(kind: RecordKind, documents: &[Value]) -> String {
    if documents.is_empty() {
        return format!("No {} found", kind);
    }

    let mut output = String::new();
    for document in documents {
        let attached = if document.get("fileData").is_some() { "  📎" } else { "" };
        output.push_str(&format!(
            "{}  {}  {}{}\n",
            field(document, "id"),
            meta(kind, document),
            field(document, "title"),
            attached
        ));
    }
    output
}

/// Format search hits for display
pub fn format_search_hits(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return "No matches found".to_string();
    }

    let mut output = String::new();
    for hit in hits {
        output.push_str(&format!(
            "[{}] {}  ({})\n    {} {}\n",
            hit.kind.display_name(),
            hit.title,
            hit.category,
            hit.kind,
            hit.id
        ));
    }
    output
}

pub fn format_session(status: &SessionStatus) -> String {
    match (status.is_logged_in, status.is_master) {
        (false, _) => "Not logged in".to_string(),
        (true, true) => format!(
            "Logged in as {} (administrator)",
            status.user.as_deref().unwrap_or("master")
        ),
        (true, false) => format!(
            "Logged in as {}",
            status.user.as_deref().unwrap_or("unknown user")
        ),
    }
}
