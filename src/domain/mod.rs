//! Domain layer - Records, kinds and the collection algorithm

pub mod attachment;
pub mod collection;
pub mod kind;
pub mod record;
pub mod response;
pub mod search;
pub mod thumbnail;

pub use attachment::{Attachment, FileType};
pub use kind::RecordKind;
pub use record::{
    CbciMaterial, EvaluationMaterial, Grade, LessonMaterial, Notice, Record, ResearchMaterial,
    SchoolType,
};
pub use response::ApiResponse;
pub use search::SearchHit;
