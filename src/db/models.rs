use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::{SectionId, UserRole};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct User {
    pub(crate) id: String,
    pub(crate) phone_number: String,
    pub(crate) hashed_password: String,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) role: UserRole,
    pub(crate) is_active: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// One authored section: a prompt rendered by the client plus attached
/// media. `files` holds upload-file ids in the authored document and gets
/// rewritten to servable URLs when a test is handed to a student.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct SectionContent {
    #[serde(default)]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) content: String,
    #[serde(default)]
    pub(crate) files: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct ReadingSections {
    pub(crate) one: SectionContent,
    pub(crate) two: SectionContent,
    pub(crate) three: SectionContent,
    pub(crate) four: SectionContent,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct ReadingContent {
    pub(crate) sections: ReadingSections,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct ListeningContent {
    #[serde(default)]
    pub(crate) content: String,
    #[serde(default)]
    pub(crate) files: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct WritingSections {
    pub(crate) one: SectionContent,
    pub(crate) two: SectionContent,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct WritingContent {
    pub(crate) sections: WritingSections,
}

/// The full exam document: four reading passages, one listening part, two
/// writing tasks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct TestContent {
    pub(crate) reading: ReadingContent,
    pub(crate) listening: ListeningContent,
    pub(crate) writing: WritingContent,
}

impl TestContent {
    pub(crate) fn section(&self, id: SectionId) -> (&str, &[String]) {
        match id {
            SectionId::ReadingOne => {
                (&self.reading.sections.one.content, &self.reading.sections.one.files)
            }
            SectionId::ReadingTwo => {
                (&self.reading.sections.two.content, &self.reading.sections.two.files)
            }
            SectionId::ReadingThree => {
                (&self.reading.sections.three.content, &self.reading.sections.three.files)
            }
            SectionId::ReadingFour => {
                (&self.reading.sections.four.content, &self.reading.sections.four.files)
            }
            SectionId::Listening => (&self.listening.content, &self.listening.files),
            SectionId::WritingOne => {
                (&self.writing.sections.one.content, &self.writing.sections.one.files)
            }
            SectionId::WritingTwo => {
                (&self.writing.sections.two.content, &self.writing.sections.two.files)
            }
        }
    }

    /// Every upload-file id referenced anywhere in the tree.
    pub(crate) fn file_ids(&self) -> Vec<String> {
        SectionId::ALL
            .into_iter()
            .flat_map(|section| self.section(section).1.iter().cloned())
            .collect()
    }

    /// Per-section content snapshot captured when a session starts, kept
    /// for the before/after display on results.
    pub(crate) fn section_snapshots(&self) -> BTreeMap<String, String> {
        SectionId::ALL
            .into_iter()
            .map(|section| (section.as_str().to_string(), self.section(section).0.to_string()))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct MockTest {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) content: Json<TestContent>,
    pub(crate) created_by: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct UploadFile {
    pub(crate) id: String,
    pub(crate) object_key: String,
    pub(crate) original_name: String,
    pub(crate) content_type: String,
    pub(crate) size_bytes: i64,
    pub(crate) sha256: String,
    pub(crate) uploaded_by: String,
    pub(crate) created_at: PrimitiveDateTime,
}

/// Single-use credential binding one user to one test. Only the SHA-256 of
/// the plaintext key is stored; redemption deletes the row atomically.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct AccessKey {
    pub(crate) id: String,
    pub(crate) key_hash: String,
    pub(crate) user_id: String,
    pub(crate) test_id: String,
    pub(crate) created_by: String,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct TestResult {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) test_id: String,
    pub(crate) test_title: String,
    pub(crate) test_key: String,
    pub(crate) started_at: PrimitiveDateTime,
    pub(crate) ended_at: PrimitiveDateTime,
    pub(crate) duration_seconds: i64,
    pub(crate) initial_html: Json<BTreeMap<String, String>>,
    pub(crate) final_html: Json<BTreeMap<String, String>>,
    pub(crate) completed_at: PrimitiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_content() -> TestContent {
        let mut content = TestContent::default();
        content.reading.sections.one = SectionContent {
            title: "Passage 1".to_string(),
            content: "<p>Read the passage.</p>".to_string(),
            files: vec!["file-a".to_string()],
        };
        content.listening.content = "<p>Listen carefully.</p>".to_string();
        content.listening.files = vec!["file-b".to_string(), "file-c".to_string()];
        content.writing.sections.two.files = vec!["file-d".to_string()];
        content
    }

    #[test]
    fn file_ids_walk_the_whole_tree() {
        let content = sample_content();
        assert_eq!(content.file_ids(), vec!["file-a", "file-b", "file-c", "file-d"]);
    }

    #[test]
    fn section_snapshots_cover_every_section() {
        let snapshots = sample_content().section_snapshots();
        assert_eq!(snapshots.len(), SectionId::ALL.len());
        assert_eq!(snapshots["reading_one"], "<p>Read the passage.</p>");
        assert_eq!(snapshots["writing_two"], "");
    }
}
