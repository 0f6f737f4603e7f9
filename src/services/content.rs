use std::collections::HashMap;

use crate::db::models::{SectionContent, TestContent};

/// Rewrites every upload-file id in the exam tree to a servable URL before
/// the content is handed to a student. Ids without a mapping are dropped
/// rather than leaked to the client.
pub(crate) fn resolve_file_urls(content: &TestContent, urls: &HashMap<String, String>) -> TestContent {
    let mut resolved = content.clone();

    for section in [
        &mut resolved.reading.sections.one,
        &mut resolved.reading.sections.two,
        &mut resolved.reading.sections.three,
        &mut resolved.reading.sections.four,
        &mut resolved.writing.sections.one,
        &mut resolved.writing.sections.two,
    ] {
        resolve_section(section, urls);
    }

    resolved.listening.files = map_files(&resolved.listening.files, urls);

    resolved
}

fn resolve_section(section: &mut SectionContent, urls: &HashMap<String, String>) {
    section.files = map_files(&section.files, urls);
}

fn map_files(files: &[String], urls: &HashMap<String, String>) -> Vec<String> {
    files
        .iter()
        .filter_map(|id| {
            let url = urls.get(id).cloned();
            if url.is_none() {
                tracing::warn!(file_id = %id, "No servable URL for referenced upload file");
            }
            url
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_rewrites_every_section() {
        let mut content = TestContent::default();
        content.reading.sections.three.files = vec!["f1".to_string()];
        content.listening.files = vec!["f2".to_string()];
        content.writing.sections.one.files = vec!["f3".to_string(), "ghost".to_string()];

        let urls = HashMap::from([
            ("f1".to_string(), "https://cdn/reading.png".to_string()),
            ("f2".to_string(), "https://cdn/audio.mp3".to_string()),
            ("f3".to_string(), "https://cdn/chart.png".to_string()),
        ]);

        let resolved = resolve_file_urls(&content, &urls);

        assert_eq!(resolved.reading.sections.three.files, vec!["https://cdn/reading.png"]);
        assert_eq!(resolved.listening.files, vec!["https://cdn/audio.mp3"]);
        // The unmapped id is dropped, not passed through.
        assert_eq!(resolved.writing.sections.one.files, vec!["https://cdn/chart.png"]);
        // The source tree is untouched.
        assert_eq!(content.writing.sections.one.files.len(), 2);
    }
}
