use scraper::Html;
use std::collections::HashSet;
use uuid::Uuid;

use crate::record::{NormalizedRecord, RawRecord};

/// Converts raw announcement records into canonical ones: markup stripped,
/// whitespace collapsed, stable id assigned, words counted. Input order is
/// preserved and becomes the canonical order for everything downstream.
pub struct Normalizer;

impl Normalizer {
    #[must_use]
    pub fn normalize(records: Vec<RawRecord>) -> Vec<NormalizedRecord> {
        let mut seen_ids: HashSet<String> = HashSet::with_capacity(records.len());
        let mut output = Vec::with_capacity(records.len());

        for raw in records {
            let id = assign_id(raw.id, &mut seen_ids);
            let text_clean = raw.description.as_deref().map(clean_text).unwrap_or_default();
            let word_count = text_clean.split_whitespace().count();

            output.push(NormalizedRecord {
                id,
                title: raw.title.unwrap_or_default(),
                community: raw.community.unwrap_or_default(),
                author: raw.author.unwrap_or_default(),
                text_clean,
                word_count,
            });
        }

        output
    }
}

/// Uses the embedded id when present and not yet taken; otherwise
/// synthesizes a UUIDv7 (timestamp + random), retrying on the vanishingly
/// unlikely collision with a supplied id.
fn assign_id(embedded: Option<String>, seen: &mut HashSet<String>) -> String {
    if let Some(id) = embedded {
        if seen.insert(id.clone()) {
            return id;
        }
        tracing::warn!(%id, "duplicate embedded id, synthesizing replacement");
    }

    loop {
        let id = Uuid::now_v7().to_string();
        if seen.insert(id.clone()) {
            return id;
        }
    }
}

/// Renders markup-bearing text as plain text: tags removed (structure
/// stripped, content kept), entities decoded, all whitespace runs collapsed
/// to a single space, ends trimmed. The fragment parser is error-recovering,
/// so malformed markup degrades to whatever text it can salvage rather than
/// aborting the run.
#[must_use]
pub fn clean_text(markup: &str) -> String {
    let fragment = Html::parse_fragment(markup);
    let text: String = fragment.root_element().text().collect();
    collapse_whitespace(&text)
}

/// `split_whitespace` splits on the Unicode `White_Space` property, which
/// covers NBSP and friends, not just ASCII.
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(description: &str) -> RawRecord {
        RawRecord {
            description: Some(description.into()),
            ..RawRecord::default()
        }
    }

    #[test]
    fn test_strips_markup_and_decodes_entities() {
        let records = Normalizer::normalize(vec![RawRecord {
            title: Some("A".into()),
            description: Some("<p>Hello&nbsp;world</p>".into()),
            ..RawRecord::default()
        }]);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text_clean, "Hello world");
        assert_eq!(records[0].word_count, 2);
        assert_eq!(records[0].title, "A");
    }

    #[test]
    fn test_collapses_whitespace_runs() {
        let records = Normalizer::normalize(vec![raw("  Water \n\n will \t be   off  ")]);

        assert_eq!(records[0].text_clean, "Water will be off");
        assert_eq!(records[0].word_count, 4);
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let records = Normalizer::normalize(vec![RawRecord::default()]);

        let record = &records[0];
        assert_eq!(record.title, "");
        assert_eq!(record.community, "");
        assert_eq!(record.author, "");
        assert_eq!(record.text_clean, "");
        assert_eq!(record.word_count, 0);
        assert!(!record.id.is_empty());
    }

    #[test]
    fn test_embedded_id_is_kept() {
        let records = Normalizer::normalize(vec![RawRecord {
            id: Some("abc123".into()),
            ..RawRecord::default()
        }]);

        assert_eq!(records[0].id, "abc123");
    }

    #[test]
    fn test_duplicate_embedded_id_gets_replacement() {
        let records = Normalizer::normalize(vec![
            RawRecord {
                id: Some("abc123".into()),
                ..RawRecord::default()
            },
            RawRecord {
                id: Some("abc123".into()),
                ..RawRecord::default()
            },
        ]);

        assert_eq!(records[0].id, "abc123");
        assert_ne!(records[1].id, "abc123");
    }

    #[test]
    fn test_synthesized_ids_are_unique() {
        let records = Normalizer::normalize(vec![RawRecord::default(); 50]);

        let ids: HashSet<_> = records.iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids.len(), 50);
    }

    #[test]
    fn test_order_preserved() {
        let records = Normalizer::normalize(vec![
            RawRecord {
                title: Some("first".into()),
                ..RawRecord::default()
            },
            RawRecord {
                title: Some("second".into()),
                ..RawRecord::default()
            },
        ]);

        assert_eq!(records[0].title, "first");
        assert_eq!(records[1].title, "second");
    }

    #[test]
    fn test_word_count_idempotent_on_clean_text() {
        let records = Normalizer::normalize(vec![raw("<div>Pool closed on Tuesday</div>")]);
        let once = records[0].clone();

        let again = Normalizer::normalize(vec![raw(&once.text_clean)]);

        assert_eq!(again[0].text_clean, once.text_clean);
        assert_eq!(again[0].word_count, once.word_count);
    }

    #[test]
    fn test_markup_only_description_yields_empty() {
        let records = Normalizer::normalize(vec![raw("<br><img src=\"x.png\">")]);

        assert_eq!(records[0].text_clean, "");
        assert_eq!(records[0].word_count, 0);
    }
}
