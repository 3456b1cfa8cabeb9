use crate::record::{RecordSet, ScoredRecord};

/// Case-insensitive substring filter over title, community, and author.
/// Empty or absent criteria match everything; results keep the canonical
/// ingestion order.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    pub title: Option<String>,
    pub community: Option<String>,
    pub author: Option<String>,
}

impl RecordFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_title(mut self, title: String) -> Self {
        self.title = Some(title);
        self
    }

    #[must_use]
    pub fn with_community(mut self, community: String) -> Self {
        self.community = Some(community);
        self
    }

    #[must_use]
    pub fn with_author(mut self, author: String) -> Self {
        self.author = Some(author);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.community.is_none() && self.author.is_none()
    }

    #[must_use]
    pub fn matches(&self, record: &ScoredRecord) -> bool {
        field_matches(&record.record.title, self.title.as_deref())
            && field_matches(&record.record.community, self.community.as_deref())
            && field_matches(&record.record.author, self.author.as_deref())
    }

    /// Filters the full collection into an order-preserving sub-sequence.
    #[must_use]
    pub fn apply<'a>(&self, records: &'a RecordSet) -> Vec<&'a ScoredRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

fn field_matches(value: &str, query: Option<&str>) -> bool {
    match query {
        None => true,
        Some(q) if q.is_empty() => true,
        Some(q) => value.to_lowercase().contains(&q.to_lowercase()),
    }
}
