use serde::{Deserialize, Serialize};

/// Kind of an atomic content unit. Drives the height formula used by the overflow pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    Heading,
    Paragraph,
    List,
    Table,
    Image,
}

impl BlockType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::Heading => "heading",
            BlockType::Paragraph => "paragraph",
            BlockType::List => "list",
            BlockType::Table => "table",
            BlockType::Image => "image",
        }
    }
}

/// A typed unit of document content handed in by the block-assembly collaborator.
///
/// `id` is the sole join key across layout results, overflow details and reduction plans.
/// `estimated_height == 0.0` means "compute it"; anything positive is a caller override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    pub id: String,
    pub content: String,
    #[serde(rename = "type")]
    pub block_type: BlockType,
    /// Caller-assigned importance in `[1, 10]`.
    pub priority: u8,
    #[serde(default)]
    pub estimated_height: f64,
    /// Explicit topic association. When absent the id is searched for a topic reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<String>,
}

impl ContentBlock {
    pub fn new(id: impl Into<String>, block_type: BlockType, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            block_type,
            priority: 5,
            estimated_height: 0.0,
            topic_id: None,
        }
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_height(mut self, height: f64) -> Self {
        self.estimated_height = height;
        self
    }

    pub fn with_topic(mut self, topic_id: impl Into<String>) -> Self {
        self.topic_id = Some(topic_id.into());
        self
    }

    /// Caller-supplied height, if any.
    pub fn height_override(&self) -> Option<f64> {
        (self.estimated_height > 0.0).then_some(self.estimated_height)
    }

    /// Resolves the topic this block belongs to among `known_topic_ids`.
    ///
    /// Order: explicit `topic_id` (must name a known topic, no fallback), then an embedded
    /// `topic-<digits>` token naming a known topic, then the longest known topic id
    /// contained in the block id.
    pub fn resolve_topic<'a, I>(&self, known_topic_ids: I) -> Option<String>
    where
        I: IntoIterator<Item = &'a str> + Clone,
    {
        if let Some(explicit) = &self.topic_id {
            return known_topic_ids
                .into_iter()
                .find(|id| *id == explicit.as_str())
                .map(str::to_string);
        }

        for token in embedded_topic_tokens(&self.id) {
            if let Some(hit) = known_topic_ids.clone().into_iter().find(|id| *id == token) {
                return Some(hit.to_string());
            }
        }

        known_topic_ids
            .into_iter()
            .filter(|id| !id.is_empty() && self.id.contains(id))
            .max_by_key(|id| id.len())
            .map(str::to_string)
    }
}

/// Finds every `topic-<digits>` token inside a block id.
fn embedded_topic_tokens(id: &str) -> Vec<&str> {
    const PREFIX: &str = "topic-";
    let mut tokens = Vec::new();
    let mut search_from = 0;

    while let Some(offset) = id[search_from..].find(PREFIX) {
        let start = search_from + offset;
        let digits_start = start + PREFIX.len();
        let digits_len = id[digits_start..]
            .bytes()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if digits_len > 0 {
            tokens.push(&id[start..digits_start + digits_len]);
        }
        search_from = digits_start;
    }
    tokens
}

/// A subtopic nested under a [`Topic`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubTopic {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
}

/// Topic record produced by the extraction collaborator. Read-only input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub subtopics: Vec<SubTopic>,
    /// Extraction confidence in `[0, 1]`.
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub examples: Vec<String>,
    #[serde(default)]
    pub source_files: Vec<String>,
}

impl Topic {
    /// Characters of the topic body plus all subtopic bodies.
    pub fn content_length(&self) -> usize {
        self.content.chars().count()
            + self
                .subtopics
                .iter()
                .map(|s| s.content.chars().count())
                .sum::<usize>()
    }
}
