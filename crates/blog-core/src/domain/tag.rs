use serde::{Deserialize, Serialize};

/// Tag entity - shared between posts, unique by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Option<i32>,
    pub name: String,
}

impl Tag {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            id: None,
            name: name.as_ref().trim().to_string(),
        }
    }

    /// Parse a comma separated list such as `"rust, web,rust"` into
    /// distinct, non-empty tags, keeping first-seen order.
    pub fn parse_list(input: &str) -> Vec<Tag> {
        let mut tags: Vec<Tag> = Vec::new();
        for name in input.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            if !tags.iter().any(|t| t.name == name) {
                tags.push(Tag::new(name));
            }
        }
        tags
    }
}
