// src/entity/note.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Opaque note identifier assigned by the remote store.
///
/// Stores key notes by integer or by string; both forms deserialize into
/// the same textual id so the client never has to care which one it got.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NoteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for NoteId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("Note id cannot be empty".to_string());
        }
        Ok(NoteId(s.to_string()))
    }
}

impl From<i64> for NoteId {
    fn from(id: i64) -> Self {
        NoteId(id.to_string())
    }
}

impl<'de> Deserialize<'de> for NoteId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Int(i64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Int(n) => NoteId(n.to_string()),
            RawId::Text(s) => NoteId(s),
        })
    }
}

/// A user-owned note as returned by the note store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Note {
    /// Case-insensitive substring match on title or content.
    ///
    /// `needle` must already be lowercased.
    pub fn matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle) || self.content.to_lowercase().contains(needle)
    }

    /// Short id used in list output.
    pub fn short_id(&self) -> &str {
        let id = self.id.as_str();
        match id.char_indices().nth(7) {
            Some((idx, _)) => &id[..idx],
            None => id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_id_accepts_integer_and_string() {
        let from_int: NoteId = serde_json::from_str("42").unwrap();
        let from_str: NoteId = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(from_int, from_str);
        assert_eq!(from_int.as_str(), "42");
    }

    #[test]
    fn test_note_id_serializes_as_string() {
        let id = NoteId::from(7);
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"7\"");
    }

    #[test]
    fn test_note_id_from_str_rejects_blank() {
        assert!("  ".parse::<NoteId>().is_err());
        assert_eq!(" abc ".parse::<NoteId>().unwrap().as_str(), "abc");
    }

    #[test]
    fn test_note_deserializes_store_row() {
        let json = r#"{
            "id": 3,
            "title": "Groceries",
            "content": "milk, eggs",
            "created_at": "2025-03-01T10:15:00.123456+00:00",
            "user_id": "b6f1c1de-8c55-4a43-9f2a-1d0c5b4f1e2a"
        }"#;
        let note: Note = serde_json::from_str(json).unwrap();
        assert_eq!(note.id.as_str(), "3");
        assert_eq!(note.title, "Groceries");
    }

    #[test]
    fn test_matches_title_or_content() {
        let note = Note {
            id: NoteId::new("1"),
            title: "Weekend Shopping".to_string(),
            content: "bread".to_string(),
            created_at: Utc::now(),
        };
        assert!(note.matches("shopping"));
        assert!(note.matches("bre"));
        assert!(!note.matches("milk"));
    }

    #[test]
    fn test_short_id() {
        let mut note = Note {
            id: NoteId::new("0f8b2c4e-1111-2222-3333-444455556666"),
            title: String::new(),
            content: String::new(),
            created_at: Utc::now(),
        };
        assert_eq!(note.short_id(), "0f8b2c4");
        note.id = NoteId::new("42");
        assert_eq!(note.short_id(), "42");
    }
}
