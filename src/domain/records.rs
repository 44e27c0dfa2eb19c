//! Export records. Immutable values built from the chat export JSON.
//!
//! Every type has one factory, `from_json`, which checks that each required key is
//! present and well-typed and recursively builds nested lists. Nothing is mutated
//! after construction.

use super::errors::ConstructionError;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::LazyLock;

static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w+\b").expect("word regex is valid"));

type Object = Map<String, Value>;

fn as_object<'a>(value: &'a Value, entity: &'static str) -> Result<&'a Object, ConstructionError> {
    value.as_object().ok_or(ConstructionError::WrongType {
        entity,
        field: "(record)",
        expected: "an object",
    })
}

fn field<'a>(
    obj: &'a Object,
    entity: &'static str,
    field: &'static str,
) -> Result<&'a Value, ConstructionError> {
    obj.get(field)
        .ok_or(ConstructionError::MissingField { entity, field })
}

fn string_field(
    obj: &Object,
    entity: &'static str,
    name: &'static str,
) -> Result<String, ConstructionError> {
    field(obj, entity, name)?
        .as_str()
        .map(str::to_string)
        .ok_or(ConstructionError::WrongType {
            entity,
            field: name,
            expected: "a string",
        })
}

fn timestamp_field(
    obj: &Object,
    entity: &'static str,
    name: &'static str,
) -> Result<DateTime<Utc>, ConstructionError> {
    let raw = string_field(obj, entity, name)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| ConstructionError::InvalidTimestamp {
            entity,
            field: name,
            value: raw,
        })
}

fn array_field<'a>(
    obj: &'a Object,
    entity: &'static str,
    name: &'static str,
) -> Result<&'a Vec<Value>, ConstructionError> {
    field(obj, entity, name)?
        .as_array()
        .ok_or(ConstructionError::WrongType {
            entity,
            field: name,
            expected: "an array",
        })
}

/// A file uploaded into a message, with the text the service extracted from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub file_size: u64,
    pub file_type: String,
    pub extracted_content: String,
}

impl Attachment {
    const ENTITY: &'static str = "Attachment";

    pub fn from_json(value: &Value) -> Result<Self, ConstructionError> {
        let obj = as_object(value, Self::ENTITY)?;
        let file_size = field(obj, Self::ENTITY, "file_size")?.as_u64().ok_or(
            ConstructionError::WrongType {
                entity: Self::ENTITY,
                field: "file_size",
                expected: "a non-negative integer",
            },
        )?;
        // `null` is how the export spells "nothing extracted".
        let extracted_content = match field(obj, Self::ENTITY, "extracted_content")? {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            _ => {
                return Err(ConstructionError::WrongType {
                    entity: Self::ENTITY,
                    field: "extracted_content",
                    expected: "a string or null",
                });
            }
        };
        Ok(Self {
            file_name: string_field(obj, Self::ENTITY, "file_name")?,
            file_size,
            file_type: string_field(obj, Self::ENTITY, "file_type")?,
            extracted_content,
        })
    }
}

impl fmt::Display for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Attachment(file_name={}, file_size={}, file_type={})",
            self.file_name, self.file_size, self.file_type
        )
    }
}

/// A file referenced by a message without extracted content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReference {
    pub file_name: String,
}

impl FileReference {
    const ENTITY: &'static str = "FileReference";

    pub fn from_json(value: &Value) -> Result<Self, ConstructionError> {
        let obj = as_object(value, Self::ENTITY)?;
        Ok(Self {
            file_name: string_field(obj, Self::ENTITY, "file_name")?,
        })
    }
}

impl fmt::Display for FileReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileReference(file_name={})", self.file_name)
    }
}

/// Author of a message. The export only distinguishes the human from everyone else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sender {
    Human,
    Other(String),
}

impl From<String> for Sender {
    fn from(raw: String) -> Self {
        if raw == "human" {
            Sender::Human
        } else {
            Sender::Other(raw)
        }
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sender::Human => f.write_str("human"),
            Sender::Other(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub uuid: String,
    pub text: String,
    pub sender: Sender,
    pub created_at: DateTime<Utc>,
    pub attachments: Vec<Attachment>,
    pub files: Vec<FileReference>,
}

impl Message {
    const ENTITY: &'static str = "Message";

    pub fn from_json(value: &Value) -> Result<Self, ConstructionError> {
        let obj = as_object(value, Self::ENTITY)?;
        let attachments = array_field(obj, Self::ENTITY, "attachments")?
            .iter()
            .map(Attachment::from_json)
            .collect::<Result<Vec<_>, _>>()?;
        let files = array_field(obj, Self::ENTITY, "files")?
            .iter()
            .map(FileReference::from_json)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            uuid: string_field(obj, Self::ENTITY, "uuid")?,
            text: string_field(obj, Self::ENTITY, "text")?,
            sender: Sender::from(string_field(obj, Self::ENTITY, "sender")?),
            created_at: timestamp_field(obj, Self::ENTITY, "created_at")?,
            attachments,
            files,
        })
    }

    /// Number of word-boundary tokens in `text`.
    pub fn word_count(&self) -> usize {
        WORD.find_iter(&self.text).count()
    }

    /// Length of `text` in UTF-8 bytes.
    pub fn byte_count(&self) -> usize {
        self.text.len()
    }
}

/// One chat session. Messages keep the order they had in the export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    pub uuid: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub messages: Vec<Message>,
}

impl Conversation {
    const ENTITY: &'static str = "Conversation";

    pub fn from_json(value: &Value) -> Result<Self, ConstructionError> {
        let obj = as_object(value, Self::ENTITY)?;
        let messages = array_field(obj, Self::ENTITY, "chat_messages")?
            .iter()
            .map(Message::from_json)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            uuid: string_field(obj, Self::ENTITY, "uuid")?,
            name: string_field(obj, Self::ENTITY, "name")?,
            created_at: timestamp_field(obj, Self::ENTITY, "created_at")?,
            updated_at: timestamp_field(obj, Self::ENTITY, "updated_at")?,
            messages,
        })
    }

    pub fn word_count(&self) -> usize {
        self.messages.iter().map(Message::word_count).sum()
    }

    pub fn byte_count(&self) -> usize {
        self.messages.iter().map(Message::byte_count).sum()
    }

    pub fn human_message_count(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.sender == Sender::Human)
            .count()
    }
}
