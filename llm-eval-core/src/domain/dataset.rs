use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, Result};
use crate::traits::Dataset;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// Role carried by the trailing reference message of every example.
    pub const LABEL: Role = Role::Assistant;
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// One labeled conversation. The last message is the reference answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DatasetExample {
    pub messages: Vec<Message>,
}

/// A labeled example split into the model prompt and its reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabeledPrompt<'a> {
    pub conversation: &'a [Message],
    pub reference: &'a str,
}

impl LabeledPrompt<'_> {
    /// Content of the final prompt message.
    pub fn question(&self) -> &str {
        self.conversation
            .last()
            .map(|m| m.content.as_str())
            .unwrap_or_default()
    }
}

impl DatasetExample {
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    /// Splits off the trailing label without touching `self`.
    ///
    /// `index` is only used for error reporting.
    pub fn split_label(&self, index: usize) -> Result<LabeledPrompt<'_>> {
        let (last, conversation) = self.messages.split_last().ok_or_else(|| {
            CoreError::Validation(format!("sample {} has no messages", index))
        })?;

        if last.role != Role::LABEL {
            return Err(CoreError::LabelRole {
                index,
                role: last.role.to_string(),
                content: last.content.clone(),
            });
        }

        if conversation.is_empty() {
            return Err(CoreError::Validation(format!(
                "sample {} has a label but no prompt messages",
                index
            )));
        }

        Ok(LabeledPrompt {
            conversation,
            reference: &last.content,
        })
    }
}

/// Dataset held fully in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InMemoryDataset {
    examples: Vec<DatasetExample>,
}

impl InMemoryDataset {
    pub fn new(examples: Vec<DatasetExample>) -> Self {
        Self { examples }
    }

    pub fn examples(&self) -> &[DatasetExample] {
        &self.examples
    }
}

impl From<Vec<DatasetExample>> for InMemoryDataset {
    fn from(examples: Vec<DatasetExample>) -> Self {
        Self::new(examples)
    }
}

impl Dataset for InMemoryDataset {
    fn len(&self) -> usize {
        self.examples.len()
    }

    fn example(&self, index: usize) -> Option<&DatasetExample> {
        self.examples.get(index)
    }
}
