//! Derived study records and their answer encodings
//!
//! Records come from the generation collaborator in two shapes: an answer
//! index into the options list, or a `correct` flag on each option. The
//! auditor never looks at which shape it has; it asks the
//! [`AnswerKeyed`] capability for the positions marked correct.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One answer option.
///
/// Deserializes from a bare string (`"Option text"`) or from
/// `{ "text": ..., "correct": true }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(from = "OptionRepr")]
pub struct OptionRecord {
    pub text: String,
    #[serde(default)]
    pub correct: bool,
}

impl OptionRecord {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            correct: false,
        }
    }

    pub fn correct(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            correct: true,
        }
    }
}

#[derive(Deserialize, JsonSchema)]
#[serde(untagged)]
enum OptionRepr {
    Text(String),
    Flagged {
        text: String,
        #[serde(default)]
        correct: bool,
    },
}

impl From<OptionRepr> for OptionRecord {
    fn from(repr: OptionRepr) -> Self {
        match repr {
            OptionRepr::Text(text) => Self::new(text),
            OptionRepr::Flagged { text, correct } => Self { text, correct },
        }
    }
}

/// How a record says which option is correct
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "encoding", rename_all = "snake_case")]
pub enum AnswerRef {
    /// Position into `options`; signed so bad generator output stays representable
    Index { index: i64 },
    /// The `correct` flag on each option
    Flags,
}

/// Accepts the tagged form, a bare integer index, or `null`.
fn answer_ref<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<AnswerRef>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Bare(i64),
        Tagged(AnswerRef),
    }

    Ok(Option::<Repr>::deserialize(deserializer)?.map(|repr| match repr {
        Repr::Bare(index) => AnswerRef::Index { index },
        Repr::Tagged(answer) => answer,
    }))
}

/// A generated study item: question, flashcard, or scenario option set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DerivedRecord {
    pub id: String,
    #[serde(default, alias = "promptText")]
    pub prompt_text: String,
    /// `None` when the generator dropped the options list entirely
    #[serde(default)]
    pub options: Option<Vec<OptionRecord>>,
    /// `None` when the generator dropped the answer key
    #[serde(
        default,
        alias = "answerRef",
        deserialize_with = "answer_ref",
        skip_serializing_if = "Option::is_none"
    )]
    #[schemars(with = "Option<AnswerRef>")]
    pub answer: Option<AnswerRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Fields this crate does not interpret (difficulty, topic, ...), kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DerivedRecord {
    /// A record whose answer is an index into `options`.
    pub fn indexed<S: Into<String>>(
        id: impl Into<String>,
        prompt_text: impl Into<String>,
        options: impl IntoIterator<Item = S>,
        index: i64,
    ) -> Self {
        Self {
            id: id.into(),
            prompt_text: prompt_text.into(),
            options: Some(options.into_iter().map(OptionRecord::new).collect()),
            answer: Some(AnswerRef::Index { index }),
            citation: None,
            category: None,
            extra: Map::new(),
        }
    }

    /// A record whose answer is carried by the options' `correct` flags.
    pub fn flagged(
        id: impl Into<String>,
        prompt_text: impl Into<String>,
        options: Vec<OptionRecord>,
    ) -> Self {
        Self {
            id: id.into(),
            prompt_text: prompt_text.into(),
            options: Some(options),
            answer: Some(AnswerRef::Flags),
            citation: None,
            category: None,
            extra: Map::new(),
        }
    }

    pub fn with_citation(mut self, citation: impl Into<String>) -> Self {
        self.citation = Some(citation.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// The answer encoding in effect. A record without an answer key whose
    /// options carry `correct` flags is read as flag-encoded.
    pub fn effective_answer(&self) -> Option<AnswerRef> {
        match &self.answer {
            Some(answer) => Some(answer.clone()),
            None => self
                .options
                .as_deref()
                .unwrap_or_default()
                .iter()
                .any(|o| o.correct)
                .then_some(AnswerRef::Flags),
        }
    }

    pub fn option_texts(&self) -> Vec<&str> {
        self.options
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|o| o.text.as_str())
            .collect()
    }
}

/// Capability the integrity auditor needs from any record shape.
pub trait AnswerKeyed {
    fn record_id(&self) -> &str;

    /// Number of options, or `None` if the record has no options list.
    fn option_count(&self) -> Option<usize>;

    /// Positions the record marks as correct. Positions may lie outside
    /// `[0, option_count)`; the auditor checks that.
    fn marked_positions(&self) -> Vec<i64>;

    /// True when the answer is expressed as an index rather than flags.
    fn is_index_encoded(&self) -> bool;

    /// False when the record carries no answer reference in any encoding.
    fn has_answer_ref(&self) -> bool {
        true
    }
}

impl AnswerKeyed for DerivedRecord {
    fn record_id(&self) -> &str {
        &self.id
    }

    fn option_count(&self) -> Option<usize> {
        self.options.as_ref().map(Vec::len)
    }

    fn marked_positions(&self) -> Vec<i64> {
        match self.effective_answer() {
            None => Vec::new(),
            Some(AnswerRef::Index { index }) => vec![index],
            Some(AnswerRef::Flags) => self
                .options
                .as_deref()
                .unwrap_or_default()
                .iter()
                .enumerate()
                .filter(|(_, o)| o.correct)
                .map(|(i, _)| i as i64)
                .collect(),
        }
    }

    fn is_index_encoded(&self) -> bool {
        matches!(self.answer, Some(AnswerRef::Index { .. }))
    }

    fn has_answer_ref(&self) -> bool {
        self.effective_answer().is_some()
    }
}
