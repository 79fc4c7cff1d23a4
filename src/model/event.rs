use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Free text, logged as-is.
    Log,
    /// A URL checked against the block-list.
    Navigate,
    /// A keyword added to the block-list.
    Block,
}

/// One row of a replay script: `producer,kind,text`.
#[derive(Debug, Deserialize, Clone)]
pub struct EventInput {
    pub producer: String,
    pub kind: EventKind,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct ProducerSummary {
    pub producer: String,
    pub events: usize,
    pub blocked: usize,
}
