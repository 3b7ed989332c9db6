use langai_storage::{MessageIndex, MessageRecord};

/// Global in-flight markers shown next to the record being worked on.
///
/// These are display hints only; concurrent operations are never blocked by them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Indicators {
    pub translating: Option<MessageIndex>,
    pub summarizing: Option<MessageIndex>,
}

impl Indicators {
    pub fn is_idle(&self) -> bool {
        self.translating.is_none() && self.summarizing.is_none()
    }
}

/// Emitted after every mutation so presenters can re-render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// A submission was accepted; the record is still waiting for detection.
    Appended(MessageRecord),
    Updated(MessageRecord),
    IndicatorsChanged(Indicators),
    /// The detector's readiness step failed at start-up.
    InitializationFailed(String),
}

impl StoreEvent {
    pub fn index(&self) -> Option<MessageIndex> {
        match self {
            Self::Appended(record) | Self::Updated(record) => Some(record.index),
            Self::IndicatorsChanged(_) | Self::InitializationFailed(_) => None,
        }
    }
}

/// Owned copy of everything a presenter renders.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Snapshot {
    pub messages: Vec<MessageRecord>,
    pub indicators: Indicators,
    pub global_error: Option<String>,
}
