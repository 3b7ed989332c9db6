pub mod error;
pub mod ids;
pub mod memory;
pub mod types;

pub use error::{StoreError, StoreResult};
pub use ids::{MessageIndex, RequestSeq};
pub use memory::MemoryMessageStore;
pub use types::{
    DETECTING_LABEL, DETECTION_ERROR_LABEL, DetectedLanguage, MessagePatch, MessageRecord,
    NewMessage, Operation, RequestTicket,
};

/// Ordered, append-only message records addressed by position.
///
/// Records are never removed or reordered, so an index stays valid for the
/// whole session. Every method applies or reads whole records, which keeps
/// readers from observing a partly applied patch.
pub trait MessageStore: Send + Sync {
    fn append_message(&self, input: NewMessage) -> MessageRecord;
    fn list_messages(&self) -> Vec<MessageRecord>;
    fn get_message(&self, index: MessageIndex) -> StoreResult<MessageRecord>;
    fn len(&self) -> usize;
    fn update_message(&self, index: MessageIndex, patch: MessagePatch)
    -> StoreResult<MessageRecord>;

    /// Issues the next request sequence number for `operation` on a record.
    fn begin_request(&self, index: MessageIndex, operation: Operation)
    -> StoreResult<RequestTicket>;
    /// Applies `patch` only if `ticket` is still the latest request issued for its
    /// record and operation. Returns `None` when the ticket was superseded.
    fn update_if_latest(
        &self,
        ticket: &RequestTicket,
        patch: MessagePatch,
    ) -> StoreResult<Option<MessageRecord>>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
