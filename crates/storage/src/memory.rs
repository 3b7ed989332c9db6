use std::sync::{Mutex, MutexGuard, PoisonError};

use snafu::{OptionExt, ensure};

use super::error::{InvariantViolationSnafu, OutOfRangeSnafu, StoreResult};
use super::ids::{MessageIndex, RequestSeq};
use super::types::{MessagePatch, MessageRecord, NewMessage, Operation, RequestTicket};
use super::MessageStore;

#[derive(Debug, Default, Clone, Copy)]
struct RequestCounters {
    translate: u64,
    summarize: u64,
}

impl RequestCounters {
    fn slot(&mut self, operation: Operation) -> &mut u64 {
        match operation {
            Operation::Translate => &mut self.translate,
            Operation::Summarize => &mut self.summarize,
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    records: Vec<MessageRecord>,
    requests: Vec<RequestCounters>,
}

impl Inner {
    fn position(&self, stage: &'static str, index: MessageIndex) -> StoreResult<usize> {
        let position = index.get();
        ensure!(
            position < self.records.len(),
            OutOfRangeSnafu {
                stage,
                index,
                len: self.records.len(),
            }
        );
        Ok(position)
    }

    fn apply(&mut self, position: usize, patch: MessagePatch) -> StoreResult<MessageRecord> {
        let record = self.records.get_mut(position).context(InvariantViolationSnafu {
            stage: "apply-patch",
            details: format!("no record at checked position {position}"),
        })?;

        if patch.detected_language.is_some() {
            ensure!(
                record.detected_language.is_pending(),
                InvariantViolationSnafu {
                    stage: "apply-detected-language",
                    details: format!("language of message {} was already resolved", record.index),
                }
            );
        }

        patch.apply_to(record);
        Ok(record.clone())
    }
}

/// Session-only message store kept in memory behind one mutex.
///
/// The lock is only held for the duration of a single read or patch and never
/// across an await point.
#[derive(Debug, Default)]
pub struct MemoryMessageStore {
    inner: Mutex<Inner>,
}

impl MemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic while patching cannot leave a record half-written, so poisoning is ignored.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MessageStore for MemoryMessageStore {
    fn append_message(&self, input: NewMessage) -> MessageRecord {
        let mut inner = self.lock();
        let record = MessageRecord {
            index: MessageIndex::new(inner.records.len()),
            text: input.text,
            detected_language: Default::default(),
            target_language: input.target_language,
            translation: None,
            summary: None,
            error: None,
        };
        inner.records.push(record.clone());
        inner.requests.push(RequestCounters::default());
        record
    }

    fn list_messages(&self) -> Vec<MessageRecord> {
        self.lock().records.clone()
    }

    fn get_message(&self, index: MessageIndex) -> StoreResult<MessageRecord> {
        let inner = self.lock();
        let position = inner.position("get-message", index)?;
        Ok(inner.records[position].clone())
    }

    fn len(&self) -> usize {
        self.lock().records.len()
    }

    fn update_message(
        &self,
        index: MessageIndex,
        patch: MessagePatch,
    ) -> StoreResult<MessageRecord> {
        let mut inner = self.lock();
        let position = inner.position("update-message", index)?;
        inner.apply(position, patch)
    }

    fn begin_request(
        &self,
        index: MessageIndex,
        operation: Operation,
    ) -> StoreResult<RequestTicket> {
        let mut inner = self.lock();
        let position = inner.position("begin-request", index)?;
        let slot = inner.requests[position].slot(operation);
        *slot += 1;

        Ok(RequestTicket {
            index,
            operation,
            seq: RequestSeq::new(*slot),
        })
    }

    fn update_if_latest(
        &self,
        ticket: &RequestTicket,
        patch: MessagePatch,
    ) -> StoreResult<Option<MessageRecord>> {
        let mut inner = self.lock();
        let position = inner.position("update-if-latest", ticket.index)?;
        let latest = *inner.requests[position].slot(ticket.operation);
        if latest != ticket.seq.get() {
            tracing::debug!(
                index = %ticket.index,
                operation = ?ticket.operation,
                seq = %ticket.seq,
                latest,
                "dropping superseded completion"
            );
            return Ok(None);
        }

        inner.apply(position, patch).map(Some)
    }
}
