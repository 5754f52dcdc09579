use std::collections::VecDeque;

use log::{debug, warn};
use riptide_shared::{sequence_more_recent, ClientKey};

use crate::{
    directory::EntityDirectory,
    error::ApplyError,
    event::{EntityRef, EventPayload},
};

/// A client-submitted event parked until the authoritative simulation
/// reaches the tick the client generated it at.
#[derive(Debug, Clone)]
pub struct BufferedEvent {
    pub sender: ClientKey,
    /// Simulation input id the sender's client had processed when it
    /// generated the event; the dispatch gate.
    pub character_state_id: u16,
    pub target: EntityRef,
    pub payload: EventPayload,
    processed: bool,
}

impl BufferedEvent {
    pub fn new(
        sender: ClientKey,
        character_state_id: u16,
        target: EntityRef,
        payload: EventPayload,
    ) -> Self {
        Self {
            sender,
            character_state_id,
            target,
            payload,
            processed: false,
        }
    }
}

/// Bounded queue of client events awaiting gated dispatch. Drained once per
/// server tick; order within one sender is preserved.
pub struct EventInbox {
    queue: VecDeque<BufferedEvent>,
    capacity: usize,
}

impl EventInbox {
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Enqueues an event. At capacity the oldest half is dropped first: a
    /// flooding client loses its own backlog instead of growing ours.
    pub fn buffer(&mut self, event: BufferedEvent) {
        if self.queue.len() >= self.capacity {
            let drop_count = self.capacity / 2;
            warn!(
                "incoming event buffer full ({}), dropping oldest {} events",
                self.queue.len(),
                drop_count
            );
            self.queue.drain(..drop_count);
        }
        self.queue.push_back(event);
    }

    /// Dispatches every event whose gate is open: the simulation has
    /// processed the sender's character inputs through the event's
    /// `character_state_id`, or the character is incapacitated (its inputs
    /// no longer matter, so ordering against them is moot). Events whose
    /// sender has no character are discarded. A missing dispatch target is
    /// an expected race with entity removal and is dropped quietly.
    pub fn process_ready(&mut self, directory: &mut dyn EntityDirectory) {
        for event in self.queue.iter_mut() {
            if event.processed {
                continue;
            }

            let Some(status) = directory.character_status(event.sender) else {
                debug!(
                    "dropping buffered event from {:?}: sender has no character",
                    event.sender
                );
                event.processed = true;
                continue;
            };

            let gate_open = status.incapacitated
                || !sequence_more_recent(event.character_state_id, status.processed_input_id);
            if !gate_open {
                continue;
            }

            match directory.apply_event(event.target, &event.payload, event.sender) {
                Ok(()) => {}
                Err(ApplyError::TargetMissing(target)) => {
                    debug!(
                        "buffered event from {:?} raced entity removal of {:?}",
                        event.sender, target
                    );
                }
                Err(ApplyError::Rejected(reason)) => {
                    debug!(
                        "dispatch target {:?} rejected event from {:?}: {}",
                        event.target, event.sender, reason
                    );
                }
            }
            event.processed = true;
        }

        self.queue.retain(|event| !event.processed);
    }

    /// Synchronously removes everything a disconnecting client sent.
    pub fn purge_sender(&mut self, client: ClientKey) {
        self.queue.retain(|event| event.sender != client);
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}
