use riptide_shared::{sequence_more_recent, ArchiveId, EventId, GameTime};

use crate::event::{EntityRef, EventPayload, ServerEntityEvent};

/// Id-ordered window of recently created events. Ids increase monotonically
/// (mod 2^16); entries leave only through [`prune`](Self::prune), which
/// always keeps at least one entry so the next-expected-id chain never
/// breaks.
pub struct EventLog {
    events: Vec<ServerEntityEvent>,
    next_id: EventId,
}

impl EventLog {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            next_id: 0,
        }
    }

    pub fn append(
        &mut self,
        entity: EntityRef,
        payload: EventPayload,
        now: GameTime,
    ) -> EventId {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        self.events
            .push(ServerEntityEvent::new(id, entity, payload, now));
        id
    }

    /// Most recent unsent entry equivalent to the would-be new event, if
    /// any. Scans from the back so a hit is always the newest instance.
    pub fn find_unsent_duplicate(
        &self,
        entity: &EntityRef,
        payload: &EventPayload,
    ) -> Option<EventId> {
        self.events
            .iter()
            .rev()
            .find(|event| !event.sent && event.is_duplicate_of(entity, payload))
            .map(|event| event.id)
    }

    /// Drops every leading entry already acknowledged by all in-game
    /// clients. `acked_floor` is the minimum `last_recv_ack` across those
    /// clients, or `None` when there are none (then only the newest entry
    /// is retained). Computes a cut index first and truncates in one pass;
    /// never removes while iterating.
    pub fn prune(&mut self, acked_floor: Option<EventId>) {
        if self.events.len() <= 1 {
            return;
        }
        let cut = match acked_floor {
            None => self.events.len() - 1,
            Some(floor) => {
                let mut cut = 0;
                while cut < self.events.len()
                    && !sequence_more_recent(self.events[cut].id, floor)
                {
                    cut += 1;
                }
                cut.min(self.events.len() - 1)
            }
        };
        self.events.drain(..cut);
    }

    pub fn oldest(&self) -> Option<&ServerEntityEvent> {
        self.events.first()
    }

    /// Id of the newest entry, or the id the next append will take minus
    /// one when the log is empty. Anchors mid-round handoff.
    pub fn newest_id(&self) -> EventId {
        match self.events.last() {
            Some(event) => event.id,
            None => self.next_id.wrapping_sub(1),
        }
    }

    pub fn events(&self) -> &[ServerEntityEvent] {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut [ServerEntityEvent] {
        &mut self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.next_id = 0;
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

// UniqueArchive

/// One copy of every distinct event created this round, re-indexed with a
/// dense archive-local id space starting at 0. Late joiners replay this
/// before switching to the live log. Append-only; cleared only at round end.
pub struct UniqueArchive {
    events: Vec<ServerEntityEvent>,
    /// Live-log id of the round's first archived event. A later event can
    /// repeat that event's exact content, so join-time coverage checks must
    /// compare against this id, never against payloads.
    first_origin_id: Option<EventId>,
}

impl UniqueArchive {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            first_origin_id: None,
        }
    }

    /// Appends a copy of the event unless an equivalent distinct event is
    /// already archived. `origin_id` is the event's live-log id. Returns
    /// whether the event was novel.
    pub fn archive_if_novel(
        &mut self,
        origin_id: EventId,
        entity: EntityRef,
        payload: EventPayload,
        created_at: GameTime,
    ) -> bool {
        if self
            .events
            .iter()
            .any(|event| event.is_duplicate_of(&entity, &payload))
        {
            return false;
        }
        if self.events.is_empty() {
            self.first_origin_id = Some(origin_id);
        }
        let archive_id = self.events.len() as ArchiveId;
        self.events
            .push(ServerEntityEvent::new(archive_id, entity, payload, created_at));
        true
    }

    /// Live-log id of the first archived event, `None` until one exists.
    pub fn first_origin_id(&self) -> Option<EventId> {
        self.first_origin_id
    }

    pub fn events(&self) -> &[ServerEntityEvent] {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut [ServerEntityEvent] {
        &mut self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.first_origin_id = None;
    }
}

impl Default for UniqueArchive {
    fn default() -> Self {
        Self::new()
    }
}
