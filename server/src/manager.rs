use std::collections::HashMap;

use log::{error, info};
use riptide_shared::{BitReader, BitWriter, ClientKey, EventId, GameTime};

use crate::{
    config::ReplicationConfig,
    cursor::{ClientCursor, MidRoundSync},
    desync::{self, KickCommand},
    directory::EntityDirectory,
    error::{CreateError, WireError},
    event::{EntityRef, EventPayload, ServerEntityEvent},
    event_log::{EventLog, UniqueArchive},
    inbox::{BufferedEvent, EventInbox},
    wire,
};

/// All replication state for one session, owned explicitly by the server
/// object and threaded by reference through every component. Drives the
/// event log, the unique archive, per-client cursors and the incoming
/// buffer from a single-threaded tick loop; no locks, no hidden clocks.
pub struct ReplicationState {
    config: ReplicationConfig,
    log: EventLog,
    archive: UniqueArchive,
    cursors: HashMap<ClientKey, ClientCursor>,
    inbox: EventInbox,
}

impl ReplicationState {
    pub fn new(config: ReplicationConfig) -> Self {
        let inbox = EventInbox::new(config.inbox_capacity);
        Self {
            config,
            log: EventLog::new(),
            archive: UniqueArchive::new(),
            cursors: HashMap::new(),
            inbox,
        }
    }

    pub fn config(&self) -> &ReplicationConfig {
        &self.config
    }

    /// Records a new replicable event for `entity`. Prunes fully
    /// acknowledged log entries first, then coalesces into an existing
    /// unsent duplicate when one exists (a frequently-changing value
    /// produces one pending event, not one per mutation). A novel event is
    /// also archived for late joiners.
    pub fn create_event(
        &mut self,
        directory: &dyn EntityDirectory,
        entity: EntityRef,
        payload: EventPayload,
        now: GameTime,
    ) -> Result<EventId, CreateError> {
        if !directory.entity_exists(entity) {
            error!("create_event called for removed or recycled entity {entity:?}");
            return Err(CreateError::EntityInvalid(entity));
        }

        self.log.prune(desync::last_acked_by_all(&self.cursors));

        if let Some(existing) = self.log.find_unsent_duplicate(&entity, &payload) {
            return Ok(existing);
        }

        let id = self.log.append(entity, payload.clone(), now);
        self.archive.archive_if_novel(id, entity, payload, now);
        Ok(id)
    }

    /// Registers a newly joined client and decides its catch-up path. No
    /// mid-round sync is needed when the archive is empty or the log still
    /// reaches back to the archive's first distinct event; otherwise the
    /// client replays the archive snapshot under a deadline. Coverage is an
    /// identity check on log ids: a later event can carry the exact content
    /// of the round's first one, so comparing payloads here would wrongly
    /// classify a joiner as caught up.
    pub fn client_joined(&mut self, client: ClientKey, now: GameTime) {
        let log_covers_round = match (self.log.oldest(), self.archive.first_origin_id()) {
            (Some(log_head), Some(first_origin)) => log_head.id == first_origin,
            _ => false,
        };

        let cursor = if self.archive.is_empty() || log_covers_round {
            let start_ack = match self.log.oldest() {
                Some(oldest) => oldest.id.wrapping_sub(1),
                None => self.log.newest_id(),
            };
            ClientCursor::new_caught_up(start_ack)
        } else {
            let unreceived_count = self.archive.len() as u16;
            let deadline = now.plus_seconds(self.config.sync_timeout(self.archive.len()));
            info!(
                "client {client:?} entering mid-round sync: {unreceived_count} archived events"
            );
            ClientCursor::new_syncing(
                unreceived_count,
                self.log.newest_id().wrapping_add(1),
                deadline,
            )
        };
        self.cursors.insert(client, cursor);
    }

    /// Removes the client's cursor and purges its buffered events, in the
    /// same call. Used for voluntary disconnects; kicks from
    /// [`tick`](Self::tick) purge internally before being returned.
    pub fn client_disconnected(&mut self, client: ClientKey) {
        self.cursors.remove(&client);
        self.inbox.purge_sender(client);
    }

    pub fn cursor(&self, client: ClientKey) -> Option<&ClientCursor> {
        self.cursors.get(&client)
    }

    /// Newest client-event id consumed from `client`, for the host to echo
    /// back in its next message to them.
    pub fn last_sent_ack(&self, client: ClientKey) -> Option<EventId> {
        self.cursors.get(&client).map(|c| c.last_sent_ack())
    }

    /// Feeds the client's newest-received acknowledgment into its cursor.
    pub fn receive_ack(&mut self, client: ClientKey, ack: EventId) {
        if let Some(cursor) = self.cursors.get_mut(&client) {
            cursor.receive_ack(ack);
        }
    }

    /// Updates the RTT estimate driving this client's resend throttle.
    pub fn update_rtt(&mut self, client: ClientKey, seconds: f64) {
        if let Some(cursor) = self.cursors.get_mut(&client) {
            cursor.set_round_trip_time(seconds);
        }
    }

    /// Selects and serializes this tick's batch for `client`. Draws from
    /// the archive snapshot while the client is mid-round syncing, from the
    /// live log otherwise. Returns whether anything was written.
    pub fn write_events(
        &mut self,
        client: ClientKey,
        writer: &mut BitWriter,
        now: GameTime,
    ) -> Result<bool, WireError> {
        let Some(cursor) = self.cursors.get_mut(&client) else {
            return Ok(false);
        };

        let (events, mid_round): (&mut [ServerEntityEvent], bool) = match cursor.sync() {
            MidRoundSync::Syncing {
                unreceived_count, ..
            } => {
                let bound = (unreceived_count as usize).min(self.archive.len());
                (&mut self.archive.events_mut()[..bound], true)
            }
            MidRoundSync::Complete => (self.log.events_mut(), false),
        };

        let indices = cursor.select_batch(events, &self.config, now);
        if indices.is_empty() {
            return Ok(false);
        }

        let selected: Vec<&ServerEntityEvent> =
            indices.iter().map(|index| &events[*index]).collect();
        wire::write_batch(writer, &selected, mid_round, &self.config)?;
        Ok(true)
    }

    /// Parses one client -> server event frame and buffers its events for
    /// gated dispatch. Every slot, null placeholders included, advances the
    /// consumed-id counter; slots at or behind it are replays and ignored.
    pub fn read_events(
        &mut self,
        client: ClientKey,
        reader: &mut BitReader,
    ) -> Result<(), WireError> {
        let frame = wire::read_client_events(reader, &self.config)?;
        let Some(cursor) = self.cursors.get_mut(&client) else {
            return Ok(());
        };

        for (offset, slot) in frame.slots.iter().enumerate() {
            let id = frame.first_event_id.wrapping_add(offset as u16);
            if !cursor.advance_sent_ack(id) {
                continue;
            }
            if let Some(slot) = slot {
                self.inbox.buffer(BufferedEvent::new(
                    client,
                    slot.character_state_id,
                    slot.target,
                    slot.payload.clone(),
                ));
            }
        }
        Ok(())
    }

    /// One server tick: run the desync monitor (purging whoever it kicks),
    /// dispatch every gated inbound event whose precondition now holds, and
    /// prune the log. Kick commands are returned for the connection layer
    /// to act on; the server itself never terminates here.
    pub fn tick(
        &mut self,
        directory: &mut dyn EntityDirectory,
        now: GameTime,
    ) -> Vec<KickCommand> {
        let kicks = desync::scan(&self.cursors, &self.log, &self.config, now);
        for kick in &kicks {
            info!("disconnecting client {:?}: {}", kick.client, kick.reason);
            self.cursors.remove(&kick.client);
            self.inbox.purge_sender(kick.client);
        }

        self.inbox.process_ready(directory);
        self.log.prune(desync::last_acked_by_all(&self.cursors));
        kicks
    }

    /// Round end: the log and archive restart empty, ids restart at 0, and
    /// every remaining cursor expects the new stream from its beginning.
    pub fn round_reset(&mut self) {
        self.log.clear();
        self.archive.clear();
        self.inbox.clear();
        for cursor in self.cursors.values_mut() {
            cursor.reset_for_round();
        }
    }

    pub fn event_log(&self) -> &EventLog {
        &self.log
    }

    pub fn unique_archive(&self) -> &UniqueArchive {
        &self.archive
    }

    pub fn buffered_event_count(&self) -> usize {
        self.inbox.len()
    }
}

impl Default for ReplicationState {
    fn default() -> Self {
        Self::new(ReplicationConfig::default())
    }
}

#[cfg(test)]
mod manager_tests {
    use super::ReplicationState;
    use crate::{
        config::ReplicationConfig,
        directory::{CharacterStatus, EntityDirectory},
        error::{ApplyError, CreateError},
        event::{EntityRef, EventKind, EventPayload},
    };
    use riptide_shared::{ClientKey, GameTime};

    struct EmptySim {
        live: Vec<EntityRef>,
    }

    impl EntityDirectory for EmptySim {
        fn entity_exists(&self, entity: EntityRef) -> bool {
            self.live.contains(&entity)
        }

        fn apply_event(
            &mut self,
            entity: EntityRef,
            _payload: &EventPayload,
            _origin: ClientKey,
        ) -> Result<(), ApplyError> {
            if self.live.contains(&entity) {
                Ok(())
            } else {
                Err(ApplyError::TargetMissing(entity))
            }
        }

        fn character_status(&self, _client: ClientKey) -> Option<CharacterStatus> {
            None
        }
    }

    fn payload(byte: u8) -> EventPayload {
        EventPayload::new(EventKind::ComponentState, vec![byte])
    }

    #[test]
    fn invalid_entity_is_rejected_not_logged() {
        let sim = EmptySim { live: vec![] };
        let mut state = ReplicationState::new(ReplicationConfig::default());

        let stale = EntityRef::new(3, 1);
        let result = state.create_event(&sim, stale, payload(1), GameTime::ZERO);
        assert_eq!(result, Err(CreateError::EntityInvalid(stale)));
        assert!(state.event_log().is_empty());
    }

    #[test]
    fn repeated_unsent_events_coalesce_to_one_entry() {
        let entity = EntityRef::new(1, 0);
        let sim = EmptySim { live: vec![entity] };
        let mut state = ReplicationState::new(ReplicationConfig::default());

        let first = state
            .create_event(&sim, entity, payload(7), GameTime::ZERO)
            .unwrap();
        for _ in 0..5 {
            let id = state
                .create_event(&sim, entity, payload(7), GameTime::ZERO)
                .unwrap();
            assert_eq!(id, first);
        }
        assert_eq!(state.event_log().len(), 1);
        assert_eq!(state.unique_archive().len(), 1);
    }

    #[test]
    fn joining_at_round_start_skips_mid_round_sync() {
        let mut state = ReplicationState::new(ReplicationConfig::default());
        state.client_joined(ClientKey::from_u64(1), GameTime::ZERO);
        assert!(!state.cursor(ClientKey::from_u64(1)).unwrap().is_syncing());
    }

    #[test]
    fn round_reset_restarts_the_stream_for_everyone() {
        let entity = EntityRef::new(1, 0);
        let sim = EmptySim { live: vec![entity] };
        let mut state = ReplicationState::new(ReplicationConfig::default());

        let client = ClientKey::from_u64(1);
        state.client_joined(client, GameTime::ZERO);
        for byte in 0..3 {
            state
                .create_event(&sim, entity, payload(byte), GameTime::ZERO)
                .unwrap();
        }
        state.receive_ack(client, 2);

        state.round_reset();
        assert!(state.event_log().is_empty());
        assert!(state.unique_archive().is_empty());

        // ids restart at 0 and the surviving cursor expects them
        let id = state
            .create_event(&sim, entity, payload(9), GameTime::ZERO)
            .unwrap();
        assert_eq!(id, 0);
        assert_eq!(state.cursor(client).unwrap().last_recv_ack(), u16::MAX);
    }

    #[test]
    fn repeated_content_at_the_log_head_still_requires_catch_up() {
        let entity = EntityRef::new(1, 0);
        let sim = EmptySim { live: vec![entity] };
        let mut state = ReplicationState::new(ReplicationConfig::default());

        // a toggling value: distinct states, then back to the first one;
        // with no clients connected the log prunes itself down as it goes
        for byte in 0..3 {
            state
                .create_event(&sim, entity, payload(byte), GameTime::ZERO)
                .unwrap();
        }
        state
            .create_event(&sim, entity, payload(0), GameTime::ZERO)
            .unwrap();
        state
            .create_event(&sim, entity, payload(3), GameTime::ZERO)
            .unwrap();

        // the log head now repeats the round's first content but is a later
        // event; the pruned distinct states only survive in the archive
        let head = state.event_log().oldest().unwrap();
        assert!(head.is_duplicate_of(&entity, &payload(0)));
        assert_ne!(Some(head.id), state.unique_archive().first_origin_id());
        assert!(state.unique_archive().len() > state.event_log().len());

        state.client_joined(ClientKey::from_u64(1), GameTime::ZERO);
        assert!(
            state.cursor(ClientKey::from_u64(1)).unwrap().is_syncing(),
            "a joiner missing pruned distinct events must replay the archive"
        );
    }

    #[test]
    fn joining_after_pruning_enters_mid_round_sync() {
        let entity = EntityRef::new(1, 0);
        let sim = EmptySim { live: vec![entity] };
        let mut state = ReplicationState::new(ReplicationConfig::default());

        // no clients connected: each create prunes down to the newest entry
        for byte in 0..6 {
            state
                .create_event(&sim, entity, payload(byte), GameTime::ZERO)
                .unwrap();
        }
        assert!(state.event_log().len() < state.unique_archive().len());

        state.client_joined(ClientKey::from_u64(1), GameTime::ZERO);
        assert!(state.cursor(ClientKey::from_u64(1)).unwrap().is_syncing());
    }
}
