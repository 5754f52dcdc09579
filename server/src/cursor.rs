use std::collections::HashMap;

use riptide_shared::{sequence_more_recent, EventId, GameTime};

use crate::{config::ReplicationConfig, event::ServerEntityEvent};

/// Catch-up state for a client that joined after the round started.
///
/// `NotNeeded` collapses into `Complete` at join time, so only two states
/// are ever held.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MidRoundSync {
    /// Replaying the unique-event archive. `last_recv_ack` is interpreted in
    /// archive-local id space until this completes.
    Syncing {
        /// Archive entries the client must acknowledge before switching to
        /// the live log.
        unreceived_count: u16,
        /// First live-log id the client consumes after the replay; fixed at
        /// join so events created during the replay are not skipped.
        first_new_event_id: EventId,
        /// Kick the client if the replay is still running at this time.
        deadline: GameTime,
    },
    Complete,
}

/// Per-connected-client replication state: what the client has confirmed,
/// when each event was last sent to it, and where it stands in mid-round
/// catch-up. Drives all outbound selection for that client.
pub struct ClientCursor {
    /// Newest server event id the client has acknowledged receiving.
    /// Archive-local ids while syncing, live-log ids afterwards.
    last_recv_ack: EventId,
    /// Newest client-submitted event id the server has consumed; echoed back
    /// so the client can drop its own send buffer.
    last_sent_ack: EventId,
    sent_times: HashMap<EventId, GameTime>,
    sync: MidRoundSync,
    round_trip_time: f64,
}

impl ClientCursor {
    /// Cursor for a client that needs no catch-up; it consumes the live log
    /// starting with the first entry more recent than `start_ack`.
    pub fn new_caught_up(start_ack: EventId) -> Self {
        Self {
            last_recv_ack: start_ack,
            last_sent_ack: u16::MAX,
            sent_times: HashMap::new(),
            sync: MidRoundSync::Complete,
            round_trip_time: 0.0,
        }
    }

    /// Cursor entering mid-round sync: the client replays the first
    /// `unreceived_count` archive entries before touching the live log.
    pub fn new_syncing(
        unreceived_count: u16,
        first_new_event_id: EventId,
        deadline: GameTime,
    ) -> Self {
        Self {
            // -1 in archive space: entry 0 is the first thing wanted
            last_recv_ack: u16::MAX,
            last_sent_ack: u16::MAX,
            sent_times: HashMap::new(),
            sync: MidRoundSync::Syncing {
                unreceived_count,
                first_new_event_id,
                deadline,
            },
            round_trip_time: 0.0,
        }
    }

    pub fn last_recv_ack(&self) -> EventId {
        self.last_recv_ack
    }

    pub fn last_sent_ack(&self) -> EventId {
        self.last_sent_ack
    }

    pub fn sync(&self) -> MidRoundSync {
        self.sync
    }

    pub fn is_syncing(&self) -> bool {
        matches!(self.sync, MidRoundSync::Syncing { .. })
    }

    pub fn round_trip_time(&self) -> f64 {
        self.round_trip_time
    }

    pub fn set_round_trip_time(&mut self, seconds: f64) {
        self.round_trip_time = seconds.max(0.0);
    }

    /// Records the client's newest-received-event acknowledgment. Completes
    /// the mid-round replay once the acked count covers the whole archive
    /// snapshot, handing the cursor over to the live log without a gap.
    pub fn receive_ack(&mut self, ack: EventId) {
        if sequence_more_recent(ack, self.last_recv_ack) {
            self.last_recv_ack = ack;
            self.sent_times
                .retain(|id, _| sequence_more_recent(*id, ack));
        }

        if let MidRoundSync::Syncing {
            unreceived_count,
            first_new_event_id,
            ..
        } = self.sync
        {
            let last_needed = unreceived_count.wrapping_sub(1);
            if !sequence_more_recent(last_needed, self.last_recv_ack) {
                self.sync = MidRoundSync::Complete;
                self.last_recv_ack = first_new_event_id.wrapping_sub(1);
                self.sent_times.clear();
            }
        }
    }

    /// Advances the consumed-client-event counter. Returns whether `id` was
    /// actually new; stale or replayed slots return false.
    pub fn advance_sent_ack(&mut self, id: EventId) -> bool {
        if sequence_more_recent(id, self.last_sent_ack) {
            self.last_sent_ack = id;
            true
        } else {
            false
        }
    }

    /// Picks this tick's outbound batch from `events` (the live log, or the
    /// archive snapshot while syncing). Finds the first entry past
    /// `last_recv_ack` that was never sent to this client or whose last send
    /// is older than `resend_rtt_factor × rtt`, then takes the whole suffix
    /// from there, capped at `max_batch_size`. Selected entries are marked
    /// sent and timestamped. Returns indices into `events`.
    pub fn select_batch(
        &mut self,
        events: &mut [ServerEntityEvent],
        config: &ReplicationConfig,
        now: GameTime,
    ) -> Vec<usize> {
        let Some(start) = events
            .iter()
            .position(|event| sequence_more_recent(event.id, self.last_recv_ack))
        else {
            return Vec::new();
        };

        let resend_after = self.round_trip_time * config.resend_rtt_factor;
        let Some(begin) = (start..events.len()).find(|index| {
            match self.sent_times.get(&events[*index].id) {
                None => true,
                Some(sent_at) => now.seconds_since(*sent_at) > resend_after,
            }
        }) else {
            return Vec::new();
        };

        let end = (begin + config.max_batch_size).min(events.len());
        for index in begin..end {
            events[index].sent = true;
            self.sent_times.insert(events[index].id, now);
        }
        (begin..end).collect()
    }

    /// Round-end reset: the log restarts at id 0, so this cursor expects the
    /// whole new stream, and any in-flight bookkeeping is meaningless.
    pub fn reset_for_round(&mut self) {
        self.last_recv_ack = u16::MAX;
        self.last_sent_ack = u16::MAX;
        self.sent_times.clear();
        self.sync = MidRoundSync::Complete;
    }
}
