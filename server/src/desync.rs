use std::{collections::HashMap, fmt};

use log::warn;
use riptide_shared::{sequence_more_recent, try_wrapping_diff, ClientKey, GameTime};

use crate::{
    config::ReplicationConfig,
    cursor::{ClientCursor, MidRoundSync},
    event_log::EventLog,
};

/// Why the monitor decided a client has to go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KickReason {
    /// The client needs an event id older than anything the log retains.
    ExcessiveDesync,
    /// Mid-round catch-up did not finish before its deadline.
    SyncTimeout,
    /// The client held an event unacknowledged past the staleness threshold.
    StaleEvents,
}

impl fmt::Display for KickReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KickReason::ExcessiveDesync => write!(f, "excessive desync"),
            KickReason::SyncTimeout => write!(f, "mid-round sync took too long"),
            KickReason::StaleEvents => {
                write!(f, "failed to acknowledge events within the staleness threshold")
            }
        }
    }
}

/// A disconnect decision. The core owns no sockets; the enclosing connection
/// layer executes these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KickCommand {
    pub client: ClientKey,
    pub reason: KickReason,
}

/// One pass of the desync monitor over every connected client. Returns the
/// clients that have fallen unrecoverably behind; duplicates are never
/// emitted for one client in one pass.
pub fn scan(
    cursors: &HashMap<ClientKey, ClientCursor>,
    log: &EventLog,
    config: &ReplicationConfig,
    now: GameTime,
) -> Vec<KickCommand> {
    let mut kicks = Vec::new();

    for (client, cursor) in cursors {
        if let MidRoundSync::Syncing { deadline, .. } = cursor.sync() {
            if now > deadline {
                warn!(
                    "kicking client {:?}: mid-round sync missed its deadline",
                    client
                );
                kicks.push(KickCommand {
                    client: *client,
                    reason: KickReason::SyncTimeout,
                });
            }
            // syncing clients read the archive, not the log; the remaining
            // checks do not apply to them
            continue;
        }

        let Some(oldest) = log.oldest() else {
            continue;
        };

        let next_expected = cursor.last_recv_ack().wrapping_add(1);
        if sequence_more_recent(oldest.id, next_expected) {
            warn!(
                "kicking client {:?}: needs event {} but the log now starts at {}",
                client, next_expected, oldest.id
            );
            kicks.push(KickCommand {
                client: *client,
                reason: KickReason::ExcessiveDesync,
            });
            continue;
        }

        // the oldest entry this client has not acked is the first one past
        // its ack; created_at is monotone along the log, so one check covers
        // the client's whole unacked range
        let oldest_unacked = log
            .events()
            .iter()
            .find(|event| sequence_more_recent(event.id, cursor.last_recv_ack()));
        if let Some(event) = oldest_unacked {
            if now.seconds_since(event.created_at) > config.stale_event_age {
                let lag = try_wrapping_diff(cursor.last_recv_ack(), log.newest_id())
                    .unwrap_or(i16::MAX);
                warn!(
                    "kicking client {:?}: event {} unacknowledged for over {}s ({} events behind)",
                    client, event.id, config.stale_event_age, lag
                );
                kicks.push(KickCommand {
                    client: *client,
                    reason: KickReason::StaleEvents,
                });
            }
        }
    }

    kicks
}

/// Minimum `last_recv_ack` across in-game clients not currently mid-round
/// syncing; the prune floor. `None` when no such client exists.
pub fn last_acked_by_all(cursors: &HashMap<ClientKey, ClientCursor>) -> Option<u16> {
    let mut floor: Option<u16> = None;
    for cursor in cursors.values() {
        if cursor.is_syncing() {
            continue;
        }
        let ack = cursor.last_recv_ack();
        floor = Some(match floor {
            None => ack,
            Some(current) => {
                if sequence_more_recent(current, ack) {
                    ack
                } else {
                    current
                }
            }
        });
    }
    floor
}
