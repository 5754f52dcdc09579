/// Tuning knobs for the replication core. `Default` carries the values the
/// protocol was designed around; hosts usually only touch `tick_interval`.
#[derive(Debug, Clone)]
pub struct ReplicationConfig {
    /// An already-sent event is retransmitted only once this multiple of the
    /// client's round-trip time has passed since the last send. Keeps the
    /// first copy a chance to arrive before burning bandwidth on another.
    pub resend_rtt_factor: f64,
    /// Maximum events per outbound frame; the rest of a selected suffix
    /// waits for the next tick.
    pub max_batch_size: usize,
    /// Seconds an event may sit unacknowledged before the clients still
    /// holding it open are kicked.
    pub stale_event_age: f64,
    /// Buffered client events beyond this count trigger an oldest-half drop.
    pub inbox_capacity: usize,
    /// Seconds between outbound ticks; feeds the mid-round sync timeout.
    pub tick_interval: f64,
    /// Floor for the mid-round sync deadline, seconds.
    pub min_sync_timeout: f64,
    /// Hard cap on a single event payload, bytes. An oversized payload is a
    /// local encoding bug and gets replaced by a null slot on the wire.
    pub max_payload_bytes: usize,
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            resend_rtt_factor: 1.5,
            max_batch_size: 32,
            stale_event_age: 10.0,
            inbox_capacity: 512,
            tick_interval: 0.05,
            min_sync_timeout: 10.0,
            max_payload_bytes: 1024,
        }
    }
}

impl ReplicationConfig {
    /// Deadline for one mid-round sync, measured from the moment the client
    /// joins: twice the ideal full-archive transmission time, floored at
    /// `min_sync_timeout`.
    pub fn sync_timeout(&self, archive_len: usize) -> f64 {
        let ideal =
            2.0 * archive_len as f64 / self.max_batch_size as f64 * self.tick_interval;
        ideal.max(self.min_sync_timeout)
    }
}
