/// Inbound path: client-submitted frames are parsed, buffered, gated on the
/// authoritative simulation's progress, and acknowledged by slot even when a
/// slot is a null placeholder.
use std::collections::HashMap;

use riptide_server::{
    wire::{self, InboundSlot},
    ApplyError, BitReader, BitWriter, CharacterStatus, ClientKey, EntityDirectory, EntityRef,
    EventKind, EventPayload, GameTime, ReplicationConfig, ReplicationState,
};

struct Sim {
    live: Vec<EntityRef>,
    statuses: HashMap<ClientKey, CharacterStatus>,
    applied: Vec<(EntityRef, Vec<u8>)>,
}

impl Sim {
    fn new() -> Self {
        Self {
            live: Vec::new(),
            statuses: HashMap::new(),
            applied: Vec::new(),
        }
    }
}

impl EntityDirectory for Sim {
    fn entity_exists(&self, entity: EntityRef) -> bool {
        self.live.contains(&entity)
    }

    fn apply_event(
        &mut self,
        entity: EntityRef,
        payload: &EventPayload,
        _origin: ClientKey,
    ) -> Result<(), ApplyError> {
        if !self.live.contains(&entity) {
            return Err(ApplyError::TargetMissing(entity));
        }
        self.applied.push((entity, payload.bytes.clone()));
        Ok(())
    }

    fn character_status(&self, client: ClientKey) -> Option<CharacterStatus> {
        self.statuses.get(&client).copied()
    }
}

fn slot(target: EntityRef, state_id: u16, byte: u8) -> Option<InboundSlot> {
    Some(InboundSlot {
        target,
        character_state_id: state_id,
        payload: EventPayload::new(EventKind::Control, vec![byte]),
    })
}

fn deliver(
    state: &mut ReplicationState,
    client: ClientKey,
    first_event_id: u16,
    slots: &[Option<InboundSlot>],
) {
    let mut writer = BitWriter::new();
    wire::write_client_events(&mut writer, first_event_id, slots, state.config()).unwrap();
    let bytes = writer.to_bytes();
    let mut reader = BitReader::new(&bytes);
    state.read_events(client, &mut reader).unwrap();
}

#[test]
fn events_wait_for_the_simulation_then_dispatch_in_order() {
    let target = EntityRef::new(4, 0);
    let mut sim = Sim::new();
    sim.live.push(target);
    let client = ClientKey::from_u64(1);
    sim.statuses.insert(
        client,
        CharacterStatus {
            processed_input_id: 10,
            incapacitated: false,
        },
    );

    let mut state = ReplicationState::new(ReplicationConfig::default());
    state.client_joined(client, GameTime::ZERO);

    // two events generated at client tick 12: ahead of the simulation
    deliver(
        &mut state,
        client,
        0,
        &[slot(target, 12, 0xA1), slot(target, 12, 0xA2)],
    );
    assert_eq!(state.buffered_event_count(), 2);
    assert_eq!(state.last_sent_ack(client), Some(1));

    state.tick(&mut sim, GameTime::from_seconds(0.05));
    assert!(sim.applied.is_empty(), "gate must hold until tick 12");

    sim.statuses.insert(
        client,
        CharacterStatus {
            processed_input_id: 12,
            incapacitated: false,
        },
    );
    state.tick(&mut sim, GameTime::from_seconds(0.1));
    assert_eq!(
        sim.applied,
        vec![(target, vec![0xA1]), (target, vec![0xA2])]
    );
    assert_eq!(state.buffered_event_count(), 0);
}

#[test]
fn null_slots_advance_the_ack_counter() {
    let target = EntityRef::new(4, 0);
    let mut sim = Sim::new();
    sim.live.push(target);
    let client = ClientKey::from_u64(1);
    sim.statuses.insert(
        client,
        CharacterStatus {
            processed_input_id: 50,
            incapacitated: false,
        },
    );

    let mut state = ReplicationState::new(ReplicationConfig::default());
    state.client_joined(client, GameTime::ZERO);

    deliver(
        &mut state,
        client,
        0,
        &[slot(target, 1, 0x01), None, slot(target, 1, 0x03)],
    );
    // the placeholder consumed id 1; all three slots are acked
    assert_eq!(state.last_sent_ack(client), Some(2));
    assert_eq!(state.buffered_event_count(), 2);
    state.tick(&mut sim, GameTime::from_seconds(0.05));
    assert_eq!(sim.applied.len(), 2);
}

#[test]
fn replayed_frames_are_not_buffered_twice() {
    let target = EntityRef::new(4, 0);
    let mut sim = Sim::new();
    sim.live.push(target);
    let client = ClientKey::from_u64(1);
    sim.statuses.insert(
        client,
        CharacterStatus {
            processed_input_id: 50,
            incapacitated: false,
        },
    );

    let mut state = ReplicationState::new(ReplicationConfig::default());
    state.client_joined(client, GameTime::ZERO);

    let slots = [slot(target, 1, 0x01), slot(target, 1, 0x02)];
    deliver(&mut state, client, 0, &slots);
    // the client re-sends the same frame before seeing our ack
    deliver(&mut state, client, 0, &slots);

    assert_eq!(state.buffered_event_count(), 2);
    state.tick(&mut sim, GameTime::from_seconds(0.05));
    assert_eq!(sim.applied.len(), 2);
}

#[test]
fn disconnect_purges_pending_events_immediately() {
    let target = EntityRef::new(4, 0);
    let mut sim = Sim::new();
    sim.live.push(target);
    let client = ClientKey::from_u64(1);
    // gate stays closed so the events sit in the buffer
    sim.statuses.insert(
        client,
        CharacterStatus {
            processed_input_id: 0,
            incapacitated: false,
        },
    );

    let mut state = ReplicationState::new(ReplicationConfig::default());
    state.client_joined(client, GameTime::ZERO);
    deliver(&mut state, client, 0, &[slot(target, 30, 0x01)]);
    assert_eq!(state.buffered_event_count(), 1);

    state.client_disconnected(client);
    assert_eq!(state.buffered_event_count(), 0);
    assert!(state.cursor(client).is_none());

    state.tick(&mut sim, GameTime::from_seconds(0.05));
    assert!(sim.applied.is_empty());
}
