use log::warn;
use riptide_shared::{BitReader, BitWriter, EventId, SerdeErr};

use crate::{
    config::ReplicationConfig,
    error::WireError,
    event::{EntityRef, EventKind, EventPayload, ServerEntityEvent},
};

// Frame layout, server -> client:
//   [mid_round: 1 bit][event_count: ranged 0..=max_batch]
//   per event: [id: u16][present: 1 bit]
//              if present: [entity index: u16][entity generation: u16]
//                          [kind: ranged 0..COUNT][payload_len: ranged]
//                          [payload bytes]
// An absent slot ("null entity") still occupies an id: the receiver advances
// its expected-id counter past it. It is also the recovery marker when a
// payload fails to encode, so the stream stays parseable.
//
// Client -> server frames replace the leading id with one first_event_id and
// add the sender's character_state_id per present slot.

/// One decoded outbound slot, `None` for a null placeholder.
pub type OutboundSlot = Option<(EntityRef, EventPayload)>;

/// One decoded inbound (client-submitted) slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundSlot {
    pub target: EntityRef,
    pub character_state_id: u16,
    pub payload: EventPayload,
}

/// A parsed client -> server event frame. Slot `i` carries client event id
/// `first_event_id + i`; null slots count too.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientEventFrame {
    pub first_event_id: EventId,
    pub slots: Vec<Option<InboundSlot>>,
}

/// Serializes one outbound batch. An event whose payload cannot be encoded
/// is replaced in place by a null slot: the writer rewinds to the event's
/// mark, keeps the id, and moves on, so one bad payload never poisons the
/// frame.
pub fn write_batch(
    writer: &mut BitWriter,
    events: &[&ServerEntityEvent],
    mid_round: bool,
    config: &ReplicationConfig,
) -> Result<(), WireError> {
    writer.write_bit(mid_round);
    writer.write_ranged(events.len() as u32, 0, config.max_batch_size as u32)?;

    for event in events {
        writer.write_u16(event.id);
        let mark = writer.mark();
        if let Err(err) = write_event_body(writer, &event.entity, &event.payload, None, config) {
            warn!(
                "payload encode failed for event {} ({:?}), writing null slot: {}",
                event.id, event.entity, err
            );
            writer.rewind_to(&mark);
            writer.write_bit(false);
        }
    }
    Ok(())
}

/// Parses a server -> client batch; the inverse of [`write_batch`].
pub fn read_batch(
    reader: &mut BitReader,
    config: &ReplicationConfig,
) -> Result<(bool, Vec<(EventId, OutboundSlot)>), WireError> {
    let mid_round = reader.read_bit()?;
    let count = reader.read_ranged(0, config.max_batch_size as u32)?;

    let mut slots = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let id = reader.read_u16()?;
        if !reader.read_bit()? {
            slots.push((id, None));
            continue;
        }
        let (entity, _, payload) = read_event_body(reader, false, config)?;
        slots.push((id, Some((entity, payload))));
    }
    Ok((mid_round, slots))
}

/// Serializes a client -> server frame. Used by clients and by tests; the
/// server only parses these.
pub fn write_client_events(
    writer: &mut BitWriter,
    first_event_id: EventId,
    slots: &[Option<InboundSlot>],
    config: &ReplicationConfig,
) -> Result<(), WireError> {
    writer.write_u16(first_event_id);
    writer.write_ranged(slots.len() as u32, 0, config.max_batch_size as u32)?;

    for slot in slots {
        match slot {
            None => writer.write_bit(false),
            Some(slot) => {
                let mark = writer.mark();
                if let Err(err) = write_event_body(
                    writer,
                    &slot.target,
                    &slot.payload,
                    Some(slot.character_state_id),
                    config,
                ) {
                    warn!(
                        "payload encode failed for client event targeting {:?}, writing null slot: {}",
                        slot.target, err
                    );
                    writer.rewind_to(&mark);
                    writer.write_bit(false);
                }
            }
        }
    }
    Ok(())
}

/// Parses a client -> server frame.
pub fn read_client_events(
    reader: &mut BitReader,
    config: &ReplicationConfig,
) -> Result<ClientEventFrame, WireError> {
    let first_event_id = reader.read_u16()?;
    let count = reader.read_ranged(0, config.max_batch_size as u32)?;

    let mut slots = Vec::with_capacity(count as usize);
    for _ in 0..count {
        if !reader.read_bit()? {
            slots.push(None);
            continue;
        }
        let (target, character_state_id, payload) = read_event_body(reader, true, config)?;
        slots.push(Some(InboundSlot {
            target,
            character_state_id: character_state_id.unwrap_or_default(),
            payload,
        }));
    }
    Ok(ClientEventFrame {
        first_event_id,
        slots,
    })
}

fn write_event_body(
    writer: &mut BitWriter,
    entity: &EntityRef,
    payload: &EventPayload,
    character_state_id: Option<u16>,
    config: &ReplicationConfig,
) -> Result<(), WireError> {
    if payload.bytes.len() > config.max_payload_bytes {
        return Err(WireError::Serde(SerdeErr::PayloadTooLong {
            length: payload.bytes.len(),
            limit: config.max_payload_bytes,
        }));
    }

    writer.write_bit(true);
    writer.write_u16(entity.index);
    writer.write_u16(entity.generation);
    if let Some(state_id) = character_state_id {
        writer.write_u16(state_id);
    }
    writer.write_ranged(payload.kind.to_index(), 0, EventKind::COUNT - 1)?;
    writer.write_ranged(
        payload.bytes.len() as u32,
        0,
        config.max_payload_bytes as u32,
    )?;
    writer.write_bytes(&payload.bytes);
    Ok(())
}

fn read_event_body(
    reader: &mut BitReader,
    with_state_id: bool,
    config: &ReplicationConfig,
) -> Result<(EntityRef, Option<u16>, EventPayload), WireError> {
    let index = reader.read_u16()?;
    let generation = reader.read_u16()?;
    let character_state_id = if with_state_id {
        Some(reader.read_u16()?)
    } else {
        None
    };
    let kind_index = reader.read_ranged(0, EventKind::COUNT - 1)?;
    let kind = EventKind::from_index(kind_index).ok_or(WireError::UnknownEventKind(kind_index))?;
    let length = reader.read_ranged(0, config.max_payload_bytes as u32)?;
    let bytes = reader.read_bytes(length as usize)?;

    Ok((
        EntityRef::new(index, generation),
        character_state_id,
        EventPayload::new(kind, bytes),
    ))
}
