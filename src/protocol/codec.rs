//! Versioned packet codec table.
//!
//! A [`PacketCodec`] maps packet ids to the decode and encode routines of one
//! protocol version. Unmapped ids are reported as [`ProtocolError::UnknownPacket`]
//! instead of falling through to a default.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::core::frame::encode_frames;
use crate::core::header::PacketHeader;
use crate::error::{ProtocolError, Result};
use crate::protocol::packet::{
    ids, DecodedPacket, ItemComponent, NetworkStackLatency, PacketBody,
};

/// Context handed to each decode routine
#[derive(Debug, Clone, Copy)]
pub struct DecodeContext {
    pub header: PacketHeader,
    pub protocol_version: u32,
}

type DecodeFn = dyn Fn(&mut Bytes, &DecodeContext) -> Result<PacketBody> + Send + Sync + 'static;
type EncodeFn = dyn Fn(&PacketBody, &mut BytesMut) -> Result<()> + Send + Sync + 'static;

struct PacketDefinition {
    decode: Box<DecodeFn>,
    encode: Box<EncodeFn>,
}

/// Packet table for one protocol version
pub struct PacketCodec {
    protocol_version: u32,
    packets: HashMap<u16, PacketDefinition>,
}

impl fmt::Debug for PacketCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<_> = self.packets.keys().copied().collect();
        ids.sort_unstable();
        f.debug_struct("PacketCodec")
            .field("protocol_version", &self.protocol_version)
            .field("packets", &ids)
            .finish()
    }
}

impl PacketCodec {
    pub fn builder(protocol_version: u32) -> PacketCodecBuilder {
        PacketCodecBuilder {
            codec: PacketCodec {
                protocol_version,
                packets: HashMap::new(),
            },
        }
    }

    /// Codec with the packets the transport itself interprets
    pub fn standard(protocol_version: u32) -> PacketCodecBuilder {
        Self::builder(protocol_version)
            .register(
                ids::NETWORK_STACK_LATENCY,
                decode_network_stack_latency,
                encode_network_stack_latency,
            )
            .register(ids::ITEM_COMPONENT, decode_item_component, encode_item_component)
    }

    pub fn protocol_version(&self) -> u32 {
        self.protocol_version
    }

    pub fn is_registered(&self, packet_id: u16) -> bool {
        self.packets.contains_key(&packet_id)
    }

    /// Decode the body that follows the header of a sub-frame.
    ///
    /// # Errors
    /// - `UnknownPacket` if no routine is registered for the id
    /// - `PacketSerialize` if the routine rejects the payload
    pub fn try_decode(&self, buf: &mut Bytes, header: PacketHeader) -> Result<PacketBody> {
        let definition =
            self.packets
                .get(&header.packet_id)
                .ok_or(ProtocolError::UnknownPacket {
                    id: header.packet_id,
                    protocol_version: self.protocol_version,
                })?;
        let ctx = DecodeContext {
            header,
            protocol_version: self.protocol_version,
        };
        (definition.decode)(buf, &ctx)
    }

    /// Write header and body of one packet, without the length prefix
    pub fn encode_packet(&self, packet: &DecodedPacket, buf: &mut BytesMut) -> Result<()> {
        let definition =
            self.packets
                .get(&packet.packet_id())
                .ok_or(ProtocolError::UnknownPacket {
                    id: packet.packet_id(),
                    protocol_version: self.protocol_version,
                })?;
        packet.header.encode(buf);
        (definition.encode)(&packet.body, buf)
    }

    /// Encode packets into an uncompressed batch of length-prefixed frames
    pub fn encode_batch(&self, packets: &[DecodedPacket]) -> Result<BytesMut> {
        let frames = packets
            .iter()
            .map(|packet| {
                let mut frame = BytesMut::new();
                self.encode_packet(packet, &mut frame)?;
                Ok(frame)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(encode_frames(frames))
    }
}

pub struct PacketCodecBuilder {
    codec: PacketCodec,
}

impl PacketCodecBuilder {
    /// Register decode and encode routines for a packet id, replacing any previous entry
    pub fn register<D, E>(mut self, packet_id: u16, decode: D, encode: E) -> Self
    where
        D: Fn(&mut Bytes, &DecodeContext) -> Result<PacketBody> + Send + Sync + 'static,
        E: Fn(&PacketBody, &mut BytesMut) -> Result<()> + Send + Sync + 'static,
    {
        self.codec.packets.insert(
            packet_id,
            PacketDefinition {
                decode: Box::new(decode),
                encode: Box::new(encode),
            },
        );
        self
    }

    /// Register an id whose payload is forwarded without interpretation
    pub fn register_raw(self, packet_id: u16) -> Self {
        self.register(packet_id, decode_raw, encode_raw)
    }

    pub fn build(self) -> Arc<PacketCodec> {
        Arc::new(self.codec)
    }
}

fn serialize_error(ctx: &DecodeContext, reason: impl Into<String>) -> ProtocolError {
    ProtocolError::PacketSerialize {
        id: ctx.header.packet_id,
        reason: reason.into(),
    }
}

fn decode_network_stack_latency(buf: &mut Bytes, ctx: &DecodeContext) -> Result<PacketBody> {
    if buf.remaining() < 9 {
        return Err(serialize_error(
            ctx,
            format!("expected 9 bytes, found {}", buf.remaining()),
        ));
    }
    let timestamp = buf.get_u64_le();
    let from_server = buf.get_u8() != 0;
    Ok(PacketBody::NetworkStackLatency(NetworkStackLatency {
        timestamp,
        from_server,
    }))
}

fn encode_network_stack_latency(body: &PacketBody, buf: &mut BytesMut) -> Result<()> {
    match body {
        PacketBody::NetworkStackLatency(latency) => {
            buf.put_u64_le(latency.timestamp);
            buf.put_u8(u8::from(latency.from_server));
            Ok(())
        }
        other => Err(body_mismatch(ids::NETWORK_STACK_LATENCY, other)),
    }
}

fn decode_item_component(buf: &mut Bytes, _ctx: &DecodeContext) -> Result<PacketBody> {
    let payload = buf.split_to(buf.len());
    Ok(PacketBody::ItemComponent(ItemComponent { payload }))
}

fn encode_item_component(body: &PacketBody, buf: &mut BytesMut) -> Result<()> {
    match body {
        PacketBody::ItemComponent(items) => {
            buf.put_slice(&items.payload);
            Ok(())
        }
        other => Err(body_mismatch(ids::ITEM_COMPONENT, other)),
    }
}

fn decode_raw(buf: &mut Bytes, _ctx: &DecodeContext) -> Result<PacketBody> {
    Ok(PacketBody::Raw(buf.split_to(buf.len())))
}

fn encode_raw(body: &PacketBody, buf: &mut BytesMut) -> Result<()> {
    match body {
        PacketBody::Raw(payload) => {
            buf.put_slice(payload);
            Ok(())
        }
        PacketBody::ItemComponent(items) => {
            buf.put_slice(&items.payload);
            Ok(())
        }
        PacketBody::NetworkStackLatency(latency) => {
            buf.put_u64_le(latency.timestamp);
            buf.put_u8(u8::from(latency.from_server));
            Ok(())
        }
    }
}

fn body_mismatch(id: u16, body: &PacketBody) -> ProtocolError {
    ProtocolError::PacketSerialize {
        id,
        reason: format!("cannot encode {body:?} as packet {id}"),
    }
}
