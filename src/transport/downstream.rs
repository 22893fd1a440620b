//! Backend connection driver.
//!
//! Feeds raw batches from the transport into the [`PacketDecoder`] strictly in
//! arrival order, one at a time, and applies the connection-level policies:
//! - an error escaping a batch tears the session down with `BadPacket`
//! - the end of the stream tears it down with `ClosedByRemotePeer`

use std::pin::pin;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tokio::io::AsyncRead;
use tokio_util::codec::{FramedRead, LengthDelimitedCodec};
use tracing::{debug, error, instrument};

use crate::error::{ProtocolError, Result};
use crate::protocol::decoder::PacketDecoder;
use crate::transport::session::{DisconnectReason, DownstreamSession};

pub struct DownstreamConnection<S> {
    session: S,
    decoder: PacketDecoder,
}

impl<S: DownstreamSession> DownstreamConnection<S> {
    pub fn new(session: S, decoder: PacketDecoder) -> Self {
        Self { session, decoder }
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut S {
        &mut self.session
    }

    pub fn decoder(&self) -> &PacketDecoder {
        &self.decoder
    }

    pub fn into_session(self) -> S {
        self.session
    }

    /// Decode and dispatch one raw batch
    pub fn on_batch(&mut self, batch: Bytes) -> Result<()> {
        self.decoder.decode(&mut self.session, batch)
    }

    /// The remote peer closed the channel
    pub fn on_closed(&mut self) {
        debug!(player = %self.session.player_name(), "Downstream channel closed");
        self.session.disconnect(DisconnectReason::ClosedByRemotePeer);
    }

    /// An error escaped the pipeline
    pub fn on_exception(&mut self, err: &ProtocolError) {
        let player = self.session.player_name();
        self.decoder.sink().notify(player, err, None);
        error!(player, error = %err, "Pipeline threw exception for player {player}");
        self.session.disconnect(DisconnectReason::BadPacket);
    }

    /// Drive the connection until the stream ends or an error escapes a batch.
    ///
    /// The error is returned after the session has been disconnected.
    pub async fn run<St, B, E>(&mut self, frames: St) -> Result<()>
    where
        St: Stream<Item = std::result::Result<B, E>>,
        B: Into<Bytes>,
        E: Into<ProtocolError>,
    {
        let mut frames = pin!(frames);
        while let Some(item) = frames.next().await {
            let outcome = match item {
                Ok(batch) => self.on_batch(batch.into()),
                Err(e) => Err(e.into()),
            };
            if let Err(e) = outcome {
                self.on_exception(&e);
                return Err(e);
            }
        }
        self.on_closed();
        Ok(())
    }

    /// Drive the connection over a byte stream framed by a 4-byte big-endian length
    #[instrument(skip_all, fields(player = %self.session.player_name()))]
    pub async fn run_length_delimited<R>(&mut self, io: R) -> Result<()>
    where
        R: AsyncRead + Unpin,
    {
        let codec = LengthDelimitedCodec::builder()
            .max_frame_length(self.decoder.config().max_transport_frame_size)
            .new_codec();
        self.run(FramedRead::new(io, codec)).await
    }
}
