//! Simulated module for tests.
//!
//! Answers read and write commands the way the hardware does, with knobs for
//! silence, split replies, stale input and wrong confirmations.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use bytes::{Buf, Bytes, BytesMut};
use futures::future::BoxFuture;

use crate::error::{Error, Result};
use crate::protocol::{Opcode, REPLY_LEN, encode_reply};
use crate::transport::Transport;

/// Shared state of a simulated module.
#[derive(Debug, Default)]
pub struct ModuleState {
    /// Register contents.
    pub registers: HashMap<u8, u8>,
    /// When false, commands are swallowed without a reply.
    pub responsive: bool,
    /// Value confirmed after a write instead of the one written.
    pub confirm_override: Option<u8>,
    /// Splits each reply into chunks of this size.
    pub chunk_size: Option<usize>,
    /// Extra bytes appended to every reply.
    pub trailing: Vec<u8>,
    /// Every command received, in order.
    pub commands: Vec<Bytes>,
    /// Largest number of unread reply bytes seen right after a command.
    pub max_unread: usize,
    /// Number of input flushes.
    pub flushes: usize,
    /// Number of connects.
    pub connects: usize,
    connected: bool,
    // Bytes the host can read now.
    inbox: BytesMut,
    // Chunks still "on the wire"; one lands in the inbox per poll.
    in_flight: VecDeque<Bytes>,
}

impl ModuleState {
    fn unread(&self) -> usize {
        self.inbox.len() + self.in_flight.iter().map(Bytes::len).sum::<usize>()
    }

    fn queue_reply(&mut self, reply: &[u8]) {
        let chunk = self.chunk_size.unwrap_or(reply.len()).max(1);
        for piece in reply.chunks(chunk) {
            self.in_flight.push_back(Bytes::copy_from_slice(piece));
        }
    }

    fn handle_command(&mut self, data: &[u8]) {
        self.commands.push(Bytes::copy_from_slice(data));
        if !self.responsive || data.len() < 3 {
            return;
        }

        let register = data[1];
        let mut reply = match (Opcode::from_byte(data[0]), data.get(3)) {
            (Some(Opcode::Read), _) => {
                let value = self.registers.get(&register).copied().unwrap_or(0);
                encode_reply(Opcode::Read.into(), register, value).to_vec()
            }
            (Some(Opcode::Write), Some(&value)) => {
                self.registers.insert(register, value);
                let confirmed = self.confirm_override.unwrap_or(value);
                encode_reply(Opcode::Write.into(), register, confirmed).to_vec()
            }
            _ => return,
        };
        reply.extend_from_slice(&self.trailing);
        self.queue_reply(&reply);
        self.max_unread = self.max_unread.max(self.unread());
    }
}

/// Handle for inspecting and steering a [`SimulatedModule`] from a test.
#[derive(Debug, Clone, Default)]
pub struct ModuleHandle(Arc<Mutex<ModuleState>>);

impl ModuleHandle {
    pub fn state(&self) -> MutexGuard<'_, ModuleState> {
        self.0.lock().unwrap()
    }

    /// Puts bytes into the host input buffer as if left over from earlier traffic.
    pub fn preload(&self, data: &[u8]) {
        self.state().inbox.extend_from_slice(data);
    }

    pub fn register(&self, register: u8) -> Option<u8> {
        self.state().registers.get(&register).copied()
    }
}

/// In-memory transport answering like a module in configuration mode.
#[derive(Debug, Default)]
pub struct SimulatedModule {
    handle: ModuleHandle,
}

impl SimulatedModule {
    /// Creates a responsive module with the given register contents.
    pub fn new(registers: &[(u8, u8)]) -> Self {
        let module = Self::default();
        {
            let mut state = module.handle.state();
            state.responsive = true;
            state.registers.extend(registers.iter().copied());
        }
        module
    }

    /// Creates a module that never answers.
    pub fn silent() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> ModuleHandle {
        self.handle.clone()
    }

    fn ensure_connected(state: &ModuleState) -> Result<()> {
        if state.connected {
            Ok(())
        } else {
            Err(Error::NotConnected)
        }
    }
}

impl Transport for SimulatedModule {
    fn connect(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let mut state = self.handle.state();
            state.connected = true;
            state.connects += 1;
            Ok(())
        })
    }

    fn disconnect(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            self.handle.state().connected = false;
            Ok(())
        })
    }

    fn send(&mut self, data: Bytes) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let mut state = self.handle.state();
            Self::ensure_connected(&state)?;
            state.handle_command(&data);
            Ok(())
        })
    }

    fn bytes_available(&mut self) -> Result<usize> {
        let mut state = self.handle.state();
        Self::ensure_connected(&state)?;
        if let Some(chunk) = state.in_flight.pop_front() {
            state.inbox.extend_from_slice(&chunk);
        }
        Ok(state.inbox.len())
    }

    fn read_available(&mut self, max: usize) -> BoxFuture<'_, Result<Bytes>> {
        Box::pin(async move {
            let mut state = self.handle.state();
            Self::ensure_connected(&state)?;
            let n = max.min(state.inbox.len());
            Ok(state.inbox.split_to(n).freeze())
        })
    }

    fn clear_input(&mut self) -> Result<()> {
        let mut state = self.handle.state();
        Self::ensure_connected(&state)?;
        state.flushes += 1;
        let stale = state.inbox.remaining();
        state.inbox.clear();
        if stale > 0 {
            tracing::trace!("simulated module dropped {} stale bytes", stale);
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.handle.state().connected
    }

    fn port_name(&self) -> &str {
        "simulated"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_reply_queued() {
        let mut module = SimulatedModule::new(&[(0x05, 0x41)]);
        module.connect().await.unwrap();
        module
            .send(Bytes::from_static(&[0xC1, 0x05, 0x01]))
            .await
            .unwrap();
        assert_eq!(module.bytes_available().unwrap(), REPLY_LEN);
        let reply = module.read_available(16).await.unwrap();
        assert_eq!(&reply[..], &[0xC1, 0x05, 0x01, 0x41]);
    }

    #[tokio::test]
    async fn test_chunks_arrive_one_per_poll() {
        let mut module = SimulatedModule::new(&[(0x03, 0x62)]);
        module.handle().state().chunk_size = Some(3);
        module.connect().await.unwrap();
        module
            .send(Bytes::from_static(&[0xC1, 0x03, 0x01]))
            .await
            .unwrap();
        assert_eq!(module.bytes_available().unwrap(), 3);
        assert_eq!(module.bytes_available().unwrap(), 4);
    }

    #[tokio::test]
    async fn test_silent_module() {
        let mut module = SimulatedModule::silent();
        module.connect().await.unwrap();
        module
            .send(Bytes::from_static(&[0xC1, 0x05, 0x01]))
            .await
            .unwrap();
        assert_eq!(module.bytes_available().unwrap(), 0);
        assert_eq!(module.handle().state().commands.len(), 1);
    }
}
