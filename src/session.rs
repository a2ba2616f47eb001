//! Request/reply session over a [`Transport`].
//!
//! The wire format carries no sequence numbers, so the session is what ties a
//! reply to its command: every exchange needs `&mut Session`, which rules out a
//! second command going out while a reply is still pending.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::time::Instant;

use crate::error::{Error, FrameError, Result};
use crate::protocol::REPLY_LEN;
use crate::transport::Transport;

/// Default interval between input buffer polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Lower bound applied to the poll interval.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Default wait between the first byte showing up and reading the buffer.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(50);

/// Default bound on waiting for one reply.
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_millis(2000);

// Stand-in deadline for timeouts that overflow `Instant`.
const UNBOUNDED_WAIT: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Timing configuration for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Interval between input buffer polls (never below [`MIN_POLL_INTERVAL`]).
    pub poll_interval: Duration,
    /// Wait after bytes appear so the rest of the reply can land.
    pub settle_delay: Duration,
    /// Bound used by operations that don't take an explicit timeout.
    pub reply_timeout: Duration,
}

impl SessionConfig {
    /// Creates a configuration with default timings.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            settle_delay: DEFAULT_SETTLE_DELAY,
            reply_timeout: DEFAULT_REPLY_TIMEOUT,
        }
    }

    /// Sets the poll interval.
    #[must_use]
    pub const fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the settle delay.
    #[must_use]
    pub const fn settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Sets the default reply timeout.
    #[must_use]
    pub const fn reply_timeout(mut self, timeout: Duration) -> Self {
        self.reply_timeout = timeout;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Aborts the reply wait of the session it came from.
///
/// A cancel issued while no reply is awaited applies to the next one. Opening
/// the session again clears it.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    /// Requests cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Returns true if a cancellation is pending.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// One configuration run against a module: open, flush, exchanges, close.
///
/// Dropping the session drops the transport, which releases the port.
pub struct Session<T> {
    transport: T,
    config: SessionConfig,
    cancelled: Arc<AtomicBool>,
    // Set while a reply wait runs; still set afterwards if its future was dropped.
    awaiting_reply: bool,
}

impl<T: Transport> Session<T> {
    /// Creates a closed session around a transport.
    #[must_use]
    pub fn new(transport: T, config: SessionConfig) -> Self {
        Self {
            transport,
            config,
            cancelled: Arc::new(AtomicBool::new(false)),
            awaiting_reply: false,
        }
    }

    /// Creates a session and opens it.
    pub async fn connect(transport: T, config: SessionConfig) -> Result<Self> {
        let mut session = Self::new(transport, config);
        session.open().await?;
        Ok(session)
    }

    /// Opens the link and discards anything already buffered.
    pub async fn open(&mut self) -> Result<()> {
        if self.awaiting_reply {
            tracing::debug!("previous reply wait was abandoned, closing first");
            self.abort().await;
        }
        self.cancelled.store(false, Ordering::SeqCst);
        self.transport.connect().await?;
        self.flush_input()
    }

    /// Closes the link. Safe to call on a closed session.
    pub async fn close(&mut self) -> Result<()> {
        if self.transport.is_connected() {
            tracing::debug!("closing session on {}", self.transport.port_name());
        }
        let result = self.transport.disconnect().await;
        self.awaiting_reply = false;
        result
    }

    /// Returns true if the link is open.
    ///
    /// An abandoned reply wait counts as closed.
    #[must_use]
    pub fn is_open(&self) -> bool {
        !self.awaiting_reply && self.transport.is_connected()
    }

    /// Returns the timing configuration.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Returns a handle that cancels the pending reply wait.
    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            flag: Arc::clone(&self.cancelled),
        }
    }

    /// Returns the underlying transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Consumes the session and returns the transport.
    pub fn into_transport(self) -> T {
        self.transport
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(Error::NotConnected)
        }
    }

    /// Discards buffered input so a stale reply can't be taken for a new one.
    pub fn flush_input(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.transport.clear_input()?;
        tracing::trace!("flushed input on {}", self.transport.port_name());
        Ok(())
    }

    /// Writes a command frame verbatim.
    pub async fn send(&mut self, frame: Bytes) -> Result<()> {
        self.ensure_open()?;
        tracing::debug!("-> {}", hex::encode(&frame));
        self.transport.send(frame).await
    }

    /// Waits for one complete reply.
    ///
    /// Polls the input buffer every `poll_interval`. Once bytes show up it
    /// waits `settle_delay`, reads everything buffered and adds it to the
    /// reply. The reply is returned as soon as exactly [`REPLY_LEN`] bytes
    /// have been collected; fewer keeps the wait going.
    ///
    /// # Errors
    ///
    /// - [`Error::Timeout`] if no complete reply arrives within `timeout`
    /// - [`Error::Cancelled`] if the [`CancelHandle`] fires
    /// - [`FrameError::MalformedReply`] if more than [`REPLY_LEN`] bytes arrive
    ///
    /// On timeout and cancellation the session is closed and any partial reply
    /// is discarded. Dropping the returned future before it completes also
    /// leaves the session closed: [`is_open`](Self::is_open) reports false and
    /// further exchanges fail with [`Error::NotConnected`] until
    /// [`open`](Self::open) is called again.
    ///
    /// A `timeout` too large to represent as a deadline waits indefinitely.
    pub async fn receive_reply(&mut self, timeout: Duration) -> Result<Bytes> {
        self.ensure_open()?;

        self.awaiting_reply = true;
        let result = self.poll_reply(timeout).await;
        self.awaiting_reply = false;
        result
    }

    async fn poll_reply(&mut self, timeout: Duration) -> Result<Bytes> {
        let deadline = Instant::now()
            .checked_add(timeout)
            .unwrap_or_else(|| Instant::now() + UNBOUNDED_WAIT);
        let poll_interval = self.config.poll_interval.max(MIN_POLL_INTERVAL);
        let mut reply = BytesMut::with_capacity(REPLY_LEN);

        loop {
            if self.cancelled.swap(false, Ordering::SeqCst) {
                tracing::debug!("reply wait cancelled, {} bytes discarded", reply.len());
                self.abort().await;
                return Err(Error::Cancelled);
            }

            if self.transport.bytes_available()? > 0 {
                let settle_until = Instant::now()
                    .checked_add(self.config.settle_delay)
                    .map_or(deadline, |at| at.min(deadline));
                tokio::time::sleep_until(settle_until).await;

                let available = self.transport.bytes_available()?;
                let chunk = self.transport.read_available(available).await?;
                tracing::trace!("read {} bytes: {}", chunk.len(), hex::encode(&chunk));
                reply.extend_from_slice(&chunk);

                if reply.len() == REPLY_LEN {
                    tracing::debug!("<- {}", hex::encode(&reply));
                    return Ok(reply.freeze());
                }
                if reply.len() > REPLY_LEN {
                    tracing::warn!("oversized reply: {}", hex::encode(&reply));
                    return Err(FrameError::MalformedReply {
                        expected: REPLY_LEN,
                        got: reply.len(),
                    }
                    .into());
                }
            }

            let now = Instant::now();
            if now >= deadline {
                tracing::debug!(
                    "no complete reply after {:?}, {} bytes discarded",
                    timeout,
                    reply.len()
                );
                self.abort().await;
                return Err(Error::Timeout {
                    timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                });
            }

            tokio::time::sleep(poll_interval.min(deadline - now)).await;
        }
    }

    /// Sends a command and waits for its reply.
    pub async fn exchange(&mut self, frame: Bytes, timeout: Duration) -> Result<Bytes> {
        self.send(frame).await?;
        self.receive_reply(timeout).await
    }

    async fn abort(&mut self) {
        if let Err(e) = self.close().await {
            tracing::warn!("failed to close {}: {}", self.transport.port_name(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::SimulatedModule;

    const READ_CHANNEL: &[u8] = &[0xC1, 0x05, 0x01];

    #[test]
    fn test_session_config_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.poll_interval, DEFAULT_POLL_INTERVAL);
        assert_eq!(config.settle_delay, DEFAULT_SETTLE_DELAY);
        assert_eq!(config.reply_timeout, Duration::from_millis(2000));
    }

    #[test]
    fn test_session_config_builder() {
        let config = SessionConfig::new()
            .poll_interval(Duration::from_millis(10))
            .settle_delay(Duration::ZERO)
            .reply_timeout(Duration::from_secs(1));
        assert_eq!(config.poll_interval, Duration::from_millis(10));
        assert_eq!(config.settle_delay, Duration::ZERO);
        assert_eq!(config.reply_timeout, Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_receive_reply() {
        let module = SimulatedModule::new(&[(0x05, 0x41)]);
        let mut session = Session::connect(module, SessionConfig::default())
            .await
            .unwrap();

        let reply = session
            .exchange(Bytes::from_static(READ_CHANNEL), DEFAULT_REPLY_TIMEOUT)
            .await
            .unwrap();
        assert_eq!(&reply[..], &[0xC1, 0x05, 0x01, 0x41]);
        assert!(session.is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_module_times_out() {
        let module = SimulatedModule::silent();
        let mut session = Session::connect(module, SessionConfig::default())
            .await
            .unwrap();

        let started = Instant::now();
        let err = session
            .exchange(Bytes::from_static(READ_CHANNEL), Duration::from_millis(2000))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Timeout { timeout_ms: 2000 }));
        assert!(started.elapsed() >= Duration::from_millis(2000));
        assert!(started.elapsed() < Duration::from_millis(2100));
        assert!(!session.is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn test_split_reply_reassembled() {
        let module = SimulatedModule::new(&[(0x05, 0x41)]);
        module.handle().state().chunk_size = Some(1);
        let mut session = Session::connect(module, SessionConfig::default())
            .await
            .unwrap();

        let reply = session
            .exchange(Bytes::from_static(READ_CHANNEL), DEFAULT_REPLY_TIMEOUT)
            .await
            .unwrap();
        assert_eq!(&reply[..], &[0xC1, 0x05, 0x01, 0x41]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_reply_is_not_accepted() {
        let module = SimulatedModule::silent();
        let handle = module.handle();
        let mut session = Session::connect(module, SessionConfig::default())
            .await
            .unwrap();

        handle.preload(&[0xC1, 0x05, 0x01]);
        let err = session
            .receive_reply(Duration::from_millis(500))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_long_reply_is_malformed() {
        let module = SimulatedModule::new(&[(0x05, 0x41)]);
        module.handle().state().trailing = vec![0x00];
        let mut session = Session::connect(module, SessionConfig::default())
            .await
            .unwrap();

        let err = session
            .exchange(Bytes::from_static(READ_CHANNEL), DEFAULT_REPLY_TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Frame(FrameError::MalformedReply {
                expected: 4,
                got: 5
            })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_flushes_stale_input() {
        let module = SimulatedModule::new(&[(0x05, 0x41)]);
        let handle = module.handle();
        let mut session = Session::new(module, SessionConfig::default());

        session.open().await.unwrap();
        handle.preload(&[0xDE, 0xAD]);
        session.flush_input().unwrap();

        let reply = session
            .exchange(Bytes::from_static(READ_CHANNEL), DEFAULT_REPLY_TIMEOUT)
            .await
            .unwrap();
        assert_eq!(reply[3], 0x41);
        assert_eq!(handle.state().flushes, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_closes_session() {
        let module = SimulatedModule::silent();
        let mut session = Session::connect(module, SessionConfig::default())
            .await
            .unwrap();
        let cancel = session.cancel_handle();

        let waiter = session.exchange(Bytes::from_static(READ_CHANNEL), Duration::from_secs(60));
        let canceller = async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            cancel.cancel();
        };
        let (result, ()) = tokio::join!(waiter, canceller);

        assert!(matches!(result, Err(Error::Cancelled)));
        assert!(!session.is_open());
        assert!(!cancel.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reopen_after_timeout() {
        let module = SimulatedModule::new(&[(0x05, 0x41)]);
        let handle = module.handle();
        handle.state().responsive = false;
        let mut session = Session::connect(module, SessionConfig::default())
            .await
            .unwrap();

        assert!(
            session
                .exchange(Bytes::from_static(READ_CHANNEL), Duration::from_millis(200))
                .await
                .is_err()
        );
        assert!(matches!(
            session.send(Bytes::from_static(READ_CHANNEL)).await,
            Err(Error::NotConnected)
        ));

        handle.state().responsive = true;
        session.open().await.unwrap();
        let reply = session
            .exchange(Bytes::from_static(READ_CHANNEL), DEFAULT_REPLY_TIMEOUT)
            .await
            .unwrap();
        assert_eq!(reply[3], 0x41);
        assert_eq!(handle.state().connects, 2);
    }

    #[tokio::test]
    async fn test_closed_session_rejects_exchange() {
        let mut session = Session::new(SimulatedModule::silent(), SessionConfig::default());
        assert!(matches!(
            session.receive_reply(Duration::from_millis(10)).await,
            Err(Error::NotConnected)
        ));
        session.close().await.unwrap();
        session.close().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_timeout_waits_for_reply() {
        let module = SimulatedModule::new(&[(0x05, 0x41)]);
        let mut session = Session::connect(module, SessionConfig::default())
            .await
            .unwrap();

        let reply = session
            .exchange(Bytes::from_static(READ_CHANNEL), Duration::MAX)
            .await
            .unwrap();
        assert_eq!(reply[3], 0x41);
        assert!(session.is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_timeout_still_cancellable() {
        let mut session = Session::connect(SimulatedModule::silent(), SessionConfig::default())
            .await
            .unwrap();
        let cancel = session.cancel_handle();

        let waiter = session.exchange(Bytes::from_static(READ_CHANNEL), Duration::MAX);
        let canceller = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            cancel.cancel();
        };
        let (result, ()) = tokio::join!(waiter, canceller);

        assert!(matches!(result, Err(Error::Cancelled)));
        assert!(!session.is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_wait_leaves_session_closed() {
        let module = SimulatedModule::new(&[(0x05, 0x41)]);
        let handle = module.handle();
        handle.state().responsive = false;
        let mut session = Session::connect(module, SessionConfig::default())
            .await
            .unwrap();

        let waited = tokio::time::timeout(
            Duration::from_millis(100),
            session.exchange(Bytes::from_static(READ_CHANNEL), Duration::from_secs(60)),
        )
        .await;
        assert!(waited.is_err());

        assert!(!session.is_open());
        assert!(matches!(
            session.send(Bytes::from_static(READ_CHANNEL)).await,
            Err(Error::NotConnected)
        ));

        handle.state().responsive = true;
        session.open().await.unwrap();
        let reply = session
            .exchange(Bytes::from_static(READ_CHANNEL), DEFAULT_REPLY_TIMEOUT)
            .await
            .unwrap();
        assert_eq!(reply[3], 0x41);
        assert_eq!(handle.state().connects, 2);
    }
}
