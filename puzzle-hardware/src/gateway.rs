//! Channel gateway
//!
//! Owns the transport and the one reply buffer shared by every operation.
//! Both live behind a single mutex; an [`ExchangeGuard`] is the only way to
//! reach them, so at most one command/reply exchange is in flight and the
//! buffer is never read outside the exchange that filled it.

use crate::frame::Frame;
use crate::reply::DecodeError;
use puzzle_core::{BoardConfig, DefaultBoard, PuzzleError, Result};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, error};

/// Blocking byte transport to the MCU
///
/// Implementations frame the bytes onto the link, fill in and verify
/// checksums, and perform exactly one exchange per call. They must not retry
/// or reorder commands.
pub trait McuTransport: Send {
    /// Send `command` and write the reply into `reply`
    ///
    /// The last byte of `command` is the checksum slot. Returns the number of
    /// reply bytes written.
    fn write_command(&mut self, command: &[u8], reply: &mut [u8]) -> Result<usize>;
}

impl<T: McuTransport + ?Sized> McuTransport for Box<T> {
    fn write_command(&mut self, command: &[u8], reply: &mut [u8]) -> Result<usize> {
        (**self).write_command(command, reply)
    }
}

struct Link<T: ?Sized> {
    buffer: Box<[u8]>,
    transport: Box<T>,
}

/// Serializes every exchange onto one transport and one reply buffer
pub struct Gateway<T: McuTransport + ?Sized = dyn McuTransport> {
    link: Mutex<Link<T>>,
}

impl<T: McuTransport + ?Sized> Gateway<T> {
    pub fn new(transport: Box<T>) -> Self {
        Self {
            link: Mutex::new(Link {
                buffer: vec![0u8; DefaultBoard::BUF_SIZE].into_boxed_slice(),
                transport,
            }),
        }
    }

    /// Take exclusive use of the link
    ///
    /// Blocks until any exchange in progress has finished. A panic in another
    /// holder does not wedge the link: every exchange overwrites the buffer,
    /// so the poisoned state is recovered as is.
    pub fn lock(&self) -> ExchangeGuard<'_, T> {
        ExchangeGuard {
            link: self.link.lock().unwrap_or_else(PoisonError::into_inner),
        }
    }

    /// Exchange `frame` and decode the reply while still holding the link
    pub fn transact<R>(
        &self,
        frame: &Frame,
        decode: impl FnOnce(&[u8]) -> std::result::Result<R, DecodeError>,
    ) -> Result<R> {
        let mut guard = self.lock();
        let reply = guard.exchange(frame)?;
        Ok(decode(reply)?)
    }
}

/// Exclusive access to the link for the lifetime of the guard
pub struct ExchangeGuard<'a, T: McuTransport + ?Sized = dyn McuTransport> {
    link: MutexGuard<'a, Link<T>>,
}

impl<T: McuTransport + ?Sized> ExchangeGuard<'_, T> {
    /// Perform one exchange; the returned slice borrows the shared buffer
    pub fn exchange(&mut self, frame: &Frame) -> Result<&[u8]> {
        let link = &mut *self.link;

        debug!("TX: {:02X?}", frame.payload());

        let len = link
            .transport
            .write_command(frame.as_bytes(), &mut link.buffer)
            .map_err(|e| {
                error!("Exchange failed: {}", e);
                e
            })?;

        if len > link.buffer.len() {
            error!(
                "Transport reported {} reply bytes for a {} byte buffer",
                len,
                link.buffer.len()
            );
            return Err(PuzzleError::Transport(format!(
                "reply length {} exceeds buffer size {}",
                len,
                link.buffer.len()
            )));
        }

        debug!("RX: {:02X?}", &link.buffer[..len]);
        Ok(&link.buffer[..len])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame;
    use crate::reply;
    use std::collections::VecDeque;

    /// Transport replaying queued replies
    struct ScriptedTransport {
        replies: VecDeque<Result<Vec<u8>>>,
        sent: Vec<Vec<u8>>,
    }

    impl ScriptedTransport {
        fn new(replies: Vec<Result<Vec<u8>>>) -> Self {
            Self {
                replies: replies.into(),
                sent: Vec::new(),
            }
        }
    }

    impl McuTransport for ScriptedTransport {
        fn write_command(&mut self, command: &[u8], reply: &mut [u8]) -> Result<usize> {
            self.sent.push(command.to_vec());
            let bytes = self
                .replies
                .pop_front()
                .unwrap_or_else(|| Err(PuzzleError::Transport("No reply queued".to_string())))?;
            reply[..bytes.len()].copy_from_slice(&bytes);
            Ok(bytes.len())
        }
    }

    /// Transport that claims more bytes than it was given room for
    struct OverrunTransport;

    impl McuTransport for OverrunTransport {
        fn write_command(&mut self, _command: &[u8], reply: &mut [u8]) -> Result<usize> {
            Ok(reply.len() + 1)
        }
    }

    #[test]
    fn test_exchange_returns_reply_bytes() {
        let gateway = Gateway::new(Box::new(ScriptedTransport::new(vec![Ok(vec![
            0x40, 0x30, 0x70,
        ])])));

        let mut guard = gateway.lock();
        let reply = guard.exchange(&frame::temperature_all()).unwrap().to_vec();
        assert_eq!(reply, vec![0x40, 0x30, 0x70]);
    }

    #[test]
    fn test_exchange_sends_full_frame() {
        let gateway = Gateway::new(Box::new(ScriptedTransport::new(vec![Ok(vec![0x40])])));
        let ch = puzzle_core::Channel::new(1).unwrap();
        gateway.lock().exchange(&frame::pwm_write(ch, 3)).unwrap();

        let link = gateway.link.lock().unwrap();
        assert_eq!(link.transport.sent, vec![vec![0x40, 0x46, 0x57, 0x51, 0x03, 0x00]]);
    }

    #[test]
    fn test_transport_error_propagates_untouched() {
        let gateway = Gateway::new(Box::new(ScriptedTransport::new(vec![Err(
            PuzzleError::Timeout("no reply".to_string()),
        )])));

        let result = gateway.transact(&frame::temperature_all(), |r| Ok(r.len()));
        assert!(matches!(result, Err(PuzzleError::Timeout(_))));
    }

    #[test]
    fn test_reply_never_carries_stale_bytes() {
        let gateway = Gateway::new(Box::new(ScriptedTransport::new(vec![
            Ok(vec![1, 2, 3, 4, 5, 6, 7]),
            Err(PuzzleError::Transport("gone".to_string())),
            Ok(vec![9, 9, 9]),
        ])));

        let mut guard = gateway.lock();
        guard.exchange(&frame::temperature_all()).unwrap();
        assert!(guard.exchange(&frame::temperature_all()).is_err());
        let reply = guard.exchange(&frame::temperature_all()).unwrap();
        assert_eq!(reply, &[9, 9, 9]);
    }

    #[test]
    fn test_decode_failure_is_malformed_reply() {
        let gateway = Gateway::new(Box::new(ScriptedTransport::new(vec![Ok(vec![
            0x40, 0x30, 0x71,
        ])])));

        let result = gateway.transact(&frame::temperature_all(), reply::pwm_write_ack);
        assert!(matches!(result, Err(PuzzleError::MalformedReply(_))));
    }

    #[test]
    fn test_overlong_reply_length_rejected() {
        let gateway = Gateway::new(Box::new(OverrunTransport));
        let result = gateway.lock().exchange(&frame::temperature_all()).map(|r| r.len());
        assert!(matches!(result, Err(PuzzleError::Transport(_))));
    }

    #[test]
    fn test_lock_released_after_error() {
        let gateway = Gateway::new(Box::new(ScriptedTransport::new(vec![
            Err(PuzzleError::Transport("first".to_string())),
            Ok(vec![0x40, 0x30, 0x70]),
        ])));

        assert!(gateway
            .transact(&frame::temperature_all(), |r| Ok(r.len()))
            .is_err());
        assert_eq!(
            gateway
                .transact(&frame::temperature_all(), |r| Ok(r.len()))
                .unwrap(),
            3
        );
    }

    #[test]
    fn test_poisoned_lock_recovered() {
        let gateway = std::sync::Arc::new(Gateway::new(Box::new(ScriptedTransport::new(vec![
            Ok(vec![0x40, 0x30, 0x70]),
        ]))));

        let g = gateway.clone();
        let _ = std::thread::spawn(move || {
            let _guard = g.lock();
            panic!("holder died");
        })
        .join();

        assert!(gateway.link.is_poisoned());
        assert!(gateway
            .transact(&frame::temperature_all(), reply::pwm_write_ack)
            .is_ok());
    }
}
