//! Child process helpers: bounded waits and readiness probes.

use std::io;
use std::net::{TcpStream, ToSocketAddrs};
use std::process::{Child, ExitStatus};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Result of waiting on a child with a deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The child exited on its own.
    Exited(ExitStatus),
    /// The deadline passed; the child has been killed and reaped.
    TimedOut,
}

/// Waits for `child` to exit, killing it once `timeout` has elapsed.
///
/// # Errors
///
/// Returns any I/O error raised while polling, killing or reaping the child.
pub fn wait_with_timeout(child: &mut Child, timeout: Duration) -> io::Result<WaitOutcome> {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(WaitOutcome::Exited(status));
        }

        if start.elapsed() > timeout {
            return handle_timeout(child);
        }

        thread::sleep(POLL_INTERVAL);
    }
}

fn handle_timeout(child: &mut Child) -> io::Result<WaitOutcome> {
    // The child may have exited between the last poll and the deadline check.
    if let Some(status) = child.try_wait()? {
        return Ok(WaitOutcome::Exited(status));
    }
    child.kill()?;
    child.wait()?;
    Ok(WaitOutcome::TimedOut)
}

/// Polls `address` until it accepts a TCP connection or `timeout` elapses.
///
/// Each connection attempt is bounded by the time left. An address that
/// does not resolve is retried until the budget runs out.
///
/// Returns `true` once a connection succeeds.
#[must_use]
pub fn wait_for_listener(address: &str, timeout: Duration) -> bool {
    let start = Instant::now();
    loop {
        if timeout.saturating_sub(start.elapsed()).is_zero() {
            return false;
        }
        if connect_within(address, start, timeout) {
            return true;
        }
        thread::sleep(POLL_INTERVAL.min(timeout.saturating_sub(start.elapsed())));
    }
}

fn connect_within(address: &str, start: Instant, timeout: Duration) -> bool {
    address.to_socket_addrs().is_ok_and(|mut candidates| {
        candidates.any(|candidate| {
            let remaining = timeout.saturating_sub(start.elapsed());
            !remaining.is_zero() && TcpStream::connect_timeout(&candidate, remaining).is_ok()
        })
    })
}
