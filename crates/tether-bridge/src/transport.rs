use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use tether_wire::{KernelRequest, KernelResponse};

use crate::error::BridgeError;

/// The opaque request/response channel to the kernel.
///
/// One `roundtrip` is one blocking exchange: the implementation must not
/// return until the kernel has answered this request. Requests issued
/// through a single transport are observed by the kernel in issue order;
/// there is no pipelining.
pub trait KernelTransport: Send {
    fn roundtrip(&mut self, request: &KernelRequest) -> Result<KernelResponse, BridgeError>;
}

/// A kernel running as a child process, one JSON line per request and per
/// response, over its stdin/stdout. The kernel's stderr is inherited so
/// its diagnostics stay visible.
pub struct StdioTransport {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl StdioTransport {
    /// Spawn the kernel process and take ownership of its stdio channel.
    pub fn spawn(program: &str, args: &[String]) -> Result<Self, BridgeError> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| BridgeError::Protocol("kernel process has no stdin".into()))?;
        let stdout = child
            .stdout
            .take()
            .map(BufReader::new)
            .ok_or_else(|| BridgeError::Protocol("kernel process has no stdout".into()))?;

        tracing::info!(program, "Kernel process spawned");

        Ok(Self {
            child,
            stdin,
            stdout,
        })
    }
}

impl KernelTransport for StdioTransport {
    fn roundtrip(&mut self, request: &KernelRequest) -> Result<KernelResponse, BridgeError> {
        let mut line = serde_json::to_string(request)?;
        line.push('\n');
        self.stdin.write_all(line.as_bytes())?;
        self.stdin.flush()?;

        let mut response = String::new();
        let read = self.stdout.read_line(&mut response)?;
        if read == 0 {
            return Err(BridgeError::Protocol("kernel closed the channel".into()));
        }

        Ok(serde_json::from_str(&response)?)
    }
}

impl Drop for StdioTransport {
    fn drop(&mut self) {
        // Best effort; the kernel may already have exited.
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
