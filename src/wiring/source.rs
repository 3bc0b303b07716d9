//! Byte sources for event-driven input devices

use super::error::DeviceError;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read};
use std::os::unix::fs::OpenOptionsExt;
use std::rc::Rc;
use tracing::{debug, info};

const READ_CHUNK: usize = 1024;

pub trait EventSource {
    /// Drains whatever bytes are available right now without blocking
    fn read_available(&mut self) -> Result<Vec<u8>, DeviceError>;
}

/// Linux joystick character device, opened non-blocking
pub struct JoystickDevice {
    path: String,
    file: File,
}

impl JoystickDevice {
    pub fn open(id: &str) -> Result<Self, DeviceError> {
        let path = format!("/dev/input/{}", id);
        let file = OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(&path)
            .map_err(|source| DeviceError::Open {
                path: path.clone(),
                source,
            })?;
        info!("Opened event device {}", path);
        Ok(Self { path, file })
    }
}

impl EventSource for JoystickDevice {
    fn read_available(&mut self) -> Result<Vec<u8>, DeviceError> {
        let mut buffer = Vec::new();
        let mut chunk = [0u8; READ_CHUNK];

        loop {
            match self.file.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => buffer.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(source) => {
                    return Err(DeviceError::Read {
                        path: self.path.clone(),
                        source,
                    })
                }
            }
        }

        if !buffer.is_empty() {
            debug!("Read {} bytes from {}", buffer.len(), self.path);
        }
        Ok(buffer)
    }
}

/// Queue of fed byte chunks; a read drains all of them. Shared with whoever feeds it
#[derive(Clone, Default)]
pub struct ReplaySource {
    queue: Rc<RefCell<VecDeque<Vec<u8>>>>,
}

impl ReplaySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, bytes: impl Into<Vec<u8>>) {
        self.queue.borrow_mut().push_back(bytes.into());
    }
}

impl EventSource for ReplaySource {
    fn read_available(&mut self) -> Result<Vec<u8>, DeviceError> {
        Ok(self.queue.borrow_mut().drain(..).flatten().collect())
    }
}
