//! Serial switchboard driving the device's enable and mode pins
//!
//! The device reads a single status byte: bit0 = enable, bit1 = mode
//! (driver/autonomous). Every change rewrites the whole byte.

use std::{
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};
use serde::{Deserialize, Serialize};
use tokio::{fs::OpenOptions, io::AsyncWriteExt, sync::mpsc};
use tracing::{debug, error, info};

use crate::{error::LinkError, timer::SignalSender};

pub const ENABLE_PIN: usize = 0;
pub const MODE_PIN: usize = 1;

/// Pack the two pins into the status byte
pub fn status_byte(enable: bool, mode: bool) -> u8 {
    ((mode as u8) << 1) | enable as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PinState {
    pub enable: bool,
    pub mode: bool,
}

impl PinState {
    pub fn byte(&self) -> u8 {
        status_byte(self.enable, self.mode)
    }
}

struct Link {
    tx: mpsc::UnboundedSender<u8>,
    alive: Arc<AtomicBool>,
}

impl Link {
    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst) && !self.tx.is_closed()
    }
}

pub struct Switchboard {
    path: PathBuf,
    pins: Mutex<PinState>,
    link: Mutex<Option<Link>>,
}

impl Switchboard {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pins: Mutex::new(PinState::default()),
            link: Mutex::new(None),
        }
    }

    pub fn device(&self) -> &Path {
        &self.path
    }

    /// Open the device and push the current pin state to it.
    ///
    /// Replaces any previous link.
    pub async fn pair(&self) -> Result<PinState, LinkError> {
        debug!("Opening serial device {}", self.path.display());
        let file = OpenOptions::new()
            .write(true)
            .open(&self.path)
            .await
            .map_err(|source| LinkError::Open {
                path: self.path.clone(),
                source,
            })?;

        let (tx, rx) = mpsc::unbounded_channel();
        let alive = Arc::new(AtomicBool::new(true));
        tokio::spawn(serial_writer_task(file, rx, Arc::clone(&alive)));

        if let Ok(mut link) = self.link.lock() {
            *link = Some(Link { tx, alive });
        }
        info!("Serial device {} paired", self.path.display());

        let pins = self.pins();
        self.write(pins)?;
        Ok(pins)
    }

    pub fn is_paired(&self) -> bool {
        self.link
            .lock()
            .map(|link| link.as_ref().is_some_and(Link::is_alive))
            .unwrap_or(false)
    }

    pub fn pins(&self) -> PinState {
        self.pins.lock().map(|pins| *pins).unwrap_or_default()
    }

    /// Flip one pin and send the new byte; refused when unpaired
    pub fn toggle_pin(&self, pin: usize) -> Result<PinState, LinkError> {
        if !self.is_paired() {
            return Err(LinkError::NotPaired);
        }
        let pins = self.update(|pins| match pin {
            ENABLE_PIN => {
                pins.enable = !pins.enable;
                Ok(())
            }
            MODE_PIN => {
                pins.mode = !pins.mode;
                Ok(())
            }
            other => Err(LinkError::UnknownPin(other)),
        })?;
        self.write(pins)?;
        Ok(pins)
    }

    fn update<F>(&self, change: F) -> Result<PinState, LinkError>
    where
        F: FnOnce(&mut PinState) -> Result<(), LinkError>,
    {
        let mut pins = self
            .pins
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        change(&mut pins)?;
        Ok(*pins)
    }

    fn write(&self, pins: PinState) -> Result<(), LinkError> {
        let link = self
            .link
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match link.as_ref() {
            Some(link) if link.is_alive() => {
                debug!("Queueing status byte {:#04b}", pins.byte());
                link.tx.send(pins.byte()).map_err(|_| LinkError::Closed)
            }
            _ => Err(LinkError::NotPaired),
        }
    }
}

impl SignalSender for Switchboard {
    fn send_enable(&self, enabled: bool) -> Result<(), LinkError> {
        if !self.is_paired() {
            return Err(LinkError::NotPaired);
        }
        let pins = self.update(|pins| {
            pins.enable = enabled;
            Ok(())
        })?;
        self.write(pins)
    }
}

/// Write queued status bytes until the link drops or a write fails.
///
/// A failed write marks the link dead; the operator has to pair again.
async fn serial_writer_task(
    mut file: tokio::fs::File,
    mut rx: mpsc::UnboundedReceiver<u8>,
    alive: Arc<AtomicBool>,
) {
    while let Some(byte) = rx.recv().await {
        let result = async {
            file.write_all(&[byte]).await?;
            file.flush().await
        }
        .await;

        if let Err(e) = result {
            error!("Serial write failed, pair the device again: {}", e);
            alive.store(false, Ordering::SeqCst);
            return;
        }
    }
    debug!("Serial writer closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn scratch_device(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "field-timer-{}-{}.dev",
            name,
            std::process::id()
        ));
        std::fs::write(&path, b"").unwrap();
        path
    }

    async fn written(path: &Path, len: usize) -> Vec<u8> {
        for _ in 0..100 {
            let bytes = tokio::fs::read(path).await.unwrap();
            if bytes.len() >= len {
                return bytes;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        tokio::fs::read(path).await.unwrap()
    }

    #[test]
    fn status_byte_layout() {
        assert_eq!(status_byte(false, false), 0b00);
        assert_eq!(status_byte(true, false), 0b01);
        assert_eq!(status_byte(false, true), 0b10);
        assert_eq!(status_byte(true, true), 0b11);
    }

    #[test]
    fn unpaired_switchboard_refuses_writes() {
        let board = Switchboard::new("/nonexistent/tty");
        assert!(!board.is_paired());
        assert!(matches!(board.toggle_pin(MODE_PIN), Err(LinkError::NotPaired)));
        assert!(matches!(board.send_enable(true), Err(LinkError::NotPaired)));
        assert_eq!(board.pins(), PinState::default());
    }

    #[tokio::test]
    async fn pairing_a_missing_device_fails() {
        let board = Switchboard::new("/nonexistent/tty");
        let err = board.pair().await.unwrap_err();
        assert!(matches!(err, LinkError::Open { .. }));
        assert!(!board.is_paired());
    }

    #[tokio::test]
    async fn pin_changes_reach_the_device() {
        let path = scratch_device("pins");
        let board = Switchboard::new(&path);

        board.pair().await.unwrap();
        assert!(board.is_paired());
        board.toggle_pin(MODE_PIN).unwrap();
        board.send_enable(true).unwrap();
        board.send_enable(false).unwrap();

        assert_eq!(written(&path, 4).await, vec![0b00, 0b10, 0b11, 0b10]);
        assert!(matches!(board.toggle_pin(7), Err(LinkError::UnknownPin(7))));

        let _ = std::fs::remove_file(&path);
    }
}
