use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use tracing::debug;

use crate::display::{OutputSurface, ROWS, fit};
use crate::service::scroller::DEFAULT_WIDTH;

// Linux auxdisplay charlcd escape sequences (drivers/auxdisplay/charlcd.c).
const CLEAR: &[u8] = b"\x0c";
const DISPLAY_ON: &[u8] = b"\x1b[LD";
const CURSOR_OFF: &[u8] = b"\x1b[Lc";
const BLINK_OFF: &[u8] = b"\x1b[Lb";
const BACKLIGHT_ON: &[u8] = b"\x1b[L+";
const BACKLIGHT_OFF: &[u8] = b"\x1b[L-";

/// HD44780-style character LCD driven through the kernel `charlcd` device,
/// usually `/dev/lcd`.
pub struct CharLcd<W: Write + Send> {
    device: Option<W>,
    width: usize,
}

impl CharLcd<File> {
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let device = OpenOptions::new().write(true).open(path)?;
        debug!(path = %path.display(), "opened character LCD");
        Self::new(device, DEFAULT_WIDTH)
    }
}

impl<W: Write + Send> CharLcd<W> {
    pub fn new(device: W, width: usize) -> io::Result<Self> {
        let mut lcd = Self {
            device: Some(device),
            width,
        };
        lcd.send(&[DISPLAY_ON, CURSOR_OFF, BLINK_OFF, CLEAR, BACKLIGHT_OFF].concat())?;
        Ok(lcd)
    }

    fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        let Some(device) = self.device.as_mut() else {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "LCD already closed"));
        };
        device.write_all(bytes)?;
        device.flush()
    }

    pub fn into_inner(mut self) -> Option<W> {
        self.device.take()
    }
}

impl<W: Write + Send> OutputSurface for CharLcd<W> {
    fn width(&self) -> usize {
        self.width
    }

    fn write_line(&mut self, row: usize, text: &str) -> io::Result<()> {
        if row >= ROWS {
            return Ok(());
        }
        // The controller ROM only covers ASCII reliably.
        let ascii: String = fit(text, self.width)
            .chars()
            .map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '?' })
            .collect();
        let mut bytes = format!("\x1b[Lx0y{};", row).into_bytes();
        bytes.extend_from_slice(ascii.as_bytes());
        self.send(&bytes)
    }

    fn clear(&mut self) -> io::Result<()> {
        self.send(CLEAR)
    }

    fn set_backlight(&mut self, on: bool) -> io::Result<()> {
        self.send(if on { BACKLIGHT_ON } else { BACKLIGHT_OFF })
    }

    fn close(&mut self) -> io::Result<()> {
        if self.device.is_none() {
            return Ok(());
        }
        let result = self.send(&[CLEAR, BACKLIGHT_OFF].concat());
        self.device = None;
        result
    }
}
