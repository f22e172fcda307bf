use std::io::{self, Stdout, Write};

use crate::display::{OutputSurface, ROWS};
use crate::service::scroller::DEFAULT_WIDTH;

/// Fallback surface for machines without an LCD. Lines are printed as
/// `F: ...` / `S: ...` while the backlight is on, and only when they change.
pub struct ConsoleSurface<W: Write + Send = Stdout> {
    out: W,
    width: usize,
    backlight: bool,
    shown: [Option<String>; ROWS],
}

impl ConsoleSurface<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout(), DEFAULT_WIDTH)
    }
}

impl<W: Write + Send> ConsoleSurface<W> {
    pub fn new(out: W, width: usize) -> Self {
        Self {
            out,
            width,
            backlight: false,
            shown: Default::default(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> OutputSurface for ConsoleSurface<W> {
    fn width(&self) -> usize {
        self.width
    }

    fn write_line(&mut self, row: usize, text: &str) -> io::Result<()> {
        if row >= ROWS || !self.backlight {
            return Ok(());
        }
        if self.shown[row].as_deref() == Some(text) {
            return Ok(());
        }
        let prefix = if row == 0 { "F" } else { "S" };
        writeln!(self.out, "{}: {}", prefix, text)?;
        self.out.flush()?;
        self.shown[row] = Some(text.to_string());
        Ok(())
    }

    fn clear(&mut self) -> io::Result<()> {
        self.shown = Default::default();
        Ok(())
    }

    fn set_backlight(&mut self, on: bool) -> io::Result<()> {
        if !on {
            self.shown = Default::default();
        }
        self.backlight = on;
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.clear()?;
        self.backlight = false;
        self.out.flush()
    }
}
