//! Two-line character output.
//!
//! The refresh loop only ever talks to [`OutputSurface`]; whether the lines
//! end up on an LCD or on the console is decided once at startup.

use std::io;

pub mod char_lcd;
pub mod console;

pub const ROWS: usize = 2;

pub trait OutputSurface: Send {
    fn width(&self) -> usize;

    /// Writes `text` on `row` (0 or 1), padded or cut to the surface width.
    fn write_line(&mut self, row: usize, text: &str) -> io::Result<()>;

    fn clear(&mut self) -> io::Result<()>;

    fn set_backlight(&mut self, on: bool) -> io::Result<()>;

    /// Blanks the surface and releases the underlying device.
    fn close(&mut self) -> io::Result<()>;
}

impl<S: OutputSurface + ?Sized> OutputSurface for Box<S> {
    fn width(&self) -> usize {
        (**self).width()
    }

    fn write_line(&mut self, row: usize, text: &str) -> io::Result<()> {
        (**self).write_line(row, text)
    }

    fn clear(&mut self) -> io::Result<()> {
        (**self).clear()
    }

    fn set_backlight(&mut self, on: bool) -> io::Result<()> {
        (**self).set_backlight(on)
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

pub(crate) fn fit(text: &str, width: usize) -> String {
    let mut fitted: String = text.chars().take(width).collect();
    let len = fitted.chars().count();
    fitted.extend(std::iter::repeat_n(' ', width - len));
    fitted
}
