pub const DEFAULT_WIDTH: usize = 16;

// Blank run shown between the end of a line and its repeat.
const GAP: &str = "      ";

/// Returns the `width`-column window of `line` starting at `cursor` and the
/// cursor to use on the next call.
///
/// Lines that fit are returned as-is with the cursor untouched. Longer lines
/// are treated as `line + GAP + line` so the window slides across the end of
/// the text into its repeat without a seam; the cursor wraps to 0 after one
/// full pass.
pub fn scroll(line: &str, cursor: usize, width: usize) -> (String, usize) {
    let chars: Vec<char> = line.chars().collect();
    if chars.len() <= width {
        return (line.to_string(), cursor);
    }

    let period = chars.len() + GAP.len();
    let start = cursor % period;
    let visible: String = chars
        .iter()
        .copied()
        .chain(GAP.chars())
        .chain(chars.iter().copied())
        .skip(start)
        .take(width)
        .collect();

    let next = if start + 1 >= period { 0 } else { start + 1 };
    (visible, next)
}
