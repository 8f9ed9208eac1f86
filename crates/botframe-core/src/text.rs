//! Small text helpers shared by backends and the CLI.

use std::time::Duration;

/// Width of the bar drawn by [`drawbar`], in cells.
pub const BAR_WIDTH: u64 = 15;

/// Split `text` into consecutive pieces of at most `chunk_size` characters.
///
/// Yields `text` unchanged when it already fits, and a single empty piece for
/// empty input. Boundaries fall on characters, never inside a UTF-8 sequence.
/// A `chunk_size` of zero is treated as one.
pub fn split_string_after(text: &str, chunk_size: usize) -> SplitAfter<'_> {
    SplitAfter {
        rest: Some(text),
        chunk_size: chunk_size.max(1),
    }
}

/// Iterator returned by [`split_string_after`].
#[derive(Debug, Clone)]
pub struct SplitAfter<'a> {
    rest: Option<&'a str>,
    chunk_size: usize,
}

impl<'a> Iterator for SplitAfter<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let rest = self.rest?;
        match rest.char_indices().nth(self.chunk_size) {
            Some((cut, _)) => {
                let (head, tail) = rest.split_at(cut);
                self.rest = Some(tail);
                Some(head)
            }
            None => {
                self.rest = None;
                Some(rest)
            }
        }
    }
}

/// Render a duration as hours and minutes, e.g. `1 hours and 13 minutes`.
///
/// Durations under a minute are shown in seconds. A zero component is left
/// out when the other one is present.
pub fn format_timedelta(duration: Duration) -> String {
    let total = duration.as_secs();
    let (hours, remainder) = (total / 3600, total % 3600);
    let (minutes, seconds) = (remainder / 60, remainder % 60);

    match (hours, minutes) {
        (0, 0) => format!("{seconds} seconds"),
        (0, m) => format!("{m} minutes"),
        (h, 0) => format!("{h} hours"),
        (h, m) => format!("{h} hours and {m} minutes"),
    }
}

/// Draw `value` out of `max` as a fixed-width bar: `[████████▒▒▒▒▒▒▒]`.
///
/// The filled width is rounded half up. `value` above `max` draws a full bar;
/// a `max` of zero draws an empty one.
pub fn drawbar(value: u64, max: u64) -> String {
    let filled = if max == 0 {
        0
    } else {
        let value = value.min(max);
        (value * BAR_WIDTH * 2 + max) / (max * 2)
    };
    let filled = filled as usize;
    let empty = BAR_WIDTH as usize - filled;
    format!("[{}{}]", "█".repeat(filled), "▒".repeat(empty))
}

/// Replace XML character references and the five predefined entities.
///
/// Handles `&#32;`, `&#x20;` and `&amp;`, `&lt;`, `&gt;`, `&quot;`, `&apos;`.
/// Anything else that starts with `&` is kept as written.
pub fn unescape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let candidate = &rest[start..];
        let decoded = candidate
            .find(';')
            .and_then(|end| decode_entity(&candidate[1..end]).map(|ch| (ch, end)));

        match decoded {
            Some((ch, end)) => {
                out.push(ch);
                rest = &candidate[end + 1..];
            }
            None => {
                out.push('&');
                rest = &candidate[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = name.strip_prefix('#')?;
            let value = match code.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse().ok()?,
            };
            char::from_u32(value)
        }
    }
}
