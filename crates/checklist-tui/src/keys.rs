//! Raw terminal byte decoding.
//!
//! A remote terminal in raw mode sends keys as bytes: printable UTF-8,
//! control bytes, and escape sequences for cursor keys. [`KeyDecoder`] turns
//! that stream into [`KeyInput`]s. Reads may split a sequence anywhere, so
//! incomplete sequences are held until the next chunk.

use checklist_app::KeyInput;

const ESC: u8 = 0x1b;
const CTRL_C: u8 = 0x03;
const BACKSPACE: u8 = 0x08;
const TAB: u8 = 0x09;
const LF: u8 = 0x0a;
const CR: u8 = 0x0d;
const DEL: u8 = 0x7f;

/// Longest CSI parameter/intermediate run held while waiting for a final
/// byte. Real cursor and function key sequences are far shorter.
const MAX_CSI_BODY: usize = 32;

/// Incremental decoder from raw terminal bytes to keys.
#[derive(Debug, Default)]
pub struct KeyDecoder {
    pending: Vec<u8>,
    last_was_cr: bool,
}

impl KeyDecoder {
    /// Create an empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a chunk of bytes.
    ///
    /// A lone `ESC` at the end of a chunk is taken as the Escape key;
    /// terminals send cursor sequences in a single write.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<KeyInput> {
        self.pending.extend_from_slice(bytes);

        let mut keys = Vec::new();
        let mut pos = 0;
        while pos < self.pending.len() {
            match self.decode_one(pos) {
                Step::Key(key, used) => {
                    keys.push(key);
                    pos += used;
                },
                Step::Skip(used) => pos += used,
                Step::Incomplete => break,
            }
        }
        self.pending.drain(..pos);
        keys
    }

    fn decode_one(&mut self, pos: usize) -> Step {
        let rest = &self.pending[pos..];
        let byte = rest[0];

        // "\r\n" from cooked clients is one Enter.
        let after_cr = std::mem::replace(&mut self.last_was_cr, byte == CR);
        match byte {
            CR => Step::Key(KeyInput::Enter, 1),
            LF if after_cr => Step::Skip(1),
            LF => Step::Key(KeyInput::Enter, 1),
            CTRL_C => Step::Key(KeyInput::Interrupt, 1),
            BACKSPACE | DEL => Step::Key(KeyInput::Backspace, 1),
            TAB => Step::Key(KeyInput::Tab, 1),
            ESC => decode_escape(rest),
            0x20..=0x7e => Step::Key(KeyInput::Char(char::from(byte)), 1),
            0x80..=0xff => decode_utf8(rest),
            _ => Step::Skip(1),
        }
    }
}

enum Step {
    Key(KeyInput, usize),
    Skip(usize),
    Incomplete,
}

/// `rest` starts with ESC.
fn decode_escape(rest: &[u8]) -> Step {
    let Some(&intro) = rest.get(1) else {
        return Step::Key(KeyInput::Esc, 1);
    };

    match intro {
        // SS3: ESC O <final>
        b'O' => match rest.get(2) {
            Some(&fin) => cursor_key(fin, 3),
            None => Step::Incomplete,
        },
        // CSI: ESC [ <params> <intermediates> <final>
        b'[' => {
            let body = &rest[2..];
            let window = &body[..body.len().min(MAX_CSI_BODY + 1)];
            match window.iter().position(|b| (0x40..=0x7e).contains(b)) {
                Some(end) => cursor_key(body[end], end + 3),
                None if window.iter().all(|b| is_csi_body(*b)) => {
                    if body.len() <= MAX_CSI_BODY {
                        return Step::Incomplete;
                    }
                    // Runaway sequence: drop it and every body byte held so far.
                    let held = body.iter().take_while(|b| is_csi_body(**b)).count();
                    Step::Skip(2 + held)
                },
                // Not a well-formed sequence; drop the introducer.
                None => Step::Skip(2),
            }
        },
        _ => Step::Key(KeyInput::Esc, 1),
    }
}

/// CSI parameter and intermediate bytes.
fn is_csi_body(byte: u8) -> bool {
    (0x20..=0x3f).contains(&byte)
}

fn cursor_key(fin: u8, used: usize) -> Step {
    match fin {
        b'A' => Step::Key(KeyInput::Up, used),
        b'B' => Step::Key(KeyInput::Down, used),
        _ => Step::Skip(used),
    }
}

/// `rest` starts with a byte >= 0x80.
fn decode_utf8(rest: &[u8]) -> Step {
    let len = match rest[0] {
        0xc2..=0xdf => 2,
        0xe0..=0xef => 3,
        0xf0..=0xf4 => 4,
        _ => return Step::Skip(1),
    };
    let Some(encoded) = rest.get(..len) else {
        return Step::Incomplete;
    };

    match std::str::from_utf8(encoded).ok().and_then(|s| s.chars().next()) {
        Some(c) => Step::Key(KeyInput::Char(c), len),
        None => Step::Skip(1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: &[u8]) -> Vec<KeyInput> {
        KeyDecoder::new().feed(bytes)
    }

    #[test]
    fn printable_and_control_bytes() {
        assert_eq!(decode(b"aK q"), vec![
            KeyInput::Char('a'),
            KeyInput::Char('K'),
            KeyInput::Char(' '),
            KeyInput::Char('q'),
        ]);
        assert_eq!(decode(&[CTRL_C, TAB, DEL, BACKSPACE]), vec![
            KeyInput::Interrupt,
            KeyInput::Tab,
            KeyInput::Backspace,
            KeyInput::Backspace,
        ]);
    }

    #[test]
    fn enter_variants() {
        assert_eq!(decode(b"\r"), vec![KeyInput::Enter]);
        assert_eq!(decode(b"\n"), vec![KeyInput::Enter]);
        assert_eq!(decode(b"\r\n"), vec![KeyInput::Enter]);
        assert_eq!(decode(b"\n\n"), vec![KeyInput::Enter, KeyInput::Enter]);
    }

    #[test]
    fn cursor_sequences() {
        assert_eq!(decode(b"\x1b[A\x1b[B\x1bOA\x1bOB"), vec![
            KeyInput::Up,
            KeyInput::Down,
            KeyInput::Up,
            KeyInput::Down,
        ]);
        // Left/right and modified keys are ignored.
        assert_eq!(decode(b"\x1b[C\x1b[1;5D\x1b[3~x"), vec![KeyInput::Char('x')]);
    }

    #[test]
    fn lone_escape() {
        assert_eq!(decode(b"\x1b"), vec![KeyInput::Esc]);
        assert_eq!(decode(b"\x1bq"), vec![KeyInput::Esc, KeyInput::Char('q')]);
        assert_eq!(decode(b"\x1b\x1b[A"), vec![KeyInput::Esc, KeyInput::Up]);
    }

    #[test]
    fn split_sequences_resume() {
        let mut decoder = KeyDecoder::new();
        assert!(decoder.feed(b"\x1b[").is_empty());
        assert_eq!(decoder.feed(b"B"), vec![KeyInput::Down]);

        assert!(decoder.feed(&[0xc3]).is_empty());
        assert_eq!(decoder.feed(&[0xa9, b'!']), vec![KeyInput::Char('é'), KeyInput::Char('!')]);

        assert_eq!(decoder.feed(b"\r"), vec![KeyInput::Enter]);
        assert!(decoder.feed(b"\n").is_empty());
    }

    #[test]
    fn runaway_csi_is_dropped() {
        let mut decoder = KeyDecoder::new();
        assert!(decoder.feed(b"\x1b[").is_empty());

        for _ in 0..64 {
            decoder.feed(&[b'1'; 1024]);
            assert!(decoder.pending.len() <= MAX_CSI_BODY + 2);
        }

        assert_eq!(decoder.feed(b"abc"), vec![
            KeyInput::Char('a'),
            KeyInput::Char('b'),
            KeyInput::Char('c'),
        ]);
    }

    #[test]
    fn csi_at_the_length_limit_still_decodes() {
        let mut long_up = b"\x1b[".to_vec();
        long_up.extend_from_slice(&[b'1'; MAX_CSI_BODY]);
        long_up.push(b'A');
        assert_eq!(decode(&long_up), vec![KeyInput::Up]);

        let mut too_long = b"\x1b[".to_vec();
        too_long.extend_from_slice(&[b'1'; MAX_CSI_BODY + 1]);
        too_long.extend_from_slice(b"Ax");
        assert_eq!(decode(&too_long), vec![KeyInput::Char('A'), KeyInput::Char('x')]);
    }

    #[test]
    fn multibyte_characters() {
        assert_eq!(decode("ü✓".as_bytes()), vec![KeyInput::Char('ü'), KeyInput::Char('✓')]);
        // Invalid lead and continuation bytes are dropped.
        assert_eq!(decode(&[0xff, 0x80, b'a']), vec![KeyInput::Char('a')]);
    }
}
