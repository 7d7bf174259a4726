//! ANSI frame encoding for remote terminals.
//!
//! A remote client only sees bytes, so each rendered frame is written as a
//! full-screen redraw: clear, home, then every line with its styles applied
//! through crossterm commands. Lines end in `\r\n` because the client's
//! terminal is in raw mode.

use std::io;

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    queue,
    style::{Attribute, Color as TermColor, Print, SetAttribute, SetForegroundColor},
    terminal::{Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    style::{Color, Modifier, Style},
    text::Text,
};

/// Bytes that prepare a client's terminal for full-screen frames.
pub fn session_start() -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    queue!(out, EnterAlternateScreen, Hide)?;
    Ok(out)
}

/// Bytes that hand the client's terminal back.
pub fn session_end() -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    queue!(out, SetAttribute(Attribute::Reset), Show, LeaveAlternateScreen)?;
    Ok(out)
}

/// Encode one frame as a full-screen redraw.
pub fn encode_frame(text: &Text<'_>) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    queue!(out, Clear(ClearType::All), MoveTo(0, 0))?;

    for line in &text.lines {
        for span in &line.spans {
            let style = text.style.patch(line.style).patch(span.style);
            if style == Style::default() {
                queue!(out, Print(&span.content))?;
            } else {
                apply_style(&mut out, style)?;
                queue!(out, Print(&span.content), SetAttribute(Attribute::Reset))?;
            }
        }
        queue!(out, Print("\r\n"))?;
    }
    Ok(out)
}

fn apply_style(out: &mut Vec<u8>, style: Style) -> io::Result<()> {
    if let Some(fg) = style.fg {
        queue!(out, SetForegroundColor(term_color(fg)))?;
    }
    if style.add_modifier.contains(Modifier::BOLD) {
        queue!(out, SetAttribute(Attribute::Bold))?;
    }
    if style.add_modifier.contains(Modifier::DIM) {
        queue!(out, SetAttribute(Attribute::Dim))?;
    }
    Ok(())
}

/// Map a ratatui color onto the crossterm color with the same ANSI code.
fn term_color(color: Color) -> TermColor {
    match color {
        Color::Reset => TermColor::Reset,
        Color::Black => TermColor::Black,
        Color::Red => TermColor::DarkRed,
        Color::Green => TermColor::DarkGreen,
        Color::Yellow => TermColor::DarkYellow,
        Color::Blue => TermColor::DarkBlue,
        Color::Magenta => TermColor::DarkMagenta,
        Color::Cyan => TermColor::DarkCyan,
        Color::Gray => TermColor::Grey,
        Color::DarkGray => TermColor::DarkGrey,
        Color::LightRed => TermColor::Red,
        Color::LightGreen => TermColor::Green,
        Color::LightYellow => TermColor::Yellow,
        Color::LightBlue => TermColor::Blue,
        Color::LightMagenta => TermColor::Magenta,
        Color::LightCyan => TermColor::Cyan,
        Color::White => TermColor::White,
        Color::Rgb(r, g, b) => TermColor::Rgb { r, g, b },
        Color::Indexed(i) => TermColor::AnsiValue(i),
    }
}

#[cfg(test)]
mod tests {
    use ratatui::text::{Line, Span};

    use super::*;

    fn encode(text: &Text<'_>) -> String {
        String::from_utf8(encode_frame(text).unwrap()).unwrap()
    }

    #[test]
    fn plain_lines_are_cleared_and_crlf_terminated() {
        let text = Text::from(vec![Line::from("Todo Items:"), Line::default(), Line::from("> 1. A")]);

        insta::assert_snapshot!(
            encode(&text).escape_debug().to_string(),
            @r"\u{1b}[2J\u{1b}[1;1HTodo Items:\r\n\r\n> 1. A\r\n"
        );
    }

    #[test]
    fn styled_spans_are_reset_after_use() {
        let text = Text::from(Line::from(vec![
            Span::raw("  2. B "),
            Span::styled("✓", Style::default().fg(Color::LightGreen)),
        ]));

        insta::assert_snapshot!(
            encode(&text).escape_debug().to_string(),
            @r"\u{1b}[2J\u{1b}[1;1H  2. B \u{1b}[38;5;10m✓\u{1b}[0m\r\n"
        );
    }

    #[test]
    fn title_style_uses_indexed_color_and_bold() {
        let style = Style::default().fg(Color::Indexed(205)).add_modifier(Modifier::BOLD);
        let text = Text::from(Line::from(Span::styled("Confirm Delete", style)));

        let encoded = encode(&text);
        assert!(encoded.contains("\u{1b}[38;5;205m\u{1b}[1mConfirm Delete\u{1b}[0m"));
    }

    #[test]
    fn start_and_end_toggle_alternate_screen() {
        let start = String::from_utf8(session_start().unwrap()).unwrap();
        let end = String::from_utf8(session_end().unwrap()).unwrap();

        assert!(start.contains("\u{1b}[?1049h"));
        assert!(start.contains("\u{1b}[?25l"));
        assert!(end.contains("\u{1b}[?1049l"));
        assert!(end.contains("\u{1b}[?25h"));
    }
}
