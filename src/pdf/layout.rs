use pdf_writer::{Content, Name, Str};

use crate::fonts::FontEntry;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) enum Alignment {
    Left,
    Center,
    Right,
}

pub(super) struct TextLine {
    pub(super) text: String,
    pub(super) width: f32,
}

fn finish_line(words: &mut Vec<&str>, width: f32) -> TextLine {
    let line = TextLine {
        text: words.join(" "),
        width,
    };
    words.clear();
    line
}

/// Split a word wider than `max_width` into pieces that each fit.
fn split_long_word<'a>(
    word: &'a str,
    font: &FontEntry,
    font_size: f32,
    max_width: f32,
) -> Vec<&'a str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut w = 0.0f32;
    for (i, ch) in word.char_indices() {
        let cw = font.char_width_1000(ch) * font_size / 1000.0;
        if i > start && w + cw > max_width {
            pieces.push(&word[start..i]);
            start = i;
            w = 0.0;
        }
        w += cw;
    }
    pieces.push(&word[start..]);
    pieces
}

/// Greedy word wrap. Explicit newlines start a new line; blank input yields no lines.
pub(super) fn wrap_text(
    text: &str,
    font: &FontEntry,
    font_size: f32,
    max_width: f32,
) -> Vec<TextLine> {
    let space_w = font.space_width(font_size);
    let mut lines: Vec<TextLine> = Vec::new();

    for para in text.lines() {
        let mut current: Vec<&str> = Vec::new();
        let mut current_w: f32 = 0.0;

        for word in para.split_whitespace() {
            let ww = font.text_width(word, font_size);
            let pieces = if ww > max_width {
                split_long_word(word, font, font_size, max_width)
            } else {
                vec![word]
            };
            for piece in pieces {
                let pw = if ww > max_width {
                    font.text_width(piece, font_size)
                } else {
                    ww
                };
                let proposed = if current.is_empty() {
                    pw
                } else {
                    current_w + space_w + pw
                };
                if !current.is_empty() && proposed > max_width {
                    lines.push(finish_line(&mut current, current_w));
                    current_w = pw;
                } else {
                    current_w = proposed;
                }
                current.push(piece);
            }
        }

        if !current.is_empty() {
            lines.push(finish_line(&mut current, current_w));
        }
    }
    lines
}

/// Truncate `text` with an ellipsis so it fits on one line of `max_width`.
pub(super) fn fit_text(text: &str, font: &FontEntry, font_size: f32, max_width: f32) -> String {
    if font.text_width(text, font_size) <= max_width {
        return text.to_string();
    }
    let ellipsis = "\u{2026}";
    let budget = max_width - font.text_width(ellipsis, font_size);
    let mut out = String::new();
    let mut w = 0.0f32;
    for ch in text.chars() {
        let cw = font.char_width_1000(ch) * font_size / 1000.0;
        if w + cw > budget {
            break;
        }
        w += cw;
        out.push(ch);
    }
    out.push_str(ellipsis);
    out
}

fn set_fill(content: &mut Content, color: [u8; 3]) {
    content.set_fill_rgb(
        color[0] as f32 / 255.0,
        color[1] as f32 / 255.0,
        color[2] as f32 / 255.0,
    );
}

/// One line of text with its baseline at `baseline_y`.
pub(super) fn draw_text(
    content: &mut Content,
    font: &FontEntry,
    font_size: f32,
    x: f32,
    baseline_y: f32,
    text: &str,
    color: Option<[u8; 3]>,
) {
    if text.is_empty() {
        return;
    }
    content.save_state();
    match color {
        Some(c) => set_fill(content, c),
        None => {
            content.set_fill_gray(0.0);
        }
    }
    content.begin_text();
    content.set_font(Name(font.pdf_name.as_bytes()), font_size);
    content.next_line(x, baseline_y);
    content.show(Str(&font.encode(text)));
    content.end_text();
    content.restore_state();
}

/// Render pre-built lines inside a box of `width` starting at `x`.
pub(super) fn draw_lines(
    content: &mut Content,
    lines: &[TextLine],
    font: &FontEntry,
    font_size: f32,
    x: f32,
    width: f32,
    first_baseline_y: f32,
    line_pitch: f32,
    alignment: Alignment,
    color: Option<[u8; 3]>,
) {
    for (i, line) in lines.iter().enumerate() {
        let line_x = match alignment {
            Alignment::Left => x,
            Alignment::Center => x + (width - line.width).max(0.0) / 2.0,
            Alignment::Right => x + (width - line.width).max(0.0),
        };
        let y = first_baseline_y - i as f32 * line_pitch;
        draw_text(content, font, font_size, line_x, y, &line.text, color);
    }
}

pub(super) fn fill_rect(content: &mut Content, x: f32, y: f32, w: f32, h: f32, color: [u8; 3]) {
    content.save_state();
    set_fill(content, color);
    content.rect(x, y, w, h);
    content.fill_nonzero();
    content.restore_state();
}

pub(super) fn stroke_rect(
    content: &mut Content,
    x: f32,
    y: f32,
    w: f32,
    h: f32,
    line_width: f32,
    color: [u8; 3],
) {
    content.save_state();
    content.set_line_width(line_width);
    content.set_stroke_rgb(
        color[0] as f32 / 255.0,
        color[1] as f32 / 255.0,
        color[2] as f32 / 255.0,
    );
    content.rect(x, y, w, h);
    content.stroke();
    content.restore_state();
}

pub(super) fn hline(content: &mut Content, x1: f32, x2: f32, y: f32, line_width: f32, color: [u8; 3]) {
    content.save_state();
    content.set_line_width(line_width);
    content.set_stroke_rgb(
        color[0] as f32 / 255.0,
        color[1] as f32 / 255.0,
        color[2] as f32 / 255.0,
    );
    content.move_to(x1, y);
    content.line_to(x2, y);
    content.stroke();
    content.restore_state();
}
