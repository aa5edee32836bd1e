use std::io::{self, Write};

use crate::editor::{text_rows, Editor};

/// Draw the text area and the status line.
///
/// Rows past the end of the document are marked with `~`.
pub fn render(editor: &Editor, out: &mut impl Write) -> io::Result<()> {
    let doc = editor.document();
    let viewport = editor.viewport();
    let (height, width) = editor.screen_size();

    let mut rows = 0;
    for line in viewport.visible_lines(doc) {
        let row: Vec<u8> = line.iter().map(printable).collect();
        out.write_all(&row)?;
        out.write_all(b"\n")?;
        rows += 1;
    }

    if width > 0 {
        for _ in rows..text_rows(height) {
            out.write_all(b"~\n")?;
        }
    }

    let status = status_line(editor);
    out.write_all(&status.as_bytes()[..status.len().min(width)])?;
    out.write_all(b"\n")?;

    out.flush()
}

fn status_line(editor: &Editor) -> String {
    let viewport = editor.viewport();

    let cursor = match viewport.cursor_screen_position(editor.document()) {
        Some((row, col)) => format!("{},{}", viewport.top_line_number() + row, col + 1),
        None => "-".to_owned(),
    };

    let mut status = format!(
        "{} | top {} | {}",
        editor.mode().name(),
        viewport.top_line_number(),
        cursor
    );

    if let Some(message) = editor.message() {
        status.push_str(" | ");
        status.push_str(message);
    }

    status
}

fn printable(byte: u8) -> u8 {
    if byte.is_ascii_graphic() || byte == b' ' {
        byte
    } else {
        b' '
    }
}
