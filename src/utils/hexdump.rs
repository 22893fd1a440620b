//! Boxed hex/ASCII dump of a byte slice, sixteen bytes per row.
//!
//! ```text
//!          +-------------------------------------------------+
//!          |  0  1  2  3  4  5  6  7  8  9  a  b  c  d  e  f |
//! +--------+-------------------------------------------------+----------------+
//! |00000000| 68 65 6c 6c 6f                                  |hello           |
//! +--------+-------------------------------------------------+----------------+
//! ```

use std::fmt::Write;

const ROW_WIDTH: usize = 16;

const TOP: &str = "         +-------------------------------------------------+\n";
const COLUMNS: &str = "         |  0  1  2  3  4  5  6  7  8  9  a  b  c  d  e  f |\n";
const DIVIDER: &str =
    "+--------+-------------------------------------------------+----------------+";

pub fn pretty_hex_dump(data: &[u8]) -> String {
    if data.is_empty() {
        return String::new();
    }

    let rows = data.len().div_ceil(ROW_WIDTH);
    let mut out = String::with_capacity(TOP.len() + COLUMNS.len() + (rows + 2) * 80);
    out.push_str(TOP);
    out.push_str(COLUMNS);
    out.push_str(DIVIDER);

    for (row, chunk) in data.chunks(ROW_WIDTH).enumerate() {
        let _ = write!(out, "\n|{:08x}|", row * ROW_WIDTH);
        for byte in chunk {
            let _ = write!(out, " {byte:02x}");
        }
        for _ in chunk.len()..ROW_WIDTH {
            out.push_str("   ");
        }
        out.push_str(" |");
        for &byte in chunk {
            out.push(if byte.is_ascii_graphic() || byte == b' ' {
                byte as char
            } else {
                '.'
            });
        }
        for _ in chunk.len()..ROW_WIDTH {
            out.push(' ');
        }
        out.push('|');
    }

    out.push('\n');
    out.push_str(DIVIDER);
    out
}
