//! IETF-style annotated bit diagrams
//!
//! Renders any [`BitFieldGroup`] as the familiar RFC header diagram: a
//! 32-column bit grid with a ruler, per-row word indices, and boxed titles
//! for header-class records. Byte-string fields become titled dump blocks.
//! Rendering never mutates the value.

use crate::layout::{BitFieldGroup, FieldValue, GroupKind};

/// Bits per diagram row
const ROW_BITS: usize = 32;

/// Interior width of a diagram line (32 bit cells, 2 columns each, minus
/// the shared border)
const ROW_WIDTH: usize = ROW_BITS * 2 - 1;

/// Maximum bytes shown by the windowed dump before eliding
const NEAT_WINDOW: usize = 72;

/// Options controlling how byte-string fields are rendered
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    /// Windowed hex dump of byte-string fields
    pub neat_strings: bool,
    /// Per-byte binary/hex/character table (overrides `neat_strings`)
    pub detailed_strings: bool,
}

/// Diagram renderer
#[derive(Debug, Default)]
pub struct Renderer {
    opts: RenderOptions,
}

impl Renderer {
    /// Renderer with default options (byte strings are elided)
    pub fn new() -> Self {
        Self::default()
    }

    /// Renderer with explicit byte-string options
    pub fn with_options(opts: RenderOptions) -> Self {
        Renderer { opts }
    }

    /// Render `group` as an annotated bit diagram
    pub fn render(&self, group: &dyn BitFieldGroup) -> String {
        let mut canvas = Canvas {
            opts: self.opts,
            out: String::new(),
            cells: Vec::new(),
            row_bits: 0,
            word: 0,
        };
        canvas.group(group, 0);
        canvas.out
    }
}

struct Canvas {
    opts: RenderOptions,
    out: String,
    cells: Vec<(String, usize)>,
    row_bits: usize,
    word: usize,
}

impl Canvas {
    fn group(&mut self, group: &dyn BitFieldGroup, depth: usize) {
        if !matches!(group.group_kind(), GroupKind::Basic | GroupKind::Option) {
            self.flush_row();
            self.title(group.display_name());
        }
        if depth == 0 {
            self.ruler();
        }

        for field in group.fields() {
            match field.value {
                FieldValue::Uint { value, width } => {
                    let label = if width > 16 {
                        format!("{}=0x{:X}", field.name, value)
                    } else {
                        format!("{}={}", field.name, value)
                    };
                    self.push_field(&label, width as usize);
                }
                FieldValue::Bool(value) => {
                    self.push_field(&format!("{}={}", field.name, value as u8), 1);
                }
                FieldValue::Group(inner) => self.group(inner, depth + 1),
                FieldValue::Optional(Some(inner)) => self.group(inner, depth + 1),
                FieldValue::Optional(None) => {}
                FieldValue::Bytes(data) => self.byte_block(field.name, data),
            }
        }

        // The closing cutoff rule belongs to the outermost record only.
        if depth == 0 {
            self.flush_row();
            self.rule('-');
        }
    }

    fn push_field(&mut self, label: &str, mut width: usize) {
        let mut first = true;
        while width > 0 {
            let space = ROW_BITS - self.row_bits;
            let take = width.min(space);
            let text = if first { label.to_string() } else { String::new() };
            self.cells.push((text, take));
            self.row_bits += take;
            width -= take;
            first = false;
            if self.row_bits == ROW_BITS {
                self.flush_row();
            }
        }
    }

    fn flush_row(&mut self) {
        if self.row_bits == 0 {
            return;
        }
        self.rule('-');
        let mut line = String::from("|");
        for (label, bits) in &self.cells {
            let width = bits * 2 - 1;
            let text: String = label.chars().take(width).collect();
            line.push_str(&format!("{text:^width$}"));
            line.push('|');
        }
        line.push_str(&format!(" {}", self.word));
        line.push('\n');
        self.out.push_str(&line);
        self.word += 1;
        self.cells.clear();
        self.row_bits = 0;
    }

    fn rule(&mut self, dash: char) {
        let mut line = String::with_capacity(ROW_WIDTH + 3);
        for _ in 0..ROW_BITS {
            line.push('+');
            line.push(dash);
        }
        line.push('+');
        line.push('\n');
        self.out.push_str(&line);
    }

    fn title(&mut self, name: &str) {
        self.rule('=');
        let width = ROW_WIDTH;
        self.out.push_str(&format!("|{name:^width$}|\n"));
        self.rule('=');
    }

    fn ruler(&mut self) {
        let mut tens = String::from(" ");
        let mut ones = String::from(" ");
        for bit in 0..ROW_BITS {
            if bit % 10 == 0 {
                tens.push_str(&format!("{}", bit / 10));
            } else {
                tens.push(' ');
            }
            tens.push(' ');
            ones.push_str(&format!("{} ", bit % 10));
        }
        self.out.push_str(tens.trim_end());
        self.out.push('\n');
        self.out.push_str(ones.trim_end());
        self.out.push('\n');
    }

    fn boxed(&mut self, text: &str) {
        let width = ROW_WIDTH;
        let clipped: String = text.chars().take(width).collect();
        self.out.push_str(&format!("|{clipped:^width$}|\n"));
    }

    fn byte_block(&mut self, name: &str, data: &[u8]) {
        self.flush_row();
        self.rule('-');
        self.boxed(&format!("{} ({} bytes)", name, data.len()));
        self.rule('-');

        if self.opts.detailed_strings {
            for &byte in data {
                let ch = if byte.is_ascii_graphic() || byte == b' ' {
                    byte as char
                } else {
                    '.'
                };
                self.boxed(&format!("0x{byte:02X}  {byte:08b}  '{ch}'"));
            }
        } else if self.opts.neat_strings {
            let shown = &data[..data.len().min(NEAT_WINDOW)];
            for chunk in shown.chunks(24) {
                self.boxed(&hex::encode(chunk));
            }
            if data.len() > NEAT_WINDOW {
                self.boxed(&format!("({} more bytes)", data.len() - NEAT_WINDOW));
            }
        } else if !data.is_empty() {
            self.boxed("...");
        }

        self.rule('-');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{Field, GroupKind};

    struct Probe {
        flag: bool,
        code: u16,
        body: Vec<u8>,
    }

    impl BitFieldGroup for Probe {
        fn group_kind(&self) -> GroupKind {
            GroupKind::Header
        }

        fn layer(&self) -> u8 {
            7
        }

        fn display_name(&self) -> &str {
            "Probe Header"
        }

        fn fields(&self) -> Vec<Field<'_>> {
            vec![
                Field::uint("kind", 3, 15),
                Field::boolean("flag", self.flag),
                Field::uint("code", self.code as u64, 16),
                Field::uint("token", 0xDEAD_BEEF, 32),
                Field::bytes("body", &self.body),
            ]
        }
    }

    fn probe() -> Probe {
        Probe {
            flag: true,
            code: 7,
            body: b"Hello".to_vec(),
        }
    }

    #[test]
    fn test_render_contains_title_and_ruler() {
        let text = Renderer::new().render(&probe());
        assert!(text.contains("Probe Header"));
        assert!(text.contains("+=+=+="));
        assert!(text.contains("0 1 2 3 4 5 6 7 8 9 0 1"));
    }

    #[test]
    fn test_render_labels_fields_and_numbers_words() {
        let text = Renderer::new().render(&probe());
        assert!(text.contains("kind=3"));
        assert!(text.contains("flag=1"));
        assert!(text.contains("token=0xDEADBEEF"));
        assert!(text.lines().any(|l| l.ends_with("| 0")));
        assert!(text.lines().any(|l| l.ends_with("| 1")));
    }

    #[test]
    fn test_render_elides_bytes_by_default() {
        let text = Renderer::new().render(&probe());
        assert!(text.contains("body (5 bytes)"));
        assert!(text.contains("..."));
        assert!(!text.contains("48656c6c6f"));
    }

    #[test]
    fn test_render_neat_strings_dump() {
        let opts = RenderOptions {
            neat_strings: true,
            ..Default::default()
        };
        let text = Renderer::with_options(opts).render(&probe());
        assert!(text.contains("48656c6c6f"));
    }

    #[test]
    fn test_render_detailed_strings_dump() {
        let opts = RenderOptions {
            detailed_strings: true,
            ..Default::default()
        };
        let text = Renderer::with_options(opts).render(&probe());
        assert!(text.contains("0x48  01001000  'H'"));
    }

    #[test]
    fn test_render_does_not_mutate() {
        let p = probe();
        let first = Renderer::new().render(&p);
        let second = Renderer::new().render(&p);
        assert_eq!(first, second);
    }
}
