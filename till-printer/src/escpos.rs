//! ESC/POS command builder
//!
//! Provides a fluent API for building ESC/POS print data, and the
//! [`encode`] function used for serial and native raw printing.

/// ESC @ - Initialize printer
pub const INIT: [u8; 2] = [0x1B, 0x40];

/// GS V 66 0 - Full cut after feeding 0 lines
pub const CUT: [u8; 4] = [0x1D, 0x56, 0x42, 0x00];

/// Encode formatted receipt text for a thermal printer
///
/// Layout: `INIT` + UTF-8 bytes of `text` unchanged + `CUT`.
pub fn encode(text: &str) -> Vec<u8> {
    let mut b = EscPosBuilder::with_capacity(text.len() + INIT.len() + CUT.len());
    b.text(text);
    b.cut_feed(0);
    b.build()
}

/// ESC/POS command builder
///
/// Builds ESC/POS byte sequences for thermal printers. Text is written as
/// UTF-8 without transcoding.
struct EscPosBuilder {
    buf: Vec<u8>,
}

impl EscPosBuilder {
    /// The buffer starts with the initialize command
    fn with_capacity(capacity: usize) -> Self {
        let mut buf = Vec::with_capacity(capacity);
        buf.extend_from_slice(&INIT);
        Self { buf }
    }

    // === Text Output ===

    /// Write raw text
    fn text(&mut self, s: &str) -> &mut Self {
        self.buf.extend_from_slice(s.as_bytes());
        self
    }

    // === Paper Control ===

    /// Full cut after feeding `lines` lines
    fn cut_feed(&mut self, lines: u8) -> &mut Self {
        // GS V 66 n - Full cut after feeding n lines
        self.buf.extend_from_slice(&[0x1D, 0x56, 0x42, lines]);
        self
    }

    // === Build ===

    /// Build the final byte buffer
    fn build(self) -> Vec<u8> {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_structure() {
        for text in ["", "hello\r\n", "Chai ☕ x2\r\nRs.100.00", "\x1B\x40 inline"] {
            let data = encode(text);
            assert_eq!(&data[..2], &INIT);
            assert_eq!(&data[data.len() - 4..], &CUT);
            assert_eq!(&data[2..data.len() - 4], text.as_bytes());
        }
    }

    #[test]
    fn test_encode_is_stable() {
        assert_eq!(encode("same input"), encode("same input"));
    }

    #[test]
    fn test_builder_feed_before_cut() {
        let mut b = EscPosBuilder::with_capacity(16);
        b.text("x").cut_feed(3);
        assert_eq!(b.build(), vec![0x1B, 0x40, b'x', 0x1D, 0x56, 0x42, 3]);
    }
}
