//! ESC/POS command builder
//!
//! Provides a fluent API for building ESC/POS print data. Text is transcoded
//! to Windows-1252 as it is written, so command parameters (which may be
//! any byte value) are never touched by the encoder.

use crate::encoding::{CP1252_PAGE, convert_to_cp1252, wrap_words};
use crate::error::{PrintError, PrintResult};

/// Largest payload accepted by a single QR store-data command (model 2)
const QR_MAX_PAYLOAD: usize = 7089;

/// QR error correction level for the printer's native QR command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QrErrorLevel {
    L,
    M,
    Q,
    H,
}

impl QrErrorLevel {
    fn command_byte(self) -> u8 {
        match self {
            QrErrorLevel::L => 0x30,
            QrErrorLevel::M => 0x31,
            QrErrorLevel::Q => 0x32,
            QrErrorLevel::H => 0x33,
        }
    }
}

/// ESC/POS command builder
///
/// Common widths:
/// - 58mm paper: 32 characters
/// - 80mm paper: 48 characters
pub struct EscPosBuilder {
    buf: Vec<u8>,
    width: usize,
}

impl EscPosBuilder {
    /// Create a new builder with the specified paper width in characters
    pub fn new(width: usize) -> Self {
        let mut buf = Vec::with_capacity(1024);
        // ESC @ (init), ESC t 16 (Windows-1252)
        buf.extend_from_slice(&[0x1B, 0x40, 0x1B, 0x74, CP1252_PAGE]);
        Self { buf, width }
    }

    // === Text Output ===

    /// Write text without a line break
    fn text(&mut self, s: &str) -> &mut Self {
        self.buf.extend_from_slice(&convert_to_cp1252(s));
        self
    }

    /// Write text followed by newline
    pub fn line(&mut self, s: &str) -> &mut Self {
        self.text(s);
        self.buf.push(b'\n');
        self
    }

    /// Write text word-wrapped to the paper width
    pub fn wrapped(&mut self, s: &str) -> &mut Self {
        for l in wrap_words(s, self.width) {
            self.line(&l);
        }
        self
    }

    /// Write empty line
    pub fn newline(&mut self) -> &mut Self {
        self.buf.push(b'\n');
        self
    }

    // === Alignment ===

    pub fn center(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1B, 0x61, 0x01]);
        self
    }

    // === Text Style ===

    pub fn bold(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1B, 0x45, 0x01]);
        self
    }

    pub fn bold_off(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1B, 0x45, 0x00]);
        self
    }

    /// Double height, normal width
    pub fn double_height(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1D, 0x21, 0x01]);
        self
    }

    /// Reset to normal size
    pub fn reset_size(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1D, 0x21, 0x00]);
        self
    }

    // === Separators ===

    /// Print a dashed rule ("- - -"), the receipt divider
    pub fn sep_dashed(&mut self) -> &mut Self {
        let rule: String = (0..self.width)
            .map(|i| if i % 2 == 0 { '-' } else { ' ' })
            .collect();
        self.line(rule.trim_end())
    }

    // === Paper Control ===

    /// Full cut after feeding n lines (GS V 66 n)
    pub fn cut_feed(&mut self, lines: u8) -> &mut Self {
        self.buf.extend_from_slice(&[0x1D, 0x56, 0x42, lines]);
        self
    }

    // === QR Code ===

    /// Print a QR code with the printer's native model 2 encoder
    ///
    /// `module` is the dot size of one module (1-16).
    pub fn qr_code(&mut self, data: &str, module: u8, level: QrErrorLevel) -> PrintResult<&mut Self> {
        let data_bytes = data.as_bytes();
        if data_bytes.is_empty() || data_bytes.len() > QR_MAX_PAYLOAD {
            return Err(PrintError::QrTooLarge(data_bytes.len()));
        }
        let module = module.clamp(1, 16);

        // Function 165: select model 2
        self.buf
            .extend_from_slice(&[0x1D, 0x28, 0x6B, 0x04, 0x00, 0x31, 0x41, 0x32, 0x00]);
        // Function 167: module size
        self.buf
            .extend_from_slice(&[0x1D, 0x28, 0x6B, 0x03, 0x00, 0x31, 0x43, module]);
        // Function 169: error correction
        self.buf.extend_from_slice(&[
            0x1D,
            0x28,
            0x6B,
            0x03,
            0x00,
            0x31,
            0x45,
            level.command_byte(),
        ]);

        // Function 180: store data
        let len = data_bytes.len() + 3;
        let p_l = (len & 0xFF) as u8;
        let p_h = ((len >> 8) & 0xFF) as u8;
        self.buf
            .extend_from_slice(&[0x1D, 0x28, 0x6B, p_l, p_h, 0x31, 0x50, 0x30]);
        self.buf.extend_from_slice(data_bytes);

        // Function 181: print
        self.buf
            .extend_from_slice(&[0x1D, 0x28, 0x6B, 0x03, 0x00, 0x31, 0x51, 0x30]);
        self.buf.push(b'\n');

        Ok(self)
    }

    // === Build ===

    /// Finish and return the byte stream
    pub fn build(self) -> Vec<u8> {
        self.buf
    }
}
