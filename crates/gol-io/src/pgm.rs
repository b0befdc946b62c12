//! Binary PGM (P5) codec.
//!
//! Decoding accepts any maxval from 1 to 255 and `#` comments between
//! header fields. Encoding always writes maxval 255 with no comments.

/// Largest sample value a single-byte PGM can carry.
pub const MAX_VALUE: u32 = 255;

const MAGIC: &str = "P5";

/// Errors from decoding or encoding a PGM image.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PgmError {
    /// The file does not start with the binary PGM magic number.
    #[error("not a binary PGM image (magic {found:?})")]
    BadMagic {
        /// The magic token actually found.
        found: String,
    },

    /// The header ended before all fields were read.
    #[error("PGM header truncated before {field}")]
    TruncatedHeader {
        /// The field that was missing.
        field: &'static str,
    },

    /// A header field is not a valid number.
    #[error("invalid PGM {field}: {value:?}")]
    InvalidField {
        /// The field name.
        field: &'static str,
        /// The raw token.
        value: String,
    },

    /// Maxval is outside the single-byte range.
    #[error("unsupported PGM maxval {0}, expected 1..=255")]
    UnsupportedMaxval(u32),

    /// Width times height does not fit in memory.
    #[error("PGM dimensions {width}x{height} are too large")]
    TooLarge {
        /// Declared width.
        width: usize,
        /// Declared height.
        height: usize,
    },

    /// Pixel data does not match the declared dimensions.
    #[error("PGM pixel data is {actual} bytes, expected {expected}")]
    PixelCount {
        /// Bytes required by the header.
        expected: usize,
        /// Bytes available.
        actual: usize,
    },
}

/// A decoded greyscale image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PgmImage {
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
    /// Row-major samples, one byte each.
    pub pixels: Vec<u8>,
}

/// Decode a binary PGM image.
///
/// Trailing bytes after the pixel data are ignored.
pub fn decode(bytes: &[u8]) -> Result<PgmImage, PgmError> {
    let mut header = Header::new(bytes);

    let magic = header.token().ok_or(PgmError::TruncatedHeader { field: "magic" })?;
    if magic != MAGIC {
        return Err(PgmError::BadMagic {
            found: magic.to_owned(),
        });
    }

    let width = header.number::<usize>("width")?;
    let height = header.number::<usize>("height")?;
    let maxval = header.number::<u32>("maxval")?;
    if maxval == 0 || maxval > MAX_VALUE {
        return Err(PgmError::UnsupportedMaxval(maxval));
    }

    let expected = width
        .checked_mul(height)
        .ok_or(PgmError::TooLarge { width, height })?;
    let data = header.pixel_data();
    let pixels = data.get(..expected).ok_or(PgmError::PixelCount {
        expected,
        actual: data.len(),
    })?;

    Ok(PgmImage {
        width,
        height,
        pixels: pixels.to_vec(),
    })
}

/// Encode row-major samples as a binary PGM image with maxval 255.
pub fn encode(width: usize, height: usize, pixels: &[u8]) -> Result<Vec<u8>, PgmError> {
    let expected = width
        .checked_mul(height)
        .ok_or(PgmError::TooLarge { width, height })?;
    if pixels.len() != expected {
        return Err(PgmError::PixelCount {
            expected,
            actual: pixels.len(),
        });
    }

    let head = format!("{MAGIC}\n{width} {height}\n{MAX_VALUE}\n");

    let mut out = Vec::with_capacity(head.len().saturating_add(pixels.len()));
    out.extend_from_slice(head.as_bytes());
    out.extend_from_slice(pixels);
    Ok(out)
}

/// Cursor over the ASCII header of a PGM file.
struct Header<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Header<'a> {
    const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn bump(&mut self) {
        self.pos = self.pos.saturating_add(1);
    }

    /// Skip whitespace and `#` comments.
    fn skip_separators(&mut self) {
        while let Some(b) = self.peek() {
            if b == b'#' {
                while let Some(c) = self.peek() {
                    self.bump();
                    if c == b'\n' || c == b'\r' {
                        break;
                    }
                }
            } else if b.is_ascii_whitespace() {
                self.bump();
            } else {
                break;
            }
        }
    }

    fn token(&mut self) -> Option<&'a str> {
        self.skip_separators();
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() || b == b'#' {
                break;
            }
            self.bump();
        }
        if start == self.pos {
            return None;
        }
        std::str::from_utf8(self.bytes.get(start..self.pos)?).ok()
    }

    fn number<T: std::str::FromStr>(&mut self, field: &'static str) -> Result<T, PgmError> {
        let token = self.token().ok_or(PgmError::TruncatedHeader { field })?;
        token.parse().map_err(|_invalid| PgmError::InvalidField {
            field,
            value: token.to_owned(),
        })
    }

    /// Bytes after the single whitespace byte that ends the header.
    fn pixel_data(&mut self) -> &'a [u8] {
        if self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.bump();
        }
        self.bytes.get(self.pos..).unwrap_or_default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn encode_writes_p5_header() {
        let bytes = encode(3, 2, &[0, 255, 0, 255, 0, 0]).unwrap();
        assert!(bytes.starts_with(b"P5\n3 2\n255\n"));
        assert_eq!(bytes.len(), 11 + 6);
    }

    #[test]
    fn decode_reads_what_encode_wrote() {
        let pixels = vec![255, 0, 0, 0, 255, 0, 0, 0, 255];
        let image = decode(&encode(3, 3, &pixels).unwrap()).unwrap();
        assert_eq!(image, PgmImage {
            width: 3,
            height: 3,
            pixels,
        });
    }

    #[test]
    fn comments_and_extra_whitespace_are_skipped() {
        let mut bytes = b"P5 # made by hand\n# another comment\n  2\t2\n# max\n255\n".to_vec();
        bytes.extend_from_slice(&[1, 0, 0, 255]);
        let image = decode(&bytes).unwrap();
        assert_eq!((image.width, image.height), (2, 2));
        assert_eq!(image.pixels, vec![1, 0, 0, 255]);
    }

    #[test]
    fn pixel_bytes_that_look_like_whitespace_are_kept() {
        // 0x0a and 0x20 are valid samples right after the header.
        let mut bytes = b"P5\n2 1\n255\n".to_vec();
        bytes.extend_from_slice(&[b'\n', b' ']);
        assert_eq!(decode(&bytes).unwrap().pixels, vec![b'\n', b' ']);
    }

    #[test]
    fn ascii_pgm_is_rejected() {
        let err = decode(b"P2\n1 1\n255\n0\n").unwrap_err();
        assert_eq!(err, PgmError::BadMagic {
            found: "P2".to_owned()
        });
    }

    #[test]
    fn sixteen_bit_maxval_is_rejected() {
        let err = decode(b"P5\n1 1\n65535\n\0\0").unwrap_err();
        assert_eq!(err, PgmError::UnsupportedMaxval(65535));
    }

    #[test]
    fn short_pixel_data_is_rejected() {
        let err = decode(b"P5\n4 4\n255\n\0\0\0").unwrap_err();
        assert_eq!(err, PgmError::PixelCount {
            expected: 16,
            actual: 3
        });
    }

    #[test]
    fn missing_fields_are_reported() {
        assert_eq!(decode(b"P5\n4").unwrap_err(), PgmError::TruncatedHeader {
            field: "height"
        });
        assert_eq!(decode(b"").unwrap_err(), PgmError::TruncatedHeader { field: "magic" });
        assert!(matches!(
            decode(b"P5\nwide 4\n255\n").unwrap_err(),
            PgmError::InvalidField { field: "width", .. }
        ));
    }

    #[test]
    fn encode_rejects_wrong_pixel_count() {
        assert_eq!(encode(2, 2, &[0; 3]).unwrap_err(), PgmError::PixelCount {
            expected: 4,
            actual: 3
        });
    }
}
