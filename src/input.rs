use std::ops::RangeInclusive;

/// Length in bytes of the symbolic input fed to the target on stdin
pub const INPUT_LENGTH: usize = 32;

/// Every input byte is constrained to printable ASCII
pub const PRINTABLE: RangeInclusive<u8> = 0x20..=0x7e;

/// Shape of the unknown program input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSpec {
    pub name: String,
    pub length: usize,
    pub charset: RangeInclusive<u8>,
}

impl Default for InputSpec {
    fn default() -> Self {
        InputSpec {
            name: "flag".to_owned(),
            length: INPUT_LENGTH,
            charset: PRINTABLE,
        }
    }
}

impl InputSpec {
    pub fn bits(&self) -> u32 {
        8 * self.length as u32
    }

    pub fn admits(&self, bytes: &[u8]) -> bool {
        bytes.len() == self.length && bytes.iter().all(|b| self.charset.contains(b))
    }
}

/// Decode solution bytes for display, silently dropping invalid UTF-8
pub fn decode_ignoring_errors(bytes: &[u8]) -> String {
    let mut decoded = String::with_capacity(bytes.len());
    let mut rest = bytes;

    while !rest.is_empty() {
        match std::str::from_utf8(rest) {
            Ok(valid) => {
                decoded.push_str(valid);
                break;
            }
            Err(err) => {
                let (valid, after) = rest.split_at(err.valid_up_to());
                // the prefix up to valid_up_to always decodes
                decoded.push_str(std::str::from_utf8(valid).unwrap_or_default());
                let skip = err.error_len().unwrap_or(after.len());
                rest = &after[skip..];
            }
        }
    }
    decoded
}
