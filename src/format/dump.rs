//! Hex dump rendering

/// Layout of dumped data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum DumpFormat {
    /// `hexdump -C` style: offset, 16 hex bytes, ASCII column
    #[default]
    OffsetHexAscii,
}

pub const BYTES_PER_LINE: usize = 16;

const HEX: &[u8; 16] = b"0123456789ABCDEF";

/// Render one line of at most 16 bytes at `offset`
///
/// ```text
/// 000030C0  02 02 00 00 06 00 00 00  02 06 00 00 06 00 00 41  |...............A|
/// ```
pub fn hex_line(offset: usize, chunk: &[u8]) -> String {
    let mut line = format!("{:08X}  ", offset);

    for i in 0..BYTES_PER_LINE {
        if i == 8 {
            line.push(' ');
        }
        match chunk.get(i) {
            Some(&b) => {
                line.push(HEX[(b >> 4) as usize] as char);
                line.push(HEX[(b & 0x0f) as usize] as char);
            }
            None => line.push_str("  "),
        }
        line.push(' ');
    }

    line.push_str(" |");
    for &b in chunk.iter().take(BYTES_PER_LINE) {
        line.push(if (0x20..=0x7e).contains(&b) { b as char } else { '.' });
    }
    line.push('|');
    line
}

/// Lines of a dump of `data`
pub fn hex_lines(data: &[u8], format: DumpFormat) -> impl Iterator<Item = String> + '_ {
    let DumpFormat::OffsetHexAscii = format;
    data.chunks(BYTES_PER_LINE)
        .enumerate()
        .map(|(i, chunk)| hex_line(i * BYTES_PER_LINE, chunk))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_line() {
        let data = [
            0x02, 0x02, 0x00, 0x00, 0x06, 0x00, 0x00, 0x00, 0x02, 0x06, 0x00, 0x00, 0x06, 0x00,
            0x00, 0x41,
        ];
        assert_eq!(
            hex_line(0x30c0, &data),
            "000030C0  02 02 00 00 06 00 00 00  02 06 00 00 06 00 00 41  |...............A|"
        );
    }

    #[test]
    fn test_partial_line_is_padded() {
        let line = hex_line(16, b"Hi!");
        assert_eq!(
            line,
            "00000010  48 69 21                                          |Hi!|"
        );
        // the hex column keeps its width
        assert_eq!(line.find('|'), Some(60));
    }

    #[test]
    fn test_lines_and_offsets() {
        let data: Vec<u8> = (0u8..40).collect();
        let lines: Vec<_> = hex_lines(&data, DumpFormat::default()).collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("00000010  10 11"));
        assert!(lines[2].starts_with("00000020  20 21"));
        assert!(lines[2].ends_with("| !\"#$%&'|"));
    }

    #[test]
    fn test_empty_data() {
        assert_eq!(hex_lines(&[], DumpFormat::default()).count(), 0);
    }
}
