/// Length in bytes of the code point whose encoding starts with `b`.
#[inline]
pub fn codepoint_len(b: u8) -> usize {
    match b {
        b if b < 0x80 => 1,
        b if b < 0xe0 => 2,
        b if b < 0xf0 => 3,
        _ => 4,
    }
}

#[allow(clippy::cast_possible_wrap)]
#[inline]
fn is_utf8_first_byte(b: u8) -> bool {
    (b as i8) >= -0x40
}

/// Index just past the code point starting at `ix`.
#[inline]
pub fn next_codepoint_ix(s: impl AsRef<[u8]>, ix: usize) -> usize {
    let bytes = s.as_ref();
    debug_assert!(is_utf8_first_byte(bytes[ix]), "not at a code point boundary");
    ix + codepoint_len(bytes[ix])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lengths() {
        for c in ['a', 'é', '€', '😀'] {
            let mut buf = [0; 4];
            let encoded = c.encode_utf8(&mut buf);
            assert_eq!(codepoint_len(encoded.as_bytes()[0]), c.len_utf8());
        }
    }

    #[test]
    fn first_bytes() {
        let s = "a€b";
        let firsts: Vec<bool> = s.bytes().map(is_utf8_first_byte).collect();
        assert_eq!(firsts, vec![true, true, false, false, true]);
    }

    #[test]
    fn stepping() {
        let s = "x€😀";
        let mut ix = 0;
        let mut stops = Vec::new();
        while ix < s.len() {
            ix = next_codepoint_ix(s, ix);
            stops.push(ix);
        }
        assert_eq!(stops, vec![1, 4, 8]);
    }
}
