//! Plate normalization
//!
//! Canonicalizes raw OCR text into the plate format `L DDD LL DD[D]`:
//! positions 0, 4 and 5 hold letters from the Cyrillic/Latin confusable set,
//! positions 1-3 and 6-7 hold digits. Only the `0`/`O` confusion is corrected.

/// Characters the recognizer is allowed to emit
pub const PLATE_ALPHABET: &str = "ABEKMHOPCTYX0123456789";

const LETTER_POSITIONS: [usize; 3] = [0, 4, 5];
const DIGIT_POSITIONS: [usize; 5] = [1, 2, 3, 6, 7];

/// Normalize raw recognizer output into a canonical plate string.
///
/// Whitespace is removed first so that positions refer to the compacted
/// string; the transform is idempotent. Returns `None` when nothing but
/// whitespace remains.
pub fn normalize_plate(raw: &str) -> Option<String> {
    let compact: Vec<char> = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return None;
    }

    Some(
        compact
            .into_iter()
            .enumerate()
            .map(|(position, c)| correct_confusable(position, c))
            .collect(),
    )
}

fn correct_confusable(position: usize, c: char) -> char {
    if LETTER_POSITIONS.contains(&position) && c == '0' {
        'O'
    } else if DIGIT_POSITIONS.contains(&position) && c == 'O' {
        '0'
    } else {
        c
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_plate_unchanged() {
        assert_eq!(normalize_plate("A123BC77").as_deref(), Some("A123BC77"));
    }

    #[test]
    fn test_zero_at_letter_position_becomes_o() {
        assert_eq!(normalize_plate("0123BC77").as_deref(), Some("O123BC77"));
        assert_eq!(normalize_plate("A1230C77").as_deref(), Some("A123OC77"));
        assert_eq!(normalize_plate("A123B077").as_deref(), Some("A123BO77"));
    }

    #[test]
    fn test_o_at_digit_position_becomes_zero() {
        assert_eq!(normalize_plate("AO23BC77").as_deref(), Some("A023BC77"));
        assert_eq!(normalize_plate("A12OBC7O").as_deref(), Some("A120BC70"));
    }

    #[test]
    fn test_zero_at_digit_position_is_kept() {
        assert_eq!(normalize_plate("A100BC77").as_deref(), Some("A100BC77"));
    }

    #[test]
    fn test_o_at_letter_position_is_kept() {
        assert_eq!(normalize_plate("O777OO99").as_deref(), Some("O777OO99"));
    }

    #[test]
    fn test_other_confusables_untouched() {
        // 8/B is not a corrected pair
        assert_eq!(normalize_plate("A1238C77").as_deref(), Some("A1238C77"));
    }

    #[test]
    fn test_whitespace_removed() {
        assert_eq!(normalize_plate(" A 123 BC 77\n").as_deref(), Some("A123BC77"));
        assert_eq!(normalize_plate("A123BC\t777").as_deref(), Some("A123BC777"));
    }

    #[test]
    fn test_positions_counted_after_whitespace_removal() {
        // The leading space must not shift the leading '0' onto a digit slot
        assert_eq!(normalize_plate(" 0123BC77").as_deref(), Some("O123BC77"));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize_plate(""), None);
        assert_eq!(normalize_plate("  \n\t"), None);
    }

    #[test]
    fn test_region_digits_beyond_pattern_untouched() {
        assert_eq!(normalize_plate("A123BC77O").as_deref(), Some("A123BC77O"));
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "",
            " ",
            "A123BC77",
            "0O0O0O0O0",
            "O0O0O0O0O",
            " 0 1 2 O B 0 7 O ",
            "A12OBC77",
            "XOOOYO00",
            "K\n\n123MM777",
            "ab0o",
            "0",
            "OOOOOOOOOOOO",
        ];
        for raw in samples {
            let once = normalize_plate(raw);
            let twice = once.as_deref().and_then(normalize_plate);
            assert_eq!(once, twice, "not idempotent for {:?}", raw);
        }
    }
}
