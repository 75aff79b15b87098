//! ISBN validation
//!
//! Accepts ISBN-10 and ISBN-13 with or without dashes/spaces.

/// Remove dashes and spaces, upper-casing a trailing `x`
pub fn normalize(isbn: &str) -> String {
    isbn.chars()
        .filter(|c| *c != '-' && !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

/// True if `isbn` is a checksum-valid ISBN-10 or ISBN-13
pub fn is_valid_isbn(isbn: &str) -> bool {
    let normalized = normalize(isbn);

    match normalized.len() {
        10 => validate_isbn10(&normalized),
        13 => validate_isbn13(&normalized),
        _ => false,
    }
}

/// Validate ISBN-10 checksum (weights 10..1, mod 11, `X` = 10 in last position)
fn validate_isbn10(isbn: &str) -> bool {
    let mut sum = 0u32;

    for (i, c) in isbn.chars().enumerate() {
        let value = match c {
            'X' if i == 9 => 10,
            _ => match c.to_digit(10) {
                Some(d) => d,
                None => return false,
            },
        };
        sum += value * (10 - i as u32);
    }

    sum % 11 == 0
}

/// Validate ISBN-13 checksum (alternating weights 1 and 3, mod 10)
fn validate_isbn13(isbn: &str) -> bool {
    let mut sum = 0u32;

    for (i, c) in isbn.chars().enumerate() {
        let Some(d) = c.to_digit(10) else {
            return false;
        };
        sum += if i % 2 == 0 { d } else { d * 3 };
    }

    sum % 10 == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_isbn13() {
        assert!(is_valid_isbn("9780441013593"));
        assert!(is_valid_isbn("978-0-441-01359-3"));
        assert!(is_valid_isbn("9780000000002"));
    }

    #[test]
    fn test_valid_isbn10() {
        assert!(is_valid_isbn("0441013597"));
        assert!(is_valid_isbn("0-8044-2957-X"));
        assert!(is_valid_isbn("080442957x"));
    }

    #[test]
    fn test_invalid_isbns() {
        assert!(!is_valid_isbn("9780441013594"));
        assert!(!is_valid_isbn("0441013598"));
        assert!(!is_valid_isbn("X441013597"));
        assert!(!is_valid_isbn("97804410135"));
        assert!(!is_valid_isbn("978044101359A"));
        assert!(!is_valid_isbn(""));
    }

    #[test]
    fn test_normalize_strips_separators() {
        assert_eq!(normalize("978-0 441-01359-3"), "9780441013593");
        assert_eq!(normalize("0-8044-2957-x"), "080442957X");
    }
}
