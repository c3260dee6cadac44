//! Order-reversing fixed-width encoding of small integers.
//!
//! Keys built from these strings sort newest-first under plain byte order,
//! which is the only ordering the document store offers.

/// Symbol for each decimal digit. A larger digit maps to a smaller symbol.
const DIGIT_SYMBOLS: [char; 10] = ['J', 'I', 'H', 'G', 'F', 'E', 'D', 'C', 'B', 'A'];

/// Encodes `n` so that, among values of equal digit width, string order is the
/// reverse of numeric order. Single-digit values are padded with the symbol for
/// zero so days and months always occupy two characters.
pub fn encode(n: u64) -> String {
    let mut symbols = Vec::with_capacity(20);
    let mut rest = n;
    loop {
        symbols.push(DIGIT_SYMBOLS[(rest % 10) as usize]);
        rest /= 10;
        if rest == 0 {
            break;
        }
    }
    if n < 10 {
        symbols.push(DIGIT_SYMBOLS[0]);
    }
    symbols.iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::encode;

    #[test]
    fn encodes_known_values() {
        assert_eq!(encode(0), "JJ");
        assert_eq!(encode(5), "JE");
        assert_eq!(encode(9), "JA");
        assert_eq!(encode(10), "IJ");
        assert_eq!(encode(12), "IH");
        assert_eq!(encode(31), "GI");
        assert_eq!(encode(2024), "HJHF");
    }

    #[test]
    fn two_digit_values_reverse_numeric_order() {
        for a in 0..100u64 {
            for b in (a + 1)..100 {
                let (ea, eb) = (encode(a), encode(b));
                assert_eq!(ea.len(), 2);
                assert_eq!(eb.len(), 2);
                assert!(ea > eb, "encode({a})={ea} should sort after encode({b})={eb}");
            }
        }
    }

    #[test]
    fn four_digit_years_reverse_numeric_order() {
        let years: Vec<String> = (1990..2100).map(encode).collect();
        assert!(years.iter().all(|year| year.len() == 4));
        assert!(years.windows(2).all(|pair| pair[0] > pair[1]));
    }
}
