//! Property tests for the keyboard-wedge grammar.

use labelcheck_core::constants::WEDGE_BUFFER_CAPACITY;
use labelcheck_hardware::{WedgeBuffer, match_tracking_number};
use proptest::prelude::*;
use regex::Regex;

/// Keystroke segments: noise, bare codes, prefixed codes and truncated codes.
fn segment() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z0-9 \\-]{0,12}",
        "1Z[0-9A-Z]{16}",
        "\\\\000026 ?1Z[0-9A-Z]{16}",
        "1Z[0-9A-Z]{0,15}",
        "[1Z]{1,4}",
    ]
}

fn keystrokes() -> impl Strategy<Value = String> {
    prop::collection::vec(segment(), 0..24).prop_map(|parts| parts.concat())
}

proptest! {
    /// Property: a decode fires exactly when a suffix of the keys held since
    /// the last decode matches the grammar.
    #[test]
    fn prop_decodes_iff_suffix_matches(keys in keystrokes()) {
        let grammar = Regex::new(r"(?:\\000026)?(1Z[0-9A-Z]{16})$").unwrap();
        let mut buffer = WedgeBuffer::new();
        let mut held = String::new();

        for c in keys.chars() {
            held.push(c);
            if held.chars().count() > WEDGE_BUFFER_CAPACITY {
                held.remove(0);
            }

            let expected = grammar.captures(&held).map(|caps| caps[1].to_string());
            let decoded = buffer.push(c).map(|tn| tn.as_str().to_string());
            prop_assert_eq!(&decoded, &expected);

            if expected.is_some() {
                held.clear();
                prop_assert!(buffer.is_empty());
            }
            prop_assert_eq!(buffer.as_str(), held.as_str());
        }
    }

    /// Property: leading noise never hides a complete code.
    #[test]
    fn prop_noise_before_code_tolerated(
        noise in "[a-y0-9]{0,64}",
        body in "[0-9A-Y]{16}",
    ) {
        let code = format!("1Z{body}");
        let mut buffer = WedgeBuffer::new();
        let mut decoded = Vec::new();

        for c in noise.chars().chain(code.chars()) {
            decoded.extend(buffer.push(c));
        }

        prop_assert_eq!(decoded.len(), 1);
        prop_assert_eq!(decoded[0].as_str(), code.as_str());
        prop_assert!(buffer.is_empty());
    }

    /// Property: text without a `Z` can never decode.
    #[test]
    fn prop_no_z_no_match(text in "[^Z]{0,64}") {
        prop_assert!(match_tracking_number(&text).is_none());
    }
}
