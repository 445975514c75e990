//! Property-based tests for normalization and row building

use std::collections::BTreeSet;

use bindsync_keybinds::{KeyNormalizer, Mode, RawRecord, RowBuilder};
use proptest::prelude::*;

fn mode_code_strategy() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("n"),
        Just("v"),
        Just("x"),
        Just("s"),
        Just("i"),
        Just("c"),
        Just("t"),
        Just("o"),
    ]
}

/// Key tokens in the spellings users actually write
fn token_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        (b'a'..=b'z').prop_map(|c| (c as char).to_string()),
        Just(" ".to_string()),
        Just("<Space>".to_string()),
        Just("<space>".to_string()),
        Just("<leader>".to_string()),
        Just("<c-w>".to_string()),
        Just("<C-S>".to_string()),
        Just("<a-j>".to_string()),
        Just("<cr>".to_string()),
        Just("<Esc>".to_string()),
        Just("<f5>".to_string()),
        Just("\\".to_string()),
        Just("<".to_string()),
        Just("]".to_string()),
        Just("\t".to_string()),
        Just("\r".to_string()),
        Just("\n".to_string()),
        Just("\u{17}".to_string()),
        Just("\u{a0}".to_string()),
    ]
}

fn lhs_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(token_strategy(), 1..5).prop_map(|tokens| tokens.concat())
}

fn record_strategy() -> impl Strategy<Value = RawRecord> {
    (mode_code_strategy(), lhs_strategy(), any::<bool>()).prop_map(|(mode, lhs, buffer)| {
        let record = RawRecord::new(mode, lhs).with_description("generated");
        if buffer {
            record.buffer_local()
        } else {
            record
        }
    })
}

proptest! {
    /// Normalizing twice is the same as normalizing once
    #[test]
    fn prop_normalize_idempotent(lhs in lhs_strategy()) {
        let normalizer = KeyNormalizer::default();
        let once = normalizer.normalize(&lhs);
        prop_assert!(!once.chars().any(char::is_whitespace));
        prop_assert_eq!(normalizer.normalize(&once), once);
    }

    /// At most one row per (scope flag, normalized lhs), carrying the union of modes
    #[test]
    fn prop_rows_deduplicated(records in prop::collection::vec(record_strategy(), 1..30)) {
        let builder = RowBuilder::with_defaults();
        let rows = builder.build(&records);

        let mut seen = BTreeSet::new();
        for row in &rows {
            prop_assert!(seen.insert((row.scope_flag, row.lhs_normalized.clone())));
            prop_assert!(!row.modes.is_empty());

            let expected: BTreeSet<Mode> = records
                .iter()
                .filter(|r| r.scope_flag == row.scope_flag
                    && builder.normalizer().normalize(&r.lhs) == row.lhs_normalized)
                .map(|r| Mode::from_code(&r.mode).unwrap())
                .collect();
            prop_assert_eq!(&row.modes, &expected);
        }
    }

    /// Mode merges never move the fingerprint
    #[test]
    fn prop_fingerprint_ignores_modes(
        lhs in lhs_strategy(),
        first in mode_code_strategy(),
        second in mode_code_strategy(),
    ) {
        let builder = RowBuilder::with_defaults();
        let single = builder.build(&[RawRecord::new(first, lhs.clone())]);
        let merged = builder.build(&[RawRecord::new(first, lhs.clone()), RawRecord::new(second, lhs)]);

        prop_assert_eq!(single.len(), 1);
        prop_assert_eq!(merged.len(), 1);
        prop_assert_eq!(&single[0].binding_fingerprint, &merged[0].binding_fingerprint);
    }
}
