use docsearch_core::config::ChunkingConfig;
use docsearch_core::RecursiveChunker;
use proptest::prelude::*;

fn tail(s: &str, n: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    chars[chars.len().saturating_sub(n)..].iter().collect()
}

fn text_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            "[a-zA-Z]{1,12}",
            Just(" ".to_string()),
            Just(". ".to_string()),
            Just("\n".to_string()),
            Just("\n\n".to_string()),
            "[a-z]{30,90}",
            Just("é".to_string()),
        ],
        0..120,
    )
    .prop_map(|parts| parts.concat())
}

proptest! {
    #[test]
    fn chunks_are_deterministic_bounded_and_overlapping(
        text in text_strategy(),
        max in 20usize..200,
        overlap_pct in 0usize..60,
    ) {
        let overlap = max * overlap_pct / 100;
        let chunker = RecursiveChunker::new(ChunkingConfig::new(max, overlap).unwrap()).unwrap();
        let first = chunker.split_text(&text);
        let second = chunker.split_text(&text);
        prop_assert_eq!(&first, &second);

        for chunk in &first {
            prop_assert!(chunk.chars().count() <= max, "chunk exceeds bound: {:?}", chunk);
            prop_assert!(!chunk.trim().is_empty());
        }
        for pair in first.windows(2) {
            prop_assert!(pair[1].starts_with(&tail(&pair[0], overlap)));
        }
        if text.trim().chars().count() <= max && !text.trim().is_empty() {
            prop_assert_eq!(first, vec![text.trim().to_string()]);
        }
    }
}
