use tantivy::tokenizer::{LowerCaser, SimpleTokenizer, TextAnalyzer, TokenStream};

/// Lowercasing analyzer that splits on non-alphanumeric boundaries. No stemming
/// and no stop words, so every query term can match.
pub fn build_analyzer() -> TextAnalyzer {
	TextAnalyzer::builder(SimpleTokenizer::default()).filter(LowerCaser).build()
}

/// Runs `text` through `analyzer`, returning the terms in order.
pub fn tokenize(analyzer: &mut TextAnalyzer, text: &str) -> Vec<String> {
	let mut stream = analyzer.token_stream(text);
	let mut terms = Vec::new();
	while stream.advance() { terms.push(stream.token().text.clone()); }
	terms
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn lowercases_and_splits_on_punctuation() {
		let mut a = build_analyzer();
		assert_eq!(tokenize(&mut a, "The Cat-sat, on THE mat."), vec!["the", "cat", "sat", "on", "the", "mat"]);
		assert!(tokenize(&mut a, " ...  !! ").is_empty());
	}

	#[test]
	fn keeps_digits_and_non_ascii_letters() {
		let mut a = build_analyzer();
		assert_eq!(tokenize(&mut a, "Über 2024 café"), vec!["über", "2024", "café"]);
	}
}
