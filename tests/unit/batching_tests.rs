/*!
 * Tests for token-budgeted batching
 */

use bookwai::errors::TranslationError;
use bookwai::translation::tokens::CharRatioCounter;
use bookwai::translation::{Batcher, PromptBuilder};

fn prompts() -> PromptBuilder {
    PromptBuilder::new("French", false, true, "", "").expect("default templates are valid")
}

fn page(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_split_with_budget_shouldPreserveParagraphOrder() {
    let counter = CharRatioCounter;
    let prompts = prompts();
    let batcher = Batcher::new(&counter, &prompts, 0, 0.75, 0);
    let pages = vec![
        page(&["The first paragraph.", "The second paragraph."]),
        page(&["A third one on another page."]),
        page(&[]),
        page(&["And the last."]),
    ];

    let batches = batcher.split_with_budget(&pages, 12).unwrap();

    let flattened: Vec<String> = batches.concat();
    assert_eq!(flattened, pages.concat());
    assert!(batches.iter().all(|batch| !batch.is_empty()));
}

#[test]
fn test_split_with_budget_withTightBudget_shouldKeepBatchesWithinBudget() {
    let counter = CharRatioCounter;
    let prompts = prompts();
    let batcher = Batcher::new(&counter, &prompts, 0, 0.75, 0);
    let pages = vec![page(&["aaaaaaaa", "bbbbbbbb", "cccccccc", "dddddddd"])];

    let batches = batcher.split_with_budget(&pages, 5).unwrap();

    for batch in &batches {
        let joined = batch.join("\n");
        assert!(bookwai::translation::TokenCounter::count(&counter, &joined) <= 5);
    }
    assert_eq!(batches.concat().len(), 4);
}

#[test]
fn test_split_with_budget_withOversizedParagraph_shouldFail() {
    let counter = CharRatioCounter;
    let prompts = prompts();
    let batcher = Batcher::new(&counter, &prompts, 0, 0.75, 0);
    let pages = vec![page(&["short", &"x".repeat(200)])];

    let result = batcher.split_with_budget(&pages, 10);

    assert!(matches!(
        result,
        Err(TranslationError::ParagraphTooLong { tokens: 50, budget: 10 })
    ));
}

#[test]
fn test_budget_withTinyContextWindow_shouldBeExhausted() {
    let counter = CharRatioCounter;
    let prompts = prompts();
    let batcher = Batcher::new(&counter, &prompts, 0, 0.75, 0);

    assert!(matches!(
        batcher.budget(10),
        Err(TranslationError::BudgetExhausted { limit: 10, .. })
    ));
}

#[test]
fn test_budget_withContextPairs_shouldShareRemainder() {
    let counter = CharRatioCounter;
    let prompts = prompts();
    let single = Batcher::new(&counter, &prompts, 0, 1.0, 0);
    let paired = Batcher::new(&counter, &prompts, 1, 1.0, 0);

    let reserved = single.reserved_prompt_tokens();
    let limit = reserved + 4000;

    assert_eq!(single.budget(limit).unwrap(), 2000);
    assert_eq!(paired.budget(limit).unwrap(), 1000);
}

#[test]
fn test_budget_withCustomValue_shouldUseCustomValue() {
    let counter = CharRatioCounter;
    let prompts = prompts();
    let smaller = Batcher::new(&counter, &prompts, 0, 0.75, 100);
    let larger = Batcher::new(&counter, &prompts, 0, 0.75, 1_000_000);

    assert_eq!(smaller.budget(16384).unwrap(), 100);
    assert_eq!(larger.budget(16384).unwrap(), 1_000_000);
}
