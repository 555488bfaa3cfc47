use super::*;

use crate::moderation;
use serial_test::serial;

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}

#[test]
fn mask_replaces_hits_character_for_character() {
    let text = "这句话包含傻逼和赌博两个词";
    let outcome = moderation::mask(text, &words(&["傻逼", "赌博"]));

    assert!(!outcome.allowed);
    assert_eq!(outcome.hits, words(&["傻逼", "赌博"]));
    assert_eq!(outcome.masked_text, "这句话包含**和**两个词");
    assert_eq!(
        outcome.masked_text.chars().count(),
        text.chars().count(),
        "masking must preserve the character length"
    );
}

#[test]
fn mask_handles_repeated_occurrences() {
    let outcome = moderation::mask("赌博赌博还是赌博", &words(&["赌博"]));
    assert_eq!(outcome.hits, words(&["赌博"]));
    assert_eq!(outcome.masked_text, "****还是**");
}

#[test]
fn mask_skips_empty_words_and_passes_clean_text() {
    let outcome = moderation::mask("完全正常的内容", &words(&["", "赌博"]));
    assert!(outcome.allowed);
    assert!(outcome.hits.is_empty());
    assert_eq!(outcome.masked_text, "完全正常的内容");
}

#[test]
fn masked_output_yields_no_further_hits() {
    let list = words(&["傻逼", "赌博", "色情"]);
    let outcome = moderation::mask("傻逼赌博色情混在一句里", &list);
    let again = moderation::mask(&outcome.masked_text, &list);
    assert!(again.hits.is_empty());
    assert_eq!(again.masked_text, outcome.masked_text);
}

#[test]
fn earlier_words_shadow_their_substrings() {
    // "法轮" is consumed by the earlier "法轮功" mask and no longer matches.
    let outcome = moderation::mask("提到法轮功的文本", &words(&["法轮功", "法轮"]));
    assert_eq!(outcome.hits, words(&["法轮功"]));
}

#[serial]
#[tokio::test]
async fn check_text_uses_the_stored_word_list() {
    reset_all().await;

    let outcome = moderation::check_text("这里出现了赌博一词").await;
    assert!(!outcome.allowed);
    assert_eq!(outcome.hits, words(&["赌博"]));

    assert!(!moderation::sensitive_words().await.is_empty());
}
