//! Keyword classification of free text.
//!
//! Two pure functions, both total: every input (including `None`, empty, or
//! whitespace-only text) maps to a defined value and nothing here can fail.
//!
//! - [`detect_language`] returns [`Language::Ko`] as soon as one Hangul
//!   syllable is present, [`Language::En`] otherwise.
//! - [`categorize_question`] walks [`CATEGORY_RULES`] in order and returns
//!   the first category with a case-insensitive substring hit. Rule order is
//!   the tie-break, so a question about a swap *price* lands in `price`.

use crate::types::{Category, Language};

/// Hangul syllables block (가 .. 힣).
const HANGUL_SYLLABLES: std::ops::RangeInclusive<char> = '\u{AC00}'..='\u{D7A3}';

/// A category and the keywords that select it.
#[derive(Debug, Clone, Copy)]
pub struct CategoryRule {
    pub category: Category,
    /// Lowercase keywords, matched as substrings
    pub keywords: &'static [&'static str],
}

/// Ordered rule list. [`Category::General`] is the fallback and has no rule.
pub const CATEGORY_RULES: &[CategoryRule] = &[
    CategoryRule {
        category: Category::Price,
        keywords: &[
            "price", "chart", "market cap", "marketcap", "all-time high", "가격", "시세", "얼마",
            "시가총액", "차트", "상승", "하락",
        ],
    },
    CategoryRule {
        category: Category::Dex,
        keywords: &[
            "dex", "swap", "liquidity", "slippage", "pool", "스왑", "유동성", "슬리피지", "교환",
        ],
    },
    CategoryRule {
        category: Category::Bridge,
        keywords: &[
            "bridge", "cross-chain", "crosschain", "cross chain", "브릿지", "브리지", "크로스체인",
            "체인 이동",
        ],
    },
    CategoryRule {
        category: Category::Wallet,
        keywords: &[
            "wallet", "metamask", "seed phrase", "private key", "connect", "balance", "지갑",
            "메타마스크", "니모닉", "개인키", "연결", "잔액",
        ],
    },
    CategoryRule {
        category: Category::Support,
        keywords: &[
            "help", "support", "error", "bug", "issue", "problem", "not working", "failed",
            "도움", "문의", "오류", "에러", "문제", "안돼", "안 돼", "실패",
        ],
    },
];

/// Detect the language of `text`.
///
/// `ko` if any character falls in the Hangul syllables block, else `en`.
/// `None` and empty text are `en`.
pub fn detect_language(text: Option<&str>) -> Language {
    match text {
        Some(t) if t.chars().any(|c| HANGUL_SYLLABLES.contains(&c)) => Language::Ko,
        _ => Language::En,
    }
}

/// Assign a [`Category`] to a question.
pub fn categorize_question(text: Option<&str>) -> Category {
    let Some(text) = text else {
        return Category::General;
    };
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Category::General;
    }

    let haystack = trimmed.to_lowercase();

    CATEGORY_RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|kw| haystack.contains(kw)))
        .map(|rule| rule.category)
        .unwrap_or(Category::General)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_language() {
        assert_eq!(detect_language(Some("비트코인 가격 알려줘")), Language::Ko);
        assert_eq!(detect_language(Some("what is the price? 감사")), Language::Ko);
        assert_eq!(detect_language(Some("What is the price of ETH?")), Language::En);
        assert_eq!(detect_language(Some("")), Language::En);
        assert_eq!(detect_language(None), Language::En);
        // Hangul compatibility jamo are outside the syllables block
        assert_eq!(detect_language(Some("ㅋㅋㅋ")), Language::En);
    }

    #[test]
    fn test_detect_language_is_deterministic() {
        let text = Some("스왑 수수료가 얼마인가요?");
        let first = detect_language(text);
        for _ in 0..10 {
            assert_eq!(detect_language(text), first);
        }
    }

    #[test]
    fn test_categorize_basic() {
        assert_eq!(categorize_question(Some("What's the BTC price?")), Category::Price);
        assert_eq!(categorize_question(Some("How do I swap tokens?")), Category::Dex);
        assert_eq!(
            categorize_question(Some("Bridge my USDC to Arbitrum")),
            Category::Bridge
        );
        assert_eq!(
            categorize_question(Some("MetaMask won't open")),
            Category::Wallet
        );
        assert_eq!(
            categorize_question(Some("I found a bug on the page")),
            Category::Support
        );
        assert_eq!(categorize_question(Some("tell me a joke")), Category::General);
    }

    #[test]
    fn test_categorize_korean() {
        assert_eq!(categorize_question(Some("이더리움 시세 알려줘")), Category::Price);
        assert_eq!(categorize_question(Some("유동성 공급 방법")), Category::Dex);
        assert_eq!(categorize_question(Some("브릿지 수수료")), Category::Bridge);
        assert_eq!(categorize_question(Some("지갑 만들기")), Category::Wallet);
        assert_eq!(categorize_question(Some("로그인 오류가 나요")), Category::Support);
    }

    #[test]
    fn test_categorize_order_is_tie_break() {
        // Matches both price and dex keywords; price is evaluated first
        assert_eq!(
            categorize_question(Some("what is the swap price on the dex")),
            Category::Price
        );
        // Matches wallet and support; wallet wins
        assert_eq!(
            categorize_question(Some("wallet connect error")),
            Category::Wallet
        );
    }

    #[test]
    fn test_categorize_case_insensitive() {
        assert_eq!(categorize_question(Some("PRICE")), Category::Price);
        assert_eq!(categorize_question(Some("Slippage too high")), Category::Dex);
    }

    #[test]
    fn test_categorize_empty_inputs() {
        assert_eq!(categorize_question(None), Category::General);
        assert_eq!(categorize_question(Some("")), Category::General);
        assert_eq!(categorize_question(Some("   \n\t ")), Category::General);
    }

    #[test]
    fn test_categorize_always_in_fixed_set() {
        let samples = [
            "",
            "🚀🚀🚀",
            "\u{0000}",
            "가격",
            "help me",
            "a very long question about nothing in particular at all",
        ];
        for sample in samples {
            assert!(Category::ALL.contains(&categorize_question(Some(sample))));
        }
    }

    #[test]
    fn test_keyword_table_is_lowercase() {
        for rule in CATEGORY_RULES {
            assert_ne!(rule.category, Category::General);
            for kw in rule.keywords {
                assert_eq!(*kw, kw.to_lowercase(), "keyword {kw:?} must be lowercase");
            }
        }
        assert!(CATEGORY_RULES[0].keywords.contains(&"price"));
    }
}
