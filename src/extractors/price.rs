//! Price pattern matching
//!
//! Prices stay display strings: the patterns only cut the price token out of
//! the surrounding text. Patterns are an ordered list so currency coverage can
//! grow without touching the matching loop.

use regex::Regex;

/// Currency prefix: symbols, or the rupee codes with an optional dot.
const CURRENCY_PREFIX: &str = r"(?:\bRs\.?\s*|\bPKR\s*|₹\s*|[$€£¥₽₩￥]\s*)";
/// Currency token after the amount.
const CURRENCY_SUFFIX: &str = r"(?:Rs\b\.?|PKR\b|₹|[$€£¥₽₩￥])";
/// Digits with optional thousands separators and up to two decimals.
const AMOUNT: &str = r"\d[\d,]*(?:\.\d{1,2})?";

/// One price grammar.
#[derive(Debug, Clone)]
pub struct PricePattern {
    pub name: String,
    pub regex: Regex,
    /// Lower runs first.
    pub priority: u32,
}

/// Ordered set of price patterns; the first pattern that matches wins.
#[derive(Debug, Clone)]
pub struct PricePatterns {
    patterns: Vec<PricePattern>,
}

impl Default for PricePatterns {
    fn default() -> Self {
        let prefixed = format!(r"(?i){}{}", CURRENCY_PREFIX, AMOUNT);
        let labelled = format!(r"(?i)(?:From|Starting at|Price:)\s*{}?{}", CURRENCY_PREFIX, AMOUNT);
        let suffixed = format!(r"(?i){}\s*{}", AMOUNT, CURRENCY_SUFFIX);

        let mut patterns = Self::empty();
        for (priority, (name, source)) in [
            ("currency_prefix", prefixed),
            ("labelled", labelled),
            ("currency_suffix", suffixed),
        ]
        .into_iter()
        .enumerate()
        {
            // Built from the constants above, always valid.
            let regex = Regex::new(&source).expect("built-in price pattern is valid");
            patterns.push(PricePattern {
                name: name.to_string(),
                regex,
                priority: (priority as u32 + 1) * 10,
            });
        }
        patterns
    }
}

impl PricePatterns {
    /// A set with no patterns; every lookup falls through to raw text.
    pub fn empty() -> Self {
        Self { patterns: Vec::new() }
    }

    /// Insert a pattern, keeping priority order. Equal priorities keep insertion order.
    pub fn push(&mut self, pattern: PricePattern) {
        let at = self
            .patterns
            .iter()
            .position(|p| p.priority > pattern.priority)
            .unwrap_or(self.patterns.len());
        self.patterns.insert(at, pattern);
    }

    /// Compile and insert a pattern.
    pub fn with_pattern(
        mut self,
        name: &str,
        source: &str,
        priority: u32,
    ) -> Result<Self, regex::Error> {
        let regex = Regex::new(source)?;
        self.push(PricePattern {
            name: name.to_string(),
            regex,
            priority,
        });
        Ok(self)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PricePattern> {
        self.patterns.iter()
    }

    /// First full match of the first matching pattern, trimmed.
    pub fn find<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.patterns
            .iter()
            .find_map(|p| p.regex.find(text))
            .map(|m| m.as_str().trim())
    }

    /// Price token of `text`, or the whole trimmed text when no pattern matches.
    pub fn extract(&self, text: &str) -> String {
        let text = text.trim();
        self.find(text).unwrap_or(text).to_string()
    }
}
