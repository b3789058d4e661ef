use serde::{Deserialize, Serialize};
use std::fmt;

/// Two-letter lowercase language code such as `en` or `ja`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageCode(String);

impl LanguageCode {
    /// Strict parse used for configuration values
    pub fn parse(code: &str) -> anyhow::Result<Self> {
        let code = code.trim();
        if code.chars().count() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            anyhow::bail!("Invalid language code '{}': expected two letters", code);
        }
        Ok(Self(code.to_ascii_lowercase()))
    }

    /// Reduce a detector or caller supplied identifier to its two-letter prefix.
    ///
    /// `en-US` becomes `en`, `FR` becomes `fr`. The result is not checked
    /// against any allow-list.
    pub fn normalize(raw: &str) -> Self {
        let prefix: String = raw.trim().chars().take(2).collect();
        Self(prefix.to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for LanguageCode {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for LanguageCode {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Ordered (source, target) pair identifying one translation model
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LanguagePair {
    pub source: LanguageCode,
    pub target: LanguageCode,
}

impl LanguagePair {
    pub fn new(source: LanguageCode, target: LanguageCode) -> Self {
        Self { source, target }
    }
}

impl fmt::Display for LanguagePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.source, self.target)
    }
}

/// Fixed allow-list of languages the service will translate between
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SupportedLanguages(Vec<LanguageCode>);

impl SupportedLanguages {
    pub fn new(codes: Vec<LanguageCode>) -> Self {
        let mut unique: Vec<LanguageCode> = Vec::with_capacity(codes.len());
        for code in codes {
            if !unique.contains(&code) {
                unique.push(code);
            }
        }
        Self(unique)
    }

    pub fn contains(&self, code: &LanguageCode) -> bool {
        self.0.contains(code)
    }
}

impl Default for SupportedLanguages {
    fn default() -> Self {
        Self(
            ["en", "fr", "es", "ja"]
                .iter()
                .map(|c| LanguageCode(c.to_string()))
                .collect(),
        )
    }
}

impl fmt::Display for SupportedLanguages {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let codes: Vec<&str> = self.0.iter().map(|c| c.as_str()).collect();
        write!(f, "[{}]", codes.join(", "))
    }
}
