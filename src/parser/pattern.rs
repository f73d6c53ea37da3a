//! Start-anchored regular expressions for rules.
//!
//! Patterns are compiled with `regex-automata`'s meta engine and always
//! searched in anchored mode, so `text` and `^text` behave the same and a
//! rule can never skip ahead of the cursor.

use regex_automata::{meta::Regex, Anchored, Input};

use crate::errors::{Error, Result};

#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|cause| Error::InvalidPattern {
            pattern: pattern.to_string(),
            cause: Box::new(cause),
        })?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Matches at the very start of `haystack`. Empty matches count as no
    /// match so the cursor always moves forward.
    pub fn match_start(&self, haystack: &str) -> Option<Matched> {
        let input = Input::new(haystack).anchored(Anchored::Yes);
        let mut caps = self.regex.create_captures();
        self.regex.search_captures(&input, &mut caps);
        let whole = caps.get_match()?;
        if whole.is_empty() {
            return None;
        }
        let groups = (0..caps.group_len())
            .map(|i| caps.get_group(i).map(|sp| haystack[sp.start..sp.end].to_string()))
            .collect();
        Some(Matched { groups })
    }
}

impl std::str::FromStr for Pattern {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Pattern::new(s)
    }
}

/// Text captured by a successful [`Pattern`] match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matched {
    groups: Vec<Option<String>>,
}

impl Matched {
    /// The whole match.
    pub fn as_str(&self) -> &str {
        self.groups
            .first()
            .and_then(|g| g.as_deref())
            .unwrap_or_default()
    }

    /// Capture group `index`; group 0 is the whole match.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.groups.get(index).and_then(|g| g.as_deref())
    }

    pub fn len(&self) -> usize {
        self.as_str().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_str().is_empty()
    }

    pub fn into_string(mut self) -> String {
        self.groups
            .first_mut()
            .and_then(Option::take)
            .unwrap_or_default()
    }
}
