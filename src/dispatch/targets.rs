use regex::Regex;
use std::sync::LazyLock;

static SCHEME_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[a-z0-9][a-z0-9+._-]*://").expect("static scheme prefix pattern")
});

/// Ordered, de-duplicated list of raw target strings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Targets(Vec<String>);

impl Targets {
    /// Split one delimited string into targets.
    ///
    /// Whitespace and `;` always separate targets. A comma only separates when
    /// the text after it starts a new `scheme://` target, so
    /// `pover://u@t/phone,tablet` stays one target.
    pub fn parse(raw: &str) -> Self {
        let mut found = Vec::new();

        for token in raw.split(|c: char| c.is_whitespace() || c == ';') {
            let mut current: Option<String> = None;

            for part in token.split(',') {
                if part.is_empty() {
                    continue;
                }
                if SCHEME_PREFIX_RE.is_match(part) {
                    found.extend(current.take());
                    current = Some(part.to_string());
                    continue;
                }
                match current.as_mut() {
                    Some(target) => {
                        target.push(',');
                        target.push_str(part);
                    }
                    None => current = Some(part.to_string()),
                }
            }

            found.extend(current);
        }

        Self::from_iter(found)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl<S: AsRef<str>> FromIterator<S> for Targets {
    /// Trims each entry, drops blanks and keeps the first of any duplicate
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut targets: Vec<String> = Vec::new();
        for item in iter {
            let item = item.as_ref().trim();
            if !item.is_empty() && !targets.iter().any(|t| t == item) {
                targets.push(item.to_string());
            }
        }
        Self(targets)
    }
}

impl From<&str> for Targets {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<String> for Targets {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<Vec<String>> for Targets {
    fn from(list: Vec<String>) -> Self {
        Self::from_iter(list)
    }
}

impl From<Vec<&str>> for Targets {
    fn from(list: Vec<&str>) -> Self {
        Self::from_iter(list)
    }
}

impl From<&[String]> for Targets {
    fn from(list: &[String]) -> Self {
        Self::from_iter(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(raw: &str) -> Vec<String> {
        Targets::parse(raw).into_vec()
    }

    #[test]
    fn test_whitespace_and_semicolons_separate() {
        assert_eq!(
            parsed("json://a  pbul://b;prowl://c\n tgram://d"),
            vec!["json://a", "pbul://b", "prowl://c", "tgram://d"]
        );
    }

    #[test]
    fn test_comma_splits_only_before_scheme() {
        assert_eq!(
            parsed("pover://u@t/phone,tablet,json://host"),
            vec!["pover://u@t/phone,tablet", "json://host"]
        );
        assert_eq!(parsed("json://a, json://b,"), vec!["json://a", "json://b"]);
    }

    #[test]
    fn test_duplicates_keep_first_occurrence() {
        assert_eq!(
            parsed("json://b json://a json://b"),
            vec!["json://b", "json://a"]
        );
    }

    #[test]
    fn test_blank_input_is_empty() {
        assert!(Targets::parse(" ; ,, ").is_empty());
        assert!(Targets::parse("").is_empty());
    }

    #[test]
    fn test_list_entries_are_not_split() {
        let targets = Targets::from(vec![" json://a b ", "json://a b", "", "pbul://x"]);
        assert_eq!(targets.into_vec(), vec!["json://a b", "pbul://x"]);
    }
}
