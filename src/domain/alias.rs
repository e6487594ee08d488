//! Alias sanitisation
//!
//! Turns free text such as `"Latest News"` into a camel-cased alias
//! (`"latestNews"`) usable as a macro or property alias.

/// Converts text into a safe camel-case alias
///
/// Words are split on any non-alphanumeric character. The first word starts
/// lowercase, following words start uppercase. Leading digits are dropped so
/// the alias always starts with a letter. Returns an empty string when no
/// letters remain.
pub fn safe_alias(text: &str) -> String {
    let mut alias = String::with_capacity(text.len());

    for word in text
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let word = if alias.is_empty() {
            word.trim_start_matches(|c: char| c.is_ascii_digit())
        } else {
            word
        };

        let mut chars = word.chars();
        let Some(first) = chars.next() else {
            continue;
        };

        if alias.is_empty() {
            alias.push(first.to_ascii_lowercase());
        } else {
            alias.push(first.to_ascii_uppercase());
        }
        alias.extend(chars);
    }

    alias
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camel_cases_words() {
        assert_eq!(safe_alias("Latest News"), "latestNews");
        assert_eq!(safe_alias("site-map  widget"), "siteMapWidget");
    }

    #[test]
    fn keeps_existing_camel_case() {
        assert_eq!(safe_alias("navigationMenu"), "navigationMenu");
        assert_eq!(safe_alias("NavigationMenu"), "navigationMenu");
    }

    #[test]
    fn strips_leading_digits() {
        assert_eq!(safe_alias("3 column layout"), "columnLayout");
        assert_eq!(safe_alias("col3"), "col3");
    }

    #[test]
    fn empty_when_nothing_usable() {
        assert_eq!(safe_alias(""), "");
        assert_eq!(safe_alias("  -- 42 "), "");
    }
}
