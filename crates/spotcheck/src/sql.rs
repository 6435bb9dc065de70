//! Identifier quoting.
//!
//! Catalog lookups bind table names as parameters. The few statements that
//! need a table name as an identifier (`SELECT ... FROM <table>`) only ever
//! receive names that were first resolved against the catalog, and quote them
//! with [`quote_ident`].

use std::fmt;

/// A PostgreSQL identifier wrapper.
///
/// Display writes the value escaped and quoted with double quotes.
///
/// # Example
/// ```
/// use spotcheck::Ident;
/// assert_eq!(format!("{}", Ident("plano")), "\"plano\"");
/// assert_eq!(format!("{}", Ident("bla\"h")), "\"bla\"\"h\"");
/// ```
pub struct Ident<T: AsRef<str>>(pub T);

impl<T: AsRef<str>> fmt::Display for Ident<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"")?;
        for c in self.0.as_ref().chars() {
            if c == '"' {
                write!(f, "\"\"")?;
            } else {
                write!(f, "{}", c)?;
            }
        }
        write!(f, "\"")
    }
}

/// Quote a PostgreSQL identifier.
///
/// Always quotes, so mixed-case names like `SpotifyClone` keep their case and
/// reserved words like `user` stay usable. Doubles any embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("{}", Ident(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn keeps_case() {
        assert_eq!(quote_ident("SpotifyClone"), "\"SpotifyClone\"");
    }

    #[test]
    fn reserved_word() {
        assert_eq!(quote_ident("user"), "\"user\"");
    }

    /// Undo the quoting the way the server's lexer would.
    fn unquote(quoted: &str) -> Option<String> {
        let inner = quoted.strip_prefix('"')?.strip_suffix('"')?;
        let mut out = String::new();
        let mut chars = inner.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '"' {
                // a lone quote would have ended the identifier
                if chars.next() != Some('"') {
                    return None;
                }
            }
            out.push(c);
        }
        Some(out)
    }

    proptest! {
        #[test]
        fn quoting_is_reversible(name in ".*") {
            prop_assert_eq!(unquote(&quote_ident(&name)), Some(name));
        }

        #[test]
        fn quotes_inside_are_always_paired(name in "[a-z\"]{0,16}") {
            let quoted = quote_ident(&name);
            let inner = &quoted[1..quoted.len() - 1];
            prop_assert_eq!(inner.matches('"').count(), 2 * name.matches('"').count());
        }
    }
}
