//! Registry tokens: subject names and program keys.
//!
//! Subject names come straight from the authored tables (Korean names with
//! spaces such as `물리학 Ⅰ` are common), so the token rule is
//! loose: trimmed, non-empty, at most 128 chars, no control characters.

use core::borrow::Borrow;
use core::fmt;
use core::str::FromStr;

use crate::errors::CoreError;

const MAX_TOKEN_CHARS: usize = 128;

fn check_token(s: &str) -> Result<(), CoreError> {
    if s.is_empty() {
        return Err(CoreError::EmptyToken);
    }
    if s.trim() != s || s.chars().count() > MAX_TOKEN_CHARS || s.chars().any(char::is_control) {
        return Err(CoreError::InvalidToken(s.to_string()));
    }
    Ok(())
}

macro_rules! def_token {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
        pub struct $name(String);

        impl $name {
            pub fn as_str(&self) -> &str { &self.0 }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
        }

        impl FromStr for $name {
            type Err = CoreError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                check_token(s)?;
                Ok(Self(s.to_string()))
            }
        }

        impl TryFrom<String> for $name {
            type Error = CoreError;
            fn try_from(s: String) -> Result<Self, Self::Error> {
                check_token(&s)?;
                Ok(Self(s))
            }
        }

        impl From<$name> for String {
            fn from(t: $name) -> String { t.0 }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str { &self.0 }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str { &self.0 }
        }
    };
}

def_token!(
    /// Subject name as it appears in the score table (`Korean`, `Math(Calculus)`, `화학 Ⅱ`).
    SubjectName
);

def_token!(
    /// Unique identifier of a university + admission-track formula variant.
    ProgramKey
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn accepts_korean_names_with_spaces() {
        let s: SubjectName = "물리학 Ⅰ".parse().unwrap();
        assert_eq!(s.as_str(), "물리학 Ⅰ");
    }

    #[test]
    fn rejects_empty_padded_and_control() {
        assert_eq!("".parse::<ProgramKey>(), Err(CoreError::EmptyToken));
        assert!(" KEY".parse::<ProgramKey>().is_err());
        assert!("A\nB".parse::<ProgramKey>().is_err());
    }

    #[test]
    fn map_lookup_by_str() {
        let mut m = BTreeMap::new();
        m.insert("Korean".parse::<SubjectName>().unwrap(), 1);
        assert_eq!(m.get("Korean"), Some(&1));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_goes_through_validation() {
        let ok: ProgramKey = serde_json::from_str("\"SNU-NAT\"").unwrap();
        assert_eq!(ok.as_str(), "SNU-NAT");
        assert!(serde_json::from_str::<ProgramKey>("\"\"").is_err());
    }
}
