use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);
    };
}

id_newtype!(QuestionId);

/// One of the four answer slots every question carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionLabel {
    #[serde(alias = "a")]
    A,
    #[serde(alias = "b")]
    B,
    #[serde(alias = "c")]
    C,
    #[serde(alias = "d")]
    D,
}

impl OptionLabel {
    pub const ALL: [OptionLabel; 4] = [Self::A, Self::B, Self::C, Self::D];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }
}

impl fmt::Display for OptionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown option label '{0}', expected one of A, B, C, D")]
pub struct UnknownOptionLabel(pub String);

impl std::str::FromStr for OptionLabel {
    type Err = UnknownOptionLabel;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            "C" => Ok(Self::C),
            "D" => Ok(Self::D),
            _ => Err(UnknownOptionLabel(raw.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_labels_case_insensitively() {
        assert_eq!("b".parse::<OptionLabel>(), Ok(OptionLabel::B));
        assert_eq!(" D ".parse::<OptionLabel>(), Ok(OptionLabel::D));
        assert!("e".parse::<OptionLabel>().is_err());
    }

    #[test]
    fn deserializes_lowercase_label_from_server() {
        let label: OptionLabel = serde_json::from_str("\"c\"").expect("label");
        assert_eq!(label, OptionLabel::C);
        assert_eq!(
            serde_json::to_string(&OptionLabel::C).expect("serialize"),
            "\"C\""
        );
    }
}
