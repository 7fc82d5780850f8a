#![deny(unsafe_code)]

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::Digest;

use crate::ModelError;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Result<Self, ModelError> {
                let value = value.into();
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Err(ModelError::InvalidId { kind: $kind, value });
                }
                Ok(Self(trimmed.to_string()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Identifier of a student in the external student registry.
    StudentId,
    "student"
);
string_id!(
    /// Identifier of a school or assessment centre.
    SchoolId,
    "school"
);
string_id!(
    /// Identifier of an assessment offered within a session.
    AssessmentId,
    "assessment"
);
string_id!(
    /// Identifier of an assessment session.
    SessionId,
    "session"
);
string_id!(
    /// Identifier of a student registration.
    RegistrationId,
    "registration"
);

impl RegistrationId {
    /// The id of `student`'s registration for `assessment` in `session`.
    ///
    /// A student holds at most one registration per assessment and session,
    /// so the id is stable across files and re-uploads.
    pub fn derive(session: &SessionId, assessment: &AssessmentId, student: &StudentId) -> Self {
        Self(RowId::derive(&[session.as_str(), assessment.as_str(), student.as_str()]).to_hex())
    }
}

/// Personal Education Number: nine ASCII digits.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pen(String);

impl Pen {
    pub const LENGTH: usize = 9;

    pub fn parse(value: &str) -> Result<Self, ModelError> {
        let trimmed = value.trim();
        if trimmed.len() != Self::LENGTH || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ModelError::InvalidPen(value.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Pen {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Pen> for String {
    fn from(pen: Pen) -> Self {
        pen.0
    }
}

impl fmt::Display for Pen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A deterministic row identifier.
///
/// Derived from the first 16 bytes of a SHA-256 over the identifying parts
/// and rendered as lowercase hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowId([u8; 16]);

impl RowId {
    /// Hash `parts`, each followed by a NUL separator.
    pub fn derive(parts: &[&str]) -> Self {
        let mut hasher = sha2::Sha256::new();
        for part in parts {
            hasher.update(part.as_bytes());
            hasher.update([0u8]);
        }
        let digest: [u8; 32] = hasher.finalize().into();
        Self::from_first_16_bytes_of_sha256(digest)
    }

    pub fn from_first_16_bytes_of_sha256(digest: [u8; 32]) -> Self {
        let mut out = [0u8; 16];
        out.copy_from_slice(&digest[..16]);
        Self(out)
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl Serialize for RowId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for RowId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        if bytes.len() != 16 {
            return Err(serde::de::Error::custom("RowId must be 16 bytes"));
        }
        let mut out = [0u8; 16];
        out.copy_from_slice(&bytes);
        Ok(Self(out))
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_id_is_deterministic() {
        let a = RowId::derive(&["TRAX_202409_NME10.txt", "1"]);
        let b = RowId::derive(&["TRAX_202409_NME10.txt", "1"]);
        let c = RowId::derive(&["TRAX_202409_NME10.txt", "2"]);
        let d = RowId::derive(&["TRAX_202409_NMF10.txt", "1"]);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
        assert_eq!(a.to_hex().len(), 32);
    }

    #[test]
    fn row_id_separator_prevents_concatenation_collisions() {
        assert_ne!(RowId::derive(&["ab", "c"]), RowId::derive(&["a", "bc"]));
    }

    #[test]
    fn registration_id_depends_only_on_session_assessment_and_student() {
        let session = SessionId::new("S-2024-09").unwrap();
        let assessment = AssessmentId::new("A-LTE10").unwrap();
        let first = RegistrationId::derive(&session, &assessment, &StudentId::new("S1").unwrap());
        let again = RegistrationId::derive(&session, &assessment, &StudentId::new("S1").unwrap());
        let other = RegistrationId::derive(&session, &assessment, &StudentId::new("S2").unwrap());

        assert_eq!(first, again);
        assert_ne!(first, other);
        assert_eq!(first.as_str().len(), 32);
    }

    #[test]
    fn pen_requires_nine_digits() {
        assert!(Pen::parse("123456789").is_ok());
        assert_eq!(Pen::parse(" 123456789 ").unwrap().as_str(), "123456789");
        assert!(Pen::parse("12345678").is_err());
        assert!(Pen::parse("12345678X").is_err());
        assert!(Pen::parse("").is_err());
    }

    #[test]
    fn blank_ids_are_rejected() {
        assert!(StudentId::new("  ").is_err());
        assert_eq!(StudentId::new(" S-1 ").unwrap().as_str(), "S-1");
    }
}
