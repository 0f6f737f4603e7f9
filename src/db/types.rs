use serde::{Deserialize, Serialize};
use sqlx::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "userrole", rename_all = "lowercase")]
pub(crate) enum UserRole {
    Admin,
    User,
}

/// Stable identifier of one answerable exam section. Answer maps are keyed
/// by these; the set is fixed by the shape of the content tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum SectionId {
    ReadingOne,
    ReadingTwo,
    ReadingThree,
    ReadingFour,
    Listening,
    WritingOne,
    WritingTwo,
}

impl SectionId {
    pub(crate) const ALL: [SectionId; 7] = [
        SectionId::ReadingOne,
        SectionId::ReadingTwo,
        SectionId::ReadingThree,
        SectionId::ReadingFour,
        SectionId::Listening,
        SectionId::WritingOne,
        SectionId::WritingTwo,
    ];

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::ReadingOne => "reading_one",
            Self::ReadingTwo => "reading_two",
            Self::ReadingThree => "reading_three",
            Self::ReadingFour => "reading_four",
            Self::Listening => "listening",
            Self::WritingOne => "writing_one",
            Self::WritingTwo => "writing_two",
        }
    }

    pub(crate) fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|section| section.as_str() == value)
    }
}

#[cfg(test)]
mod tests {
    use super::SectionId;

    #[test]
    fn section_id_parse_roundtrip() {
        for section in SectionId::ALL {
            assert_eq!(SectionId::parse(section.as_str()), Some(section));
        }
        assert_eq!(SectionId::parse("reading_five"), None);
        assert_eq!(SectionId::parse(""), None);
    }
}
