//! Typed answers collected during the interview.
//!
//! Every answer-key is an explicit optional field, so "never asked" (`None`)
//! and "answered with an empty value" (`Some("")`, `Some(vec![])`) stay
//! distinguishable on disk and in memory.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::questions::ChoiceOption;

/// Named slot in the accumulated project-definition data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnswerKey {
    /// Stored in `WorkflowState::project_name`, not in [`Answers`]
    ProjectName,
    BigPicture,
    Audience,
    Features,
    Constraints,
    TechStack,
    QualityLevel,
}

impl AnswerKey {
    pub const ALL: [AnswerKey; 7] = [
        AnswerKey::ProjectName,
        AnswerKey::BigPicture,
        AnswerKey::Audience,
        AnswerKey::Features,
        AnswerKey::Constraints,
        AnswerKey::TechStack,
        AnswerKey::QualityLevel,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AnswerKey::ProjectName => "project_name",
            AnswerKey::BigPicture => "big_picture",
            AnswerKey::Audience => "audience",
            AnswerKey::Features => "features",
            AnswerKey::Constraints => "constraints",
            AnswerKey::TechStack => "tech_stack",
            AnswerKey::QualityLevel => "quality_level",
        }
    }
}

impl fmt::Display for AnswerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who the project is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Audience {
    Personal,
    Team,
    Public,
}

impl Audience {
    pub const OPTIONS: &'static [ChoiceOption] = &[
        ChoiceOption {
            id: "personal",
            label: "Just me",
        },
        ChoiceOption {
            id: "team",
            label: "My team",
        },
        ChoiceOption {
            id: "public",
            label: "Public/Customers",
        },
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Audience::Personal => "personal",
            Audience::Team => "team",
            Audience::Public => "public",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "personal" => Some(Audience::Personal),
            "team" => Some(Audience::Team),
            "public" => Some(Audience::Public),
            _ => None,
        }
    }
}

/// Quality approach for the implementation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityLevel {
    Prototype,
    #[default]
    Production,
}

impl QualityLevel {
    pub const OPTIONS: &'static [ChoiceOption] = &[
        ChoiceOption {
            id: "prototype",
            label: "Quick prototype - get it working fast",
        },
        ChoiceOption {
            id: "production",
            label: "Production-quality - do it right",
        },
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            QualityLevel::Prototype => "prototype",
            QualityLevel::Production => "production",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "prototype" => Some(QualityLevel::Prototype),
            "production" => Some(QualityLevel::Production),
            _ => None,
        }
    }
}

/// Special requirement flagged during the spec checkpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Constraint {
    Offline,
    Mobile,
    Security,
    Performance,
}

impl Constraint {
    /// Asked in this order
    pub const ALL: [Constraint; 4] = [
        Constraint::Offline,
        Constraint::Mobile,
        Constraint::Security,
        Constraint::Performance,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Constraint::Offline => "offline",
            Constraint::Mobile => "mobile",
            Constraint::Security => "security",
            Constraint::Performance => "performance",
        }
    }
}

/// Accumulated answers, one optional field per answer-key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answers {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub big_picture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience: Option<Audience>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Vec<Constraint>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tech_stack: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_level: Option<QualityLevel>,
}

impl Answers {
    /// Whether `key` holds a value. `ProjectName` lives outside this record
    /// and always reports `false` here.
    pub fn contains(&self, key: AnswerKey) -> bool {
        match key {
            AnswerKey::ProjectName => false,
            AnswerKey::BigPicture => self.big_picture.is_some(),
            AnswerKey::Audience => self.audience.is_some(),
            AnswerKey::Features => self.features.is_some(),
            AnswerKey::Constraints => self.constraints.is_some(),
            AnswerKey::TechStack => self.tech_stack.is_some(),
            AnswerKey::QualityLevel => self.quality_level.is_some(),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Answers::default()
    }

    /// Constraints joined for display, "None" when there are none
    pub fn constraints_display(&self) -> String {
        match self.constraints.as_deref() {
            Some(list) if !list.is_empty() => list
                .iter()
                .map(|c| c.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            _ => "None".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_and_empty_are_distinct() {
        let mut answers = Answers::default();
        assert!(!answers.contains(AnswerKey::Constraints));

        answers.constraints = Some(Vec::new());
        assert!(answers.contains(AnswerKey::Constraints));
        assert_eq!(answers.constraints_display(), "None");
    }

    #[test]
    fn test_serialization_skips_unanswered_keys() {
        let answers = Answers {
            big_picture: Some("A photo app".to_string()),
            constraints: Some(vec![]),
            ..Default::default()
        };
        let json = serde_json::to_value(&answers).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert_eq!(obj["big_picture"], "A photo app");
        assert_eq!(obj["constraints"], serde_json::json!([]));
    }

    #[test]
    fn test_deserialize_rejects_unknown_enum_values() {
        let result: Result<Answers, _> = serde_json::from_str(r#"{"audience": "aliens"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_choice_ids_round_trip_through_options() {
        for option in Audience::OPTIONS {
            assert_eq!(Audience::from_id(option.id).unwrap().as_str(), option.id);
        }
        for option in QualityLevel::OPTIONS {
            assert_eq!(QualityLevel::from_id(option.id).unwrap().as_str(), option.id);
        }
    }
}
