//! Client-side checks run on a dialogue buffer before it is sent to the service

use std::collections::HashSet;
use std::fmt;

use crate::script::{CharacterId, DialogueLine};

/// Fewest characters a script may cast
pub const MIN_CHARACTERS: usize = 2;

/// Most characters a script may cast
pub const MAX_CHARACTERS: usize = 5;

/// A single problem found in a dialogue buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineIssue {
    /// The buffer has no lines at all
    EmptyDialogue,
    /// The script casts too few or too many characters
    CharacterCount { count: usize },
    /// The same character is cast more than once
    DuplicateCharacter { character: CharacterId },
    /// A line is spoken by a character the script does not cast
    UnknownSpeaker { index: usize, speaker: CharacterId },
    /// A line has no text
    BlankText { index: usize },
}

impl fmt::Display for LineIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyDialogue => write!(f, "dialogue must contain at least one line"),
            Self::CharacterCount { count } => write!(
                f,
                "script must cast between {} and {} characters (has {})",
                MIN_CHARACTERS, MAX_CHARACTERS, count
            ),
            Self::DuplicateCharacter { character } => {
                write!(f, "character '{}' is cast more than once", character)
            }
            Self::UnknownSpeaker { index, speaker } => write!(
                f,
                "line {} is spoken by '{}', who is not in this script",
                index + 1,
                speaker
            ),
            Self::BlankText { index } => write!(f, "line {} has no text", index + 1),
        }
    }
}

/// Check a dialogue against the characters a script casts.
///
/// Returns every issue found, in line order; an empty vector means the
/// dialogue can be saved.
pub fn validate_dialogue(dialogue: &[DialogueLine], cast: &[CharacterId]) -> Vec<LineIssue> {
    let mut issues = Vec::new();

    let mut distinct = HashSet::new();
    let mut repeated = HashSet::new();
    for character in cast {
        if !distinct.insert(character) && repeated.insert(character) {
            issues.push(LineIssue::DuplicateCharacter {
                character: character.clone(),
            });
        }
    }

    if !(MIN_CHARACTERS..=MAX_CHARACTERS).contains(&distinct.len()) {
        issues.push(LineIssue::CharacterCount {
            count: distinct.len(),
        });
    }

    if dialogue.is_empty() {
        issues.push(LineIssue::EmptyDialogue);
    }

    for (index, line) in dialogue.iter().enumerate() {
        if !cast.contains(&line.speaker) {
            issues.push(LineIssue::UnknownSpeaker {
                index,
                speaker: line.speaker.clone(),
            });
        }
        if line.text.trim().is_empty() {
            issues.push(LineIssue::BlankText { index });
        }
    }

    issues
}

/// Join issues into one human-readable message.
pub fn describe(issues: &[LineIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
