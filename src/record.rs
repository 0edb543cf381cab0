//! Record shapes and candidate dispatch.
//!
//! Records arrive from the host pipeline in one of four shapes and are
//! dispatched structurally: the serde representation is untagged, so a JSON
//! object is classified by which fields it carries.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::location::{Location, LocationSpec};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Record {
    /// Instruction-tuning triple.
    Pair {
        instruction: String,
        input: String,
        output: String,
    },
    /// Free-form pretraining text.
    Pretrain { content: String },
    /// Single labeled text, as used by classification datasets.
    Classification { text: String },
    /// Language code -> text, one entry per present language.
    Translation {
        translations: HashMap<String, String>,
    },
}

impl Record {
    pub fn kind(&self) -> &'static str {
        match self {
            Record::Pair { .. } => "pair",
            Record::Pretrain { .. } => "pretrain",
            Record::Classification { .. } => "classification",
            Record::Translation { .. } => "translation",
        }
    }

    /// Texts that should be counted for this record under the configured
    /// locations and (for translation records) language allow-list.
    ///
    /// Translation records bypass location matching entirely: the language
    /// filter substitutes for it. `languages` codes are expected lowercase;
    /// `None` means every present language is a candidate.
    pub fn candidates<'a>(
        &'a self,
        locations: &LocationSpec,
        languages: Option<&[String]>,
    ) -> Vec<&'a str> {
        match self {
            Record::Pair {
                instruction,
                input,
                output,
            } => [
                (Location::Instruction, instruction.as_str()),
                (Location::Input, input.as_str()),
                (Location::Output, output.as_str()),
            ]
            .into_iter()
            .filter(|(loc, _)| locations.matches(*loc))
            .map(|(_, text)| text)
            .collect(),
            Record::Pretrain { content } => {
                if locations.matches(Location::Content) {
                    vec![content.as_str()]
                } else {
                    Vec::new()
                }
            }
            Record::Classification { text } => {
                if locations.matches(Location::Text) {
                    vec![text.as_str()]
                } else {
                    Vec::new()
                }
            }
            Record::Translation { translations } => match languages {
                None => translations.values().map(String::as_str).collect(),
                Some(langs) => langs
                    .iter()
                    .filter_map(|lang| translations.get(lang).map(String::as_str))
                    .collect(),
            },
        }
    }
}
