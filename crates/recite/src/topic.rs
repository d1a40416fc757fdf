//! Practice topics and their reading material.

use crate::RecordingHistoryEntry;

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

const GREAT_WALL_PASSAGE: &str = "The Great Wall of China, a marvel of engineering stretching over 13,000 miles, is a series of fortifications made of stone, brick, tamped earth, wood, and other materials. It was constructed over several centuries, beginning as early as the 7th century BC, with the most renowned portions built during the Ming Dynasty (1368–1644 AD). Initially erected by various states to protect against northern invasions, the Wall was later unified and expanded to defend the Chinese Empire against nomadic tribes. Its winding path over rugged country and steep mountains showcases the ancient world's immense determination and resourcefulness. Today, the Great Wall stands as a UNESCO World Heritage site and a symbol of China’s historical resilience, although it faces challenges such as erosion and damage from tourism and development.";

const CANADA_GOOSE_PASSAGE: &str = "The Canada goose is a large wild goose with a black head and neck, white cheeks, and a brown body, native to the arctic and temperate regions of North America. Famous for its V-shaped flight formations, the species migrates thousands of miles each year between its northern breeding grounds and southern wintering sites. Canada geese mate for life and return to the same nesting areas season after season, with both parents guarding the goslings until they can fly. Remarkably adaptable, the birds have settled into city parks, golf courses, and farmland, where reliable food and open water let many flocks remain year round. Their loud honking, heard overhead each spring and autumn, has long been a signal of the changing seasons.";

/// Accent colors a topic can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Pink.
    Bubblegum,
    /// Warm yellow.
    Buttercup,
    /// Deep blue.
    Indigo,
    /// Soft violet.
    Lavender,
    /// Vivid pink.
    Magenta,
    /// Dark blue.
    Navy,
    /// Orange.
    Orange,
    /// Dark red.
    Oxblood,
    /// Pale blue.
    Periwinkle,
    /// Red.
    Poppy,
    /// Purple.
    Purple,
    /// Pale green.
    Seafoam,
    /// Light blue.
    Sky,
    /// Light brown.
    Tan,
    /// Blue green.
    Teal,
    /// Yellow.
    Yellow,
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Theme::Bubblegum => "bubblegum",
            Theme::Buttercup => "buttercup",
            Theme::Indigo => "indigo",
            Theme::Lavender => "lavender",
            Theme::Magenta => "magenta",
            Theme::Navy => "navy",
            Theme::Orange => "orange",
            Theme::Oxblood => "oxblood",
            Theme::Periwinkle => "periwinkle",
            Theme::Poppy => "poppy",
            Theme::Purple => "purple",
            Theme::Seafoam => "seafoam",
            Theme::Sky => "sky",
            Theme::Tan => "tan",
            Theme::Teal => "teal",
            Theme::Yellow => "yellow",
        };
        write!(f, "{}", name)
    }
}

/// One speaking practice topic: a passage to read aloud, how long the
/// user gets, and the takes recorded against it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PracticeTopic {
    /// Stable identity across saves.
    pub id: Uuid,
    /// Title shown in the topic list.
    pub title: String,
    /// The passage the user reads aloud.
    pub passage: String,
    /// Practice length in minutes.
    pub length_minutes: u8,
    /// Accent color for the topic.
    pub theme: Theme,
    /// Native-speaker reading of the passage, when one ships.
    #[serde(default)]
    pub model_audio: Option<PathBuf>,
    /// Completed takes, newest first.
    #[serde(default)]
    pub history: Vec<RecordingHistoryEntry>,
}

impl PracticeTopic {
    /// Record a completed take at the front of the history.
    pub fn record_take(&mut self, entry: RecordingHistoryEntry) {
        self.history.insert(0, entry);
    }

    /// Built-in topics for a first run.
    pub fn sample_topics() -> Vec<PracticeTopic> {
        vec![
            PracticeTopic {
                id: Uuid::new_v4(),
                title: "The Great Wall".to_string(),
                passage: GREAT_WALL_PASSAGE.to_string(),
                length_minutes: 3,
                theme: Theme::Orange,
                model_audio: None,
                history: Vec::new(),
            },
            PracticeTopic {
                id: Uuid::new_v4(),
                title: "Canada Goose".to_string(),
                passage: CANADA_GOOSE_PASSAGE.to_string(),
                length_minutes: 3,
                theme: Theme::Poppy,
                model_audio: None,
                history: Vec::new(),
            },
        ]
    }
}
