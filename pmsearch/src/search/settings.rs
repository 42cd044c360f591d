use std::path::Path;

use context_error::{BoxedError, Context, CreateError};
use pmcore::{PathwayError, format::ProteoformFormat, matching::MatchType};
use serde::{Deserialize, Serialize};

use crate::{helper_functions::open_file, input::InputType};

/// The settings for a single search, missing fields in a settings file take the default value.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(default)]
pub struct SearchSettings {
    /// The kind of identifiers in the input
    pub input_type: InputType,
    /// The policy to match input proteoforms to reference proteoforms
    pub matching: MatchType,
    /// The maximal distance between two matching coordinates
    pub margin: u64,
    /// The notation for proteoforms in the input and the search table
    pub proteoform_format: ProteoformFormat,
    /// Attach the top level pathways to every record
    pub top_level_pathways: bool,
}

impl SearchSettings {
    /// Settings for the given input type, all other settings are default
    pub fn new(input_type: InputType) -> Self {
        Self {
            input_type,
            ..Self::default()
        }
    }

    /// Read settings from a JSON file.
    /// # Errors
    /// If the file could not be opened or does not contain valid settings.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, BoxedError<'static, PathwayError>> {
        let path = path.as_ref();
        serde_json::from_reader(open_file(path, PathwayError::InvalidSettings)?).map_err(|e| {
            BoxedError::new(
                PathwayError::InvalidSettings,
                "Invalid settings",
                e.to_string(),
                Context::default().source(path.to_string_lossy()).to_owned(),
            )
        })
    }
}
