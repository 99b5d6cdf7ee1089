//! Filename templates with a frame counter marker.

use crate::pipeline::{PipelineError, PipelineResult};
use std::fmt;
use std::str::FromStr;

/// Placeholder replaced by the decimal frame index.
pub const FORMAT_MARKER: char = '#';

/// A template such as `frame_#.raw` split around its single marker.
///
/// Index `n` maps to `prefix + n + suffix`, with no zero padding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilenameFormat {
    prefix: String,
    suffix: String,
}

impl FilenameFormat {
    pub fn parse(template: &str) -> PipelineResult<Self> {
        let markers = template.matches(FORMAT_MARKER).count();
        if markers != 1 {
            return Err(PipelineError::InvalidSourceFormat {
                template: template.to_string(),
                reason: format!(
                    "expected exactly one '{}' marker, found {}",
                    FORMAT_MARKER, markers
                ),
            });
        }

        let (prefix, rest) = template
            .split_once(FORMAT_MARKER)
            .ok_or_else(|| PipelineError::InvalidSourceFormat {
                template: template.to_string(),
                reason: "missing marker".to_string(),
            })?;

        Ok(Self {
            prefix: prefix.to_string(),
            suffix: rest.to_string(),
        })
    }

    /// Identifier of the item at `index`.
    pub fn identifier(&self, index: u64) -> String {
        format!("{}{}{}", self.prefix, index, self.suffix)
    }

    /// The template this format was parsed from.
    pub fn template(&self) -> String {
        format!("{}{}{}", self.prefix, FORMAT_MARKER, self.suffix)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }
}

impl FromStr for FilenameFormat {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for FilenameFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.prefix, FORMAT_MARKER, self.suffix)
    }
}
