//! Shared types used across all modules.
//!
//! This module defines the content map, generation purposes and
//! requests, comment batches, and the quality and publish result
//! models. Other modules import from here rather than reaching into
//! each other's internals.

pub mod publish;
pub mod quality;

use clap::ValueEnum;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub use publish::{PullRequestInfo, PullRequestOutcome};
pub use quality::{Issue, QualityReport, Severity};

/// Ordered mapping from relative file path (POSIX separators) to text content.
///
/// Iteration order is insertion order, which is the order files are
/// prompted, generated and written to a repository.
pub type ContentMap = IndexMap<String, String>;

/// What the model is asked to produce.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ValueEnum,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Purpose {
    /// A project-level README generated from all files at once.
    Readme,
    /// Inline comments added to each file independently.
    #[value(alias = "comments")]
    #[strum(to_string = "comment", serialize = "comments")]
    Comment,
}

/// The source text a generation request is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceInput {
    /// One piece of text, prompted verbatim.
    Single(String),
    /// Several files, each prompted under its own labelled section.
    Files(ContentMap),
}

/// One call's worth of work for the text-generation endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub input: SourceInput,
    pub purpose: Purpose,
    /// Project name for READMEs, file name for comments.
    pub name: String,
    /// Extra instructions appended to the prompt; empty means none.
    pub custom_instructions: String,
}

impl GenerationRequest {
    /// README request for a project.
    pub fn readme(
        input: SourceInput,
        project_name: impl Into<String>,
        custom_instructions: impl Into<String>,
    ) -> Self {
        Self {
            input,
            purpose: Purpose::Readme,
            name: project_name.into(),
            custom_instructions: custom_instructions.into(),
        }
    }

    /// Comment request for a single file.
    pub fn comment(
        file_name: impl Into<String>,
        code: impl Into<String>,
        custom_instructions: impl Into<String>,
    ) -> Self {
        Self {
            input: SourceInput::Single(code.into()),
            purpose: Purpose::Comment,
            name: file_name.into(),
            custom_instructions: custom_instructions.into(),
        }
    }

    /// Whether the request carries several labelled files.
    pub fn is_multiple(&self) -> bool {
        matches!(self.input, SourceInput::Files(_))
    }

    /// The code a comment request is about.
    ///
    /// Comment requests are always single-file: a map input resolves to
    /// the entry keyed by the request name, else its first entry.
    pub fn single_code(&self) -> &str {
        match &self.input {
            SourceInput::Single(code) => code,
            SourceInput::Files(files) => files
                .get(&self.name)
                .or_else(|| files.values().next())
                .map(String::as_str)
                .unwrap_or(""),
        }
    }
}

/// A file whose comment generation failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    pub path: String,
    pub error: String,
}

/// Per-file results of comment generation.
///
/// `commented` preserves input order for the files that succeeded;
/// every other input file appears in `failures`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommentBatch {
    pub commented: ContentMap,
    pub failures: Vec<FileFailure>,
}

impl CommentBatch {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// The outcome of one generation run, in the shape it is rendered and
/// published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GenerationResult {
    Readme {
        filename: String,
        content: String,
    },
    Comments {
        #[serde(rename = "all_files")]
        files: ContentMap,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        failures: Vec<FileFailure>,
    },
}

impl GenerationResult {
    pub fn readme(content: impl Into<String>) -> Self {
        GenerationResult::Readme {
            filename: crate::constants::README_FILENAME.to_string(),
            content: content.into(),
        }
    }

    /// The files this result would write, keyed by repository path.
    pub fn files(&self) -> ContentMap {
        match self {
            GenerationResult::Readme { filename, content } => {
                ContentMap::from([(filename.clone(), content.clone())])
            }
            GenerationResult::Comments { files, .. } => files.clone(),
        }
    }

    pub fn failures(&self) -> &[FileFailure] {
        match self {
            GenerationResult::Readme { .. } => &[],
            GenerationResult::Comments { failures, .. } => failures,
        }
    }
}

impl From<CommentBatch> for GenerationResult {
    fn from(batch: CommentBatch) -> Self {
        GenerationResult::Comments {
            files: batch.commented,
            failures: batch.failures,
        }
    }
}
