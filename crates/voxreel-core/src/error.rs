//! Voxreel Error Definitions
//!
//! Defines error types used throughout the planning engine.

use thiserror::Error;

use crate::captions::ParseError;
use crate::media::ProbeError;
use crate::types::MarkerName;

/// Planning engine error types
#[derive(Error, Debug)]
pub enum PlanError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    #[error("Timeline has no segments")]
    EmptyTimeline,

    #[error("Segment {index}: {reason}")]
    InvalidSegment { index: usize, reason: String },

    #[error("Segment {index}: {kind} segment has no source path")]
    MissingSource { index: usize, kind: String },

    #[error("Marker '{0}' is ambiguous: multiple segments carry this name")]
    AmbiguousMarker(MarkerName),

    #[error("Marker '{0}' is referenced by an audio directive but names no segment")]
    UnknownMarker(MarkerName),

    #[error("Segment {index}: second Main segment without an explicit duration (only one may derive)")]
    SecondDerivedMain { index: usize },

    // =========================================================================
    // Derivation Errors
    // =========================================================================
    #[error("Segment {index}: Main duration cannot be derived without an audio track")]
    NoAudioForDerivedMain { index: usize },

    // =========================================================================
    // Collaborator Errors
    // =========================================================================
    #[error("Probe error: {0}")]
    Probe(#[from] ProbeError),

    #[error("Caption parse error: {0}")]
    Caption(#[from] ParseError),

    #[error("Main content generation failed: {0}")]
    ContentGenerationFailed(String),

    // =========================================================================
    // Pool Errors
    // =========================================================================
    #[error("Media pool '{0}' has no candidates")]
    EmptyPool(String),

    // =========================================================================
    // General Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Planning engine result type
pub type PlanResult<T> = Result<T, PlanError>;
