//! Single-line text encoding of a [`RunState`] for persistence between requests.

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use star_pilot_world::{query, InvalidLevelData, RunState};
use thiserror::Error;

const SNAPSHOT_DOMAIN: &str = "pilot";
const SNAPSHOT_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded snapshot payload.
pub const SNAPSHOT_HEADER: &str = "pilot:v1";
/// Delimiter used to separate the prefix, grid dimensions and payload.
const FIELD_DELIMITER: char = ':';

/// Errors that can occur while encoding or decoding run snapshots.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The provided string was empty or contained only whitespace.
    #[error("snapshot was empty")]
    EmptyPayload,
    /// The prefix segment was missing from the encoded snapshot.
    #[error("snapshot is missing the prefix")]
    MissingPrefix,
    /// The encoded snapshot did not contain a version segment.
    #[error("snapshot is missing the version")]
    MissingVersion,
    /// The encoded snapshot did not include grid dimensions.
    #[error("snapshot is missing the grid dimensions")]
    MissingDimensions,
    /// The encoded snapshot did not include the payload segment.
    #[error("snapshot is missing the payload")]
    MissingPayload,
    /// The encoded snapshot used an unexpected prefix segment.
    #[error("snapshot prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The encoded snapshot used an unsupported version identifier.
    #[error("snapshot version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The grid dimensions could not be parsed or disagree with the payload.
    #[error("snapshot grid dimensions '{0}' are invalid")]
    InvalidDimensions(String),
    /// The base64 payload could not be decoded.
    #[error("could not decode snapshot payload: {0}")]
    InvalidEncoding(#[source] base64::DecodeError),
    /// The payload could not be serialised or deserialised.
    #[error("could not process snapshot payload: {0}")]
    InvalidPayload(#[source] serde_json::Error),
    /// The decoded run violates a run-state invariant.
    #[error("snapshot holds an inconsistent run: {0}")]
    Inconsistent(#[source] InvalidLevelData),
}

/// Encodes the run into a single-line string.
pub fn encode(state: &RunState) -> Result<String, SnapshotError> {
    let json = serde_json::to_vec(state).map_err(SnapshotError::InvalidPayload)?;
    let encoded = STANDARD_NO_PAD.encode(json);
    let grid = query::grid(state);
    Ok(format!(
        "{SNAPSHOT_HEADER}:{}x{}:{encoded}",
        grid.columns(),
        grid.rows()
    ))
}

/// Decodes a run from its string representation and re-checks its invariants.
pub fn decode(value: &str) -> Result<RunState, SnapshotError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(SnapshotError::EmptyPayload);
    }

    let mut parts = trimmed.split(FIELD_DELIMITER);
    let domain = parts.next().ok_or(SnapshotError::MissingPrefix)?;
    let version = parts.next().ok_or(SnapshotError::MissingVersion)?;
    let dimensions = parts.next().ok_or(SnapshotError::MissingDimensions)?;
    let payload = parts.next().ok_or(SnapshotError::MissingPayload)?;

    if domain != SNAPSHOT_DOMAIN {
        return Err(SnapshotError::InvalidPrefix(domain.to_owned()));
    }
    if version != SNAPSHOT_VERSION {
        return Err(SnapshotError::UnsupportedVersion(version.to_owned()));
    }

    let (columns, rows) = parse_dimensions(dimensions)?;
    let bytes = STANDARD_NO_PAD
        .decode(payload.as_bytes())
        .map_err(SnapshotError::InvalidEncoding)?;
    let state: RunState = serde_json::from_slice(&bytes).map_err(SnapshotError::InvalidPayload)?;

    let grid = query::grid(&state);
    if grid.columns() != columns || grid.rows() != rows {
        return Err(SnapshotError::InvalidDimensions(dimensions.to_owned()));
    }
    state.verify().map_err(SnapshotError::Inconsistent)?;

    Ok(state)
}

fn parse_dimensions(dimensions: &str) -> Result<(u32, u32), SnapshotError> {
    let (columns, rows) = dimensions
        .split_once(['x', 'X'])
        .ok_or_else(|| SnapshotError::InvalidDimensions(dimensions.to_owned()))?;

    let columns = columns
        .trim()
        .parse::<u32>()
        .map_err(|_| SnapshotError::InvalidDimensions(dimensions.to_owned()))?;
    let rows = rows
        .trim()
        .parse::<u32>()
        .map_err(|_| SnapshotError::InvalidDimensions(dimensions.to_owned()))?;

    if columns == 0 || rows == 0 {
        return Err(SnapshotError::InvalidDimensions(dimensions.to_owned()));
    }

    Ok((columns, rows))
}
