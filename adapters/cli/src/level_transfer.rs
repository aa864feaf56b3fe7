use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use glam::Vec3;
use gridlock_core::{CellCoord, GridSpec, GridSpecError};
use gridlock_world::{BlockDefinition, GateDefinition, LevelDefinition};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier prefix emitted before the encoded level payload.
pub(crate) const TRANSFER_HEADER: &str = "gridlock:v1";
/// Delimiter used to separate the prefix, grid dimensions and payload.
const FIELD_DELIMITER: char = ':';

/// Encodes a level into a single-line string suitable for clipboard transfer.
pub(crate) fn encode(level: &LevelDefinition) -> Result<String, LevelTransferError> {
    let json = serde_json::to_vec(&TransferPayload::from_level(level))
        .map_err(LevelTransferError::InvalidPayload)?;
    Ok(format!(
        "{TRANSFER_HEADER}{FIELD_DELIMITER}{}x{}{FIELD_DELIMITER}{}",
        level.grid.width,
        level.grid.length,
        STANDARD_NO_PAD.encode(json)
    ))
}

/// Decodes a level from the provided string representation.
///
/// The decoded grid must describe a usable grid.
pub(crate) fn decode(value: &str) -> Result<LevelDefinition, LevelTransferError> {
    let trimmed = value.trim();
    let body = trimmed
        .strip_prefix(TRANSFER_HEADER)
        .and_then(|rest| rest.strip_prefix(FIELD_DELIMITER))
        .ok_or_else(|| LevelTransferError::UnknownHeader(header_of(trimmed)))?;
    let (dimensions, encoded) = body
        .split_once(FIELD_DELIMITER)
        .ok_or(LevelTransferError::MissingPayload)?;

    let (width, length) = parse_dimensions(dimensions)
        .ok_or_else(|| LevelTransferError::InvalidDimensions(dimensions.to_owned()))?;
    let bytes = STANDARD_NO_PAD
        .decode(encoded)
        .map_err(LevelTransferError::InvalidEncoding)?;
    let payload: TransferPayload =
        serde_json::from_slice(&bytes).map_err(LevelTransferError::InvalidPayload)?;

    let level = payload.into_level(width, length);
    level.grid.validate()?;
    Ok(level)
}

/// Everything but the grid dimensions, which travel in the readable header.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct TransferPayload {
    cell_size: f32,
    origin: Vec3,
    walls: Vec<CellCoord>,
    mask_exterior: bool,
    gates: Vec<GateDefinition>,
    blocks: Vec<BlockDefinition>,
}

impl TransferPayload {
    fn from_level(level: &LevelDefinition) -> Self {
        Self {
            cell_size: level.grid.cell_size,
            origin: level.grid.origin,
            walls: level.walls.clone(),
            mask_exterior: level.mask_exterior,
            gates: level.gates.clone(),
            blocks: level.blocks.clone(),
        }
    }

    fn into_level(self, width: u32, length: u32) -> LevelDefinition {
        LevelDefinition {
            grid: GridSpec::new(width, length, self.cell_size).with_origin(self.origin),
            walls: self.walls,
            mask_exterior: self.mask_exterior,
            gates: self.gates,
            blocks: self.blocks,
        }
    }
}

/// Errors that can occur while encoding or decoding level transfer strings.
#[derive(Debug, Error)]
pub(crate) enum LevelTransferError {
    /// The string does not start with a supported header.
    #[error("unrecognised transfer header '{0}'")]
    UnknownHeader(String),
    /// Nothing follows the grid dimensions.
    #[error("transfer string is missing the payload")]
    MissingPayload,
    /// The dimensions segment is not `<width>x<length>`.
    #[error("could not parse grid dimensions '{0}'")]
    InvalidDimensions(String),
    /// The base64 payload could not be decoded.
    #[error("could not decode level payload")]
    InvalidEncoding(#[source] base64::DecodeError),
    /// The payload could not be serialised or deserialised.
    #[error("could not parse level payload")]
    InvalidPayload(#[source] serde_json::Error),
    /// The decoded grid is unusable.
    #[error("transfer string describes an invalid grid")]
    InvalidGrid(#[from] GridSpecError),
}

fn header_of(value: &str) -> String {
    value
        .splitn(3, FIELD_DELIMITER)
        .take(2)
        .collect::<Vec<_>>()
        .join(":")
}

fn parse_dimensions(dimensions: &str) -> Option<(u32, u32)> {
    let (width, length) = dimensions.split_once(['x', 'X'])?;
    Some((width.trim().parse().ok()?, length.trim().parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridlock_core::{BlockColor, CellCoord, Rotation};

    fn sample_level() -> LevelDefinition {
        LevelDefinition {
            grid: GridSpec::new(7, 5, 1.5).with_origin(Vec3::new(-2.0, 0.0, 1.0)),
            walls: vec![CellCoord::new(3, 3)],
            mask_exterior: true,
            gates: vec![GateDefinition {
                color: BlockColor::Pink,
                cells: vec![CellCoord::new(0, 1), CellCoord::new(0, 2)],
            }],
            blocks: vec![BlockDefinition {
                shape: vec!["..#".to_owned(), "..#".to_owned()],
                pivot: None,
                color: BlockColor::Pink,
                anchor: CellCoord::new(2, 2),
                rotation: Rotation::Deg90,
            }],
        }
    }

    #[test]
    fn encoded_level_carries_header_and_dimensions() {
        let encoded = encode(&sample_level()).expect("level encodes");
        assert!(encoded.starts_with(&format!("{TRANSFER_HEADER}:7x5:")));

        let decoded = decode(&encoded).expect("level decodes");
        assert_eq!(decoded, sample_level());
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let encoded = encode(&sample_level()).expect("level encodes");
        assert!(decode(&format!("  {encoded}\n")).is_ok());
    }

    #[test]
    fn empty_string_is_rejected() {
        assert!(matches!(
            decode("   "),
            Err(LevelTransferError::UnknownHeader(header)) if header.is_empty()
        ));
    }

    #[test]
    fn foreign_prefix_is_rejected() {
        assert!(matches!(
            decode("maze:v1:4x4:e30"),
            Err(LevelTransferError::UnknownHeader(header)) if header == "maze:v1"
        ));
    }

    #[test]
    fn unknown_version_is_rejected() {
        assert!(matches!(
            decode("gridlock:v9:4x4:e30"),
            Err(LevelTransferError::UnknownHeader(header)) if header == "gridlock:v9"
        ));
    }

    #[test]
    fn malformed_dimensions_are_rejected() {
        assert!(matches!(
            decode("gridlock:v1:4by4:e30"),
            Err(LevelTransferError::InvalidDimensions(dimensions)) if dimensions == "4by4"
        ));
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        let mut level = sample_level();
        level.grid.width = 0;
        let encoded = encode(&level).expect("level encodes");

        assert!(matches!(
            decode(&encoded),
            Err(LevelTransferError::InvalidGrid(GridSpecError::Empty))
        ));
    }

    #[test]
    fn zero_cell_size_is_rejected() {
        let mut level = sample_level();
        level.grid.cell_size = 0.0;
        let encoded = encode(&level).expect("level encodes");

        assert!(matches!(
            decode(&encoded),
            Err(LevelTransferError::InvalidGrid(GridSpecError::CellSize))
        ));
    }

    #[test]
    fn missing_payload_is_reported() {
        assert!(matches!(
            decode("gridlock:v1:4x4"),
            Err(LevelTransferError::MissingPayload)
        ));
    }

    #[test]
    fn corrupt_payload_is_reported() {
        assert!(matches!(
            decode("gridlock:v1:4x4:!!!"),
            Err(LevelTransferError::InvalidEncoding(_))
        ));
    }
}
