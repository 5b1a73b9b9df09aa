use std::fmt;

use thiserror::Error;

/// Why a single requested piece was rejected before packing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PieceIssueKind {
    ZeroDimension,
    ZeroQuantity,
    DoesNotFit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PieceIssue {
    /// Index into the submitted piece list.
    pub index: usize,
    pub label: String,
    pub kind: PieceIssueKind,
}

impl fmt::Display for PieceIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self.kind {
            PieceIssueKind::ZeroDimension => "dimensions must be non-zero",
            PieceIssueKind::ZeroQuantity => "quantity must be non-zero",
            PieceIssueKind::DoesNotFit => "does not fit any available stock",
        };
        if self.label.is_empty() {
            write!(f, "piece #{}: {what}", self.index)
        } else {
            write!(f, "piece #{} ({}): {what}", self.index, self.label)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptimizeError {
    #[error("invalid pieces: {}", join_issues(.0))]
    InvalidPiece(Vec<PieceIssue>),

    #[error("no stock available")]
    EmptyStock,

    #[error("invalid stock #{index}: {reason}")]
    InvalidStock { index: usize, reason: String },
}

impl OptimizeError {
    /// Stable identifier for API consumers.
    pub fn kind(&self) -> &'static str {
        match self {
            OptimizeError::InvalidPiece(_) => "invalid_piece",
            OptimizeError::EmptyStock => "empty_stock",
            OptimizeError::InvalidStock { .. } => "invalid_stock",
        }
    }
}

fn join_issues(issues: &[PieceIssue]) -> String {
    issues
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, OptimizeError>;
