use tracing::debug;

use crate::error::{OptimizeError, PieceIssue, PieceIssueKind, Result};
use crate::types::{PieceRequest, StockSheet, Unit};

/// Checks the stock catalogue: at least one entry, non-zero dimensions, a
/// kerf narrower than the sheet, and at least one type with quantity left.
pub fn validate_stock(stock: &[StockSheet]) -> Result<()> {
    if stock.is_empty() {
        return Err(OptimizeError::EmptyStock);
    }
    for (index, s) in stock.iter().enumerate() {
        if s.width == 0 || s.height == 0 {
            return Err(OptimizeError::InvalidStock {
                index,
                reason: format!("dimensions must be non-zero, got {}", s.rect()),
            });
        }
        if s.kerf >= s.width.min(s.height) {
            return Err(OptimizeError::InvalidStock {
                index,
                reason: format!("kerf {} must be narrower than the {} sheet", s.kerf, s.rect()),
            });
        }
    }
    if !stock.iter().any(StockSheet::is_available) {
        return Err(OptimizeError::EmptyStock);
    }
    Ok(())
}

/// Whether a single piece could be cut from an empty sheet of `stock`.
///
/// Trailing kerf is clipped at the sheet edge, so a piece exactly as large as
/// the sheet still fits.
pub fn fits_stock(piece: &PieceRequest, stock: &StockSheet) -> bool {
    let rect = piece.rect();
    let sheet = stock.rect();
    rect.fits_in(&sheet) || (stock.allows_rotation(piece.grain_locked) && rect.rotated().fits_in(&sheet))
}

/// Validates the cut list against the stock catalogue and expands every
/// request into `quantity` unit pieces. All offending pieces are reported
/// together.
pub fn normalize(pieces: &[PieceRequest], stock: &[StockSheet]) -> Result<Vec<Unit>> {
    validate_stock(stock)?;

    let mut issues = Vec::new();
    for (index, p) in pieces.iter().enumerate() {
        let kind = if p.width == 0 || p.height == 0 {
            Some(PieceIssueKind::ZeroDimension)
        } else if p.quantity == 0 {
            Some(PieceIssueKind::ZeroQuantity)
        } else if !stock.iter().filter(|s| s.is_available()).any(|s| fits_stock(p, s)) {
            Some(PieceIssueKind::DoesNotFit)
        } else {
            None
        };
        if let Some(kind) = kind {
            issues.push(PieceIssue {
                index,
                label: p.label.clone(),
                kind,
            });
        }
    }
    if !issues.is_empty() {
        return Err(OptimizeError::InvalidPiece(issues));
    }

    let mut units = Vec::new();
    for (demand, p) in pieces.iter().enumerate() {
        for _ in 0..p.quantity {
            units.push(Unit {
                id: units.len(),
                demand,
                rect: p.rect(),
                grain_locked: p.grain_locked,
            });
        }
    }
    debug!(requests = pieces.len(), units = units.len(), "normalized cut list");
    Ok(units)
}
