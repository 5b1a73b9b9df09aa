//! Caller-facing cutting plan built from the winning solution.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::allocator::{Solution, percent};
use crate::normalize::fits_stock;
use crate::optimizer::Outcome;
use crate::types::{PieceRequest, StockSheet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedPiece {
    pub label: String,
    pub x: u32,
    pub y: u32,
    /// Size as cut, after rotation.
    pub width: u32,
    pub height: u32,
    pub rotated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetPlan {
    pub stock_index: usize,
    pub width: u32,
    pub height: u32,
    pub placements: Vec<PlacedPiece>,
    pub used_area: u64,
    pub waste_area: u64,
    pub waste_percent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UnplacedReason {
    /// Fits an offered stock type, but no sheet of it was left.
    StockExhausted,
    NoFittingStock,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnplacedGroup {
    pub label: String,
    pub count: u32,
    pub reason: UnplacedReason,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CuttingPlan {
    pub sheets: Vec<SheetPlan>,
    pub unplaced: Vec<UnplacedGroup>,
    pub total_waste_percent: f64,
    pub sheet_count: usize,
    /// Ordering that produced this plan, e.g. `by-area`.
    pub strategy: String,
    pub iterations: usize,
    /// Seed of the randomized orderings; replaying it reproduces the plan.
    pub seed: u64,
}

impl CuttingPlan {
    /// A successful plan that could not place every piece.
    pub fn is_partial(&self) -> bool {
        !self.unplaced.is_empty()
    }

    pub fn placed_count(&self) -> usize {
        self.sheets.iter().map(|s| s.placements.len()).sum()
    }
}

pub fn assemble(outcome: &Outcome, pieces: &[PieceRequest], stock: &[StockSheet]) -> CuttingPlan {
    let solution = &outcome.solution;
    let sheets = solution
        .sheets
        .iter()
        .map(|sheet| SheetPlan {
            stock_index: sheet.stock_index,
            width: sheet.size.w,
            height: sheet.size.h,
            placements: sheet
                .placements
                .iter()
                .map(|p| PlacedPiece {
                    label: pieces[p.demand].label.clone(),
                    x: p.x,
                    y: p.y,
                    width: p.rect.w,
                    height: p.rect.h,
                    rotated: p.rotated,
                })
                .collect(),
            used_area: sheet.used_area(),
            waste_area: sheet.waste_area(),
            waste_percent: sheet.waste_percent(),
        })
        .collect();

    let total_area: u64 = solution.sheets.iter().map(|s| s.area()).sum();
    CuttingPlan {
        sheets,
        unplaced: group_unplaced(solution, pieces, stock),
        total_waste_percent: percent(solution.waste_area(), total_area),
        sheet_count: solution.sheet_count(),
        strategy: outcome.attempt.strategy.to_string(),
        iterations: outcome.iterations,
        seed: outcome.seed,
    }
}

/// Groups unplaced units by label and reason, in order of first appearance
/// in the cut list.
fn group_unplaced(
    solution: &Solution,
    pieces: &[PieceRequest],
    stock: &[StockSheet],
) -> Vec<UnplacedGroup> {
    let mut demands: Vec<usize> = solution.unplaced.iter().map(|u| u.demand).collect();
    demands.sort_unstable();

    let mut groups: Vec<UnplacedGroup> = Vec::new();
    let mut by_key: HashMap<(&str, UnplacedReason), usize> = HashMap::new();
    for demand in demands {
        let piece = &pieces[demand];
        let fits = stock.iter().any(|s| s.is_available() && fits_stock(piece, s));
        let reason = if fits {
            UnplacedReason::StockExhausted
        } else {
            UnplacedReason::NoFittingStock
        };
        let key = (piece.label.as_str(), reason);
        match by_key.get(&key) {
            Some(&i) => groups[i].count += 1,
            None => {
                by_key.insert(key, groups.len());
                groups.push(UnplacedGroup {
                    label: piece.label.clone(),
                    count: 1,
                    reason,
                });
            }
        }
    }
    groups
}
