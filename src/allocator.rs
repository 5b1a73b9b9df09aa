use tracing::{debug, warn};

use crate::geometry::Rect;
use crate::guillotine::{FitHeuristic, Placement, SheetBin};
use crate::types::{StockSheet, Unit};

/// One opened stock sheet and the pieces cut from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sheet {
    pub stock_index: usize,
    pub size: Rect,
    pub placements: Vec<Placement>,
}

impl Sheet {
    pub fn area(&self) -> u64 {
        self.size.area()
    }

    pub fn used_area(&self) -> u64 {
        self.placements.iter().map(|p| p.rect.area()).sum()
    }

    pub fn waste_area(&self) -> u64 {
        self.area() - self.used_area()
    }

    pub fn waste_percent(&self) -> f64 {
        percent(self.waste_area(), self.area())
    }
}

impl From<SheetBin> for Sheet {
    fn from(bin: SheetBin) -> Self {
        Self {
            stock_index: bin.stock_index,
            size: bin.size(),
            placements: bin.placements,
        }
    }
}

pub(crate) fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}

/// Ranking key of a solution, compared lexicographically: fewer unplaced
/// pieces first, then less waste, then fewer sheets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SolutionScore {
    pub unplaced: usize,
    pub waste_area: u64,
    pub sheet_count: usize,
}

/// Result of one full allocation pass. Every unit id appears exactly once,
/// either in a sheet's placements or in `unplaced`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Solution {
    pub sheets: Vec<Sheet>,
    pub unplaced: Vec<Unit>,
}

impl Solution {
    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    pub fn placed_count(&self) -> usize {
        self.sheets.iter().map(|s| s.placements.len()).sum()
    }

    pub fn waste_area(&self) -> u64 {
        self.sheets.iter().map(Sheet::waste_area).sum()
    }

    pub fn total_waste_percent(&self) -> f64 {
        let total: u64 = self.sheets.iter().map(Sheet::area).sum();
        percent(self.waste_area(), total)
    }

    pub fn score(&self) -> SolutionScore {
        SolutionScore {
            unplaced: self.unplaced.len(),
            waste_area: self.waste_area(),
            sheet_count: self.sheet_count(),
        }
    }
}

/// Packs `units`, in the given order, onto as many sheets as needed.
///
/// Sheets are opened one at a time from the first stock type that still has
/// quantity left. A stock type whose fresh sheet takes no piece at all is
/// retired for the rest of the run, so the loop always makes progress even
/// with unbounded stock.
pub fn allocate(units: &[Unit], stock: &[StockSheet], heuristic: FitHeuristic) -> Solution {
    let mut remaining: Vec<Unit> = units.to_vec();
    let mut available: Vec<Option<u32>> = stock.iter().map(|s| s.quantity).collect();
    let mut retired = vec![false; stock.len()];
    let mut sheets = Vec::new();

    while !remaining.is_empty() {
        let Some(idx) = (0..stock.len()).find(|&i| !retired[i] && available[i] != Some(0)) else {
            break;
        };

        let mut bin = SheetBin::new(idx, &stock[idx]);
        let deferred = bin.pack(&remaining, heuristic);
        if bin.placements.is_empty() {
            warn!(
                stock_index = idx,
                remaining = remaining.len(),
                "no remaining piece fits a fresh sheet, retiring stock type"
            );
            retired[idx] = true;
            continue;
        }

        if let Some(q) = available[idx].as_mut() {
            *q -= 1;
        }
        debug!(
            stock_index = idx,
            placed = bin.placements.len(),
            deferred = deferred.len(),
            "sheet packed"
        );
        sheets.push(Sheet::from(bin));
        remaining = deferred;
    }

    Solution {
        sheets,
        unplaced: remaining,
    }
}
