use crate::geometry::{Cut, Rect, Region, contains, guillotine_split};
use crate::types::{StockSheet, Unit};

/// One unit piece placed on a sheet. `rect` is the piece as cut, already
/// turned when `rotated` is set; kerf is not part of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub unit: usize,
    /// Index of the originating cut-list line.
    pub demand: usize,
    pub x: u32,
    pub y: u32,
    pub rect: Rect,
    pub rotated: bool,
}

impl Placement {
    pub fn region(&self) -> Region {
        Region::at(self.x, self.y, self.rect)
    }
}

/// Rule used to rank the free rectangles a piece fits into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(clippy::enum_variant_names)]
pub enum FitHeuristic {
    BestAreaFit,
    BestShortSideFit,
    BestLongSideFit,
}

impl FitHeuristic {
    pub const ALL: [FitHeuristic; 3] = [
        FitHeuristic::BestAreaFit,
        FitHeuristic::BestShortSideFit,
        FitHeuristic::BestLongSideFit,
    ];
}

/// Lower is better. The last two components are the free rectangle's
/// origin `(y, x)` so ties resolve deterministically.
pub type FitScore = (u64, u64, u32, u32);

#[derive(Debug, Clone, Copy)]
pub struct ScoredPlacement {
    pub free_idx: usize,
    pub rotated: bool,
    pub score: FitScore,
}

/// Free-rectangle state of one sheet being packed.
#[derive(Debug, Clone)]
pub struct SheetBin {
    pub stock_index: usize,
    bounds: Region,
    kerf: u32,
    grain_fixed: bool,
    pub free_rects: Vec<Region>,
    pub placements: Vec<Placement>,
}

impl SheetBin {
    pub fn new(stock_index: usize, stock: &StockSheet) -> Self {
        let bounds = Region::new(0, 0, stock.width, stock.height);
        Self {
            stock_index,
            bounds,
            kerf: stock.kerf,
            grain_fixed: stock.grain.is_fixed(),
            free_rects: vec![bounds],
            placements: Vec::new(),
        }
    }

    pub fn size(&self) -> Rect {
        self.bounds.size()
    }

    pub fn used_area(&self) -> u64 {
        self.placements.iter().map(|p| p.rect.area()).sum()
    }

    fn allows_rotation(&self, unit: &Unit) -> bool {
        !(unit.grain_locked && self.grain_fixed)
    }

    /// The space a piece of size `rect` at `(x, y)` takes out of the sheet,
    /// including the saw cut on its right and bottom edges.
    pub fn footprint(&self, x: u32, y: u32, rect: Rect) -> Region {
        Region::at(x, y, rect).inflate_clipped(self.kerf, &self.bounds)
    }

    pub fn find_best(&self, unit: &Unit, heuristic: FitHeuristic) -> Option<ScoredPlacement> {
        let mut best: Option<ScoredPlacement> = None;
        let orientations: &[bool] = if self.allows_rotation(unit) && unit.rect.w != unit.rect.h {
            &[false, true]
        } else {
            &[false]
        };

        for (idx, free) in self.free_rects.iter().enumerate() {
            for &rotated in orientations {
                let piece = if rotated { unit.rect.rotated() } else { unit.rect };
                if !piece.fits_in(&free.size())
                    || !contains(free, &self.footprint(free.x, free.y, piece))
                {
                    continue;
                }
                let score = Self::score(piece, free, heuristic);
                if best.is_none_or(|b| score < b.score) {
                    best = Some(ScoredPlacement {
                        free_idx: idx,
                        rotated,
                        score,
                    });
                }
            }
        }

        best
    }

    fn score(piece: Rect, free: &Region, heuristic: FitHeuristic) -> FitScore {
        let dw = (free.w - piece.w) as u64;
        let dh = (free.h - piece.h) as u64;
        let (short, long) = (dw.min(dh), dw.max(dh));
        let (primary, secondary) = match heuristic {
            FitHeuristic::BestAreaFit => (free.area() - piece.area(), long),
            FitHeuristic::BestShortSideFit => (short, long),
            FitHeuristic::BestLongSideFit => (long, short),
        };
        (primary, secondary, free.y, free.x)
    }

    pub fn place(&mut self, scored: ScoredPlacement, unit: &Unit) -> Placement {
        let free = self.free_rects[scored.free_idx];
        let placed = if scored.rotated {
            unit.rect.rotated()
        } else {
            unit.rect
        };

        let placement = Placement {
            unit: unit.id,
            demand: unit.demand,
            x: free.x,
            y: free.y,
            rect: placed,
            rotated: scored.rotated,
        };

        let footprint = self.footprint(free.x, free.y, placed);
        self.free_rects.swap_remove(scored.free_idx);
        self.free_rects
            .extend(guillotine_split(&free, &footprint, Self::first_cut(&free, &footprint)));
        self.placements.push(placement);

        placement
    }

    /// Cuts first across the axis with the shorter leftover, so the larger
    /// leftover stays in one piece.
    fn first_cut(free: &Region, footprint: &Region) -> Cut {
        if free.w - footprint.w < free.h - footprint.h {
            Cut::Horizontal
        } else {
            Cut::Vertical
        }
    }

    /// Places as many of `units` as fit, in order. Returns the ones that did
    /// not fit on this sheet.
    pub fn pack(&mut self, units: &[Unit], heuristic: FitHeuristic) -> Vec<Unit> {
        let mut deferred = Vec::new();
        for unit in units {
            match self.find_best(unit, heuristic) {
                Some(scored) => {
                    self.place(scored, unit);
                }
                None => deferred.push(*unit),
            }
        }
        deferred
    }
}
