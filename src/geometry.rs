/// Width and height of an unpositioned rectangle, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }

    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }

    pub fn rotated(&self) -> Self {
        Self {
            w: self.h,
            h: self.w,
        }
    }

    pub fn fits_in(&self, other: &Rect) -> bool {
        self.w <= other.w && self.h <= other.h
    }

    pub fn long_side(&self) -> u32 {
        self.w.max(self.h)
    }

    pub fn short_side(&self) -> u32 {
        self.w.min(self.h)
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.w, self.h)
    }
}

/// An axis-aligned rectangle anchored at `(x, y)` on a sheet.
///
/// `y` grows downwards, so "above" means smaller `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Region {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    pub fn at(x: u32, y: u32, size: Rect) -> Self {
        Self::new(x, y, size.w, size.h)
    }

    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.w)
    }

    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.h)
    }

    pub fn size(&self) -> Rect {
        Rect::new(self.w, self.h)
    }

    pub fn area(&self) -> u64 {
        self.size().area()
    }

    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    /// Grows the region by `kerf` on its right and bottom edges, without
    /// crossing `bounds`.
    pub fn inflate_clipped(&self, kerf: u32, bounds: &Region) -> Region {
        let right = self.right().saturating_add(kerf).min(bounds.right());
        let bottom = self.bottom().saturating_add(kerf).min(bounds.bottom());
        Region::new(
            self.x,
            self.y,
            right.saturating_sub(self.x),
            bottom.saturating_sub(self.y),
        )
    }
}

/// Strict interior overlap. Regions that only share an edge do not overlap.
pub fn overlaps(a: &Region, b: &Region) -> bool {
    a.x < b.right() && b.x < a.right() && a.y < b.bottom() && b.y < a.bottom()
}

pub fn contains(outer: &Region, inner: &Region) -> bool {
    inner.x >= outer.x
        && inner.y >= outer.y
        && inner.right() <= outer.right()
        && inner.bottom() <= outer.bottom()
}

/// Removes `occupied` from `free`, returning the maximal leftover regions
/// above, below, left and right of it. Leftovers with zero area are dropped.
///
/// The results may overlap each other but never overlap `occupied`. A `free`
/// region not touched by `occupied` is returned unchanged.
pub fn subtract(free: &Region, occupied: &Region) -> Vec<Region> {
    if !overlaps(free, occupied) {
        return vec![*free];
    }

    let mut out = Vec::with_capacity(4);
    if occupied.y > free.y {
        out.push(Region::new(free.x, free.y, free.w, occupied.y - free.y));
    }
    if occupied.bottom() < free.bottom() {
        out.push(Region::new(
            free.x,
            occupied.bottom(),
            free.w,
            free.bottom() - occupied.bottom(),
        ));
    }
    if occupied.x > free.x {
        out.push(Region::new(free.x, free.y, occupied.x - free.x, free.h));
    }
    if occupied.right() < free.right() {
        out.push(Region::new(
            occupied.right(),
            free.y,
            free.right() - occupied.right(),
            free.h,
        ));
    }
    out.retain(|r| !r.is_empty());
    out
}

/// Direction of the first, full-length saw cut in a guillotine split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cut {
    /// Across the whole width, along the bottom edge of the occupied region.
    Horizontal,
    /// Across the whole height, along the right edge of the occupied region.
    Vertical,
}

/// Guillotine split of `free` around `occupied`, which must sit in its
/// top-left corner. The leftover beyond the first cut spans the full side of
/// `free`; the other leftover stops at that cut. The result holds at most two
/// disjoint regions.
pub fn guillotine_split(free: &Region, occupied: &Region, cut: Cut) -> Vec<Region> {
    debug_assert!(occupied.x == free.x && occupied.y == free.y);
    subtract(free, occupied)
        .into_iter()
        .map(|mut r| {
            match cut {
                Cut::Horizontal if r.y < occupied.bottom() => {
                    r.h = r.bottom().min(occupied.bottom()) - r.y;
                }
                Cut::Vertical if r.x < occupied.right() => {
                    r.w = r.right().min(occupied.right()) - r.x;
                }
                _ => {}
            }
            r
        })
        .collect()
}
