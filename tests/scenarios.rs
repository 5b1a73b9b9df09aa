use std::collections::HashMap;

use panel_optimizer::allocator::allocate;
use panel_optimizer::geometry::{Region, contains, overlaps};
use panel_optimizer::guillotine::FitHeuristic;
use panel_optimizer::normalize::normalize;
use panel_optimizer::plan::{CuttingPlan, UnplacedReason};
use panel_optimizer::types::{CutRequest, OptimizeOptions, PieceRequest, StockGrain, StockSheet};
use panel_optimizer::{OptimizeError, optimize};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn request(pieces: Vec<PieceRequest>, stock: Vec<StockSheet>, seed: u64) -> CutRequest {
    CutRequest {
        pieces,
        stock,
        options: OptimizeOptions {
            max_iterations: Some(24),
            random_seed: Some(seed),
            ..Default::default()
        },
    }
}

/// Whether `pieces` can be separated by straight cuts running from one edge
/// of `area` to the other, recursively.
fn is_cuttable(area: Region, pieces: &[Region]) -> bool {
    if pieces.len() <= 1 {
        return true;
    }
    let vertical = pieces.iter().flat_map(|p| [p.x, p.right()]).find_map(|at| {
        let clear = at > area.x
            && at < area.right()
            && !pieces.iter().any(|q| q.x < at && at < q.right());
        clear.then(|| {
            let (left, right): (Vec<Region>, Vec<Region>) =
                pieces.iter().copied().partition(|q| q.right() <= at);
            (
                (Region::new(area.x, area.y, at - area.x, area.h), left),
                (Region::new(at, area.y, area.right() - at, area.h), right),
            )
        })
    });
    let horizontal = || {
        pieces.iter().flat_map(|p| [p.y, p.bottom()]).find_map(|at| {
            let clear = at > area.y
                && at < area.bottom()
                && !pieces.iter().any(|q| q.y < at && at < q.bottom());
            clear.then(|| {
                let (top, bottom): (Vec<Region>, Vec<Region>) =
                    pieces.iter().copied().partition(|q| q.bottom() <= at);
                (
                    (Region::new(area.x, area.y, area.w, at - area.y), top),
                    (Region::new(area.x, at, area.w, area.bottom() - at), bottom),
                )
            })
        })
    };
    match vertical.or_else(horizontal) {
        Some(((a, first), (b, second))) => is_cuttable(a, &first) && is_cuttable(b, &second),
        None => false,
    }
}

/// Checks containment, kerf-aware non-overlap, guillotine cuttability and
/// per-label conservation.
fn assert_plan_valid(plan: &CuttingPlan, req: &CutRequest) {
    for (si, sheet) in plan.sheets.iter().enumerate() {
        let stock = &req.stock[sheet.stock_index];
        assert_eq!((sheet.width, sheet.height), (stock.width, stock.height));
        let bounds = Region::new(0, 0, stock.width, stock.height);
        let footprints: Vec<Region> = sheet
            .placements
            .iter()
            .map(|p| Region::new(p.x, p.y, p.width, p.height).inflate_clipped(stock.kerf, &bounds))
            .collect();
        for (i, p) in sheet.placements.iter().enumerate() {
            assert!(
                contains(&bounds, &Region::new(p.x, p.y, p.width, p.height)),
                "sheet {si}: {} @ ({}, {}) leaves the sheet",
                p.label,
                p.x,
                p.y
            );
            for j in (i + 1)..footprints.len() {
                assert!(
                    !overlaps(&footprints[i], &footprints[j]),
                    "sheet {si}: placements {i} and {j} overlap"
                );
            }
        }
        assert!(
            is_cuttable(bounds, &footprints),
            "sheet {si} cannot be cut with edge-to-edge cuts"
        );
    }

    let mut requested: HashMap<&str, u32> = HashMap::new();
    for p in &req.pieces {
        *requested.entry(p.label.as_str()).or_default() += p.quantity;
    }
    let mut accounted: HashMap<&str, u32> = HashMap::new();
    for p in plan.sheets.iter().flat_map(|s| &s.placements) {
        *accounted.entry(p.label.as_str()).or_default() += 1;
    }
    for u in &plan.unplaced {
        *accounted.entry(u.label.as_str()).or_default() += u.count;
    }
    assert_eq!(requested, accounted);
}

#[test]
fn four_doors_fit_one_sheet() {
    let req = request(
        vec![PieceRequest::new("door", 600, 400, 4)],
        vec![StockSheet::new(2800, 2070, 3)],
        1,
    );
    let plan = optimize(&req).unwrap();
    assert_plan_valid(&plan, &req);
    assert_eq!(plan.sheet_count, 1);
    assert_eq!(plan.placed_count(), 4);
    assert!(plan.unplaced.is_empty());
}

#[test]
fn piece_longer_than_any_stock_is_rejected_up_front() {
    let pieces = vec![PieceRequest::new("rail", 3000, 400, 1)];
    let stock = vec![StockSheet::new(2800, 2070, 3)];
    let err = optimize(&request(pieces.clone(), stock.clone(), 1)).unwrap_err();
    assert_eq!(err.kind(), "invalid_piece");
    assert!(matches!(err, OptimizeError::InvalidPiece(ref issues) if issues[0].label == "rail"));

    // Fed to the allocator directly it is reported unplaced, never dropped.
    let units: Vec<_> = normalize(&[PieceRequest::new("rail", 2000, 400, 1)], &stock)
        .unwrap()
        .into_iter()
        .map(|mut u| {
            u.rect.w = 3000;
            u
        })
        .collect();
    let sol = allocate(&units, &stock, FitHeuristic::BestAreaFit);
    assert_eq!(sol.unplaced.len(), 1);
    assert_eq!(sol.sheet_count(), 0);
}

#[test]
fn overflow_uses_exactly_two_sheets() {
    let req = request(
        vec![
            PieceRequest::new("carcass", 1200, 800, 4),
            PieceRequest::new("shelf", 900, 600, 4),
            PieceRequest::new("door", 700, 500, 2),
        ],
        vec![StockSheet::new(2800, 2070, 3).with_quantity(2)],
        7,
    );
    let plan = optimize(&req).unwrap();
    assert_plan_valid(&plan, &req);
    assert_eq!(plan.sheet_count, 2);
    assert!(plan.unplaced.is_empty());
}

#[test]
fn grain_locked_piece_is_never_rotated() {
    // The second stock type only takes the locked piece turned 90°.
    let req = request(
        vec![
            PieceRequest::new("panel", 600, 400, 1).grain_locked(),
            PieceRequest::new("front", 500, 300, 1).grain_locked(),
        ],
        vec![
            StockSheet::new(600, 400, 0)
                .with_grain(StockGrain::Horizontal)
                .with_quantity(1),
            StockSheet::new(400, 600, 0)
                .with_grain(StockGrain::Horizontal)
                .with_quantity(1),
        ],
        3,
    );
    let plan = optimize(&req).unwrap();
    assert_plan_valid(&plan, &req);
    assert!(plan.sheets.iter().flat_map(|s| &s.placements).all(|p| !p.rotated));
    assert_eq!(plan.sheet_count, 1);
    assert_eq!(plan.sheets[0].placements[0].label, "panel");
    assert_eq!(plan.unplaced.len(), 1);
    assert_eq!(plan.unplaced[0].label, "front");
    assert_eq!(plan.unplaced[0].count, 1);
    assert_eq!(plan.unplaced[0].reason, UnplacedReason::StockExhausted);
    assert!(plan.is_partial());
}

#[test]
fn seeded_runs_are_identical() {
    let pieces = vec![
        PieceRequest::new("a", 800, 600, 5),
        PieceRequest::new("b", 400, 300, 8),
        PieceRequest::new("c", 600, 400, 4),
        PieceRequest::new("d", 1200, 600, 3),
        PieceRequest::new("e", 300, 200, 6),
    ];
    let stock = vec![StockSheet::new(2440, 1220, 4)];
    let first = optimize(&request(pieces.clone(), stock.clone(), 42)).unwrap();
    let second = optimize(&request(pieces, stock, 42)).unwrap();
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
    assert_eq!(first.seed, 42);
}

#[test]
fn never_worse_than_input_order() {
    let pieces = vec![
        PieceRequest::new("small", 250, 150, 5),
        PieceRequest::new("wide", 1000, 400, 3),
        PieceRequest::new("square", 450, 450, 4),
        PieceRequest::new("mid", 700, 500, 6),
        PieceRequest::new("long", 1800, 300, 2),
    ];
    let stock = vec![StockSheet::new(2440, 1220, 3)];
    let req = request(pieces.clone(), stock.clone(), 5);
    let plan = optimize(&req).unwrap();
    assert_plan_valid(&plan, &req);

    let units = normalize(&pieces, &stock).unwrap();
    let baseline = allocate(&units, &stock, FitHeuristic::BestAreaFit);
    assert!(baseline.unplaced.is_empty());
    assert!(plan.total_waste_percent <= baseline.total_waste_percent() + 1e-9);
}

#[test]
fn mixed_stock_conserves_every_piece() {
    let req = request(
        vec![
            PieceRequest::new("side", 720, 560, 6),
            PieceRequest::new("base", 1164, 560, 3).grain_locked(),
            PieceRequest::new("back", 1200, 720, 3),
            PieceRequest::new("shelf", 1164, 540, 6),
        ],
        vec![
            StockSheet::new(2440, 1220, 4)
                .with_grain(StockGrain::Horizontal)
                .with_quantity(2),
            StockSheet::new(2800, 2070, 4).with_quantity(1),
        ],
        11,
    );
    let plan = optimize(&req).unwrap();
    assert_plan_valid(&plan, &req);
    assert!(plan.sheet_count <= 3);
}

#[test]
fn empty_stock_is_an_error() {
    let req = request(vec![PieceRequest::new("a", 10, 10, 1)], vec![], 1);
    assert_eq!(optimize(&req), Err(OptimizeError::EmptyStock));
}

#[test]
fn wire_request_round_trip() {
    let json = r#"{
        "pieces": [{"width": 600, "height": 400, "quantity": 4, "grainLocked": false, "label": "door"}],
        "stock": [{"width": 2800, "height": 2070, "kerf": 3, "grainDirection": "none", "quantityAvailable": null}],
        "options": {"maxIterations": 4, "randomSeed": 42}
    }"#;
    let req: CutRequest = serde_json::from_str(json).unwrap();
    let plan = optimize(&req).unwrap();
    let out = serde_json::to_value(&plan).unwrap();
    assert_eq!(out["sheetCount"], 1);
    assert_eq!(out["sheets"][0]["stockIndex"], 0);
    assert_eq!(out["sheets"][0]["placements"].as_array().unwrap().len(), 4);
    assert!(out["unplaced"].as_array().unwrap().is_empty());
}

#[test]
fn random_cut_lists_yield_guillotine_plans() {
    let mut rng = StdRng::seed_from_u64(2024);
    for round in 0..40 {
        let pieces: Vec<PieceRequest> = (0..rng.random_range(4..12))
            .map(|i| {
                PieceRequest::new(
                    format!("p{i}"),
                    rng.random_range(10..=70),
                    rng.random_range(10..=70),
                    rng.random_range(1..=3),
                )
            })
            .collect();
        let req = CutRequest {
            pieces,
            stock: vec![StockSheet::new(100, 100, round % 3)],
            options: OptimizeOptions {
                max_iterations: Some(8),
                random_seed: Some(round as u64),
                parallel: Some(false),
                ..Default::default()
            },
        };
        let plan = optimize(&req).unwrap();
        assert_plan_valid(&plan, &req);
        assert!(plan.unplaced.is_empty());
    }
}

#[test]
fn zero_time_budget_returns_deterministic_best() {
    let pieces = vec![
        PieceRequest::new("a", 800, 600, 5),
        PieceRequest::new("b", 400, 300, 8),
        PieceRequest::new("c", 1200, 600, 3),
    ];
    let stock = vec![StockSheet::new(2440, 1220, 4)];
    let mut req = request(pieces, stock, 17);
    req.options.time_budget_ms = Some(0);
    let plan = optimize(&req).unwrap();
    assert_plan_valid(&plan, &req);
    assert_eq!(plan.iterations, 12);
    assert!(!plan.strategy.starts_with("randomized"));
    assert!(plan.unplaced.is_empty());

    req.options.time_budget_ms = None;
    req.options.max_iterations = Some(0);
    let without_random = optimize(&req).unwrap();
    assert_eq!(
        serde_json::to_string(&plan).unwrap(),
        serde_json::to_string(&without_random).unwrap()
    );
}
