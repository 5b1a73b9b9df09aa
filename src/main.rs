use std::path::PathBuf;

use clap::Parser;
use panel_optimizer::render;
use panel_optimizer::types::{CutRequest, OptimizeOptions, PieceRequest, StockGrain, StockSheet};
use panel_optimizer::{CuttingPlan, optimize};

#[derive(Parser)]
#[command(
    name = "panel_optimizer",
    about = "Multi-sheet rectangular panel cutting optimizer"
)]
struct Cli {
    /// Read the whole request from a JSON file instead of flags
    #[arg(long, conflicts_with_all = ["stock", "cuts"])]
    input: Option<PathBuf>,

    /// Stock sheet as WxH[:qty] (e.g. 2800x2070:5); repeat for several sizes
    #[arg(long, num_args = 1..)]
    stock: Vec<String>,

    /// Cut pieces as WxH:qty[:label][:locked] (e.g. 600x400:4:door:locked)
    #[arg(long = "cuts", num_args = 1..)]
    cuts: Vec<String>,

    /// Blade kerf width in mm (default: 0)
    #[arg(long, default_value_t = 0)]
    kerf: u32,

    /// Stock grain direction: none, horizontal, or vertical
    #[arg(long, default_value = "none", value_parser = parse_grain)]
    grain: StockGrain,

    /// Number of randomized orderings to try
    #[arg(long)]
    iterations: Option<usize>,

    /// Stop launching new orderings after this many milliseconds
    #[arg(long)]
    time_budget_ms: Option<u64>,

    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Evaluate orderings on a single thread
    #[arg(long)]
    sequential: bool,

    /// Print the plan as JSON
    #[arg(long)]
    json: bool,

    /// Show ASCII layout of each sheet
    #[arg(long)]
    layout: bool,

    /// Log optimizer progress to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn parse_grain(s: &str) -> Result<StockGrain, String> {
    match s {
        "none" => Ok(StockGrain::None),
        "horizontal" => Ok(StockGrain::Horizontal),
        "vertical" => Ok(StockGrain::Vertical),
        _ => Err(format!(
            "invalid grain '{}', expected: none, horizontal, or vertical",
            s
        )),
    }
}

fn parse_dimensions(s: &str) -> Result<(u32, u32), String> {
    let parts: Vec<&str> = s.split('x').collect();
    if parts.len() != 2 {
        return Err(format!("invalid dimensions '{}', expected WxH", s));
    }
    let width = parts[0]
        .parse::<u32>()
        .map_err(|_| format!("invalid width in '{}'", s))?;
    let height = parts[1]
        .parse::<u32>()
        .map_err(|_| format!("invalid height in '{}'", s))?;
    if width == 0 || height == 0 {
        return Err(format!("dimensions must be non-zero in '{}'", s));
    }
    Ok((width, height))
}

fn parse_stock(s: &str, kerf: u32, grain: StockGrain) -> Result<StockSheet, String> {
    let (dims, qty) = match s.split_once(':') {
        Some((dims, qty)) => (dims, Some(qty)),
        None => (s, None),
    };
    let (width, height) = parse_dimensions(dims)?;
    let mut sheet = StockSheet::new(width, height, kerf).with_grain(grain);
    if let Some(qty) = qty {
        let qty = qty
            .parse::<u32>()
            .map_err(|_| format!("invalid quantity in '{}'", s))?;
        sheet = sheet.with_quantity(qty);
    }
    Ok(sheet)
}

fn parse_cut(s: &str) -> Result<PieceRequest, String> {
    let parts: Vec<&str> = s.split(':').collect();
    if !(2..=4).contains(&parts.len()) {
        return Err(format!("invalid cut '{}', expected WxH:qty[:label][:locked]", s));
    }
    let (width, height) = parse_dimensions(parts[0])?;
    let qty = parts[1]
        .parse::<u32>()
        .map_err(|_| format!("invalid quantity in '{}'", s))?;
    if qty == 0 {
        return Err(format!("quantity must be non-zero in '{}'", s));
    }
    let mut label = parts.get(2).copied().unwrap_or_default().to_string();
    let mut locked = false;
    match parts.get(3) {
        Some(&"locked") => locked = true,
        Some(other) => return Err(format!("unknown cut flag '{}' in '{}'", other, s)),
        None if label == "locked" => {
            label.clear();
            locked = true;
        }
        None => {}
    }
    if label.is_empty() {
        label = parts[0].to_string();
    }
    Ok(PieceRequest {
        width,
        height,
        quantity: qty,
        grain_locked: locked,
        label,
    })
}

fn build_request(cli: &Cli) -> Result<CutRequest, String> {
    let mut request = match &cli.input {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
            serde_json::from_str::<CutRequest>(&raw)
                .map_err(|e| format!("invalid request in {}: {}", path.display(), e))?
        }
        None => CutRequest {
            pieces: cli
                .cuts
                .iter()
                .map(|c| parse_cut(c))
                .collect::<Result<Vec<_>, _>>()?,
            stock: cli
                .stock
                .iter()
                .map(|s| parse_stock(s, cli.kerf, cli.grain))
                .collect::<Result<Vec<_>, _>>()?,
            options: OptimizeOptions::default(),
        },
    };

    let opts = &mut request.options;
    if cli.iterations.is_some() {
        opts.max_iterations = cli.iterations;
    }
    if cli.time_budget_ms.is_some() {
        opts.time_budget_ms = cli.time_budget_ms;
    }
    if cli.seed.is_some() {
        opts.random_seed = cli.seed;
    }
    if cli.sequential {
        opts.parallel = Some(false);
    }
    Ok(request)
}

fn print_plan(plan: &CuttingPlan, layout: bool) {
    for (i, sheet) in plan.sheets.iter().enumerate() {
        println!(
            "Sheet {} ({}x{}, stock #{}):",
            i + 1,
            sheet.width,
            sheet.height,
            sheet.stock_index
        );
        for p in &sheet.placements {
            let rot = if p.rotated { " [rotated]" } else { "" };
            println!("  {} {}x{} @ ({}, {}){}", p.label, p.width, p.height, p.x, p.y, rot);
        }
        println!("  waste: {:.1}%", sheet.waste_percent);
        if layout {
            print!("{}", render::render_sheet(sheet));
        }
        println!();
    }

    if plan.is_partial() {
        println!("Could not be placed:");
        for u in &plan.unplaced {
            println!("  {} x{} ({:?})", u.label, u.count, u.reason);
        }
        println!();
    }

    println!(
        "Summary: {} sheet{} used, {:.1}% waste, best of {} orderings ({}), seed {}",
        plan.sheet_count,
        if plan.sheet_count == 1 { "" } else { "s" },
        plan.total_waste_percent,
        plan.iterations,
        plan.strategy,
        plan.seed,
    );
}

fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_max_level(tracing::Level::DEBUG)
            .init();
    }

    let request = build_request(&cli).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    let plan = optimize(&request).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    if cli.json {
        match serde_json::to_string_pretty(&plan) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        print_plan(&plan, cli.layout);
    }
}
