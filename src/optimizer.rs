use std::cmp::Reverse;
use std::fmt;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::allocator::{Solution, SolutionScore, allocate};
use crate::guillotine::FitHeuristic;
use crate::types::{OptimizeOptions, StockSheet, Unit};

pub const DEFAULT_RANDOM_ITERATIONS: usize = 32;

/// Order in which unit pieces are fed to the allocator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    InputOrder,
    ByArea,
    ByLongSide,
    ByShortSide,
    Randomized(u64),
}

impl Strategy {
    pub const DETERMINISTIC: [Strategy; 4] = [
        Strategy::InputOrder,
        Strategy::ByArea,
        Strategy::ByLongSide,
        Strategy::ByShortSide,
    ];

    /// Returns `units` in this strategy's order. Sorts are stable, so equal
    /// keys keep their input order.
    pub fn order(&self, units: &[Unit]) -> Vec<Unit> {
        let mut ordered = units.to_vec();
        match *self {
            Strategy::InputOrder => {}
            Strategy::ByArea => {
                ordered.sort_by_key(|u| Reverse((u.rect.area(), u.rect.long_side())));
            }
            Strategy::ByLongSide => {
                ordered.sort_by_key(|u| Reverse((u.rect.long_side(), u.rect.short_side())));
            }
            Strategy::ByShortSide => {
                ordered.sort_by_key(|u| Reverse((u.rect.short_side(), u.rect.long_side())));
            }
            Strategy::Randomized(seed) => {
                ordered.shuffle(&mut StdRng::seed_from_u64(seed));
            }
        }
        ordered
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::InputOrder => write!(f, "input-order"),
            Strategy::ByArea => write!(f, "by-area"),
            Strategy::ByLongSide => write!(f, "by-long-side"),
            Strategy::ByShortSide => write!(f, "by-short-side"),
            Strategy::Randomized(seed) => write!(f, "randomized({seed})"),
        }
    }
}

/// Resolved optimizer settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizerConfig {
    /// Number of randomized orderings tried after the deterministic ones.
    pub random_iterations: usize,
    pub time_budget: Option<Duration>,
    pub seed: u64,
    pub parallel: bool,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            random_iterations: DEFAULT_RANDOM_ITERATIONS,
            time_budget: None,
            seed: rand::random(),
            parallel: true,
        }
    }
}

impl From<&OptimizeOptions> for OptimizerConfig {
    fn from(opts: &OptimizeOptions) -> Self {
        let defaults = Self::default();
        Self {
            random_iterations: opts.max_iterations.unwrap_or(defaults.random_iterations),
            time_budget: opts.time_budget_ms.map(Duration::from_millis),
            seed: opts.random_seed.unwrap_or(defaults.seed),
            parallel: opts.parallel.unwrap_or(defaults.parallel),
        }
    }
}

/// One scheduled allocation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt {
    pub strategy: Strategy,
    pub heuristic: FitHeuristic,
}

/// The best solution of a run and how it was found.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub solution: Solution,
    pub score: SolutionScore,
    pub attempt: Attempt,
    /// Allocation passes actually executed.
    pub iterations: usize,
    pub seed: u64,
    /// Whether the time budget stopped randomized passes early.
    pub timed_out: bool,
}

struct Candidate {
    index: usize,
    attempt: Attempt,
    score: SolutionScore,
    solution: Solution,
}

impl Candidate {
    fn key(&self) -> (SolutionScore, usize) {
        (self.score, self.index)
    }
}

fn better(a: Candidate, b: Candidate) -> Candidate {
    if b.key() < a.key() { b } else { a }
}

pub struct Optimizer<'a> {
    units: &'a [Unit],
    stock: &'a [StockSheet],
    config: OptimizerConfig,
}

impl<'a> Optimizer<'a> {
    pub fn new(units: &'a [Unit], stock: &'a [StockSheet], config: OptimizerConfig) -> Self {
        Self {
            units,
            stock,
            config,
        }
    }

    /// The full schedule: every deterministic ordering paired with every fit
    /// heuristic, starting with (input order, best area fit), followed by
    /// the randomized orderings.
    pub fn schedule(&self) -> Vec<Attempt> {
        let mut attempts: Vec<Attempt> = Strategy::DETERMINISTIC
            .into_iter()
            .flat_map(|strategy| {
                FitHeuristic::ALL
                    .into_iter()
                    .map(move |heuristic| Attempt { strategy, heuristic })
            })
            .collect();

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        for i in 0..self.config.random_iterations {
            attempts.push(Attempt {
                strategy: Strategy::Randomized(rng.random()),
                heuristic: FitHeuristic::ALL[i % FitHeuristic::ALL.len()],
            });
        }
        attempts
    }

    fn evaluate(&self, index: usize, attempt: Attempt) -> Candidate {
        let ordered = attempt.strategy.order(self.units);
        let solution = allocate(&ordered, self.stock, attempt.heuristic);
        let score = solution.score();
        debug!(
            iteration = index,
            strategy = %attempt.strategy,
            heuristic = ?attempt.heuristic,
            unplaced = score.unplaced,
            waste_area = score.waste_area,
            sheets = score.sheet_count,
            "evaluated ordering"
        );
        Candidate {
            index,
            attempt,
            score,
            solution,
        }
    }

    pub fn run(&self) -> Outcome {
        let start = Instant::now();
        let deadline = self.config.time_budget.map(|b| start + b);
        let expired = || deadline.is_some_and(|d| Instant::now() >= d);

        let schedule = self.schedule();
        let deterministic = Strategy::DETERMINISTIC.len() * FitHeuristic::ALL.len();
        let (fixed, randomized) = schedule.split_at(deterministic);

        // Deterministic passes always run so there is a baseline.
        let mut best: Option<Candidate> = None;
        for (i, &attempt) in fixed.iter().enumerate() {
            let candidate = self.evaluate(i, attempt);
            best = Some(match best {
                Some(b) => better(b, candidate),
                None => candidate,
            });
        }
        let mut iterations = fixed.len();

        let run_random = |offset: usize, attempt: Attempt| {
            if expired() {
                None
            } else {
                Some(self.evaluate(deterministic + offset, attempt))
            }
        };
        let random_best = if self.config.parallel {
            randomized
                .par_iter()
                .enumerate()
                .filter_map(|(i, &a)| run_random(i, a).map(|c| (1usize, c)))
                .reduce_with(|(n, a), (m, b)| (n + m, better(a, b)))
        } else {
            randomized
                .iter()
                .enumerate()
                .map_while(|(i, &a)| run_random(i, a).map(|c| (1usize, c)))
                .reduce(|(n, a), (m, b)| (n + m, better(a, b)))
        };
        if let Some((n, candidate)) = random_best {
            iterations += n;
            best = best.map(|b| better(b, candidate));
        }

        let timed_out = iterations < schedule.len();
        if timed_out {
            warn!(
                executed = iterations,
                scheduled = schedule.len(),
                "time budget exhausted before all orderings were tried"
            );
        }

        // The schedule always holds the deterministic passes.
        let best = best.unwrap_or_else(|| self.evaluate(0, schedule[0]));
        info!(
            iterations,
            strategy = %best.attempt.strategy,
            heuristic = ?best.attempt.heuristic,
            sheets = best.score.sheet_count,
            unplaced = best.score.unplaced,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "optimization finished"
        );

        Outcome {
            score: best.score,
            attempt: best.attempt,
            solution: best.solution,
            iterations,
            seed: self.config.seed,
            timed_out,
        }
    }
}
