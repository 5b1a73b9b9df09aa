use serde::{Deserialize, Deserializer, Serialize};

use crate::geometry::Rect;

/// Grain orientation of a stock sheet. Sheets with a grain forbid rotating
/// grain-locked pieces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockGrain {
    #[default]
    None,
    Horizontal,
    Vertical,
}

impl StockGrain {
    pub fn is_fixed(&self) -> bool {
        !matches!(self, StockGrain::None)
    }
}

/// One line of the cut list as the caller submits it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PieceRequest {
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub width: u32,
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub height: u32,
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub quantity: u32,
    #[serde(default)]
    pub grain_locked: bool,
    #[serde(default)]
    pub label: String,
}

impl PieceRequest {
    pub fn new(label: impl Into<String>, width: u32, height: u32, quantity: u32) -> Self {
        Self {
            width,
            height,
            quantity,
            grain_locked: false,
            label: label.into(),
        }
    }

    pub fn grain_locked(mut self) -> Self {
        self.grain_locked = true;
        self
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.width, self.height)
    }
}

/// A stock sheet type offered for cutting. `quantity: None` means unbounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockSheet {
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub width: u32,
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub height: u32,
    #[serde(default, deserialize_with = "deserialize_u32_from_number")]
    pub kerf: u32,
    #[serde(default, rename = "grainDirection")]
    pub grain: StockGrain,
    #[serde(
        default,
        rename = "quantityAvailable",
        deserialize_with = "deserialize_opt_u32_from_number"
    )]
    pub quantity: Option<u32>,
}

impl StockSheet {
    pub fn new(width: u32, height: u32, kerf: u32) -> Self {
        Self {
            width,
            height,
            kerf,
            grain: StockGrain::None,
            quantity: None,
        }
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn with_grain(mut self, grain: StockGrain) -> Self {
        self.grain = grain;
        self
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.width, self.height)
    }

    pub fn is_available(&self) -> bool {
        self.quantity != Some(0)
    }

    /// Whether a piece with the given grain lock may be turned 90° on this
    /// sheet.
    pub fn allows_rotation(&self, grain_locked: bool) -> bool {
        !(grain_locked && self.grain.is_fixed())
    }
}

/// Caller-facing knobs for the optimizer run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeOptions {
    #[serde(default)]
    pub max_iterations: Option<usize>,
    #[serde(default)]
    pub time_budget_ms: Option<u64>,
    #[serde(default)]
    pub random_seed: Option<u64>,
    #[serde(default)]
    pub parallel: Option<bool>,
}

/// The complete input to one optimization run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CutRequest {
    pub pieces: Vec<PieceRequest>,
    pub stock: Vec<StockSheet>,
    #[serde(default)]
    pub options: OptimizeOptions,
}

/// One requested piece after quantity expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unit {
    /// Position in the expanded unit list.
    pub id: usize,
    /// Index of the originating [`PieceRequest`].
    pub demand: usize,
    pub rect: Rect,
    pub grain_locked: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Number {
    Int(u64),
    Float(f64),
}

fn number_to_u32<E: serde::de::Error>(n: Number) -> Result<u32, E> {
    match n {
        Number::Int(v) => u32::try_from(v).map_err(|_| E::custom(format!("{v} is out of range"))),
        Number::Float(v) if v.fract() == 0.0 && v >= 0.0 && v <= u32::MAX as f64 => Ok(v as u32),
        Number::Float(v) => Err(E::custom(format!("expected a whole number, got {v}"))),
    }
}

/// Accepts `600` as well as `600.0`, as sent by JavaScript clients.
pub fn deserialize_u32_from_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    number_to_u32(Number::deserialize(deserializer)?)
}

pub fn deserialize_opt_u32_from_number<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Number>::deserialize(deserializer)?
        .map(number_to_u32)
        .transpose()
}
