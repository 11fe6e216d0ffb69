//! Level templates
//!
//! A template is a rectangular grid of cell codes authored for quadrant 0,
//! indexed `[x][y]` with (0, 0) at the arena center corner. Sectors in other
//! quadrants read it through a 4-way rotation so the inner corner always
//! faces the center.
//!
//! Codes: `0` empty, `1` wall, `0..1` wall probability, `2` enemy spawn,
//! `3` player spawn.

use glam::IVec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::grid::Quadrant;
use crate::consts::QUADRANT_CELL_WIDTH;
use crate::error::{Result, TemplateError};

/// Decoded meaning of one template cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellCode {
    Empty,
    Wall,
    /// Wall with the given probability
    Density(f32),
    EnemySpawn,
    PlayerSpawn,
}

impl CellCode {
    fn decode(value: f32) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        if value == 0.0 {
            Some(CellCode::Empty)
        } else if value == 1.0 {
            Some(CellCode::Wall)
        } else if value == 2.0 {
            Some(CellCode::EnemySpawn)
        } else if value == 3.0 {
            Some(CellCode::PlayerSpawn)
        } else if value > 0.0 && value < 1.0 {
            Some(CellCode::Density(value))
        } else {
            None
        }
    }

    /// Probability this cell materializes as a wall
    pub fn wall_probability(self) -> f32 {
        match self {
            CellCode::Wall => 1.0,
            CellCode::Density(p) => p,
            _ => 0.0,
        }
    }
}

/// Map local sector indices to quadrant-0 template indices for `quadrant`
pub fn rotate_local(local: IVec2, quadrant: Quadrant, width: i32) -> IVec2 {
    let (i, j) = (local.x, local.y);
    let last = width - 1;
    match quadrant.index() {
        0 => IVec2::new(i, j),
        1 => IVec2::new(j, last - i),
        2 => IVec2::new(last - i, last - j),
        _ => IVec2::new(last - j, i),
    }
}

/// One authored sector layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    columns: Vec<Vec<f32>>,
}

impl Template {
    /// Validate and wrap raw columns; `index` is only used in error messages
    pub fn from_columns(index: usize, columns: Vec<Vec<f32>>) -> Result<Self> {
        let expected = columns.first().map_or(0, Vec::len);
        if expected == 0 {
            return Err(TemplateError::Empty { index });
        }
        for (x, column) in columns.iter().enumerate() {
            if column.len() != expected {
                return Err(TemplateError::NotRectangular {
                    index,
                    column: x,
                    len: column.len(),
                    expected,
                });
            }
            for (y, &value) in column.iter().enumerate() {
                if CellCode::decode(value).is_none() {
                    return Err(TemplateError::InvalidCode { index, x, y, value });
                }
            }
        }
        Ok(Self { columns })
    }

    /// All-empty template the size of a quadrant grid
    pub fn empty() -> Self {
        let w = QUADRANT_CELL_WIDTH as usize;
        Self {
            columns: vec![vec![0.0; w]; w],
        }
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Code at template indices; outside the template reads as empty
    pub fn code(&self, at: IVec2) -> CellCode {
        if at.x < 0 || at.y < 0 {
            return CellCode::Empty;
        }
        self.columns
            .get(at.x as usize)
            .and_then(|col| col.get(at.y as usize))
            .and_then(|&v| CellCode::decode(v))
            .unwrap_or(CellCode::Empty)
    }

    /// Code for a sector's local cell after rotation and optional mirroring
    pub fn sample(&self, local: IVec2, quadrant: Quadrant, mirrored: bool) -> CellCode {
        let at = rotate_local(local, quadrant, QUADRANT_CELL_WIDTH);
        let at = if mirrored { IVec2::new(at.y, at.x) } else { at };
        self.code(at)
    }
}

/// The externally supplied template collection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateSet {
    templates: Vec<Template>,
}

impl TemplateSet {
    /// Empty set; generation falls back to an all-empty template
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_templates(templates: Vec<Template>) -> Self {
        Self { templates }
    }

    /// Parse the level-conversion output: a JSON array of `[x][y]` grids
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: Vec<Vec<Vec<f32>>> = serde_json::from_str(json)?;
        let templates = raw
            .into_iter()
            .enumerate()
            .map(|(index, columns)| Template::from_columns(index, columns))
            .collect::<Result<Vec<_>>>()?;
        log::info!("Loaded {} level templates", templates.len());
        Ok(Self { templates })
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Pick a random template; `None` means use the empty fallback
    pub fn pick<R: Rng>(&self, rng: &mut R) -> Option<&Template> {
        if self.templates.is_empty() {
            None
        } else {
            self.templates.get(rng.random_range(0..self.templates.len()))
        }
    }
}
