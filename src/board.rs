/// Pixels per grid cell. Collision geometry is computed in pixel space.
pub const CELL_SIZE: f64 = 30.0;

pub const BASE_THICKNESS: f64 = 16.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub fn new(x: i32, y: i32) -> Self {
        Cell { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Cell {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    fn is_adjacent(self, other: Cell) -> bool {
        let dx = (i64::from(self.x) - i64::from(other.x)).abs();
        let dy = (i64::from(self.y) - i64::from(other.y)).abs();
        dx + dy == 1
    }
}

/// Exit direction of a piece. Screen coordinates: `y` grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Direction {
    #[serde(rename = "R")]
    Right,
    #[serde(rename = "L")]
    Left,
    #[serde(rename = "D")]
    Down,
    #[serde(rename = "U")]
    Up,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Right,
        Direction::Left,
        Direction::Down,
        Direction::Up,
    ];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Right => (1, 0),
            Direction::Left => (-1, 0),
            Direction::Down => (0, 1),
            Direction::Up => (0, -1),
        }
    }

    pub fn forward_dot(self, dx: i32, dy: i32) -> i32 {
        let (ux, uy) = self.delta();
        dx * ux + dy * uy
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct PieceId(pub u32);

impl std::fmt::Display for PieceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PieceError {
    #[error("a piece needs at least 2 cells, got {len}")]
    TooShort { len: usize },

    #[error("cells {index} and {next} are not one grid step apart", next = .index + 1)]
    NotAdjacent { index: usize },

    #[error("piece revisits cell ({x}, {y})")]
    Revisits { x: i32, y: i32 },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BoardError {
    #[error("malformed piece: {0}")]
    Malformed(#[from] PieceError),

    #[error("cell ({x}, {y}) lies outside the {cols}x{rows} board")]
    OutOfBounds { x: i32, y: i32, cols: i32, rows: i32 },

    #[error("cell ({x}, {y}) is already occupied by piece {occupant}")]
    Overlap { x: i32, y: i32, occupant: PieceId },

    #[error("no piece {0} on the board")]
    UnknownPiece(PieceId),

    #[error("piece {0} has no clear lane to the edge")]
    Blocked(PieceId),
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Piece {
    id: PieceId,
    direction: Direction,
    cells: Vec<Cell>,
    thickness: f64,
    color_seed: u32,
}

impl Piece {
    /// `cells` run head first.
    pub fn new(
        id: PieceId,
        direction: Direction,
        cells: Vec<Cell>,
        thickness: f64,
    ) -> Result<Self, PieceError> {
        validate_shape(&cells)?;
        Ok(Piece {
            id,
            direction,
            cells,
            thickness,
            color_seed: 0,
        })
    }

    pub fn with_color_seed(mut self, color_seed: u32) -> Self {
        self.color_seed = color_seed;
        self
    }

    pub fn id(&self) -> PieceId {
        self.id
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn head(&self) -> Cell {
        self.cells[0]
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn thickness(&self) -> f64 {
        self.thickness
    }

    pub fn color_seed(&self) -> u32 {
        self.color_seed
    }
}

pub fn validate_shape(cells: &[Cell]) -> Result<(), PieceError> {
    if cells.len() < 2 {
        return Err(PieceError::TooShort { len: cells.len() });
    }

    if let Some(index) = cells.windows(2).position(|w| !w[0].is_adjacent(w[1])) {
        return Err(PieceError::NotAdjacent { index });
    }

    let mut seen = std::collections::HashSet::with_capacity(cells.len());
    for cell in cells {
        if !seen.insert(*cell) {
            return Err(PieceError::Revisits {
                x: cell.x,
                y: cell.y,
            });
        }
    }

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BoardSettings {
    pub cols: i32,
    pub rows: i32,
    pub cell_size: f64,
}

impl Default for BoardSettings {
    fn default() -> Self {
        Self {
            cols: 30,
            rows: 20,
            cell_size: CELL_SIZE,
        }
    }
}

impl BoardSettings {
    pub fn normalized(self) -> Self {
        Self {
            cols: self.cols.max(1),
            rows: self.rows.max(1),
            cell_size: if self.cell_size > 0.0 {
                self.cell_size
            } else {
                CELL_SIZE
            },
        }
    }

    pub fn width(&self) -> f64 {
        self.cols as f64 * self.cell_size
    }

    pub fn height(&self) -> f64 {
        self.rows as f64 * self.cell_size
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.x < self.cols && cell.y >= 0 && cell.y < self.rows
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    settings: BoardSettings,
    pieces: Vec<Piece>,
    #[serde(skip)]
    occupancy: ndarray::Array2<Option<PieceId>>,
    #[serde(skip)]
    next_id: u32,
}

impl Board {
    pub fn new(settings: BoardSettings) -> Self {
        let settings = settings.normalized();
        Board {
            settings,
            pieces: vec![],
            occupancy: ndarray::Array2::from_elem(
                (settings.rows as usize, settings.cols as usize),
                None,
            ),
            next_id: 0,
        }
    }

    pub fn settings(&self) -> &BoardSettings {
        &self.settings
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    pub fn get(&self, id: PieceId) -> Option<&Piece> {
        self.pieces.iter().find(|p| p.id == id)
    }

    pub fn occupant(&self, cell: Cell) -> Option<PieceId> {
        if !self.settings.contains(cell) {
            return None;
        }
        self.occupancy[[cell.y as usize, cell.x as usize]]
    }

    /// The board is untouched on error.
    pub fn add(
        &mut self,
        direction: Direction,
        cells: Vec<Cell>,
        thickness: f64,
        color_seed: u32,
    ) -> Result<PieceId, BoardError> {
        let piece = Piece::new(PieceId(self.next_id), direction, cells, thickness)?
            .with_color_seed(color_seed);

        for cell in piece.cells() {
            if !self.settings.contains(*cell) {
                return Err(BoardError::OutOfBounds {
                    x: cell.x,
                    y: cell.y,
                    cols: self.settings.cols,
                    rows: self.settings.rows,
                });
            }
            if let Some(occupant) = self.occupant(*cell) {
                return Err(BoardError::Overlap {
                    x: cell.x,
                    y: cell.y,
                    occupant,
                });
            }
        }

        for cell in piece.cells() {
            self.occupancy[[cell.y as usize, cell.x as usize]] = Some(piece.id);
        }
        self.next_id += 1;

        let id = piece.id;
        self.pieces.push(piece);
        Ok(id)
    }

    pub fn remove(&mut self, id: PieceId) -> Result<Piece, BoardError> {
        let index = self
            .pieces
            .iter()
            .position(|p| p.id == id)
            .ok_or(BoardError::UnknownPiece(id))?;

        let piece = self.pieces.remove(index);
        for cell in piece.cells() {
            self.occupancy[[cell.y as usize, cell.x as usize]] = None;
        }
        Ok(piece)
    }
}
