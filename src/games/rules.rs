//! Per-game strategy layer: board shapes, move legality, and win detection
//! for the two bundled two-player games.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Rows on the drop-piece board.
pub const DROP_ROWS: usize = 6;
/// Columns on the drop-piece board.
pub const DROP_COLS: usize = 7;
/// Cells on the grid board.
pub const GRID_CELLS: usize = 9;

/// The two bundled game types, identified on the wire by their slug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum GameKind {
    /// 3x3 grid game, tokens X and O.
    #[serde(rename = "tic-tac-toe")]
    TicTacToe,
    /// 7x6 drop-piece game, tokens Red and Yellow.
    #[serde(rename = "connect-four")]
    ConnectFour,
}

impl GameKind {
    /// Wire slug for this game type.
    pub fn slug(&self) -> &'static str {
        match self {
            GameKind::TicTacToe => "tic-tac-toe",
            GameKind::ConnectFour => "connect-four",
        }
    }

    /// Strategy implementation for this game type.
    pub fn rules(&self) -> &'static dyn GameRules {
        match self {
            GameKind::TicTacToe => &TicTacToe,
            GameKind::ConnectFour => &ConnectFour,
        }
    }
}

impl std::fmt::Display for GameKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

/// Which of the two seats a piece belongs to. The first seat always owns the
/// opening token (X or Red) and is held by the inviter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// Seat of the inviter (X / Red), moves first.
    First,
    /// Seat of the accepter (O / Yellow).
    Second,
}

impl Token {
    /// The opposing seat.
    pub fn other(&self) -> Token {
        match self {
            Token::First => Token::Second,
            Token::Second => Token::First,
        }
    }
}

/// Terminal result of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// One seat completed a winning line.
    Won(Token),
    /// The board filled with no winning line.
    Tie,
}

/// Board storage for either game type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Board {
    /// Flat 9-cell grid, row-major.
    Grid([Option<Token>; GRID_CELLS]),
    /// Drop-piece board as rows top to bottom; row 5 is the bottom.
    Drop([[Option<Token>; DROP_COLS]; DROP_ROWS]),
}

/// A player's chosen move target, interpreted per game type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveSlot {
    /// Grid cell index, 0..9.
    Cell(usize),
    /// Drop column index, 0..7; the piece settles on the lowest empty row.
    Column(usize),
}

/// Strategy interface a game type plugs into the shared session lifecycle.
pub trait GameRules: Send + Sync {
    /// Empty board for a fresh session.
    fn initial_board(&self) -> Board;
    /// Apply `token`'s move at `slot`, returning false (board untouched) when
    /// the slot is illegal for this game type or already taken.
    fn apply_move(&self, board: &mut Board, token: Token, slot: MoveSlot) -> bool;
    /// Scan the board for a finished game.
    fn check_winner(&self, board: &Board) -> Option<Outcome>;
    /// Wire label for a seat's token ("X"/"O" or "Red"/"Yellow").
    fn token_label(&self, token: Token) -> &'static str;
}

/// Rules for the 3x3 grid game.
pub struct TicTacToe;

/// The 8 winning lines: 3 rows, 3 columns, 2 diagonals.
const GRID_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

impl GameRules for TicTacToe {
    fn initial_board(&self) -> Board {
        Board::Grid([None; GRID_CELLS])
    }

    fn apply_move(&self, board: &mut Board, token: Token, slot: MoveSlot) -> bool {
        let Board::Grid(cells) = board else {
            return false;
        };
        let MoveSlot::Cell(index) = slot else {
            return false;
        };
        match cells.get_mut(index) {
            Some(cell @ None) => {
                *cell = Some(token);
                true
            }
            _ => false,
        }
    }

    fn check_winner(&self, board: &Board) -> Option<Outcome> {
        let Board::Grid(cells) = board else {
            return None;
        };
        for [a, b, c] in GRID_LINES {
            if let Some(token) = cells[a]
                && cells[b] == Some(token)
                && cells[c] == Some(token)
            {
                return Some(Outcome::Won(token));
            }
        }
        if cells.iter().all(Option::is_some) {
            return Some(Outcome::Tie);
        }
        None
    }

    fn token_label(&self, token: Token) -> &'static str {
        match token {
            Token::First => "X",
            Token::Second => "O",
        }
    }
}

/// Rules for the 7x6 drop-piece game.
pub struct ConnectFour;

impl GameRules for ConnectFour {
    fn initial_board(&self) -> Board {
        Board::Drop([[None; DROP_COLS]; DROP_ROWS])
    }

    fn apply_move(&self, board: &mut Board, token: Token, slot: MoveSlot) -> bool {
        let Board::Drop(rows) = board else {
            return false;
        };
        let MoveSlot::Column(col) = slot else {
            return false;
        };
        if col >= DROP_COLS {
            return false;
        }
        // Gravity: the piece settles on the lowest empty row of the column.
        for row in (0..DROP_ROWS).rev() {
            if rows[row][col].is_none() {
                rows[row][col] = Some(token);
                return true;
            }
        }
        false
    }

    fn check_winner(&self, board: &Board) -> Option<Outcome> {
        let Board::Drop(rows) = board else {
            return None;
        };

        let runs: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (-1, 1)];
        for row in 0..DROP_ROWS as isize {
            for col in 0..DROP_COLS as isize {
                let Some(token) = rows[row as usize][col as usize] else {
                    continue;
                };
                for (dr, dc) in runs {
                    let (end_r, end_c) = (row + 3 * dr, col + 3 * dc);
                    if !(0..DROP_ROWS as isize).contains(&end_r)
                        || !(0..DROP_COLS as isize).contains(&end_c)
                    {
                        continue;
                    }
                    if (1..4).all(|step| {
                        rows[(row + step * dr) as usize][(col + step * dc) as usize] == Some(token)
                    }) {
                        return Some(Outcome::Won(token));
                    }
                }
            }
        }

        if rows.iter().flatten().all(Option::is_some) {
            return Some(Outcome::Tie);
        }
        None
    }

    fn token_label(&self, token: Token) -> &'static str {
        match token {
            Token::First => "Red",
            Token::Second => "Yellow",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_move_rejects_taken_cell() {
        let rules = TicTacToe;
        let mut board = rules.initial_board();
        assert!(rules.apply_move(&mut board, Token::First, MoveSlot::Cell(4)));
        assert!(!rules.apply_move(&mut board, Token::Second, MoveSlot::Cell(4)));
        assert!(!rules.apply_move(&mut board, Token::Second, MoveSlot::Cell(9)));
    }

    #[test]
    fn grid_top_row_wins() {
        let rules = TicTacToe;
        let mut board = rules.initial_board();
        for (index, token) in [
            (0, Token::First),
            (4, Token::Second),
            (1, Token::First),
            (8, Token::Second),
            (2, Token::First),
        ] {
            assert!(rules.apply_move(&mut board, token, MoveSlot::Cell(index)));
        }
        assert_eq!(rules.check_winner(&board), Some(Outcome::Won(Token::First)));
    }

    #[test]
    fn grid_full_board_without_line_is_tie() {
        let rules = TicTacToe;
        // X O X / X O O / O X X: no three-in-a-row anywhere.
        let layout = [
            Token::First,
            Token::Second,
            Token::First,
            Token::First,
            Token::Second,
            Token::Second,
            Token::Second,
            Token::First,
            Token::First,
        ];
        let board = Board::Grid(layout.map(Some));
        assert_eq!(rules.check_winner(&board), Some(Outcome::Tie));
    }

    #[test]
    fn drop_piece_settles_on_lowest_empty_row() {
        let rules = ConnectFour;
        let mut board = rules.initial_board();
        assert!(rules.apply_move(&mut board, Token::First, MoveSlot::Column(3)));
        assert!(rules.apply_move(&mut board, Token::Second, MoveSlot::Column(3)));

        let Board::Drop(rows) = &board else {
            panic!("expected drop board");
        };
        assert_eq!(rows[DROP_ROWS - 1][3], Some(Token::First));
        assert_eq!(rows[DROP_ROWS - 2][3], Some(Token::Second));
    }

    #[test]
    fn drop_piece_rejects_full_column() {
        let rules = ConnectFour;
        let mut board = rules.initial_board();
        for step in 0..DROP_ROWS {
            let token = if step % 2 == 0 {
                Token::First
            } else {
                Token::Second
            };
            assert!(rules.apply_move(&mut board, token, MoveSlot::Column(0)));
        }
        assert!(!rules.apply_move(&mut board, Token::First, MoveSlot::Column(0)));
    }

    #[test]
    fn drop_piece_vertical_run_wins() {
        let rules = ConnectFour;
        let mut board = rules.initial_board();
        for _ in 0..4 {
            assert!(rules.apply_move(&mut board, Token::Second, MoveSlot::Column(6)));
        }
        assert_eq!(
            rules.check_winner(&board),
            Some(Outcome::Won(Token::Second))
        );
    }

    #[test]
    fn drop_piece_up_right_diagonal_wins() {
        let rules = ConnectFour;
        let mut rows = [[None; DROP_COLS]; DROP_ROWS];
        // Diagonal from the bottom-left corner going up-right.
        for step in 0..4 {
            rows[DROP_ROWS - 1 - step][step] = Some(Token::First);
        }
        let board = Board::Drop(rows);
        assert_eq!(rules.check_winner(&board), Some(Outcome::Won(Token::First)));
    }

    #[test]
    fn drop_piece_full_board_without_run_is_tie() {
        let rules = ConnectFour;
        // Token chosen by (col + 2*row) mod 4: every horizontal, vertical,
        // and diagonal walk cycles through residues fast enough that no
        // direction can string four equal tokens together.
        let mut rows = [[None; DROP_COLS]; DROP_ROWS];
        for (row, row_cells) in rows.iter_mut().enumerate() {
            for (col, cell) in row_cells.iter_mut().enumerate() {
                let first = matches!((col + 2 * row) % 4, 0 | 1);
                *cell = Some(if first { Token::First } else { Token::Second });
            }
        }
        let board = Board::Drop(rows);
        assert_eq!(rules.check_winner(&board), Some(Outcome::Tie));
    }
}
