//! ASCII board view for quick terminal review of headless matches.
//!
//! Each cell is two characters wide: a glyph for the unit kind (uppercase
//! for player zero, lowercase for player one) and a marker. `~` marks a
//! construction site, `!` a unit carrying status effects. Empty objective
//! cells show as `*`.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use tactics_core::board::Board;
use tactics_core::data::UnitCatalog;
use tactics_core::grid::Coord;
use tactics_core::player::PlayerId;
use tactics_core::unit::Unit;

/// ASCII visualization configuration.
#[derive(Debug, Clone)]
pub struct AsciiConfig {
    /// Show the turn, funds and glyph legend under the board.
    pub show_legend: bool,
    /// Use colored output (ANSI).
    pub use_color: bool,
}

impl Default for AsciiConfig {
    fn default() -> Self {
        Self {
            show_legend: true,
            use_color: false,
        }
    }
}

const RESET: &str = "\x1b[0m";

fn player_color(player: PlayerId) -> &'static str {
    match player {
        PlayerId::Zero => "\x1b[34m",
        PlayerId::One => "\x1b[31m",
    }
}

/// Pick a distinct letter for every kind, in catalog order.
///
/// Each kind takes the first letter of its name not already claimed;
/// kinds that run out of letters fall back to `?`.
pub fn glyphs(catalog: &UnitCatalog) -> BTreeMap<String, char> {
    let mut taken = Vec::new();
    let mut map = BTreeMap::new();
    for data in catalog.iter() {
        let glyph = data
            .name
            .chars()
            .filter(char::is_ascii_alphabetic)
            .map(|c| c.to_ascii_uppercase())
            .find(|c| !taken.contains(c))
            .unwrap_or('?');
        if glyph != '?' {
            taken.push(glyph);
        }
        map.insert(data.name.clone(), glyph);
    }
    map
}

fn cell_text(unit: &Unit, glyphs: &BTreeMap<String, char>) -> (char, char) {
    let glyph = glyphs.get(unit.name()).copied().unwrap_or('?');
    let glyph = match unit.owner() {
        PlayerId::Zero => glyph,
        PlayerId::One => glyph.to_ascii_lowercase(),
    };
    let marker = if unit.is_under_construction() {
        '~'
    } else if !unit.statuses().is_empty() {
        '!'
    } else {
        ' '
    };
    (glyph, marker)
}

/// Render the board as text, row 0 at the top.
pub fn render_board(board: &Board, config: &AsciiConfig) -> String {
    let glyphs = glyphs(board.catalog());
    let grid = board.grid();
    let mut out = String::new();

    out.push_str("   ");
    for x in 0..grid.width() {
        let _ = write!(out, "{:<2}", x % 10);
    }
    out.push('\n');

    for y in 0..grid.height() {
        let _ = write!(out, "{y:>2} ");
        for x in 0..grid.width() {
            let coord = Coord::new(x, y);
            match grid.get(coord) {
                Some(unit) => {
                    let (glyph, marker) = cell_text(unit, &glyphs);
                    if config.use_color {
                        let _ = write!(out, "{}{glyph}{marker}{RESET}", player_color(unit.owner()));
                    } else {
                        let _ = write!(out, "{glyph}{marker}");
                    }
                }
                None if board.is_objective(coord) => out.push_str("* "),
                None => out.push_str(". "),
            }
        }
        out.push('\n');
    }

    if config.show_legend {
        let _ = writeln!(
            out,
            "turn {} ({:?} to act)  funds {} / {}  units {} / {}",
            board.turn(),
            board.acting(),
            board.player(PlayerId::Zero).funds,
            board.player(PlayerId::One).funds,
            grid.units_of(PlayerId::Zero).count(),
            grid.units_of(PlayerId::One).count(),
        );
        let legend: Vec<String> = glyphs
            .iter()
            .map(|(kind, glyph)| format!("{glyph}={kind}"))
            .collect();
        let _ = writeln!(out, "{}", legend.join(" "));
    }

    out
}
