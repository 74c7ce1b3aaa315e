//! PGN movetext rendering and lenient parsing.

use std::fmt::Write;

/// Tokens that terminate a game record.
const RESULTS: [&str; 4] = ["1-0", "0-1", "1/2-1/2", "*"];

/// Moves and setup extracted from PGN text.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct MoveText {
    /// Value of the `[FEN "..."]` header, if present.
    pub fen: Option<String>,
    /// Mainline moves in SAN, in order.
    pub moves: Vec<String>,
}

/// Parse PGN text into its FEN header and mainline SAN moves.
///
/// Tag pairs other than `FEN`, comments (`{...}` and `;` to end of line),
/// variations, NAGs, annotation glyphs, move numbers and result tokens are
/// skipped. Both `1. e4` and the compact `1.e4` forms are accepted.
pub(crate) fn parse_movetext(text: &str) -> MoveText {
    let mut fen = None;
    let mut cleaned = String::with_capacity(text.len());
    let mut chars = text.chars();
    let mut variation_depth = 0usize;

    while let Some(c) = chars.next() {
        match c {
            '{' => {
                for c in chars.by_ref() {
                    if c == '}' {
                        break;
                    }
                }
                cleaned.push(' ');
            }
            ';' => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
                cleaned.push(' ');
            }
            '(' => {
                variation_depth += 1;
                cleaned.push(' ');
            }
            ')' => {
                variation_depth = variation_depth.saturating_sub(1);
                cleaned.push(' ');
            }
            '[' if variation_depth == 0 => {
                let tag: String = chars.by_ref().take_while(|&c| c != ']').collect();
                if let Some(value) = tag_value(&tag, "FEN") {
                    fen = Some(value);
                }
                cleaned.push(' ');
            }
            _ if variation_depth > 0 => {}
            _ => cleaned.push(c),
        }
    }

    let moves = cleaned
        .split_whitespace()
        .filter_map(move_token)
        .map(normalize_castling)
        .collect();

    MoveText { fen, moves }
}

/// Return the value of a `Key "Value"` tag pair if its key is `key`.
fn tag_value(tag: &str, key: &str) -> Option<String> {
    let (name, value) = tag.trim().split_once(char::is_whitespace)?;
    if name != key {
        return None;
    }
    let value = value.trim().trim_matches('"');
    (!value.is_empty()).then(|| value.to_string())
}

/// Reduce a whitespace-separated token to a move, or `None` if it is not one.
fn move_token(token: &str) -> Option<&str> {
    if RESULTS.contains(&token) || token.starts_with('$') {
        return None;
    }
    let token = match token.rfind('.') {
        Some(i) if token[..i].chars().all(|c| c.is_ascii_digit() || c == '.') => &token[i + 1..],
        _ => token,
    };
    let token = token.trim_end_matches(['!', '?']);
    if token.is_empty() || token.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(token)
}

/// Accept zero-style castling (`0-0`, `0-0-0`) as written by some tools.
fn normalize_castling(token: &str) -> String {
    if token.starts_with("0-0") {
        token.replace('0', "O")
    } else {
        token.to_string()
    }
}

/// Render movetext such as `1. e4 e5 2. Nf3`.
///
/// `fullmove` and `white_to_move` describe the position the first move is
/// played from, so a record starting with Black reads `1... e5`.
pub(crate) fn render_movetext<'a>(
    sans: impl IntoIterator<Item = &'a str>,
    mut fullmove: u32,
    mut white_to_move: bool,
) -> String {
    let mut out = String::new();
    for (i, san) in sans.into_iter().enumerate() {
        if !out.is_empty() {
            out.push(' ');
        }
        if white_to_move {
            let _ = write!(out, "{fullmove}. ");
        } else if i == 0 {
            let _ = write!(out, "{fullmove}... ");
        }
        out.push_str(san);
        if !white_to_move {
            fullmove += 1;
        }
        white_to_move = !white_to_move;
    }
    out
}

/// Tighten the spacing around move-number dots: `1. e4` becomes `1.e4`.
pub(crate) fn compact(pgn: &str) -> String {
    let mut out = String::with_capacity(pgn.len());
    let mut skip_space = false;
    for c in pgn.chars() {
        match c {
            '.' => {
                if out.ends_with(' ') {
                    out.pop();
                }
                out.push('.');
                skip_space = true;
            }
            ' ' if skip_space => skip_space = false,
            _ => {
                skip_space = false;
                out.push(c);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_spaced_movetext() {
        let text = parse_movetext("1. e4 e5 2. Nf3 Nc6 3. Bb5");
        assert_eq!(text.moves, ["e4", "e5", "Nf3", "Nc6", "Bb5"]);
        assert_eq!(text.fen, None);
    }

    #[test]
    fn parse_compact_movetext() {
        let text = parse_movetext("1.e4 c5 2.Nf3 d6");
        assert_eq!(text.moves, ["e4", "c5", "Nf3", "d6"]);
    }

    #[test]
    fn parse_skips_comments_variations_and_results() {
        let text = parse_movetext(
            "1. e4 {best by test} e5 (1... c5 2. Nf3) 2. Nf3! $1 Nc6?! ; main line\n3. Bb5 1-0",
        );
        assert_eq!(text.moves, ["e4", "e5", "Nf3", "Nc6", "Bb5"]);
    }

    #[test]
    fn parse_reads_fen_header() {
        let text = parse_movetext(
            "[Event \"Casual\"]\n[SetUp \"1\"]\n[FEN \"8/8/8/4k3/8/8/4P3/4K3 w - - 0 1\"]\n\n1. e4 *",
        );
        assert_eq!(text.fen.as_deref(), Some("8/8/8/4k3/8/8/4P3/4K3 w - - 0 1"));
        assert_eq!(text.moves, ["e4"]);
    }

    #[test]
    fn parse_black_first_move_number() {
        let text = parse_movetext("12... Qd7 13. O-O");
        assert_eq!(text.moves, ["Qd7", "O-O"]);
    }

    #[test]
    fn parse_zero_castling() {
        let text = parse_movetext("1. 0-0-0");
        assert_eq!(text.moves, ["O-O-O"]);
    }

    #[test]
    fn render_from_white() {
        assert_eq!(render_movetext(["e4", "e5", "Nf3"], 1, true), "1. e4 e5 2. Nf3");
    }

    #[test]
    fn render_from_black() {
        assert_eq!(render_movetext(["e5", "Nf3", "Nc6"], 1, false), "1... e5 2. Nf3 Nc6");
    }

    #[test]
    fn render_empty() {
        assert_eq!(render_movetext(Vec::<&str>::new(), 1, true), "");
    }

    #[test]
    fn compact_tightens_dots() {
        assert_eq!(compact("1. e4 e5 2. Nf3"), "1.e4 e5 2.Nf3");
        assert_eq!(compact("1... e5 2. Nf3"), "1...e5 2.Nf3");
    }
}
