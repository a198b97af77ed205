//! Extended SAN / LAN support.
//!
//! A move token is
//! `[stack-prefix][+][class][disambiguator][sep][destination][combine][check]`
//! with separators `x` (capture), `_` (stay capture), `@` (suicide),
//! `>` (deploy), `&` (combination) and `>x` for a deploy capture. `^` marks
//! check and `#` checkmate; the `+` glyph belongs to the heroic prefix.
//!
//! Parsing matches a token against the current legal-move list and fails
//! with an ambiguity error when several moves normalize to the same form.

use super::error::SanError;
use super::game::Game;
use super::make_unmake;
use super::movegen;
use super::types::{Move, MoveList, PieceType, Square};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Sep {
    Quiet,
    Capture,
    Stay,
    Suicide,
    Deploy,
    DeployCapture,
    Combine,
}

fn category(mv: &Move) -> Sep {
    if mv.is_combination() {
        Sep::Combine
    } else if mv.is_suicide() {
        Sep::Suicide
    } else if mv.is_stay_capture() {
        Sep::Stay
    } else if mv.is_capture() {
        if mv.is_deploy() {
            Sep::DeployCapture
        } else {
            Sep::Capture
        }
    } else if mv.is_deploy() {
        Sep::Deploy
    } else {
        Sep::Quiet
    }
}

struct SanParts {
    kind: PieceType,
    sep: Option<Sep>,
    dest: Square,
    origin: Option<Square>,
    disambig_file: Option<usize>,
    disambig_rank: Option<usize>,
}

impl SanParts {
    /// Strict pass: the separator must be the one canonical rendering
    /// would emit. Keeps `Nc5` (whole stack) and `N>c5` (deploy) apart.
    fn matches_strict(&self, mv: &Move) -> bool {
        let cat = category(mv);
        let sep_ok = match self.sep {
            None | Some(Sep::Quiet) => cat == Sep::Quiet,
            Some(sep) => cat == sep,
        };
        sep_ok && self.matches_target(mv)
    }

    /// Relaxed pass for tokens written without deploy/combination
    /// decoration, e.g. `Tc5` for a recombine inside a session.
    fn matches_relaxed(&self, mv: &Move) -> bool {
        let cat = category(mv);
        let sep_ok = match self.sep {
            None | Some(Sep::Quiet) => !mv.is_capture(),
            Some(Sep::Capture) => matches!(cat, Sep::Capture | Sep::DeployCapture),
            Some(Sep::Stay) => cat == Sep::Stay,
            Some(Sep::Suicide) => cat == Sep::Suicide,
            Some(Sep::Deploy) => mv.is_deploy() && !mv.is_capture(),
            Some(Sep::DeployCapture) => cat == Sep::DeployCapture,
            Some(Sep::Combine) => cat == Sep::Combine,
        };
        sep_ok && self.matches_target(mv)
    }

    fn matches_target(&self, mv: &Move) -> bool {
        if mv.piece.kind != self.kind || mv.to != self.dest {
            return false;
        }
        if let Some(origin) = self.origin {
            if mv.from != origin {
                return false;
            }
        }
        if let Some(file) = self.disambig_file {
            if mv.from.file() != file {
                return false;
            }
        }
        if let Some(rank) = self.disambig_rank {
            if mv.from.rank() != rank {
                return false;
            }
        }
        true
    }
}

fn parse_token(token: &str) -> Result<SanParts, SanError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(SanError::Empty);
    }

    // Strip check suffixes and a trailing combine suffix.
    let mut body = token.trim_end_matches(['^', '#']);
    if body.ends_with(')') {
        match body.rfind('(') {
            Some(open) => body = &body[..open],
            None => {
                return Err(SanError::InvalidSquare {
                    notation: token.to_string(),
                })
            }
        }
    }

    // Strip an optional stack prefix.
    let mut chars: Vec<char> = body.chars().collect();
    if chars.first() == Some(&'(') {
        match chars.iter().position(|&c| c == ')') {
            Some(close) => chars.drain(..=close),
            None => {
                return Err(SanError::InvalidSquare {
                    notation: token.to_string(),
                });
            }
        };
    }

    // Heroic prefix is informative only; matching goes through the legal
    // move list anyway.
    if chars.first() == Some(&'+') {
        chars.remove(0);
    }

    let Some(&class_char) = chars.first() else {
        return Err(SanError::Empty);
    };
    let kind = PieceType::from_char(class_char).ok_or(SanError::InvalidPiece { ch: class_char })?;
    let rest = &chars[1..];

    // Locate the separator.
    let mut sep = None;
    let mut sep_at = None;
    let mut sep_len = 1;
    for (i, &c) in rest.iter().enumerate() {
        let found = match c {
            'x' => Some(Sep::Capture),
            '_' => Some(Sep::Stay),
            '@' => Some(Sep::Suicide),
            '&' => Some(Sep::Combine),
            '-' => Some(Sep::Quiet),
            '>' => {
                if rest.get(i + 1) == Some(&'x') {
                    sep_len = 2;
                    Some(Sep::DeployCapture)
                } else {
                    Some(Sep::Deploy)
                }
            }
            _ => None,
        };
        if let Some(found) = found {
            sep = Some(found);
            sep_at = Some(i);
            break;
        }
    }

    let (pre, post): (&[char], &[char]) = match sep_at {
        Some(i) => (&rest[..i], &rest[i + sep_len..]),
        None => (&[], rest),
    };

    // Destination: trailing file letter plus one or two digits.
    let post_str: String = post.iter().collect();
    let (disambig_str, dest_str) = match sep_at {
        Some(_) => (pre.iter().collect::<String>(), post_str),
        None => split_trailing_square(&post_str).ok_or(SanError::InvalidSquare {
            notation: token.to_string(),
        })?,
    };
    let dest: Square = dest_str.parse().map_err(|_| SanError::InvalidSquare {
        notation: dest_str.clone(),
    })?;

    // Disambiguator: file letter, rank number or full origin square.
    let mut origin = None;
    let mut disambig_file = None;
    let mut disambig_rank = None;
    if !disambig_str.is_empty() {
        if let Ok(sq) = disambig_str.parse::<Square>() {
            origin = Some(sq);
        } else if disambig_str.len() == 1 {
            let c = disambig_str.chars().next().expect("len checked");
            match c {
                'a'..='k' => disambig_file = Some(c as usize - 'a' as usize),
                '1'..='9' => disambig_rank = Some(c as usize - '1' as usize),
                _ => {
                    return Err(SanError::InvalidSquare {
                        notation: token.to_string(),
                    })
                }
            }
        } else if let Ok(rank) = disambig_str.parse::<usize>() {
            if rank < 1 || rank > 12 {
                return Err(SanError::InvalidSquare {
                    notation: token.to_string(),
                });
            }
            disambig_rank = Some(rank - 1);
        } else {
            return Err(SanError::InvalidSquare {
                notation: token.to_string(),
            });
        }
    }

    Ok(SanParts {
        kind,
        sep,
        dest,
        origin,
        disambig_file,
        disambig_rank,
    })
}

/// Class letter and explicit origin (LAN only) of a well-formed token.
/// Used by the game controller to classify rejected moves while a deploy
/// session is active.
pub(crate) fn token_query(token: &str) -> Option<(PieceType, Option<Square>)> {
    parse_token(token).ok().map(|parts| (parts.kind, parts.origin))
}

/// Split `"c10"` off the end of `"ac10"`-style strings.
fn split_trailing_square(s: &str) -> Option<(String, String)> {
    let chars: Vec<char> = s.chars().collect();
    let mut digits = 0;
    while digits < chars.len() && chars[chars.len() - 1 - digits].is_ascii_digit() {
        digits += 1;
    }
    if digits == 0 || digits > 2 || digits == chars.len() {
        return None;
    }
    let file_at = chars.len() - 1 - digits;
    if !matches!(chars[file_at], 'a'..='k') {
        return None;
    }
    let dest: String = chars[file_at..].iter().collect();
    let pre: String = chars[..file_at].iter().collect();
    Some((pre, dest))
}

impl Game {
    /// Match a SAN/LAN token against a legal-move list: first with the
    /// canonical separator reading, then leniently for undecorated
    /// deploy/combination tokens.
    pub(crate) fn match_san(&self, token: &str, legal: &MoveList) -> Result<Move, SanError> {
        let parts = parse_token(token)?;
        for pass in [
            SanParts::matches_strict as fn(&SanParts, &Move) -> bool,
            SanParts::matches_relaxed,
        ] {
            let mut matches = legal.iter().filter(|mv| pass(&parts, mv));
            let Some(first) = matches.next() else {
                continue;
            };
            if matches.next().is_some() {
                return Err(SanError::AmbiguousMove {
                    san: token.to_string(),
                });
            }
            return Ok(*first);
        }
        Err(SanError::NoMatchingMove {
            san: token.to_string(),
        })
    }

    /// Parse a SAN token against the current legal moves without playing it.
    pub fn parse_san(&self, token: &str) -> Result<Move, SanError> {
        self.match_san(token, &self.legal_moves())
    }

    /// Format a move in extended SAN.
    #[must_use]
    pub fn move_to_san(&self, mv: &Move) -> String {
        self.render(mv, false)
    }

    /// Format a move in extended LAN (origin square always present).
    #[must_use]
    pub fn move_to_lan(&self, mv: &Move) -> String {
        self.render(mv, true)
    }

    fn render(&self, mv: &Move, lan: bool) -> String {
        let mut out = String::new();
        if mv.piece.heroic {
            out.push('+');
        }
        out.push(mv.piece.kind.to_fen_char(mv.piece.color));

        if lan {
            out.push_str(&mv.from.to_string());
        } else {
            self.push_disambiguator(&mut out, mv);
        }

        let sep = match category(mv) {
            Sep::Quiet => {
                if lan {
                    "-"
                } else {
                    ""
                }
            }
            Sep::Capture => "x",
            Sep::Stay => "_",
            Sep::Suicide => "@",
            Sep::Deploy => ">",
            Sep::DeployCapture => ">x",
            Sep::Combine => "&",
        };
        out.push_str(sep);
        out.push_str(&mv.to.to_string());

        if mv.is_combination() {
            out.push_str(&self.combine_suffix(mv));
        }
        out.push_str(&self.check_suffix(mv));
        out
    }

    /// File, rank or full-square disambiguator: prefer the file, fall back
    /// to the rank, then to the origin square.
    fn push_disambiguator(&self, out: &mut String, mv: &Move) {
        let legal = self.legal_moves();
        let cat = category(mv);
        let rivals: Vec<&Move> = legal
            .iter()
            .filter(|m| {
                m.piece.kind == mv.piece.kind
                    && m.to == mv.to
                    && category(m) == cat
                    && m.from != mv.from
            })
            .collect();
        if rivals.is_empty() {
            return;
        }
        let same_file = rivals.iter().any(|m| m.from.file() == mv.from.file());
        let same_rank = rivals.iter().any(|m| m.from.rank() == mv.from.rank());
        match (same_file, same_rank) {
            (false, _) => out.push((b'a' + mv.from.file() as u8) as char),
            (true, false) => out.push_str(&(mv.from.rank() + 1).to_string()),
            (true, true) => out.push_str(&mv.from.to_string()),
        }
    }

    /// Stack composition produced by a combination, e.g. `(TI)`.
    fn combine_suffix(&self, mv: &Move) -> String {
        let mut scratch = self.position().clone();
        let actions = make_unmake::lower_move(&scratch, mv);
        make_unmake::apply_actions(&mut scratch, &actions);
        let mut suffix = String::from("(");
        for piece in scratch.group_at(mv.to) {
            if piece.heroic {
                suffix.push('+');
            }
            suffix.push(piece.kind.to_fen_char(piece.color));
        }
        suffix.push(')');
        make_unmake::revert_actions(&mut scratch, &actions);
        suffix
    }

    /// `^` when the move gives check, `#` when it mates.
    fn check_suffix(&self, mv: &Move) -> String {
        let mover = mv.piece.color;
        let mut probe = self.clone();
        probe.apply_move_unchecked(*mv, String::new());

        let Some(cmd_sq) = probe.position().commander_square(mover.opponent()) else {
            return String::new();
        };
        let checked = movegen::square_attacked_by(
            probe.position(),
            probe.air_defense(),
            cmd_sq,
            mover,
        );
        if !checked {
            return String::new();
        }
        // Mate only exists once the turn has actually passed.
        if probe.turn() == mover.opponent() && probe.legal_moves().is_empty() {
            "#".to_string()
        } else {
            "^".to_string()
        }
    }
}
