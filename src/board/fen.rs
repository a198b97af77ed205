//! Extended FEN read and write.
//!
//! Six whitespace-separated fields (placement, active color, two reserved
//! `-` fields, halfmove clock, fullmove number) plus an optional
//! `DEPLOY <origin>:<entries>` suffix while a deploy session is active.
//!
//! Placement runs rank 12 down to rank 1, eleven columns per segment.
//! `+` marks a heroic piece, `(…)` a stack with the carrier first.

use std::iter::Peekable;
use std::str::Chars;

use super::deploy::{DeployEntry, DeploySession};
use super::error::FenError;
use super::position::Position;
use super::types::{Color, Piece, PieceType, Square, NUM_FILES, NUM_RANKS};

/// Everything a FEN string describes.
pub(crate) struct FenFields {
    pub position: Position,
    pub turn: Color,
    pub halfmove: u32,
    pub fullmove: u32,
    pub session: Option<DeploySession>,
}

pub(crate) fn parse_fen(fen: &str) -> Result<FenFields, FenError> {
    let parts: Vec<&str> = fen.split_whitespace().collect();
    if parts.len() < 6 {
        return Err(FenError::TooFewFields { found: parts.len() });
    }

    let mut position = Position::empty();

    let segments: Vec<&str> = parts[0].split('/').collect();
    if segments.len() != NUM_RANKS {
        return Err(FenError::BadRankCount {
            found: segments.len(),
        });
    }
    for (i, segment) in segments.iter().enumerate() {
        let rank = NUM_RANKS - 1 - i;
        parse_rank_segment(&mut position, segment, rank, i)?;
    }

    let turn = match parts[1] {
        "r" => Color::Red,
        "b" => Color::Blue,
        other => {
            return Err(FenError::InvalidSideToMove {
                found: other.to_string(),
            })
        }
    };

    // parts[2] and parts[3] are the reserved castling / en-passant fields.

    let halfmove: u32 = parts[4].parse().map_err(|_| FenError::InvalidCounter {
        field: parts[4].to_string(),
    })?;
    let fullmove: u32 = parts[5].parse().map_err(|_| FenError::InvalidCounter {
        field: parts[5].to_string(),
    })?;
    if fullmove == 0 {
        return Err(FenError::InvalidCounter {
            field: parts[5].to_string(),
        });
    }

    let session = if parts.len() > 6 {
        if parts[6] != "DEPLOY" || parts.len() != 8 {
            return Err(FenError::InvalidDeploy {
                reason: format!("unexpected trailing fields '{}'", parts[6..].join(" ")),
            });
        }
        Some(parse_deploy_suffix(&position, turn, parts[7])?)
    } else {
        None
    };

    Ok(FenFields {
        position,
        turn,
        halfmove,
        fullmove,
        session,
    })
}

fn parse_rank_segment(
    position: &mut Position,
    segment: &str,
    rank: usize,
    segment_idx: usize,
) -> Result<(), FenError> {
    let mut file = 0usize;
    let mut chars = segment.chars().peekable();

    while let Some(c) = chars.next() {
        if let Some(d) = c.to_digit(10) {
            let mut run = d as usize;
            if let Some(next) = chars.peek().and_then(|c| c.to_digit(10)) {
                let combined = run * 10 + next as usize;
                if combined <= NUM_FILES {
                    run = combined;
                    chars.next();
                }
            }
            file += run;
            continue;
        }

        if file >= NUM_FILES {
            return Err(FenError::BadRankWidth {
                rank: segment_idx,
                files: file + 1,
            });
        }
        let sq = Square::new(rank, file);

        if c == '(' {
            let mut group = Vec::new();
            loop {
                match chars.peek() {
                    None => return Err(FenError::UnmatchedParen { rank: segment_idx }),
                    Some(')') => {
                        chars.next();
                        break;
                    }
                    Some(_) => {
                        let c = chars.next().expect("peeked");
                        group.push(parse_piece(c, &mut chars, segment_idx)?);
                    }
                }
            }
            if group.is_empty() {
                return Err(FenError::UnmatchedParen { rank: segment_idx });
            }
            let carrier = group.remove(0);
            position.place(carrier, &group, sq)?;
        } else if c == ')' {
            return Err(FenError::UnmatchedParen { rank: segment_idx });
        } else {
            let piece = parse_piece(c, &mut chars, segment_idx)?;
            position.place(piece, &[], sq)?;
        }
        file += 1;
    }

    if file != NUM_FILES {
        return Err(FenError::BadRankWidth {
            rank: segment_idx,
            files: file,
        });
    }
    Ok(())
}

/// Parse one `[+]letter` token, `first` being the character already taken.
fn parse_piece(
    first: char,
    chars: &mut Peekable<Chars<'_>>,
    segment_idx: usize,
) -> Result<Piece, FenError> {
    let (heroic, letter) = if first == '+' {
        match chars.next() {
            Some(c) => (true, c),
            None => return Err(FenError::DanglingHeroicMarker { rank: segment_idx }),
        }
    } else {
        (false, first)
    };
    let kind = PieceType::from_char(letter).ok_or(FenError::InvalidPiece { ch: letter })?;
    let color = if letter.is_ascii_uppercase() {
        Color::Red
    } else {
        Color::Blue
    };
    Ok(Piece {
        kind,
        color,
        heroic,
    })
}

fn parse_deploy_suffix(
    position: &Position,
    turn: Color,
    suffix: &str,
) -> Result<DeploySession, FenError> {
    let (origin_str, entries_str) = suffix.split_once(':').ok_or_else(|| FenError::InvalidDeploy {
        reason: format!("missing ':' in '{suffix}'"),
    })?;
    let origin: Square = origin_str.parse().map_err(|_| FenError::InvalidDeploy {
        reason: format!("bad origin square '{origin_str}'"),
    })?;

    let mut entries: Vec<DeployEntry> = Vec::new();
    let mut saw_remaining = false;

    for token in entries_str.split(',') {
        if token.is_empty() {
            return Err(FenError::InvalidDeploy {
                reason: "empty entry".to_string(),
            });
        }
        if saw_remaining {
            return Err(FenError::InvalidDeploy {
                reason: "remaining-stack marker must come last".to_string(),
            });
        }

        let mut chars = token.chars().peekable();
        let first = chars.next().expect("non-empty token");

        if first == '(' {
            // Remaining members, cross-checked against the board below.
            saw_remaining = true;
            continue;
        }

        let (heroic, letter) = if first == '+' {
            match chars.next() {
                Some(c) => (true, c),
                None => {
                    return Err(FenError::InvalidDeploy {
                        reason: format!("dangling '+' in '{token}'"),
                    })
                }
            }
        } else {
            (false, first)
        };
        let kind = PieceType::from_char(letter).ok_or(FenError::InvalidPiece { ch: letter })?;
        let color = if letter.is_ascii_uppercase() {
            Color::Red
        } else {
            Color::Blue
        };
        if color != turn {
            return Err(FenError::InvalidDeploy {
                reason: format!("entry '{token}' does not belong to the side to move"),
            });
        }

        if chars.peek().is_none() {
            // A bare letter is the single remaining member.
            saw_remaining = true;
            continue;
        }

        let (stayed, capture) = match chars.peek() {
            Some('x') => {
                chars.next();
                (false, true)
            }
            Some('_') => {
                chars.next();
                (true, true)
            }
            _ => (false, false),
        };

        let square_str: String = chars.collect();
        let to: Square = square_str.parse().map_err(|_| FenError::InvalidDeploy {
            reason: format!("bad destination in '{token}'"),
        })?;

        entries.push(DeployEntry {
            kind,
            heroic,
            to,
            stayed,
            capture,
        });
    }

    let origin_group = position.group_at(origin);
    // An active session always keeps at least one member on the origin
    // (the turn auto-commits otherwise).
    if origin_group.is_empty() {
        return Err(FenError::InvalidDeploy {
            reason: format!("origin {origin} is empty"),
        });
    }
    if origin_group
        .first()
        .is_some_and(|carrier| carrier.color != turn)
    {
        return Err(FenError::InvalidDeploy {
            reason: format!("origin {origin} is not held by the side to move"),
        });
    }

    // Reconstruct the opening snapshot: current members plus everyone who
    // left. The start FEN is unknown, so this session cannot be cancelled.
    let mut original = origin_group;
    for entry in &entries {
        if !entry.stayed && !original.iter().any(|p| p.kind == entry.kind) {
            original.push(Piece {
                kind: entry.kind,
                color: turn,
                heroic: entry.heroic,
            });
        }
    }

    let mut session = DeploySession::new(origin, turn, original, None);
    for entry in entries {
        session.record_entry(entry);
    }
    Ok(session)
}

pub(crate) fn render_fen(
    position: &Position,
    turn: Color,
    halfmove: u32,
    fullmove: u32,
    session: Option<&DeploySession>,
) -> String {
    let mut rows: Vec<String> = Vec::with_capacity(NUM_RANKS);
    for rank in (0..NUM_RANKS).rev() {
        let mut row = String::new();
        let mut empty = 0usize;
        for file in 0..NUM_FILES {
            let sq = Square::new(rank, file);
            match position.piece_at(sq) {
                None => empty += 1,
                Some(carrier) => {
                    if empty > 0 {
                        row.push_str(&empty.to_string());
                        empty = 0;
                    }
                    let carried = position.carried_at(sq);
                    if carried.is_empty() {
                        push_piece(&mut row, carrier);
                    } else {
                        row.push('(');
                        push_piece(&mut row, carrier);
                        for cargo in carried {
                            push_piece(&mut row, *cargo);
                        }
                        row.push(')');
                    }
                }
            }
        }
        if empty > 0 {
            row.push_str(&empty.to_string());
        }
        rows.push(row);
    }

    let active = match turn {
        Color::Red => "r",
        Color::Blue => "b",
    };
    let mut fen = format!(
        "{} {} - - {} {}",
        rows.join("/"),
        active,
        halfmove,
        fullmove
    );

    if let Some(session) = session {
        fen.push_str(" DEPLOY ");
        fen.push_str(&render_deploy_suffix(position, session));
    }
    fen
}

fn render_deploy_suffix(position: &Position, session: &DeploySession) -> String {
    let mut out = format!("{}:", session.origin());
    let mut first = true;
    for entry in session.entries() {
        if !first {
            out.push(',');
        }
        first = false;
        if entry.heroic {
            out.push('+');
        }
        out.push(entry.kind.to_fen_char(session.color()));
        if entry.stayed {
            out.push('_');
        } else if entry.capture {
            out.push('x');
        }
        out.push_str(&entry.to.to_string());
    }

    let remaining = position.group_at(session.origin());
    if !remaining.is_empty() {
        if !first {
            out.push(',');
        }
        if remaining.len() == 1 {
            let mut token = String::new();
            push_piece(&mut token, remaining[0]);
            out.push_str(&token);
        } else {
            out.push('(');
            for piece in &remaining {
                push_piece(&mut out, *piece);
            }
            out.push(')');
        }
    }
    out
}

fn push_piece(out: &mut String, piece: Piece) {
    if piece.heroic {
        out.push('+');
    }
    out.push(piece.kind.to_fen_char(piece.color));
}

#[cfg(test)]
mod tests {
    use super::*;

    const START_FEN: &str =
        "6c4/1n2fh1hf2/3a2s2a1/2n1gt1tg2/2ie2m2ei/11/11/2IE2M2EI/2N1GT1TG2/3A2S2A1/1N2FH1HF2/6C4 r - - 0 1";

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_starting_position() {
        let fields = parse_fen(START_FEN).unwrap();
        assert_eq!(fields.turn, Color::Red);
        assert_eq!(fields.halfmove, 0);
        assert_eq!(fields.fullmove, 1);
        assert!(fields.session.is_none());

        let pos = &fields.position;
        assert_eq!(pos.occupied().popcount(), 38);
        assert_eq!(pos.pieces(Color::Red).popcount(), 19);
        assert_eq!(pos.pieces(Color::Blue).popcount(), 19);
        assert_eq!(pos.commander_square(Color::Red), Some(sq("g1")));
        assert_eq!(pos.commander_square(Color::Blue), Some(sq("g12")));

        let navy = pos.piece_at(sq("c4")).unwrap();
        assert_eq!(navy.kind, PieceType::Navy);
        assert_eq!(navy.color, Color::Red);

        let anti_air = pos.piece_at(sq("e9")).unwrap();
        assert_eq!(anti_air.kind, PieceType::AntiAir);
        assert_eq!(anti_air.color, Color::Blue);
    }

    #[test]
    fn test_round_trip_starting_position() {
        let fields = parse_fen(START_FEN).unwrap();
        let rendered = render_fen(
            &fields.position,
            fields.turn,
            fields.halfmove,
            fields.fullmove,
            None,
        );
        assert_eq!(rendered, START_FEN);
    }

    #[test]
    fn test_parse_stack_and_heroic() {
        let fen = "11/11/11/11/11/11/11/11/11/2(NFT)8/11/5+C5 r - - 3 7";
        let fields = parse_fen(fen).unwrap();
        let pos = &fields.position;

        let (carrier, carried) = pos.stack_at(sq("c3")).unwrap();
        assert_eq!(carrier.kind, PieceType::Navy);
        assert_eq!(carried.len(), 2);
        assert_eq!(carried[0].kind, PieceType::AirForce);
        assert_eq!(carried[1].kind, PieceType::Tank);

        let commander = pos.piece_at(sq("f1")).unwrap();
        assert!(commander.heroic);
        assert_eq!(fields.halfmove, 3);
        assert_eq!(fields.fullmove, 7);

        let rendered = render_fen(pos, fields.turn, 3, 7, None);
        assert_eq!(rendered, fen);
    }

    #[test]
    fn test_parse_heroic_inside_stack() {
        let fen = "11/11/11/11/11/11/11/11/11/2(N+FT)8/11/11 b - - 0 1";
        let fields = parse_fen(fen).unwrap();
        let carried = fields.position.carried_at(sq("c3"));
        assert!(carried[0].heroic);
        assert!(!carried[1].heroic);
        let rendered = render_fen(&fields.position, Color::Blue, 0, 1, None);
        assert_eq!(rendered, fen);
    }

    #[test]
    fn test_reject_malformed() {
        // Too few rank segments
        assert!(matches!(
            parse_fen("11/11 r - - 0 1"),
            Err(FenError::TooFewFields { .. })
        ));
        assert!(matches!(
            parse_fen("11/11/11/11/11/11/11/11/11/11/11 r - - 0 1"),
            Err(FenError::BadRankCount { found: 11 })
        ));
        // Rank does not sum to 11
        assert!(matches!(
            parse_fen("10/11/11/11/11/11/11/11/11/11/11/11 r - - 0 1"),
            Err(FenError::BadRankWidth { .. })
        ));
        // Unmatched paren
        assert!(matches!(
            parse_fen("(NT/11/11/11/11/11/11/11/11/11/11/11 r - - 0 1"),
            Err(FenError::UnmatchedParen { .. })
        ));
        // Stray heroic marker
        assert!(matches!(
            parse_fen("+11/11/11/11/11/11/11/11/11/11/11/10I r - - 0 1"),
            Err(FenError::InvalidPiece { .. }) | Err(FenError::DanglingHeroicMarker { .. })
        ));
        // Invalid piece letter
        assert!(matches!(
            parse_fen("Z10/11/11/11/11/11/11/11/11/11/11/11 r - - 0 1"),
            Err(FenError::InvalidPiece { ch: 'Z' })
        ));
        // Two commanders of the same color
        assert!(matches!(
            parse_fen("2CC7/11/11/11/11/11/11/11/11/11/11/11 b - - 0 1"),
            Err(FenError::Placement(_))
        ));
        // Bad side to move
        assert!(matches!(
            parse_fen("11/11/11/11/11/11/11/11/11/11/11/11 w - - 0 1"),
            Err(FenError::InvalidSideToMove { .. })
        ));
        // Fullmove must be positive
        assert!(matches!(
            parse_fen("11/11/11/11/11/11/11/11/11/11/11/11 r - - 0 0"),
            Err(FenError::InvalidCounter { .. })
        ));
    }

    #[test]
    fn test_deploy_suffix_round_trip() {
        // Session at c3: navy already deployed to c5, air force and tank remain
        let fen = "11/11/11/11/11/11/11/2N8/11/2(FT)8/11/11 r - - 0 4 DEPLOY c3:Nc5,(FT)";
        let fields = parse_fen(fen).unwrap();
        let session = fields.session.as_ref().unwrap();
        assert_eq!(session.origin(), sq("c3"));
        assert_eq!(session.entries().len(), 1);
        assert_eq!(session.entries()[0].kind, PieceType::Navy);
        assert_eq!(session.entries()[0].to, sq("c5"));
        assert!(session.has_acted(PieceType::Navy));

        let rendered = render_fen(
            &fields.position,
            fields.turn,
            fields.halfmove,
            fields.fullmove,
            fields.session.as_ref(),
        );
        assert_eq!(rendered, fen);
    }

    #[test]
    fn test_deploy_suffix_single_remaining() {
        let fen = "11/11/11/11/11/11/11/2N8/3F7/2T8/11/11 r - - 0 4 DEPLOY c3:Nc5,Fd4,T";
        let fields = parse_fen(fen).unwrap();
        let session = fields.session.unwrap();
        assert_eq!(session.entries().len(), 2);
        assert!(session.has_acted(PieceType::AirForce));
        assert!(!session.has_acted(PieceType::Tank));

        let rendered = render_fen(
            &fields.position,
            fields.turn,
            fields.halfmove,
            fields.fullmove,
            Some(&session),
        );
        assert_eq!(rendered, fen);
    }

    #[test]
    fn test_deploy_suffix_rejects_wrong_color() {
        let fen = "11/11/11/11/11/11/11/2N8/11/2(FT)8/11/11 r - - 0 4 DEPLOY c3:nc5,(FT)";
        assert!(matches!(
            parse_fen(fen),
            Err(FenError::InvalidDeploy { .. })
        ));
    }
}
