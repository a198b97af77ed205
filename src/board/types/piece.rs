//! Piece and color types, plus the stack-composition table.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of distinct piece classes.
pub(crate) const NUM_PIECE_TYPES: usize = 11;

/// The eleven piece classes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PieceType {
    Commander,
    Infantry,
    Tank,
    Militia,
    Engineer,
    Artillery,
    AntiAir,
    Missile,
    AirForce,
    Navy,
    Headquarter,
}

/// All piece classes in index order.
pub(crate) const ALL_PIECE_TYPES: [PieceType; NUM_PIECE_TYPES] = [
    PieceType::Commander,
    PieceType::Infantry,
    PieceType::Tank,
    PieceType::Militia,
    PieceType::Engineer,
    PieceType::Artillery,
    PieceType::AntiAir,
    PieceType::Missile,
    PieceType::AirForce,
    PieceType::Navy,
    PieceType::Headquarter,
];

impl PieceType {
    #[inline]
    #[must_use]
    pub(crate) const fn index(self) -> usize {
        match self {
            PieceType::Commander => 0,
            PieceType::Infantry => 1,
            PieceType::Tank => 2,
            PieceType::Militia => 3,
            PieceType::Engineer => 4,
            PieceType::Artillery => 5,
            PieceType::AntiAir => 6,
            PieceType::Missile => 7,
            PieceType::AirForce => 8,
            PieceType::Navy => 9,
            PieceType::Headquarter => 10,
        }
    }

    /// Parse a piece class from its letter (case-insensitive).
    #[must_use]
    pub fn from_char(c: char) -> Option<PieceType> {
        match c.to_ascii_lowercase() {
            'c' => Some(PieceType::Commander),
            'i' => Some(PieceType::Infantry),
            't' => Some(PieceType::Tank),
            'm' => Some(PieceType::Militia),
            'e' => Some(PieceType::Engineer),
            'a' => Some(PieceType::Artillery),
            'g' => Some(PieceType::AntiAir),
            's' => Some(PieceType::Missile),
            'f' => Some(PieceType::AirForce),
            'n' => Some(PieceType::Navy),
            'h' => Some(PieceType::Headquarter),
            _ => None,
        }
    }

    /// Convert to the lowercase class letter
    #[inline]
    #[must_use]
    pub const fn to_char(self) -> char {
        match self {
            PieceType::Commander => 'c',
            PieceType::Infantry => 'i',
            PieceType::Tank => 't',
            PieceType::Militia => 'm',
            PieceType::Engineer => 'e',
            PieceType::Artillery => 'a',
            PieceType::AntiAir => 'g',
            PieceType::Missile => 's',
            PieceType::AirForce => 'f',
            PieceType::Navy => 'n',
            PieceType::Headquarter => 'h',
        }
    }

    /// Convert to the FEN letter, uppercase for Red
    #[inline]
    #[must_use]
    pub fn to_fen_char(self, color: Color) -> char {
        let c = self.to_char();
        if color == Color::Red {
            c.to_ascii_uppercase()
        } else {
            c
        }
    }

    /// True for classes that project an air-defense zone.
    #[inline]
    #[must_use]
    pub const fn is_air_defense(self) -> bool {
        matches!(
            self,
            PieceType::AntiAir | PieceType::Missile | PieceType::Navy
        )
    }

    /// Orthogonal air-defense reach, if any.
    #[inline]
    #[must_use]
    pub const fn air_defense_range(self, heroic: bool) -> Option<usize> {
        let base = match self {
            PieceType::AntiAir | PieceType::Navy => 3,
            PieceType::Missile => 4,
            _ => return None,
        };
        Some(if heroic { base + 1 } else { base })
    }

    /// Stack-composition table: can a carrier of this class hold `cargo`?
    #[must_use]
    pub const fn can_carry(self, cargo: PieceType) -> bool {
        use PieceType::*;
        match self {
            Navy => matches!(
                cargo,
                AirForce | Tank | Infantry | Militia | Engineer | Commander
            ),
            AirForce => matches!(cargo, Tank | Infantry | Militia | Commander),
            Tank => matches!(cargo, Infantry | Militia | Commander),
            Engineer => matches!(cargo, Artillery | AntiAir | Missile),
            Commander => !matches!(cargo, Navy | AirForce),
            Headquarter => matches!(cargo, Commander),
            _ => false,
        }
    }
}

/// The two sides. Red moves first.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Color {
    Red,
    Blue,
}

impl Color {
    #[inline]
    #[must_use]
    pub(crate) const fn index(self) -> usize {
        match self {
            Color::Red => 0,
            Color::Blue => 1,
        }
    }

    /// Returns the opposite color
    #[inline]
    #[must_use]
    pub const fn opponent(self) -> Color {
        match self {
            Color::Red => Color::Blue,
            Color::Blue => Color::Red,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Red => write!(f, "Red"),
            Color::Blue => write!(f, "Blue"),
        }
    }
}

/// A flat piece: class, owner and the sticky heroic flag.
///
/// Stack contents live in the stack side table, not here; a `Piece` is
/// always a single unit.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Piece {
    pub kind: PieceType,
    pub color: Color,
    pub heroic: bool,
}

impl Piece {
    #[inline]
    #[must_use]
    pub const fn new(kind: PieceType, color: Color) -> Self {
        Piece {
            kind,
            color,
            heroic: false,
        }
    }

    /// Same piece with the heroic flag set.
    #[inline]
    #[must_use]
    pub const fn heroic(kind: PieceType, color: Color) -> Self {
        Piece {
            kind,
            color,
            heroic: true,
        }
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.heroic {
            write!(f, "+")?;
        }
        write!(f, "{}", self.kind.to_fen_char(self.color))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_piece_type_char_round_trip() {
        for kind in ALL_PIECE_TYPES {
            assert_eq!(PieceType::from_char(kind.to_char()), Some(kind));
            assert_eq!(
                PieceType::from_char(kind.to_char().to_ascii_uppercase()),
                Some(kind)
            );
        }
        assert_eq!(PieceType::from_char('x'), None);
    }

    #[test]
    fn test_fen_char_case() {
        assert_eq!(PieceType::Navy.to_fen_char(Color::Red), 'N');
        assert_eq!(PieceType::Navy.to_fen_char(Color::Blue), 'n');
    }

    #[test]
    fn test_composition_table() {
        use PieceType::*;
        assert!(Navy.can_carry(AirForce));
        assert!(Navy.can_carry(Tank));
        assert!(!Navy.can_carry(Navy));
        assert!(!Navy.can_carry(Artillery));

        assert!(AirForce.can_carry(Commander));
        assert!(!AirForce.can_carry(Engineer));

        assert!(Tank.can_carry(Infantry));
        assert!(!Tank.can_carry(Tank));

        assert!(Engineer.can_carry(Artillery));
        assert!(Engineer.can_carry(Missile));
        assert!(!Engineer.can_carry(Infantry));

        assert!(Commander.can_carry(Tank));
        assert!(!Commander.can_carry(Navy));
        assert!(!Commander.can_carry(AirForce));

        assert!(Headquarter.can_carry(Commander));
        assert!(!Headquarter.can_carry(Infantry));

        assert!(!Infantry.can_carry(Militia));
        assert!(!Militia.can_carry(Infantry));
        assert!(!Artillery.can_carry(Infantry));
    }

    #[test]
    fn test_air_defense_ranges() {
        assert_eq!(PieceType::AntiAir.air_defense_range(false), Some(3));
        assert_eq!(PieceType::AntiAir.air_defense_range(true), Some(4));
        assert_eq!(PieceType::Missile.air_defense_range(false), Some(4));
        assert_eq!(PieceType::Navy.air_defense_range(true), Some(4));
        assert_eq!(PieceType::Tank.air_defense_range(false), None);
    }

    #[test]
    fn test_piece_display() {
        let p = Piece::new(PieceType::Tank, Color::Red);
        assert_eq!(p.to_string(), "T");
        let p = Piece::heroic(PieceType::Tank, Color::Blue);
        assert_eq!(p.to_string(), "+t");
    }
}
