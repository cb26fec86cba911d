//! The ±1 value carried by inputs and outputs.

use std::ops::{Mul, Neg};

use serde_repr::{Deserialize_repr, Serialize_repr};

/// A binary value in {-1, +1}.
///
/// Serialized as the plain integers `-1` and `1`. Any other integer fails to
/// decode, so a well-formed record can never carry a zero or out-of-range
/// input or output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(i8)]
pub enum Spin {
    /// -1
    Minus = -1,
    /// +1
    Plus = 1,
}

impl Spin {
    /// Sign of a local field. Zero counts as non-negative.
    pub const fn from_field(field: i32) -> Self {
        if field >= 0 { Self::Plus } else { Self::Minus }
    }

    /// Maps a random bit to a spin (`true` is +1).
    pub const fn from_bit(bit: bool) -> Self {
        if bit { Self::Plus } else { Self::Minus }
    }

    /// The opposite spin.
    #[must_use]
    pub const fn flip(self) -> Self {
        match self {
            Self::Minus => Self::Plus,
            Self::Plus => Self::Minus,
        }
    }

    /// Integer value, -1 or 1.
    pub const fn value(self) -> i32 {
        self as i32
    }
}

impl Mul for Spin {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        if self == rhs { Self::Plus } else { Self::Minus }
    }
}

impl Neg for Spin {
    type Output = Self;

    fn neg(self) -> Self {
        self.flip()
    }
}
