use arrayvec::ArrayVec;

use crate::{PolysurfError, invalid};

/// One of the three symbolic variables a polynomial can be built over.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Ordered, duplicate-free selection of variables.
pub type Selection = ArrayVec<Axis, 3>;

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn name(self) -> char {
        match self {
            Axis::X => 'x',
            Axis::Y => 'y',
            Axis::Z => 'z',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'x' => Some(Axis::X),
            'y' => Some(Axis::Y),
            'z' => Some(Axis::Z),
            _ => None,
        }
    }
}

impl core::fmt::Display for Axis {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Parse a selection such as `"xz"` into an ordered list of axes.
///
/// Whitespace and commas are ignored. An empty string yields an empty selection;
/// rejecting that is left to the generator so the scheduler can treat it as a
/// skipped cycle rather than a parse failure.
pub fn parse_selection(s: &str) -> Result<Selection, PolysurfError> {
    let mut selection = Selection::new();
    for c in s.chars().filter(|c| !c.is_whitespace() && *c != ',') {
        let axis = Axis::from_char(c).ok_or_else(|| invalid(format!("unknown variable '{c}'")))?;
        if selection.contains(&axis) {
            return Err(invalid(format!("variable '{axis}' selected twice")));
        }
        // Cannot overflow: three distinct axes at most.
        selection.push(axis);
    }
    Ok(selection)
}
