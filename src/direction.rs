use std::fmt;

use crate::error::{KappaError, KappaResult};

/// One heat-current channel of a direction and the keys its results go under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Component {
    pub channel: &'static str,
    pub corr_key: &'static str,
    pub kappa_key: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    X,
    Y,
    Z,
}

const X_COMPONENTS: [Component; 2] = [
    Component {
        channel: "jmxi",
        corr_key: "corr_xmi_x",
        kappa_key: "kmxi",
    },
    Component {
        channel: "jmxo",
        corr_key: "corr_xmo_x",
        kappa_key: "kmxo",
    },
];

const Y_COMPONENTS: [Component; 2] = [
    Component {
        channel: "jmyi",
        corr_key: "corr_ymi_y",
        kappa_key: "kmyi",
    },
    Component {
        channel: "jmyo",
        corr_key: "corr_ymo_y",
        kappa_key: "kmyo",
    },
];

const Z_COMPONENTS: [Component; 1] = [Component {
    channel: "jmz",
    corr_key: "corr_zm_z",
    kappa_key: "kmz",
}];

impl Direction {
    pub const ALL: [Direction; 3] = [Direction::X, Direction::Y, Direction::Z];

    /// In-plane directions carry separate in/out channels; z carries one.
    pub fn components(self) -> &'static [Component] {
        match self {
            Direction::X => &X_COMPONENTS,
            Direction::Y => &Y_COMPONENTS,
            Direction::Z => &Z_COMPONENTS,
        }
    }

    pub fn channels(self) -> impl Iterator<Item = &'static str> {
        self.components().iter().map(|c| c.channel)
    }

    pub fn label(self) -> char {
        match self {
            Direction::X => 'x',
            Direction::Y => 'y',
            Direction::Z => 'z',
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl TryFrom<char> for Direction {
    type Error = KappaError;

    fn try_from(c: char) -> KappaResult<Self> {
        match c.to_ascii_lowercase() {
            'x' => Ok(Direction::X),
            'y' => Ok(Direction::Y),
            'z' => Ok(Direction::Z),
            other => Err(KappaError::invalid(format!("unknown direction '{other}'"))),
        }
    }
}

/// Directions named in `s`, in the order given, repeats dropped.
pub fn parse_directions(s: &str) -> KappaResult<Vec<Direction>> {
    let directions = s
        .chars()
        .filter(|c| !c.is_whitespace())
        .try_fold(Vec::new(), |mut acc, c| {
            let direction = Direction::try_from(c)?;
            if !acc.contains(&direction) {
                acc.push(direction);
            }
            Ok::<_, KappaError>(acc)
        })?;
    if directions.is_empty() {
        return Err(KappaError::invalid("no direction requested"));
    }
    Ok(directions)
}
