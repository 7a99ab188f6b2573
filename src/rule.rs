//! Cellular automaton rule descriptors and the three textual grammars that
//! produce them: classic `B3/S23` (with the bare `23/3` survival-first
//! fallback and the `s/b/states` generations extension), Kellie-Evans
//! 5-integer tuples, and HROT `R,C,M,S,B,N` token strings.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseRuleError {
    #[error("empty rule string")]
    Empty,
    #[error("invalid number in rule: {0:?}")]
    BadNumber(String),
    #[error("invalid count range {0:?}")]
    BadRange(String),
    #[error("unrecognized rule token {0:?}")]
    BadToken(String),
    #[error("unknown neighborhood letter {0:?}")]
    UnknownNeighborhood(String),
    #[error("Kellie-Evans rule needs 5 integers, got {0}")]
    BadTupleLen(usize),
}

/// Neighborhood shape, a closed set of inclusion predicates over `(dx, dy)`
/// offsets within the rule's range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Neighborhood {
    /// Chebyshev disc, the full box.
    Moore,
    /// Manhattan disc.
    VonNeumann,
    /// Euclidean disc, `dx² + dy² ≤ r²`.
    Euclidean,
    /// Axis-aligned lines through the center.
    Cross,
    /// Diagonal lines through the center.
    Saltire,
    /// Cross and saltire combined.
    Star,
    /// Cells where `dx + dy` is odd.
    Checkerboard,
    /// Rows and columns at offset one, the `#` shape.
    Hash,
}

impl Neighborhood {
    fn includes(self, dx: i32, dy: i32, r: i32) -> bool {
        match self {
            Neighborhood::Moore => true,
            Neighborhood::VonNeumann => dx.abs() + dy.abs() <= r,
            Neighborhood::Euclidean => dx * dx + dy * dy <= r * r,
            Neighborhood::Cross => dx == 0 || dy == 0,
            Neighborhood::Saltire => dx.abs() == dy.abs(),
            Neighborhood::Star => dx == 0 || dy == 0 || dx.abs() == dy.abs(),
            Neighborhood::Checkerboard => (dx + dy).rem_euclid(2) == 1,
            Neighborhood::Hash => dx.abs() == 1 || dy.abs() == 1,
        }
    }

    fn letter(self) -> char {
        match self {
            Neighborhood::Moore => 'M',
            Neighborhood::VonNeumann => 'N',
            Neighborhood::Euclidean => 'C',
            Neighborhood::Cross => '+',
            Neighborhood::Saltire => 'X',
            Neighborhood::Star => '*',
            Neighborhood::Checkerboard => 'B',
            Neighborhood::Hash => '#',
        }
    }

    fn from_letter(s: &str) -> Result<Self, ParseRuleError> {
        match s {
            "M" | "m" => Ok(Neighborhood::Moore),
            "N" | "n" => Ok(Neighborhood::VonNeumann),
            "C" | "c" => Ok(Neighborhood::Euclidean),
            "+" => Ok(Neighborhood::Cross),
            "X" | "x" => Ok(Neighborhood::Saltire),
            "*" => Ok(Neighborhood::Star),
            "B" | "b" => Ok(Neighborhood::Checkerboard),
            "#" => Ok(Neighborhood::Hash),
            other => Err(ParseRuleError::UnknownNeighborhood(other.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Topology {
    Torus,
    Plane,
}

/// The `(dx, dy)` offsets a cell's neighbor count ranges over. The center is
/// included exactly when `include_center` says so, regardless of shape.
pub fn offsets(shape: Neighborhood, range: u32, include_center: bool) -> Vec<(i32, i32)> {
    let r = range as i32;
    let mut out = Vec::new();
    for dy in -r..=r {
        for dx in -r..=r {
            if dx == 0 && dy == 0 {
                if include_center {
                    out.push((0, 0));
                }
            } else if shape.includes(dx, dy, r) {
                out.push((dx, dy));
            }
        }
    }
    out
}

/// A parsed or hand-built automaton rule.
///
/// `born` and `survive` are sorted, deduplicated, and bounded by the neighbor
/// count of the configured neighborhood and range; out-of-range counts are
/// dropped rather than rejected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rule {
    pub born: Vec<u32>,
    pub survive: Vec<u32>,
    pub range: u32,
    pub neighborhood: Neighborhood,
    pub include_center: bool,
    /// ≥ 2. Above 2, non-surviving live cells decay through dying states.
    pub states: u32,
    pub topology: Topology,
}

impl Rule {
    /// A range-1 Moore rule, the classic Life-like family.
    pub fn life_like(born: &[u32], survive: &[u32]) -> Self {
        Rule {
            born: born.to_vec(),
            survive: survive.to_vec(),
            range: 1,
            neighborhood: Neighborhood::Moore,
            include_center: false,
            states: 2,
            topology: Topology::Torus,
        }
        .normalized()
    }

    pub fn offsets(&self) -> Vec<(i32, i32)> {
        offsets(self.neighborhood, self.range, self.include_center)
    }

    pub fn max_neighbors(&self) -> u32 {
        self.offsets().len() as u32
    }

    fn normalized(mut self) -> Self {
        let cap = self.max_neighbors();
        for list in [&mut self.born, &mut self.survive] {
            list.retain(|&n| n <= cap);
            list.sort_unstable();
            list.dedup();
        }
        // Dying states are stored in a byte; 256 total states is the ceiling.
        self.states = self.states.clamp(2, 256);
        self
    }

    fn is_life_like(&self) -> bool {
        self.range == 1
            && self.neighborhood == Neighborhood::Moore
            && !self.include_center
    }
}

impl fmt::Display for Rule {
    /// Canonical form: `B3/S23` for two-state Life-likes, bare
    /// `survive/born/states` for generations Life-likes, HROT tokens for
    /// everything else. Parsing the output reproduces the rule exactly.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_life_like() && self.states == 2 {
            write!(f, "B{}/S{}", fmt_digits(&self.born), fmt_digits(&self.survive))?;
        } else if self.is_life_like() {
            write!(
                f,
                "{}/{}/{}",
                fmt_digits(&self.survive),
                fmt_digits(&self.born),
                self.states
            )?;
        } else {
            write!(
                f,
                "R{},C{},M{},S{},B{},N{}",
                self.range,
                self.states,
                u32::from(self.include_center),
                fmt_runs(&self.survive),
                fmt_runs(&self.born),
                self.neighborhood.letter()
            )?;
        }
        if self.topology == Topology::Plane {
            write!(f, ":P")?;
        }
        Ok(())
    }
}

fn fmt_digits(list: &[u32]) -> String {
    list.iter().map(|n| n.to_string()).collect()
}

/// Collapse a sorted list into `a-b` runs: `[2,3,5]` becomes `"2-3,5"`.
fn fmt_runs(list: &[u32]) -> String {
    let mut out = String::new();
    let mut i = 0;
    while i < list.len() {
        let start = list[i];
        let mut end = start;
        while i + 1 < list.len() && list[i + 1] == end + 1 {
            i += 1;
            end = list[i];
        }
        if !out.is_empty() {
            out.push(',');
        }
        if end > start {
            out.push_str(&format!("{start}-{end}"));
        } else {
            out.push_str(&start.to_string());
        }
        i += 1;
    }
    out
}

impl FromStr for Rule {
    type Err = ParseRuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseRuleError::Empty);
        }

        let (body, topology) = match s.rsplit_once(':') {
            Some((body, suffix)) => {
                let topology = match suffix {
                    "T" | "t" => Topology::Torus,
                    "P" | "p" => Topology::Plane,
                    other => return Err(ParseRuleError::BadToken(format!(":{other}"))),
                };
                (body, topology)
            }
            None => (s, Topology::Torus),
        };

        let rule = if body.contains(',') {
            if body.starts_with(['R', 'r']) {
                parse_hrot(body)?
            } else {
                parse_kellie_evans(body)?
            }
        } else {
            parse_classic(body)?
        };
        Ok(Rule { topology, ..rule }.normalized())
    }
}

/// `B3/S23`, `S23/B3`, bare `23/3`, or generations `23/3/4`.
///
/// The bare two-part form puts survival FIRST, the opposite of the prefixed
/// order. That convention is deliberate and pinned by a test.
fn parse_classic(s: &str) -> Result<Rule, ParseRuleError> {
    let parts: Vec<&str> = s.split('/').collect();

    let digits = |part: &str| -> Result<Vec<u32>, ParseRuleError> {
        part.chars()
            .map(|c| c.to_digit(10).ok_or_else(|| ParseRuleError::BadNumber(part.to_string())))
            .collect()
    };

    let (born, survive, states) = match parts.as_slice() {
        [a, b] => {
            let pa = a.strip_prefix(['B', 'b']).map(|rest| (true, rest));
            let pa = pa.or_else(|| a.strip_prefix(['S', 's']).map(|rest| (false, rest)));
            let pb = b.strip_prefix(['B', 'b']).map(|rest| (true, rest));
            let pb = pb.or_else(|| b.strip_prefix(['S', 's']).map(|rest| (false, rest)));
            match (pa, pb) {
                (Some((true, ba)), Some((false, sb))) => (digits(ba)?, digits(sb)?, 2),
                (Some((false, sa)), Some((true, bb))) => (digits(bb)?, digits(sa)?, 2),
                // Bare form: survive/born.
                (None, None) => (digits(b)?, digits(a)?, 2),
                _ => return Err(ParseRuleError::BadToken(s.to_string())),
            }
        }
        // Generations: survive/born/states.
        [sv, bn, st] => {
            let states: u32 = st
                .parse()
                .map_err(|_| ParseRuleError::BadNumber(st.to_string()))?;
            (digits(bn)?, digits(sv)?, states)
        }
        _ => return Err(ParseRuleError::BadToken(s.to_string())),
    };

    Ok(Rule {
        born,
        survive,
        states,
        ..Rule::life_like(&[], &[])
    })
}

/// `range,smin,smax,bmin,bmax`. The center cell counts, per Larger than Life.
fn parse_kellie_evans(s: &str) -> Result<Rule, ParseRuleError> {
    let nums: Vec<u32> = s
        .split(',')
        .map(|t| {
            t.trim()
                .parse()
                .map_err(|_| ParseRuleError::BadNumber(t.to_string()))
        })
        .collect::<Result<_, _>>()?;
    if nums.len() != 5 {
        return Err(ParseRuleError::BadTupleLen(nums.len()));
    }
    let [range, smin, smax, bmin, bmax] = [nums[0], nums[1], nums[2], nums[3], nums[4]];
    Ok(Rule {
        born: (bmin..=bmax).collect(),
        survive: (smin..=smax).collect(),
        range,
        neighborhood: Neighborhood::Moore,
        include_center: true,
        states: 2,
        topology: Topology::Torus,
    })
}

/// `R2,C2,M1,S5..8,B7..8,NM` with `..` or `-` count ranges. Unprefixed
/// numeric tokens continue the most recent S or B list.
fn parse_hrot(s: &str) -> Result<Rule, ParseRuleError> {
    enum ListMode {
        None,
        Survive,
        Born,
    }

    let mut rule = Rule {
        born: Vec::new(),
        survive: Vec::new(),
        range: 1,
        neighborhood: Neighborhood::Moore,
        include_center: false,
        states: 2,
        topology: Topology::Torus,
    };
    let mut mode = ListMode::None;

    for token in s.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let Some(head) = token.chars().next() else {
            continue;
        };
        let rest = &token[head.len_utf8()..];
        match head {
            'R' | 'r' => {
                rule.range = rest
                    .parse()
                    .map_err(|_| ParseRuleError::BadNumber(token.to_string()))?;
                mode = ListMode::None;
            }
            'C' | 'c' => {
                rule.states = rest
                    .parse()
                    .map_err(|_| ParseRuleError::BadNumber(token.to_string()))?;
                mode = ListMode::None;
            }
            'M' | 'm' => {
                rule.include_center = rest == "1";
                mode = ListMode::None;
            }
            'S' | 's' => {
                mode = ListMode::Survive;
                if !rest.is_empty() {
                    push_count_range(&mut rule.survive, rest)?;
                }
            }
            'B' | 'b' => {
                mode = ListMode::Born;
                if !rest.is_empty() {
                    push_count_range(&mut rule.born, rest)?;
                }
            }
            'N' | 'n' => {
                rule.neighborhood = Neighborhood::from_letter(rest)?;
                mode = ListMode::None;
            }
            _ if head.is_ascii_digit() => match mode {
                ListMode::Survive => push_count_range(&mut rule.survive, token)?,
                ListMode::Born => push_count_range(&mut rule.born, token)?,
                ListMode::None => return Err(ParseRuleError::BadToken(token.to_string())),
            },
            _ => return Err(ParseRuleError::BadToken(token.to_string())),
        }
    }
    Ok(rule)
}

fn push_count_range(list: &mut Vec<u32>, item: &str) -> Result<(), ParseRuleError> {
    let bounds: Vec<&str> = if item.contains("..") {
        item.splitn(2, "..").collect()
    } else if item.contains('-') {
        item.splitn(2, '-').collect()
    } else {
        vec![item]
    };
    let parse = |t: &str| -> Result<u32, ParseRuleError> {
        t.parse().map_err(|_| ParseRuleError::BadNumber(item.to_string()))
    };
    match bounds.as_slice() {
        [one] => list.push(parse(one)?),
        [lo, hi] => {
            let (lo, hi) = (parse(lo)?, parse(hi)?);
            if lo > hi {
                return Err(ParseRuleError::BadRange(item.to_string()));
            }
            list.extend(lo..=hi);
        }
        _ => return Err(ParseRuleError::BadRange(item.to_string())),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Rule {
        s.parse().unwrap()
    }

    #[test]
    fn classic_life() {
        let r = parse("B3/S23");
        assert_eq!(r.born, vec![3]);
        assert_eq!(r.survive, vec![2, 3]);
        assert_eq!(r.range, 1);
        assert_eq!(r.neighborhood, Neighborhood::Moore);
        assert!(!r.include_center);
        assert_eq!(r.states, 2);
        assert_eq!(r.topology, Topology::Torus);
        assert_eq!(parse("S23/B3"), r);
    }

    #[test]
    fn bare_form_is_survival_first() {
        let r = parse("23/3");
        assert_eq!(r.survive, vec![2, 3]);
        assert_eq!(r.born, vec![3]);
    }

    #[test]
    fn generations_form() {
        let r = parse("/2/3");
        assert_eq!(r.survive, Vec::<u32>::new());
        assert_eq!(r.born, vec![2]);
        assert_eq!(r.states, 3);
    }

    #[test]
    fn kellie_evans_tuple() {
        let r = parse("5,34,58,34,45");
        assert_eq!(r.range, 5);
        assert_eq!(r.survive, (34..=58).collect::<Vec<_>>());
        assert_eq!(r.born, (34..=45).collect::<Vec<_>>());
        assert!(r.include_center);
        assert_eq!(r.neighborhood, Neighborhood::Moore);
    }

    #[test]
    fn hrot_tokens() {
        let r = parse("R2,C2,M1,S5..8,B7..8,NM");
        assert_eq!(r.range, 2);
        assert_eq!(r.states, 2);
        assert!(r.include_center);
        assert_eq!(r.survive, vec![5, 6, 7, 8]);
        assert_eq!(r.born, vec![7, 8]);
        assert_eq!(r.neighborhood, Neighborhood::Moore);

        // Dash ranges, list continuation tokens, and a shaped neighborhood.
        let r = parse("R3,C0,M0,S2-3,5,B3,N+");
        assert_eq!(r.survive, vec![2, 3, 5]);
        assert_eq!(r.born, vec![3]);
        assert_eq!(r.neighborhood, Neighborhood::Cross);
    }

    #[test]
    fn topology_suffix() {
        assert_eq!(parse("B3/S23:P").topology, Topology::Plane);
        assert_eq!(parse("B3/S23:T").topology, Topology::Torus);
        assert!("B3/S23:Q".parse::<Rule>().is_err());
    }

    #[test]
    fn display_roundtrips() {
        for s in [
            "B3/S23",
            "B36/S23",
            "B2/S",
            "23/3",
            "/2/3",
            "345/2/4",
            "5,34,58,34,45",
            "R2,C2,M1,S5..8,B7..8,NM",
            "R3,C4,M0,S2-3,5,B3,N#",
            "R2,C2,M0,S1,B1,NB",
            "B3/S23:P",
        ] {
            let rule = parse(s);
            let canon = rule.to_string();
            assert_eq!(parse(&canon), rule, "{s} -> {canon}");
        }
    }

    #[test]
    fn counts_above_neighborhood_capacity_are_dropped() {
        let r = parse("B39/S23");
        assert_eq!(r.born, vec![3]);
        let r = parse("R1,C2,M0,S0-99,B1,NN");
        assert_eq!(r.survive, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn offset_tables() {
        assert_eq!(offsets(Neighborhood::Moore, 1, false).len(), 8);
        assert_eq!(offsets(Neighborhood::Moore, 1, true).len(), 9);
        assert_eq!(offsets(Neighborhood::VonNeumann, 1, false).len(), 4);
        assert_eq!(offsets(Neighborhood::Cross, 2, false).len(), 8);
        assert_eq!(offsets(Neighborhood::Saltire, 2, false).len(), 8);
        assert_eq!(offsets(Neighborhood::Star, 1, false).len(), 8);
        assert_eq!(offsets(Neighborhood::Hash, 2, false).len(), 16);
        // Checkerboard range 1: the four odd-parity cells.
        let cb = offsets(Neighborhood::Checkerboard, 1, false);
        assert_eq!(cb.len(), 4);
        assert!(cb.iter().all(|&(dx, dy)| (dx + dy).rem_euclid(2) == 1));
        // Euclidean range 2 keeps the diagonals at distance sqrt(2) but not
        // the knight-move cells at sqrt(5).
        let eu = offsets(Neighborhood::Euclidean, 2, false);
        assert!(eu.contains(&(1, 1)));
        assert!(!eu.contains(&(1, 2)));
    }

    #[test]
    fn malformed_inputs_error() {
        assert!("".parse::<Rule>().is_err());
        assert!("B3x/S23".parse::<Rule>().is_err());
        assert!("1,2,3".parse::<Rule>().is_err());
        assert!("R2,C2,M0,S8..5,B3,NM".parse::<Rule>().is_err());
        assert!("R2,C2,M0,S3,B3,NQ".parse::<Rule>().is_err());
        assert!("a/b/c/d".parse::<Rule>().is_err());
    }
}
