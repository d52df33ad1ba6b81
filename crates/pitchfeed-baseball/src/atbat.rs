// The at-bat in progress: matchup, count, base runners and score.

use crate::play::{format_inning, Count, HalfInning};

/// Which bases have a runner on them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bases {
    pub first: bool,
    pub second: bool,
    pub third: bool,
}

impl Bases {
    /// `Bases empty`, `Runner on 2nd`, `Runners on 1st & 3rd`, `Bases loaded`.
    pub fn describe(&self) -> String {
        let occupied: Vec<&str> = [(self.first, "1st"), (self.second, "2nd"), (self.third, "3rd")]
            .into_iter()
            .filter_map(|(on, base)| on.then_some(base))
            .collect();
        match occupied.as_slice() {
            [] => "Bases empty".to_string(),
            [base] => format!("Runner on {base}"),
            [_, _, _] => "Bases loaded".to_string(),
            bases => format!("Runners on {}", bases.join(" & ")),
        }
    }
}

/// Snapshot of the plate appearance currently under way, taken from the
/// feed's `currentPlay` and linescore.
#[derive(Debug, Clone, PartialEq)]
pub struct AtBatContext {
    pub inning: u32,
    pub half_inning: HalfInning,
    pub batter: String,
    pub pitcher: String,
    pub count: Count,
    pub bases: Bases,
    pub away_runs: u32,
    pub home_runs: u32,
}

impl AtBatContext {
    pub fn inning_label(&self) -> String {
        format_inning(self.half_inning, self.inning)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bases(first: bool, second: bool, third: bool) -> Bases {
        Bases {
            first,
            second,
            third,
        }
    }

    #[test]
    fn describes_runners() {
        assert_eq!(Bases::default().describe(), "Bases empty");
        assert_eq!(bases(false, true, false).describe(), "Runner on 2nd");
        assert_eq!(bases(true, false, true).describe(), "Runners on 1st & 3rd");
        assert_eq!(bases(true, true, false).describe(), "Runners on 1st & 2nd");
        assert_eq!(bases(true, true, true).describe(), "Bases loaded");
    }
}
