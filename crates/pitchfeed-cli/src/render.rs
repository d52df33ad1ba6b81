// Plain-text rendering of plays, games and feed updates.

use pitchfeed_baseball::play::PlayCategory;
use pitchfeed_baseball::schedule::GameSummary;
use pitchfeed_baseball::{AtBatContext, GamePk, GameStatus, Play};
use pitchfeed_app::protocol::FeedUpdate;
use pitchfeed_core::error::FeedError;

fn category_tag(category: PlayCategory) -> &'static str {
    match category {
        PlayCategory::Hit => "HIT ",
        PlayCategory::Out => "OUT ",
        PlayCategory::Walk => "BB  ",
        PlayCategory::Run => "RUN ",
        PlayCategory::Other => "    ",
    }
}

fn outs_label(outs: u8) -> String {
    match outs {
        1 => "1 out".to_string(),
        n => format!("{n} outs"),
    }
}

/// `[Top 3rd] HIT  Judge singles to left.  (2-1, 1 out)  0-1`
pub fn play_line(play: &Play) -> String {
    let outs = outs_label(play.count.outs);
    let mut line = format!(
        "[{}] {} {}  ({}-{}, {})  {}-{}",
        play.inning_label(),
        category_tag(play.category()),
        play.description,
        play.count.balls,
        play.count.strikes,
        outs,
        play.away_score,
        play.home_score,
    );
    if !play.is_complete {
        line.push_str("  (in progress)");
    }
    line
}

/// `>> Bottom 7th  Rafael Devers vs Clay Holmes  3-2, 2 outs  Runners on 1st & 3rd  4-3`
pub fn at_bat_line(context: &AtBatContext) -> String {
    format!(
        ">> {}  {} vs {}  {}-{}, {}  {}  {}-{}",
        context.inning_label(),
        context.batter,
        context.pitcher,
        context.count.balls,
        context.count.strikes,
        outs_label(context.count.outs),
        context.bases.describe(),
        context.away_runs,
        context.home_runs,
    )
}

pub fn status_line(game_pk: GamePk, status: GameStatus, detailed_state: &str) -> String {
    format!("Game {game_pk}: {}", status.label(detailed_state))
}

pub fn failure_line(error: &FeedError) -> String {
    format!("! update failed ({}): {error}", error.kind())
}

/// `745123  Yankees @ Red Sox  Live  2024-07-04T17:05:00Z`
pub fn game_line(game: &GameSummary) -> String {
    format!(
        "{:<8}  {} @ {}  {}  {}",
        game.game_pk,
        game.away_team,
        game.home_team,
        game.status.label(&game.detailed_state),
        game.start_time,
    )
}

/// Lines to print for one feed update.
pub fn update_lines(update: &FeedUpdate) -> Vec<String> {
    match update {
        FeedUpdate::Status {
            session,
            status,
            detailed_state,
        } => vec![status_line(session.game_pk, *status, detailed_state)],
        FeedUpdate::Plays { delta, .. } => delta.iter().map(play_line).collect(),
        FeedUpdate::AtBat { context, .. } => vec![at_bat_line(context)],
        FeedUpdate::CycleFailed { error, .. } => vec![failure_line(error)],
        FeedUpdate::Finished { session, status } => vec![format!(
            "Game {} is {}; stopped polling {}.",
            session.game_pk, status, session.kind
        )],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pitchfeed_app::protocol::PollHandle;
    use pitchfeed_baseball::play::Count;
    use pitchfeed_baseball::{Bases, HalfInning};
    use pitchfeed_core::feed::FeedKind;

    fn play() -> Play {
        Play {
            game_pk: 745_123,
            at_bat_index: 20,
            inning: 3,
            half_inning: HalfInning::Top,
            event_type: "single".into(),
            description: "Aaron Judge singles on a line drive to left fielder.".into(),
            is_complete: true,
            count: Count {
                balls: 2,
                strikes: 1,
                outs: 1,
            },
            away_score: 0,
            home_score: 1,
            batter: "Aaron Judge".into(),
            pitcher: "Brayan Bello".into(),
            observed_at: Utc::now(),
        }
    }

    #[test]
    fn play_line_shows_inning_category_and_count() {
        assert_eq!(
            play_line(&play()),
            "[Top 3rd] HIT  Aaron Judge singles on a line drive to left fielder.  (2-1, 1 out)  0-1"
        );
    }

    #[test]
    fn incomplete_play_is_marked() {
        let mut p = play();
        p.is_complete = false;
        p.count.outs = 2;
        let line = play_line(&p);
        assert!(line.contains("2 outs"));
        assert!(line.ends_with("(in progress)"));
    }

    #[test]
    fn at_bat_line_shows_matchup_runners_and_score() {
        let context = AtBatContext {
            inning: 7,
            half_inning: HalfInning::Bottom,
            batter: "Rafael Devers".into(),
            pitcher: "Clay Holmes".into(),
            count: Count {
                balls: 3,
                strikes: 2,
                outs: 1,
            },
            bases: Bases {
                first: true,
                second: false,
                third: true,
            },
            away_runs: 4,
            home_runs: 3,
        };
        assert_eq!(
            at_bat_line(&context),
            ">> Bottom 7th  Rafael Devers vs Clay Holmes  3-2, 1 out  Runners on 1st & 3rd  4-3"
        );
    }

    #[test]
    fn status_uses_display_label() {
        assert_eq!(status_line(1, GameStatus::Live, "Delayed: Rain"), "Game 1: Delayed");
        assert_eq!(status_line(1, GameStatus::Unknown, "Suspended"), "Game 1: Suspended");
    }

    #[test]
    fn finished_update_names_the_feed() {
        let update = FeedUpdate::Finished {
            session: PollHandle {
                game_pk: 9,
                kind: FeedKind::PlayByPlay,
                generation: 1,
            },
            status: GameStatus::Final,
        };
        assert_eq!(update_lines(&update), vec!["Game 9 is Final; stopped polling play_by_play."]);
    }

    #[test]
    fn failure_line_includes_kind() {
        let line = failure_line(&FeedError::Parse("allPlays is not a list".into()));
        assert!(line.starts_with("! update failed (parse)"));
    }
}
