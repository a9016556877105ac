//! Timed player commands supplied on the command line.
//!
//! Each entry reads `<seconds>:<action>[:<argument>...]`, for example
//! `2.0:place:3:cannon`, `10:upgrade:0:pyro`, `12:sell:0`, `4:cycle:0`,
//! `1:speed:2`, `5:pause` or `6:reset`.

use std::{str::FromStr, time::Duration};

use myth_forge_core::{Element, PlotIndex, TowerId, TowerKind, UnknownKindError};
use myth_forge_simulation::PlayerCommand;

/// Delimiter separating the time, the action and its arguments.
const FIELD_DELIMITER: char = ':';

/// Player command scheduled at a point in run time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ScriptedCommand {
    /// Run time (frame clock) at which the command is submitted.
    pub(crate) at: Duration,
    /// Command to submit.
    pub(crate) command: PlayerCommand,
}

/// Errors that can occur while parsing a scripted command.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub(crate) enum ScriptError {
    /// The entry was empty or contained only whitespace.
    #[error("scripted command was empty")]
    Empty,
    /// The entry did not name an action after its time.
    #[error("scripted command '{0}' is missing an action")]
    MissingAction(String),
    /// The time could not be parsed as non-negative seconds.
    #[error("could not parse time '{0}'")]
    InvalidTime(String),
    /// The action is not recognised.
    #[error("action '{0}' is not supported")]
    UnknownAction(String),
    /// A required argument was absent.
    #[error("action '{action}' is missing its {argument}")]
    MissingArgument {
        /// Action being parsed.
        action: &'static str,
        /// Name of the missing argument.
        argument: &'static str,
    },
    /// An index argument was not a non-negative integer.
    #[error("could not parse index '{0}'")]
    InvalidIndex(String),
    /// A speed argument was not a finite number.
    #[error("could not parse speed multiplier '{0}'")]
    InvalidSpeed(String),
    /// A tower or element name was not recognised.
    #[error(transparent)]
    UnknownKind(#[from] UnknownKindError),
    /// More fields were supplied than the action accepts.
    #[error("unexpected trailing fields '{0}'")]
    TrailingFields(String),
}

impl FromStr for ScriptedCommand {
    type Err = ScriptError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ScriptError::Empty);
        }

        let mut fields = trimmed.split(FIELD_DELIMITER).map(str::trim);
        let time = fields.next().ok_or(ScriptError::Empty)?;
        let action = fields
            .next()
            .filter(|action| !action.is_empty())
            .ok_or_else(|| ScriptError::MissingAction(trimmed.to_owned()))?;
        let at = parse_time(time)?;

        let command = match action.to_ascii_lowercase().as_str() {
            "place" => {
                let plot = PlotIndex::new(parse_index(next(&mut fields, "place", "plot")?)?);
                let kind = next(&mut fields, "place", "tower type")?.parse::<TowerKind>()?;
                PlayerCommand::PlaceTower { kind, plot }
            }
            "sell" => PlayerCommand::SellTower {
                tower: parse_tower(next(&mut fields, "sell", "tower")?)?,
            },
            "upgrade" => {
                let tower = parse_tower(next(&mut fields, "upgrade", "tower")?)?;
                let element = next(&mut fields, "upgrade", "element")?.parse::<Element>()?;
                PlayerCommand::UpgradeTower { tower, element }
            }
            "cycle" => PlayerCommand::CycleTargeting {
                tower: parse_tower(next(&mut fields, "cycle", "tower")?)?,
            },
            "speed" => {
                let raw = next(&mut fields, "speed", "multiplier")?;
                let multiplier = raw
                    .parse::<f32>()
                    .ok()
                    .filter(|multiplier| multiplier.is_finite())
                    .ok_or_else(|| ScriptError::InvalidSpeed(raw.to_owned()))?;
                PlayerCommand::SetSpeed { multiplier }
            }
            "pause" => PlayerCommand::TogglePause,
            "reset" => PlayerCommand::Reset,
            _ => return Err(ScriptError::UnknownAction(action.to_owned())),
        };

        let rest: Vec<&str> = fields.collect();
        if !rest.is_empty() {
            return Err(ScriptError::TrailingFields(rest.join(":")));
        }

        Ok(Self { at, command })
    }
}

fn next<'a>(
    fields: &mut impl Iterator<Item = &'a str>,
    action: &'static str,
    argument: &'static str,
) -> Result<&'a str, ScriptError> {
    fields
        .next()
        .filter(|field| !field.is_empty())
        .ok_or(ScriptError::MissingArgument { action, argument })
}

fn parse_time(time: &str) -> Result<Duration, ScriptError> {
    time.parse::<f32>()
        .ok()
        .and_then(|seconds| Duration::try_from_secs_f32(seconds).ok())
        .ok_or_else(|| ScriptError::InvalidTime(time.to_owned()))
}

fn parse_index(index: &str) -> Result<u32, ScriptError> {
    index
        .parse::<u32>()
        .map_err(|_| ScriptError::InvalidIndex(index.to_owned()))
}

fn parse_tower(index: &str) -> Result<TowerId, ScriptError> {
    parse_index(index).map(TowerId::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(value: &str) -> Result<ScriptedCommand, ScriptError> {
        value.parse()
    }

    #[test]
    fn parses_every_action() {
        assert_eq!(
            parse("2.0:place:3:cannon"),
            Ok(ScriptedCommand {
                at: Duration::from_secs(2),
                command: PlayerCommand::PlaceTower {
                    kind: TowerKind::Cannon,
                    plot: PlotIndex::new(3),
                },
            })
        );
        assert_eq!(
            parse("10:upgrade:0:pyro").map(|entry| entry.command),
            Ok(PlayerCommand::UpgradeTower {
                tower: TowerId::new(0),
                element: Element::Pyro,
            })
        );
        assert_eq!(
            parse("12:sell:0").map(|entry| entry.command),
            Ok(PlayerCommand::SellTower {
                tower: TowerId::new(0),
            })
        );
        assert_eq!(
            parse("4:cycle:1").map(|entry| entry.command),
            Ok(PlayerCommand::CycleTargeting {
                tower: TowerId::new(1),
            })
        );
        assert_eq!(
            parse("1:speed:2").map(|entry| entry.command),
            Ok(PlayerCommand::SetSpeed { multiplier: 2.0 })
        );
        assert_eq!(
            parse(" 5 : PAUSE ").map(|entry| entry.command),
            Ok(PlayerCommand::TogglePause)
        );
        assert_eq!(
            parse("6:reset").map(|entry| entry.command),
            Ok(PlayerCommand::Reset)
        );
    }

    #[test]
    fn rejects_malformed_entries() {
        assert_eq!(parse("  "), Err(ScriptError::Empty));
        assert_eq!(parse("3"), Err(ScriptError::MissingAction(String::from("3"))));
        assert_eq!(
            parse("-1:pause"),
            Err(ScriptError::InvalidTime(String::from("-1")))
        );
        assert_eq!(
            parse("1:launch"),
            Err(ScriptError::UnknownAction(String::from("launch")))
        );
        assert_eq!(
            parse("1:place:2"),
            Err(ScriptError::MissingArgument {
                action: "place",
                argument: "tower type",
            })
        );
        assert_eq!(
            parse("1:sell:first"),
            Err(ScriptError::InvalidIndex(String::from("first")))
        );
        assert_eq!(
            parse("1:speed:inf"),
            Err(ScriptError::InvalidSpeed(String::from("inf")))
        );
        assert_eq!(
            parse("1:pause:now"),
            Err(ScriptError::TrailingFields(String::from("now")))
        );
    }

    #[test]
    fn unknown_names_report_their_category() {
        let error = parse("1:upgrade:0:plasma").expect_err("plasma is not an element");
        assert_eq!(error.to_string(), "unknown element 'plasma'");
    }
}
