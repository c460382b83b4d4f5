//! Player and operator commands queued between ticks.
//!
//! Commands arriving from outside the simulation (the observer API, a UI)
//! are never applied mid-tick. They wait in the operator queue and are
//! applied in arrival order at the next tick boundary, each producing a
//! [`CommandResult`] reported in that tick's summary.

use serde::{Deserialize, Serialize};
use tilth_economy::ShopItem;
use tilth_types::{ActionRejection, CommandId, HarvestResult, SpeciesId, WeatherKind};

use crate::context::SimulationContext;

/// An action against the farm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum FarmCommand {
    /// Plant a seed.
    Plant {
        /// Target plot.
        plot: usize,
        /// Species to plant.
        species: SpeciesId,
    },
    /// Water a plot by hand.
    Water {
        /// Target plot.
        plot: usize,
    },
    /// Apply fertilizer.
    Fertilize {
        /// Target plot.
        plot: usize,
    },
    /// Harvest a ready crop.
    Harvest {
        /// Target plot.
        plot: usize,
    },
    /// Remove a sick or dead crop.
    Clear {
        /// Target plot.
        plot: usize,
    },
    /// Install a spare sprinkler.
    InstallSprinkler {
        /// Target plot.
        plot: usize,
    },
    /// Unlock more plots; `None` uses the configured batch size.
    Expand {
        /// Plots to unlock.
        #[serde(default)]
        count: Option<usize>,
    },
    /// Buy from the shop.
    Buy {
        /// What to buy.
        item: ShopItem,
    },
    /// Force special weather (operator only).
    ForceWeather {
        /// Weather to install.
        kind: WeatherKind,
        /// Ticks the forced weather lasts, starting with the next one.
        duration: u64,
    },
}

/// What a successful command did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CommandOutcome {
    /// The action was applied.
    Done,
    /// A crop was harvested.
    Harvested {
        /// Harvest details.
        harvest: HarvestResult,
    },
    /// Plots were unlocked.
    Unlocked {
        /// Number of plots unlocked.
        count: usize,
    },
    /// Goods were bought.
    Purchased {
        /// Coins spent.
        cost: u64,
    },
    /// The action was refused.
    Rejected {
        /// Why.
        reason: ActionRejection,
    },
}

/// A queued command paired with its outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResult {
    /// Queue-assigned identifier.
    pub id: CommandId,
    /// The command as submitted.
    pub command: FarmCommand,
    /// What happened.
    pub outcome: CommandOutcome,
}

/// A command waiting for the next tick boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueuedCommand {
    /// Queue-assigned identifier.
    pub id: CommandId,
    /// The command.
    pub command: FarmCommand,
}

impl QueuedCommand {
    /// Pair a command with its identifier.
    pub const fn new(id: CommandId, command: FarmCommand) -> Self {
        Self { id, command }
    }
}

impl FarmCommand {
    /// Apply the command to the farm.
    pub fn apply(self, context: &mut SimulationContext) -> CommandOutcome {
        let result = match self {
            Self::Plant { plot, species } => context.plant(plot, species).map(|()| CommandOutcome::Done),
            Self::Water { plot } => context.water(plot).map(|()| CommandOutcome::Done),
            Self::Fertilize { plot } => context.fertilize(plot).map(|()| CommandOutcome::Done),
            Self::Harvest { plot } => context
                .harvest(plot)
                .map(|harvest| CommandOutcome::Harvested { harvest }),
            Self::Clear { plot } => context.clear(plot).map(|()| CommandOutcome::Done),
            Self::InstallSprinkler { plot } => context
                .install_sprinkler(plot)
                .map(|()| CommandOutcome::Done),
            Self::Expand { count } => {
                let count = count.unwrap_or_else(|| context.plots_per_expansion());
                context
                    .expand(count)
                    .map(|count| CommandOutcome::Unlocked { count })
            }
            Self::Buy { item } => context.buy(item).map(|cost| CommandOutcome::Purchased { cost }),
            Self::ForceWeather { kind, duration } => {
                context.force_weather(kind, duration);
                Ok(CommandOutcome::Done)
            }
        };
        result.unwrap_or_else(|reason| CommandOutcome::Rejected { reason })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn commands_use_action_tags() {
        let cmd: FarmCommand =
            serde_json::from_str(r#"{"action":"plant","plot":2,"species":"corn"}"#).unwrap();
        assert_eq!(
            cmd,
            FarmCommand::Plant {
                plot: 2,
                species: SpeciesId::Corn
            }
        );

        let cmd: FarmCommand = serde_json::from_str(r#"{"action":"expand"}"#).unwrap();
        assert_eq!(cmd, FarmCommand::Expand { count: None });
    }

    #[test]
    fn rejection_serializes_reason() {
        let outcome = CommandOutcome::Rejected {
            reason: ActionRejection::PlotLocked,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "rejected");
        assert_eq!(json["reason"], "plot_locked");
    }
}
