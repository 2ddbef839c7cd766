//! Participants of a session: credits, team and power balance.

use skirmish_core::{PlayerId, PlayerSetup};
use thiserror::Error;

/// Reasons a purchase may fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum PurchaseError {
    /// Paying the cost would leave the balance negative.
    #[error("cost of {cost} credits exceeds balance of {credits}")]
    InsufficientCredits {
        /// Price of the purchase.
        cost: u32,
        /// Balance at the time of the purchase.
        credits: i64,
    },
}

/// Power produced and consumed by a player's structures during the last tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Power {
    /// Sum of positive power ratings.
    pub produced: u32,
    /// Sum of negative power ratings, as a positive number.
    pub consumed: u32,
}

impl Power {
    /// Produced minus consumed power.
    #[must_use]
    pub fn surplus(&self) -> i64 {
        i64::from(self.produced) - i64::from(self.consumed)
    }

    /// Reports whether consumption exceeds production.
    #[must_use]
    pub fn is_low(&self) -> bool {
        self.surplus() < 0
    }

    fn add(&mut self, rating: i32) {
        if rating >= 0 {
            self.produced = self.produced.saturating_add(rating.unsigned_abs());
        } else {
            self.consumed = self.consumed.saturating_add(rating.unsigned_abs());
        }
    }
}

/// Participant of a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Player {
    id: PlayerId,
    credits: i64,
    power: Power,
    team: u8,
    local: bool,
}

impl Player {
    /// Creates a player from its map setup.
    #[must_use]
    pub fn from_setup(id: PlayerId, setup: &PlayerSetup) -> Self {
        Self {
            id,
            credits: setup.credits,
            power: Power::default(),
            team: setup.team,
            local: setup.local,
        }
    }

    /// Identifier of the player.
    #[must_use]
    pub const fn id(&self) -> PlayerId {
        self.id
    }

    /// Current credit balance.
    #[must_use]
    pub const fn credits(&self) -> i64 {
        self.credits
    }

    /// Team the player belongs to.
    #[must_use]
    pub const fn team(&self) -> u8 {
        self.team
    }

    /// Reports whether the player controls the session.
    #[must_use]
    pub const fn is_local(&self) -> bool {
        self.local
    }

    /// Power balance accumulated during the last tick.
    #[must_use]
    pub const fn power(&self) -> Power {
        self.power
    }

    /// Deducts `cost` from the balance.
    ///
    /// The balance is left untouched when it would go negative.
    pub fn purchase(&mut self, cost: u32) -> Result<i64, PurchaseError> {
        let remaining = self.credits - i64::from(cost);
        if remaining < 0 {
            return Err(PurchaseError::InsufficientCredits {
                cost,
                credits: self.credits,
            });
        }

        self.credits = remaining;
        Ok(self.credits)
    }

    /// Adds `amount` to the balance and returns the new balance.
    pub fn refund(&mut self, amount: u32) -> i64 {
        self.credits = self.credits.saturating_add(i64::from(amount));
        self.credits
    }

    pub(crate) fn reset_power(&mut self) {
        self.power = Power::default();
    }

    pub(crate) fn add_power(&mut self, rating: i32) {
        self.power.add(rating);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(credits: i64) -> Player {
        Player::from_setup(
            PlayerId::new(0),
            &PlayerSetup {
                credits,
                team: 0,
                local: true,
            },
        )
    }

    #[test]
    fn purchase_rejects_overdraft_and_keeps_balance() {
        let mut player = player(100);
        assert_eq!(player.purchase(60), Ok(40));
        assert_eq!(
            player.purchase(60),
            Err(PurchaseError::InsufficientCredits {
                cost: 60,
                credits: 40
            })
        );
        assert_eq!(player.credits(), 40);
        assert_eq!(player.refund(30), 70);
    }

    #[test]
    fn power_splits_by_sign() {
        let mut player = player(0);
        player.add_power(100);
        player.add_power(-30);
        player.add_power(-90);
        assert_eq!(player.power().produced, 100);
        assert_eq!(player.power().consumed, 120);
        assert!(player.power().is_low());

        player.reset_power();
        assert_eq!(player.power(), Power::default());
    }
}
