//! Derived relic quality score.
//!
//! A relic's score is the weighted sum of its sub-stat rolls, each expressed
//! as a multiple of the largest single roll for that stat, relative to the
//! best distribution a +15 relic can reach: the heaviest stat rolled six
//! times and the next three once each.

use std::fmt;

use crate::model::{RelicSubStat, StatKey};
use crate::normalize::stats::{identify, StatTarget};

pub const SCORE_MULTIPLIER: f64 = 100.0;
/// One initial roll plus five upgrades on the best sub-stat.
const BEST_STAT_ROLLS: f64 = 6.0;
const SUB_STAT_SLOTS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubStatKind {
    Hp,
    HpPercent,
    Atk,
    AtkPercent,
    Def,
    DefPercent,
    Spd,
    CritRate,
    CritDmg,
    EffectHitRate,
    EffectRes,
    BreakEffect,
}

pub const TOTAL_SUB_STAT_KINDS: usize = 12;

impl SubStatKind {
    pub const ALL: [SubStatKind; TOTAL_SUB_STAT_KINDS] = [
        SubStatKind::Hp,
        SubStatKind::HpPercent,
        SubStatKind::Atk,
        SubStatKind::AtkPercent,
        SubStatKind::Def,
        SubStatKind::DefPercent,
        SubStatKind::Spd,
        SubStatKind::CritRate,
        SubStatKind::CritDmg,
        SubStatKind::EffectHitRate,
        SubStatKind::EffectRes,
        SubStatKind::BreakEffect,
    ];

    fn index(self) -> usize {
        self as usize
    }

    /// Largest single roll on a 5-star relic, in the units stored on
    /// [`RelicSubStat::value`].
    pub fn max_roll(self) -> f64 {
        match self {
            SubStatKind::Hp => 42.34,
            SubStatKind::Atk | SubStatKind::Def => 21.17,
            SubStatKind::HpPercent | SubStatKind::AtkPercent => 4.32,
            SubStatKind::DefPercent => 5.4,
            SubStatKind::Spd => 2.6,
            SubStatKind::CritRate => 3.24,
            SubStatKind::CritDmg => 6.48,
            SubStatKind::EffectHitRate | SubStatKind::EffectRes => 4.32,
            SubStatKind::BreakEffect => 6.48,
        }
    }

    /// Classify a sub-stat by name and percent flag.
    pub fn classify(sub: &RelicSubStat) -> Option<Self> {
        let property = identify(&sub.name)?;
        let StatTarget::Fixed(key) = property.target else {
            return None;
        };
        let ratio = property.percent_hint.unwrap_or(false) || sub.is_percent;
        Some(match key {
            StatKey::Hp if ratio => SubStatKind::HpPercent,
            StatKey::Hp => SubStatKind::Hp,
            StatKey::Atk if ratio => SubStatKind::AtkPercent,
            StatKey::Atk => SubStatKind::Atk,
            StatKey::Def if ratio => SubStatKind::DefPercent,
            StatKey::Def => SubStatKind::Def,
            StatKey::Spd => SubStatKind::Spd,
            StatKey::CritRate => SubStatKind::CritRate,
            StatKey::CritDmg => SubStatKind::CritDmg,
            StatKey::EffectHitRate => SubStatKind::EffectHitRate,
            StatKey::EffectRes => SubStatKind::EffectRes,
            StatKey::BreakEffect => SubStatKind::BreakEffect,
        })
    }
}

pub trait RelicScorer: Send + Sync {
    /// Score in `0..=100`, or `None` when nothing on the relic is scoreable.
    fn score(&self, sub_stats: &[RelicSubStat]) -> Option<f64>;
}

#[derive(Debug)]
pub enum ScorerError {
    NegativeWeight { kind: SubStatKind, value: f64 },
    AllWeightsZero,
}

impl fmt::Display for ScorerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScorerError::NegativeWeight { kind, value } => {
                write!(f, "weight for {:?} must be a non-negative number, got {}", kind, value)
            }
            ScorerError::AllWeightsZero => write!(f, "at least one weight must be positive"),
        }
    }
}

impl std::error::Error for ScorerError {}

fn validate_weights(weights: &[f64; TOTAL_SUB_STAT_KINDS]) -> Result<(), ScorerError> {
    let mut any_positive = false;
    for (kind, &w) in SubStatKind::ALL.iter().zip(weights.iter()) {
        if !w.is_finite() || w < 0.0 {
            return Err(ScorerError::NegativeWeight {
                kind: *kind,
                value: w,
            });
        }
        if w > 0.0 {
            any_positive = true;
        }
    }
    if !any_positive {
        return Err(ScorerError::AllWeightsZero);
    }
    Ok(())
}

/// Weighted roll count of the best reachable relic.
fn potential(weights: &[f64; TOTAL_SUB_STAT_KINDS]) -> f64 {
    let mut sorted = *weights;
    sorted.sort_by(|a, b| b.total_cmp(a));
    let rest: f64 = sorted[1..SUB_STAT_SLOTS].iter().sum();
    BEST_STAT_ROLLS * sorted[0] + rest
}

pub struct LinearScorer {
    weights: [f64; TOTAL_SUB_STAT_KINDS],
    potential: f64,
}

impl LinearScorer {
    pub fn new(weights: [f64; TOTAL_SUB_STAT_KINDS]) -> Result<Self, ScorerError> {
        validate_weights(&weights)?;
        Ok(Self {
            potential: potential(&weights),
            weights,
        })
    }

    pub fn weight(&self, kind: SubStatKind) -> f64 {
        self.weights[kind.index()]
    }
}

impl Default for LinearScorer {
    /// Crit-and-speed leaning weights suited to most damage dealers.
    fn default() -> Self {
        let mut weights = [0.0; TOTAL_SUB_STAT_KINDS];
        for (kind, w) in [
            (SubStatKind::CritRate, 1.0),
            (SubStatKind::CritDmg, 1.0),
            (SubStatKind::Spd, 1.0),
            (SubStatKind::AtkPercent, 0.75),
            (SubStatKind::BreakEffect, 0.5),
            (SubStatKind::EffectHitRate, 0.5),
            (SubStatKind::EffectRes, 0.25),
            (SubStatKind::HpPercent, 0.25),
            (SubStatKind::DefPercent, 0.25),
            (SubStatKind::Atk, 0.3),
            (SubStatKind::Hp, 0.1),
            (SubStatKind::Def, 0.1),
        ] {
            weights[kind.index()] = w;
        }
        Self {
            potential: potential(&weights),
            weights,
        }
    }
}

impl RelicScorer for LinearScorer {
    fn score(&self, sub_stats: &[RelicSubStat]) -> Option<f64> {
        let mut weighted_rolls = 0.0;
        let mut scored_any = false;
        for sub in sub_stats {
            let Some(kind) = SubStatKind::classify(sub) else {
                continue;
            };
            scored_any = true;
            if sub.value > 0.0 {
                weighted_rolls += self.weight(kind) * sub.value / kind.max_roll();
            }
        }
        if !scored_any {
            return None;
        }
        let raw = SCORE_MULTIPLIER * weighted_rolls / self.potential;
        Some(((raw.clamp(0.0, SCORE_MULTIPLIER)) * 10.0).round() / 10.0)
    }
}
