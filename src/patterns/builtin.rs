//! Built-in reversal patterns
//!
//! | Pattern | Trend gate | Shape gate | Geometry | Bias |
//! |---|---|---|---|---|
//! | Bullish Engulfing | downtrend | Bearish | engulfing | bullish |
//! | Bearish Engulfing | uptrend | Bullish | engulfing | bearish |
//! | Piercing | downtrend | Bearish | penetration | bullish |
//! | Dark Cloud Cover | uptrend | Bullish | penetration | bearish |
//! | Hammer | downtrend | Hammer | - | bullish |
//! | Shooting Star | downtrend | Shooting Star | - | bearish |
//!
//! Every built-in is judged by EMA confirmation two bars after its last bar.

use serde::{Deserialize, Serialize};

use super::{EvaluationPolicy, Geometry, PatternDefinition, ShapeGate, TrendGate};
use crate::{
    classifier::{CandleShape, ReversalShape},
    Direction, PatternId,
};

/// Macro to generate the BuiltinPattern enum and its definition table
macro_rules! define_builtin_patterns {
    (
        $(
            $variant:ident => $id:literal, $name:literal {
                bias: $bias:expr,
                trend: $trend:expr,
                shape: $shape:expr,
                geometry: $geometry:expr $(,)?
            }
        ),* $(,)?
    ) => {
        /// Patterns shipped with the crate
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum BuiltinPattern {
            $($variant),*
        }

        impl BuiltinPattern {
            /// All built-ins in registration order
            pub const ALL: &'static [BuiltinPattern] = &[$(BuiltinPattern::$variant),*];

            #[inline]
            pub fn id(self) -> PatternId {
                match self {
                    $(Self::$variant => PatternId($id)),*
                }
            }

            /// Human readable name
            pub fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $name),*
                }
            }

            pub fn from_id(id: &str) -> Option<Self> {
                match id {
                    $($id => Some(Self::$variant),)*
                    _ => None,
                }
            }

            pub fn definition(self) -> PatternDefinition {
                match self {
                    $(Self::$variant => PatternDefinition {
                        id: PatternId($id),
                        bias: $bias,
                        trend_gate: $trend,
                        shape_gate: $shape,
                        geometry: $geometry,
                        policy: EvaluationPolicy::ema_confirmation(),
                    }),*
                }
            }
        }
    };
}

define_builtin_patterns! {
    BullishEngulfing => "BULLISH_ENGULFING", "Bullish Engulfing" {
        bias: Direction::Bullish,
        trend: TrendGate::Downtrend,
        shape: ShapeGate::Candle(CandleShape::Bearish),
        geometry: Geometry::Engulfing(Direction::Bullish),
    },
    BearishEngulfing => "BEARISH_ENGULFING", "Bearish Engulfing" {
        bias: Direction::Bearish,
        trend: TrendGate::Uptrend,
        shape: ShapeGate::Candle(CandleShape::Bullish),
        geometry: Geometry::Engulfing(Direction::Bearish),
    },
    Piercing => "PIERCING", "Piercing" {
        bias: Direction::Bullish,
        trend: TrendGate::Downtrend,
        shape: ShapeGate::Candle(CandleShape::Bearish),
        geometry: Geometry::Penetration(Direction::Bullish),
    },
    DarkCloudCover => "DARK_CLOUD_COVER", "Dark Cloud Cover" {
        bias: Direction::Bearish,
        trend: TrendGate::Uptrend,
        shape: ShapeGate::Candle(CandleShape::Bullish),
        geometry: Geometry::Penetration(Direction::Bearish),
    },
    Hammer => "HAMMER", "Hammer" {
        bias: Direction::Bullish,
        trend: TrendGate::Downtrend,
        shape: ShapeGate::Reversal(ReversalShape::Hammer),
        geometry: Geometry::None,
    },
    // Shooting stars are gated on a preceding downtrend, like hammers.
    ShootingStar => "SHOOTING_STAR", "Shooting Star" {
        bias: Direction::Bearish,
        trend: TrendGate::Downtrend,
        shape: ShapeGate::Reversal(ReversalShape::ShootingStar),
        geometry: Geometry::None,
    },
}

impl std::fmt::Display for BuiltinPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
