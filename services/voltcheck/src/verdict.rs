//! Charger quality classification from test aggregates

use std::fmt;

use serde::{Deserialize, Serialize};

/// Rating of the average charging current
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurrentTier {
    VeryGood,
    Good,
    Fair,
    Low,
}

impl CurrentTier {
    pub fn classify(avg_current_ma: f64) -> Self {
        if avg_current_ma >= 1500.0 {
            CurrentTier::VeryGood
        } else if avg_current_ma >= 1000.0 {
            CurrentTier::Good
        } else if avg_current_ma >= 500.0 {
            CurrentTier::Fair
        } else {
            CurrentTier::Low
        }
    }
}

/// Rating of how steady the current was
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StabilityTier {
    VeryGood,
    Good,
    Fair,
    Poor,
}

impl StabilityTier {
    pub fn classify(stability_pct: f64) -> Self {
        if stability_pct >= 90.0 {
            StabilityTier::VeryGood
        } else if stability_pct >= 80.0 {
            StabilityTier::Good
        } else if stability_pct >= 70.0 {
            StabilityTier::Fair
        } else {
            StabilityTier::Poor
        }
    }
}

/// Rating of the voltage sag under load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoltageDropTier {
    Minimal,
    Normal,
    High,
    VeryHigh,
}

impl VoltageDropTier {
    pub fn classify(voltage_drop_v: f64) -> Self {
        if voltage_drop_v <= 0.1 {
            VoltageDropTier::Minimal
        } else if voltage_drop_v <= 0.3 {
            VoltageDropTier::Normal
        } else if voltage_drop_v <= 0.5 {
            VoltageDropTier::High
        } else {
            VoltageDropTier::VeryHigh
        }
    }
}

/// Overall judgement of the charger and cable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallVerdict {
    Excellent,
    Good,
    NeedsAttention,
    ReplaceChargerOrCable,
}

impl OverallVerdict {
    pub fn classify(avg_current_ma: f64, stability_pct: f64, voltage_drop_v: f64) -> Self {
        if avg_current_ma >= 1000.0 && stability_pct >= 80.0 && voltage_drop_v <= 0.3 {
            OverallVerdict::Excellent
        } else if avg_current_ma >= 500.0 && stability_pct >= 70.0 && voltage_drop_v <= 0.5 {
            OverallVerdict::Good
        } else if avg_current_ma >= 500.0 && stability_pct >= 60.0 {
            OverallVerdict::NeedsAttention
        } else {
            OverallVerdict::ReplaceChargerOrCable
        }
    }
}

impl fmt::Display for OverallVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverallVerdict::Excellent => write!(f, "Charger and cable are in EXCELLENT condition"),
            OverallVerdict::Good => write!(f, "Charger and cable are in GOOD condition"),
            OverallVerdict::NeedsAttention => write!(f, "Charger or cable needs attention"),
            OverallVerdict::ReplaceChargerOrCable => {
                write!(f, "Replacing the charger or cable is recommended")
            }
        }
    }
}

/// Per-metric tiers plus the combined verdict for one test run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub avg_current_ma: f64,
    pub stability_pct: f64,
    pub voltage_drop_v: f64,
    pub current: CurrentTier,
    pub stability: StabilityTier,
    pub voltage_drop: VoltageDropTier,
    pub overall: OverallVerdict,
}

impl Verdict {
    pub fn classify(avg_current_ma: f64, stability_pct: f64, voltage_drop_v: f64) -> Self {
        Self {
            avg_current_ma,
            stability_pct,
            voltage_drop_v,
            current: CurrentTier::classify(avg_current_ma),
            stability: StabilityTier::classify(stability_pct),
            voltage_drop: VoltageDropTier::classify(voltage_drop_v),
            overall: OverallVerdict::classify(avg_current_ma, stability_pct, voltage_drop_v),
        }
    }
}

fn mark(ok: bool, warn: bool) -> &'static str {
    if ok {
        "✓"
    } else if warn {
        "⚠"
    } else {
        "✗"
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (label, ok, warn) = match self.current {
            CurrentTier::VeryGood => ("VERY GOOD", true, false),
            CurrentTier::Good => ("GOOD", true, false),
            CurrentTier::Fair => ("FAIR", false, true),
            CurrentTier::Low => ("LOW", false, false),
        };
        writeln!(
            f,
            "{} Charging current {} ({:.0} mA)",
            mark(ok, warn),
            label,
            self.avg_current_ma
        )?;

        let (label, ok, warn) = match self.stability {
            StabilityTier::VeryGood => ("VERY GOOD", true, false),
            StabilityTier::Good => ("GOOD", true, false),
            StabilityTier::Fair => ("FAIR", false, true),
            StabilityTier::Poor => ("POOR", false, false),
        };
        writeln!(
            f,
            "{} Stability {} ({:.1}%)",
            mark(ok, warn),
            label,
            self.stability_pct
        )?;

        let (label, ok, warn) = match self.voltage_drop {
            VoltageDropTier::Minimal => ("MINIMAL", true, false),
            VoltageDropTier::Normal => ("NORMAL", true, false),
            VoltageDropTier::High => ("HIGH", false, true),
            VoltageDropTier::VeryHigh => ("VERY HIGH", false, false),
        };
        writeln!(
            f,
            "{} Voltage drop {} ({:.3} V)",
            mark(ok, warn),
            label,
            self.voltage_drop_v
        )?;

        writeln!(f)?;
        write!(f, "CONCLUSION: {}", self.overall)
    }
}
