//! Axis tuning panels.
//!
//! Each axis turns an operator-entered integer into the writes the controller
//! expects: the axis's context-select prefix (one write per entry), then the
//! selected gain term followed by the value, e.g. `m`, `a`, `P50`.

use crate::config::AxisConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Which PID gain a value applies to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GainTerm {
    #[default]
    P,
    I,
    D,
}

impl GainTerm {
    pub fn tag(self) -> char {
        match self {
            GainTerm::P => 'P',
            GainTerm::I => 'I',
            GainTerm::D => 'D',
        }
    }
}

impl fmt::Display for GainTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

impl FromStr for GainTerm {
    type Err = AxisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "P" | "p" => Ok(GainTerm::P),
            "I" | "i" => Ok(GainTerm::I),
            "D" | "d" => Ok(GainTerm::D),
            other => Err(AxisError::UnknownTerm(other.to_string())),
        }
    }
}

/// Problems with operator input for an axis.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AxisError {
    #[error("Only integer values accepted, got {0:?}")]
    InvalidValue(String),

    #[error("Unknown gain term {0:?}; expected P, I or D")]
    UnknownTerm(String),

    #[error("No axis {index}; valid axes are 1-{count}")]
    NoSuchAxis { index: usize, count: usize },
}

/// One axis panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisControl {
    label: String,
    prefix: Vec<String>,
    term: GainTerm,
}

impl AxisControl {
    pub fn new(label: impl Into<String>, prefix: Vec<String>) -> Self {
        Self {
            label: label.into(),
            prefix,
            term: GainTerm::default(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn term(&self) -> GainTerm {
        self.term
    }

    pub fn select_term(&mut self, term: GainTerm) {
        self.term = term;
    }

    /// Turn an entered value into the writes to send, in order.
    ///
    /// Blank input yields nothing. Anything that is not an integer is
    /// rejected before a single write is produced. An accepted value is sent
    /// exactly as typed (minus surrounding whitespace), so `007` stays `007`.
    pub fn compose(&self, value: &str) -> Result<Vec<String>, AxisError> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(Vec::new());
        }
        if !is_integer(value) {
            return Err(AxisError::InvalidValue(value.to_string()));
        }

        let mut writes = self.prefix.clone();
        writes.push(format!("{}{}", self.term.tag(), value));
        Ok(writes)
    }
}

/// An optional sign followed by one or more ASCII digits, of any length.
fn is_integer(value: &str) -> bool {
    let digits = value.strip_prefix(['+', '-']).unwrap_or(value);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

impl From<&AxisConfig> for AxisControl {
    fn from(config: &AxisConfig) -> Self {
        Self::new(config.label.clone(), config.prefix.clone())
    }
}

/// The set of axis panels, addressed 1-based like their labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisPanel {
    axes: Vec<AxisControl>,
}

impl AxisPanel {
    pub fn from_config(axes: &[AxisConfig]) -> Self {
        Self {
            axes: axes.iter().map(AxisControl::from).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.axes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<&AxisControl, AxisError> {
        let count = self.axes.len();
        index
            .checked_sub(1)
            .and_then(|i| self.axes.get(i))
            .ok_or(AxisError::NoSuchAxis { index, count })
    }

    pub fn get_mut(&mut self, index: usize) -> Result<&mut AxisControl, AxisError> {
        let count = self.axes.len();
        index
            .checked_sub(1)
            .and_then(|i| self.axes.get_mut(i))
            .ok_or(AxisError::NoSuchAxis { index, count })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConsoleConfig;
    use pretty_assertions::assert_eq;

    fn axis_a() -> AxisControl {
        AxisControl::new("Axis 1", vec!["m".into(), "a".into()])
    }

    #[test]
    fn test_compose_prefix_then_tagged_value() {
        assert_eq!(axis_a().compose("50").unwrap(), vec!["m", "a", "P50"]);
    }

    #[test]
    fn test_compose_uses_selected_term() {
        let mut axis = axis_a();
        axis.select_term(GainTerm::D);
        assert_eq!(axis.compose("-12").unwrap(), vec!["m", "a", "D-12"]);
    }

    #[test]
    fn test_blank_value_sends_nothing() {
        assert!(axis_a().compose("   ").unwrap().is_empty());
    }

    #[test]
    fn test_value_is_sent_as_typed() {
        let axis = axis_a();
        assert_eq!(axis.compose("007").unwrap(), vec!["m", "a", "P007"]);
        assert_eq!(axis.compose(" +50 ").unwrap(), vec!["m", "a", "P+50"]);
        assert_eq!(
            axis.compose("99999999999999999999").unwrap(),
            vec!["m", "a", "P99999999999999999999"]
        );
    }

    #[test]
    fn test_non_integer_is_rejected() {
        for bad in ["1.5", "abc", "5e3", "0x10", "-", "+", "1_000", "--5", "5-"] {
            assert_eq!(
                axis_a().compose(bad),
                Err(AxisError::InvalidValue(bad.to_string()))
            );
        }
    }

    #[test]
    fn test_term_parsing() {
        assert_eq!("i".parse::<GainTerm>().unwrap(), GainTerm::I);
        assert!("Q".parse::<GainTerm>().is_err());
    }

    #[test]
    fn test_panel_indexing_is_one_based() {
        let panel = AxisPanel::from_config(&ConsoleConfig::default().axes);
        assert_eq!(panel.len(), 4);
        assert_eq!(panel.get(4).unwrap().compose("7").unwrap(), vec!["m", "d", "P7"]);
        assert_eq!(
            panel.get(0).unwrap_err(),
            AxisError::NoSuchAxis { index: 0, count: 4 }
        );
        assert!(panel.get(5).is_err());
    }
}
