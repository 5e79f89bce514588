//! AD9081 quick-configuration mode tables.
//!
//! The tables ship with the crate as TOML and are parsed once on first use.
//! After that they are shared read-only by every model and solve session.

use jif_model::{JesdClass, JesdParams, ModelError};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

const MODES_TOML: &str = include_str!("../data/ad9081_modes.toml");

static MODE_TABLE: LazyLock<Result<ModeTable, String>> =
    LazyLock::new(|| toml::from_str::<ModeTable>(MODES_TOML).map_err(|e| e.to_string()));

/// Data direction of a converter path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// ADC path, converter to FPGA.
    Rx,
    /// DAC path, FPGA to converter.
    Tx,
}

impl Direction {
    /// Returns `"rx"` or `"tx"`.
    pub fn name(self) -> &'static str {
        match self {
            Direction::Rx => "rx",
            Direction::Tx => "tx",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Deserialize)]
struct ClassModes {
    jesd204b: BTreeMap<String, JesdParams>,
    jesd204c: BTreeMap<String, JesdParams>,
}

impl ClassModes {
    fn get(&self, class: JesdClass) -> &BTreeMap<String, JesdParams> {
        match class {
            JesdClass::Jesd204B => &self.jesd204b,
            JesdClass::Jesd204C => &self.jesd204c,
        }
    }
}

/// Every quick-configuration mode, keyed by direction, class and mode id.
#[derive(Debug, Deserialize)]
pub struct ModeTable {
    rx: ClassModes,
    tx: ClassModes,
}

impl ModeTable {
    /// Returns the modes of one direction and class, ordered by numeric id.
    pub fn modes(&self, direction: Direction, class: JesdClass) -> Vec<(&str, &JesdParams)> {
        let mut modes: Vec<_> = self
            .table(direction, class)
            .iter()
            .map(|(id, params)| (id.as_str(), params))
            .collect();
        modes.sort_by_key(|(id, _)| (id.parse::<u32>().unwrap_or(u32::MAX), id.to_string()));
        modes
    }

    /// Looks up a mode by id.
    pub fn find(&self, direction: Direction, class: JesdClass, id: &str) -> Option<&JesdParams> {
        self.table(direction, class).get(id)
    }

    /// Returns the id of the mode whose parameters equal `params`.
    pub fn mode_id(
        &self,
        direction: Direction,
        class: JesdClass,
        params: &JesdParams,
    ) -> Option<&str> {
        self.modes(direction, class)
            .into_iter()
            .find(|(_, p)| *p == params)
            .map(|(id, _)| id)
    }

    fn table(&self, direction: Direction, class: JesdClass) -> &BTreeMap<String, JesdParams> {
        match direction {
            Direction::Rx => self.rx.get(class),
            Direction::Tx => self.tx.get(class),
        }
    }
}

/// Returns the process-wide mode table.
pub fn mode_table() -> Result<&'static ModeTable, ModelError> {
    MODE_TABLE.as_ref().map_err(|e| {
        ModelError::InvalidConfiguration(format!("AD9081 mode table is malformed: {e}"))
    })
}

/// Resolves a quick-configuration mode id to its parameters.
pub fn quick_mode(
    direction: Direction,
    class: JesdClass,
    id: &str,
) -> Result<JesdParams, ModelError> {
    let table = mode_table()?;
    table.find(direction, class, id).copied().ok_or_else(|| {
        let known = table
            .modes(direction, class)
            .iter()
            .map(|(id, _)| *id)
            .collect::<Vec<_>>()
            .join(", ");
        ModelError::InvalidConfiguration(format!(
            "unknown {direction} {class} quick-configuration mode {id:?}; available: {known}"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_parses() {
        let table = mode_table().unwrap();
        for direction in [Direction::Rx, Direction::Tx] {
            for class in JesdClass::ALL {
                assert!(!table.modes(direction, class).is_empty());
            }
        }
    }

    #[test]
    fn every_mode_is_consistent() {
        let table = mode_table().unwrap();
        for direction in [Direction::Rx, Direction::Tx] {
            for class in JesdClass::ALL {
                for (id, params) in table.modes(direction, class) {
                    assert!(
                        params.check_consistency().is_ok(),
                        "{direction} {class} mode {id} is inconsistent"
                    );
                }
            }
        }
    }

    #[test]
    fn rx_mode_zero() {
        let params = quick_mode(Direction::Rx, JesdClass::Jesd204B, "0").unwrap();
        assert_eq!((params.m, params.l, params.f, params.k), (2, 1, 4, 32));
        assert_eq!((params.n, params.np, params.s), (16, 16, 1));
    }

    #[test]
    fn modes_are_numerically_ordered() {
        let table = mode_table().unwrap();
        let ids: Vec<_> = table
            .modes(Direction::Rx, JesdClass::Jesd204B)
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(ids.first(), Some(&"0"));
        assert_eq!(ids.last(), Some(&"10"));
    }

    #[test]
    fn reverse_lookup() {
        let table = mode_table().unwrap();
        let params = quick_mode(Direction::Tx, JesdClass::Jesd204B, "2").unwrap();
        assert_eq!(table.mode_id(Direction::Tx, JesdClass::Jesd204B, &params), Some("2"));
    }

    #[test]
    fn unknown_mode_lists_alternatives() {
        let err = quick_mode(Direction::Rx, JesdClass::Jesd204C, "99").unwrap_err();
        assert!(matches!(
            err,
            ModelError::InvalidConfiguration(msg) if msg.contains("available: 0, 1")
        ));
    }
}
