//! Distance norm and classifier mode.

use crate::regs::{ncr, nsr};

/// Distance norm used by the comparator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DistanceMode {
    /// Sum of absolute component differences.
    #[default]
    L1,
    /// Largest absolute component difference.
    LSup,
}

impl DistanceMode {
    /// Raw bit value (0 for L1, 1 for L-Sup).
    #[must_use]
    pub const fn bit(self) -> u16 {
        match self {
            Self::L1 => 0,
            Self::LSup => 1,
        }
    }

    /// Decode the norm bit of an NCR or GCR value.
    #[must_use]
    pub const fn from_ncr(value: u16) -> Self {
        if value & ncr::NORM == 0 {
            Self::L1
        } else {
            Self::LSup
        }
    }
}

impl std::fmt::Display for DistanceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::L1 => write!(f, "L1"),
            Self::LSup => write!(f, "LSup"),
        }
    }
}

impl std::str::FromStr for DistanceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "l1" => Ok(Self::L1),
            "lsup" | "l-sup" | "linf" => Ok(Self::LSup),
            other => Err(format!("unknown distance mode '{other}' (expected l1 or lsup)")),
        }
    }
}

/// Classification mode of the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ClassifierMode {
    /// Radial basis function: only neurons whose influence field covers the
    /// input respond.
    #[default]
    Rbf,
    /// K-nearest neighbour: every committed neuron responds, nearest first.
    Knn,
}

impl ClassifierMode {
    /// Raw bit value (0 for RBF, 1 for k-NN).
    #[must_use]
    pub const fn bit(self) -> u16 {
        match self {
            Self::Rbf => 0,
            Self::Knn => 1,
        }
    }

    /// Decode the class-mode bit of an NSR value.
    #[must_use]
    pub const fn from_nsr(value: u16) -> Self {
        if value & nsr::CLASS_MODE == 0 {
            Self::Rbf
        } else {
            Self::Knn
        }
    }
}

impl std::fmt::Display for ClassifierMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rbf => write!(f, "RBF"),
            Self::Knn => write!(f, "KNN"),
        }
    }
}

impl std::str::FromStr for ClassifierMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rbf" => Ok(Self::Rbf),
            "knn" | "k-nn" => Ok(Self::Knn),
            other => Err(format!("unknown classifier mode '{other}' (expected rbf or knn)")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_bit_decodes_from_ncr() {
        assert_eq!(DistanceMode::from_ncr(0x0005), DistanceMode::L1);
        assert_eq!(DistanceMode::from_ncr(0x0085), DistanceMode::LSup);
        assert_eq!(DistanceMode::LSup.bit() << ncr::NORM_SHIFT, ncr::NORM);
    }

    #[test]
    fn classifier_bit_decodes_from_nsr() {
        assert_eq!(ClassifierMode::from_nsr(nsr::NET_MODE), ClassifierMode::Rbf);
        assert_eq!(ClassifierMode::from_nsr(nsr::CLASS_MODE), ClassifierMode::Knn);
    }

    #[test]
    fn modes_parse_case_insensitively() {
        assert_eq!("LSUP".parse::<DistanceMode>(), Ok(DistanceMode::LSup));
        assert_eq!("Knn".parse::<ClassifierMode>(), Ok(ClassifierMode::Knn));
        assert!("l2".parse::<DistanceMode>().is_err());
    }
}
