use std::fmt;
use std::str::FromStr;

use crate::error::EvmError;

/// Named versions of the instruction set and cost schedule, oldest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Revision {
    Frontier,
    Homestead,
    TangerineWhistle,
    SpuriousDragon,
    Byzantium,
    Constantinople,
    Petersburg,
    #[default]
    Istanbul,
    Berlin,
}

impl Revision {
    pub const ALL: [Revision; 9] = [
        Revision::Frontier,
        Revision::Homestead,
        Revision::TangerineWhistle,
        Revision::SpuriousDragon,
        Revision::Byzantium,
        Revision::Constantinople,
        Revision::Petersburg,
        Revision::Istanbul,
        Revision::Berlin,
    ];

    pub const LATEST: Revision = Revision::Berlin;

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Revision::Frontier => "frontier",
            Revision::Homestead => "homestead",
            Revision::TangerineWhistle => "tangerine_whistle",
            Revision::SpuriousDragon => "spurious_dragon",
            Revision::Byzantium => "byzantium",
            Revision::Constantinople => "constantinople",
            Revision::Petersburg => "petersburg",
            Revision::Istanbul => "istanbul",
            Revision::Berlin => "berlin",
        }
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Revision {
    type Err = EvmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Revision::ALL
            .iter()
            .copied()
            .find(|r| r.name() == norm || r.name().replace('_', "") == norm)
            .ok_or_else(|| EvmError::UnknownRevision(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordered_oldest_first() {
        assert!(Revision::Frontier < Revision::Homestead);
        assert!(Revision::Petersburg < Revision::Istanbul);
        assert_eq!(Revision::LATEST, *Revision::ALL.last().unwrap());
    }

    #[test]
    fn parse_names() {
        assert_eq!("Istanbul".parse::<Revision>().unwrap(), Revision::Istanbul);
        assert_eq!("tangerine-whistle".parse::<Revision>().unwrap(), Revision::TangerineWhistle);
        assert_eq!("spuriousdragon".parse::<Revision>().unwrap(), Revision::SpuriousDragon);
        assert!("london".parse::<Revision>().is_err());
    }
}
