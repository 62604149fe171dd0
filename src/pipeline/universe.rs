//! Instrument universe: identifier → display name
//!
//! Static groupings used for labels and default instrument sets. Nothing
//! here restricts which identifiers may be analyzed.

pub type Group = &'static [(&'static str, &'static str)];

pub const MARKET_INDICES: Group = &[
    ("SPY", "S&P 500"),
    ("QQQ", "Nasdaq 100"),
    ("DIA", "Dow Jones"),
];

pub const SECTOR_ETFS: Group = &[
    ("XLK", "Technology"),
    ("XLF", "Financials"),
    ("XLV", "Health Care"),
    ("XLE", "Energy"),
    ("XLY", "Consumer Discretionary"),
    ("XLI", "Industrials"),
    ("XLP", "Consumer Staples"),
    ("XLC", "Communication Services"),
    ("XLRE", "Real Estate"),
    ("XLB", "Materials"),
    ("XLU", "Utilities"),
];

pub const INDUSTRY_ETFS: Group = &[
    ("SOXX", "Semiconductors"),
    ("SKYY", "Cloud Computing"),
    ("HACK", "Cybersecurity"),
    ("KRE", "Regional Banks"),
    ("XBI", "Biotech"),
    ("IHI", "Medical Devices"),
    ("XRT", "Retail"),
    ("ITB", "Home Construction"),
    ("ICLN", "Clean Energy"),
    ("IYT", "Transportation"),
];

pub const QUICK_SCAN_ETFS: &[&str] = &[
    "SPY", "QQQ", "DIA", "XLK", "XLF", "XLV", "XLE", "XLY", "XLI", "XLP", "XLC",
];

/// Named groups accepted by the sector summary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniverseGroup {
    Indices,
    Sectors,
    Industries,
    All,
}

impl UniverseGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            UniverseGroup::Indices => "indices",
            UniverseGroup::Sectors => "sectors",
            UniverseGroup::Industries => "industries",
            UniverseGroup::All => "all",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "indices" | "market" => Some(UniverseGroup::Indices),
            "sectors" | "sector" => Some(UniverseGroup::Sectors),
            "industries" | "industry" => Some(UniverseGroup::Industries),
            "all" => Some(UniverseGroup::All),
            _ => None,
        }
    }

    /// Members of the group; `All` is indices followed by sectors
    pub fn members(&self) -> Vec<(&'static str, &'static str)> {
        match self {
            UniverseGroup::Indices => MARKET_INDICES.to_vec(),
            UniverseGroup::Sectors => SECTOR_ETFS.to_vec(),
            UniverseGroup::Industries => INDUSTRY_ETFS.to_vec(),
            UniverseGroup::All => all_etfs(),
        }
    }
}

/// Market indices followed by the sector ETFs
pub fn all_etfs() -> Vec<(&'static str, &'static str)> {
    MARKET_INDICES.iter().chain(SECTOR_ETFS).copied().collect()
}

/// Display name across every group, None for identifiers outside the universe
pub fn display_name(instrument: &str) -> Option<&'static str> {
    let instrument = instrument.to_uppercase();
    MARKET_INDICES
        .iter()
        .chain(SECTOR_ETFS)
        .chain(INDUSTRY_ETFS)
        .find(|(id, _)| *id == instrument)
        .map(|(_, name)| *name)
}

/// Display name, falling back to the identifier itself
pub fn label(instrument: &str) -> String {
    display_name(instrument)
        .map(str::to_string)
        .unwrap_or_else(|| instrument.to_uppercase())
}
