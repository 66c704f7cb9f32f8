use once_cell::sync::Lazy;
use std::collections::HashMap;
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, EnumIter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl Month {
    /// 1-based month number.
    pub fn number(self) -> u32 {
        self as u32 + 1
    }
}

pub struct Months;

impl Months {
    /// Returns the **month-name registry** (lowercased name → month).
    ///
    /// Seeded with every full English name, its three-letter abbreviation and
    /// the common `sept` spelling. Built once on first access.
    fn registry() -> &'static HashMap<String, Month> {
        static REGISTRY: Lazy<HashMap<String, Month>> = Lazy::new(|| {
            let mut m = HashMap::new();
            for month in Month::iter() {
                let name = month.as_ref();
                m.insert(name.to_string(), month);
                m.insert(name[..3].to_string(), month);
            }
            m.insert("sept".to_string(), Month::September);
            m
        });
        &REGISTRY
    }

    /// Looks a month up by name or abbreviation, case-insensitively.
    /// A trailing `.` (as in `Jan.`) is ignored.
    pub fn lookup(name: &str) -> Option<Month> {
        let key = name.trim().trim_end_matches('.').to_ascii_lowercase();
        Self::registry().get(&key).copied()
    }

    /// The alternation used by the long-form date grammar, longest names first
    /// so that `september` wins over `sep`.
    pub fn pattern() -> String {
        let mut names: Vec<&String> = Self::registry().keys().collect();
        names.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
        names
            .iter()
            .map(|n| regex::escape(n))
            .collect::<Vec<_>>()
            .join("|")
    }
}
