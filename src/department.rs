use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::warn;

/// The nine business units that each own a snapshot sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Department {
    Doctors,
    Delighters,
    CcSales,
    CcResolvers,
    Filipina,
    African,
    Ethiopian,
    MvResolvers,
    MvSales,
}

impl Department {
    pub const ALL: [Department; 9] = [
        Department::Doctors,
        Department::Delighters,
        Department::CcSales,
        Department::CcResolvers,
        Department::Filipina,
        Department::African,
        Department::Ethiopian,
        Department::MvResolvers,
        Department::MvSales,
    ];

    /// Key used in input file names and in the `[departments]` config table.
    pub fn key(&self) -> &'static str {
        match self {
            Department::Doctors => "doctors",
            Department::Delighters => "delighters",
            Department::CcSales => "cc_sales",
            Department::CcResolvers => "cc_resolvers",
            Department::Filipina => "filipina",
            Department::African => "african",
            Department::Ethiopian => "ethiopian",
            Department::MvResolvers => "mv_resolvers",
            Department::MvSales => "mv_sales",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Department::Doctors => "Doctors",
            Department::Delighters => "Delighters",
            Department::CcSales => "CC Sales",
            Department::CcResolvers => "CC Resolvers",
            Department::Filipina => "Filipina",
            Department::African => "African",
            Department::Ethiopian => "Ethiopian",
            Department::MvResolvers => "MV Resolvers",
            Department::MvSales => "MV Sales",
        }
    }

    /// Accepts `cc_sales`, `CC Sales`, `cc-sales`, ... Returns None for anything else.
    pub fn from_key(s: &str) -> Option<Self> {
        let normalized = s.trim().to_lowercase().replace([' ', '-'], "_");
        Department::ALL
            .iter()
            .copied()
            .find(|d| d.key() == normalized)
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl Serialize for Department {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.display_name())
    }
}

/// Spreadsheet id per department, as configured under `[departments]`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DepartmentSheets(BTreeMap<Department, String>);

impl DepartmentSheets {
    /// Build from the raw config table. Unknown keys and empty ids are dropped with a warning.
    pub fn from_config(raw: &HashMap<String, String>) -> Self {
        let mut map = BTreeMap::new();
        for (key, id) in raw {
            let Some(dept) = Department::from_key(key) else {
                warn!("Ignoring unknown department '{}' in config", key);
                continue;
            };
            if id.trim().is_empty() {
                warn!("Empty spreadsheet id for {}", dept);
                continue;
            }
            map.insert(dept, id.trim().to_string());
        }
        Self(map)
    }

    pub fn sheet_id(&self, dept: Department) -> Option<&str> {
        self.0.get(&dept).map(|s| s.as_str())
    }

    pub fn insert(&mut self, dept: Department, id: impl Into<String>) {
        self.0.insert(dept, id.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
