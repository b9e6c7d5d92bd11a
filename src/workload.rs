//! Benchmark workloads
//!
//! A workload is a named benchmark profile (schema, queries and cluster
//! topology). Names are parsed case-insensitively and always rendered in
//! their canonical upper-case form.

use crate::error::CompareError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Macro benchmark workload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Workload {
    Oltp,
    OltpReadonly,
    OltpSet,
    Tpcc,
    TpccFk,
    TpccUnsharded,
    TpccFkUnmanaged,
}

impl Workload {
    /// Every workload, in the order the dashboard lists them
    pub const ALL: [Workload; 7] = [
        Workload::Oltp,
        Workload::OltpReadonly,
        Workload::OltpSet,
        Workload::Tpcc,
        Workload::TpccFk,
        Workload::TpccUnsharded,
        Workload::TpccFkUnmanaged,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Workload::Oltp => "OLTP",
            Workload::OltpReadonly => "OLTP-READONLY",
            Workload::OltpSet => "OLTP-SET",
            Workload::Tpcc => "TPCC",
            Workload::TpccFk => "TPCC_FK",
            Workload::TpccUnsharded => "TPCC_UNSHARDED",
            Workload::TpccFkUnmanaged => "TPCC_FK_UNMANAGED",
        }
    }

    /// Parse a comma-separated list such as `OLTP,tpcc`
    ///
    /// An empty list selects every workload.
    pub fn parse_list(csv: &str) -> Result<Vec<Workload>, CompareError> {
        let mut workloads = Vec::new();
        for name in csv.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let workload: Workload = name.parse()?;
            if !workloads.contains(&workload) {
                workloads.push(workload);
            }
        }
        if workloads.is_empty() {
            return Ok(Workload::ALL.to_vec());
        }
        Ok(workloads)
    }
}

impl fmt::Display for Workload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Workload {
    type Err = CompareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Workload::ALL
            .iter()
            .copied()
            .find(|w| w.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CompareError::invalid_input(format!("unknown workload '{}'", s)))
    }
}

impl Serialize for Workload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Workload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}
