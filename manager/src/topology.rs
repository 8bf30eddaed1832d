//! Cluster topology lookups
//!
//! Clusters come from configuration, in declaration order. A server is
//! expected to belong to at most one cluster; when it appears in several,
//! the first declaration wins.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::ClusterDefinition;

#[derive(Debug, Clone, Default)]
pub struct ClusterTopology {
    clusters: Vec<ClusterDefinition>,
}

impl ClusterTopology {
    pub fn new(clusters: Vec<ClusterDefinition>) -> Self {
        Self { clusters }
    }

    /// Other members of the first cluster containing `server`, or empty
    pub fn lookup(&self, server: &str) -> Vec<String> {
        self.clusters
            .iter()
            .find(|cluster| cluster.members.iter().any(|m| m == server))
            .map(|cluster| {
                cluster
                    .members
                    .iter()
                    .filter(|m| m.as_str() != server)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Cluster name -> members, as exposed to API callers
    pub fn as_map(&self) -> ClusterMap {
        let mut map = BTreeMap::new();
        for cluster in &self.clusters {
            map.entry(cluster.name.clone())
                .or_insert_with(|| cluster.members.clone());
        }
        ClusterMap(map)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(transparent)]
pub struct ClusterMap(pub BTreeMap<String, Vec<String>>);
