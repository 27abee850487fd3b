//! Shared fixture for CLI tests: a throwaway KVADM_HOME holding a snapshot and,
//! optionally, a config file.
#![cfg(test)]
#![allow(dead_code)]

use assert_cmd::Command;
use serde_json::{Value, json};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub struct TestFixture {
    _temp_dir: TempDir,
    home: PathBuf,
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl TestFixture {
    /// Empty home: no snapshot, no config.
    pub fn empty() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let home = temp_dir.path().join(".kvadm");
        fs::create_dir_all(&home).expect("Failed to create kvadm home");
        Self {
            _temp_dir: temp_dir,
            home,
        }
    }

    /// Home with the two-node sample snapshot.
    pub fn new() -> Self {
        let fixture = Self::empty();
        fixture.write_snapshot(&sample_snapshot());
        fixture
    }

    pub fn home(&self) -> &PathBuf {
        &self.home
    }

    pub fn write_snapshot(&self, snapshot: &Value) {
        let content = serde_json::to_string_pretty(snapshot).expect("Failed to encode snapshot");
        fs::write(self.home.join("snapshot.json"), content).expect("Failed to write snapshot");
    }

    pub fn write_config(&self, content: &str) {
        fs::write(self.home.join("config.toml"), content).expect("Failed to write config");
    }

    /// `kvadm` with a fixed layout and no color, reading from this home.
    pub fn command(&self) -> Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("kvadm");
        cmd.env("KVADM_HOME", &self.home)
            .env_remove("KVADM_LOG")
            .args(["--color", "never", "--width", "200", "--height", "50"]);
        cmd
    }
}

pub fn sample_snapshot() -> Value {
    json!({
        "timestamp": "2026-01-02T03:04:05Z",
        "common": { "principal": "BB9" },
        "sources": {
            "cluster_names": { "A": "east", "B": "east" },
            "prefixes": { "A": "node-a", "B": "node-b" },
            "node_ids": { "A": "BB9", "B": "BB8" },
            "hosts": { "A": "10.0.0.1:3000", "B": "10.0.0.2:3000" },
            "builds": { "A": "6.1.0", "B": "6.1.0" },
            "versions": { "A": "Enterprise Edition", "B": "Enterprise Edition" },
            "stats": {
                "A": {
                    "cluster_size": 2,
                    "cluster_key": "ABC123",
                    "cluster_integrity": true,
                    "paxos_principal": "BB9",
                    "client_connections": 12,
                    "uptime": 3661
                },
                "B": { "$error": "timeout" }
            },
            "config": {
                "A": { "service-threads": 4, "proto-fd-max": 15000, "migrate-threads": 1 },
                "B": { "service-threads": 8, "proto-fd-max": 15000, "migrate-threads": 1 }
            },
            "latency": {
                "B": {
                    "read": {
                        "total": {
                            "columns": ["Time Span", "ops/sec", ">1ms"],
                            "values": [["10:00:00->10:00:10", 80.5, 1.25]]
                        }
                    }
                }
            },
            "mapping": {
                "0": ["BB9", "10.0.0.1"],
                "1": ["BB8", "10.0.0.2"]
            }
        }
    })
}
