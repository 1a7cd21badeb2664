//! Typed configuration, modeled after the configuration-key table: one
//! sub-struct per section, `Duration`/byte-size fields parsed into the
//! units the keys imply. The on-disk parser itself is out of scope — this
//! struct is constructed programmatically (tests, embedders) or via
//! `serde` from whatever surrounds it; `validate()` is the FATAL boundary
//! §7 requires at startup.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FsConfig {
    /// `FS.QUOTA`, in MiB.
    pub quota_mib: u64,
    /// `FS.DIR`.
    pub dir: PathBuf,
    /// `FS.INDEX-DIRECTORY`.
    pub index_directory: PathBuf,
}

impl FsConfig {
    pub fn quota_bytes(&self) -> u64 {
        self.quota_mib * 1024 * 1024
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GnunetdConfig {
    /// `GNUNETD.GNUNETD_HOME`.
    pub home: PathBuf,
    /// `GNUNETD.HOSTS`; defaults under `home` when unset.
    pub hosts: Option<PathBuf>,
    /// `GNUNETD.DISABLE-AUTOCONNECT`.
    pub disable_autoconnect: bool,
}

impl GnunetdConfig {
    pub fn hosts_dir(&self) -> PathBuf {
        self.hosts.clone().unwrap_or_else(|| self.home.join("hosts"))
    }

    pub fn credit_dir(&self) -> PathBuf {
        self.home.join("credit")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// `NETWORK.PORT`.
    pub port: u16,
    /// `NETWORK.TRUSTED`, as CIDR strings; parsing them into a real
    /// allow-list is a transport concern and out of scope here.
    pub trusted: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    /// `LOAD.MAXNETDOWNBPSTOTAL`.
    pub max_net_down_bps_total: u64,
    /// `LOAD.MAXNETUPBPSTOTAL`.
    pub max_net_up_bps_total: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    pub fs: FsConfig,
    pub gnunetd: GnunetdConfig,
    pub network: NetworkConfig,
    pub load: LoadConfig,
    /// Master secret every subsystem's IPC key is derived from
    /// (`shared_types::security::DerivedKeyProvider`). Provisioned once at
    /// startup; never persisted in this configuration struct's `Debug`
    /// output would be wrong, but `Debug` here is only used in tests.
    pub ipc_master_secret: Vec<u8>,
}

impl NodeConfig {
    /// A config suitable for tests and first-run defaults: an isolated
    /// temp-like layout under `home`, quota of 64 MiB, autoconnect
    /// disabled (no real bootstrap service is wired by default).
    pub fn minimal(home: PathBuf, master_secret: Vec<u8>) -> Self {
        Self {
            fs: FsConfig {
                quota_mib: 64,
                dir: home.join("fs"),
                index_directory: home.join("shared"),
            },
            gnunetd: GnunetdConfig { home: home.clone(), hosts: None, disable_autoconnect: true },
            network: NetworkConfig { port: 2086, trusted: vec!["127.0.0.1/32".to_string()] },
            load: LoadConfig { max_net_down_bps_total: 50_000, max_net_up_bps_total: 50_000 },
            ipc_master_secret: master_secret,
        }
    }

    /// `FATAL` per §7: required fields missing or malformed abort startup
    /// before any subsystem is registered.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.fs.quota_mib == 0 {
            return Err(CoreError::Config("fs.quota_mib must be nonzero".to_string()));
        }
        if self.network.port == 0 {
            return Err(CoreError::Config("network.port must be nonzero".to_string()));
        }
        if self.ipc_master_secret.is_empty() {
            return Err(CoreError::Config("ipc_master_secret must not be empty".to_string()));
        }
        Ok(())
    }
}
