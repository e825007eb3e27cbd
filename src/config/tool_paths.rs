use serde::{Serialize, Deserialize};

/// Program paths for every external tool the pipeline invokes
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ToolPaths {
    #[serde(default = "default_disktype")]
    pub disktype: String,
    #[serde(default = "default_mmls")]
    pub mmls: String,
    #[serde(default = "default_fiwalk")]
    pub fiwalk: String,
    #[serde(default = "default_tsk_recover")]
    pub tsk_recover: String,
    #[serde(default = "default_unhfs")]
    pub unhfs: String,
    #[serde(default = "default_brunnhilde")]
    pub brunnhilde: String,
    #[serde(default = "default_bagit")]
    pub bagit: String,
    #[serde(default = "default_mount")]
    pub mount: String,
    #[serde(default = "default_umount")]
    pub umount: String,
    /// Program prefixed to mount/umount, `None` to run them directly
    #[serde(default = "default_privilege_prefix")]
    pub privilege_prefix: Option<String>,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            disktype: default_disktype(),
            mmls: default_mmls(),
            fiwalk: default_fiwalk(),
            tsk_recover: default_tsk_recover(),
            unhfs: default_unhfs(),
            brunnhilde: default_brunnhilde(),
            bagit: default_bagit(),
            mount: default_mount(),
            umount: default_umount(),
            privilege_prefix: default_privilege_prefix(),
        }
    }
}

fn default_disktype() -> String {
    "disktype".to_string()
}

fn default_mmls() -> String {
    "mmls".to_string()
}

fn default_fiwalk() -> String {
    "fiwalk".to_string()
}

fn default_tsk_recover() -> String {
    "tsk_recover".to_string()
}

/// HFSExplorer installs unhfs in a different prefix per platform
fn default_unhfs() -> String {
    if cfg!(target_os = "macos") {
        "/usr/local/share/hfsexplorer/bin/unhfs".to_string()
    } else {
        "/usr/share/hfsexplorer/bin/unhfs".to_string()
    }
}

fn default_brunnhilde() -> String {
    "brunnhilde.py".to_string()
}

fn default_bagit() -> String {
    "bagit.py".to_string()
}

fn default_mount() -> String {
    "mount".to_string()
}

fn default_umount() -> String {
    "umount".to_string()
}

fn default_privilege_prefix() -> Option<String> {
    Some("sudo".to_string())
}
