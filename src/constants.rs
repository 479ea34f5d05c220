// src/constants.rs

/// The name of the settings file (in ~/.config/fabctl/).
pub const SETTINGS_FILENAME: &str = "settings.toml";

/// The name of the descriptor file inside each registry entry.
pub const DESCRIPTOR_FILENAME: &str = ".config.json";

/// The directory (inside an environment directory) holding node records.
pub const NODES_DIR: &str = "nodes";

/// The reserved name of the primary local network.
pub const LOCAL_ENVIRONMENT_NAME: &str = "1 Org Local Fabric";

pub const DEFAULT_ENVIRONMENTS_DIR: &str = "~/.fabctl/environments";
pub const DEFAULT_CHAINCODE_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_LOCAL_START_PORT: u16 = 17050;
pub const DEFAULT_LOCAL_END_PORT: u16 = 17070;

/// Organization used for peer lookups on the local network when none is given.
pub const DEFAULT_LOCAL_ORG: &str = "Org1";

// --- Lifecycle scripts ---
pub const SCRIPT_GENERATE: &str = "generate";
pub const SCRIPT_START: &str = "start";
pub const SCRIPT_STOP: &str = "stop";
pub const SCRIPT_TEARDOWN: &str = "teardown";
pub const SCRIPT_IS_RUNNING: &str = "is_running";
pub const SCRIPT_IS_GENERATED: &str = "is_generated";
pub const SCRIPT_KILL_CHAINCODE: &str = "kill_chaincode";

// --- Environment overlay passed to every script ---
pub const ENV_CHAINCODE_MODE: &str = "CORE_CHAINCODE_MODE";
pub const CHAINCODE_MODE_DEV: &str = "dev";
pub const ENV_CHAINCODE_TIMEOUT: &str = "CORE_CHAINCODE_EXECUTETIMEOUT";

/// Period of the busy animation ticker, in milliseconds.
pub const BUSY_TICK_MILLIS: u64 = 500;
