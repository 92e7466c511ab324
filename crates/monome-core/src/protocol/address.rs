//! OSC address constants for serialosc and monome devices.
//!
//! Addresses are case-sensitive.  System and discovery addresses are fixed;
//! device addresses are rooted under a configurable prefix and are built
//! with [`prefixed`].

use std::net::{IpAddr, Ipv4Addr};

// ── Defaults ──────────────────────────────────────────────────────────────────

/// Prefix a session registers when none is configured.
pub const DEFAULT_PREFIX: &str = "monome";

/// UDP port serialosc listens on for discovery requests.
pub const DEFAULT_DISCOVERY_PORT: u16 = 12002;

/// serialosc and its devices only listen on the loopback interface.
pub const LOOPBACK: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

// ── Discovery channel ─────────────────────────────────────────────────────────

pub const SERIALOSC_LIST: &str = "/serialosc/list";
pub const SERIALOSC_NOTIFY: &str = "/serialosc/notify";
pub const SERIALOSC_DEVICE: &str = "/serialosc/device";
pub const SERIALOSC_ADD: &str = "/serialosc/add";
pub const SERIALOSC_REMOVE: &str = "/serialosc/remove";

// ── System (prefix-independent) ───────────────────────────────────────────────

pub const SYS_HOST: &str = "/sys/host";
pub const SYS_PORT: &str = "/sys/port";
pub const SYS_PREFIX: &str = "/sys/prefix";
pub const SYS_INFO_ID: &str = "/sys/info/id";
pub const SYS_INFO_SIZE: &str = "/sys/info/size";
pub const SYS_ID: &str = "/sys/id";
pub const SYS_SIZE: &str = "/sys/size";

// ── Device suffixes (appended to `/<prefix>`) ─────────────────────────────────

pub const GRID_LED_ALL: &str = "/grid/led/all";
pub const GRID_LED_SET: &str = "/grid/led/set";
pub const GRID_KEY: &str = "/grid/key";
pub const TILT: &str = "/tilt";
pub const RING_ALL: &str = "/ring/all";
pub const RING_SET: &str = "/ring/set";
pub const ENC_KEY: &str = "/enc/key";
pub const ENC_DELTA: &str = "/enc/delta";

/// Builds `/<prefix><suffix>`.
///
/// The prefix is normalised first, so `"monome"` and `"/monome/"` produce
/// the same address.
///
/// # Examples
///
/// ```rust
/// use monome_core::protocol::address::{prefixed, GRID_KEY};
///
/// assert_eq!(prefixed("monome", GRID_KEY), "/monome/grid/key");
/// assert_eq!(prefixed("/app/", GRID_KEY), "/app/grid/key");
/// ```
pub fn prefixed(prefix: &str, suffix: &str) -> String {
    format!("/{}{suffix}", normalize_prefix(prefix))
}

/// Strips leading and trailing `/` from a prefix.
pub fn normalize_prefix(prefix: &str) -> &str {
    prefix.trim_matches('/')
}
