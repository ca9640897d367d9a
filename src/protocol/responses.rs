//! FTP reply codes the client acts on

pub const RESTART_DELAY: u16 = 120;
pub const DATA_ALREADY_OPEN: u16 = 125;
pub const OPENING_DATA: u16 = 150;
pub const OK: u16 = 200;
pub const READY: u16 = 220;
pub const TRANSFER_COMPLETE: u16 = 226;
pub const ENTERING_PASSIVE: u16 = 227;
pub const FILE_ACTION_OK: u16 = 250;
pub const PASSWORD_REQUIRED: u16 = 331;
pub const ACCOUNT_REQUIRED: u16 = 332;
pub const PENDING_FURTHER_INFO: u16 = 350;

/// Replies that open a transfer on the data channel
pub const TRANSFER_STARTING: &[u16] = &[DATA_ALREADY_OPEN, OPENING_DATA];

/// Final replies after which throughput is reported
pub const TRANSFER_SUCCESS: &[u16] = &[TRANSFER_COMPLETE, FILE_ACTION_OK];
