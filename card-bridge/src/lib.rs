//! Card Bridge - NFC reader process for the front desk
//!
//! ```text
//! reader ──▶ CardBridge ──▶ RelayHub ──ws──▶ browser pages
//!                 │
//!                 └──▶ toggle visit (shared SQLite database)
//! ```

pub mod bridge;
pub mod config;
pub mod reader;
pub mod relay;

pub use bridge::{BridgeError, CardBridge, TapOutcome, record_outcome};
pub use config::BridgeConfig;
pub use reader::{CardReader, ChannelReader, LineReader, ReaderEvent};
pub use relay::{RelayHub, RelayServer, decode_frame};
