pub use crate::base::{
    config::Config,
    types::{Err, InboundMessage, OutboundMessage, Res, Void},
};
pub use anyhow::anyhow;
pub use tracing::{debug, error, info, instrument, warn};
