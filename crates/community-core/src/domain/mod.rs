//! Domain entities for the community browser.
//!
//! Pure data and rules with no network, thread, or file-system access:
//!
//! - **`source`** – configured directory sources, the LAN option, and the
//!   default-selection rule.
//! - **`listing`** – server records from directories and LAN discovery, and
//!   the de-duplicating merge that produces the browser's entry list.

pub mod listing;
pub mod source;
