// SPDX-License-Identifier: AGPL-3.0-only
//! # Substratum token contracts
//!
//! Two ledgers and the one-way bridge between them:
//!
//! - [`LegacyToken`]: the fixed-supply 2-decimal token being phased out.
//! - [`Substratum`]: the 18-decimal replacement, which adds `migrate` and
//!   `migrate_all` on top of the standard ledger.
//!
//! Contracts are plain state; the host (`sub-chain`) owns them, hands each
//! call a [`CallContext`] and makes the call atomic.

pub mod abi;
pub mod error;
pub mod event;
pub mod ledger;
pub mod legacy;
pub mod substratum;

pub use abi::{validate_call, CallContext, QueryResult, TokenCall, TokenQuery};
pub use error::{TokenError, TokenResult};
pub use event::{EventKind, TokenEvent};
pub use ledger::{ApprovalPolicy, TokenLedger, TokenMetadata};
pub use legacy::{LegacyLedger, LegacyToken};
pub use substratum::{CallOutcome, Substratum};
