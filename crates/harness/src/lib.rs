//! QADrive Test Harness
//!
//! This crate provides the acceptance-test machinery for the qauto account
//! and garage flows:
//! - Persists an authenticated browser session once and replays it across
//!   independent test runs
//! - Extracts the session cookie so control-plane HTTP calls impersonate the
//!   same identity as the browser session
//! - Composes per-test resources through a dependency-aware fixture engine
//!   with guaranteed reverse-order teardown
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Fixture Engine (rig)                    │
//! │   persisted_session ──► browser ──► garage_page ──► forms    │
//! │          │                                                   │
//! │          └────────────► control_plane (cookie credential)    │
//! ├──────────────────────────────────────────────────────────────┤
//! │  SessionStore          durable storage-state JSON, atomic    │
//! │  BrowserSession        node/playwright driver over ndjson    │
//! │  Page objects          capability wrappers over one session  │
//! │  ControlPlaneClient    raw status+body outcomes via reqwest  │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod bootstrap;
pub mod browser;
pub mod fixture;
pub mod pages;
pub mod rig;
pub mod session;
pub mod wait;

pub use api::{ApiOutcome, ControlPlaneClient};
pub use browser::BrowserSession;
pub use fixture::{FixtureGraph, FixtureKey, GraphBuilder, TestReport, TestRig};
pub use qadrive_common::{Error, HarnessConfig, Result};
pub use rig::{standard_graph, ApiSession, StandardFixtures};
pub use session::{PersistedSession, SessionCredential, SessionStore, StorageState};
