//! # State Module
//!
//! Application state for the desk.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────────────────────┐  ┌────────────────────────────────┐  │
//! │  │   FeedState (shared)         │  │   SessionStore                 │  │
//! │  │                              │  │                                │  │
//! │  │  catalog source + TTL cache  │  │  SessionId ──► Mutex<Session>  │  │
//! │  │  FX provider + best effort   │  │    • CartStore                 │  │
//! │  │  required column names       │  │    • SessionSettings           │  │
//! │  │                              │  │    • last search results       │  │
//! │  └──────────────────────────────┘  └────────────────────────────────┘  │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • FeedState: caches are internally locked, otherwise read-only        │
//! │  • SessionStore: one Mutex per session, a command locks only its own   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod feed;
mod session;
mod settings;

pub use feed::FeedState;
pub use session::{Session, SessionId, SessionStore};
pub use settings::SessionSettings;
