//! Application layer: filter state, intents and their projections.
//!
//! This layer sits between a front end (the CLI in `main.rs`, or any
//! embedding) and the query/fetch layers. It follows a unidirectional data
//! flow:
//!
//! ```text
//! Intent → Store → Criteria ─┬─▶ canonical query → Address
//!                            └─▶ fetch snapshot  → Orchestrator → Commands
//!                                                      ↑              ↓
//!                                                      └── FetchEvents ┘
//! ```
//!
//! # Modules
//!
//! - [`intents`]: The named intents and their textual form
//! - [`store`]: Pure intent application and the criteria holder
//! - [`address`]: Navigable address abstraction and synchronizer
//! - [`session`]: Wires everything into one drivable session
//!
//! # Example
//!
//! ```rust
//! use facetsync::app::{FilterSession, Intent, MemoryAddress};
//! use facetsync::domain::SortKey;
//! use facetsync::Config;
//!
//! let address = MemoryAddress::new("/catalog", "?page=2");
//! let mut session = FilterSession::new(&Config::default(), address, None);
//! let _commands = session.start();
//!
//! session.dispatch(&Intent::SetSort(SortKey::PriceAscending));
//! assert_eq!(session.address().href(), "/catalog?sort=priceAsc");
//! ```

pub mod address;
pub mod intents;
pub mod session;
pub mod store;

pub use address::{Address, AddressSynchronizer, MemoryAddress};
pub use intents::Intent;
pub use session::FilterSession;
pub use store::{apply_intent, FilterStore};
