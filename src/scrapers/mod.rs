//! Fetch flows against slotcatalog.com.
//!
//! Each flow is independent and persists raw HTML exactly as the site
//! returned it; turning that HTML into data is left to [`crate::extract`].
//!
//! # Flows
//!
//! | Flow | Module | Walk | Termination | Output |
//! |------|--------|------|-------------|--------|
//! | Provider games | [`provider_games`] | sequential pages per provider | page lacks a slot card | `<slug>_games.html` (appended) |
//! | Best games | [`best_games`] | fixed pages per country | page count | `best_slots_<country>.html` |
//! | Game details | [`game_details`] | batches of URLs, concurrent within a batch | end of list | `<game>.html` per URL |
//! | Provider list | [`provider_list`] | fixed page range | page count | `page_<n>.html` |
//!
//! # Common Patterns
//!
//! - Every flow is generic over [`crate::client::Fetcher`]
//! - Requests are throttled with [`crate::utils::pause`]
//! - Per-item failures are logged and counted in a
//!   [`RunReport`](crate::models::RunReport), never retried

pub mod best_games;
pub mod game_details;
pub mod provider_games;
pub mod provider_list;
