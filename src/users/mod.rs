//! User directory endpoints: listing, lookup, deletion and the current-user view.

pub mod handlers;
