//! # TUI Components
//!
//! ```text
//! components/
//! ├── header.rs             (title, unread count, update control)
//! ├── notification_list.rs  (scrolling card column, empty state)
//! ├── notification_card.rs  (one bordered card)
//! └── dialog.rs             (modal prompt overlay)
//! ```
//!
//! `Header` and `Dialog` are rebuilt from props every frame.
//! `NotificationList` borrows a `NotificationListState` that lives in
//! `TuiState`, so scroll position and selection persist between frames.

pub mod dialog;
pub mod header;
pub mod notification_card;
pub mod notification_list;

pub use dialog::Dialog;
pub use header::Header;
pub use notification_list::{NotificationList, NotificationListState};
