pub mod item;
pub mod view_mode;

pub use item::{Dataset, Item};
pub use view_mode::ViewMode;
