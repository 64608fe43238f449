//! Custom widgets for the TUI

pub mod input_box;
pub mod markdown;
pub mod message_list;
pub mod spinner;
pub mod toast;

pub use input_box::{InputBox, MAX_INPUT_ROWS};
pub use message_list::{MessageList, Speaker, calculate_message_height};
pub use spinner::Spinner;
pub use toast::Toast;
