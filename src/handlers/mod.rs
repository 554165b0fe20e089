pub mod draw;
pub mod participant;
pub mod prize;
pub mod winner;

pub use draw::draw_config;
pub use participant::participant_config;
pub use prize::prize_config;
pub use winner::winner_config;
