pub mod ending;
pub mod game_save;
pub mod reply;
pub mod scenario;
pub mod session;
pub mod stats;
