pub mod diagnostics;
pub mod gameplay;
pub mod gesture;
pub mod grid;
pub mod judgment;
pub mod level;
pub mod minigame;
pub mod player;
pub mod timing;
pub mod valuable;
