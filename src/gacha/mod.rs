pub mod draw_engine;
pub mod luck_tracker;
