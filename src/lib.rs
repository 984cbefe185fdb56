pub mod audio;
pub mod collision;
pub mod components;
pub mod config;
pub mod culling;
pub mod enemy;
pub mod events;
pub mod level;
pub mod lifecycle;
pub mod physics;
pub mod plugin;
pub mod scripting;
pub mod sector;
pub mod spawner;
pub mod sprite;
pub mod state;
pub mod tilemap;
pub mod variants;

#[cfg(test)]
pub(crate) mod testing;
