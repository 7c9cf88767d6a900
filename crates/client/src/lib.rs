pub mod client;
pub mod wire;

pub use client::{HttpPlantService, PlantService};
pub use wire::{ActionResponse, Multiplier, PlantRequest, WaterResponse};
