pub mod bootcamp;
pub mod capacity;
pub mod health;
