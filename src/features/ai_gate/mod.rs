mod gate;
mod middleware;
mod outcome;

pub use gate::AiGate;
