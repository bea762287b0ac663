mod fault_injecting_gateway;
mod in_memory_gateway;
mod in_memory_repository;

pub use fault_injecting_gateway::FaultInjectingGateway;
pub use in_memory_gateway::InMemorySearchGateway;
pub use in_memory_repository::{InMemoryArticleRepository, InMemoryUserRepository};
