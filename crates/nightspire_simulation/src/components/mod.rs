//! ECS компоненты симуляции

pub mod agent;
pub mod animation;

pub use agent::{layers, Agent, AgentConfig, AgentConfigError, Health, HitLayer, HitMask, SearchConfig};
pub use animation::AnimationSink;
