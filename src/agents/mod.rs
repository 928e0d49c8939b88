//! Agent (C2), agent registry (C3), and industry overlay (C3) modules.

pub mod base;
pub mod industry;
pub mod registry;
pub mod resolve;

pub use base::{Agent, AgentDescriptor, AgentRecord, AgentRecordStream, DoneRecord, MetricsRecord, TokenRecord, ERROR_PREFIX};
pub use resolve::{build_agents, resolve_agent_ids};
