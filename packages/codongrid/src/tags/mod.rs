pub mod node_groups;
pub mod tag_resolver;
