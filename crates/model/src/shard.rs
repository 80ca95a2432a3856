/// A closed-open slice of the source collection, keyed on an opaque bound
/// token (stringified source-store key). Shard identity is the pair
/// (shard_id, lower_bound): planners never interpret the bound's structure,
/// they only order and persist it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardDescriptor {
    pub shard_id: u32,
    pub lower_bound: String,
    pub upper_bound: String,
    pub size_hint: Option<u64>,
}

impl ShardDescriptor {
    pub fn new(shard_id: u32, lower_bound: String, upper_bound: String) -> Self {
        Self {
            shard_id,
            lower_bound,
            upper_bound,
            size_hint: None,
        }
    }

    pub fn with_size_hint(mut self, size_hint: u64) -> Self {
        self.size_hint = Some(size_hint);
        self
    }
}
